use thiserror::Error;

/// Errors returned while loading, clustering, classifying, or exporting images.
#[derive(Debug, Error)]
pub enum Error {
    /// No images to work with.
    #[error("empty input")]
    EmptyInput,

    /// An image does not share the working set's shape.
    #[error("shape mismatch at image {index}: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        index: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        name: &'static str,
        message: &'static str,
    },

    /// Requested cluster count is larger than the dataset.
    #[error("invalid cluster count: requested {requested}, but dataset has {n_items} items")]
    InvalidClusterCount { requested: usize, n_items: usize },

    /// A label source produced the wrong number of labels.
    #[error("expected {expected} labels, found {found}")]
    LabelCount { expected: usize, found: usize },

    /// Classification input ended before every centroid was labeled.
    #[error("classification cancelled")]
    Cancelled,

    /// One or more exports were not written.
    #[error("export failed: {0}")]
    Export(String),

    /// Malformed image or label file.
    #[error("bad file format: {0}")]
    Format(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
