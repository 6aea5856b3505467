use crate::dclib::{Error, Result};
use itertools::Itertools;
use std::fmt::{Debug, Formatter};

/// Byte used on disk for an unknown label
pub const UNKNOWN_LABEL: u8 = 255;

/// Identifier for synthesized images (centroids) until they are renumbered
pub const SYNTHETIC_ID: i64 = -1;

/// A grayscale raster stored row-major
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    pub id: i64,
    pub label: Option<u8>,
    rows: usize,
    columns: usize,
    pixels: Vec<u8>,
}

impl Image {
    /// Build an image from a row-major pixel buffer
    ///
    /// # Panics
    /// If either dimension is zero or the buffer doesn't hold `rows * columns` pixels.
    pub fn new(rows: usize, columns: usize, pixels: Vec<u8>, id: i64, label: Option<u8>) -> Self {
        assert!(rows > 0 && columns > 0, "image must have positive dimensions");
        assert_eq!(pixels.len(), rows * columns, "pixel buffer does not match shape");
        Self {
            id,
            label,
            rows,
            columns,
            pixels,
        }
    }

    /// Build an image from nested rows, e.g. for small hand-written grids
    pub fn from_rows(grid: &[Vec<u8>], id: i64, label: Option<u8>) -> Self {
        let rows = grid.len();
        let columns = grid.first().map_or(0, |r| r.len());
        let pixels = grid.iter().flatten().copied().collect();
        Image::new(rows, columns, pixels, id, label)
    }

    /// A new image with this one's shape, id, and label but different pixels
    pub fn with_pixels(&self, pixels: Vec<u8>) -> Self {
        Image::new(self.rows, self.columns, pixels, self.id, self.label)
    }

    /// Synthesized image (centroid) of the given shape
    pub fn synthetic(rows: usize, columns: usize, pixels: Vec<u8>) -> Self {
        Image::new(rows, columns, pixels, SYNTHETIC_ID, None)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn get(&self, row: usize, column: usize) -> u8 {
        self.pixels[row * self.columns + column]
    }

    /// Numeric rendering: each pixel right-aligned in three characters, one row per line
    pub fn to_text(&self) -> String {
        self.pixels
            .chunks(self.columns)
            .map(|row| row.iter().map(|p| format!(" {:>3}", p)).join(""))
            .join("\n")
    }

    /// ASCII art rendering: pixels at or above `threshold` become '*'
    pub fn to_ascii(&self, threshold: u8) -> String {
        self.pixels
            .chunks(self.columns)
            .map(|row| {
                row.iter()
                    .map(|&p| if p >= threshold { '*' } else { ' ' })
                    .collect::<String>()
            })
            .join("\n")
    }
}

impl Debug for Image {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("rows", &self.rows)
            .field("columns", &self.columns)
            // Pixels are too noisy for debug output
            .finish()
    }
}

/// Ensures every image in the working set has the same shape.
/// Returns that shape.
pub fn check_shapes(images: &[Image]) -> Result<(usize, usize)> {
    let expected = images.first().ok_or(Error::EmptyInput)?.shape();
    match images.iter().position(|i| i.shape() != expected) {
        Some(index) => Err(Error::ShapeMismatch {
            index,
            expected,
            found: images[index].shape(),
        }),
        None => Ok(expected),
    }
}

/// Attach ground-truth labels (by position) to a set of images
pub fn apply_labels(images: &mut [Image], labels: &[u8]) -> Result<()> {
    if images.len() != labels.len() {
        return Err(Error::LabelCount {
            expected: images.len(),
            found: labels.len(),
        });
    }
    for (image, &label) in images.iter_mut().zip(labels) {
        image.label = (label != UNKNOWN_LABEL).then_some(label);
    }
    Ok(())
}
