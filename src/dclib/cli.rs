use crate::dclib::{Error, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Parser, Clone, Debug)]
#[command(name = "digiclust")]
#[command(about = "Unsupervised clustering of grayscale digit images")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

pub trait DigiclustParams: std::fmt::Debug {
    fn validate(&self) -> bool;
    fn debug(&self) -> bool;
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    #[command(about = "Cluster images, classify the centroids, and score the clusters")]
    Cluster(ClusterArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ClusterArgs {
    #[command(flatten)]
    pub io: IOParams,

    #[command(flatten)]
    pub cluster: ClusterParams,
}

#[derive(clap::Args, Clone, Debug)]
pub struct IOParams {
    /// IDX image file to cluster
    #[arg(short, long, help_heading = "I/O")]
    pub images: PathBuf,

    /// IDX label file with the ground truth for --images
    #[arg(short, long, help_heading = "I/O")]
    pub labels: PathBuf,

    /// Output directory for exports and the run summary
    #[arg(short, long, default_value = ".", help_heading = "I/O")]
    pub out: PathBuf,

    /// Text file with one label per centroid (default: prompt on the console)
    #[arg(short, long, help_heading = "I/O")]
    pub centroid_labels: Option<PathBuf>,

    /// Number of threads
    #[arg(short, long, default_value_t = 1, help_heading = "I/O")]
    pub threads: usize,

    /// Skip writing cluster member files
    #[arg(long, default_value_t = false, help_heading = "I/O")]
    pub no_clusters: bool,

    /// Verbose logging
    #[arg(long, default_value_t = false)]
    pub debug: bool,
}

#[derive(clap::Args, Serialize, Deserialize, Clone, Debug)]
pub struct ClusterParams {
    /// Number of clusters
    #[arg(short, long, default_value_t = 60, help_heading = "Clustering")]
    pub k: usize,

    /// Random seed for centroid selection
    #[arg(long, default_value_t = 2124786175, help_heading = "Clustering")]
    pub seed: u64,

    /// Maximum number of refinement iterations
    #[arg(long, default_value_t = 30, help_heading = "Clustering")]
    pub max_iterations: usize,

    /// Stop once fewer than this fraction of images change cluster
    #[arg(long, default_value_t = 0.007, help_heading = "Clustering")]
    pub early_stop: f64,

    /// Weight of the cluster mean on the first iteration
    #[arg(long, default_value_t = 0.4, help_heading = "Scoring / Advanced")]
    pub blend_start: f64,

    /// Weight of the cluster mean on the last iteration
    #[arg(long, default_value_t = 0.1, help_heading = "Scoring / Advanced")]
    pub blend_floor: f64,

    /// Contrast gain applied before clustering
    #[arg(long, default_value_t = 1.2, help_heading = "Scoring / Advanced")]
    pub gain: f64,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            k: 60,
            seed: 2124786175,
            max_iterations: 30,
            early_stop: 0.007,
            blend_start: 0.4,
            blend_floor: 0.1,
            gain: 1.2,
        }
    }
}

impl ClusterParams {
    /// Rejects configurations the clustering loop can't run with
    pub fn check(&self, n_items: usize) -> Result<()> {
        if self.k == 0 {
            return Err(Error::InvalidParameter {
                name: "k",
                message: "must be at least 1",
            });
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iterations",
                message: "must be at least 1",
            });
        }
        if !(0.0..1.0).contains(&self.early_stop) {
            return Err(Error::InvalidParameter {
                name: "early_stop",
                message: "must be in [0, 1)",
            });
        }
        if !(0.0..=1.0).contains(&self.blend_start) || !(0.0..=1.0).contains(&self.blend_floor) {
            return Err(Error::InvalidParameter {
                name: "blend",
                message: "weights must be in [0, 1]",
            });
        }
        if self.blend_floor > self.blend_start {
            return Err(Error::InvalidParameter {
                name: "blend_floor",
                message: "must not exceed blend_start",
            });
        }
        if !(self.gain > 0.0) {
            return Err(Error::InvalidParameter {
                name: "gain",
                message: "must be positive",
            });
        }
        if n_items == 0 {
            return Err(Error::EmptyInput);
        }
        if self.k > n_items {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items,
            });
        }
        Ok(())
    }
}

impl DigiclustParams for ClusterArgs {
    fn debug(&self) -> bool {
        self.io.debug
    }

    /// Validate command line arguments
    fn validate(&self) -> bool {
        let mut is_ok = true;

        is_ok &= validate_file(&self.io.images, "--images");
        is_ok &= validate_file(&self.io.labels, "--labels");

        if let Some(path) = &self.io.centroid_labels {
            is_ok &= validate_file(path, "--centroid-labels");
        }

        if self.io.out.exists() && !self.io.out.is_dir() {
            error!("--out is not a directory");
            is_ok = false;
        }

        if self.io.threads < 1 {
            error!("--threads must be at least 1");
            is_ok = false;
        }

        // item count isn't known yet, only the static checks run here
        if let Err(e) = self.cluster.check(usize::MAX) {
            error!("{}", e);
            is_ok = false;
        }

        if self.cluster.gain > 2.0 {
            warn!("--gain above 2 saturates most strokes");
        }

        is_ok
    }
}

/// Helper function to validate a file's existence and type
fn validate_file(path: &Path, label: &str) -> bool {
    if !path.exists() {
        error!("{} does not exist", label);
        return false;
    }
    if !path.is_file() {
        error!("{} is not a file", label);
        return false;
    }
    true
}
