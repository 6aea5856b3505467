mod blend;
pub use crate::dclib::blend::{blend, mean_centroid, new_weight};

mod classify;
pub use crate::dclib::classify::{
    request_labels, CentroidClassifier, ConsoleClassifier, LabelFileClassifier,
};

mod cli;
pub use crate::dclib::cli::{ClusterArgs, ClusterParams, Cli, Commands, DigiclustParams, IOParams};

mod cluster_main;
pub use crate::dclib::cluster_main::{cluster_main, RunSummary};

mod distance;
pub use crate::dclib::distance::{assign_nearest, build_distance_matrix, nearest_centroid};

mod error;
pub use crate::dclib::error::{Error, Result};

mod export;
pub use crate::dclib::export::{spawn_exporter, ExportFlags, ExportJob, ExportSink, TextExporter};

mod filters;
pub use crate::dclib::filters::{
    box_blur, gaussian_blur, postprocess, preprocess, stretch_contrast, unsharp_mask,
};

mod idx;
pub use crate::dclib::idx::{
    read_images, read_labels, write_images, write_labels, IdxStore, ImageStore,
};

mod image;
pub use crate::dclib::image::{apply_labels, check_shapes, Image, SYNTHETIC_ID, UNKNOWN_LABEL};

mod kmeans;
pub use crate::dclib::kmeans::{
    group_members, kmeans, kmeans_with, Clustering, IterationRecord, StopReason,
};

mod metrics;
pub use crate::dclib::metrics::{cosine_distance, format_time, Grade, MAX_DISTANCE};

mod scorer;
pub use crate::dclib::scorer::{dominant_cluster, misclassified, score, AccuracyReport, ClusterScore};

mod seeding;
pub use crate::dclib::seeding::kmeans_plusplus;
