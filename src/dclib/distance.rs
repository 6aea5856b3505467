use crate::dclib::{metrics, Image};
use ndarray::{Array2, ArrayView1, Axis};
use ordered_float::OrderedFloat;
use rayon::prelude::*;

/// Fill a fresh items x centroids matrix of cosine distances.
/// Rows are computed in parallel; nothing else can see the matrix until it's returned.
pub fn build_distance_matrix(items: &[Image], centroids: &[Image]) -> Array2<f64> {
    let mut matrix = Array2::<f64>::zeros((items.len(), centroids.len()));
    matrix
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .zip(items.par_iter())
        .for_each(|(mut row, item)| {
            for (cell, centroid) in row.iter_mut().zip(centroids) {
                *cell = metrics::cosine_distance(item, centroid);
            }
        });
    matrix
}

/// Index of the smallest distance in a row. Ties go to the lowest index.
///
/// # Panics
/// If the row is empty
pub fn nearest_centroid(row: ArrayView1<f64>) -> usize {
    row.iter()
        .enumerate()
        .min_by_key(|&(_, &d)| OrderedFloat(d))
        .map(|(idx, _)| idx)
        .expect("distance row has no centroids")
}

/// Nearest centroid for every row of the matrix
pub fn assign_nearest(matrix: &Array2<f64>) -> Vec<usize> {
    (0..matrix.nrows())
        .into_par_iter()
        .map(|i| nearest_centroid(matrix.row(i)))
        .collect()
}
