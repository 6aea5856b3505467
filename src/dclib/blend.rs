use crate::dclib::{ClusterParams, Image};
use rayon::prelude::*;

/// Per-pixel mean of a cluster's members, rounded and clamped to [0, 255].
///
/// Sums are reduced from per-worker partial accumulators, so the result is the same for
/// any thread count. Returns `None` for an empty cluster.
pub fn mean_centroid(items: &[Image], members: &[usize]) -> Option<Image> {
    let first = &items[*members.first()?];
    let (rows, columns) = first.shape();
    let npix = rows * columns;

    let sums: Vec<u64> = members
        .par_iter()
        .fold(
            || vec![0u64; npix],
            |mut acc, &m| {
                acc.iter_mut()
                    .zip(items[m].pixels())
                    .for_each(|(a, &p)| *a += p as u64);
                acc
            },
        )
        .reduce(
            || vec![0u64; npix],
            |mut a, b| {
                a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
                a
            },
        );

    let count = members.len() as f64;
    let pixels = sums
        .iter()
        .map(|&s| clamp_pixel((s as f64 / count).round()))
        .collect();
    Some(Image::synthetic(rows, columns, pixels))
}

/// Weighted combination of the previous centroid and the new cluster mean.
/// Each pixel is `round(old * weight_old + new * weight_new)`, clamped to [0, 255].
pub fn blend(old: &Image, new_mean: &Image, weight_old: f64, weight_new: f64) -> Image {
    debug_assert_eq!(old.shape(), new_mean.shape());
    let pixels = old
        .pixels()
        .iter()
        .zip(new_mean.pixels())
        .map(|(&o, &n)| clamp_pixel((o as f64 * weight_old + n as f64 * weight_new).round()))
        .collect();
    Image::synthetic(old.rows(), old.columns(), pixels)
}

/// Weight given to the new mean at `iteration` (0 based). Starts at `blend_start` and
/// decays linearly to `blend_floor` as the iteration approaches `max_iterations`.
pub fn new_weight(iteration: usize, params: &ClusterParams) -> f64 {
    let progress = iteration as f64 / params.max_iterations as f64;
    let w = params.blend_start - (params.blend_start - params.blend_floor) * progress;
    w.clamp(params.blend_floor, params.blend_start)
}

#[inline]
fn clamp_pixel(value: f64) -> u8 {
    value.clamp(0.0, 255.0) as u8
}
