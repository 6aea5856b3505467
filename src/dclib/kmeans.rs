use crate::dclib::{
    blend, check_shapes, distance, metrics::format_time, seeding, ClusterParams, Image, Result,
};
use rand::Rng;
use serde::Serialize;
use std::time::Instant;

/// Why the refinement loop ended. All three produce the same kind of result.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum StopReason {
    /// No item changed cluster
    Converged,
    /// Hit `max_iterations`
    MaxIterations,
    /// Fewer than `early_stop` of the items changed cluster
    EarlyStop,
}

/// Timing and churn of one refinement iteration
#[derive(Debug, Clone, Serialize)]
pub struct IterationRecord {
    pub iteration: usize,
    pub elapsed_ms: u64,
    pub changed: usize,
    pub change_ratio: f64,
}

#[derive(Debug)]
pub struct Clustering {
    pub centroids: Vec<Image>,
    /// Cluster index of every item
    pub assignments: Vec<usize>,
    /// Item indices of every cluster, ascending
    pub clusters: Vec<Vec<usize>>,
    pub records: Vec<IterationRecord>,
    pub stop: StopReason,
}

impl Clustering {
    pub fn iterations(&self) -> usize {
        self.records.len()
    }
}

/// Group item indices by their assignment
pub fn group_members(assignments: &[usize], k: usize) -> Vec<Vec<usize>> {
    let mut clusters = vec![Vec::new(); k];
    for (idx, &c) in assignments.iter().enumerate() {
        clusters[c].push(idx);
    }
    clusters
}

/// Cluster `items` into `params.k` groups. See [`kmeans_with`].
pub fn kmeans<R: Rng>(items: &[Image], params: &ClusterParams, rng: &mut R) -> Result<Clustering> {
    kmeans_with(items, params, rng, |_| {})
}

/// K-Means++ seeded clustering under cosine distance.
///
/// Each iteration rebuilds the distance matrix, reassigns every item to its nearest centroid,
/// regroups the clusters, and then moves each centroid towards its cluster mean using the
/// blend schedule. Empty clusters are reseeded with a random item drawn from `rng`, the same
/// generator used for seeding, so a run is reproducible from one seed.
///
/// `on_iteration` is called with the record of each finished iteration.
pub fn kmeans_with<R, F>(
    items: &[Image],
    params: &ClusterParams,
    rng: &mut R,
    mut on_iteration: F,
) -> Result<Clustering>
where
    R: Rng,
    F: FnMut(&IterationRecord),
{
    params.check(items.len())?;
    check_shapes(items)?;

    let k = params.k;
    let n = items.len();
    let mut centroids: Vec<Image> = seeding::kmeans_plusplus(items, k, rng)
        .into_iter()
        .map(|idx| items[idx].clone())
        .collect();
    debug!("seeded {} centroids", centroids.len());

    let mut assignments = vec![0usize; n];
    let mut records = Vec::new();
    let mut iteration = 0;

    let (stop, clusters) = loop {
        let start = Instant::now();

        // assign
        let matrix = distance::build_distance_matrix(items, &centroids);
        let nearest = distance::assign_nearest(&matrix);
        let changed = nearest
            .iter()
            .zip(&assignments)
            .filter(|(a, b)| a != b)
            .count();
        assignments = nearest;
        let clusters = group_members(&assignments, k);

        // update
        let w_new = blend::new_weight(iteration, params);
        let w_old = 1.0 - w_new;
        for (slot, members) in clusters.iter().enumerate() {
            match blend::mean_centroid(items, members) {
                Some(mean) => {
                    centroids[slot] = blend::blend(&centroids[slot], &mean, w_old, w_new);
                }
                None => {
                    let pick = rng.gen_range(0..n);
                    debug!("cluster {} is empty, reseeding with item {}", slot, pick);
                    centroids[slot] = items[pick].clone();
                }
            }
        }

        iteration += 1;
        let record = IterationRecord {
            iteration,
            elapsed_ms: start.elapsed().as_millis() as u64,
            changed,
            change_ratio: changed as f64 / n as f64,
        };
        debug!(
            "iteration {} took {}, {} changed ({:.2}%)",
            iteration,
            format_time(record.elapsed_ms),
            changed,
            record.change_ratio * 100.0
        );
        on_iteration(&record);
        let change_ratio = record.change_ratio;
        records.push(record);

        if change_ratio < params.early_stop {
            break (StopReason::EarlyStop, clusters);
        }
        if changed == 0 {
            break (StopReason::Converged, clusters);
        }
        if iteration >= params.max_iterations {
            break (StopReason::MaxIterations, clusters);
        }
    };

    info!("stopped after {} iterations: {:?}", iteration, stop);
    Ok(Clustering {
        centroids,
        assignments,
        clusters,
        records,
        stop,
    })
}
