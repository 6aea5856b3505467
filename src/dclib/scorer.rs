use crate::dclib::{Grade, Image};
use serde::Serialize;

/// Purity of one cluster against its assigned label
#[derive(Debug, Clone, Serialize)]
pub struct ClusterScore {
    pub cluster: usize,
    pub label: u8,
    pub size: usize,
    pub correct: usize,
    /// `None` for an empty cluster
    pub purity: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccuracyReport {
    pub clusters: Vec<ClusterScore>,
    /// Unweighted mean purity over the non-empty clusters
    pub accuracy: Option<f64>,
    pub grade: Option<Grade>,
}

/// Score every cluster's purity given the label assigned to its centroid.
/// `clusters[i]` holds item indices and `centroid_labels[i]` its label.
pub fn score(items: &[Image], clusters: &[Vec<usize>], centroid_labels: &[u8]) -> AccuracyReport {
    debug_assert_eq!(clusters.len(), centroid_labels.len());
    let scores: Vec<ClusterScore> = clusters
        .iter()
        .zip(centroid_labels)
        .enumerate()
        .map(|(cluster, (members, &label))| {
            let correct = members
                .iter()
                .filter(|&&m| items[m].label == Some(label))
                .count();
            let size = members.len();
            ClusterScore {
                cluster,
                label,
                size,
                correct,
                purity: (size > 0).then(|| correct as f64 / size as f64),
            }
        })
        .collect();

    let defined: Vec<f64> = scores.iter().filter_map(|s| s.purity).collect();
    let accuracy = if defined.is_empty() {
        None
    } else {
        Some(defined.iter().sum::<f64>() / defined.len() as f64)
    };

    AccuracyReport {
        clusters: scores,
        accuracy,
        grade: accuracy.map(Grade::from_accuracy),
    }
}

/// Items whose ground-truth label differs from the label of the cluster they landed in
pub fn misclassified(items: &[Image], assignments: &[usize], centroid_labels: &[u8]) -> Vec<usize> {
    items
        .iter()
        .zip(assignments)
        .enumerate()
        .filter(|(_, (item, &c))| item.label != Some(centroid_labels[c]))
        .map(|(idx, _)| idx)
        .collect()
}

/// Cluster holding the most items with ground-truth `label`, if any item has it
pub fn dominant_cluster(items: &[Image], clusters: &[Vec<usize>], label: u8) -> Option<usize> {
    clusters
        .iter()
        .map(|m| m.iter().filter(|&&i| items[i].label == Some(label)).count())
        .enumerate()
        .filter(|&(_, count)| count > 0)
        // first cluster wins a tie
        .fold(None, |best: Option<(usize, usize)>, (idx, count)| match best {
            Some((_, c)) if c >= count => best,
            _ => Some((idx, count)),
        })
        .map(|(idx, _)| idx)
}
