use crate::dclib::{metrics, Image};
use rand::Rng;
use rayon::prelude::*;

/// K-Means++ seeding. Returns the indices of the `k` items chosen as initial centroids.
///
/// The first centroid is a uniform draw. Every following centroid is drawn with probability
/// proportional to each item's distance to its nearest already-chosen centroid. The same item
/// can be chosen twice when distances collapse; the refinement loop tolerates that.
/// Callers guarantee `0 < k <= items.len()`.
pub fn kmeans_plusplus<R: Rng>(items: &[Image], k: usize, rng: &mut R) -> Vec<usize> {
    let mut chosen = Vec::with_capacity(k);
    chosen.push(rng.gen_range(0..items.len()));
    trace!("initial centroid 0 is item {}", chosen[0]);

    let mut nearest = vec![f64::INFINITY; items.len()];
    for i in 1..k {
        let prev = &items[chosen[i - 1]];
        nearest.par_iter_mut().zip(items).for_each(|(d, item)| {
            *d = d.min(metrics::cosine_distance(item, prev));
        });
        // summed in index order so the draw is reproducible
        let total: f64 = nearest.iter().sum();
        let pick = roulette(&nearest, rng.gen::<f64>() * total);
        trace!("initial centroid {} is item {} (total {:.3})", i, pick, total);
        chosen.push(pick);
    }

    chosen
}

/// Walk the weights in order, subtracting from `r` until it drops to zero.
/// Falls through to the last index if the walk never gets there.
fn roulette(weights: &[f64], mut r: f64) -> usize {
    for (idx, w) in weights.iter().enumerate() {
        r -= w;
        if r <= 0.0 {
            return idx;
        }
    }
    weights.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn items() -> Vec<Image> {
        (0..12u8)
            .map(|i| {
                let px = vec![i * 10 + 1, 255 - i * 20, (i % 3) * 40, 7];
                Image::new(2, 2, px, i as i64, None)
            })
            .collect()
    }

    #[test]
    fn roulette_walk() {
        assert_eq!(roulette(&[1.0, 2.0, 3.0], 0.5), 0);
        assert_eq!(roulette(&[1.0, 2.0, 3.0], 1.0), 0);
        assert_eq!(roulette(&[1.0, 2.0, 3.0], 2.5), 1);
        assert_eq!(roulette(&[1.0, 2.0, 3.0], 5.9), 2);
        // nothing left to draw from
        assert_eq!(roulette(&[0.0, 0.0, 0.0], 0.0), 0);
        assert_eq!(roulette(&[1.0, 1.0], 7.0), 1);
    }

    #[test]
    fn seeded_runs_repeat() {
        let data = items();
        let a = kmeans_plusplus(&data, 5, &mut StdRng::seed_from_u64(11));
        let b = kmeans_plusplus(&data, 5, &mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
        assert!(a.iter().all(|&i| i < data.len()));
    }

    #[test]
    fn spreads_out() {
        // two tight groups; the second pick must come from the other group
        let mut data = vec![Image::new(1, 2, vec![200, 1], 0, None); 5];
        data.extend(vec![Image::new(1, 2, vec![1, 200], 5, None); 5]);
        for seed in 0..20 {
            let picks = kmeans_plusplus(&data, 2, &mut StdRng::seed_from_u64(seed));
            assert_ne!(picks[0] < 5, picks[1] < 5);
        }
    }

    #[test]
    fn identical_items() {
        let data = vec![Image::new(1, 1, vec![9], 0, None); 4];
        let picks = kmeans_plusplus(&data, 4, &mut StdRng::seed_from_u64(3));
        assert_eq!(picks.len(), 4);
    }
}
