use digiclust::{
    cluster_main, kmeans, preprocess, score, write_images, write_labels, ClusterArgs,
    ClusterParams, Error, IOParams, IdxStore, Image, ImageStore, StopReason,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::ThreadPoolBuilder;
use std::fs;
use std::path::{Path, PathBuf};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("digiclust-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn square(v: u8, id: i64) -> Image {
    Image::from_rows(&[vec![v, v], vec![v, v]], id, None)
}

#[test]
fn black_and_white_converge() {
    let items = vec![square(0, 0), square(255, 1), square(255, 2), square(0, 3)];
    let params = ClusterParams {
        k: 2,
        max_iterations: 10,
        early_stop: 0.0,
        ..Default::default()
    };
    for seed in 0..16 {
        let result = kmeans(&items, &params, &mut StdRng::seed_from_u64(seed)).unwrap();
        assert_eq!(result.stop, StopReason::Converged);
        assert!(result.iterations() <= 2);

        let mut groups = result.clusters.clone();
        groups.sort();
        assert_eq!(groups, vec![vec![0, 3], vec![1, 2]]);

        let mut centroids: Vec<Vec<u8>> =
            result.centroids.iter().map(|c| c.pixels().to_vec()).collect();
        centroids.sort();
        assert_eq!(centroids, vec![vec![0; 4], vec![255; 4]]);
    }
}

#[test]
fn same_seed_same_clustering() {
    let items: Vec<Image> = (0..40u8)
        .map(|i| {
            let px = vec![i.wrapping_mul(7), 255 - i, i / 2, i.wrapping_mul(13), 30, i];
            Image::new(2, 3, px, i as i64, None)
        })
        .collect();
    let params = ClusterParams {
        k: 5,
        max_iterations: 8,
        early_stop: 0.0,
        ..Default::default()
    };
    let a = kmeans(&items, &params, &mut StdRng::seed_from_u64(99)).unwrap();
    let b = kmeans(&items, &params, &mut StdRng::seed_from_u64(99)).unwrap();
    assert_eq!(a.assignments, b.assignments);
    assert_eq!(a.centroids, b.centroids);
    assert_eq!(a.stop, b.stop);
}

#[test]
fn thread_count_does_not_matter() {
    let items: Vec<Image> = (0..300u32)
        .map(|i| {
            let px = (0..9u32).map(|p| ((i * 31 + p * p * 17) % 256) as u8).collect();
            Image::new(3, 3, px, i as i64, None)
        })
        .collect();
    let params = ClusterParams {
        k: 7,
        max_iterations: 20,
        early_stop: 0.0,
        ..Default::default()
    };
    let run = |threads: usize| {
        let pool = ThreadPoolBuilder::new().num_threads(threads).build().unwrap();
        pool.install(|| kmeans(&items, &params, &mut StdRng::seed_from_u64(3)).unwrap())
    };
    let single = run(1);
    let many = run(8);
    assert_eq!(single.assignments, many.assignments);
    assert_eq!(single.centroids, many.centroids);
    assert_eq!(single.stop, many.stop);
    assert_eq!(single.iterations(), many.iterations());
}

#[test]
fn idx_store_on_disk() {
    let dir = scratch_dir("store");
    let store = IdxStore::new(&dir.join("imgs"), &dir.join("lbls"));
    let imgs = vec![
        Image::new(2, 2, vec![1, 2, 3, 4], 0, Some(1)),
        Image::new(2, 2, vec![5, 6, 7, 8], 1, Some(9)),
    ];
    store.store(&imgs, true).unwrap();
    assert_eq!(store.load_labels().unwrap(), vec![1, 9]);
    assert_eq!(store.load_labeled().unwrap(), imgs);
    let _ = fs::remove_dir_all(&dir);
}

/// Two stroke shapes: a bar on the left (label 1) and a bar on the right (label 7)
fn strokes() -> Vec<Image> {
    (0..20)
        .map(|i| {
            let v = 120 + (i as u8) * 5;
            let left = i % 2 == 0;
            let px = (0..16)
                .map(|p| if (p % 4 < 2) == left { v } else { 0 })
                .collect();
            Image::new(4, 4, px, i, Some(if left { 1 } else { 7 }))
        })
        .collect()
}

/// Write the stroke set and an answers file into `dir`, returning arguments for a run
fn stroke_run(dir: &Path) -> ClusterArgs {
    let items = strokes();
    let mut out = fs::File::create(dir.join("imgs")).unwrap();
    write_images(&mut out, &items).unwrap();
    let mut out = fs::File::create(dir.join("lbls")).unwrap();
    write_labels(&mut out, &items).unwrap();
    fs::write(dir.join("answers"), "1\n7\n").unwrap();

    ClusterArgs {
        io: IOParams {
            images: dir.join("imgs"),
            labels: dir.join("lbls"),
            out: dir.join("out"),
            centroid_labels: Some(dir.join("answers")),
            threads: 2,
            no_clusters: false,
            debug: false,
        },
        cluster: ClusterParams {
            k: 2,
            seed: 5,
            max_iterations: 10,
            early_stop: 0.0,
            ..Default::default()
        },
    }
}

#[test]
fn full_run_exports() {
    let dir = scratch_dir("run");
    let summary = cluster_main(stroke_run(&dir)).unwrap();

    assert_eq!(summary.n_items, 20);
    assert_eq!(summary.report.clusters.len(), 2);
    assert!(summary.report.clusters.iter().all(|c| c.size == 10));
    // the answers either line up with the clusters or are swapped
    let acc = summary.report.accuracy.unwrap();
    assert!(acc == 1.0 || acc == 0.0, "accuracy {}", acc);

    let out = dir.join("out");
    for name in [
        "centroid-images",
        "centroid-labels",
        "cluster01-images",
        "cluster02-images",
        "incorrect-images",
        "incorrect-labels",
        "run-summary.json",
    ] {
        assert!(out.join(name).is_file(), "missing {}", name);
    }
    assert_eq!(
        fs::read_to_string(out.join("centroid-labels")).unwrap(),
        "1\n7\n"
    );
    let cluster_lines = fs::read_to_string(out.join("cluster01-images"))
        .unwrap()
        .lines()
        .count();
    assert_eq!(cluster_lines, 10 * 4);
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("run-summary.json")).unwrap()).unwrap();
    assert_eq!(json["params"]["k"], 2);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn failed_export_is_an_error() {
    let dir = scratch_dir("blocked");
    let args = stroke_run(&dir);
    // a directory where the centroid labels file should go
    fs::create_dir_all(dir.join("out").join("centroid-labels")).unwrap();
    let err = cluster_main(args).unwrap_err();
    assert!(matches!(err, Error::Export(_)), "{}", err);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn scoring_after_preprocessing_keeps_labels() {
    let items = strokes();
    let filtered = preprocess(&items, 1.2);
    let clusters = vec![
        (0..20).step_by(2).collect::<Vec<usize>>(),
        (1..20).step_by(2).collect::<Vec<usize>>(),
    ];
    let report = score(&filtered, &clusters, &[1, 7]);
    assert_eq!(report.accuracy, Some(1.0));
}
