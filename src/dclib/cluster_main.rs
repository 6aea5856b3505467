use crate::dclib::{
    check_shapes, classify, filters, kmeans, metrics::format_time, scorer, spawn_exporter,
    ClusterArgs, ClusterParams, ConsoleClassifier, Error, ExportFlags, ExportJob, Grade, IdxStore,
    Image, IterationRecord, LabelFileClassifier, Result, StopReason, TextExporter,
};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::ThreadPoolBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;

/// Everything worth keeping about a finished run
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub params: ClusterParams,
    pub n_items: usize,
    pub stop: StopReason,
    pub iterations: Vec<IterationRecord>,
    pub total_ms: u64,
    pub report: scorer::AccuracyReport,
}

pub fn cluster_main(args: ClusterArgs) -> Result<RunSummary> {
    let store = IdxStore::new(&args.io.images, &args.io.labels);
    let items = store.load_labeled()?;
    // reject before any parallel work
    args.cluster.check(items.len())?;
    let (rows, columns) = check_shapes(&items)?;
    info!("loaded {} images of {}x{}", items.len(), rows, columns);

    let pool = ThreadPoolBuilder::new()
        .num_threads(args.io.threads)
        .build()
        .expect("Failed to build thread pool");

    let sty = ProgressStyle::with_template(
        " [{elapsed_precise}] {bar:44.cyan/blue} > {pos}/{len} iterations {msg}",
    )
    .expect("valid progress template")
    .progress_chars("##-");
    let pbar = ProgressBar::new(args.cluster.max_iterations as u64).with_style(sty);

    let mut rng = StdRng::seed_from_u64(args.cluster.seed);
    let (items, clustering, centroids) = pool.install(|| -> Result<_> {
        info!("preprocessing");
        let items = filters::preprocess(&items, args.cluster.gain);
        info!(
            "clustering into {} groups over at most {} iterations",
            args.cluster.k, args.cluster.max_iterations
        );
        let clustering = kmeans::kmeans_with(&items, &args.cluster, &mut rng, |rec| {
            pbar.set_message(format!("({:.2}% changed)", rec.change_ratio * 100.0));
            pbar.inc(1);
        })?;
        let centroids = filters::postprocess(&clustering.centroids);
        Ok((items, clustering, centroids))
    })?;
    pbar.finish();

    let total_ms: u64 = clustering.records.iter().map(|r| r.elapsed_ms).sum();
    let avg_ms = total_ms / clustering.iterations().max(1) as u64;
    info!(
        "clustering took {} (~{} per iteration)",
        format_time(total_ms),
        format_time(avg_ms)
    );

    let mut centroids: Vec<Image> = centroids
        .into_iter()
        .enumerate()
        .map(|(i, mut c)| {
            c.id = i as i64 + 1;
            c
        })
        .collect();

    info!("waiting for centroid classification");
    let labels = match &args.io.centroid_labels {
        Some(path) => classify::request_labels(&mut LabelFileClassifier::new(path), &centroids)?,
        None => {
            let stdin = std::io::stdin();
            let mut console = ConsoleClassifier::new(stdin.lock(), std::io::stderr());
            classify::request_labels(&mut console, &centroids)?
        }
    };
    for (c, &l) in centroids.iter_mut().zip(&labels) {
        c.label = Some(l);
    }

    let report = scorer::score(&items, &clustering.clusters, &labels);
    for s in &report.clusters {
        match s.purity {
            Some(p) => info!(
                "cluster {:2} (classified as {}) accuracy: {:6.2}% ({}) of {} images",
                s.cluster + 1,
                s.label,
                p * 100.0,
                Grade::from_accuracy(p),
                s.size
            ),
            None => warn!("cluster {:2} is empty", s.cluster + 1),
        }
    }
    match (report.accuracy, report.grade) {
        (Some(acc), Some(grade)) => info!("overall accuracy: {:.2}% ({})", acc * 100.0, grade),
        _ => warn!("no cluster could be scored"),
    }
    for digit in 0..=9u8 {
        if let Some(c) = scorer::dominant_cluster(&items, &clustering.clusters, digit) {
            debug!("label {} mostly landed in cluster {}", digit, c + 1);
        }
    }

    let mut flags = ExportFlags::all();
    if args.io.no_clusters {
        flags -= ExportFlags::CLUSTERS;
    }
    let (export_sender, export_handle) = spawn_exporter(TextExporter::new(&args.io.out)?);
    let send = |job: Option<ExportJob>| {
        export_sender
            .send(job)
            .map_err(|_| Error::Export("export thread stopped".to_string()))
    };
    if flags.contains(ExportFlags::CENTROIDS) {
        send(Some(ExportJob::Centroids(centroids, labels.clone())))?;
    }
    if flags.contains(ExportFlags::CLUSTERS) {
        let members = clustering
            .clusters
            .iter()
            .map(|m| m.iter().map(|&i| items[i].clone()).collect())
            .collect();
        send(Some(ExportJob::Clusters(members)))?;
    }
    if flags.contains(ExportFlags::INCORRECT) {
        let wrong = scorer::misclassified(&items, &clustering.assignments, &labels)
            .into_iter()
            .map(|i| items[i].clone())
            .collect();
        send(Some(ExportJob::Incorrect(wrong)))?;
    }
    send(None)?;

    let summary = RunSummary {
        params: args.cluster.clone(),
        n_items: items.len(),
        stop: clustering.stop,
        iterations: clustering.records,
        total_ms,
        report,
    };
    let out = BufWriter::new(File::create(args.io.out.join("run-summary.json"))?);
    serde_json::to_writer_pretty(out, &summary).map_err(std::io::Error::from)?;

    let failures = export_handle.join().expect("export thread panicked");
    if failures > 0 {
        return Err(Error::Export(format!(
            "{} exports failed, see log for details",
            failures
        )));
    }
    Ok(summary)
}
