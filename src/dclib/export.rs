use crate::dclib::{Image, Result};
use bitflags::bitflags;
use crossbeam_channel::{unbounded, Sender};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

bitflags! {
    /// Which artifacts a run writes out
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ExportFlags: u32 {
        const CENTROIDS = 0b001;  // Sharpened centroids and their labels
        const CLUSTERS  = 0b010;  // Every cluster's members
        const INCORRECT = 0b100;  // Items whose label disagrees with their cluster
    }
}

/// Destination for the terminal artifacts of a run. The three exports are independent.
pub trait ExportSink {
    fn export_centroids(&mut self, centroids: &[Image], labels: &[u8]) -> Result<()>;
    fn export_clusters(&mut self, clusters: &[Vec<Image>]) -> Result<()>;
    fn export_incorrect(&mut self, items: &[Image]) -> Result<()>;
}

/// Writes plain text files into a directory
pub struct TextExporter {
    dir: PathBuf,
}

impl TextExporter {
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn create(&self, name: &str) -> Result<BufWriter<File>> {
        let m_page = page_size::get() * 1000;
        let file = File::create(self.dir.join(name))?;
        Ok(BufWriter::with_capacity(m_page, file))
    }

    fn write_images(&self, name: &str, images: &[Image]) -> Result<()> {
        let mut writer = self.create(name)?;
        for image in images {
            writeln!(writer, "{}", image.to_text())?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_labels<I: IntoIterator<Item = String>>(&self, name: &str, labels: I) -> Result<()> {
        let mut writer = self.create(name)?;
        for label in labels {
            writeln!(writer, "{}", label)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn label_text(label: Option<u8>) -> String {
    label.map_or_else(|| "-1".to_string(), |l| l.to_string())
}

impl ExportSink for TextExporter {
    fn export_centroids(&mut self, centroids: &[Image], labels: &[u8]) -> Result<()> {
        self.write_images("centroid-images", centroids)?;
        self.write_labels("centroid-labels", labels.iter().map(|l| l.to_string()))
    }

    fn export_clusters(&mut self, clusters: &[Vec<Image>]) -> Result<()> {
        for (idx, members) in clusters.iter().enumerate() {
            self.write_images(&format!("cluster{:02}-images", idx + 1), members)?;
        }
        Ok(())
    }

    fn export_incorrect(&mut self, items: &[Image]) -> Result<()> {
        self.write_images("incorrect-images", items)?;
        self.write_labels("incorrect-labels", items.iter().map(|i| label_text(i.label)))
    }
}

/// Work handed to the export thread
pub enum ExportJob {
    Centroids(Vec<Image>, Vec<u8>),
    Clusters(Vec<Vec<Image>>),
    Incorrect(Vec<Image>),
}

/// Run a sink on its own thread. Send jobs, then `None` (or drop every sender) to finish.
/// Joining the handle returns how many jobs failed.
pub fn spawn_exporter<S>(mut sink: S) -> (Sender<Option<ExportJob>>, JoinHandle<usize>)
where
    S: ExportSink + Send + 'static,
{
    let (sender, receiver) = unbounded::<Option<ExportJob>>();
    let handle = thread::spawn(move || {
        let mut failures = 0;
        loop {
            let job = match receiver.recv() {
                Ok(None) | Err(_) => break,
                Ok(Some(job)) => job,
            };
            let (what, result) = match job {
                ExportJob::Centroids(c, l) => ("centroids", sink.export_centroids(&c, &l)),
                ExportJob::Clusters(c) => ("clusters", sink.export_clusters(&c)),
                ExportJob::Incorrect(i) => ("incorrect items", sink.export_incorrect(&i)),
            };
            match result {
                Ok(()) => info!("exported {}", what),
                Err(e) => {
                    error!("unable to export {}: {}", what, e);
                    failures += 1;
                }
            }
        }
        failures
    });
    (sender, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl ExportSink for Recorder {
        fn export_centroids(&mut self, centroids: &[Image], labels: &[u8]) -> Result<()> {
            let line = format!("centroids {} {:?}", centroids.len(), labels);
            self.0.lock().unwrap().push(line);
            Ok(())
        }

        fn export_clusters(&mut self, clusters: &[Vec<Image>]) -> Result<()> {
            let line = format!("clusters {}", clusters.len());
            self.0.lock().unwrap().push(line);
            Ok(())
        }

        fn export_incorrect(&mut self, _items: &[Image]) -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into())
        }
    }

    #[test]
    fn exporter_thread() {
        let rec = Recorder::default();
        let (tx, handle) = spawn_exporter(rec.clone());
        let img = Image::new(1, 1, vec![5], 0, Some(1));
        tx.send(Some(ExportJob::Centroids(vec![img.clone()], vec![1])))
            .unwrap();
        tx.send(Some(ExportJob::Clusters(vec![vec![img.clone()], vec![]])))
            .unwrap();
        tx.send(Some(ExportJob::Incorrect(vec![img]))).unwrap();
        tx.send(None).unwrap();
        assert_eq!(handle.join().unwrap(), 1);
        assert_eq!(
            *rec.0.lock().unwrap(),
            vec!["centroids 1 [1]".to_string(), "clusters 2".to_string()]
        );
    }

    #[test]
    fn flags() {
        let all = ExportFlags::all();
        assert!(all.contains(ExportFlags::CLUSTERS));
        let some = all - ExportFlags::CLUSTERS;
        assert!(!some.contains(ExportFlags::CLUSTERS));
        assert!(some.contains(ExportFlags::CENTROIDS | ExportFlags::INCORRECT));
    }

    #[test]
    fn label_rendering() {
        assert_eq!(label_text(Some(3)), "3");
        assert_eq!(label_text(None), "-1");
    }
}
