use crate::dclib::{Error, Image, Result};
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Threshold for the ASCII art shown while classifying
const ART_THRESHOLD: u8 = 128;
/// Centroid labels are single digits
const MAX_LABEL: u8 = 9;

fn parse_label(text: &str) -> Option<u8> {
    text.parse::<u8>().ok().filter(|&l| l <= MAX_LABEL)
}

/// Assigns a label to every centroid. This is a blocking request/response: the call returns
/// only once every centroid has a label.
pub trait CentroidClassifier {
    fn classify(&mut self, centroids: &[Image]) -> Result<Vec<u8>>;
}

/// Ask for labels and make sure there is exactly one per centroid
pub fn request_labels<C: CentroidClassifier + ?Sized>(
    classifier: &mut C,
    centroids: &[Image],
) -> Result<Vec<u8>> {
    let labels = classifier.classify(centroids)?;
    if labels.len() != centroids.len() {
        return Err(Error::LabelCount {
            expected: centroids.len(),
            found: labels.len(),
        });
    }
    Ok(labels)
}

/// Shows each centroid as ASCII art and reads one label per line.
/// Invalid answers are asked again; running out of input cancels.
pub struct ConsoleClassifier<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsoleClassifier<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, centroid: &Image, idx: usize, total: usize) -> Result<u8> {
        writeln!(self.output, "Centroid {}/{}:", idx + 1, total)?;
        writeln!(self.output, "{}", centroid.to_ascii(ART_THRESHOLD))?;
        loop {
            write!(self.output, "label> ")?;
            self.output.flush()?;
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(Error::Cancelled);
            }
            match parse_label(line.trim()) {
                Some(label) => return Ok(label),
                None => writeln!(self.output, "expected a digit 0-9, got {:?}", line.trim())?,
            }
        }
    }
}

impl<R: BufRead, W: Write> CentroidClassifier for ConsoleClassifier<R, W> {
    fn classify(&mut self, centroids: &[Image]) -> Result<Vec<u8>> {
        let total = centroids.len();
        centroids
            .iter()
            .enumerate()
            .map(|(idx, c)| self.ask(c, idx, total))
            .collect()
    }
}

/// Labels prepared ahead of time: whitespace separated integers, in centroid order
pub struct LabelFileClassifier {
    path: PathBuf,
}

impl LabelFileClassifier {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl CentroidClassifier for LabelFileClassifier {
    fn classify(&mut self, _centroids: &[Image]) -> Result<Vec<u8>> {
        let text = fs::read_to_string(&self.path)?;
        text.split_whitespace()
            .map(|tok| {
                parse_label(tok)
                    .ok_or_else(|| Error::Format(format!("bad centroid label {:?}", tok)))
            })
            .collect()
    }
}
