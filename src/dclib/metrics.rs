use crate::dclib::Image;
use serde::Serialize;
use std::fmt;

/// Largest possible cosine distance
pub const MAX_DISTANCE: f64 = 2.0;

/// Computes the cosine distance between two images' pixel vectors.
/// The distance is calculated as 1 minus the cosine similarity of the row-major
/// flattened pixels, treated as raw integers.
///
/// # Parameters
/// - `a`: The first image.
/// - `b`: The second image. Must have the same shape as `a`.
///
/// # Returns
/// A value in [0, 2], lower is more similar:
/// - 0.0 for images pointing in the same direction, and for two blank images.
/// - `MAX_DISTANCE` when exactly one of the images is blank.
pub fn cosine_distance(a: &Image, b: &Image) -> f64 {
    debug_assert_eq!(a.shape(), b.shape());
    let mut dot: u64 = 0;
    let mut norm_a: u64 = 0;
    let mut norm_b: u64 = 0;

    for (&x, &y) in a.pixels().iter().zip(b.pixels()) {
        let (x, y) = (x as u64, y as u64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    match (norm_a == 0, norm_b == 0) {
        (true, true) => 0.0,
        (true, false) | (false, true) => MAX_DISTANCE,
        (false, false) => {
            // single sqrt keeps identical vectors at exactly 1
            let sim = dot as f64 / (norm_a as f64 * norm_b as f64).sqrt();
            (1.0 - sim).clamp(0.0, MAX_DISTANCE)
        }
    }
}

/// Letter grade derived from an accuracy percentage
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize)]
pub enum Grade {
    A,
    AMinus,
    BPlus,
    B,
    BMinus,
    CPlus,
    C,
    CMinus,
    DPlus,
    D,
    DMinus,
    F,
}

const GRADE_BREAKS: [(u32, Grade); 11] = [
    (93, Grade::A),
    (90, Grade::AMinus),
    (87, Grade::BPlus),
    (83, Grade::B),
    (80, Grade::BMinus),
    (77, Grade::CPlus),
    (73, Grade::C),
    (70, Grade::CMinus),
    (67, Grade::DPlus),
    (63, Grade::D),
    (60, Grade::DMinus),
];

impl Grade {
    /// Grade for a fraction in [0, 1]. The percentage is truncated before comparing
    /// against the breakpoints.
    pub fn from_accuracy(accuracy: f64) -> Self {
        let percent = (accuracy * 100.0).max(0.0) as u32;
        GRADE_BREAKS
            .iter()
            .find(|(cutoff, _)| percent >= *cutoff)
            .map_or(Grade::F, |(_, g)| *g)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Grade::A => "A",
            Grade::AMinus => "A-",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::BMinus => "B-",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::CMinus => "C-",
            Grade::DPlus => "D+",
            Grade::D => "D",
            Grade::DMinus => "D-",
            Grade::F => "F",
        };
        write!(f, "{}", s)
    }
}

/// Human readable duration for log lines
pub fn format_time(ms: u64) -> String {
    if ms < 1_000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1_000.0)
    } else if ms < 3_600_000 {
        format!("{}m", ms / 60_000)
    } else {
        format!("{:.1}h", ms as f64 / 3_600_000.0)
    }
}
