//! Transposition-normalized pitch-class histograms
//!
//! A histogram is the fingerprint compared by the prefilter. Pitches are
//! normalized against their own median, shifted, folded into one octave and
//! binned at the session resolution (one bin per pitch unit), then
//! L1-normalized.

use cantus_shared_config::Resolution;
use serde::Serialize;

use super::sequence::median;

/// Normalized pitch-class distribution
///
/// Invariant: bins sum to 1, or are all zero when built from an empty
/// sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    bins: Vec<f64>,
}

impl Histogram {
    /// All-zero histogram for a resolution
    pub fn zeros(resolution: Resolution) -> Self {
        Self {
            bins: vec![0.0; resolution.bins_per_octave()],
        }
    }

    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// True for the degenerate histogram of an empty sequence
    pub fn is_zero(&self) -> bool {
        self.bins.iter().all(|&b| b == 0.0)
    }

    pub fn sum(&self) -> f64 {
        self.bins.iter().sum()
    }

    /// Rotate bins by an integer shift
    ///
    /// For whole-unit shifts this equals rebuilding the histogram with that
    /// shift, which lets the corpus store one histogram per chunk.
    pub fn rotated(&self, shift: i32) -> Self {
        let n = self.bins.len();
        if n == 0 {
            return self.clone();
        }
        let mut bins = vec![0.0; n];
        let offset = shift.rem_euclid(n as i32) as usize;
        for (i, &value) in self.bins.iter().enumerate() {
            bins[(i + offset) % n] = value;
        }
        Self { bins }
    }
}

/// Build the histogram of `pitches` after median normalization and `shift`
pub fn histogram(pitches: &[f64], shift: f64, resolution: Resolution) -> Histogram {
    let Some(center) = median(pitches) else {
        return Histogram::zeros(resolution);
    };

    let n_bins = resolution.bins_per_octave();
    let octave = resolution.octave();
    let mut bins = vec![0.0; n_bins];

    for &pitch in pitches {
        let folded = (pitch - center + shift).rem_euclid(octave);
        // rem_euclid can round up to exactly `octave` for tiny negatives
        let bin = (folded.floor() as usize).min(n_bins - 1);
        bins[bin] += 1.0;
    }

    let total = pitches.len() as f64;
    for b in &mut bins {
        *b /= total;
    }
    Histogram { bins }
}

/// Cosine similarity, defined as 0 when either vector is all-zero
pub fn cosine_similarity(a: &Histogram, b: &Histogram) -> f64 {
    cosine(a.bins(), b.bins())
}

/// Cosine similarity over raw slices of equal length
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "histograms from different resolutions");

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
