//! Dynamic time warping with a stretch penalty
//!
//! Local cost is the squared pitch difference. On top of the accumulated
//! cost, every maximal run of purely horizontal or purely vertical path
//! steps adds `factor * run_length^2`. Runs touching the first or last
//! `edge_threshold` path positions are charged a tenth of that, since
//! melodies often open and close on held notes.

use ndarray::Array2;
use serde::Serialize;

use crate::error::{MatchError, MatchResult};

/// Divisors applied in turn to the penalty of a run at either path edge
const EDGE_LENIENCY_DIVISORS: [f64; 2] = [5.0, 2.0];

/// An optimal warping path and its scores
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alignment {
    /// Accumulated squared-difference cost along the path
    pub raw_distance: f64,
    /// Sum of stretch penalties
    pub penalty: f64,
    /// `(query_index, reference_index)` pairs from `(0, 0)` to the last cells
    pub path: Vec<(usize, usize)>,
}

impl Alignment {
    /// Raw distance plus stretch penalty
    pub fn distance(&self) -> f64 {
        self.raw_distance + self.penalty
    }
}

/// Direction of one path step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Diagonal,
    /// Query advances, reference held
    Vertical,
    /// Reference advances, query held
    Horizontal,
}

/// Classic DTW over two pitch sequences
///
/// Returns the accumulated cost and the optimal path. Backtracking prefers
/// the diagonal, then the vertical step, when predecessors tie.
pub fn dtw(query: &[f64], reference: &[f64]) -> MatchResult<(f64, Vec<(usize, usize)>)> {
    if query.is_empty() || reference.is_empty() {
        return Err(MatchError::AlignmentFailure(format!(
            "cannot align sequences of length {} and {}",
            query.len(),
            reference.len()
        )));
    }

    let (n, m) = (query.len(), reference.len());
    let mut cost = Array2::<f64>::zeros((n, m));

    for i in 0..n {
        for j in 0..m {
            let local = (query[i] - reference[j]).powi(2);
            let best_prev = match (i, j) {
                (0, 0) => 0.0,
                (0, _) => cost[[0, j - 1]],
                (_, 0) => cost[[i - 1, 0]],
                _ => cost[[i - 1, j - 1]]
                    .min(cost[[i - 1, j]])
                    .min(cost[[i, j - 1]]),
            };
            cost[[i, j]] = local + best_prev;
        }
    }

    let mut path = Vec::with_capacity(n + m);
    let (mut i, mut j) = (n - 1, m - 1);
    path.push((i, j));
    while (i, j) != (0, 0) {
        if i == 0 {
            j -= 1;
        } else if j == 0 {
            i -= 1;
        } else {
            let diagonal = cost[[i - 1, j - 1]];
            let up = cost[[i - 1, j]];
            let left = cost[[i, j - 1]];
            if diagonal <= up && diagonal <= left {
                i -= 1;
                j -= 1;
            } else if up <= left {
                i -= 1;
            } else {
                j -= 1;
            }
        }
        path.push((i, j));
    }
    path.reverse();

    Ok((cost[[n - 1, m - 1]], path))
}

/// Total stretch penalty of a warping path
pub fn stretch_penalty(path: &[(usize, usize)], factor: f64, edge_threshold: usize) -> f64 {
    if path.len() < 2 {
        return 0.0;
    }

    let steps: Vec<Step> = path
        .windows(2)
        .map(|w| match (w[1].0 > w[0].0, w[1].1 > w[0].1) {
            (true, true) => Step::Diagonal,
            (true, false) => Step::Vertical,
            _ => Step::Horizontal,
        })
        .collect();

    let last_position = path.len() - 1;
    let mut penalty = 0.0;
    let mut k = 0;
    while k < steps.len() {
        let kind = steps[k];
        let start = k;
        while k < steps.len() && steps[k] == kind {
            k += 1;
        }
        if kind == Step::Diagonal {
            continue;
        }

        // steps start..k span path positions start..=k
        let run_length = (k - start) as f64;
        let mut run_penalty = factor * run_length * run_length;
        let touches_edge =
            start < edge_threshold || k + edge_threshold > last_position;
        if touches_edge {
            for divisor in EDGE_LENIENCY_DIVISORS {
                run_penalty /= divisor;
            }
        }
        penalty += run_penalty;
    }
    penalty
}

/// DTW alignment scored with the stretch penalty
pub fn weighted_dtw(
    query: &[f64],
    reference: &[f64],
    penalty_factor: f64,
    edge_threshold: usize,
) -> MatchResult<Alignment> {
    let (raw_distance, path) = dtw(query, reference)?;
    let penalty = stretch_penalty(&path, penalty_factor, edge_threshold);
    Ok(Alignment {
        raw_distance,
        penalty,
        path,
    })
}
