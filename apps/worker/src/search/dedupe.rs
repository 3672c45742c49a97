//! Collapse ranked matches to one per track

use std::collections::HashSet;

use super::Match;

/// Keep the first match of each track, in input order, up to `top_n` tracks
pub fn dedupe(ranked: Vec<Match>, top_n: usize) -> Vec<Match> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut unique = Vec::with_capacity(top_n.min(ranked.len()));

    for m in ranked {
        if unique.len() >= top_n {
            break;
        }
        if seen.insert(m.track_id.clone()) {
            unique.push(m);
        }
    }
    unique
}
