//! Rotation-search scale classification
//!
//! Every template is tried at all 12 rotations unless the caller restricts
//! them. A rotation's score is the fraction of input notes whose pitch class
//! falls inside the rotated set.

use cantus_shared_config::{Resolution, ShiftRange};
use serde::Serialize;

use super::catalog::{ScaleCatalog, PITCH_CLASSES};

/// Standard pitch class names
pub const NOTE_NAMES: [&str; PITCH_CLASSES] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Best rotation of one template
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleMatch {
    pub name: String,
    /// Fraction of notes inside the rotated template, in `[0, 1]`
    pub score: f64,
    /// Rotation in pitch classes (0..12)
    pub rotation: u8,
    /// Note name of the rotation's root
    pub root: &'static str,
    /// Circular distance from the root to the lowest note's pitch class
    pub root_distance: u8,
}

/// Reduce notes to pitch classes `0..12`
///
/// Quarter-tone pitches are halved before rounding; non-finite values are
/// skipped.
pub fn pitch_classes(notes: &[f64], resolution: Resolution) -> Vec<usize> {
    let units = resolution.units_per_semitone();
    notes
        .iter()
        .filter(|n| n.is_finite())
        .map(|&n| ((n / units).round() as i64).rem_euclid(PITCH_CLASSES as i64) as usize)
        .collect()
}

fn circular_distance(a: usize, b: usize) -> usize {
    let d = a.abs_diff(b) % PITCH_CLASSES;
    d.min(PITCH_CLASSES - d)
}

/// Rotations tried by [`classify`]: every pitch class once
pub const ALL_ROTATIONS: ShiftRange = ShiftRange::from_zero(PITCH_CLASSES as u16 - 1);

/// Rank catalog templates by how well their best rotation covers `notes`
///
/// Tries every rotation in [`ALL_ROTATIONS`]. See [`classify_with_rotations`]
/// for the ranking rules.
pub fn classify(notes: &[f64], catalog: &ScaleCatalog, resolution: Resolution) -> Vec<ScaleMatch> {
    classify_with_rotations(notes, catalog, resolution, ALL_ROTATIONS)
}

/// Rank catalog templates over a restricted set of rotations
///
/// Rotations are reduced modulo 12. The lowest note is taken as the tonic.
/// Per template, ties between rotations go to the rotation whose root is
/// circularly closest to the tonic's pitch class, then to the earlier
/// rotation in `rotations`. Templates are sorted by score descending, then by
/// that root distance, keeping catalog order for full ties. Empty input
/// yields an empty ranking.
pub fn classify_with_rotations(
    notes: &[f64],
    catalog: &ScaleCatalog,
    resolution: Resolution,
    rotations: ShiftRange,
) -> Vec<ScaleMatch> {
    let classes = pitch_classes(notes, resolution);
    let Some(tonic) = lowest_pitch_class(notes, resolution) else {
        return Vec::new();
    };

    let mut counts = [0usize; PITCH_CLASSES];
    for &pc in &classes {
        counts[pc] += 1;
    }
    let total = classes.len() as f64;

    let mut ranked: Vec<ScaleMatch> = catalog
        .templates()
        .iter()
        .map(|template| {
            let (rotation, score, distance) = rotations
                .iter()
                .map(|r| {
                    let rotation = r.rem_euclid(PITCH_CLASSES as i32) as usize;
                    let mask = template.rotated_mask(rotation);
                    let hits: usize = (0..PITCH_CLASSES)
                        .filter(|&pc| mask[pc])
                        .map(|pc| counts[pc])
                        .sum();
                    (rotation, hits as f64 / total, circular_distance(rotation, tonic))
                })
                .fold((0, f64::NEG_INFINITY, usize::MAX), |best, next| {
                    if next.1 > best.1 || (next.1 == best.1 && next.2 < best.2) {
                        next
                    } else {
                        best
                    }
                });
            ScaleMatch {
                name: template.name().to_string(),
                score,
                rotation: rotation as u8,
                root: NOTE_NAMES[rotation],
                root_distance: distance as u8,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.root_distance.cmp(&b.root_distance))
    });
    tracing::debug!(
        notes = classes.len(),
        tonic = NOTE_NAMES[tonic],
        best = ranked.first().map(|m| m.name.as_str()),
        "Scale classification complete"
    );
    ranked
}

/// Pitch class of the lowest finite note
fn lowest_pitch_class(notes: &[f64], resolution: Resolution) -> Option<usize> {
    let lowest = notes
        .iter()
        .copied()
        .filter(|n| n.is_finite())
        .min_by(f64::total_cmp)?;
    pitch_classes(&[lowest], resolution).first().copied()
}
