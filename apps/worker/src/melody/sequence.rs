//! Monophonic pitch sequences and note-event extraction
//!
//! A [`PitchSequence`] is the common currency of the matcher: queries and
//! reference tracks are both reduced to ordered `(pitch, onset)` samples
//! before chunking, histogramming or alignment.

use cantus_shared_config::Resolution;
use serde::{Deserialize, Serialize};

use crate::error::{MatchError, MatchResult};

/// Reference frequency for A4
const A4_FREQUENCY_HZ: f64 = 440.0;

/// MIDI note number of A4
const A4_MIDI_NOTE: f64 = 69.0;

/// A timestamped note event from an upstream transcriber or MIDI file
///
/// A positive velocity marks an onset; velocity 0 is a release and is
/// ignored by onset extraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Pitch in the session's unit (MIDI semitones or quarter tones)
    pub pitch: f64,
    /// Event time in seconds
    pub time: f64,
    /// MIDI velocity (0 = release)
    pub velocity: u8,
}

impl NoteEvent {
    /// Create an onset event
    pub fn on(pitch: f64, time: f64, velocity: u8) -> Self {
        Self {
            pitch,
            time,
            velocity,
        }
    }

    /// Create a release event
    pub fn off(pitch: f64, time: f64) -> Self {
        Self {
            pitch,
            time,
            velocity: 0,
        }
    }

    pub fn is_onset(&self) -> bool {
        self.velocity > 0
    }
}

/// Ordered onset pitches with their times in seconds
///
/// Invariant: `pitches.len() == times.len()` and `times` is non-decreasing.
/// An empty sequence means "no notes detected" and is always valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PitchSequence {
    pitches: Vec<f64>,
    times: Vec<f64>,
}

impl PitchSequence {
    /// Build a sequence from parallel pitch and time vectors
    pub fn new(pitches: Vec<f64>, times: Vec<f64>) -> MatchResult<Self> {
        if pitches.len() != times.len() {
            return Err(MatchError::invalid_parameters(format!(
                "pitch/time length mismatch: {} pitches, {} times",
                pitches.len(),
                times.len()
            )));
        }
        if let Some(bad) = pitches.iter().chain(times.iter()).find(|v| !v.is_finite()) {
            return Err(MatchError::invalid_parameters(format!(
                "non-finite value {} in pitch sequence",
                bad
            )));
        }
        if times.windows(2).any(|w| w[1] < w[0]) {
            return Err(MatchError::invalid_parameters(
                "pitch sequence times must be non-decreasing",
            ));
        }
        Ok(Self { pitches, times })
    }

    /// Build a sequence from pitches sampled at a fixed interval
    pub fn from_pitches(pitches: Vec<f64>, interval_secs: f64) -> MatchResult<Self> {
        let times = (0..pitches.len())
            .map(|i| i as f64 * interval_secs)
            .collect();
        Self::new(pitches, times)
    }

    /// Collapse a note-event stream into onset samples
    ///
    /// Every event with positive velocity contributes one sample; releases
    /// and non-finite events are dropped. Events are ordered by time with a
    /// stable sort so simultaneous onsets keep their stream order.
    pub fn from_events(events: &[NoteEvent]) -> Self {
        let mut onsets: Vec<(f64, f64)> = events
            .iter()
            .filter(|e| e.is_onset() && e.pitch.is_finite() && e.time.is_finite())
            .map(|e| (e.pitch, e.time))
            .collect();
        onsets.sort_by(|a, b| a.1.total_cmp(&b.1));

        let (pitches, times) = onsets.into_iter().unzip();
        Self { pitches, times }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pitches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pitches.is_empty()
    }

    pub fn pitches(&self) -> &[f64] {
        &self.pitches
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Time of the last onset (0 for an empty sequence)
    pub fn duration(&self) -> f64 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Iterate `(pitch, time)` samples
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.pitches.iter().copied().zip(self.times.iter().copied())
    }

    /// Median pitch, or `None` when empty
    pub fn median(&self) -> Option<f64> {
        median(&self.pitches)
    }

    /// Run-length encode repeated pitch values as `(pitch, run_length)`
    ///
    /// Run lengths approximate note durations for transcribers that emit one
    /// onset per analysis frame.
    pub fn runs(&self) -> Vec<(f64, usize)> {
        let mut runs: Vec<(f64, usize)> = Vec::new();
        for &pitch in &self.pitches {
            match runs.last_mut() {
                Some((current, len)) if *current == pitch => *len += 1,
                _ => runs.push((pitch, 1)),
            }
        }
        runs
    }

    /// Drop runs of repeated pitch shorter than `min_run`
    ///
    /// Removes the one- or two-frame blips pitch trackers produce at note
    /// transitions. Times of the surviving samples are kept as-is.
    pub fn without_short_runs(&self, min_run: usize) -> Self {
        if min_run <= 1 {
            return self.clone();
        }

        let mut pitches = Vec::with_capacity(self.len());
        let mut times = Vec::with_capacity(self.len());
        let mut start = 0;
        for (pitch, len) in self.runs() {
            if len >= min_run {
                pitches.extend(std::iter::repeat(pitch).take(len));
                times.extend_from_slice(&self.times[start..start + len]);
            }
            start += len;
        }
        Self { pitches, times }
    }

    /// Round every pitch to the nearest whole unit of the session resolution
    pub fn quantized(&self) -> Self {
        Self {
            pitches: self.pitches.iter().map(|p| p.round()).collect(),
            times: self.times.clone(),
        }
    }

    /// Re-express pitches from one resolution's unit in another's
    pub fn to_resolution(&self, from: Resolution, to: Resolution) -> Self {
        if from == to {
            return self.clone();
        }
        let scale = to.units_per_semitone() / from.units_per_semitone();
        Self {
            pitches: self.pitches.iter().map(|p| p * scale).collect(),
            times: self.times.clone(),
        }
    }
}

/// Median of a slice (mean of the two middle values for even lengths)
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Convert a frequency in Hz to a pitch in the given resolution's unit
///
/// Uses A4 = 440 Hz = MIDI 69. Returns `None` for non-positive or non-finite
/// frequencies (unvoiced frames).
pub fn frequency_to_pitch(frequency_hz: f64, resolution: Resolution) -> Option<f64> {
    if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
        return None;
    }
    let midi = A4_MIDI_NOTE + 12.0 * (frequency_hz / A4_FREQUENCY_HZ).log2();
    Some(midi * resolution.units_per_semitone())
}

/// Convert a pitch in the given resolution's unit back to Hz
pub fn pitch_to_frequency(pitch: f64, resolution: Resolution) -> f64 {
    let midi = pitch / resolution.units_per_semitone();
    A4_FREQUENCY_HZ * 2f64.powf((midi - A4_MIDI_NOTE) / 12.0)
}
