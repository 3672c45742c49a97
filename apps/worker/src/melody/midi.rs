//! Standard MIDI File loading
//!
//! Decodes SMF bytes with `midly`, merges every track onto one timeline and
//! converts tick positions to seconds through the file's tempo map.

use std::path::Path;

use cantus_shared_config::Resolution;
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};

use super::sequence::{NoteEvent, PitchSequence};
use crate::error::{MatchError, MatchResult};

/// Microseconds per quarter note when a file declares no tempo (120 BPM)
const DEFAULT_TEMPO_USEC: u32 = 500_000;

/// File extensions recognized as MIDI
pub const MIDI_EXTENSIONS: &[&str] = &["mid", "midi"];

/// Piecewise-constant tempo map converting ticks to seconds
#[derive(Debug, Clone)]
pub struct TempoMap {
    timing: TickTiming,
    /// `(tick, seconds at tick, usec per beat from tick onwards)`, sorted by tick
    segments: Vec<(u64, f64, u32)>,
}

#[derive(Debug, Clone, Copy)]
enum TickTiming {
    Metrical { ticks_per_beat: f64 },
    Timecode { ticks_per_second: f64 },
}

impl TempoMap {
    /// Build a tempo map from the header timing and `(tick, usec_per_beat)` changes
    pub fn new(timing: Timing, mut changes: Vec<(u64, u32)>) -> Self {
        let timing = match timing {
            Timing::Metrical(tpb) => TickTiming::Metrical {
                ticks_per_beat: f64::from(tpb.as_int().max(1)),
            },
            Timing::Timecode(fps, subframes) => TickTiming::Timecode {
                ticks_per_second: (f64::from(fps.as_f32()) * f64::from(subframes)).max(1.0),
            },
        };

        changes.sort_by_key(|&(tick, _)| tick);
        // Last change at a given tick wins
        let mut deduped: Vec<(u64, u32)> = Vec::with_capacity(changes.len());
        for (tick, tempo) in changes {
            match deduped.last_mut() {
                Some(last) if last.0 == tick => last.1 = tempo,
                _ => deduped.push((tick, tempo)),
            }
        }

        let mut segments = vec![(0u64, 0.0f64, DEFAULT_TEMPO_USEC)];
        for (tick, tempo) in deduped {
            let (last_tick, last_secs, last_tempo) = segments[segments.len() - 1];
            if tick == last_tick {
                let idx = segments.len() - 1;
                segments[idx].2 = tempo;
                continue;
            }
            let secs = last_secs + Self::span_secs(timing, tick - last_tick, last_tempo);
            segments.push((tick, secs, tempo));
        }

        Self { timing, segments }
    }

    fn span_secs(timing: TickTiming, ticks: u64, usec_per_beat: u32) -> f64 {
        match timing {
            TickTiming::Metrical { ticks_per_beat } => {
                ticks as f64 / ticks_per_beat * f64::from(usec_per_beat) / 1_000_000.0
            }
            TickTiming::Timecode { ticks_per_second } => ticks as f64 / ticks_per_second,
        }
    }

    /// Convert an absolute tick position to seconds
    pub fn seconds_at(&self, tick: u64) -> f64 {
        let idx = self
            .segments
            .partition_point(|&(seg_tick, _, _)| seg_tick <= tick)
            .saturating_sub(1);
        let (seg_tick, seg_secs, tempo) = self.segments[idx];
        seg_secs + Self::span_secs(self.timing, tick - seg_tick, tempo)
    }
}

/// Decode SMF bytes into note events, pitches expressed in `resolution` units
///
/// Events from every track are merged and ordered by onset time; within one
/// tick, track order is preserved.
pub fn parse_midi(data: &[u8], resolution: Resolution) -> MatchResult<Vec<NoteEvent>> {
    let smf = Smf::parse(data)?;

    let mut tempo_changes: Vec<(u64, u32)> = Vec::new();
    // (tick, key, velocity)
    let mut raw: Vec<(u64, u8, u8)> = Vec::new();

    for track in &smf.tracks {
        let mut tick: u64 = 0;
        for event in track {
            tick += u64::from(event.delta.as_int());
            match event.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => {
                    tempo_changes.push((tick, tempo.as_int()));
                }
                TrackEventKind::Midi { message, .. } => match message {
                    MidiMessage::NoteOn { key, vel } => raw.push((tick, key.as_int(), vel.as_int())),
                    MidiMessage::NoteOff { key, .. } => raw.push((tick, key.as_int(), 0)),
                    _ => {}
                },
                _ => {}
            }
        }
    }

    raw.sort_by_key(|&(tick, _, _)| tick);
    let tempo_map = TempoMap::new(smf.header.timing, tempo_changes);
    let units = resolution.units_per_semitone();

    Ok(raw
        .into_iter()
        .map(|(tick, key, velocity)| NoteEvent {
            pitch: f64::from(key) * units,
            time: tempo_map.seconds_at(tick),
            velocity,
        })
        .collect())
}

/// Read a MIDI file from disk and extract its onset pitch sequence
pub fn load_midi(path: &Path, resolution: Resolution) -> MatchResult<PitchSequence> {
    let data = std::fs::read(path)
        .map_err(|e| MatchError::midi_parse(path.display().to_string(), e.to_string()))?;
    let events = parse_midi(&data, resolution)
        .map_err(|e| MatchError::midi_parse(path.display().to_string(), e.to_string()))?;
    Ok(PitchSequence::from_events(&events))
}

/// Whether a path has a MIDI file extension (case-insensitive)
pub fn is_midi_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| MIDI_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}
