//! Hand-assembled Standard MIDI Files
//!
//! Produces byte-exact SMF data without a MIDI library, so loader tests
//! exercise real file parsing.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Ticks per quarter note used by default
pub const DEFAULT_TICKS_PER_BEAT: u16 = 480;

/// 120 BPM
pub const DEFAULT_TEMPO_USEC: u32 = 500_000;

/// One note in a fixture, timed in ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureNote {
    pub key: u8,
    pub start: u32,
    pub duration: u32,
    pub velocity: u8,
    pub channel: u8,
}

/// Builder for a format 1 file: a conductor track with tempo changes plus
/// one or more note tracks
///
/// # Example
///
/// ```rust
/// use cantus_test_utils::MidiFixture;
///
/// let bytes = MidiFixture::new()
///     .melody(&[60, 62, 64], 0.5)
///     .to_bytes();
/// assert_eq!(&bytes[..4], b"MThd");
/// ```
#[derive(Debug, Clone)]
pub struct MidiFixture {
    ticks_per_beat: u16,
    tempo_changes: Vec<(u32, u32)>,
    tracks: Vec<Vec<FixtureNote>>,
    use_note_off: bool,
}

impl Default for MidiFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl MidiFixture {
    pub fn new() -> Self {
        Self {
            ticks_per_beat: DEFAULT_TICKS_PER_BEAT,
            tempo_changes: Vec::new(),
            tracks: vec![Vec::new()],
            use_note_off: true,
        }
    }

    pub fn ticks_per_beat(mut self, ticks_per_beat: u16) -> Self {
        self.ticks_per_beat = ticks_per_beat;
        self
    }

    /// Set the tempo (microseconds per quarter note) from `tick` onwards
    pub fn tempo_at(mut self, tick: u32, usec_per_beat: u32) -> Self {
        self.tempo_changes.push((tick, usec_per_beat));
        self
    }

    /// Encode releases as NoteOn with velocity 0 instead of NoteOff
    pub fn running_note_on_releases(mut self) -> Self {
        self.use_note_off = false;
        self
    }

    /// Add a note to the current track
    pub fn note(mut self, key: u8, start: u32, duration: u32, velocity: u8) -> Self {
        self.current_track().push(FixtureNote {
            key,
            start,
            duration,
            velocity,
            channel: 0,
        });
        self
    }

    /// Append back-to-back notes of `note_secs` each, assuming the default tempo
    pub fn melody(mut self, keys: &[u8], note_secs: f64) -> Self {
        let step = self.secs_to_ticks(note_secs);
        let offset = self
            .current_track()
            .iter()
            .map(|n| n.start + n.duration)
            .max()
            .unwrap_or(0);
        for (i, &key) in keys.iter().enumerate() {
            let start = offset + i as u32 * step;
            self.current_track().push(FixtureNote {
                key,
                start,
                duration: step,
                velocity: 96,
                channel: 0,
            });
        }
        self
    }

    /// Start a new note track; later notes go there
    pub fn new_track(mut self) -> Self {
        self.tracks.push(Vec::new());
        self
    }

    /// Convert seconds to ticks at the default 120 BPM
    pub fn secs_to_ticks(&self, secs: f64) -> u32 {
        let beats = secs * 1_000_000.0 / f64::from(DEFAULT_TEMPO_USEC);
        (beats * f64::from(self.ticks_per_beat)).round() as u32
    }

    /// Serialize to SMF bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::new();

        // Header chunk
        buffer.extend_from_slice(b"MThd");
        buffer.extend_from_slice(&6u32.to_be_bytes());
        buffer.extend_from_slice(&1u16.to_be_bytes()); // format 1
        buffer.extend_from_slice(&((self.tracks.len() + 1) as u16).to_be_bytes());
        buffer.extend_from_slice(&self.ticks_per_beat.to_be_bytes());

        // Conductor track
        let mut tempo_events: Vec<(u32, Vec<u8>)> = self
            .tempo_changes
            .iter()
            .map(|&(tick, tempo)| {
                let t = tempo.to_be_bytes();
                (tick, vec![0xFF, 0x51, 0x03, t[1], t[2], t[3]])
            })
            .collect();
        tempo_events.sort_by_key(|(tick, _)| *tick);
        write_track(&mut buffer, tempo_events);

        // Note tracks
        for notes in &self.tracks {
            let mut events: Vec<(u32, Vec<u8>)> = Vec::with_capacity(notes.len() * 2);
            for note in notes {
                let channel = note.channel & 0x0F;
                let release = if self.use_note_off {
                    vec![0x80 | channel, note.key, 0x40]
                } else {
                    vec![0x90 | channel, note.key, 0x00]
                };
                events.push((note.start + note.duration, release));
                events.push((note.start, vec![0x90 | channel, note.key, note.velocity]));
            }
            // releases before onsets at the same tick
            events.sort_by_key(|(tick, _)| *tick);
            write_track(&mut buffer, events);
        }

        buffer
    }

    /// Write the file into `dir` as `<name>.mid`
    pub fn write_to(&self, dir: &Path, name: &str) -> io::Result<PathBuf> {
        let path = dir.join(format!("{}.mid", name));
        fs::write(&path, self.to_bytes())?;
        Ok(path)
    }

    fn current_track(&mut self) -> &mut Vec<FixtureNote> {
        if self.tracks.is_empty() {
            self.tracks.push(Vec::new());
        }
        let last = self.tracks.len() - 1;
        &mut self.tracks[last]
    }
}

/// Write one MTrk chunk from `(absolute_tick, event_bytes)` pairs sorted by tick
fn write_track(buffer: &mut Vec<u8>, events: Vec<(u32, Vec<u8>)>) {
    let mut data = Vec::new();
    let mut last_tick = 0u32;
    for (tick, bytes) in events {
        data.extend(encode_vlq(tick - last_tick));
        data.extend(bytes);
        last_tick = tick;
    }
    // End of track
    data.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

    buffer.extend_from_slice(b"MTrk");
    buffer.extend_from_slice(&(data.len() as u32).to_be_bytes());
    buffer.extend(data);
}

/// Encode a MIDI variable-length quantity
pub fn encode_vlq(mut value: u32) -> Vec<u8> {
    let mut bytes = vec![(value & 0x7F) as u8];
    value >>= 7;
    while value > 0 {
        bytes.push(((value & 0x7F) as u8) | 0x80);
        value >>= 7;
    }
    bytes.reverse();
    bytes
}
