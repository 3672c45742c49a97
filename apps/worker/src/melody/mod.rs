//! Melody representation: note events, pitch sequences, MIDI loading,
//! chunking and histogram fingerprints

pub mod chunker;
pub mod histogram;
pub mod midi;
pub mod sequence;

pub use chunker::{chunk, filter_min_notes, validate_window, window_count, Chunk};
pub use histogram::{cosine_similarity, histogram, Histogram};
pub use midi::{is_midi_file, load_midi, parse_midi, TempoMap};
pub use sequence::{frequency_to_pitch, median, pitch_to_frequency, NoteEvent, PitchSequence};
