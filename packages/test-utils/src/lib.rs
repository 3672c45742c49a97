//! Shared test utilities for the Cantus workspace
//!
//! This crate provides synthetic melodies and hand-built Standard MIDI
//! Files so matcher tests can run against real file parsing without a
//! checked-in corpus.
//!
//! # Fixtures
//!
//! - [`MidiFixture`] - Builder producing SMF bytes or `.mid` files
//! - [`melody`] - Known phrases, transposition and deterministic random keys
//! - [`create_corpus_dir`] - Temporary directory populated with MIDI tracks
//!
//! # Example
//!
//! ```rust
//! use cantus_test_utils::{create_corpus_dir, melody, MidiFixture};
//!
//! let corpus = create_corpus_dir(&[
//!     ("twinkle", MidiFixture::new().melody(&melody::TWINKLE, 0.5)),
//! ]);
//! assert!(corpus.path().join("twinkle.mid").exists());
//! ```

pub mod melody;
mod smf;

pub use smf::{encode_vlq, FixtureNote, MidiFixture, DEFAULT_TEMPO_USEC, DEFAULT_TICKS_PER_BEAT};

use tempfile::TempDir;

/// Create a temporary corpus directory with one `.mid` file per entry
///
/// Panics if the directory or a file cannot be created; intended for tests.
pub fn create_corpus_dir(tracks: &[(&str, MidiFixture)]) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp corpus dir");
    for (name, fixture) in tracks {
        fixture
            .write_to(dir.path(), name)
            .expect("Failed to write MIDI fixture");
    }
    dir
}
