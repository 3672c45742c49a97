//! Common test utilities for worker integration tests
//!
//! Builders for pools, matchers and in-memory corpora shared by the
//! integration test files.

#![allow(unused_imports)]
#![allow(dead_code)]

use cantus_shared_config::{
    ChunkingConfig, MatcherConfig, PrefilterConfig, RerankConfig, Resolution, ShiftRange,
};
use cantus_test_utils::melody::as_pitches;
use cantus_worker::{Chunk, Corpus, MelodyMatcher, PitchSequence, WorkerPool};

pub use cantus_test_utils::{create_corpus_dir, melody, MidiFixture};

/// Small pool so tests exercise partitioning without hogging the machine
pub fn test_pool() -> WorkerPool {
    WorkerPool::new(2).expect("Failed to build worker pool")
}

/// Chunking sized for short synthetic tracks: 10s windows, 5s hop
pub fn short_chunking() -> ChunkingConfig {
    ChunkingConfig {
        chunk_length_secs: 10.0,
        overlap_secs: 5.0,
        min_notes_per_chunk: 8,
    }
}

/// Matcher config tuned for small test corpora
pub fn test_config() -> MatcherConfig {
    MatcherConfig {
        chunking: short_chunking(),
        prefilter: PrefilterConfig {
            shift_range: ShiftRange::symmetric(2),
            top_n: 50,
        },
        rerank: RerankConfig {
            shift_range: ShiftRange::symmetric(1),
            final_top_n: 5,
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn test_matcher() -> MelodyMatcher {
    MelodyMatcher::new(test_config(), test_pool()).expect("Invalid test config")
}

/// Sequence of MIDI keys with evenly spaced onsets
pub fn sequence(keys: &[u8], interval_secs: f64) -> PitchSequence {
    PitchSequence::from_pitches(as_pitches(keys), interval_secs).expect("Invalid sequence")
}

/// A single hand-made chunk
pub fn chunk(track_id: &str, start_time: f64, keys: &[u8]) -> Chunk {
    Chunk {
        track_id: track_id.to_string(),
        start_time,
        pitches: as_pitches(keys),
        times: melody::even_times(keys.len(), 0.5),
    }
}

/// Corpus built from `(track_id, keys)` pairs at one note per half second
pub fn corpus_from_tracks(tracks: &[(&str, Vec<u8>)]) -> Corpus {
    let tracks: Vec<(String, PitchSequence)> = tracks
        .iter()
        .map(|(id, keys)| (id.to_string(), sequence(keys, 0.5)))
        .collect();
    Corpus::build(&tracks, &short_chunking(), Resolution::Semitone, &test_pool())
        .expect("Failed to build corpus")
}
