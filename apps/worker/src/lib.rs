//! Cantus: query-by-humming melody matching
//!
//! A hummed or sung query, already transcribed to note events, is matched
//! against a corpus of reference MIDI tracks in two stages:
//!
//! 1. [`search::prefilter`] compares transposition-normalized pitch-class
//!    histograms of the query and every reference chunk.
//! 2. [`search::rerank`] aligns the surviving candidates with a
//!    stretch-penalized DTW, and [`search::dedupe`] keeps the best chunk per
//!    track.
//!
//! [`scale::classify`] reuses the same pitch-class machinery to rank scale
//! and maqam templates for a melody.

pub mod config;
pub mod corpus;
pub mod error;
pub mod melody;
pub mod pool;
pub mod scale;
pub mod search;

pub use config::Config;
pub use corpus::{Corpus, CorpusCache, IndexedChunk};
pub use error::{ErrorSeverity, MatchError, MatchResult};
pub use melody::{Chunk, Histogram, NoteEvent, PitchSequence};
pub use pool::WorkerPool;
pub use scale::{classify, classify_with_rotations, ScaleCatalog, ScaleMatch, ScaleTemplate};
pub use search::{format_timestamp, Match, MelodyMatcher};
