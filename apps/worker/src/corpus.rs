//! Reference corpus snapshots and their cache
//!
//! A [`Corpus`] is an immutable snapshot of every reference chunk together
//! with its shift-0 histogram and median pitch. It is built once (in parallel
//! over tracks) and shared by reference across queries. [`CorpusCache`]
//! rebuilds the snapshot only when the corpus directory's fingerprint
//! changes.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{Instant, UNIX_EPOCH};

use cantus_shared_config::{ChunkingConfig, Resolution};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::error::{MatchError, MatchResult};
use crate::melody::{
    chunk, filter_min_notes, histogram, is_midi_file, load_midi, validate_window, Chunk,
    Histogram, PitchSequence,
};
use crate::pool::WorkerPool;

/// A reference chunk with its precomputed fingerprint
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub chunk: Chunk,
    /// Histogram at shift 0; other shifts are rotations of it
    pub histogram: Histogram,
    /// Median pitch of the chunk (0 for an empty chunk)
    pub median: f64,
}

impl IndexedChunk {
    pub fn new(chunk: Chunk, resolution: Resolution) -> Self {
        let histogram = histogram(&chunk.pitches, 0.0, resolution);
        let median = crate::melody::median(&chunk.pitches).unwrap_or(0.0);
        Self {
            chunk,
            histogram,
            median,
        }
    }
}

/// Immutable snapshot of all reference chunks
#[derive(Debug, Clone)]
pub struct Corpus {
    chunks: Vec<IndexedChunk>,
    resolution: Resolution,
    track_count: usize,
    /// Tracks that contributed zero chunks
    empty_tracks: Vec<String>,
}

impl Corpus {
    /// Chunk and index a set of `(track_id, sequence)` pairs
    ///
    /// Tracks are processed in parallel; chunk order follows track order and
    /// then window order.
    #[tracing::instrument(skip_all, fields(tracks = tracks.len(), resolution = %resolution))]
    pub fn build(
        tracks: &[(String, PitchSequence)],
        chunking: &ChunkingConfig,
        resolution: Resolution,
        pool: &WorkerPool,
    ) -> MatchResult<Self> {
        validate_window(chunking.chunk_length_secs, chunking.overlap_secs)?;
        let started = Instant::now();

        let per_track: Vec<Vec<IndexedChunk>> = pool.install(|| {
            tracks
                .par_iter()
                .map(|(track_id, sequence)| -> MatchResult<Vec<IndexedChunk>> {
                    let windows = chunk(
                        track_id,
                        sequence,
                        chunking.chunk_length_secs,
                        chunking.overlap_secs,
                    )?;
                    Ok(filter_min_notes(windows, chunking.min_notes_per_chunk)
                        .into_iter()
                        .map(|c| IndexedChunk::new(c, resolution))
                        .collect())
                })
                .collect::<MatchResult<Vec<_>>>()
        })?;

        let empty_tracks: Vec<String> = tracks
            .iter()
            .zip(&per_track)
            .filter(|(_, chunks)| chunks.is_empty())
            .map(|((track_id, _), _)| track_id.clone())
            .collect();
        let chunks: Vec<IndexedChunk> = per_track.into_iter().flatten().collect();

        tracing::info!(
            tracks = tracks.len(),
            chunks = chunks.len(),
            empty_tracks = empty_tracks.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Corpus built"
        );

        Ok(Self {
            chunks,
            resolution,
            track_count: tracks.len(),
            empty_tracks,
        })
    }

    /// Index chunks that were sliced elsewhere (e.g. by a corpus store)
    pub fn from_chunks(chunks: Vec<Chunk>, resolution: Resolution) -> Self {
        let mut track_ids: Vec<&str> = chunks.iter().map(|c| c.track_id.as_str()).collect();
        track_ids.sort_unstable();
        track_ids.dedup();
        let track_count = track_ids.len();

        Self {
            chunks: chunks
                .into_iter()
                .map(|c| IndexedChunk::new(c, resolution))
                .collect(),
            resolution,
            track_count,
            empty_tracks: Vec::new(),
        }
    }

    /// Load every MIDI file under `dir` and build a corpus from it
    ///
    /// The track id is the file stem. Files that cannot be decoded are
    /// logged and contribute zero chunks.
    #[tracing::instrument(skip_all, fields(dir = %dir.display()))]
    pub fn load_dir(
        dir: &Path,
        chunking: &ChunkingConfig,
        resolution: Resolution,
        pool: &WorkerPool,
    ) -> MatchResult<Self> {
        let files = discover_midi_files(dir)?;
        tracing::debug!(files = files.len(), "Discovered MIDI files");

        let tracks: Vec<(String, PitchSequence)> = pool.install(|| {
            files
                .par_iter()
                .map(|path| {
                    let track_id = track_id_for(path);
                    let sequence = match load_midi(path, resolution) {
                        Ok(sequence) => sequence,
                        Err(e) => {
                            tracing::warn!(
                                track_id = %track_id,
                                error = %e,
                                "Failed to load reference track"
                            );
                            PitchSequence::empty()
                        }
                    };
                    (track_id, sequence)
                })
                .collect()
        });

        Self::build(&tracks, chunking, resolution, pool)
    }

    pub fn chunks(&self) -> &[IndexedChunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Number of tracks the snapshot was built from
    pub fn track_count(&self) -> usize {
        self.track_count
    }

    pub fn empty_tracks(&self) -> &[String] {
        &self.empty_tracks
    }
}

/// Recursively collect MIDI files under `dir`, sorted by path
pub fn discover_midi_files(dir: &Path) -> MatchResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(MatchError::CorpusNotFound(dir.display().to_string()));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_midi_file(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    Ok(files)
}

fn track_id_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// SHA-256 fingerprint of a corpus directory and the parameters it is indexed with
///
/// Covers each MIDI file's relative path, size and modification time, so
/// adding, removing, or touching a file changes the fingerprint.
pub fn fingerprint(
    dir: &Path,
    chunking: &ChunkingConfig,
    resolution: Resolution,
) -> MatchResult<String> {
    let mut hasher = Sha256::new();

    for path in discover_midi_files(dir)? {
        let metadata = std::fs::metadata(&path)?;
        let modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let relative = path.strip_prefix(dir).unwrap_or(&path);

        hasher.update(relative.to_string_lossy().as_bytes());
        hasher.update([0u8]);
        hasher.update(metadata.len().to_le_bytes());
        hasher.update(modified.to_le_bytes());
    }

    hasher.update(chunking.chunk_length_secs.to_bits().to_le_bytes());
    hasher.update(chunking.overlap_secs.to_bits().to_le_bytes());
    hasher.update((chunking.min_notes_per_chunk as u64).to_le_bytes());
    hasher.update(resolution.to_string().as_bytes());

    Ok(format!("{:x}", hasher.finalize()))
}

/// Invalidation-aware cache of the most recently built corpus
#[derive(Default)]
pub struct CorpusCache {
    entry: RwLock<Option<CacheEntry>>,
}

struct CacheEntry {
    dir: PathBuf,
    fingerprint: String,
    corpus: Arc<Corpus>,
}

impl CorpusCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached corpus for `dir`, rebuilding it if the directory or
    /// indexing parameters changed since the last build
    pub fn get_or_load(
        &self,
        dir: &Path,
        chunking: &ChunkingConfig,
        resolution: Resolution,
        pool: &WorkerPool,
    ) -> MatchResult<Arc<Corpus>> {
        let current = fingerprint(dir, chunking, resolution)?;

        {
            let entry = self.entry.read().unwrap_or_else(|e| e.into_inner());
            if let Some(cached) = entry.as_ref() {
                if cached.dir == dir && cached.fingerprint == current {
                    tracing::debug!(fingerprint = %current, "Corpus cache hit");
                    return Ok(Arc::clone(&cached.corpus));
                }
            }
        }

        tracing::info!(fingerprint = %current, "Corpus cache miss, rebuilding");
        let corpus = Arc::new(Corpus::load_dir(dir, chunking, resolution, pool)?);

        let mut entry = self.entry.write().unwrap_or_else(|e| e.into_inner());
        *entry = Some(CacheEntry {
            dir: dir.to_path_buf(),
            fingerprint: current,
            corpus: Arc::clone(&corpus),
        });
        Ok(corpus)
    }

    /// Fingerprint of the cached snapshot, if any
    pub fn fingerprint(&self) -> Option<String> {
        self.entry
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|e| e.fingerprint.clone())
    }

    /// Drop the cached snapshot
    pub fn invalidate(&self) {
        *self.entry.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

impl std::fmt::Debug for CorpusCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorpusCache")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}
