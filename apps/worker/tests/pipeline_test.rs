//! Integration tests for the full query pipeline
//!
//! Tests cover:
//! - Exact and transposed matches (prefilter similarity, DTW distance)
//! - Per-track deduplication of overlapping chunks
//! - Empty queries, cancellation and result ordering
//! - End-to-end search against a MIDI corpus on disk

mod common;

use assert_matches::assert_matches;
use cantus_shared_config::{MatcherConfig, PrefilterConfig, RerankConfig, Resolution, ShiftRange};
use cantus_worker::melody::{parse_midi, PitchSequence};
use cantus_worker::search::{dedupe, prefilter, rerank};
use cantus_worker::{Corpus, CorpusCache, MatchError, MelodyMatcher};
use rstest::rstest;
use tokio_util::sync::CancellationToken;

use common::*;

fn target_track() -> Vec<u8> {
    melody::pseudo_random_keys(42, 60, 55, 79)
}

fn corpus_with_distractors() -> Corpus {
    corpus_from_tracks(&[
        ("distractor-a", melody::pseudo_random_keys(1, 60, 55, 79)),
        ("target", target_track()),
        ("distractor-b", melody::pseudo_random_keys(2, 60, 50, 74)),
        ("distractor-c", melody::repeat_to_len(&melody::ODE_TO_JOY, 60)),
    ])
}

fn single_shift_config() -> MatcherConfig {
    MatcherConfig {
        prefilter: PrefilterConfig {
            shift_range: ShiftRange::single(0),
            top_n: 10,
        },
        rerank: RerankConfig {
            shift_range: ShiftRange::single(0),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[test]
fn test_identical_chunk_scores_perfectly() {
    let matcher = MelodyMatcher::new(single_shift_config(), test_pool()).unwrap();
    let corpus = Corpus::from_chunks(vec![chunk("song", 0.0, &[60, 62, 64])], Resolution::Semitone);

    let results = matcher.search(&sequence(&[60, 62, 64], 0.5), &corpus).unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].distance, Some(0.0));
    assert!((results[0].similarity - 1.0).abs() < 1e-9);
    assert_eq!(
        results[0].alignment.as_deref(),
        Some(&[(0, 0), (1, 1), (2, 2)][..])
    );
}

#[test]
fn test_octave_transposed_chunk_matches() {
    let corpus = Corpus::from_chunks(vec![chunk("song", 0.0, &[72, 74, 76])], Resolution::Semitone);
    let matcher = test_matcher();

    let partial = matcher.prefilter_matches(&sequence(&[60, 62, 64], 0.5), &corpus);
    assert!((partial[0].similarity - 1.0).abs() < 1e-9);
    assert_eq!(partial[0].distance, None);

    let results = matcher.search(&sequence(&[60, 62, 64], 0.5), &corpus).unwrap();
    assert_eq!(results[0].distance, Some(0.0));
    assert_eq!(results[0].median_offset, 0.0);
}

#[rstest]
#[case::unchanged(0)]
#[case::up_a_fourth(5)]
#[case::down_a_fifth(-7)]
#[case::up_an_octave(12)]
fn test_transposed_excerpt_finds_source(#[case] semitones: i16) {
    let corpus = corpus_with_distractors();
    // notes 20..40 are exactly the window starting at 10s
    let excerpt = melody::transpose(&target_track()[20..40], semitones);

    let results = test_matcher().search(&sequence(&excerpt, 0.5), &corpus).unwrap();

    assert_eq!(results[0].track_id, "target");
    assert_eq!(results[0].start_time, 10.0);
    assert_eq!(results[0].shift, 0);
    assert_eq!(results[0].distance, Some(0.0));
    assert_eq!(results[0].timestamp(), "00:10");
}

#[test]
fn test_results_are_unique_sorted_and_bounded() {
    let corpus = corpus_with_distractors();
    let query = sequence(&melody::transpose(&target_track()[5..25], 2), 0.5);

    let results = test_matcher().search(&query, &corpus).unwrap();

    assert!(results.len() <= 5);
    let mut ids: Vec<&str> = results.iter().map(|m| m.track_id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), results.len());
    assert!(results
        .windows(2)
        .all(|w| w[0].sort_distance() <= w[1].sort_distance()));
}

#[test]
fn test_overlapping_chunks_collapse_to_best() {
    let phrase = melody::repeat_to_len(&melody::TWINKLE, 20);
    let mut variant = phrase.clone();
    variant[3] += 1;
    variant[11] -= 2;

    let corpus = Corpus::from_chunks(
        vec![
            chunk("twinkle", 0.0, &variant),
            chunk("twinkle", 1.5, &phrase),
            chunk("ode", 0.0, &melody::repeat_to_len(&melody::ODE_TO_JOY, 20)),
        ],
        Resolution::Semitone,
    );
    let config = test_config();
    let pool = test_pool();
    let query = melody::as_pitches(&phrase);

    let candidates = prefilter(
        &query,
        corpus.chunks(),
        config.prefilter.shift_range,
        config.prefilter.top_n,
        Resolution::Semitone,
        &pool,
    );
    let reranked = rerank(&query, &candidates, &config.rerank, &pool, &CancellationToken::new())
        .unwrap();

    let twinkle_in_top5 = reranked
        .iter()
        .take(5)
        .filter(|m| m.track_id == "twinkle")
        .count();
    assert_eq!(twinkle_in_top5, 2);

    let deduped = dedupe(reranked, 5);
    let twinkle: Vec<_> = deduped.iter().filter(|m| m.track_id == "twinkle").collect();
    assert_eq!(twinkle.len(), 1);
    assert_eq!(twinkle[0].start_time, 1.5);
    assert_eq!(deduped[0].track_id, "twinkle");
}

#[test]
fn test_empty_query_is_not_an_error() {
    let corpus = corpus_with_distractors();
    let results = test_matcher().search(&PitchSequence::empty(), &corpus).unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_empty_corpus_yields_no_matches() {
    let corpus = Corpus::from_chunks(Vec::new(), Resolution::Semitone);
    let results = test_matcher()
        .search(&sequence(&[60, 62, 64], 0.5), &corpus)
        .unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_cancelled_query_discards_results() {
    let corpus = corpus_with_distractors();
    let token = CancellationToken::new();
    token.cancel();

    let result = test_matcher().search_with_cancel(
        &sequence(&target_track()[0..20], 0.5),
        &corpus,
        &token,
    );
    assert_matches!(result, Err(MatchError::Cancelled(_)));
}

#[test]
fn test_search_against_midi_corpus_on_disk() {
    let target = target_track();
    let dir = create_corpus_dir(&[
        ("target", MidiFixture::new().melody(&target, 0.5)),
        (
            "ode",
            MidiFixture::new().melody(&melody::repeat_to_len(&melody::ODE_TO_JOY, 60), 0.5),
        ),
        (
            "noise",
            MidiFixture::new().melody(&melody::pseudo_random_keys(9, 60, 48, 84), 0.5),
        ),
    ]);

    let matcher = test_matcher();
    let cache = CorpusCache::new();
    let corpus = cache
        .get_or_load(
            dir.path(),
            &matcher.config().chunking,
            Resolution::Semitone,
            matcher.pool(),
        )
        .unwrap();
    assert_eq!(corpus.track_count(), 3);

    let query_bytes = MidiFixture::new()
        .melody(&melody::transpose(&target[30..50], -3), 0.5)
        .to_bytes();
    let query = PitchSequence::from_events(&parse_midi(&query_bytes, Resolution::Semitone).unwrap());
    assert_eq!(query.len(), 20);

    let results = matcher.search(&query, &corpus).unwrap();
    assert_eq!(results[0].track_id, "target");
    assert_eq!(results[0].start_time, 15.0);
    assert_eq!(results[0].distance, Some(0.0));
}
