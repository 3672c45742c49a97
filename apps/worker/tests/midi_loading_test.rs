//! Integration tests for MIDI decoding and corpus loading
//!
//! Tests cover:
//! - Onset extraction from hand-assembled Standard MIDI Files
//! - Tempo changes, multiple tracks and velocity-0 releases
//! - Quarter-tone pitch units
//! - Directory loading with unreadable files
//! - Corpus cache hits, misses and rebuilds

mod common;

use std::fs;
use std::sync::Arc;

use assert_matches::assert_matches;
use cantus_shared_config::Resolution;
use cantus_worker::melody::{load_midi, parse_midi};
use cantus_worker::{Corpus, CorpusCache, MatchError, PitchSequence};

use common::*;

fn onsets(fixture: &MidiFixture, resolution: Resolution) -> PitchSequence {
    PitchSequence::from_events(&parse_midi(&fixture.to_bytes(), resolution).unwrap())
}

#[test]
fn test_melody_onsets_at_default_tempo() {
    let fixture = MidiFixture::new().melody(&[60, 62, 64, 65], 0.5);

    let seq = onsets(&fixture, Resolution::Semitone);

    assert_eq!(seq.pitches(), &[60.0, 62.0, 64.0, 65.0]);
    assert_eq!(seq.times(), &[0.0, 0.5, 1.0, 1.5]);
}

#[test]
fn test_tempo_change_stretches_later_onsets() {
    // 120 BPM for the first two beats, then 60 BPM
    let fixture = MidiFixture::new()
        .tempo_at(0, 500_000)
        .tempo_at(960, 1_000_000)
        .note(60, 0, 480, 90)
        .note(62, 480, 480, 90)
        .note(64, 960, 480, 90)
        .note(65, 1440, 480, 90)
        .note(67, 1920, 480, 90);

    let seq = onsets(&fixture, Resolution::Semitone);

    assert_eq!(seq.times(), &[0.0, 0.5, 1.0, 2.0, 3.0]);
}

#[test]
fn test_tracks_are_merged_by_onset_time() {
    let fixture = MidiFixture::new()
        .melody(&[60, 62], 0.5)
        .new_track()
        .note(72, 240, 480, 90)
        .note(74, 720, 480, 90);

    let seq = onsets(&fixture, Resolution::Semitone);

    assert_eq!(seq.pitches(), &[60.0, 72.0, 62.0, 74.0]);
    assert_eq!(seq.times(), &[0.0, 0.25, 0.5, 0.75]);
}

#[test]
fn test_velocity_zero_note_on_is_a_release() {
    let fixture = MidiFixture::new()
        .running_note_on_releases()
        .melody(&melody::TWINKLE, 0.25);

    let events = parse_midi(&fixture.to_bytes(), Resolution::Semitone).unwrap();
    let releases = events.iter().filter(|e| !e.is_onset()).count();
    let seq = PitchSequence::from_events(&events);

    assert_eq!(releases, melody::TWINKLE.len());
    assert_eq!(seq.pitches(), melody::as_pitches(&melody::TWINKLE).as_slice());
}

#[test]
fn test_quarter_tone_units_double_keys() {
    let fixture = MidiFixture::new().melody(&[60, 61], 0.5);

    let seq = onsets(&fixture, Resolution::QuarterTone);

    assert_eq!(seq.pitches(), &[120.0, 122.0]);
}

#[test]
fn test_other_ticks_per_beat() {
    let fixture = MidiFixture::new().ticks_per_beat(96).melody(&[60, 64, 67], 1.0);

    let seq = onsets(&fixture, Resolution::Semitone);

    assert_eq!(seq.times(), &[0.0, 1.0, 2.0]);
}

#[test]
fn test_garbage_bytes_are_rejected() {
    let result = parse_midi(b"definitely not a midi file", Resolution::Semitone);
    assert_matches!(result, Err(MatchError::Midi(_)));
}

#[test]
fn test_load_midi_reports_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.mid");
    fs::write(&path, b"MThd garbage").unwrap();

    let result = load_midi(&path, Resolution::Semitone);

    assert_matches!(result, Err(MatchError::MidiParse { path: p, .. }) if p.ends_with("broken.mid"));
}

#[test]
fn test_load_dir_skips_unreadable_tracks() {
    let dir = create_corpus_dir(&[(
        "ode",
        MidiFixture::new().melody(&melody::repeat_to_len(&melody::ODE_TO_JOY, 60), 0.5),
    )]);
    fs::write(dir.path().join("broken.mid"), b"not midi").unwrap();
    fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    MidiFixture::new()
        .melody(&melody::repeat_to_len(&melody::TWINKLE, 60), 0.5)
        .write_to(&dir.path().join("nested"), "twinkle")
        .unwrap();

    let corpus = Corpus::load_dir(
        dir.path(),
        &short_chunking(),
        Resolution::Semitone,
        &test_pool(),
    )
    .unwrap();

    assert_eq!(corpus.track_count(), 3);
    assert_eq!(corpus.empty_tracks(), &["broken".to_string()]);
    assert_eq!(corpus.len(), 8);
}

#[test]
fn test_missing_corpus_dir() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");

    let result = Corpus::load_dir(&missing, &short_chunking(), Resolution::Semitone, &test_pool());

    assert_matches!(result, Err(MatchError::CorpusNotFound(_)));
}

#[test]
fn test_corpus_cache_reuses_and_rebuilds() {
    let dir = create_corpus_dir(&[(
        "ode",
        MidiFixture::new().melody(&melody::repeat_to_len(&melody::ODE_TO_JOY, 60), 0.5),
    )]);
    let cache = CorpusCache::new();
    let pool = test_pool();
    assert!(cache.fingerprint().is_none());

    let first = cache
        .get_or_load(dir.path(), &short_chunking(), Resolution::Semitone, &pool)
        .unwrap();
    let again = cache
        .get_or_load(dir.path(), &short_chunking(), Resolution::Semitone, &pool)
        .unwrap();
    assert!(Arc::ptr_eq(&first, &again));
    let fingerprint = cache.fingerprint().unwrap();

    MidiFixture::new()
        .melody(&melody::repeat_to_len(&melody::TWINKLE, 60), 0.5)
        .write_to(dir.path(), "twinkle")
        .unwrap();
    let rebuilt = cache
        .get_or_load(dir.path(), &short_chunking(), Resolution::Semitone, &pool)
        .unwrap();
    assert!(!Arc::ptr_eq(&first, &rebuilt));
    assert_eq!(rebuilt.track_count(), 2);
    assert_ne!(cache.fingerprint().unwrap(), fingerprint);

    // the earlier snapshot is untouched
    assert_eq!(first.track_count(), 1);
}

#[test]
fn test_corpus_cache_rebuilds_on_parameter_change() {
    let dir = create_corpus_dir(&[(
        "ode",
        MidiFixture::new().melody(&melody::repeat_to_len(&melody::ODE_TO_JOY, 60), 0.5),
    )]);
    let cache = CorpusCache::new();
    let pool = test_pool();

    let semitone = cache
        .get_or_load(dir.path(), &short_chunking(), Resolution::Semitone, &pool)
        .unwrap();
    let quarter = cache
        .get_or_load(dir.path(), &short_chunking(), Resolution::QuarterTone, &pool)
        .unwrap();

    assert!(!Arc::ptr_eq(&semitone, &quarter));
    assert_eq!(quarter.resolution(), Resolution::QuarterTone);
    assert_eq!(quarter.chunks()[0].histogram.len(), 24);

    cache.invalidate();
    assert!(cache.fingerprint().is_none());
}
