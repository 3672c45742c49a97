//! Synthetic melodies for matcher tests

/// Opening phrase of "Twinkle Twinkle Little Star" in C
pub const TWINKLE: [u8; 14] = [60, 60, 67, 67, 69, 69, 67, 65, 65, 64, 64, 62, 62, 60];

/// Opening phrase of "Ode to Joy" in C
pub const ODE_TO_JOY: [u8; 15] = [64, 64, 65, 67, 67, 65, 64, 62, 60, 60, 62, 64, 64, 62, 62];

/// Transpose MIDI keys by `semitones`, saturating at the MIDI range
pub fn transpose(keys: &[u8], semitones: i16) -> Vec<u8> {
    keys.iter()
        .map(|&k| (i16::from(k) + semitones).clamp(0, 127) as u8)
        .collect()
}

/// Repeat a phrase until it has at least `len` notes, then cut to `len`
pub fn repeat_to_len(keys: &[u8], len: usize) -> Vec<u8> {
    keys.iter().copied().cycle().take(len).collect()
}

/// Deterministic pseudo-random keys in `[low, high]`
///
/// Uses a fixed linear congruential generator so fixtures are reproducible
/// without a random number crate.
pub fn pseudo_random_keys(seed: u64, len: usize, low: u8, high: u8) -> Vec<u8> {
    let span = u64::from(high.saturating_sub(low)) + 1;
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            low + ((state >> 33) % span) as u8
        })
        .collect()
}

/// Keys as floating-point pitches
pub fn as_pitches(keys: &[u8]) -> Vec<f64> {
    keys.iter().map(|&k| f64::from(k)).collect()
}

/// Onset times for `len` evenly spaced notes
pub fn even_times(len: usize, interval_secs: f64) -> Vec<f64> {
    (0..len).map(|i| i as f64 * interval_secs).collect()
}

/// Scale degrees built from pitch-class offsets, ascending through `octaves`
pub fn scale_notes(root: u8, offsets: &[u8], octaves: u8) -> Vec<u8> {
    (0..octaves)
        .flat_map(|octave| {
            offsets
                .iter()
                .map(move |&o| root.saturating_add(12 * octave).saturating_add(o))
        })
        .collect()
}

/// A JSON scale catalog with the given `(name, offsets)` entries
pub fn scale_catalog_json(entries: &[(&str, &[i64])]) -> String {
    let templates: Vec<serde_json::Value> = entries
        .iter()
        .map(|(name, offsets)| serde_json::json!({ "name": name, "offsets": offsets }))
        .collect();
    serde_json::Value::Array(templates).to_string()
}
