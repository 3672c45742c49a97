//! Pitch resolution shared by histograms, shifts and scale classification

use serde::{Deserialize, Serialize};

/// Pitch unit used for one comparison session
///
/// All pitches, shifts and histogram bins within a session are expressed in
/// the same unit. Mixing resolutions between a query and a corpus produces
/// meaningless similarities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    /// 12 bins per octave, pitches in MIDI semitones
    #[default]
    Semitone,
    /// 24 bins per octave, pitches in quarter tones (MIDI note * 2)
    QuarterTone,
}

impl Resolution {
    /// Number of histogram bins in one octave
    pub fn bins_per_octave(&self) -> usize {
        match self {
            Self::Semitone => 12,
            Self::QuarterTone => 24,
        }
    }

    /// Number of pitch units in one semitone
    pub fn units_per_semitone(&self) -> f64 {
        match self {
            Self::Semitone => 1.0,
            Self::QuarterTone => 2.0,
        }
    }

    /// Octave size in pitch units, as a float for modular arithmetic
    pub fn octave(&self) -> f64 {
        self.bins_per_octave() as f64
    }
}

impl std::str::FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "semitone" | "semitones" | "12" => Ok(Self::Semitone),
            "quarter-tone" | "quarter_tone" | "quartertone" | "quarter-tones" | "24" => {
                Ok(Self::QuarterTone)
            }
            other => Err(format!(
                "unknown resolution '{}' (expected 'semitone' or 'quarter-tone')",
                other
            )),
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Semitone => write!(f, "semitone"),
            Self::QuarterTone => write!(f, "quarter-tone"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_parsing() {
        assert_eq!("semitone".parse::<Resolution>().unwrap(), Resolution::Semitone);
        assert_eq!("Semitones".parse::<Resolution>().unwrap(), Resolution::Semitone);
        assert_eq!("12".parse::<Resolution>().unwrap(), Resolution::Semitone);
        assert_eq!(
            "quarter-tone".parse::<Resolution>().unwrap(),
            Resolution::QuarterTone
        );
        assert_eq!(
            "quarter_tone".parse::<Resolution>().unwrap(),
            Resolution::QuarterTone
        );
        assert_eq!("24".parse::<Resolution>().unwrap(), Resolution::QuarterTone);
        assert!("cents".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_resolution_display_roundtrips() {
        for resolution in [Resolution::Semitone, Resolution::QuarterTone] {
            assert_eq!(
                resolution.to_string().parse::<Resolution>().unwrap(),
                resolution
            );
        }
    }

    #[test]
    fn test_bins_per_octave() {
        assert_eq!(Resolution::Semitone.bins_per_octave(), 12);
        assert_eq!(Resolution::QuarterTone.bins_per_octave(), 24);
        assert_eq!(Resolution::QuarterTone.units_per_semitone(), 2.0);
    }
}
