//! Scale template catalog
//!
//! Templates are plain data: a name and a set of pitch-class offsets. The
//! classifier iterates whatever catalog it is given, so adding a mode means
//! adding a catalog entry.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MatchError, MatchResult};

/// Pitch classes per octave for scale templates
pub const PITCH_CLASSES: usize = 12;

/// Built-in maqam templates, semitone approximations of each mode
const MAQAMS: &[(&str, &[u8], &str)] = &[
    ("ajam", &[0, 2, 4, 5, 7, 9, 11], "Bright mode matching the Western major scale"),
    ("nahawand", &[0, 2, 3, 5, 7, 8, 10], "Natural minor, known in Turkish music as Buselik"),
    ("rast", &[0, 2, 4, 5, 7, 9, 11], "Neutral third approximated as major"),
    ("hijaz", &[0, 1, 4, 5, 7, 8, 10], "Augmented second between the second and third degrees"),
    ("kurd", &[0, 1, 3, 5, 7, 8, 10], "Phrygian mode with a flattened second"),
    ("bayati", &[0, 2, 3, 5, 7, 9, 10], "Neutral second approximated as a whole tone"),
    ("saba", &[0, 2, 3, 4, 7, 8, 10], "Diminished fourth"),
    ("siga", &[0, 2, 4, 5, 7, 9, 11], "Neutral seconds and thirds approximated as major"),
];

/// A named set of pitch-class offsets in `[0, 12)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScaleTemplate {
    name: String,
    offsets: Vec<u8>,
    description: Option<String>,
}

impl ScaleTemplate {
    /// Create a template; offsets are sorted and deduplicated
    pub fn new(name: impl Into<String>, offsets: &[u8]) -> MatchResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(MatchError::InvalidCatalog(
                "scale template name must not be empty".to_string(),
            ));
        }
        if offsets.is_empty() {
            return Err(MatchError::InvalidCatalog(format!(
                "scale template '{}' has no pitch classes",
                name
            )));
        }
        if let Some(bad) = offsets.iter().find(|&&o| usize::from(o) >= PITCH_CLASSES) {
            return Err(MatchError::InvalidCatalog(format!(
                "scale template '{}' has offset {} outside [0, 12)",
                name, bad
            )));
        }

        let mut offsets = offsets.to_vec();
        offsets.sort_unstable();
        offsets.dedup();
        Ok(Self {
            name,
            offsets,
            description: None,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn offsets(&self) -> &[u8] {
        &self.offsets
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Membership mask of the template rotated up by `rotation` pitch classes
    pub fn rotated_mask(&self, rotation: usize) -> [bool; PITCH_CLASSES] {
        let mut mask = [false; PITCH_CLASSES];
        for &offset in &self.offsets {
            mask[(usize::from(offset) + rotation) % PITCH_CLASSES] = true;
        }
        mask
    }
}

/// Catalog entry as written in a JSON catalog file
#[derive(Debug, Deserialize)]
struct RawTemplate {
    name: String,
    offsets: Vec<i64>,
    #[serde(default)]
    description: Option<String>,
}

/// Ordered, immutable collection of scale templates with unique names
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScaleCatalog {
    templates: Vec<ScaleTemplate>,
}

impl ScaleCatalog {
    /// Build a catalog, rejecting duplicate names (case-insensitive)
    pub fn new(templates: Vec<ScaleTemplate>) -> MatchResult<Self> {
        let mut seen = HashSet::new();
        for template in &templates {
            if !seen.insert(template.name.to_lowercase()) {
                return Err(MatchError::InvalidCatalog(format!(
                    "duplicate scale template '{}'",
                    template.name
                )));
            }
        }
        Ok(Self { templates })
    }

    /// The built-in maqam catalog
    pub fn maqams() -> Self {
        let templates = MAQAMS
            .iter()
            .map(|&(name, offsets, description)| ScaleTemplate {
                name: name.to_string(),
                offsets: offsets.to_vec(),
                description: Some(description.to_string()),
            })
            .collect();
        Self { templates }
    }

    /// Parse a JSON array of `{"name", "offsets", "description"?}` objects
    pub fn from_json(json: &str) -> MatchResult<Self> {
        let raw: Vec<RawTemplate> = serde_json::from_str(json)?;
        let templates = raw
            .into_iter()
            .map(|t| {
                let offsets = t
                    .offsets
                    .iter()
                    .map(|&o| {
                        u8::try_from(o)
                            .ok()
                            .filter(|&o| usize::from(o) < PITCH_CLASSES)
                            .ok_or_else(|| {
                                MatchError::InvalidCatalog(format!(
                                    "scale template '{}' has offset {} outside [0, 12)",
                                    t.name, o
                                ))
                            })
                    })
                    .collect::<MatchResult<Vec<u8>>>()?;
                let template = ScaleTemplate::new(t.name, &offsets)?;
                Ok(match t.description {
                    Some(d) => template.with_description(d),
                    None => template,
                })
            })
            .collect::<MatchResult<Vec<_>>>()?;
        Self::new(templates)
    }

    /// Load a JSON catalog file
    pub fn load(path: &Path) -> MatchResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Case-insensitive lookup by name
    pub fn get(&self, name: &str) -> Option<&ScaleTemplate> {
        self.templates
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn templates(&self) -> &[ScaleTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for ScaleCatalog {
    fn default() -> Self {
        Self::maqams()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_builtin_maqams() {
        let catalog = ScaleCatalog::maqams();
        assert_eq!(catalog.len(), 8);
        assert_eq!(catalog.get("Nahawand").unwrap().offsets(), &[0, 2, 3, 5, 7, 8, 10]);
        assert_eq!(catalog.get("hijaz").unwrap().offsets(), &[0, 1, 4, 5, 7, 8, 10]);
        assert!(catalog.get("ajam").unwrap().description().is_some());
        assert!(catalog.get("lydian").is_none());
    }

    #[test]
    fn test_rotated_mask() {
        let template = ScaleTemplate::new("triad", &[0, 4, 7]).unwrap();
        let mask = template.rotated_mask(7);
        let members: Vec<usize> = (0..12).filter(|&i| mask[i]).collect();
        assert_eq!(members, vec![2, 7, 11]);
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {"name": "minor-pentatonic", "offsets": [0, 3, 5, 7, 10]},
            {"name": "whole-tone", "offsets": [10, 0, 2, 4, 6, 8, 8], "description": "symmetric"}
        ]"#;
        let catalog = ScaleCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.templates()[1].offsets(), &[0, 2, 4, 6, 8, 10]);
        assert_eq!(catalog.templates()[1].description(), Some("symmetric"));
    }

    #[test]
    fn test_from_json_rejects_bad_catalogs() {
        assert_matches!(
            ScaleCatalog::from_json(r#"[{"name": "x", "offsets": [0, 12]}]"#),
            Err(MatchError::InvalidCatalog(_))
        );
        assert_matches!(
            ScaleCatalog::from_json(r#"[{"name": "x", "offsets": [-1]}]"#),
            Err(MatchError::InvalidCatalog(_))
        );
        assert_matches!(
            ScaleCatalog::from_json(r#"[{"name": " ", "offsets": [0]}]"#),
            Err(MatchError::InvalidCatalog(_))
        );
        assert_matches!(
            ScaleCatalog::from_json(
                r#"[{"name": "a", "offsets": [0]}, {"name": "A", "offsets": [1]}]"#
            ),
            Err(MatchError::InvalidCatalog(_))
        );
        assert_matches!(
            ScaleCatalog::from_json(r#"{"name": "a"}"#),
            Err(MatchError::Serialization(_))
        );
    }
}
