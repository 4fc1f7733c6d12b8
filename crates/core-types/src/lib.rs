//! Core result types and shared lightweight helpers for ShapeSeek.
//!
//! These types avoid numeric or I/O dependencies so the session, CLI and any
//! presentation layer can share them without pulling in the retrieval engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub mod config;

/// Model file extensions recognised in an artifact directory (matched case-insensitively).
pub const DEFAULT_MODEL_EXTENSIONS: &[&str] = &["step", "stp"];

/// Extension of per-item feature files in a candidate directory.
pub const DEFAULT_FEATURE_EXTENSION: &str = "npy";

/// One ranked retrieval result.
///
/// `score` lies in `[0, 100]`: 100 is the closest candidate in this result
/// set, 0 the farthest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalHit {
    pub path: PathBuf,
    pub score: f64,
}

impl RetrievalHit {
    pub fn new(path: impl Into<PathBuf>, score: f64) -> Self {
        Self {
            path: path.into(),
            score,
        }
    }

    /// File name of the artifact, lossily converted for display.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Distance metric used to compare feature vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Euclidean,
    Cosine,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Euclidean => f.write_str("euclidean"),
            Self::Cosine => f.write_str("cosine"),
        }
    }
}

/// Language used for user-facing labels in reports and listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

/// Derive the class label of a model from its file name.
///
/// Model files are named `<class>_<id>.<ext>`; the class is the stem up to the
/// last underscore, or the whole stem when there is none.
pub fn model_class(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match stem.rfind('_') {
        Some(idx) => stem[..idx].to_string(),
        None => stem,
    }
}

/// Whether `path` carries one of `extensions` (case-insensitive, without the dot).
pub fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate.as_ref()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_class_strips_last_segment() {
        assert_eq!(model_class(Path::new("/db/bolt_0007.step")), "bolt");
        assert_eq!(model_class(Path::new("hex_nut_12.stp")), "hex_nut");
        assert_eq!(model_class(Path::new("plain.STEP")), "plain");
    }

    #[test]
    fn extension_match_ignores_case() {
        assert!(has_extension(Path::new("a/B.STP"), DEFAULT_MODEL_EXTENSIONS));
        assert!(has_extension(Path::new("a/b.step"), DEFAULT_MODEL_EXTENSIONS));
        assert!(!has_extension(Path::new("a/b.npy"), DEFAULT_MODEL_EXTENSIONS));
        assert!(!has_extension(Path::new("a/step"), DEFAULT_MODEL_EXTENSIONS));
    }

    #[test]
    fn metric_serializes_lowercase() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            metric: Metric,
        }
        let text = toml::to_string(&Wrapper {
            metric: Metric::Cosine,
        })
        .unwrap();
        assert!(text.contains("\"cosine\""));
        let back: Wrapper = toml::from_str("metric = \"euclidean\"").unwrap();
        assert_eq!(back.metric, Metric::Euclidean);
    }
}
