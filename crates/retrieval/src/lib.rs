//! Similarity ranking of CAD feature vectors.
//!
//! Given a query feature matrix and a candidate set, the engine L2-normalizes
//! both, computes a rescaled distance matrix, ranks the candidates for each
//! query row and maps ranked rows onto the sorted listing of an artifact
//! directory. Everything is a pure function of its inputs; nothing is cached
//! between calls and nothing is logged here.

pub mod artifacts;
pub mod distance;
mod error;
pub mod features;
pub mod rank;

use std::path::{Path, PathBuf};

use core_types::config::RetrievalConfig;
use core_types::{DEFAULT_FEATURE_EXTENSION, DEFAULT_MODEL_EXTENSIONS, Metric, RetrievalHit};
use ndarray::{Array2, ArrayView2, s};

pub use artifacts::list_artifacts;
pub use distance::{Normalization, normalize, pairwise_distance};
pub use error::{ErrorKind, Result, RetrievalError};
pub use features::{load_directory, load_matrix};
pub use rank::{Ranking, rank};

/// Where candidate feature vectors come from.
#[derive(Debug, Clone)]
pub enum CandidateSource {
    /// An already assembled matrix.
    Matrix(Array2<f64>),
    /// One `.npy` file holding the stacked database.
    File(PathBuf),
    /// A directory of per-model `.npy` files, stacked in file-name order.
    Directory(PathBuf),
}

impl CandidateSource {
    /// Map the "single database file" switch onto a source.
    pub fn from_path(path: impl Into<PathBuf>, is_single_file: bool) -> Self {
        let path = path.into();
        if is_single_file {
            Self::File(path)
        } else {
            Self::Directory(path)
        }
    }

    /// Load the candidate matrix.
    pub fn resolve(self, feature_extension: &str) -> Result<Array2<f64>> {
        match self {
            Self::Matrix(m) => Ok(m),
            Self::File(path) => load_matrix(&path),
            Self::Directory(dir) => load_directory(&dir, feature_extension),
        }
    }
}

/// Knobs for a retrieval call. The defaults are what the application uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrieveOptions {
    pub metric: Metric,
    pub normalization: Normalization,
    pub model_extensions: Vec<String>,
    pub feature_extension: String,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        Self {
            metric: Metric::Euclidean,
            normalization: Normalization::L2,
            model_extensions: DEFAULT_MODEL_EXTENSIONS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            feature_extension: DEFAULT_FEATURE_EXTENSION.to_string(),
        }
    }
}

impl From<&RetrievalConfig> for RetrieveOptions {
    fn from(cfg: &RetrievalConfig) -> Self {
        Self {
            metric: cfg.metric,
            normalization: if cfg.normalize {
                Normalization::L2
            } else {
                Normalization::Raw
            },
            model_extensions: cfg.model_extensions.clone(),
            feature_extension: cfg.feature_extension.clone(),
        }
    }
}

/// Convert a `[0, 1]` rescaled distance into a `[0, 100]` similarity score.
pub fn similarity_score(distance: f64) -> f64 {
    100.0 * (1.0 - distance)
}

/// Rank candidates for the first query row with the default options.
///
/// Returns every candidate, best first. With a single candidate the score is
/// 100 regardless of how far it actually is: scores are relative to the
/// result set, not absolute.
pub fn retrieve(
    query: ArrayView2<'_, f64>,
    candidates: CandidateSource,
    artifact_dir: &Path,
) -> Result<Vec<RetrievalHit>> {
    retrieve_with(query, candidates, artifact_dir, &RetrieveOptions::default())
}

/// [`retrieve`] with explicit options.
pub fn retrieve_with(
    query: ArrayView2<'_, f64>,
    candidates: CandidateSource,
    artifact_dir: &Path,
    options: &RetrieveOptions,
) -> Result<Vec<RetrievalHit>> {
    if query.nrows() == 0 {
        return Err(RetrievalError::EmptyQuery);
    }
    let first = query.slice(s![0..1, ..]);
    let mut rows = retrieve_all(first, candidates, artifact_dir, options)?;
    Ok(rows.pop().unwrap_or_default())
}

/// Rank candidates for every query row; one result list per row.
pub fn retrieve_all(
    query: ArrayView2<'_, f64>,
    candidates: CandidateSource,
    artifact_dir: &Path,
    options: &RetrieveOptions,
) -> Result<Vec<Vec<RetrievalHit>>> {
    if query.nrows() == 0 {
        return Err(RetrievalError::EmptyQuery);
    }
    let candidates = candidates.resolve(&options.feature_extension)?;
    if candidates.nrows() == 0 {
        return Ok(vec![Vec::new(); query.nrows()]);
    }

    let distances = pairwise_distance(
        query,
        candidates.view(),
        options.metric,
        options.normalization,
    )?;

    let artifacts = list_artifacts(artifact_dir, &options.model_extensions)?;
    if artifacts.len() != candidates.nrows() {
        return Err(RetrievalError::IndexMapping {
            candidates: candidates.nrows(),
            artifacts: artifacts.len(),
        });
    }

    Ok(distances
        .rows()
        .into_iter()
        .map(|row| {
            rank(row)
                .iter()
                .map(|(idx, d)| RetrievalHit::new(artifacts[idx].clone(), similarity_score(d)))
                .collect()
        })
        .collect())
}
