use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of retrieval failures, for callers that only need to
/// decide how to present an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or unreadable input, malformed feature file, dimension mismatch.
    Input,
    /// A vector that cannot be normalized, or a NaN/infinite value.
    DegenerateInput,
    /// Candidate rows and artifact files do not line up.
    IndexMapping,
}

/// Errors surfaced by the retrieval engine.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("directory not found: {0}")]
    DirectoryNotFound(PathBuf),
    #[error("malformed feature file {path}: {source}")]
    Npy {
        path: PathBuf,
        #[source]
        source: ndarray_npy::ReadNpyError,
    },
    #[error("feature file {path} has {ndim} dimensions; expected a vector or a matrix")]
    UnsupportedShape { path: PathBuf, ndim: usize },
    #[error("dimension mismatch in {context}: expected {expected}, found {found}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        found: usize,
    },
    #[error("query feature matrix has no rows")]
    EmptyQuery,
    #[error("{matrix} row {row} has zero or non-finite L2 norm and cannot be normalized")]
    DegenerateVector { matrix: &'static str, row: usize },
    #[error("{matrix} matrix has a non-finite value at row {row}, column {col}")]
    NonFinite {
        matrix: &'static str,
        row: usize,
        col: usize,
    },
    #[error("{candidates} candidate feature rows but {artifacts} model files in the artifact directory")]
    IndexMapping { candidates: usize, artifacts: usize },
}

impl RetrievalError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. }
            | Self::DirectoryNotFound(_)
            | Self::Npy { .. }
            | Self::UnsupportedShape { .. }
            | Self::DimensionMismatch { .. }
            | Self::EmptyQuery => ErrorKind::Input,
            Self::DegenerateVector { .. } | Self::NonFinite { .. } => ErrorKind::DegenerateInput,
            Self::IndexMapping { .. } => ErrorKind::IndexMapping,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, RetrievalError>;
