//! Loading feature vectors from NumPy `.npy` files.
//!
//! Files may hold a single vector (1-D) or a stacked matrix (2-D) of
//! `float64` or `float32`; everything is widened to `f64`.

use std::path::Path;

use ndarray::{Array2, ArrayD, ArrayView2, Axis, Ix2, concatenate};
use ndarray_npy::{ReadNpyError, ReadNpyExt};

use crate::artifacts::sorted_files;
use crate::error::{Result, RetrievalError};

/// Read one `.npy` file as a feature matrix. A 1-D array becomes a single row.
pub fn load_matrix(path: &Path) -> Result<Array2<f64>> {
    let bytes = std::fs::read(path).map_err(|e| RetrievalError::io(path, e))?;
    let array = match ArrayD::<f64>::read_npy(bytes.as_slice()) {
        Ok(array) => array,
        Err(ReadNpyError::WrongDescriptor(_)) => ArrayD::<f32>::read_npy(bytes.as_slice())
            .map_err(|source| npy_error(path, source))?
            .mapv(f64::from),
        Err(source) => return Err(npy_error(path, source)),
    };
    into_matrix(array, path)
}

/// Load every feature file in `dir` (sorted by name) and stack them row-wise.
///
/// An existing directory without feature files yields a `0 x 0` matrix.
pub fn load_directory(dir: &Path, extension: &str) -> Result<Array2<f64>> {
    let files = sorted_files(dir, &[extension])?;
    let mut blocks = Vec::with_capacity(files.len());
    let mut width: Option<usize> = None;

    for path in &files {
        let block = load_matrix(path)?;
        match width {
            None => width = Some(block.ncols()),
            Some(expected) if expected != block.ncols() => {
                return Err(RetrievalError::DimensionMismatch {
                    context: format!("feature file {}", path.display()),
                    expected,
                    found: block.ncols(),
                });
            }
            Some(_) => {}
        }
        blocks.push(block);
    }

    if blocks.is_empty() {
        return Ok(Array2::zeros((0, 0)));
    }
    let views: Vec<ArrayView2<'_, f64>> = blocks.iter().map(Array2::view).collect();
    concatenate(Axis(0), &views).map_err(|_| RetrievalError::DimensionMismatch {
        context: format!("stacking features from {}", dir.display()),
        expected: width.unwrap_or_default(),
        found: 0,
    })
}

fn into_matrix(array: ArrayD<f64>, path: &Path) -> Result<Array2<f64>> {
    let ndim = array.ndim();
    let array = match ndim {
        1 => array.insert_axis(Axis(0)),
        2 => array,
        _ => {
            return Err(RetrievalError::UnsupportedShape {
                path: path.to_path_buf(),
                ndim,
            });
        }
    };
    array
        .into_dimensionality::<Ix2>()
        .map_err(|_| RetrievalError::UnsupportedShape {
            path: path.to_path_buf(),
            ndim,
        })
}

fn npy_error(path: &Path, source: ReadNpyError) -> RetrievalError {
    match source {
        ReadNpyError::Io(e) => RetrievalError::io(path, e),
        other => RetrievalError::Npy {
            path: path.to_path_buf(),
            source: other,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array3, array};
    use ndarray_npy::write_npy;
    use tempfile::tempdir;

    #[test]
    fn reads_vector_as_single_row() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("q.npy");
        write_npy(&path, &array![1.0f64, 2.0, 3.0])?;
        assert_eq!(load_matrix(&path)?, array![[1.0, 2.0, 3.0]]);
        Ok(())
    }

    #[test]
    fn widens_float32() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("db.npy");
        write_npy(&path, &array![[0.5f32, 1.5], [2.0, -1.0]])?;
        assert_eq!(load_matrix(&path)?, array![[0.5, 1.5], [2.0, -1.0]]);
        Ok(())
    }

    #[test]
    fn rejects_three_dimensional_arrays() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("cube.npy");
        write_npy(&path, &Array3::<f64>::zeros((2, 2, 2)))?;
        let err = load_matrix(&path).unwrap_err();
        assert!(matches!(err, RetrievalError::UnsupportedShape { ndim: 3, .. }));
        Ok(())
    }

    #[test]
    fn rejects_garbage() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bad.npy");
        std::fs::write(&path, b"not a numpy file")?;
        let err = load_matrix(&path).unwrap_err();
        assert!(matches!(err, RetrievalError::Npy { .. }));
        Ok(())
    }

    #[test]
    fn directory_rows_follow_file_name_order() -> anyhow::Result<()> {
        let dir = tempdir()?;
        // Written out of order on purpose.
        write_npy(dir.path().join("c.npy"), &array![3.0f64, 3.0])?;
        write_npy(dir.path().join("a.npy"), &array![1.0f64, 1.0])?;
        write_npy(dir.path().join("b.npy"), &array![[2.0f64, 2.0], [2.5, 2.5]])?;
        std::fs::write(dir.path().join("notes.txt"), b"ignored")?;

        let m = load_directory(dir.path(), "npy")?;
        assert_eq!(
            m,
            array![[1.0, 1.0], [2.0, 2.0], [2.5, 2.5], [3.0, 3.0]]
        );
        Ok(())
    }

    #[test]
    fn directory_width_mismatch_names_file() -> anyhow::Result<()> {
        let dir = tempdir()?;
        write_npy(dir.path().join("a.npy"), &array![1.0f64, 1.0])?;
        write_npy(dir.path().join("b.npy"), &Array1::<f64>::ones(3))?;
        let err = load_directory(dir.path(), "npy").unwrap_err();
        match err {
            RetrievalError::DimensionMismatch {
                context,
                expected,
                found,
            } => {
                assert!(context.contains("b.npy"));
                assert_eq!((expected, found), (2, 3));
            }
            other => panic!("unexpected error: {other}"),
        }
        Ok(())
    }

    #[test]
    fn empty_directory_is_empty_matrix() -> anyhow::Result<()> {
        let dir = tempdir()?;
        assert_eq!(load_directory(dir.path(), "npy")?.nrows(), 0);
        Ok(())
    }
}
