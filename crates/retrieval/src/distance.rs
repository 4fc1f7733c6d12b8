//! Row normalization and pairwise distance matrices.

use core_types::Metric;
use ndarray::{Array2, ArrayView2, Axis};

use crate::error::{Result, RetrievalError};

/// Whether rows are scaled to unit length before distances are taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Normalization {
    #[default]
    L2,
    Raw,
}

/// Divide every row by its own L2 norm.
///
/// Rows are independent. A row with zero (or non-finite) norm is rejected
/// rather than turned into NaNs. The norm is computed on rows scaled by their
/// largest magnitude, so very small and very large rows normalize too.
pub fn normalize(vectors: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    normalize_rows(vectors, "input")
}

fn normalize_rows(vectors: ArrayView2<'_, f64>, matrix: &'static str) -> Result<Array2<f64>> {
    let mut out = vectors.to_owned();
    for (row, mut v) in out.axis_iter_mut(Axis(0)).enumerate() {
        let norm = l2_norm(v.iter().copied());
        if !(norm.is_finite() && norm > 0.0) {
            return Err(RetrievalError::DegenerateVector { matrix, row });
        }
        v.mapv_inplace(|x| x / norm);
    }
    Ok(out)
}

/// `sqrt(sum(x^2))` without intermediate underflow or overflow.
fn l2_norm<I>(values: I) -> f64
where
    I: Iterator<Item = f64> + Clone,
{
    let scale = values.clone().fold(0.0_f64, |m, x| m.max(x.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return scale;
    }
    scale * values.map(|x| (x / scale).powi(2)).sum::<f64>().sqrt()
}

fn ensure_finite(values: ArrayView2<'_, f64>, matrix: &'static str) -> Result<()> {
    match values.indexed_iter().find(|(_, x)| !x.is_finite()) {
        Some(((row, col), _)) => Err(RetrievalError::NonFinite { matrix, row, col }),
        None => Ok(()),
    }
}

/// Distance from every query row to every candidate row, rescaled to `[0, 1]`.
///
/// The whole matrix is min-max rescaled with its global extremes, so 0 is the
/// closest pair and 1 the farthest pair in this call. When every distance is
/// equal (for instance a single candidate) the result is all zeros.
/// Cosine distances (`1 - cos`) get the same rescale.
pub fn pairwise_distance(
    query: ArrayView2<'_, f64>,
    candidates: ArrayView2<'_, f64>,
    metric: Metric,
    normalization: Normalization,
) -> Result<Array2<f64>> {
    if candidates.nrows() == 0 {
        return Ok(Array2::zeros((query.nrows(), 0)));
    }
    if query.ncols() != candidates.ncols() {
        return Err(RetrievalError::DimensionMismatch {
            context: "query vs candidate features".into(),
            expected: candidates.ncols(),
            found: query.ncols(),
        });
    }

    ensure_finite(query, "query")?;
    ensure_finite(candidates, "candidate")?;

    let (query, candidates) = match normalization {
        Normalization::L2 => (
            normalize_rows(query, "query")?,
            normalize_rows(candidates, "candidate")?,
        ),
        Normalization::Raw => (query.to_owned(), candidates.to_owned()),
    };

    let mut distances = match metric {
        Metric::Euclidean => euclidean(query.view(), candidates.view()),
        Metric::Cosine => cosine(query.view(), candidates.view())?,
    };
    // Finite inputs near f64::MAX can still overflow a difference.
    ensure_finite(distances.view(), "distance")?;
    min_max_rescale(&mut distances);
    Ok(distances)
}

fn euclidean(query: ArrayView2<'_, f64>, candidates: ArrayView2<'_, f64>) -> Array2<f64> {
    Array2::from_shape_fn((query.nrows(), candidates.nrows()), |(i, j)| {
        l2_norm(
            query
                .row(i)
                .iter()
                .zip(candidates.row(j))
                .map(|(a, b)| a - b),
        )
    })
}

fn cosine(query: ArrayView2<'_, f64>, candidates: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    // Raw mode still needs unit rows for the dot product to be a cosine.
    let query = normalize_rows(query, "query")?;
    let candidates = normalize_rows(candidates, "candidate")?;
    let similarity = query.dot(&candidates.t());
    Ok(similarity.mapv(|s| (1.0 - s).max(0.0)))
}

fn min_max_rescale(distances: &mut Array2<f64>) {
    if distances.is_empty() {
        return;
    }
    let (min, max) = distances
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &d| {
            (lo.min(d), hi.max(d))
        });
    let range = max - min;
    if range > 0.0 {
        distances.mapv_inplace(|d| (d - min) / range);
    } else {
        distances.fill(0.0);
    }
}
