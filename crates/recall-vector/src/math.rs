//! Vector math over `f64` slices.
//!
//! Every function is pure. Length mismatches are hard errors and never
//! silently truncated; zero-magnitude vectors score `0.0` instead of NaN.

use crate::error::VectorError;

fn check_dims(a: &[f64], b: &[f64]) -> Result<(), VectorError> {
    if a.len() != b.len() {
        return Err(VectorError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}

/// Dot product of two equal-length vectors.
pub fn dot(a: &[f64], b: &[f64]) -> Result<f64, VectorError> {
    check_dims(a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| x * y).sum())
}

/// L2 norm. Zero for an all-zero or empty vector.
pub fn magnitude(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Cosine similarity in `[-1.0, 1.0]`.
///
/// Returns exactly `0.0` when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64, VectorError> {
    check_dims(a, b)?;
    cosine_similarity_with_magnitude(a, b, magnitude(a), magnitude(b))
}

/// Cosine similarity with caller-supplied magnitudes.
///
/// This is the scan hot path: stored candidates carry their magnitude so it
/// is never recomputed per query. The magnitudes are trusted as given.
pub fn cosine_similarity_with_magnitude(
    a: &[f64],
    b: &[f64],
    mag_a: f64,
    mag_b: f64,
) -> Result<f64, VectorError> {
    let dot = dot(a, b)?;
    if mag_a == 0.0 || mag_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (mag_a * mag_b))
}

/// Remap raw cosine from `[-1, 1]` into `[0, 1]`.
pub fn similarity_score(cosine: f64) -> f64 {
    (cosine + 1.0) / 2.0
}

/// Euclidean (L2) distance between two vectors.
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> Result<f64, VectorError> {
    check_dims(a, b)?;
    Ok(a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt())
}

/// Scale to unit length. A zero vector is returned unchanged.
pub fn normalize(v: &[f64]) -> Vec<f64> {
    let mag = magnitude(v);
    if mag == 0.0 {
        return v.to_vec();
    }
    v.iter().map(|x| x / mag).collect()
}

/// Per-dimension mean of a set of vectors.
pub fn centroid(vectors: &[&[f64]]) -> Result<Vec<f64>, VectorError> {
    let first = vectors.first().ok_or(VectorError::EmptyInput)?;
    let dim = first.len();
    let mut sum = vec![0.0f64; dim];

    for v in vectors {
        check_dims(first, v)?;
        for (acc, x) in sum.iter_mut().zip(v.iter()) {
            *acc += x;
        }
    }

    let n = vectors.len() as f64;
    for acc in sum.iter_mut() {
        *acc /= n;
    }
    Ok(sum)
}

/// Cosine similarity of `query` against each vector, in input order.
pub fn batch_similarity(query: &[f64], vectors: &[&[f64]]) -> Result<Vec<f64>, VectorError> {
    let query_mag = magnitude(query);
    vectors
        .iter()
        .map(|v| cosine_similarity_with_magnitude(query, v, query_mag, magnitude(v)))
        .collect()
}

/// True when `v` is non-empty, fully finite, and (if given) has `expected_dims` entries.
pub fn validate_vector(v: &[f64], expected_dims: Option<usize>) -> bool {
    ensure_valid_vector(v, expected_dims).is_ok()
}

/// Result form of [`validate_vector`], reporting what is wrong.
pub fn ensure_valid_vector(v: &[f64], expected_dims: Option<usize>) -> Result<(), VectorError> {
    if v.is_empty() {
        return Err(VectorError::InvalidVector("vector is empty".to_string()));
    }
    if let Some(expected) = expected_dims {
        if v.len() != expected {
            return Err(VectorError::DimensionMismatch {
                expected,
                actual: v.len(),
            });
        }
    }
    if let Some(pos) = v.iter().position(|x| !x.is_finite()) {
        return Err(VectorError::InvalidVector(format!(
            "non-finite value {} at index {}",
            v[pos], pos
        )));
    }
    Ok(())
}

/// A borrowed candidate vector, optionally carrying its precomputed magnitude.
#[derive(Debug, Clone, Copy)]
pub struct VectorRef<'a> {
    pub values: &'a [f64],
    pub magnitude: Option<f64>,
}

impl<'a> VectorRef<'a> {
    pub fn new(values: &'a [f64]) -> Self {
        Self {
            values,
            magnitude: None,
        }
    }

    pub fn with_magnitude(values: &'a [f64], magnitude: f64) -> Self {
        Self {
            values,
            magnitude: Some(magnitude),
        }
    }
}

/// Position of a candidate in the input slice and its similarity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredIndex {
    pub index: usize,
    pub similarity: f64,
}

/// Sort by descending similarity. The sort is stable, so equal scores keep
/// their input order.
pub(crate) fn sort_descending<T>(items: &mut [T], score: impl Fn(&T) -> f64) {
    items.sort_by(|a, b| score(b).total_cmp(&score(a)));
}

/// Top `k` candidates with `similarity >= threshold`, best first.
///
/// Ties keep the original candidate order.
pub fn top_k_similar(
    query: &[f64],
    candidates: &[VectorRef<'_>],
    k: usize,
    threshold: f64,
) -> Result<Vec<ScoredIndex>, VectorError> {
    let query_mag = magnitude(query);
    let mut scored = Vec::with_capacity(candidates.len());

    for (index, candidate) in candidates.iter().enumerate() {
        let mag = candidate
            .magnitude
            .unwrap_or_else(|| magnitude(candidate.values));
        let similarity =
            cosine_similarity_with_magnitude(query, candidate.values, query_mag, mag)?;
        if similarity >= threshold {
            scored.push(ScoredIndex { index, similarity });
        }
    }

    sort_descending(&mut scored, |s| s.similarity);
    scored.truncate(k);
    Ok(scored)
}
