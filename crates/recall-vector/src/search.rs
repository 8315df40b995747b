//! Brute-force similarity search over a bounded candidate set.
//!
//! The caller supplies candidates already filtered by metadata and capped
//! by the scan limit. Scoring uses each candidate's cached magnitude; only
//! the query magnitude is computed, once per search.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use recall_types::{DocType, Metadata};

use crate::error::VectorError;
use crate::math::{cosine_similarity_with_magnitude, ensure_valid_vector, magnitude, sort_descending};
use crate::record::CandidateRecord;

/// Default maximum results per search
pub const DEFAULT_LIMIT: usize = 10;

/// Default minimum raw cosine similarity
pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// Ranking parameters for one search or page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Maximum results returned
    pub limit: usize,
    /// Minimum similarity (inclusive)
    pub threshold: f64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl SearchOptions {
    pub fn new(limit: usize, threshold: f64) -> Self {
        Self { limit, threshold }
    }
}

/// One ranked candidate. Produced per query, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub id: String,
    /// Raw cosine similarity in [-1, 1]
    pub similarity: f64,
    pub doc_type: DocType,
    pub inserted_at: i64,
    pub payload: Metadata,
}

impl ScoredResult {
    fn from_record(record: &CandidateRecord, similarity: f64) -> Self {
        Self {
            id: record.id.clone(),
            similarity,
            doc_type: record.doc_type,
            inserted_at: record.inserted_at,
            payload: record.payload.clone(),
        }
    }
}

/// Ranked results plus elapsed scoring time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub results: Vec<ScoredResult>,
    pub timing_ms: f64,
}

/// Stateless similarity search engine.
///
/// Holds only the expected query dimensionality, so one engine can be
/// shared across concurrent searches.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchEngine {
    dimensions: Option<usize>,
}

impl SearchEngine {
    /// Engine that accepts queries of any (non-zero) dimensionality.
    pub fn new() -> Self {
        Self { dimensions: None }
    }

    /// Engine that rejects queries not matching `dimensions`.
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions: Some(dimensions),
        }
    }

    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    /// Reject invalid queries before any scan happens.
    pub fn validate_query(&self, query: &[f64]) -> Result<(), VectorError> {
        ensure_valid_vector(query, self.dimensions)
    }

    /// Score, threshold, sort and truncate `candidates` against `query`.
    ///
    /// Candidates whose similarity equals the threshold are kept. Ties keep
    /// the candidate order, which for storage scans is newest first.
    pub fn search(
        &self,
        query: &[f64],
        candidates: &[CandidateRecord],
        options: &SearchOptions,
    ) -> Result<SearchOutcome, VectorError> {
        let start = Instant::now();
        self.validate_query(query)?;

        let results = rank(query, candidates, options)?;
        let timing_ms = start.elapsed().as_secs_f64() * 1000.0;

        debug!(
            candidates = candidates.len(),
            results = results.len(),
            threshold = options.threshold,
            timing_ms = timing_ms,
            "Similarity search complete"
        );

        Ok(SearchOutcome { results, timing_ms })
    }
}

/// Rank candidates without query validation or timing.
pub(crate) fn rank(
    query: &[f64],
    candidates: &[CandidateRecord],
    options: &SearchOptions,
) -> Result<Vec<ScoredResult>, VectorError> {
    let query_mag = magnitude(query);
    let mut scored: Vec<(usize, f64)> = Vec::with_capacity(candidates.len());

    for (index, candidate) in candidates.iter().enumerate() {
        let similarity = cosine_similarity_with_magnitude(
            query,
            &candidate.embedding,
            query_mag,
            candidate.magnitude,
        )?;
        if similarity >= options.threshold {
            scored.push((index, similarity));
        }
    }

    sort_descending(&mut scored, |(_, similarity)| *similarity);
    scored.truncate(options.limit);

    Ok(scored
        .into_iter()
        .map(|(index, similarity)| ScoredResult::from_record(&candidates[index], similarity))
        .collect())
}

/// Rank an in-memory candidate list with no storage access.
///
/// The query must be a valid vector; candidates use their cached magnitudes.
pub fn top_k_offline(
    query: &[f64],
    candidates: &[CandidateRecord],
    k: usize,
    threshold: f64,
) -> Result<Vec<ScoredResult>, VectorError> {
    ensure_valid_vector(query, None)?;
    rank(query, candidates, &SearchOptions::new(k, threshold))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, embedding: Vec<f64>, inserted_at: i64) -> CandidateRecord {
        CandidateRecord::new(id, embedding, inserted_at, DocType::Chunk)
    }

    fn ids(results: &[ScoredResult]) -> Vec<&str> {
        results.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_three_candidate_scenario() {
        let candidates = vec![
            candidate("candidate1", vec![1.0, 0.0, 0.0], 3),
            candidate("candidate2", vec![0.0, 1.0, 0.0], 2),
            candidate("candidate3", vec![0.9, 0.1, 0.0], 1),
        ];
        assert!((candidates[2].magnitude - 0.9055).abs() < 1e-3);

        let outcome = SearchEngine::new()
            .search(&[1.0, 0.0, 0.0], &candidates, &SearchOptions::new(10, 0.5))
            .unwrap();

        assert_eq!(ids(&outcome.results), vec!["candidate1", "candidate3"]);
        assert!((outcome.results[0].similarity - 1.0).abs() < 1e-12);
        assert!((outcome.results[1].similarity - 0.9939).abs() < 1e-3);
        assert!(outcome.timing_ms >= 0.0);
    }

    #[test]
    fn test_threshold_and_limit() {
        let candidates = vec![
            candidate("a", vec![1.0, 0.0], 4),
            candidate("b", vec![1.0, 1.0], 3),
            candidate("c", vec![0.0, 1.0], 2),
            candidate("d", vec![-1.0, 0.0], 1),
        ];
        let engine = SearchEngine::new();

        let outcome = engine
            .search(&[1.0, 0.0], &candidates, &SearchOptions::new(1, 0.5))
            .unwrap();
        assert_eq!(ids(&outcome.results), vec!["a"]);

        let outcome = engine
            .search(&[1.0, 0.0], &candidates, &SearchOptions::new(10, -1.0))
            .unwrap();
        assert_eq!(ids(&outcome.results), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_threshold_equal_is_included() {
        let candidates = vec![candidate("orthogonal", vec![0.0, 1.0], 1)];
        let outcome = SearchEngine::new()
            .search(&[1.0, 0.0], &candidates, &SearchOptions::new(10, 0.0))
            .unwrap();
        assert_eq!(ids(&outcome.results), vec!["orthogonal"]);
    }

    #[test]
    fn test_ties_keep_scan_order() {
        let candidates = vec![
            candidate("newest", vec![2.0, 0.0], 3),
            candidate("middle", vec![1.0, 0.0], 2),
            candidate("oldest", vec![5.0, 0.0], 1),
        ];
        let outcome = SearchEngine::new()
            .search(&[1.0, 0.0], &candidates, &SearchOptions::default())
            .unwrap();
        assert_eq!(ids(&outcome.results), vec!["newest", "middle", "oldest"]);
    }

    #[test]
    fn test_empty_candidates_is_ok() {
        let outcome = SearchEngine::new()
            .search(&[1.0, 0.0], &[], &SearchOptions::default())
            .unwrap();
        assert!(outcome.results.is_empty());
    }

    #[test]
    fn test_invalid_query_rejected() {
        let engine = SearchEngine::with_dimensions(3);
        let candidates = vec![candidate("a", vec![1.0, 0.0, 0.0], 1)];

        let err = engine
            .search(&[1.0, 0.0], &candidates, &SearchOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            VectorError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));

        let err = engine
            .search(&[1.0, f64::NAN, 0.0], &candidates, &SearchOptions::default())
            .unwrap_err();
        assert!(matches!(err, VectorError::InvalidVector(_)));
    }

    #[test]
    fn test_candidate_dimension_mismatch_fails_whole_search() {
        let candidates = vec![
            candidate("ok", vec![1.0, 0.0], 2),
            candidate("bad", vec![1.0, 0.0, 0.0], 1),
        ];
        let result =
            SearchEngine::new().search(&[1.0, 0.0], &candidates, &SearchOptions::default());
        assert!(matches!(result, Err(VectorError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_corrupted_magnitude_is_trusted() {
        let mut record = candidate("a", vec![1.0, 0.0], 1);
        record.magnitude = 2.0;
        let outcome = SearchEngine::new()
            .search(&[1.0, 0.0], &[record], &SearchOptions::new(10, 0.0))
            .unwrap();
        assert!((outcome.results[0].similarity - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_top_k_offline() {
        let candidates = vec![
            candidate("x", vec![0.1, 0.9], 1),
            candidate("y", vec![0.9, 0.1], 2),
            candidate("z", vec![1.0, 0.0], 3),
        ];
        let top = top_k_offline(&[1.0, 0.0], &candidates, 2, 0.0).unwrap();
        assert_eq!(ids(&top), vec!["z", "y"]);
        assert!(top_k_offline(&[], &candidates, 2, 0.0).is_err());
    }
}
