//! Similarity search operations.
//!
//! `RecallService` wires a [`CandidateReader`] to the search core, fills in
//! defaults from [`SearchSettings`], and records which ids were returned.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use recall_embeddings::{EmbeddingProvider, InputType};
use recall_types::{DocType, SearchSettings};
use recall_vector::{
    CandidateFilter, CandidateReader, CandidateRecord, Page, PageRequest, ScoredResult,
    SearchEngine, SearchOptions, SearchOutcome,
};

use crate::access::AccessTracker;
use crate::error::ServiceError;

/// Single-shot search over the newest `scan_cap` candidates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilaritySearchRequest {
    pub query: Vec<f64>,
    pub doc_type: Option<DocType>,
    pub owner: Option<String>,
    /// Falls back to `SearchSettings::default_limit`
    pub limit: Option<usize>,
    /// Falls back to `SearchSettings::default_threshold`
    pub threshold: Option<f64>,
    /// Only score records embedded by this model
    pub model: Option<String>,
}

impl SimilaritySearchRequest {
    pub fn new(query: Vec<f64>) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }

    pub fn with_doc_type(mut self, doc_type: DocType) -> Self {
        self.doc_type = Some(doc_type);
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// One page of a cursor-paginated search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaginatedSearchRequest {
    pub query: Vec<f64>,
    pub limit: Option<usize>,
    pub threshold: Option<f64>,
    /// Opaque cursor from the previous page
    pub cursor: Option<String>,
    /// Only scan records embedded by this model
    pub model: Option<String>,
}

impl PaginatedSearchRequest {
    pub fn new(query: Vec<f64>) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_cursor(mut self, cursor: Option<String>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Search service over a candidate store.
pub struct RecallService<R: ?Sized> {
    reader: Arc<R>,
    engine: SearchEngine,
    settings: SearchSettings,
    access: Arc<AccessTracker>,
}

impl<R: CandidateReader + ?Sized> RecallService<R> {
    pub fn new(reader: Arc<R>, settings: SearchSettings) -> Self {
        Self {
            reader,
            engine: SearchEngine::new(),
            settings,
            access: Arc::new(AccessTracker::new()),
        }
    }

    /// Reject queries whose length differs from `dimensions`.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.engine = SearchEngine::with_dimensions(dimensions);
        self
    }

    pub fn with_access_tracker(mut self, access: Arc<AccessTracker>) -> Self {
        self.access = access;
        self
    }

    pub fn access(&self) -> &Arc<AccessTracker> {
        &self.access
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    fn options(
        &self,
        limit: Option<usize>,
        threshold: Option<f64>,
    ) -> Result<SearchOptions, ServiceError> {
        let limit = limit.unwrap_or(self.settings.default_limit);
        let threshold = threshold.unwrap_or(self.settings.default_threshold);
        if limit == 0 {
            return Err(ServiceError::InvalidInput("limit must be > 0".to_string()));
        }
        if !threshold.is_finite() {
            return Err(ServiceError::InvalidInput(format!(
                "threshold must be finite, got {threshold}"
            )));
        }
        Ok(SearchOptions::new(limit, threshold))
    }

    fn scan_cap(&self) -> Result<usize, ServiceError> {
        match self.settings.scan_cap {
            0 => Err(ServiceError::InvalidInput("scan_cap must be > 0".to_string())),
            cap => Ok(cap),
        }
    }

    /// Rank the newest `scan_cap` candidates matching the type/owner/model filter.
    pub fn similarity_search(
        &self,
        request: &SimilaritySearchRequest,
    ) -> Result<SearchOutcome, ServiceError> {
        let start = Instant::now();
        let options = self.options(request.limit, request.threshold)?;
        let scan_cap = self.scan_cap()?;
        self.engine.validate_query(&request.query)?;

        let filter = CandidateFilter {
            doc_type: request.doc_type,
            owner: request.owner.clone(),
            model: request.model.clone(),
        };
        let candidates = self.reader.fetch_candidates(&filter, scan_cap, None)?;

        let mut outcome = self.engine.search(&request.query, &candidates, &options)?;
        outcome.timing_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.track(&outcome.results);

        info!(
            candidates = candidates.len(),
            results = outcome.results.len(),
            timing_ms = outcome.timing_ms,
            "Similarity search"
        );
        Ok(outcome)
    }

    /// Rank the next `scan_cap` window after the request cursor.
    pub fn paginated_similarity_search(
        &self,
        request: &PaginatedSearchRequest,
    ) -> Result<Page, ServiceError> {
        let options = self.options(request.limit, request.threshold)?;
        let page_request = PageRequest {
            options,
            cursor: request.cursor.clone(),
            filter: CandidateFilter {
                model: request.model.clone(),
                ..CandidateFilter::default()
            },
            scan_cap: self.scan_cap()?,
        };

        let page = self
            .engine
            .search_page(self.reader.as_ref(), &request.query, &page_request)?;
        self.track(&page.results);

        info!(
            scanned = page.scanned,
            results = page.results.len(),
            has_more = page.has_more,
            "Paginated similarity search"
        );
        Ok(page)
    }

    /// Embed `text` as a query and run [`Self::similarity_search`].
    ///
    /// `request.query` is replaced by the embedding. Unless the request
    /// names a model, only records embedded by `provider` are scored.
    pub async fn search_text<P: EmbeddingProvider + ?Sized>(
        &self,
        provider: &P,
        text: &str,
        mut request: SimilaritySearchRequest,
    ) -> Result<SearchOutcome, ServiceError> {
        let embedding = provider.embed(text, InputType::Query).await?;
        debug!(model = %provider.info().name, dimension = embedding.dimension(), "Embedded query");
        request.query = embedding.into_values();
        if request.model.is_none() {
            request.model = Some(provider.info().name.clone());
        }
        self.similarity_search(&request)
    }

    fn track(&self, results: &[ScoredResult]) {
        self.access.record_access(results.iter().map(|r| r.id.as_str()));
    }
}

/// Rank an in-memory candidate list. Pure; touches no storage.
pub fn top_k_offline(
    query: &[f64],
    candidates: &[CandidateRecord],
    k: usize,
    threshold: f64,
) -> Result<Vec<ScoredResult>, ServiceError> {
    Ok(recall_vector::top_k_offline(query, candidates, k, threshold)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_embeddings::{MockEmbedder, MOCK_MODEL_NAME};
    use recall_storage::InMemoryStore;
    use recall_vector::{CandidateWriter, VectorError};
    use serde_json::json;

    fn service(store: Arc<InMemoryStore>) -> RecallService<InMemoryStore> {
        RecallService::new(store, SearchSettings::default())
    }

    fn seed(store: &InMemoryStore) {
        let records = [
            ("candidate1", vec![1.0, 0.0, 0.0], 3, DocType::Chunk, Some("alice")),
            ("candidate2", vec![0.0, 1.0, 0.0], 2, DocType::Chunk, Some("bob")),
            ("candidate3", vec![0.9, 0.1, 0.0], 1, DocType::Memory, Some("alice")),
        ];
        for (id, embedding, ts, doc_type, owner) in records {
            let mut payload = serde_json::Map::new();
            payload.insert("text".to_string(), json!(id));
            store
                .append(
                    CandidateRecord::new(id, embedding, ts, doc_type)
                        .with_owner(owner.map(str::to_string))
                        .with_payload(payload),
                )
                .unwrap();
        }
    }

    fn ids(results: &[ScoredResult]) -> Vec<&str> {
        results.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_similarity_search_ranks_and_filters() {
        let store = Arc::new(InMemoryStore::new());
        seed(&store);
        let service = service(store);

        let request = SimilaritySearchRequest::new(vec![1.0, 0.0, 0.0]).with_threshold(0.5);
        let outcome = service.similarity_search(&request).unwrap();
        assert_eq!(ids(&outcome.results), vec!["candidate1", "candidate3"]);
        assert!((outcome.results[1].similarity - 0.9939).abs() < 1e-3);
        assert_eq!(outcome.results[0].payload["text"], json!("candidate1"));
        assert!(outcome.timing_ms >= 0.0);

        let memories = request.clone().with_doc_type(DocType::Memory);
        let outcome = service.similarity_search(&memories).unwrap();
        assert_eq!(ids(&outcome.results), vec!["candidate3"]);

        let bob = SimilaritySearchRequest::new(vec![0.0, 1.0, 0.0]).with_owner("bob");
        let outcome = service.similarity_search(&bob).unwrap();
        assert_eq!(ids(&outcome.results), vec!["candidate2"]);
    }

    #[test]
    fn test_defaults_come_from_settings() {
        let store = Arc::new(InMemoryStore::new());
        seed(&store);
        let settings = SearchSettings {
            default_limit: 1,
            default_threshold: 0.0,
            scan_cap: 1000,
        };
        let service = RecallService::new(store, settings);

        let outcome = service
            .similarity_search(&SimilaritySearchRequest::new(vec![0.0, 1.0, 0.0]))
            .unwrap();
        assert_eq!(ids(&outcome.results), vec!["candidate2"]);
    }

    #[test]
    fn test_empty_store_is_empty_success() {
        let service = service(Arc::new(InMemoryStore::new()));
        let outcome = service
            .similarity_search(&SimilaritySearchRequest::new(vec![1.0, 0.0]))
            .unwrap();
        assert!(outcome.results.is_empty());
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        let store = Arc::new(InMemoryStore::new());
        seed(&store);
        let service = service(store.clone());

        let err = service
            .similarity_search(&SimilaritySearchRequest::new(vec![1.0, 0.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Vector(VectorError::DimensionMismatch { .. })
        ));
        assert!(err.is_invalid_request());

        let strict = RecallService::new(store, SearchSettings::default()).with_dimensions(4);
        let err = strict
            .similarity_search(&SimilaritySearchRequest::new(vec![1.0, 0.0, 0.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Vector(VectorError::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let service = service(Arc::new(InMemoryStore::new()));
        let err = service
            .similarity_search(&SimilaritySearchRequest::new(vec![1.0]).with_limit(0))
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[test]
    fn test_access_tracking_does_not_change_ranking() {
        let store = Arc::new(InMemoryStore::new());
        seed(&store);
        let service = service(store);
        let request = SimilaritySearchRequest::new(vec![1.0, 0.0, 0.0]).with_threshold(0.0);

        let first = service.similarity_search(&request).unwrap();
        for _ in 0..5 {
            service
                .similarity_search(
                    &SimilaritySearchRequest::new(vec![0.0, 1.0, 0.0]).with_threshold(0.9),
                )
                .unwrap();
        }
        let again = service.similarity_search(&request).unwrap();

        assert_eq!(ids(&first.results), ids(&again.results));
        assert_eq!(service.access().access_count("candidate2"), 7);
        assert_eq!(service.access().access_count("candidate1"), 2);
    }

    #[test]
    fn test_paginated_search_walks_the_pool() {
        let store = Arc::new(InMemoryStore::new());
        for i in 0..5 {
            store
                .append(
                    CandidateRecord::new(format!("r{i}"), vec![1.0, i as f64], i, DocType::Chunk)
                        .with_model(Some("mock-hash".to_string())),
                )
                .unwrap();
        }
        store
            .append(
                CandidateRecord::new("other", vec![1.0, 0.0], 10, DocType::Chunk)
                    .with_model(Some("voyage-3".to_string())),
            )
            .unwrap();

        let settings = SearchSettings {
            scan_cap: 2,
            ..SearchSettings::default()
        };
        let service = RecallService::new(store, settings);
        let mut request = PaginatedSearchRequest::new(vec![1.0, 0.0])
            .with_threshold(-1.0)
            .with_model("mock-hash");

        let mut seen = Vec::new();
        loop {
            let page = service.paginated_similarity_search(&request).unwrap();
            seen.extend(page.results.iter().map(|r| r.id.clone()));
            if !page.has_more {
                break;
            }
            request = request.with_cursor(page.next_cursor);
        }
        seen.sort();
        assert_eq!(seen, vec!["r0", "r1", "r2", "r3", "r4"]);
    }

    #[test]
    fn test_paginated_search_rejects_bad_cursor() {
        let service = service(Arc::new(InMemoryStore::new()));
        let request =
            PaginatedSearchRequest::new(vec![1.0]).with_cursor(Some("garbage".to_string()));
        let err = service.paginated_similarity_search(&request).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Vector(VectorError::InvalidCursor(_))
        ));
    }

    #[tokio::test]
    async fn test_search_text_embeds_query() {
        let embedder = MockEmbedder::new(64);
        let store = Arc::new(InMemoryStore::new());
        let texts = ["rust borrow checker rules", "sourdough bread starter"];
        for (i, text) in texts.iter().enumerate() {
            let values = embedder.embed_sync(text).unwrap().into_values();
            store
                .append(
                    CandidateRecord::new(format!("doc{i}"), values, i as i64, DocType::Chunk)
                        .with_model(Some(MOCK_MODEL_NAME.to_string())),
                )
                .unwrap();
        }

        let service = service(store);
        let outcome = service
            .search_text(
                &embedder,
                "the rust borrow checker",
                SimilaritySearchRequest::default().with_threshold(0.1),
            )
            .await
            .unwrap();
        assert_eq!(outcome.results[0].id, "doc0");
        assert_eq!(embedder.calls(), 1);
    }

    #[tokio::test]
    async fn test_search_text_skips_other_models() {
        let embedder = MockEmbedder::new(64);
        let store = Arc::new(InMemoryStore::new());
        store
            .append(
                CandidateRecord::new("voyage-doc", vec![0.2, 0.3, 0.4], 5, DocType::Chunk)
                    .with_model(Some("voyage-3".to_string())),
            )
            .unwrap();
        for (i, text) in ["tokio runtime internals", "garden tomato blight"].iter().enumerate() {
            let values = embedder.embed_sync(text).unwrap().into_values();
            store
                .append(
                    CandidateRecord::new(format!("mock{i}"), values, i as i64, DocType::Chunk)
                        .with_model(Some(MOCK_MODEL_NAME.to_string())),
                )
                .unwrap();
        }

        let service = service(store);
        let outcome = service
            .search_text(
                &embedder,
                "tokio runtime internals",
                SimilaritySearchRequest::default().with_threshold(-1.0),
            )
            .await
            .unwrap();
        let mut found = ids(&outcome.results);
        found.sort();
        assert_eq!(found, vec!["mock0", "mock1"]);

        // An explicit model is kept, so the voyage record is the only candidate.
        let err = service
            .search_text(
                &embedder,
                "tokio runtime internals",
                SimilaritySearchRequest::default().with_model("voyage-3"),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Vector(VectorError::DimensionMismatch {
                expected: 64,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_similarity_search_filters_by_model() {
        let store = Arc::new(InMemoryStore::new());
        seed(&store);
        store
            .append(
                CandidateRecord::new("wide", vec![1.0, 0.0, 0.0, 0.0], 9, DocType::Chunk)
                    .with_model(Some("voyage-3".to_string())),
            )
            .unwrap();
        let service = service(store);

        let err = service
            .similarity_search(&SimilaritySearchRequest::new(vec![1.0, 0.0, 0.0, 0.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Vector(VectorError::DimensionMismatch { .. })
        ));

        let outcome = service
            .similarity_search(
                &SimilaritySearchRequest::new(vec![1.0, 0.0, 0.0, 0.0]).with_model("voyage-3"),
            )
            .unwrap();
        assert_eq!(ids(&outcome.results), vec!["wide"]);
    }

    #[test]
    fn test_zero_scan_cap_rejected() {
        let store = Arc::new(InMemoryStore::new());
        seed(&store);
        let settings = SearchSettings {
            scan_cap: 0,
            ..SearchSettings::default()
        };
        let service = RecallService::new(store, settings);

        let err = service
            .similarity_search(&SimilaritySearchRequest::new(vec![1.0, 0.0, 0.0]))
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = service
            .paginated_similarity_search(&PaginatedSearchRequest::new(vec![1.0, 0.0, 0.0]))
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert!(err.is_invalid_request());
    }

    #[test]
    fn test_top_k_offline_known_scores() {
        // Unit vectors at angles whose cosine with [1, 0] is the target score.
        let scores = [0.9, 0.5, 0.95, 0.1];
        let candidates: Vec<CandidateRecord> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let v = vec![*s, (1.0f64 - s * s).sqrt()];
                CandidateRecord::new(format!("c{i}"), v, i as i64, DocType::Chunk)
            })
            .collect();

        let top = top_k_offline(&[1.0, 0.0], &candidates, 2, 0.5).unwrap();
        assert_eq!(ids(&top), vec!["c2", "c0"]);
        assert!((top[0].similarity - 0.95).abs() < 1e-9);
        assert!((top[1].similarity - 0.9).abs() < 1e-9);
    }
}
