//! Paginated similarity search over the candidate scan.
//!
//! Each page fetches the next window of at most `scan_cap` candidates in
//! `(inserted_at desc, id desc)` order and ranks that window on its own.
//! The next cursor comes from the last *scanned* candidate, so scan
//! continuation does not depend on how many candidates passed the
//! threshold. Results are only ordered within a page; the union of pages is
//! not a global top-K.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cursor::Cursor;
use crate::error::VectorError;
use crate::search::{rank, ScoredResult, SearchEngine, SearchOptions};
use crate::store::{CandidateFilter, CandidateReader};

/// Default number of candidates scanned per page
pub const DEFAULT_SCAN_CAP: usize = 1000;

/// Parameters for one page of a paginated search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRequest {
    pub options: SearchOptions,
    /// Opaque cursor from the previous page; `None` starts at the newest record
    pub cursor: Option<String>,
    pub filter: CandidateFilter,
    /// Candidates scanned for this page
    pub scan_cap: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            options: SearchOptions::default(),
            cursor: None,
            filter: CandidateFilter::default(),
            scan_cap: DEFAULT_SCAN_CAP,
        }
    }
}

impl PageRequest {
    /// Request for the page following `page`.
    pub fn next(&self, page: &Page) -> Option<Self> {
        page.next_cursor.as_ref().map(|cursor| Self {
            cursor: Some(cursor.clone()),
            ..self.clone()
        })
    }
}

/// One ranked page plus the scan continuation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    pub results: Vec<ScoredResult>,
    /// Opaque cursor for the next page; `None` on the terminal page
    pub next_cursor: Option<String>,
    pub has_more: bool,
    /// Candidates scanned in this page's window
    pub scanned: usize,
    pub timing_ms: f64,
}

impl SearchEngine {
    /// Rank the next candidate window from `reader`.
    ///
    /// The query, scan cap and cursor are validated before any fetch. Storage errors
    /// are returned unchanged and no partial page is produced.
    pub fn search_page<R: CandidateReader + ?Sized>(
        &self,
        reader: &R,
        query: &[f64],
        request: &PageRequest,
    ) -> Result<Page, VectorError> {
        let start = Instant::now();
        self.validate_query(query)?;
        if request.scan_cap == 0 {
            return Err(VectorError::InvalidInput("scan_cap must be > 0".to_string()));
        }

        let cursor = request.cursor.as_deref().map(Cursor::decode).transpose()?;
        let cap = request.scan_cap;

        let window = reader.fetch_candidates(&request.filter, cap, cursor.as_ref())?;
        let results = rank(query, &window, &request.options)?;

        let has_more = window.len() >= cap;
        let next_cursor = if has_more {
            window.last().map(|last| Cursor::from_record(last).encode())
        } else {
            None
        };

        let timing_ms = start.elapsed().as_secs_f64() * 1000.0;
        debug!(
            scanned = window.len(),
            results = results.len(),
            has_more = has_more,
            timing_ms = timing_ms,
            "Search page complete"
        );

        Ok(Page {
            results,
            next_cursor,
            has_more,
            scanned: window.len(),
            timing_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use recall_types::DocType;

    use super::*;
    use crate::record::CandidateRecord;

    /// Minimal reader over a pre-sorted vector.
    struct VecReader {
        records: Vec<CandidateRecord>,
        calls: Mutex<usize>,
    }

    impl VecReader {
        fn new(mut records: Vec<CandidateRecord>) -> Self {
            records.sort_by(|a, b| {
                b.inserted_at
                    .cmp(&a.inserted_at)
                    .then_with(|| b.id.cmp(&a.id))
            });
            Self {
                records,
                calls: Mutex::new(0),
            }
        }
    }

    impl CandidateReader for VecReader {
        fn fetch_candidates(
            &self,
            filter: &CandidateFilter,
            cap: usize,
            after: Option<&Cursor>,
        ) -> Result<Vec<CandidateRecord>, VectorError> {
            *self.calls.lock().unwrap() += 1;
            Ok(self
                .records
                .iter()
                .filter(|r| after.map_or(true, |c| c.precedes(r.inserted_at, &r.id)))
                .filter(|r| filter.matches(r))
                .take(cap)
                .cloned()
                .collect())
        }
    }

    struct FailingReader;

    impl CandidateReader for FailingReader {
        fn fetch_candidates(
            &self,
            _filter: &CandidateFilter,
            _cap: usize,
            _after: Option<&Cursor>,
        ) -> Result<Vec<CandidateRecord>, VectorError> {
            Err(VectorError::storage(std::io::Error::other("disk on fire")))
        }
    }

    fn pool(n: usize) -> Vec<CandidateRecord> {
        (0..n)
            .map(|i| {
                let angle = i as f64 * 0.1;
                CandidateRecord::new(
                    format!("rec-{i:03}"),
                    vec![angle.cos(), angle.sin()],
                    1_000 + (i as i64 / 2),
                    DocType::Chunk,
                )
            })
            .collect()
    }

    fn collect_pages(reader: &VecReader, request: PageRequest) -> Vec<Page> {
        let engine = SearchEngine::new();
        let mut pages = Vec::new();
        let mut request = Some(request);
        while let Some(req) = request {
            let page = engine.search_page(reader, &[1.0, 0.0], &req).unwrap();
            request = req.next(&page);
            pages.push(page);
        }
        pages
    }

    #[test]
    fn test_pages_cover_pool_exactly_once() {
        let reader = VecReader::new(pool(25));
        let request = PageRequest {
            options: SearchOptions::new(100, -1.0),
            scan_cap: 7,
            ..PageRequest::default()
        };

        let pages = collect_pages(&reader, request);
        assert_eq!(pages.len(), 4);
        assert!(!pages.last().unwrap().has_more);
        assert!(pages.last().unwrap().next_cursor.is_none());

        let mut seen: Vec<String> = pages
            .iter()
            .flat_map(|p| p.results.iter().map(|r| r.id.clone()))
            .collect();
        assert_eq!(seen.len(), 25);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 25);
    }

    #[test]
    fn test_cursor_independent_of_threshold() {
        let reader = VecReader::new(pool(20));
        // Threshold so high nothing passes; the scan still advances.
        let request = PageRequest {
            options: SearchOptions::new(1, 1.1),
            scan_cap: 5,
            ..PageRequest::default()
        };

        let pages = collect_pages(&reader, request);
        let scanned: usize = pages.iter().map(|p| p.scanned).sum();
        assert_eq!(scanned, 20);
        assert!(pages.iter().all(|p| p.results.is_empty()));
    }

    #[test]
    fn test_exact_multiple_ends_with_empty_page() {
        let reader = VecReader::new(pool(10));
        let request = PageRequest {
            options: SearchOptions::new(10, -1.0),
            scan_cap: 5,
            ..PageRequest::default()
        };

        let pages = collect_pages(&reader, request);
        assert_eq!(pages.len(), 3);
        assert!(pages[1].has_more);
        assert_eq!(pages[2].scanned, 0);
        assert!(!pages[2].has_more);
    }

    #[test]
    fn test_rescan_is_idempotent() {
        let reader = VecReader::new(pool(18));
        let request = PageRequest {
            options: SearchOptions::new(3, 0.0),
            scan_cap: 4,
            ..PageRequest::default()
        };

        let first: Vec<_> = collect_pages(&reader, request.clone())
            .into_iter()
            .map(|p| (p.results, p.next_cursor))
            .collect();
        let second: Vec<_> = collect_pages(&reader, request)
            .into_iter()
            .map(|p| (p.results, p.next_cursor))
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_next_cursor_from_last_scanned_not_last_returned() {
        let reader = VecReader::new(pool(6));
        let request = PageRequest {
            options: SearchOptions::new(1, -1.0),
            scan_cap: 3,
            ..PageRequest::default()
        };
        let page = SearchEngine::new()
            .search_page(&reader, &[1.0, 0.0], &request)
            .unwrap();

        assert_eq!(page.results.len(), 1);
        let cursor = Cursor::decode(page.next_cursor.as_deref().unwrap()).unwrap();
        // Window is rec-005, rec-004, rec-003 (newest first).
        assert_eq!(cursor.id, "rec-003");
        assert_eq!(cursor.inserted_at, 1_001);
    }

    #[test]
    fn test_invalid_cursor_rejected_before_fetch() {
        let reader = VecReader::new(pool(3));
        let request = PageRequest {
            cursor: Some("not-a-cursor".to_string()),
            ..PageRequest::default()
        };
        let err = SearchEngine::new()
            .search_page(&reader, &[1.0, 0.0], &request)
            .unwrap_err();
        assert!(matches!(err, VectorError::InvalidCursor(_)));
        assert_eq!(*reader.calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_zero_scan_cap_rejected_before_fetch() {
        let reader = VecReader::new(pool(3));
        let request = PageRequest {
            scan_cap: 0,
            ..PageRequest::default()
        };
        let err = SearchEngine::new()
            .search_page(&reader, &[1.0, 0.0], &request)
            .unwrap_err();
        assert!(matches!(err, VectorError::InvalidInput(_)));
        assert_eq!(*reader.calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_storage_error_propagates() {
        let err = SearchEngine::new()
            .search_page(&FailingReader, &[1.0], &PageRequest::default())
            .unwrap_err();
        assert!(matches!(err, VectorError::Storage(_)));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "disk on fire");
    }
}
