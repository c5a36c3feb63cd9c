// 🔎 Query Layer - async fetch and search over the catalog
//
// Both reads go through a `CatalogSource`, so the embedded catalog can be
// swapped for a remote one without touching callers. Neither read fails:
// when the source cannot be reached the service logs it, optionally retries
// once, and serves the last known-good snapshot.
//
// `ResultsSlot` holds the single "current results" value and discards
// completions from superseded requests.

use crate::catalog::Catalog;
use crate::config::Config;
use crate::entities::College;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, error, info, warn};

// ============================================================================
// SOURCES
// ============================================================================

/// Where the catalog comes from
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn load(&self) -> Result<Catalog>;

    /// Source identifier for logging
    fn name(&self) -> &'static str;
}

/// Serves the catalog compiled into the binary
pub struct EmbeddedSource {
    catalog: Catalog,
}

impl EmbeddedSource {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl CatalogSource for EmbeddedSource {
    async fn load(&self) -> Result<Catalog> {
        Ok(self.catalog.clone())
    }

    fn name(&self) -> &'static str {
        "embedded"
    }
}

// ============================================================================
// FILTER
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogFilter {
    #[serde(rename = "type", default)]
    pub college_type: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
}

impl CatalogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, college_type: impl Into<String>) -> Self {
        self.college_type = Some(college_type.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_rating(mut self, rating: f32) -> Self {
        self.rating = Some(rating);
        self
    }

    /// True when no predicate is active (blank text counts as absent)
    pub fn is_empty(&self) -> bool {
        active_text(&self.college_type).is_none()
            && active_text(&self.location).is_none()
            && self.rating.is_none()
    }

    /// All active predicates hold for `college`
    pub fn matches(&self, college: &College) -> bool {
        if let Some(wanted) = active_text(&self.college_type) {
            if !college.college_type.to_lowercase().contains(&wanted) {
                return false;
            }
        }

        if let Some(wanted) = active_text(&self.location) {
            if !college.location.to_lowercase().contains(&wanted) {
                return false;
            }
        }

        if let Some(threshold) = self.rating {
            if college.rating < threshold {
                return false;
            }
        }

        true
    }
}

/// Lowercased text of a filter field, or None when blank.
/// Non-blank values keep their surrounding whitespace.
fn active_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .map(str::to_lowercase)
}

/// Entries satisfying every predicate of `filter`, catalog order
pub fn filter_colleges(colleges: &[College], filter: &CatalogFilter) -> Vec<College> {
    if filter.is_empty() {
        return colleges.to_vec();
    }

    colleges
        .iter()
        .filter(|c| filter.matches(c))
        .cloned()
        .collect()
}

/// Entries whose name, location, type or description contain `query`,
/// ignoring case, catalog order. A blank query means "no filter".
pub fn search_colleges(colleges: &[College], query: &str) -> Vec<College> {
    if query.trim().is_empty() {
        return colleges.to_vec();
    }

    let lowercase_query = query.to_lowercase();
    colleges
        .iter()
        .filter(|c| c.matches_text(&lowercase_query))
        .cloned()
        .collect()
}

// ============================================================================
// SERVICE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Served {
    /// Fresh load from the source
    Live,
    /// Source failed; last known-good snapshot used
    Fallback,
}

#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub colleges: Vec<College>,
    pub served: Served,
}

impl QueryOutcome {
    pub fn is_fallback(&self) -> bool {
        self.served == Served::Fallback
    }
}

pub struct QueryService {
    source: Box<dyn CatalogSource>,
    last_good: RwLock<Catalog>,
    fetch_latency: Duration,
    search_latency: Duration,
    retry_backoff: Option<Duration>,
}

impl QueryService {
    /// `fallback` is served whenever `source` fails before it ever succeeded
    pub fn new(source: impl CatalogSource + 'static, fallback: Catalog, config: &Config) -> Self {
        Self {
            source: Box::new(source),
            last_good: RwLock::new(fallback),
            fetch_latency: config.fetch_latency,
            search_latency: config.search_latency,
            retry_backoff: config.retry_backoff,
        }
    }

    /// Service over the embedded catalog
    pub fn embedded(config: &Config) -> Result<Self> {
        let catalog = Catalog::embedded()?;
        Ok(Self::new(EmbeddedSource::new(catalog.clone()), catalog, config))
    }

    /// Filtered fetch. Never fails.
    pub async fn fetch_catalog(&self, filter: &CatalogFilter) -> QueryOutcome {
        tokio::time::sleep(self.fetch_latency).await;

        let (catalog, served) = self.current_catalog().await;
        let colleges = filter_colleges(catalog.colleges(), filter);

        debug!(?filter, results = colleges.len(), ?served, "fetch_catalog");
        QueryOutcome { colleges, served }
    }

    /// Free-text search. Never fails.
    pub async fn search_catalog(&self, query: &str) -> QueryOutcome {
        tokio::time::sleep(self.search_latency).await;

        let (catalog, served) = self.current_catalog().await;
        let colleges = search_colleges(catalog.colleges(), query);

        debug!(query, results = colleges.len(), ?served, "search_catalog");
        QueryOutcome { colleges, served }
    }

    /// Whole catalog straight from the source, without the artificial
    /// latency. Falls back like the other reads.
    pub async fn load_catalog(&self) -> (Catalog, Served) {
        let (catalog, served) = self.current_catalog().await;
        debug!(entries = catalog.len(), ?served, "load_catalog");
        (catalog, served)
    }

    /// Most recent successfully loaded catalog
    pub fn last_known_good(&self) -> Catalog {
        self.last_good
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn current_catalog(&self) -> (Catalog, Served) {
        match self.source.load().await {
            Ok(catalog) => return (self.remember(catalog), Served::Live),
            Err(e) => warn!(source = self.source.name(), error = %e, "Catalog load failed"),
        }

        if let Some(backoff) = self.retry_backoff {
            tokio::time::sleep(backoff).await;
            match self.source.load().await {
                Ok(catalog) => {
                    info!(source = self.source.name(), "Catalog load succeeded on retry");
                    return (self.remember(catalog), Served::Live);
                }
                Err(e) => warn!(source = self.source.name(), error = %e, "Catalog retry failed"),
            }
        }

        let fallback = self.last_known_good();
        error!(
            source = self.source.name(),
            snapshot_loaded_at = %fallback.loaded_at(),
            "Serving last known-good catalog"
        );
        (fallback, Served::Fallback)
    }

    fn remember(&self, catalog: Catalog) -> Catalog {
        let mut last_good = self
            .last_good
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *last_good = catalog.clone();
        catalog
    }
}

// ============================================================================
// RESULTS SLOT
// ============================================================================

/// Issued by [`ResultsSlot::begin`]; only the newest token may store results
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestToken(u64);

/// The single "current results" slot shown by a results view
#[derive(Debug, Default)]
pub struct ResultsSlot {
    generation: u64,
    loading: bool,
    current: Vec<College>,
    served: Option<Served>,
}

impl ResultsSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request; any request begun earlier becomes stale
    pub fn begin(&mut self) -> RequestToken {
        self.generation += 1;
        self.loading = true;
        RequestToken(self.generation)
    }

    /// Store `outcome` if `token` is still the newest request.
    /// Returns false when the completion was stale and discarded.
    pub fn complete(&mut self, token: RequestToken, outcome: QueryOutcome) -> bool {
        if token.0 != self.generation {
            debug!(
                token = token.0,
                current = self.generation,
                "Discarding stale query results"
            );
            return false;
        }

        self.current = outcome.colleges;
        self.served = Some(outcome.served);
        self.loading = false;
        true
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn current(&self) -> &[College] {
        &self.current
    }

    pub fn served(&self) -> Option<Served> {
        self.served
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::college::tests::sample;
    use crate::error::CatalogError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn ids(colleges: &[College]) -> Vec<&str> {
        colleges.iter().map(|c| c.id.as_str()).collect()
    }

    fn two_college_catalog() -> Catalog {
        let mut iit = sample("1", "Indian Institute of Technology, Delhi");
        iit.location = "New Delhi, Delhi".to_string();
        iit.rating = 4.5;
        iit.description = "Premier engineering institute".to_string();

        let mut bits = sample("4", "Birla Institute of Technology and Science, Pilani");
        bits.location = "Pilani, Rajasthan".to_string();
        bits.rating = 4.4;
        bits.description = "Prestigious private institute".to_string();

        Catalog::from_colleges(vec![iit, bits]).unwrap()
    }

    /// Fails the first `failures` loads, then serves `catalog`
    struct FlakySource {
        catalog: Catalog,
        failures: usize,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CatalogSource for FlakySource {
        async fn load(&self) -> Result<Catalog> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(CatalogError::SourceUnavailable("connection refused".into()))
            } else {
                Ok(self.catalog.clone())
            }
        }

        fn name(&self) -> &'static str {
            "flaky"
        }
    }

    #[test]
    fn test_empty_filter_returns_everything_in_order() {
        let catalog = Catalog::embedded().unwrap();
        let result = filter_colleges(catalog.colleges(), &CatalogFilter::new());
        assert_eq!(result, catalog.colleges().to_vec());
    }

    #[test]
    fn test_blank_text_filters_are_ignored() {
        let catalog = Catalog::embedded().unwrap();
        let filter = CatalogFilter::new().with_type("  ").with_location("");
        assert!(filter.is_empty());
        assert_eq!(filter_colleges(catalog.colleges(), &filter).len(), 15);
    }

    #[test]
    fn test_filters_combine() {
        let catalog = Catalog::embedded().unwrap();
        let filter = CatalogFilter::new()
            .with_type("ENGINEERING")
            .with_location("delhi")
            .with_rating(4.0);

        let result = filter_colleges(catalog.colleges(), &filter);
        assert_eq!(ids(&result), vec!["1"]);
    }

    #[test]
    fn test_type_filter_is_substring() {
        let catalog = Catalog::embedded().unwrap();
        let result = filter_colleges(catalog.colleges(), &CatalogFilter::new().with_type("math"));
        assert_eq!(ids(&result), vec!["10"]);
    }

    #[test]
    fn test_rating_above_max_is_empty() {
        let catalog = Catalog::embedded().unwrap();
        let result = filter_colleges(catalog.colleges(), &CatalogFilter::new().with_rating(5.0));
        assert!(result.is_empty());
    }

    #[test]
    fn test_rating_threshold_is_inclusive() {
        let catalog = Catalog::embedded().unwrap();
        let result = filter_colleges(catalog.colleges(), &CatalogFilter::new().with_rating(4.8));
        assert_eq!(ids(&result), vec!["8"]);
    }

    #[test]
    fn test_scenario_two_colleges() {
        let catalog = two_college_catalog();

        let delhi = search_colleges(catalog.colleges(), "delhi");
        assert_eq!(ids(&delhi), vec!["1"]);

        let engineering =
            filter_colleges(catalog.colleges(), &CatalogFilter::new().with_type("engineering"));
        assert_eq!(ids(&engineering), vec!["1", "4"]);

        let rated = filter_colleges(catalog.colleges(), &CatalogFilter::new().with_rating(4.45));
        assert_eq!(ids(&rated), vec!["1"]);
    }

    #[test]
    fn test_blank_search_returns_everything() {
        let catalog = Catalog::embedded().unwrap();
        assert_eq!(search_colleges(catalog.colleges(), "").len(), 15);
        assert_eq!(search_colleges(catalog.colleges(), "   \t").len(), 15);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let catalog = Catalog::embedded().unwrap();
        let lower = search_colleges(catalog.colleges(), "bombay");
        let upper = search_colleges(catalog.colleges(), "BoMbAy");
        assert_eq!(ids(&lower), vec!["2"]);
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_search_finds_every_name_substring() {
        let catalog = Catalog::embedded().unwrap();

        for college in catalog.colleges() {
            let chars: Vec<char> = college.name.chars().collect();
            let mid = chars.len() / 2;
            let fragment: String = chars[mid / 2..mid + 3].iter().collect();

            for query in [fragment.to_uppercase(), fragment.to_lowercase(), college.name.clone()] {
                let result = search_colleges(catalog.colleges(), &query);
                assert!(
                    result.iter().any(|c| c.id == college.id),
                    "{:?} should find {}",
                    query,
                    college.id
                );
            }
        }
    }

    #[test]
    fn test_search_results_all_match() {
        let catalog = Catalog::embedded().unwrap();

        for query in ["institute", "Tamil", "research", "law", "xyz", "a"] {
            let q = query.to_lowercase();
            for college in search_colleges(catalog.colleges(), query) {
                let fields = [
                    &college.name,
                    &college.location,
                    &college.college_type,
                    &college.description,
                ];
                assert!(fields.iter().any(|f| f.to_lowercase().contains(&q)));
            }
        }
    }

    #[test]
    fn test_search_keeps_surrounding_whitespace() {
        let catalog = Catalog::embedded().unwrap();
        let query = "delhi ";

        let result = search_colleges(catalog.colleges(), query);
        assert!(!result.is_empty());
        for college in &result {
            assert!(
                college.matches_text(query),
                "{} does not contain {:?}",
                college.id,
                query
            );
        }
        assert!(result.len() < search_colleges(catalog.colleges(), "delhi").len());
    }

    #[test]
    fn test_padded_type_filter_is_not_trimmed() {
        let catalog = Catalog::embedded().unwrap();
        let padded = CatalogFilter::new().with_type(" engineering ");
        assert!(!padded.is_empty());
        assert!(filter_colleges(catalog.colleges(), &padded).is_empty());

        let plain = CatalogFilter::new().with_type("engineering");
        assert!(!filter_colleges(catalog.colleges(), &plain).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_is_idempotent() {
        let service = QueryService::embedded(&Config::instant()).unwrap();
        let filter = CatalogFilter::new().with_location("karnataka");

        let first = service.fetch_catalog(&filter).await;
        let second = service.fetch_catalog(&filter).await;

        assert_eq!(first.colleges, second.colleges);
        assert_eq!(ids(&first.colleges), vec!["3", "9", "15"]);
        assert_eq!(first.served, Served::Live);
    }

    #[tokio::test]
    async fn test_search_through_service() {
        let service = QueryService::embedded(&Config::instant()).unwrap();
        let outcome = service.search_catalog("Kanpur").await;
        assert_eq!(ids(&outcome.colleges), vec!["11"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_waits_for_latency() {
        let config = Config::instant()
            .with_latency(Duration::from_millis(500), Duration::from_millis(300));
        let service = QueryService::embedded(&config).unwrap();

        let start = tokio::time::Instant::now();
        service.fetch_catalog(&CatalogFilter::new()).await;
        assert!(start.elapsed() >= Duration::from_millis(500));

        let start = tokio::time::Instant::now();
        service.search_catalog("iit").await;
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_failing_source_falls_back() {
        let fallback = two_college_catalog();
        let calls = Arc::new(AtomicUsize::new(0));
        let source = FlakySource {
            catalog: Catalog::embedded().unwrap(),
            failures: usize::MAX,
            calls: calls.clone(),
        };
        let service = QueryService::new(source, fallback, &Config::instant());

        let outcome = service.fetch_catalog(&CatalogFilter::new()).await;

        assert!(outcome.is_fallback());
        assert_eq!(ids(&outcome.colleges), vec!["1", "4"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_single_retry_recovers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = FlakySource {
            catalog: Catalog::embedded().unwrap(),
            failures: 1,
            calls: calls.clone(),
        };
        let config = Config::instant().with_retry_backoff(Duration::from_millis(1));
        let service = QueryService::new(source, two_college_catalog(), &config);

        let outcome = service.search_catalog("").await;

        assert_eq!(outcome.served, Served::Live);
        assert_eq!(outcome.colleges.len(), 15);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fallback_uses_last_successful_load() {
        let calls = Arc::new(AtomicUsize::new(0));
        // Fails only the first call, so the second fetch refreshes the snapshot
        let source = FlakySource {
            catalog: Catalog::embedded().unwrap(),
            failures: 1,
            calls: calls.clone(),
        };
        let service = QueryService::new(source, two_college_catalog(), &Config::instant());

        assert!(service.fetch_catalog(&CatalogFilter::new()).await.is_fallback());
        assert_eq!(service.last_known_good().len(), 2);

        let live = service.fetch_catalog(&CatalogFilter::new()).await;
        assert_eq!(live.served, Served::Live);
        assert_eq!(service.last_known_good().len(), 15);
    }

    #[tokio::test]
    async fn test_load_catalog_asks_the_source() {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = FlakySource {
            catalog: two_college_catalog(),
            failures: 0,
            calls: calls.clone(),
        };
        let service = QueryService::new(source, Catalog::embedded().unwrap(), &Config::instant());
        assert_eq!(service.last_known_good().len(), 15);

        let (catalog, served) = service.load_catalog().await;
        assert_eq!(served, Served::Live);
        assert_eq!(catalog.len(), 2);
        assert_eq!(service.last_known_good().len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_load_catalog_falls_back() {
        let source = FlakySource {
            catalog: Catalog::embedded().unwrap(),
            failures: usize::MAX,
            calls: Arc::new(AtomicUsize::new(0)),
        };
        let service = QueryService::new(source, two_college_catalog(), &Config::instant());

        let (catalog, served) = service.load_catalog().await;
        assert_eq!(served, Served::Fallback);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_stale_results_are_discarded() {
        let catalog = Catalog::embedded().unwrap();
        let mut slot = ResultsSlot::new();

        let slow = slot.begin();
        let fast = slot.begin();
        assert!(slot.is_loading());

        let fresh = QueryOutcome {
            colleges: search_colleges(catalog.colleges(), "bombay"),
            served: Served::Live,
        };
        assert!(slot.complete(fast, fresh));
        assert!(!slot.is_loading());

        let stale = QueryOutcome {
            colleges: catalog.colleges().to_vec(),
            served: Served::Live,
        };
        assert!(!slot.complete(slow, stale));

        assert_eq!(ids(slot.current()), vec!["2"]);
        assert_eq!(slot.generation(), 2);
    }

    #[test]
    fn test_filter_deserializes_type_key() {
        let filter: CatalogFilter =
            serde_json::from_str(r#"{"type": "law", "rating": 4.0}"#).unwrap();
        assert_eq!(filter.college_type.as_deref(), Some("law"));
        assert_eq!(filter.rating, Some(4.0));
        assert!(filter.location.is_none());
    }
}
