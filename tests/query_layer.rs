// End-to-end checks of the query layer through the public API

use async_trait::async_trait;
use campus_compass::{
    highlight, Catalog, CatalogError, CatalogFilter, CatalogSource, College, Config,
    EmbeddedSource, Highlight, Metric, QueryService, ResultsSlot, Served,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const TWO_COLLEGES: &str = r#"[
    {
        "id": "1",
        "name": "Indian Institute of Technology, Delhi",
        "location": "New Delhi, Delhi",
        "type": "Engineering",
        "description": "Premier engineering institute.",
        "rating": 4.5,
        "rankings": { "nirf": 2, "qs": 197 }
    },
    {
        "id": "4",
        "name": "Birla Institute of Technology and Science, Pilani",
        "location": "Pilani, Rajasthan",
        "type": "Engineering",
        "description": "Private deemed university.",
        "rating": 4.4,
        "rankings": { "nirf": 25 }
    }
]"#;

fn ids(colleges: &[College]) -> Vec<&str> {
    colleges.iter().map(|c| c.id.as_str()).collect()
}

fn two_college_service() -> QueryService {
    let catalog = Catalog::from_json(TWO_COLLEGES).unwrap();
    QueryService::new(EmbeddedSource::new(catalog.clone()), catalog, &Config::instant())
}

/// Source that can be switched off mid-session
struct SwitchableSource {
    catalog: Catalog,
    down: Arc<AtomicBool>,
}

#[async_trait]
impl CatalogSource for SwitchableSource {
    async fn load(&self) -> Result<Catalog, CatalogError> {
        if self.down.load(Ordering::SeqCst) {
            Err(CatalogError::SourceUnavailable("switched off".to_string()))
        } else {
            Ok(self.catalog.clone())
        }
    }

    fn name(&self) -> &'static str {
        "switchable"
    }
}

#[tokio::test]
async fn test_two_college_scenario() {
    let service = two_college_service();

    let delhi = service.search_catalog("delhi").await;
    assert_eq!(ids(&delhi.colleges), vec!["1"]);

    let engineering = service
        .fetch_catalog(&CatalogFilter::new().with_type("engineering"))
        .await;
    assert_eq!(ids(&engineering.colleges), vec!["1", "4"]);

    let rated = service
        .fetch_catalog(&CatalogFilter::new().with_rating(4.45))
        .await;
    assert_eq!(ids(&rated.colleges), vec!["1"]);
}

#[tokio::test]
async fn test_empty_filter_returns_catalog_in_order() {
    let service = QueryService::embedded(&Config::instant()).unwrap();
    let all = service.fetch_catalog(&CatalogFilter::new()).await;

    let expected: Vec<String> = (1..=15).map(|n| n.to_string()).collect();
    let got: Vec<String> = all.colleges.iter().map(|c| c.id.clone()).collect();
    assert_eq!(got, expected);
    assert_eq!(all.served, Served::Live);
}

#[tokio::test]
async fn test_rating_above_max_is_empty() {
    let service = QueryService::embedded(&Config::instant()).unwrap();
    let outcome = service
        .fetch_catalog(&CatalogFilter::new().with_rating(5.0))
        .await;
    assert!(outcome.colleges.is_empty());
    assert!(!outcome.is_fallback());
}

#[tokio::test]
async fn test_name_substrings_always_found() {
    let service = QueryService::embedded(&Config::instant()).unwrap();
    let catalog = service.last_known_good();

    for college in catalog.colleges() {
        let chars: Vec<char> = college.name.chars().collect();
        let mid = chars.len() / 2;
        let probes = [
            chars[..mid.min(6)].iter().collect::<String>(),
            chars[mid..].iter().collect::<String>().to_uppercase(),
            college.name.to_lowercase(),
        ];

        for probe in probes.iter().filter(|p| !p.trim().is_empty()) {
            let outcome = service.search_catalog(probe).await;
            assert!(
                outcome.colleges.iter().any(|c| c.id == college.id),
                "{:?} did not find {}",
                probe,
                college.name
            );
        }
    }
}

#[tokio::test]
async fn test_search_results_all_match() {
    let service = QueryService::embedded(&Config::instant()).unwrap();

    for query in ["Institute", "KARNATAKA", "medical", "tech", "research"] {
        let lowered = query.to_lowercase();
        let outcome = service.search_catalog(query).await;
        assert!(!outcome.colleges.is_empty(), "no results for {}", query);
        for c in &outcome.colleges {
            let hit = [&c.name, &c.location, &c.college_type, &c.description]
                .iter()
                .any(|f| f.to_lowercase().contains(&lowered));
            assert!(hit, "{} does not match {}", c.name, query);
        }
    }
}

#[tokio::test]
async fn test_fetch_is_idempotent() {
    let service = QueryService::embedded(&Config::instant()).unwrap();
    let filter = CatalogFilter::new().with_location("delhi").with_rating(4.3);

    let first = service.fetch_catalog(&filter).await;
    let second = service.fetch_catalog(&filter).await;
    assert_eq!(ids(&first.colleges), ids(&second.colleges));
    assert_eq!(ids(&first.colleges), vec!["1", "6", "8"]);
}

#[tokio::test]
async fn test_outage_serves_last_known_good() {
    let down = Arc::new(AtomicBool::new(false));
    let live = Catalog::embedded().unwrap();
    let stale = Catalog::from_json(TWO_COLLEGES).unwrap();
    let service = QueryService::new(
        SwitchableSource {
            catalog: live,
            down: down.clone(),
        },
        stale,
        &Config::instant().with_retry_backoff(Duration::ZERO),
    );

    let before = service.fetch_catalog(&CatalogFilter::new()).await;
    assert_eq!(before.colleges.len(), 15);

    down.store(true, Ordering::SeqCst);
    let during = service.search_catalog("").await;
    assert!(during.is_fallback());
    assert_eq!(during.colleges.len(), 15);

    down.store(false, Ordering::SeqCst);
    let after = service.search_catalog("").await;
    assert_eq!(after.served, Served::Live);
}

#[tokio::test]
async fn test_slot_keeps_latest_request_only() {
    let service = QueryService::embedded(&Config::instant()).unwrap();
    let mut slot = ResultsSlot::new();

    let old = slot.begin();
    let new = slot.begin();

    let newest = service.search_catalog("law").await;
    let superseded = service.search_catalog("").await;

    assert!(slot.complete(new, newest));
    assert!(!slot.complete(old, superseded));
    assert_eq!(ids(slot.current()), vec!["9"]);
    assert!(!slot.is_loading());
}

#[test]
fn test_nirf_highlighting() {
    let catalog = Catalog::from_json(TWO_COLLEGES).unwrap();
    let mut colleges = catalog.colleges().to_vec();
    let mut third = colleges[0].clone();
    third.id = "x".to_string();
    third.rankings.nirf = campus_compass::Rank::new(3);
    colleges.insert(1, third);

    assert_eq!(
        highlight(&colleges, Metric::NirfRank),
        vec![Highlight::Best, Highlight::Neutral, Highlight::Worst]
    );

    for c in colleges.iter_mut() {
        c.rankings.nirf = campus_compass::Rank::new(7);
    }
    assert!(highlight(&colleges, Metric::NirfRank)
        .iter()
        .all(|h| *h == Highlight::Neutral));
}
