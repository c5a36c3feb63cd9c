// Campus Compass - Core Library
// College catalog, query layer and view model shared by the CLI, TUI and API server

pub mod error;
pub mod config;
pub mod entities;        // College records
pub mod data_quality;    // Catalog invariants checked at load
pub mod catalog;         // Immutable catalog snapshots
pub mod query;           // Filter / search with latency, fallback, stale guard
pub mod compare;         // Side-by-side comparison
pub mod discovery;       // Quiz wizard + recommendation stub
pub mod trust;           // Trust meter bands
pub mod view;            // Page / overlay / session state machine
pub mod export;          // CSV export

// Re-export commonly used types
pub use error::{CatalogError, CompareError, DiscoveryError, ViewError};
pub use config::Config;
pub use entities::{
    BranchCutoff, College, Fees, PlacementStats, Rank, Rankings, NOT_AVAILABLE,
};
pub use data_quality::{
    check_catalog, check_college, BatchSummary, QualityReport, Severity, ValidationResult,
};
pub use catalog::Catalog;
pub use query::{
    filter_colleges, search_colleges, CatalogFilter, CatalogSource, EmbeddedSource,
    QueryOutcome, QueryService, RequestToken, ResultsSlot, Served,
};
pub use compare::{
    highlight, ComparisonSet, ComparisonTable, Direction, Highlight, Metric,
};
pub use discovery::{
    Answer, Answers, DiscoveryWizard, FixedRecommendations, Phase, QuizStep,
    Recommendation, RecommendationEngine, QUIZ,
};
pub use trust::{TrustLevel, TrustMeter};
pub use view::{Overlay, Page, Session, ViewState};
pub use export::{export_csv, write_csv};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
