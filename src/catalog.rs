// 📚 College Catalog - the authoritative in-memory list
//
// The catalog is built once from the embedded seed and then only read.
// Snapshots hand out `Arc<[College]>`, so every consumer shares the same
// records and none of them can edit an entry in place.

use crate::data_quality::{self, Severity};
use crate::entities::College;
use crate::error::{CatalogError, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Seed compiled into the binary
pub const EMBEDDED_SEED: &str = include_str!("../data/colleges.json");

#[derive(Debug, Clone)]
pub struct Catalog {
    colleges: Arc<[College]>,
    loaded_at: DateTime<Utc>,
}

impl Catalog {
    /// Load the embedded seed
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_SEED)
    }

    /// Parse, normalize and validate seed text
    pub fn from_json(seed: &str) -> Result<Self> {
        let colleges: Vec<College> = serde_json::from_str(seed)?;
        Self::from_colleges(colleges)
    }

    /// Build from records, rejecting duplicate ids and critical invariant
    /// violations. Order is preserved.
    pub fn from_colleges(colleges: Vec<College>) -> Result<Self> {
        let (reports, summary) = data_quality::check_catalog(&colleges);

        if !summary.duplicate_ids.is_empty() {
            return Err(CatalogError::DuplicateIds(summary.duplicate_ids));
        }

        for report in &reports {
            for failure in report.failures() {
                match failure.severity {
                    Severity::Critical => {
                        return Err(CatalogError::InvalidRecord {
                            id: report.college_id.clone(),
                            reason: failure.message.clone(),
                        })
                    }
                    Severity::Warning => warn!(
                        college = %report.college_id,
                        rule = %failure.rule_name,
                        "{}",
                        failure.message
                    ),
                    Severity::Info => debug!(
                        college = %report.college_id,
                        rule = %failure.rule_name,
                        "{}",
                        failure.message
                    ),
                }
            }
        }

        info!(colleges = colleges.len(), "Catalog loaded");

        Ok(Catalog {
            colleges: colleges.into(),
            loaded_at: Utc::now(),
        })
    }

    /// Shared, read-only view of every college in catalog order
    pub fn snapshot(&self) -> Arc<[College]> {
        Arc::clone(&self.colleges)
    }

    pub fn colleges(&self) -> &[College] {
        &self.colleges
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn len(&self) -> usize {
        self.colleges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colleges.is_empty()
    }

    pub fn find_by_id(&self, id: &str) -> Option<&College> {
        self.colleges.iter().find(|c| c.id == id)
    }

    /// Colleges whose category label matches exactly, ignoring case
    pub fn by_type(&self, label: &str) -> Vec<&College> {
        self.colleges
            .iter()
            .filter(|c| c.college_type.eq_ignore_ascii_case(label))
            .collect()
    }

    /// Colleges whose location mentions `place`, ignoring case
    pub fn by_location(&self, place: &str) -> Vec<&College> {
        let place = place.to_lowercase();
        self.colleges
            .iter()
            .filter(|c| c.location.to_lowercase().contains(&place))
            .collect()
    }

    /// Distinct category labels, first-seen order
    pub fn types(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for college in self.colleges.iter() {
            if !labels.contains(&college.college_type.as_str()) {
                labels.push(&college.college_type);
            }
        }
        labels
    }
}

// ============================================================================
// TESTS
// ============================================================================
