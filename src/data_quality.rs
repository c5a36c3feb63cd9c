// ✅ Data Quality Engine - catalog invariant checks
//
// Every college in the seed is run through a fixed set of rules. Critical
// failures mean the record breaks a catalog invariant (rating out of range,
// more students placed than graduated, ...). Warnings and info findings are
// logged but never block loading.

use crate::entities::College;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Allowed gap, in percentage points, between the stated placement
/// percentage and placed / total × 100
pub const PLACEMENT_TOLERANCE: f32 = 1.0;

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub passed: bool,
    pub rule_name: String,
    pub field: String,
    pub message: String,
    pub confidence: f64,
    pub severity: Severity,
}

impl ValidationResult {
    pub fn pass(rule_name: &str, field: &str, message: &str) -> Self {
        ValidationResult {
            passed: true,
            rule_name: rule_name.to_string(),
            field: field.to_string(),
            message: message.to_string(),
            confidence: 1.0,
            severity: Severity::Info,
        }
    }

    pub fn fail(rule_name: &str, field: &str, message: &str, severity: Severity) -> Self {
        ValidationResult {
            passed: false,
            rule_name: rule_name.to_string(),
            field: field.to_string(),
            message: message.to_string(),
            confidence: match severity {
                Severity::Critical => 0.0,
                Severity::Warning => 0.5,
                Severity::Info => 0.8,
            },
            severity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Critical, // Record breaks a catalog invariant
    Warning,  // Record is questionable or inconsistent
    Info,     // Record is valid but thin
}

// ============================================================================
// QUALITY REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub college_id: String,
    pub overall_quality: f64,
    pub overall_confidence: f64,
    pub validations: Vec<ValidationResult>,
    pub passed_count: usize,
    pub failed_count: usize,
}

impl QualityReport {
    pub fn failures(&self) -> impl Iterator<Item = &ValidationResult> {
        self.validations.iter().filter(|v| !v.passed)
    }

    pub fn has_critical_issues(&self) -> bool {
        self.failures().any(|v| v.severity == Severity::Critical)
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: quality {:.1}%, confidence {:.1}%, {} failed",
            self.college_id,
            self.overall_quality * 100.0,
            self.overall_confidence * 100.0,
            self.failed_count
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_colleges: usize,
    pub critical_ids: Vec<String>,
    pub warning_count: usize,
    pub info_count: usize,
    pub duplicate_ids: Vec<String>,
}

impl BatchSummary {
    /// No critical finding and no duplicate identity
    pub fn is_loadable(&self) -> bool {
        self.critical_ids.is_empty() && self.duplicate_ids.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} colleges: {} critical, {} warnings, {} info, {} duplicate ids",
            self.total_colleges,
            self.critical_ids.len(),
            self.warning_count,
            self.info_count,
            self.duplicate_ids.len()
        )
    }
}

// ============================================================================
// CHECKS
// ============================================================================

/// Run every rule against one college
pub fn check_college(college: &College) -> QualityReport {
    let validations = vec![
        validate_identity(college),
        validate_rating(college.rating),
        validate_placement_rate(college.placement_rate),
        validate_placement_stats(college),
        validate_rankings(college),
        validate_recruiters(&college.top_recruiters),
        validate_description(&college.description),
    ];

    let passed_count = validations.iter().filter(|v| v.passed).count();
    let failed_count = validations.len() - passed_count;
    let overall_quality = passed_count as f64 / validations.len() as f64;
    let overall_confidence =
        validations.iter().map(|v| v.confidence).sum::<f64>() / validations.len() as f64;

    QualityReport {
        college_id: college.id.clone(),
        overall_quality,
        overall_confidence,
        validations,
        passed_count,
        failed_count,
    }
}

/// Check a whole catalog, including identity uniqueness
pub fn check_catalog(colleges: &[College]) -> (Vec<QualityReport>, BatchSummary) {
    let reports: Vec<QualityReport> = colleges.iter().map(check_college).collect();

    let mut summary = BatchSummary {
        total_colleges: colleges.len(),
        ..BatchSummary::default()
    };

    for report in &reports {
        if report.has_critical_issues() {
            summary.critical_ids.push(report.college_id.clone());
        }
        for failure in report.failures() {
            match failure.severity {
                Severity::Warning => summary.warning_count += 1,
                Severity::Info => summary.info_count += 1,
                Severity::Critical => {}
            }
        }
    }

    summary.duplicate_ids = duplicate_ids(colleges);
    (reports, summary)
}

/// Ids that occur more than once, in order of their second occurrence
pub fn duplicate_ids(colleges: &[College]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();

    for college in colleges {
        if !seen.insert(college.id.as_str()) && !duplicates.contains(&college.id) {
            duplicates.push(college.id.clone());
        }
    }

    duplicates
}

// ============================================================================
// VALIDATION RULES
// ============================================================================

fn validate_identity(college: &College) -> ValidationResult {
    if college.id.trim().is_empty() {
        return ValidationResult::fail("id_not_empty", "id", "Id is empty", Severity::Critical);
    }

    if college.name.trim().is_empty() {
        return ValidationResult::fail(
            "name_not_empty",
            "name",
            "Name is empty",
            Severity::Critical,
        );
    }

    ValidationResult::pass("identity_valid", "id", "Id and name present")
}

fn validate_rating(rating: f32) -> ValidationResult {
    if !rating.is_finite() || !(0.0..=5.0).contains(&rating) {
        return ValidationResult::fail(
            "rating_range",
            "rating",
            &format!("Rating {} outside 0-5", rating),
            Severity::Critical,
        );
    }

    ValidationResult::pass("rating_range", "rating", "Rating within 0-5")
}

fn validate_placement_rate(rate: f32) -> ValidationResult {
    if !rate.is_finite() || !(0.0..=100.0).contains(&rate) {
        return ValidationResult::fail(
            "placement_rate_range",
            "placement_rate",
            &format!("Placement rate {} outside 0-100", rate),
            Severity::Critical,
        );
    }

    ValidationResult::pass(
        "placement_rate_range",
        "placement_rate",
        "Placement rate within 0-100",
    )
}

fn validate_placement_stats(college: &College) -> ValidationResult {
    let stats = match college.placement_stats {
        Some(stats) => stats,
        None => {
            return ValidationResult::fail(
                "placement_stats_present",
                "placement_stats",
                "No placement statistics",
                Severity::Info,
            )
        }
    };

    if stats.placed_students > stats.total_students {
        return ValidationResult::fail(
            "placement_stats_counts",
            "placement_stats",
            &format!(
                "Placed students {} exceed total {}",
                stats.placed_students, stats.total_students
            ),
            Severity::Critical,
        );
    }

    if !(0.0..=100.0).contains(&stats.placement_percentage) {
        return ValidationResult::fail(
            "placement_stats_range",
            "placement_stats",
            &format!(
                "Placement percentage {} outside 0-100",
                stats.placement_percentage
            ),
            Severity::Critical,
        );
    }

    match stats.computed_percentage() {
        Some(computed) if (computed - stats.placement_percentage).abs() > PLACEMENT_TOLERANCE => {
            ValidationResult::fail(
                "placement_stats_consistent",
                "placement_stats",
                &format!(
                    "Stated {:.1}% but placed/total gives {:.1}%",
                    stats.placement_percentage, computed
                ),
                Severity::Warning,
            )
        }
        _ => ValidationResult::pass(
            "placement_stats_consistent",
            "placement_stats",
            "Placement statistics consistent",
        ),
    }
}

fn validate_rankings(college: &College) -> ValidationResult {
    if !college.rankings.nirf.is_ranked() && !college.rankings.qs.is_ranked() {
        return ValidationResult::fail(
            "rankings_present",
            "rankings",
            "No NIRF or QS ranking",
            Severity::Info,
        );
    }

    ValidationResult::pass("rankings_present", "rankings", "At least one ranking present")
}

fn validate_recruiters(recruiters: &[String]) -> ValidationResult {
    if recruiters.is_empty() {
        return ValidationResult::fail(
            "recruiters_not_empty",
            "top_recruiters",
            "No top recruiters listed",
            Severity::Warning,
        );
    }

    ValidationResult::pass(
        "recruiters_not_empty",
        "top_recruiters",
        &format!("{} recruiters listed", recruiters.len()),
    )
}

fn validate_description(description: &str) -> ValidationResult {
    if description.trim().is_empty() {
        return ValidationResult::fail(
            "description_not_empty",
            "description",
            "Description is empty",
            Severity::Info,
        );
    }

    ValidationResult::pass("description_not_empty", "description", "Description present")
}

// ============================================================================
// TESTS
// ============================================================================
