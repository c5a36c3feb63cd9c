// 🎓 College Entity - Immutable catalog record
//
// A college is loaded once from the seed and never mutated afterwards.
// Optional seed fields are normalized here, at load time, so that nothing
// downstream has to guard against missing rankings, fees or enrichment data.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Display value for anything the seed did not provide
pub const NOT_AVAILABLE: &str = "N/A";

// ============================================================================
// RANK
// ============================================================================

/// A ranking position. Lower is better.
///
/// Missing, null and zero ranks in the seed all become `Unranked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rank {
    Ranked(u32),
    #[default]
    Unranked,
}

impl Rank {
    pub fn new(position: u32) -> Self {
        if position == 0 {
            Rank::Unranked
        } else {
            Rank::Ranked(position)
        }
    }

    pub fn value(&self) -> Option<u32> {
        match self {
            Rank::Ranked(n) => Some(*n),
            Rank::Unranked => None,
        }
    }

    pub fn is_ranked(&self) -> bool {
        matches!(self, Rank::Ranked(_))
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rank::Ranked(n) => write!(f, "#{}", n),
            Rank::Unranked => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl Serialize for Rank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Rank {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<u32> = Option::deserialize(deserializer)?;
        Ok(raw.map(Rank::new).unwrap_or(Rank::Unranked))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rankings {
    #[serde(default)]
    pub nirf: Rank,
    #[serde(default)]
    pub qs: Rank,
}

// ============================================================================
// FEES / ENRICHMENT
// ============================================================================

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

/// Fees are display strings ("₹2.5 LPA", "₹25,000"), not normalized currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fees {
    #[serde(default = "not_available")]
    pub tuition: String,
    #[serde(default = "not_available")]
    pub hostel: String,
}

impl Default for Fees {
    fn default() -> Self {
        Fees {
            tuition: not_available(),
            hostel: not_available(),
        }
    }
}

/// Admission cutoff for one branch. The rank is free text ("1-150", "95-98%").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchCutoff {
    pub branch: String,
    pub rank: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementStats {
    pub total_students: u32,
    pub placed_students: u32,
    pub placement_percentage: f32,
}

impl PlacementStats {
    /// placed / total × 100, or None for an empty batch
    pub fn computed_percentage(&self) -> Option<f32> {
        if self.total_students == 0 {
            return None;
        }
        Some(self.placed_students as f32 / self.total_students as f32 * 100.0)
    }
}

// ============================================================================
// COLLEGE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct College {
    /// Stable identity, unique across the catalog
    pub id: String,

    pub name: String,
    pub location: String,

    /// Category label ("Engineering", "Research Institute", ...)
    #[serde(rename = "type")]
    pub college_type: String,

    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub established_year: Option<u16>,

    // ========================================================================
    // METRICS
    // ========================================================================
    /// 0–5, one decimal
    pub rating: f32,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub students_count: u32,
    #[serde(default)]
    pub courses_count: u32,
    /// 0–100
    #[serde(default)]
    pub placement_rate: f32,
    #[serde(default = "not_available")]
    pub avg_package: String,

    #[serde(default)]
    pub rankings: Rankings,
    #[serde(default)]
    pub fees: Fees,
    #[serde(default)]
    pub top_recruiters: Vec<String>,

    // ========================================================================
    // ENRICHMENT (optional in the seed)
    // ========================================================================
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default = "not_available")]
    pub campus_size: String,
    #[serde(default)]
    pub accreditation: Vec<String>,
    #[serde(default)]
    pub branch_cutoffs: Vec<BranchCutoff>,
    #[serde(default)]
    pub placement_stats: Option<PlacementStats>,
    #[serde(default)]
    pub best_feature: String,
}

impl College {
    /// Free-text predicate: `query` (already lowercased) is a substring of
    /// the name, location, type or description.
    pub fn matches_text(&self, lowercase_query: &str) -> bool {
        [
            &self.name,
            &self.location,
            &self.college_type,
            &self.description,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(lowercase_query))
    }

    /// First `n` recruiters, in seed order
    pub fn recruiter_preview(&self, n: usize) -> &[String] {
        let end = n.min(self.top_recruiters.len());
        &self.top_recruiters[..end]
    }

    pub fn established_label(&self) -> String {
        self.established_year
            .map(|y| y.to_string())
            .unwrap_or_else(not_available)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal record for tests; callers override what they care about
    pub(crate) fn sample(id: &str, name: &str) -> College {
        College {
            id: id.to_string(),
            name: name.to_string(),
            location: "Somewhere".to_string(),
            college_type: "Engineering".to_string(),
            description: String::new(),
            image: String::new(),
            established_year: None,
            rating: 4.0,
            review_count: 0,
            students_count: 1000,
            courses_count: 10,
            placement_rate: 80.0,
            avg_package: not_available(),
            rankings: Rankings::default(),
            fees: Fees::default(),
            top_recruiters: Vec::new(),
            highlights: Vec::new(),
            campus_size: not_available(),
            accreditation: Vec::new(),
            branch_cutoffs: Vec::new(),
            placement_stats: None,
            best_feature: String::new(),
        }
    }

    #[test]
    fn test_rank_zero_is_unranked() {
        assert_eq!(Rank::new(0), Rank::Unranked);
        assert_eq!(Rank::new(7), Rank::Ranked(7));
        assert!(!Rank::new(0).is_ranked());
    }

    #[test]
    fn test_rank_display() {
        assert_eq!(Rank::Ranked(2).to_string(), "#2");
        assert_eq!(Rank::Unranked.to_string(), "N/A");
    }

    #[test]
    fn test_missing_fields_are_normalized() {
        let json = r#"{
            "id": "x",
            "name": "Minimal College",
            "location": "Pune, Maharashtra",
            "type": "Arts",
            "rating": 3.9,
            "rankings": { "nirf": null }
        }"#;

        let college: College = serde_json::from_str(json).unwrap();

        assert_eq!(college.rankings.nirf, Rank::Unranked);
        assert_eq!(college.rankings.qs, Rank::Unranked);
        assert_eq!(college.fees.tuition, "N/A");
        assert_eq!(college.fees.hostel, "N/A");
        assert_eq!(college.campus_size, "N/A");
        assert_eq!(college.avg_package, "N/A");
        assert!(college.highlights.is_empty());
        assert!(college.branch_cutoffs.is_empty());
        assert!(college.placement_stats.is_none());
        assert_eq!(college.established_label(), "N/A");
    }

    #[test]
    fn test_rank_serializes_as_number_or_null() {
        let rankings = Rankings {
            nirf: Rank::Ranked(3),
            qs: Rank::Unranked,
        };
        let value = serde_json::to_value(rankings).unwrap();
        assert_eq!(value, serde_json::json!({ "nirf": 3, "qs": null }));
    }

    #[test]
    fn test_matches_text_fields() {
        let mut college = sample("1", "Indian Institute of Technology, Delhi");
        college.location = "New Delhi, Delhi".to_string();
        college.description = "Premier engineering institute".to_string();

        assert!(college.matches_text("technology"));
        assert!(college.matches_text("new delhi"));
        assert!(college.matches_text("engineering"));
        assert!(college.matches_text("premier"));
        assert!(!college.matches_text("mumbai"));
    }

    #[test]
    fn test_computed_percentage() {
        let stats = PlacementStats {
            total_students: 1200,
            placed_students: 1140,
            placement_percentage: 95.0,
        };
        let computed = stats.computed_percentage().unwrap();
        assert!((computed - 95.0).abs() < 0.01);

        let empty = PlacementStats {
            total_students: 0,
            placed_students: 0,
            placement_percentage: 0.0,
        };
        assert_eq!(empty.computed_percentage(), None);
    }

    #[test]
    fn test_recruiter_preview_is_bounded() {
        let mut college = sample("1", "Test");
        college.top_recruiters = vec!["A".into(), "B".into()];
        assert_eq!(college.recruiter_preview(4).len(), 2);
        assert_eq!(college.recruiter_preview(1), &["A".to_string()]);
    }
}
