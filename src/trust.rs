// Trust scoring bands
//
// Review trust is shown as a 0-100 score with a High / Medium / Low band.
// The review meter and the discovery results use different cut-offs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrustLevel {
    High,
    Medium,
    Low,
}

impl TrustLevel {
    /// Bands used by the review trust meter
    pub fn for_meter(score: u8) -> Self {
        match score {
            90.. => TrustLevel::High,
            70..=89 => TrustLevel::Medium,
            _ => TrustLevel::Low,
        }
    }

    /// Bands used on discovery recommendations
    pub fn for_recommendation(score: u8) -> Self {
        match score {
            95.. => TrustLevel::High,
            85..=94 => TrustLevel::Medium,
            _ => TrustLevel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrustLevel::High => "High",
            TrustLevel::Medium => "Medium",
            TrustLevel::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustMeter {
    pub score: u8,
    pub verified_reviews: u32,
    pub total_reviews: u32,
    pub engagement_score: u8,
    pub flagged_count: u32,
}

impl TrustMeter {
    pub fn level(&self) -> TrustLevel {
        TrustLevel::for_meter(self.score)
    }

    /// Share of verified reviews, rounded percent; 0 with no reviews
    pub fn verification_rate(&self) -> u8 {
        if self.total_reviews == 0 {
            return 0;
        }
        let verified = self.verified_reviews.min(self.total_reviews) as f64;
        (verified / self.total_reviews as f64 * 100.0).round() as u8
    }

    pub fn has_flags(&self) -> bool {
        self.flagged_count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meter(score: u8, verified: u32, total: u32) -> TrustMeter {
        TrustMeter {
            score,
            verified_reviews: verified,
            total_reviews: total,
            engagement_score: 80,
            flagged_count: 0,
        }
    }

    #[test]
    fn test_meter_bands() {
        assert_eq!(meter(95, 0, 0).level(), TrustLevel::High);
        assert_eq!(meter(90, 0, 0).level(), TrustLevel::High);
        assert_eq!(meter(89, 0, 0).level(), TrustLevel::Medium);
        assert_eq!(meter(70, 0, 0).level(), TrustLevel::Medium);
        assert_eq!(meter(69, 0, 0).level(), TrustLevel::Low);
    }

    #[test]
    fn test_recommendation_bands() {
        assert_eq!(TrustLevel::for_recommendation(98), TrustLevel::High);
        assert_eq!(TrustLevel::for_recommendation(94), TrustLevel::Medium);
        assert_eq!(TrustLevel::for_recommendation(89), TrustLevel::Medium);
        assert_eq!(TrustLevel::for_recommendation(84), TrustLevel::Low);
    }

    #[test]
    fn test_verification_rate() {
        assert_eq!(meter(90, 289, 342).verification_rate(), 85);
        assert_eq!(meter(90, 10, 10).verification_rate(), 100);
    }

    #[test]
    fn test_verification_rate_without_reviews() {
        assert_eq!(meter(90, 0, 0).verification_rate(), 0);
    }
}
