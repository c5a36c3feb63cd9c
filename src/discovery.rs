// 🧭 Smart Discovery - quiz wizard and recommendation seam
//
// Five questions collect budget, interests, location, expected exam
// percentile and priorities. The answers are validated and kept, but the
// only engine shipped, `FixedRecommendations`, ignores them and always
// returns the same three colleges. A scoring engine plugs in behind
// `RecommendationEngine` without touching the wizard.

use crate::catalog::Catalog;
use crate::entities::College;
use crate::error::DiscoveryError;
use crate::trust::TrustLevel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

// ============================================================================
// QUIZ DEFINITION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepKind {
    Single,
    Multiple,
    Range {
        min: u8,
        max: u8,
        default: u8,
        unit: &'static str,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizStep {
    pub id: &'static str,
    pub question: &'static str,
    pub kind: StepKind,
    pub options: &'static [&'static str],
}

pub static QUIZ: [QuizStep; 5] = [
    QuizStep {
        id: "budget",
        question: "What's your budget for college fees per year?",
        kind: StepKind::Single,
        options: &["Under ₹1 Lakh", "₹1-3 Lakhs", "₹3-5 Lakhs", "₹5+ Lakhs"],
    },
    QuizStep {
        id: "interests",
        question: "What are your primary interests?",
        kind: StepKind::Multiple,
        options: &[
            "Engineering",
            "Medicine",
            "Business",
            "Arts & Humanities",
            "Science",
            "Law",
        ],
    },
    QuizStep {
        id: "location",
        question: "Preferred location?",
        kind: StepKind::Single,
        options: &[
            "Same State",
            "Metro Cities",
            "Tier-2 Cities",
            "Anywhere in India",
        ],
    },
    QuizStep {
        id: "examRank",
        question: "What's your expected exam rank/percentile?",
        kind: StepKind::Range {
            min: 1,
            max: 100,
            default: 50,
            unit: "percentile",
        },
        options: &[],
    },
    QuizStep {
        id: "priorities",
        question: "What matters most to you?",
        kind: StepKind::Multiple,
        options: &[
            "High Placements",
            "Research Opportunities",
            "Campus Life",
            "Faculty Quality",
            "Infrastructure",
        ],
    },
];

pub fn find_step(id: &str) -> Option<&'static QuizStep> {
    QUIZ.iter().find(|s| s.id == id)
}

// ============================================================================
// ANSWERS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Range(u8),
    Single(String),
    Multiple(Vec<String>),
}

/// Answers keyed by step id
pub type Answers = BTreeMap<String, Answer>;

/// Check that `answer` has the right shape and values for `step`
pub fn validate_answer(step: &QuizStep, answer: &Answer) -> Result<(), DiscoveryError> {
    let invalid = |reason: String| DiscoveryError::InvalidAnswer {
        step: step.id.to_string(),
        reason,
    };

    match (&step.kind, answer) {
        (StepKind::Single, Answer::Single(choice)) => {
            if step.options.contains(&choice.as_str()) {
                Ok(())
            } else {
                Err(invalid(format!("unknown option {:?}", choice)))
            }
        }
        (StepKind::Multiple, Answer::Multiple(choices)) => {
            match choices.iter().find(|c| !step.options.contains(&c.as_str())) {
                Some(unknown) => Err(invalid(format!("unknown option {:?}", unknown))),
                None => Ok(()),
            }
        }
        (StepKind::Range { min, max, .. }, Answer::Range(value)) => {
            if (*min..=*max).contains(value) {
                Ok(())
            } else {
                Err(invalid(format!("{} outside {}-{}", value, min, max)))
            }
        }
        _ => Err(invalid("wrong answer kind".to_string())),
    }
}

/// Validate a full answer set (unknown step ids are rejected)
pub fn validate_answers(answers: &Answers) -> Result<(), DiscoveryError> {
    for (id, answer) in answers {
        let step = find_step(id).ok_or_else(|| DiscoveryError::UnknownStep(id.clone()))?;
        validate_answer(step, answer)?;
    }
    Ok(())
}

// ============================================================================
// WIZARD
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    InProgress { step: usize },
    Analyzing,
    Results,
}

#[derive(Debug, Clone)]
pub struct DiscoveryWizard {
    phase: Phase,
    answers: Answers,
}

impl Default for DiscoveryWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscoveryWizard {
    pub fn new() -> Self {
        Self {
            phase: Phase::InProgress { step: 0 },
            answers: Answers::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    /// (1-based step, total steps)
    pub fn progress(&self) -> (usize, usize) {
        match self.phase {
            Phase::InProgress { step } => (step + 1, QUIZ.len()),
            _ => (QUIZ.len(), QUIZ.len()),
        }
    }

    pub fn current_step(&self) -> Option<&'static QuizStep> {
        match self.phase {
            Phase::InProgress { step } => QUIZ.get(step),
            _ => None,
        }
    }

    pub fn answer_for(&self, step_id: &str) -> Option<&Answer> {
        self.answers.get(step_id)
    }

    /// Record an answer for any step
    pub fn answer(&mut self, step_id: &str, answer: Answer) -> Result<(), DiscoveryError> {
        if !matches!(self.phase, Phase::InProgress { .. }) {
            return Err(DiscoveryError::NotInProgress);
        }
        let step = find_step(step_id).ok_or_else(|| DiscoveryError::UnknownStep(step_id.to_string()))?;
        validate_answer(step, &answer)?;
        self.answers.insert(step.id.to_string(), answer);
        Ok(())
    }

    /// Flip one option of the current multiple-choice step
    pub fn toggle_option(&mut self, option: &str) -> Result<(), DiscoveryError> {
        let step = self.current_step().ok_or(DiscoveryError::NotInProgress)?;
        if step.kind != StepKind::Multiple {
            return Err(DiscoveryError::InvalidAnswer {
                step: step.id.to_string(),
                reason: "not a multiple-choice step".to_string(),
            });
        }

        let mut chosen = match self.answers.get(step.id) {
            Some(Answer::Multiple(current)) => current.clone(),
            _ => Vec::new(),
        };
        match chosen.iter().position(|c| c == option) {
            Some(i) => {
                chosen.remove(i);
            }
            None => chosen.push(option.to_string()),
        }

        self.answer(step.id, Answer::Multiple(chosen))
    }

    /// Single needs a choice, multiple needs at least one; range always
    /// proceeds (its default is recorded on `next`)
    pub fn can_proceed(&self) -> bool {
        let step = match self.current_step() {
            Some(step) => step,
            None => return false,
        };

        match (step.kind, self.answers.get(step.id)) {
            (StepKind::Range { .. }, _) => true,
            (StepKind::Single, Some(Answer::Single(_))) => true,
            (StepKind::Multiple, Some(Answer::Multiple(chosen))) => !chosen.is_empty(),
            _ => false,
        }
    }

    /// Advance; finishing the last step moves to `Analyzing`
    pub fn next(&mut self) -> Result<Phase, DiscoveryError> {
        let step_index = match self.phase {
            Phase::InProgress { step } => step,
            _ => return Err(DiscoveryError::NotInProgress),
        };
        let step = &QUIZ[step_index];

        if !self.can_proceed() {
            return Err(DiscoveryError::Unanswered(step.id.to_string()));
        }
        if let StepKind::Range { default, .. } = step.kind {
            self.answers
                .entry(step.id.to_string())
                .or_insert(Answer::Range(default));
        }

        self.phase = if step_index + 1 < QUIZ.len() {
            Phase::InProgress {
                step: step_index + 1,
            }
        } else {
            Phase::Analyzing
        };
        Ok(self.phase)
    }

    pub fn previous(&mut self) {
        if let Phase::InProgress { step } = self.phase {
            self.phase = Phase::InProgress {
                step: step.saturating_sub(1),
            };
        }
    }

    /// Run `engine` over the collected answers and show results
    pub fn finish(
        &mut self,
        engine: &dyn RecommendationEngine,
        catalog: &Catalog,
    ) -> Result<Vec<Recommendation>, DiscoveryError> {
        if self.phase != Phase::Analyzing {
            return Err(DiscoveryError::NotInProgress);
        }
        let recommendations = engine.recommend(&self.answers, catalog);
        self.phase = Phase::Results;
        Ok(recommendations)
    }
}

// ============================================================================
// RECOMMENDATIONS
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub college_id: String,
    pub name: String,
    pub location: String,
    pub match_score: u8,
    pub reasons: Vec<String>,
    pub rating: f32,
    pub avg_package: String,
    pub fees: String,
    pub trust_score: u8,
}

impl Recommendation {
    pub fn trust_level(&self) -> TrustLevel {
        TrustLevel::for_recommendation(self.trust_score)
    }

    /// Catalog record behind this recommendation
    pub fn resolve<'a>(&self, catalog: &'a Catalog) -> Option<&'a College> {
        catalog.find_by_id(&self.college_id)
    }
}

pub trait RecommendationEngine: Send + Sync {
    fn recommend(&self, answers: &Answers, catalog: &Catalog) -> Vec<Recommendation>;

    fn name(&self) -> &'static str;
}

/// Always recommends the same three colleges
pub struct FixedRecommendations;

struct FixedPick {
    college_id: &'static str,
    match_score: u8,
    trust_score: u8,
    reasons: [&'static str; 3],
}

const FIXED_PICKS: [FixedPick; 3] = [
    FixedPick {
        college_id: "1",
        match_score: 95,
        trust_score: 98,
        reasons: [
            "Excellent placement record",
            "Strong in your field of interest",
            "Within budget range",
        ],
    },
    FixedPick {
        college_id: "4",
        match_score: 88,
        trust_score: 94,
        reasons: [
            "Great campus culture",
            "Industry connections",
            "Flexible curriculum",
        ],
    },
    FixedPick {
        college_id: "5",
        match_score: 82,
        trust_score: 89,
        reasons: ["Affordable fees", "Diverse courses", "Great location"],
    },
];

impl RecommendationEngine for FixedRecommendations {
    fn recommend(&self, answers: &Answers, catalog: &Catalog) -> Vec<Recommendation> {
        debug!(
            answered = answers.len(),
            "Fixed recommendations ignore quiz answers"
        );

        FIXED_PICKS
            .iter()
            .filter_map(|pick| {
                let college = catalog.find_by_id(pick.college_id);
                if college.is_none() {
                    warn!(college = pick.college_id, "Recommended college missing from catalog");
                }
                college.map(|c| Recommendation {
                    college_id: c.id.clone(),
                    name: c.name.clone(),
                    location: c.location.clone(),
                    match_score: pick.match_score,
                    reasons: pick.reasons.iter().map(|r| r.to_string()).collect(),
                    rating: c.rating,
                    avg_package: c.avg_package.clone(),
                    fees: c.fees.tuition.clone(),
                    trust_score: pick.trust_score,
                })
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

// ============================================================================
// TESTS
// ============================================================================
