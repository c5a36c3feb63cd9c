// ⚖️ College Comparison - bounded selection + best/worst highlighting
//
// Per numeric metric, the selected colleges holding the best value are marked
// Best and those holding the worst are marked Worst. Rankings invert the
// comparison: NIRF #2 beats NIRF #25. When every participating value is equal
// nobody is marked. Unranked colleges never participate in a ranking row.

use crate::catalog::Catalog;
use crate::entities::College;
use crate::error::CompareError;
use serde::Serialize;

/// Recruiters shown per college in the comparison table
pub const RECRUITER_PREVIEW: usize = 4;

// ============================================================================
// METRICS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    StudentsCount,
    CoursesCount,
    PlacementRate,
    NirfRank,
    QsRank,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::StudentsCount,
        Metric::CoursesCount,
        Metric::PlacementRate,
        Metric::NirfRank,
        Metric::QsRank,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Metric::StudentsCount => "Total Students",
            Metric::CoursesCount => "Courses Offered",
            Metric::PlacementRate => "Placement Rate",
            Metric::NirfRank => "NIRF Ranking",
            Metric::QsRank => "QS World Ranking",
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Metric::NirfRank | Metric::QsRank => Direction::LowerIsBetter,
            _ => Direction::HigherIsBetter,
        }
    }

    /// Raw value, or None when the college does not participate
    pub fn value(&self, college: &College) -> Option<f64> {
        match self {
            Metric::StudentsCount => Some(college.students_count as f64),
            Metric::CoursesCount => Some(college.courses_count as f64),
            Metric::PlacementRate => Some(college.placement_rate as f64),
            Metric::NirfRank => college.rankings.nirf.value().map(f64::from),
            Metric::QsRank => college.rankings.qs.value().map(f64::from),
        }
    }

    /// Value oriented so that larger is always better
    fn score(&self, college: &College) -> Option<f64> {
        self.value(college).map(|v| match self.direction() {
            Direction::HigherIsBetter => v,
            Direction::LowerIsBetter => -v,
        })
    }

    fn display(&self, college: &College) -> String {
        match self {
            Metric::StudentsCount => group_thousands(college.students_count),
            Metric::CoursesCount => college.courses_count.to_string(),
            Metric::PlacementRate => format!("{}%", college.placement_rate),
            Metric::NirfRank => college.rankings.nirf.to_string(),
            Metric::QsRank => college.rankings.qs.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Highlight {
    Best,
    Worst,
    Neutral,
}

/// Highlight per college for `metric`, parallel to `colleges`
pub fn highlight(colleges: &[College], metric: Metric) -> Vec<Highlight> {
    let scores: Vec<Option<f64>> = colleges.iter().map(|c| metric.score(c)).collect();
    let present: Vec<f64> = scores.iter().flatten().copied().collect();

    if present.len() < 2 {
        return vec![Highlight::Neutral; colleges.len()];
    }

    let best = present.iter().copied().fold(f64::MIN, f64::max);
    let worst = present.iter().copied().fold(f64::MAX, f64::min);

    if best == worst {
        return vec![Highlight::Neutral; colleges.len()];
    }

    scores
        .into_iter()
        .map(|score| match score {
            Some(s) if s == best => Highlight::Best,
            Some(s) if s == worst => Highlight::Worst,
            _ => Highlight::Neutral,
        })
        .collect()
}

// ============================================================================
// SELECTION
// ============================================================================

#[derive(Debug, Clone)]
pub struct ComparisonSet {
    max: usize,
    selected: Vec<College>,
}

impl ComparisonSet {
    pub fn new(max: usize) -> Self {
        Self {
            max: max.max(1),
            selected: Vec::new(),
        }
    }

    /// Preselect the first two catalog entries
    pub fn with_defaults(catalog: &Catalog, max: usize) -> Self {
        let mut set = Self::new(max);
        for college in catalog.colleges().iter().take(2.min(set.max)) {
            set.selected.push(college.clone());
        }
        set
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn selected(&self) -> &[College] {
        &self.selected
    }

    pub fn is_full(&self) -> bool {
        self.selected.len() >= self.max
    }

    pub fn contains(&self, id: &str) -> bool {
        self.selected.iter().any(|c| c.id == id)
    }

    pub fn add(&mut self, college: &College) -> Result<(), CompareError> {
        if self.contains(&college.id) {
            return Err(CompareError::AlreadySelected(college.id.clone()));
        }
        if self.is_full() {
            return Err(CompareError::SelectionFull(self.max));
        }

        self.selected.push(college.clone());
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<College, CompareError> {
        let index = self
            .selected
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| CompareError::NotSelected(id.to_string()))?;
        Ok(self.selected.remove(index))
    }

    /// Catalog entries not yet selected, catalog order
    pub fn candidates<'a>(&self, catalog: &'a Catalog) -> Vec<&'a College> {
        catalog
            .colleges()
            .iter()
            .filter(|c| !self.contains(&c.id))
            .collect()
    }

    pub fn highlight(&self, metric: Metric) -> Vec<(String, Highlight)> {
        self.selected
            .iter()
            .map(|c| c.id.clone())
            .zip(highlight(&self.selected, metric))
            .collect()
    }

    pub fn table(&self) -> ComparisonTable {
        ComparisonTable::build(&self.selected)
    }
}

// ============================================================================
// TABLE
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonCell {
    pub college_id: String,
    pub display: String,
    pub highlight: Highlight,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonRow {
    pub label: String,
    pub metric: Option<Metric>,
    pub cells: Vec<ComparisonCell>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonTable {
    pub colleges: Vec<String>,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    pub fn build(colleges: &[College]) -> Self {
        let plain = |label: &str, display: fn(&College) -> String| ComparisonRow {
            label: label.to_string(),
            metric: None,
            cells: colleges
                .iter()
                .map(|c| ComparisonCell {
                    college_id: c.id.clone(),
                    display: display(c),
                    highlight: Highlight::Neutral,
                })
                .collect(),
        };

        let metric_row = |metric: Metric| ComparisonRow {
            label: metric.label().to_string(),
            metric: Some(metric),
            cells: colleges
                .iter()
                .zip(highlight(colleges, metric))
                .map(|(c, h)| ComparisonCell {
                    college_id: c.id.clone(),
                    display: metric.display(c),
                    highlight: h,
                })
                .collect(),
        };

        let rows = vec![
            plain("Overall Rating", |c| format!("{:.1}", c.rating)),
            plain("Established", |c| c.established_label()),
            metric_row(Metric::StudentsCount),
            metric_row(Metric::CoursesCount),
            metric_row(Metric::PlacementRate),
            plain("Average Package", |c| c.avg_package.clone()),
            metric_row(Metric::NirfRank),
            metric_row(Metric::QsRank),
            plain("Tuition Fees (Annual)", |c| c.fees.tuition.clone()),
            plain("Hostel Fees (Annual)", |c| c.fees.hostel.clone()),
            plain("Top Recruiters", |c| {
                c.recruiter_preview(RECRUITER_PREVIEW).join(", ")
            }),
        ];

        ComparisonTable {
            colleges: colleges.iter().map(|c| c.id.clone()).collect(),
            rows,
        }
    }

    pub fn rows(&self) -> &[ComparisonRow] {
        &self.rows
    }

    pub fn row(&self, metric: Metric) -> Option<&ComparisonRow> {
        self.rows.iter().find(|r| r.metric == Some(metric))
    }
}

fn group_thousands(n: u32) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// ============================================================================
// TESTS
// ============================================================================
