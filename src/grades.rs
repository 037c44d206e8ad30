use tracing::{debug, instrument};

use crate::models::GradeRow;

/// Marker the portal prints for courses without a score.
const NO_SCORE: &str = "--";

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GradeSummary {
    /// Credit-weighted average score; 0 when nothing counted.
    pub weighted_average: f64,
    pub total_credits: f64,
}

/// Credit-weighted average over all categories. Rows without a score, with
/// the `--` marker, or with an unparseable credit/score are skipped.
#[instrument(skip(categories), fields(categories = categories.len()))]
pub fn aggregate(categories: &[Vec<GradeRow>]) -> GradeSummary {
    let mut weighted_sum = 0.0;
    let mut total_credits = 0.0;

    for row in categories.iter().flatten() {
        match scored_credit(row) {
            Some((credit, score)) => {
                weighted_sum += credit * score;
                total_credits += credit;
            }
            None => debug!(course = %row.course_name, score = %row.score, "Row not counted"),
        }
    }

    let weighted_average = if total_credits != 0.0 {
        weighted_sum / total_credits
    } else {
        0.0
    };

    GradeSummary {
        weighted_average,
        total_credits,
    }
}

fn scored_credit(row: &GradeRow) -> Option<(f64, f64)> {
    let score = row.score.trim();
    if score.is_empty() || score == NO_SCORE {
        return None;
    }
    let score = score.split_whitespace().next()?.parse::<f64>().ok()?;
    let credit = row.credit.trim().parse::<f64>().ok()?;
    Some((credit, score))
}
