// src/scoring.rs

use std::collections::BTreeMap;

use crate::models::attempt::ResponseDetail;

/// One category's aggregated score for an attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryScore {
    pub category_id: i64,
    /// Sum of the chosen option values.
    pub score: i64,
    /// How many of the category's questions were answered.
    pub answered: i64,
    /// 0..100, two decimals, normalized over the answered subset.
    pub percent: f64,
}

/// The complete scoring output for an attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringOutcome {
    pub per_category: Vec<CategoryScore>,
    pub total_score: i64,
    pub dominant_category_id: Option<i64>,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Scores a recorded response set.
///
/// Groups responses by category, sums the catalog option values, and
/// normalizes each category against `answered * max_option_value`. The
/// denominator uses the answered count, not the category's question count,
/// so partially completed attempts score over the subset they answered.
/// `max_option_value` is the maximum value across the currently active
/// answer options.
///
/// The dominant category is the one with the highest stored percent; an exact
/// tie resolves to the lowest category id. An empty response set is valid and
/// yields no per-category entries and no dominant.
pub fn score_responses(responses: &[ResponseDetail], max_option_value: i64) -> ScoringOutcome {
    // BTreeMap keeps categories in ascending id order, which is what makes
    // the tie-break deterministic.
    let mut groups: BTreeMap<i64, (i64, i64)> = BTreeMap::new();
    for response in responses {
        let entry = groups.entry(response.category_id).or_insert((0, 0));
        entry.0 += response.option_value;
        entry.1 += 1;
    }

    let mut per_category = Vec::with_capacity(groups.len());
    let mut total_score = 0;
    let mut dominant: Option<(i64, f64)> = None;

    for (category_id, (score, answered)) in groups {
        let ceiling = answered * max_option_value;
        let percent = if ceiling > 0 {
            round2(score as f64 / ceiling as f64 * 100.0)
        } else {
            0.0
        };

        total_score += score;
        match dominant {
            Some((_, best)) if percent <= best => {}
            _ => dominant = Some((category_id, percent)),
        }

        per_category.push(CategoryScore {
            category_id,
            score,
            answered,
            percent,
        });
    }

    ScoringOutcome {
        per_category,
        total_score,
        dominant_category_id: dominant.map(|(id, _)| id),
    }
}
