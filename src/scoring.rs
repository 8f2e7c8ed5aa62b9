//! Pure score aggregation for submitted questionnaires.
//!
//! Likert responses (0..=4) are combined per dimension using the catalog
//! weights, then rescaled to percentages. Scores returned to clients are
//! always the output of these functions, never the values a client sent.

use crate::models::{AssessmentQuestion, DimensionScores};
use std::collections::BTreeMap;

/// Aggregates raw responses into per-dimension percentage scores.
///
/// Each answered question contributes `response * weight` to its
/// dimension; the dimension score is the weighted mean rescaled from the
/// 0..=4 Likert range to 0..=100. Questions without a response are
/// skipped, and a dimension with no answered questions is absent from
/// the result.
pub fn calculate_dimension_scores(
    responses: &BTreeMap<String, i32>,
    questions: &[AssessmentQuestion],
) -> DimensionScores {
    struct Totals {
        sum: f64,
        weight: f64,
    }

    let mut totals: BTreeMap<&str, Totals> = BTreeMap::new();

    for question in questions {
        let question_id = question.id.to_string();
        if let Some(&response) = responses.get(&question_id) {
            let entry = totals.entry(question.dimension.as_str()).or_insert(Totals {
                sum: 0.0,
                weight: 0.0,
            });
            entry.sum += f64::from(response) * question.weight;
            entry.weight += question.weight;
        }
    }

    totals
        .into_iter()
        .filter(|(_, t)| t.weight > 0.0)
        // 0..=4 Likert scale maps to 0..=100
        .map(|(dimension, t)| (dimension.to_string(), ((t.sum / t.weight) * 25.0).round() as i32))
        .collect()
}

/// Overall score is the unweighted mean of the dimension scores.
pub fn calculate_overall_score(dimension_scores: &DimensionScores) -> i32 {
    if dimension_scores.is_empty() {
        return 0;
    }
    let sum: i32 = dimension_scores.values().sum();
    (f64::from(sum) / dimension_scores.len() as f64).round() as i32
}

/// Maturity label used in insight prompts and admin summaries.
pub fn adoption_phase(overall_score: i32) -> &'static str {
    if overall_score >= 80 {
        "AI Leader"
    } else if overall_score >= 65 {
        "AI Adopter"
    } else if overall_score >= 50 {
        "AI Explorer"
    } else if overall_score >= 35 {
        "AI Beginner"
    } else {
        "AI Starter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: i64, dimension: &str, weight: f64) -> AssessmentQuestion {
        AssessmentQuestion {
            id,
            question_type: "CORE".to_string(),
            dimension: dimension.to_string(),
            question_text: format!("Question {}", id),
            weight,
            sort_order: id as i32,
            active: true,
        }
    }

    fn responses(pairs: &[(i64, i32)]) -> BTreeMap<String, i32> {
        pairs.iter().map(|(id, v)| (id.to_string(), *v)).collect()
    }

    #[test]
    fn equal_weights_average_the_responses() {
        let questions = vec![
            question(1, "Data & Analytics", 1.0),
            question(2, "Data & Analytics", 1.0),
        ];
        let scores = calculate_dimension_scores(&responses(&[(1, 4), (2, 2)]), &questions);
        // (4 + 2) / 2 = 3 on the Likert scale -> 75%
        assert_eq!(scores["Data & Analytics"], 75);
    }

    #[test]
    fn weights_skew_the_dimension_score() {
        let questions = vec![
            question(1, "Strategic Alignment", 3.0),
            question(2, "Strategic Alignment", 1.0),
        ];
        let scores = calculate_dimension_scores(&responses(&[(1, 4), (2, 0)]), &questions);
        // (4*3 + 0*1) / 4 = 3 -> 75%
        assert_eq!(scores["Strategic Alignment"], 75);
    }

    #[test]
    fn unanswered_questions_are_skipped() {
        let questions = vec![
            question(1, "Ethics & Trust", 1.0),
            question(2, "Ethics & Trust", 1.0),
            question(3, "Workforce & Culture", 1.0),
        ];
        let scores = calculate_dimension_scores(&responses(&[(1, 2)]), &questions);
        assert_eq!(scores["Ethics & Trust"], 50);
        // No response for question 3 means no Workforce & Culture score
        assert!(!scores.contains_key("Workforce & Culture"));
    }

    #[test]
    fn extremes_hit_the_scale_bounds() {
        let questions = vec![question(1, "Execution & Operations", 2.5)];
        assert_eq!(
            calculate_dimension_scores(&responses(&[(1, 4)]), &questions)
                ["Execution & Operations"],
            100
        );
        assert_eq!(
            calculate_dimension_scores(&responses(&[(1, 0)]), &questions)
                ["Execution & Operations"],
            0
        );
    }

    #[test]
    fn overall_score_is_mean_of_dimensions() {
        let mut scores = DimensionScores::new();
        scores.insert("A".to_string(), 80);
        scores.insert("B".to_string(), 61);
        assert_eq!(calculate_overall_score(&scores), 71); // 70.5 rounds up
        assert_eq!(calculate_overall_score(&DimensionScores::new()), 0);
    }

    #[test]
    fn adoption_phases_cover_the_bands() {
        assert_eq!(adoption_phase(92), "AI Leader");
        assert_eq!(adoption_phase(80), "AI Leader");
        assert_eq!(adoption_phase(79), "AI Adopter");
        assert_eq!(adoption_phase(65), "AI Adopter");
        assert_eq!(adoption_phase(50), "AI Explorer");
        assert_eq!(adoption_phase(35), "AI Beginner");
        assert_eq!(adoption_phase(34), "AI Starter");
    }
}
