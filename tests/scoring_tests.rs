/// End-to-end tests for the scoring pipeline: raw Likert responses
/// through dimension scores, insights and lead qualification.
use chrono::{Duration, Utc};
use safe8_api::insights::generate_insights;
use safe8_api::lead_scoring::{calculate_lead_score, LeadProfile, Priority};
use safe8_api::models::{AssessmentQuestion, DimensionScores};
use safe8_api::scoring::{adoption_phase, calculate_dimension_scores, calculate_overall_score};
use std::collections::BTreeMap;

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

#[cfg(test)]
mod pipeline_tests {
    use super::*;

    #[test]
    fn full_pipeline_from_responses_to_insights() {
        let questions = vec![
            question(1, "Strategic Alignment", 1.5),
            question(2, "Strategic Alignment", 1.0),
            question(3, "Data & Analytics", 1.5),
            question(4, "Data & Analytics", 1.0),
        ];
        // Strategic: (4*1.5 + 4*1.0) / 2.5 * 25 = 100
        // Data: (1*1.5 + 2*1.0) / 2.5 * 25 = 35
        let resp = responses(&[(1, 4), (2, 4), (3, 1), (4, 2)]);

        let dims = calculate_dimension_scores(&resp, &questions);
        assert_eq!(dims.get("Strategic Alignment"), Some(&100));
        assert_eq!(dims.get("Data & Analytics"), Some(&35));

        let overall = calculate_overall_score(&dims);
        assert_eq!(overall, 68); // round((100 + 35) / 2)

        let insights = generate_insights(&dims, "Technology", &[]);
        // Per-dimension lines, overall line, focus line, action plan
        assert!(insights.iter().any(|i| i.contains("Strategic Alignment")));
        assert!(insights
            .iter()
            .any(|i| i.contains("🎯") && i.contains("Data & Analytics")));
        assert!(insights
            .iter()
            .any(|i| i.contains("🔧 Immediate Action Plan for Data & Analytics")));
    }

    #[test]
    fn unanswered_questions_do_not_drag_scores_down() {
        let questions = vec![
            question(1, "Ethics & Trust", 1.0),
            question(2, "Ethics & Trust", 1.0),
        ];
        // Only question 1 answered: score uses its weight alone
        let resp = responses(&[(1, 4)]);
        let dims = calculate_dimension_scores(&resp, &questions);
        assert_eq!(dims.get("Ethics & Trust"), Some(&100));
    }

    #[test]
    fn dimension_without_responses_is_omitted() {
        let questions = vec![
            question(1, "Ethics & Trust", 1.0),
            question(2, "Workforce & Culture", 1.0),
        ];
        let resp = responses(&[(1, 3)]);
        let dims = calculate_dimension_scores(&resp, &questions);
        assert!(!dims.contains_key("Workforce & Culture"));
    }

    #[test]
    fn adoption_phases_cover_all_bands() {
        assert_eq!(adoption_phase(85), "AI Leader");
        assert_eq!(adoption_phase(70), "AI Adopter");
        assert_eq!(adoption_phase(55), "AI Explorer");
        assert_eq!(adoption_phase(40), "AI Beginner");
        assert_eq!(adoption_phase(20), "AI Starter");
    }
}

#[cfg(test)]
mod lead_scoring_tests {
    use super::*;

    fn dims(score: i32) -> DimensionScores {
        [
            ("Strategic Alignment".to_string(), score),
            ("Data & Analytics".to_string(), score),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn executive_at_large_company_with_gaps_is_hot() {
        let profile = LeadProfile {
            job_title: Some("Chief Technology Officer".to_string()),
            industry: "Financial Services".to_string(),
            company_size: Some("201-1000".to_string()),
            overall_score: 35,
            dimension_scores: dims(35),
            assessment_type: "ADVANCED".to_string(),
            completed_at: Utc::now(),
        };

        let score = calculate_lead_score(&profile, Utc::now());
        assert_eq!(score.priority, Priority::Hot);
        assert!(score.total_score >= 75);
        assert!(!score.reasoning.is_empty());
        assert!(!score.recommended_actions.is_empty());
    }

    #[test]
    fn strong_readiness_small_company_is_cold() {
        let profile = LeadProfile {
            job_title: Some("Analyst".to_string()),
            industry: "Agriculture".to_string(),
            company_size: Some("1-10".to_string()),
            overall_score: 90,
            dimension_scores: dims(90),
            assessment_type: "CORE".to_string(),
            completed_at: Utc::now() - Duration::days(120),
        };

        let score = calculate_lead_score(&profile, Utc::now());
        assert_eq!(score.priority, Priority::Cold);
        assert!(score.total_score < 55);
    }

    #[test]
    fn recent_assessments_score_higher_timing_than_stale_ones() {
        let base = LeadProfile {
            job_title: Some("Director of Data".to_string()),
            industry: "Technology".to_string(),
            company_size: Some("51-200".to_string()),
            overall_score: 60,
            dimension_scores: dims(60),
            assessment_type: "CORE".to_string(),
            completed_at: Utc::now(),
        };
        let stale = LeadProfile {
            completed_at: Utc::now() - Duration::days(90),
            ..base.clone()
        };

        let now = Utc::now();
        let fresh_score = calculate_lead_score(&base, now);
        let stale_score = calculate_lead_score(&stale, now);
        assert!(fresh_score.timing > stale_score.timing);
        assert!(fresh_score.total_score >= stale_score.total_score);
    }
}
