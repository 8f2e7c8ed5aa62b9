//! Rule-based insight generation for completed assessments.
//!
//! Each dimension is compared against its industry benchmark row when one
//! exists, falling back to generic thresholds otherwise. The output is the
//! list of insight lines stored on the assessment snapshot.

use crate::models::{DimensionScores, IndustryBenchmark};

/// Generic thresholds used when no industry benchmark row exists.
const EXCELLENT_THRESHOLD: i32 = 85; // Top quartile
const GOOD_THRESHOLD: i32 = 70; // Above average
const AVERAGE_THRESHOLD: i32 = 55; // Below this = needs improvement

/// Hand-tuned next-step playbook per SAFE-8 dimension, surfaced for the
/// lowest-scoring dimension.
pub fn actionable_recommendation(dimension: &str) -> Option<&'static str> {
    match dimension {
        "Strategic Alignment" => Some(
            "Develop a formal AI strategy document, establish AI governance committee, and align AI initiatives with business objectives.",
        ),
        "Architecture & Infrastructure" => Some(
            "Assess current IT infrastructure capacity, implement cloud-based AI platforms, and establish data pipeline architecture.",
        ),
        "Foundation & Governance" => Some(
            "Create AI ethics guidelines, establish risk management frameworks, and implement AI project approval processes.",
        ),
        "Ethics & Trust" => Some(
            "Develop responsible AI principles, implement bias testing protocols, and establish transparency requirements.",
        ),
        "Data & Analytics" => Some(
            "Improve data quality processes, implement data governance frameworks, and establish analytics capabilities.",
        ),
        "Innovation & Agility" => Some(
            "Create innovation labs, establish experimentation processes, and build rapid prototyping capabilities.",
        ),
        "Workforce & Culture" => Some(
            "Implement AI literacy training, develop change management programs, and foster AI-positive culture.",
        ),
        "Execution & Operations" => Some(
            "Establish AI project management practices, implement monitoring systems, and develop maintenance protocols.",
        ),
        _ => None,
    }
}

/// Generates the full insight list for an assessment.
///
/// Produces one line per scored dimension (benchmark-relative when
/// possible), an overall-assessment line, a priority-focus line when any
/// dimension scores below 60, and an action-plan line for the lowest
/// dimension when it scores below 70.
pub fn generate_insights(
    dimension_scores: &DimensionScores,
    industry: &str,
    benchmarks: &[IndustryBenchmark],
) -> Vec<String> {
    let mut insights = Vec::new();

    let industry_benchmarks: Vec<&IndustryBenchmark> =
        benchmarks.iter().filter(|b| b.industry == industry).collect();

    for (dimension, &score) in dimension_scores {
        let benchmark = industry_benchmarks.iter().find(|b| &b.dimension == dimension);

        let (insight, recommendation) = match benchmark {
            Some(b) => {
                if f64::from(score) >= b.top_quartile_score {
                    (
                        format!(
                            "🟢 {}: Excellent performance (Top Quartile for {})",
                            dimension, industry
                        ),
                        "Maintain this strength and consider sharing best practices across your organization.",
                    )
                } else if f64::from(score) >= b.median_score {
                    (
                        format!(
                            "🟡 {}: Above average performance (vs {} industry)",
                            dimension, industry
                        ),
                        "Good foundation - focus on incremental improvements to reach top quartile.",
                    )
                } else if f64::from(score) >= b.average_score {
                    (
                        format!(
                            "🟠 {}: Below median performance (vs {} industry)",
                            dimension, industry
                        ),
                        "Significant improvement opportunity - prioritize initiatives in this area.",
                    )
                } else {
                    (
                        format!(
                            "🔴 {}: Critical gap (Bottom quartile for {})",
                            dimension, industry
                        ),
                        "Urgent attention required - this represents a major competitive risk.",
                    )
                }
            }
            None => {
                if score >= EXCELLENT_THRESHOLD {
                    (
                        format!("🟢 {}: Excellent performance ({}%)", dimension, score),
                        "Outstanding capability - leverage this strength for competitive advantage.",
                    )
                } else if score >= GOOD_THRESHOLD {
                    (
                        format!("🟡 {}: Good performance ({}%)", dimension, score),
                        "Solid foundation - focus on optimization and advanced capabilities.",
                    )
                } else if score >= AVERAGE_THRESHOLD {
                    (
                        format!("🟠 {}: Average performance ({}%)", dimension, score),
                        "Improvement needed - develop a focused action plan for this area.",
                    )
                } else {
                    (
                        format!("🔴 {}: Below average performance ({}%)", dimension, score),
                        "Critical priority - immediate investment and strategic focus required.",
                    )
                }
            }
        };

        insights.push(format!("{} - {}", insight, recommendation));
    }

    // Overall strategic insight based on the score pattern
    if !dimension_scores.is_empty() {
        let sum: i32 = dimension_scores.values().sum();
        let avg = f64::from(sum) / dimension_scores.len() as f64;
        let avg_rounded = avg.round() as i32;

        let overall = if avg >= 80.0 {
            format!(
                "🚀 Overall Assessment: Strong AI readiness position ({}%) - Focus on innovation and scaling successful practices.",
                avg_rounded
            )
        } else if avg >= 65.0 {
            format!(
                "📈 Overall Assessment: Moderate AI readiness ({}%) - Prioritize addressing weakest areas while building on strengths.",
                avg_rounded
            )
        } else if avg >= 50.0 {
            format!(
                "⚠️ Overall Assessment: Developing AI readiness ({}%) - Establish foundational capabilities before pursuing advanced initiatives.",
                avg_rounded
            )
        } else {
            format!(
                "🚨 Overall Assessment: Early-stage AI readiness ({}%) - Urgent need for comprehensive AI strategy and capability development.",
                avg_rounded
            )
        };
        insights.push(overall);
    }

    // Dimensions below 60 become the priority focus list
    let critical: Vec<&str> = dimension_scores
        .iter()
        .filter(|(_, &score)| score < 60)
        .map(|(dim, _)| dim.as_str())
        .collect();

    if !critical.is_empty() {
        insights.push(format!(
            "🎯 Priority Focus Areas: {} require immediate attention to build AI readiness foundation.",
            critical.join(", ")
        ));
    }

    // Concrete action plan for the weakest dimension
    if let Some((lowest_dim, &lowest_score)) =
        dimension_scores.iter().min_by_key(|(_, &score)| score)
    {
        if lowest_score < 70 {
            if let Some(next_steps) = actionable_recommendation(lowest_dim) {
                insights.push(format!(
                    "🔧 Immediate Action Plan for {}: {}",
                    lowest_dim, next_steps
                ));
            }
        }
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;

    fn benchmark(industry: &str, dimension: &str, avg: f64, median: f64, top: f64) -> IndustryBenchmark {
        IndustryBenchmark {
            id: 0,
            industry: industry.to_string(),
            dimension: dimension.to_string(),
            average_score: avg,
            median_score: median,
            top_quartile_score: top,
        }
    }

    fn scores(pairs: &[(&str, i32)]) -> DimensionScores {
        pairs.iter().map(|(d, s)| (d.to_string(), *s)).collect()
    }

    #[test]
    fn benchmark_tiers_select_the_right_insight() {
        let benchmarks = vec![benchmark("Technology", "Data & Analytics", 55.0, 65.0, 80.0)];

        let top = generate_insights(&scores(&[("Data & Analytics", 85)]), "Technology", &benchmarks);
        assert!(top[0].contains("🟢"));
        assert!(top[0].contains("Top Quartile for Technology"));

        let above = generate_insights(&scores(&[("Data & Analytics", 70)]), "Technology", &benchmarks);
        assert!(above[0].contains("🟡"));

        let below = generate_insights(&scores(&[("Data & Analytics", 60)]), "Technology", &benchmarks);
        assert!(below[0].contains("🟠"));

        let bottom = generate_insights(&scores(&[("Data & Analytics", 40)]), "Technology", &benchmarks);
        assert!(bottom[0].contains("🔴"));
        assert!(bottom[0].contains("Critical gap"));
    }

    #[test]
    fn generic_thresholds_apply_without_benchmarks() {
        let s = scores(&[("Ethics & Trust", 90)]);
        let insights = generate_insights(&s, "Agriculture", &[]);
        assert!(insights[0].contains("🟢 Ethics & Trust: Excellent performance (90%)"));
    }

    #[test]
    fn overall_line_reflects_average_band() {
        let s = scores(&[("A", 90), ("B", 80)]);
        let insights = generate_insights(&s, "Technology", &[]);
        assert!(insights.iter().any(|i| i.contains("🚀 Overall Assessment: Strong AI readiness position (85%)")));

        let s = scores(&[("A", 40), ("B", 40)]);
        let insights = generate_insights(&s, "Technology", &[]);
        assert!(insights.iter().any(|i| i.contains("🚨 Overall Assessment: Early-stage AI readiness (40%)")));
    }

    #[test]
    fn weak_dimensions_drive_focus_and_action_plan() {
        let s = scores(&[("Data & Analytics", 45), ("Workforce & Culture", 55), ("Strategic Alignment", 85)]);
        let insights = generate_insights(&s, "Healthcare", &[]);

        let focus = insights.iter().find(|i| i.contains("🎯 Priority Focus Areas")).unwrap();
        assert!(focus.contains("Data & Analytics"));
        assert!(focus.contains("Workforce & Culture"));
        assert!(!focus.contains("Strategic Alignment"));

        let plan = insights.iter().find(|i| i.contains("🔧 Immediate Action Plan")).unwrap();
        assert!(plan.contains("Data & Analytics"));
        assert!(plan.contains("data governance"));
    }

    #[test]
    fn strong_profiles_skip_focus_and_action_lines() {
        let s = scores(&[("Data & Analytics", 88), ("Strategic Alignment", 92)]);
        let insights = generate_insights(&s, "Technology", &[]);
        assert!(!insights.iter().any(|i| i.contains("🎯")));
        assert!(!insights.iter().any(|i| i.contains("🔧")));
    }
}
