//! BANT-style lead qualification over completed assessments.
//!
//! Five hand-tuned factor scores (urgency, budget, authority, need,
//! timing, each 0..=100) combine into a weighted total that maps to a
//! HOT/WARM/COLD priority tier, plus human-readable reasoning and the
//! sales follow-up playbook for that tier.

use crate::models::DimensionScores;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Factor weights: urgency and budget dominate, timing is a tiebreaker.
const URGENCY_WEIGHT: f64 = 0.25;
const BUDGET_WEIGHT: f64 = 0.25;
const AUTHORITY_WEIGHT: f64 = 0.2;
const NEED_WEIGHT: f64 = 0.2;
const TIMING_WEIGHT: f64 = 0.1;

/// Lead priority tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Hot,
    Warm,
    Cold,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Hot => "HOT",
            Priority::Warm => "WARM",
            Priority::Cold => "COLD",
        }
    }
}

/// The assessment-derived profile the scoring heuristic runs on.
#[derive(Debug, Clone)]
pub struct LeadProfile {
    pub job_title: Option<String>,
    pub industry: String,
    pub company_size: Option<String>,
    pub overall_score: i32,
    pub dimension_scores: DimensionScores,
    pub assessment_type: String,
    pub completed_at: DateTime<Utc>,
}

/// Full scoring result for one lead.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadScore {
    pub total_score: i32,
    pub urgency: i32,
    pub budget: i32,
    pub authority: i32,
    pub need: i32,
    pub timing: i32,
    pub priority: Priority,
    pub reasoning: Vec<String>,
    pub recommended_actions: Vec<String>,
    pub follow_up_timeline: String,
}

/// Scores one lead profile. `now` is injected so timing decay is testable.
pub fn calculate_lead_score(lead: &LeadProfile, now: DateTime<Utc>) -> LeadScore {
    let urgency = calculate_urgency(lead);
    let budget = calculate_budget(lead);
    let authority = calculate_authority(lead);
    let need = calculate_need(lead);
    let timing = calculate_timing(lead, now);

    let total = f64::from(urgency) * URGENCY_WEIGHT
        + f64::from(budget) * BUDGET_WEIGHT
        + f64::from(authority) * AUTHORITY_WEIGHT
        + f64::from(need) * NEED_WEIGHT
        + f64::from(timing) * TIMING_WEIGHT;
    let total_score = total.round() as i32;

    let priority = determine_priority(total_score);

    LeadScore {
        total_score,
        urgency,
        budget,
        authority,
        need,
        timing,
        priority,
        reasoning: generate_reasoning(lead, urgency, budget, authority, timing),
        recommended_actions: generate_recommended_actions(lead, priority),
        follow_up_timeline: follow_up_timeline(priority, urgency),
    }
}

/// Readiness gaps create urgency: the worse the assessment, the hotter
/// the lead. Regulated/fast-moving industries and the deeper catalog
/// tiers add on top.
fn calculate_urgency(lead: &LeadProfile) -> i32 {
    let mut score = if lead.overall_score < 40 {
        90 // Critical gaps
    } else if lead.overall_score < 60 {
        70
    } else if lead.overall_score < 75 {
        50
    } else {
        20 // Optimization opportunities only
    };

    let high_urgency_industries = ["Financial Services", "Technology", "Healthcare"];
    if high_urgency_industries.contains(&lead.industry.as_str()) {
        score += 10;
    }

    // Assessment type indicates seriousness
    score += match lead.assessment_type.as_str() {
        "FRONTIER" => 15,
        "ADVANCED" => 10,
        "CORE" => 5,
        _ => 0,
    };

    score.min(100)
}

/// Company size is the main budget proxy, nudged by industry spend
/// patterns and by low readiness (greenfield budgets).
fn calculate_budget(lead: &LeadProfile) -> i32 {
    let mut score = match lead.company_size.as_deref() {
        Some("1000+") => 90,
        Some("201-1000") => 75,
        Some("51-200") => 60,
        Some("11-50") => 40,
        Some("1-10") => 20,
        _ => 50, // Base score when size unknown
    };

    let high_budget_industries = ["Financial Services", "Technology", "Manufacturing"];
    let medium_budget_industries = ["Healthcare", "Professional Services"];

    if high_budget_industries.contains(&lead.industry.as_str()) {
        score += 15;
    } else if medium_budget_industries.contains(&lead.industry.as_str()) {
        score += 5;
    }

    if lead.overall_score < 50 {
        score += 10;
    }

    score.min(100)
}

/// Job-title keyword ladder approximating purchasing authority.
fn calculate_authority(lead: &LeadProfile) -> i32 {
    let title = match &lead.job_title {
        Some(t) => t.to_lowercase(),
        None => return 50, // Default if unknown
    };

    if title.contains("ceo")
        || title.contains("cto")
        || title.contains("cdo")
        || title.contains("chief")
    {
        return 95;
    }

    if title.contains("vp")
        || title.contains("vice president")
        || title.contains("director")
        || title.contains("head of")
    {
        return 80;
    }

    if title.contains("senior") || title.contains("lead") || title.contains("principal") {
        return 65;
    }

    if title.contains("manager") || title.contains("supervisor") {
        return 50;
    }

    30 // Individual contributors
}

/// Overall-score bands set the base need; multiple weak dimensions mean
/// a more complex (and bigger) engagement.
fn calculate_need(lead: &LeadProfile) -> i32 {
    let mut score = if lead.overall_score < 30 {
        95
    } else if lead.overall_score < 50 {
        80
    } else if lead.overall_score < 70 {
        60
    } else if lead.overall_score < 85 {
        40
    } else {
        20
    };

    let low_dimensions = lead
        .dimension_scores
        .values()
        .filter(|&&s| s < 50)
        .count() as i32;
    score += (low_dimensions * 5).min(20);

    score.min(100)
}

/// Recency of the assessment indicates an active evaluation phase.
fn calculate_timing(lead: &LeadProfile, now: DateTime<Utc>) -> i32 {
    let days_since_completion = (now - lead.completed_at).num_days();

    if days_since_completion <= 1 {
        90
    } else if days_since_completion <= 3 {
        75
    } else if days_since_completion <= 7 {
        60
    } else if days_since_completion <= 30 {
        40
    } else {
        20
    }
}

fn determine_priority(total_score: i32) -> Priority {
    if total_score >= 75 {
        Priority::Hot
    } else if total_score >= 55 {
        Priority::Warm
    } else {
        Priority::Cold
    }
}

fn generate_reasoning(
    lead: &LeadProfile,
    urgency: i32,
    budget: i32,
    authority: i32,
    timing: i32,
) -> Vec<String> {
    let mut reasoning = Vec::new();

    if urgency >= 80 {
        reasoning.push(format!(
            "Critical AI readiness gaps ({}%) create urgent need for improvement",
            lead.overall_score
        ));
    }

    if authority >= 80 {
        reasoning.push(format!(
            "Decision-maker role ({}) enables direct purchasing authority",
            lead.job_title.as_deref().unwrap_or("unknown")
        ));
    }

    if budget >= 75 {
        reasoning.push(format!(
            "Company size ({}) and industry ({}) indicate strong budget capacity",
            lead.company_size.as_deref().unwrap_or("unknown"),
            lead.industry
        ));
    }

    if timing >= 75 {
        reasoning.push("Recent assessment completion indicates active evaluation phase".to_string());
    }

    if lead.assessment_type == "FRONTIER" {
        reasoning.push("Advanced assessment type shows serious AI transformation interest".to_string());
    }

    let low_dimensions: Vec<&str> = lead
        .dimension_scores
        .iter()
        .filter(|(_, &s)| s < 40)
        .map(|(d, _)| d.as_str())
        .collect();

    if low_dimensions.len() >= 2 {
        reasoning.push(format!(
            "Multiple critical gaps in {} require comprehensive solution",
            low_dimensions[..2].join(" and ")
        ));
    }

    reasoning
}

fn generate_recommended_actions(lead: &LeadProfile, priority: Priority) -> Vec<String> {
    let mut actions = Vec::new();

    match priority {
        Priority::Hot => {
            actions.push("Schedule immediate consultation call within 24 hours".to_string());
            actions.push("Prepare custom proposal based on assessment gaps".to_string());
            actions.push("Assign senior consultant for direct engagement".to_string());

            if lead.overall_score < 40 {
                actions.push("Position comprehensive AI readiness audit".to_string());
            }
        }
        Priority::Warm => {
            actions.push("Schedule discovery call within 3-5 days".to_string());
            actions.push("Send targeted case studies for their industry".to_string());
            actions.push("Invite to upcoming AI readiness workshop".to_string());

            if let Some((lowest, _)) = lead.dimension_scores.iter().min_by_key(|(_, &s)| s) {
                actions.push(format!("Highlight expertise in {} improvement", lowest));
            }
        }
        Priority::Cold => {
            actions.push("Add to nurture campaign with monthly check-ins".to_string());
            actions.push("Send quarterly industry benchmark reports".to_string());
            actions.push("Invite to webinars and thought leadership content".to_string());
        }
    }

    actions
}

fn follow_up_timeline(priority: Priority, urgency: i32) -> String {
    match priority {
        Priority::Hot => {
            if urgency >= 90 {
                "Within 4 hours".to_string()
            } else {
                "Within 24 hours".to_string()
            }
        }
        Priority::Warm => {
            if urgency >= 70 {
                "Within 2-3 days".to_string()
            } else {
                "Within 1 week".to_string()
            }
        }
        Priority::Cold => "Monthly nurture sequence".to_string(),
    }
}

/// One-line qualification summary for admin lists.
pub fn qualification_summary(score: &LeadScore) -> String {
    match score.priority {
        Priority::Hot => format!(
            "🔥 Hot Lead ({}/100) - Immediate action required",
            score.total_score
        ),
        Priority::Warm => format!(
            "⚡ Warm Lead ({}/100) - Strong potential, schedule follow-up",
            score.total_score
        ),
        Priority::Cold => format!(
            "❄️ Cold Lead ({}/100) - Add to nurture campaign",
            score.total_score
        ),
    }
}

/// First recommended action, for at-a-glance triage.
pub fn next_action(score: &LeadScore) -> String {
    score
        .recommended_actions
        .first()
        .cloned()
        .unwrap_or_else(|| "Add to general follow-up list".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn profile(overall: i32, title: Option<&str>, size: Option<&str>, industry: &str) -> LeadProfile {
        LeadProfile {
            job_title: title.map(String::from),
            industry: industry.to_string(),
            company_size: size.map(String::from),
            overall_score: overall,
            dimension_scores: DimensionScores::new(),
            assessment_type: "CORE".to_string(),
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn weak_enterprise_executive_is_hot() {
        let mut lead = profile(35, Some("Chief Data Officer"), Some("1000+"), "Financial Services");
        lead.assessment_type = "FRONTIER".to_string();
        let score = calculate_lead_score(&lead, Utc::now());

        assert_eq!(score.priority, Priority::Hot);
        assert_eq!(score.urgency, 100); // 90 + 10 industry + 15 type, capped
        assert_eq!(score.authority, 95);
        assert!(score.reasoning.iter().any(|r| r.contains("urgent need")));
        assert!(score
            .recommended_actions
            .iter()
            .any(|a| a.contains("AI readiness audit")));
    }

    #[test]
    fn strong_small_company_contributor_is_cold() {
        let lead = profile(88, Some("Data Analyst"), Some("1-10"), "Retail");
        let now = Utc::now();
        let score = calculate_lead_score(
            &LeadProfile {
                completed_at: now - Duration::days(60),
                ..lead
            },
            now,
        );

        assert_eq!(score.priority, Priority::Cold);
        assert_eq!(score.authority, 30);
        assert_eq!(score.timing, 20);
        assert_eq!(score.follow_up_timeline, "Monthly nurture sequence");
    }

    #[test]
    fn authority_ladder_matches_titles() {
        let at = |t: Option<&str>| calculate_authority(&profile(50, t, None, "Retail"));
        assert_eq!(at(Some("CEO")), 95);
        assert_eq!(at(Some("Chief Technology Officer")), 95);
        assert_eq!(at(Some("VP of Engineering")), 80);
        assert_eq!(at(Some("Head of Data")), 80);
        assert_eq!(at(Some("Senior Engineer")), 65);
        assert_eq!(at(Some("Engineering Manager")), 50);
        assert_eq!(at(Some("Developer")), 30);
        assert_eq!(at(None), 50);
    }

    #[test]
    fn need_grows_with_low_dimension_count() {
        let mut lead = profile(55, None, None, "Retail");
        for d in ["A", "B", "C", "D", "E"] {
            lead.dimension_scores.insert(d.to_string(), 30);
        }
        // Base 60 for the 50..70 band, +20 capped dimension bonus
        assert_eq!(calculate_need(&lead), 80);
    }

    #[test]
    fn timing_decays_with_age() {
        let now = Utc::now();
        let lead = profile(50, None, None, "Retail");
        let at_age = |days: i64| {
            calculate_timing(
                &LeadProfile {
                    completed_at: now - Duration::days(days),
                    ..lead.clone()
                },
                now,
            )
        };
        assert_eq!(at_age(0), 90);
        assert_eq!(at_age(3), 75);
        assert_eq!(at_age(7), 60);
        assert_eq!(at_age(20), 40);
        assert_eq!(at_age(90), 20);
    }

    #[test]
    fn priority_cutoffs() {
        assert_eq!(determine_priority(75), Priority::Hot);
        assert_eq!(determine_priority(74), Priority::Warm);
        assert_eq!(determine_priority(55), Priority::Warm);
        assert_eq!(determine_priority(54), Priority::Cold);
    }

    #[test]
    fn summary_and_next_action_follow_priority() {
        let lead = profile(35, Some("CEO"), Some("1000+"), "Technology");
        let score = calculate_lead_score(&lead, Utc::now());
        assert!(qualification_summary(&score).contains("Hot Lead"));
        assert_eq!(
            next_action(&score),
            "Schedule immediate consultation call within 24 hours"
        );
    }
}
