//! LLM-personalized insight generation with a static fallback.
//!
//! When an OpenAI key is configured, the assessment context is turned
//! into an analysis prompt and the chat-completions response is parsed
//! back into structured insights with keyword heuristics. The call sits
//! behind a circuit breaker; any failure (or a missing key) falls back
//! to static insights derived from the weakest dimensions.

use crate::circuit_breaker::create_insight_circuit_breaker;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::{DimensionScores, IndustryBenchmark};
use crate::scoring::adoption_phase;
use regex::Regex;
use reqwest::Client;
use serde::Serialize;
use serde_json::json;

/// Everything the insight engine knows about one assessment.
#[derive(Debug, Clone)]
pub struct AssessmentContext {
    pub dimension_scores: DimensionScores,
    pub industry: String,
    pub company_size: Option<String>,
    pub job_title: Option<String>,
    pub overall_score: i32,
    pub benchmarks: Vec<IndustryBenchmark>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightType {
    Strength,
    Opportunity,
    Risk,
    Recommendation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestmentLevel {
    Low,
    Medium,
    High,
}

/// One structured, personalized insight.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizedInsight {
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub dimension: String,
    pub priority: InsightPriority,
    pub insight: String,
    pub action_items: Vec<String>,
    pub business_impact: String,
    pub timeline: String,
    pub investment_level: InvestmentLevel,
}

/// The eight SAFE-8 dimension labels, used for keyword extraction.
const DIMENSIONS: [&str; 8] = [
    "Strategic Alignment",
    "Architecture & Infrastructure",
    "Foundation & Governance",
    "Ethics & Trust",
    "Data & Analytics",
    "Innovation & Agility",
    "Workforce & Culture",
    "Execution & Operations",
];

pub struct AiInsightsEngine<C> {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    breaker: C,
}

/// Builds the engine from config. The breaker type is opaque, so this is
/// a free constructor rather than an associated `new`.
pub fn engine_from_config(
    config: &Config,
) -> AiInsightsEngine<impl failsafe::futures::CircuitBreaker> {
    AiInsightsEngine {
        client: Client::new(),
        api_key: config.openai_api_key.clone(),
        base_url: config.openai_base_url.clone(),
        breaker: create_insight_circuit_breaker(),
    }
}

impl<C: failsafe::futures::CircuitBreaker> AiInsightsEngine<C> {
    /// Generates up to five personalized insights for an assessment.
    ///
    /// Never fails: LLM errors degrade to the static fallback.
    pub async fn generate_personalized_insights(
        &self,
        context: &AssessmentContext,
    ) -> Vec<PersonalizedInsight> {
        let api_key = match &self.api_key {
            Some(key) => key.clone(),
            None => {
                tracing::debug!("No OpenAI key configured, using static insights");
                return generate_enhanced_static_insights(context);
            }
        };

        let prompt = prepare_analysis_context(context);

        match self
            .breaker
            .call(self.call_openai(&api_key, &prompt))
            .await
        {
            Ok(response) => parse_insights(&response, context),
            Err(failsafe::Error::Rejected) => {
                tracing::warn!("OpenAI circuit open, falling back to static insights");
                generate_enhanced_static_insights(context)
            }
            Err(failsafe::Error::Inner(e)) => {
                tracing::error!("Error generating AI insights: {}", e);
                generate_enhanced_static_insights(context)
            }
        }
    }

    async fn call_openai(&self, api_key: &str, prompt: &str) -> Result<String, AppError> {
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&json!({
                "model": "gpt-4",
                "messages": [
                    {
                        "role": "system",
                        "content": "You are an AI readiness consultant. Provide strategic, actionable insights for enterprise AI transformation. Be specific, avoid generic advice, and focus on business outcomes. Format responses as structured insights with clear priority levels."
                    },
                    {
                        "role": "user",
                        "content": prompt
                    }
                ],
                "max_tokens": 1500,
                "temperature": 0.7
            }))
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("OpenAI request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::ExternalApiError(format!(
                "OpenAI returned status {}",
                status
            )));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse OpenAI response: {}", e))
        })?;

        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .map(String::from)
            .ok_or_else(|| {
                AppError::ExternalApiError("OpenAI response missing message content".to_string())
            })
    }
}

/// Builds the analysis prompt from the assessment context.
pub fn prepare_analysis_context(context: &AssessmentContext) -> String {
    let bucket = |min: i32, max: i32| -> Vec<String> {
        context
            .dimension_scores
            .iter()
            .filter(|(_, &s)| s >= min && s < max)
            .map(|(d, s)| format!("{}: {}%", d, s))
            .collect()
    };

    let strengths = bucket(75, i32::MAX);
    let opportunities = bucket(50, 75);
    let critical_gaps = bucket(i32::MIN, 50);

    let benchmark_context = context
        .benchmarks
        .iter()
        .filter(|b| b.industry == context.industry)
        .map(|b| {
            format!(
                "{}: avg {}%, top quartile {}%",
                b.dimension,
                b.average_score.round() as i32,
                b.top_quartile_score.round() as i32
            )
        })
        .collect::<Vec<_>>()
        .join("; ");

    let join_or_none = |items: Vec<String>| {
        if items.is_empty() {
            "None".to_string()
        } else {
            items.join(", ")
        }
    };

    format!(
        "SAFE-8 AI Readiness Assessment Analysis Request:\n\n\
Company Profile:\n\
- Industry: {industry}\n\
- Company Size: {size}\n\
- Job Title: {title}\n\
- Overall AI Readiness: {overall}%\n\n\
Performance Breakdown:\n\
- Strengths (75%+): {strengths}\n\
- Opportunities (50-74%): {opportunities}\n\
- Critical Gaps (<50%): {gaps}\n\n\
Industry Benchmarks ({industry}):\n\
{benchmarks}\n\n\
Current AI Adoption Phase: {phase}\n\n\
Please provide 3-5 personalized insights with:\n\
1. Specific business impact for this industry/role\n\
2. Concrete action items (not generic advice)\n\
3. Realistic timelines and investment levels\n\
4. Strategic implications for competitive positioning\n\
5. Risk assessment if gaps aren't addressed\n\n\
Focus on actionable recommendations that a {role} in {industry} can implement.",
        industry = context.industry,
        size = context.company_size.as_deref().unwrap_or("Unknown"),
        title = context.job_title.as_deref().unwrap_or("Unknown"),
        overall = context.overall_score,
        strengths = join_or_none(strengths),
        opportunities = join_or_none(opportunities),
        gaps = join_or_none(critical_gaps),
        benchmarks = benchmark_context,
        phase = adoption_phase(context.overall_score),
        role = context.job_title.as_deref().unwrap_or("business leader"),
    )
}

/// Splits the raw LLM response into sections and structures each one.
pub fn parse_insights(ai_response: &str, context: &AssessmentContext) -> Vec<PersonalizedInsight> {
    let section_split = Regex::new(r"\n\s*\n").unwrap();

    section_split
        .split(ai_response)
        .filter(|section| section.trim().len() > 50)
        .map(|section| parse_insight_section(section, context))
        .take(5)
        .collect()
}

fn parse_insight_section(section: &str, context: &AssessmentContext) -> PersonalizedInsight {
    let dimension = extract_dimension(section);
    let score = context.dimension_scores.get(&dimension).copied();
    let first_line = section
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
        .to_string();

    PersonalizedInsight {
        insight_type: determine_insight_type(section),
        priority: determine_priority(section, score),
        insight: if first_line.is_empty() {
            section.chars().take(200).collect()
        } else {
            first_line
        },
        action_items: extract_action_items(section),
        business_impact: extract_business_impact(section),
        timeline: extract_timeline(section),
        investment_level: determine_investment_level(section),
        dimension,
    }
}

fn extract_dimension(text: &str) -> String {
    let lower = text.to_lowercase();

    for dim in DIMENSIONS {
        let first_word = dim.split(' ').next().unwrap_or(dim);
        if lower.contains(&dim.to_lowercase()) || lower.contains(&first_word.to_lowercase()) {
            return dim.to_string();
        }
    }

    "Strategic Alignment".to_string() // Default
}

fn extract_action_items(text: &str) -> Vec<String> {
    let action_keywords = [
        "implement",
        "develop",
        "establish",
        "create",
        "build",
        "deploy",
        "train",
    ];
    let sentence_split = Regex::new(r"[.!?]+").unwrap();

    sentence_split
        .split(text)
        .filter(|sentence| {
            let lower = sentence.to_lowercase();
            action_keywords.iter().any(|k| lower.contains(k))
        })
        .map(str::trim)
        .filter(|s| s.len() > 10)
        .take(3)
        .map(String::from)
        .collect()
}

fn extract_business_impact(text: &str) -> String {
    let impact_keywords = [
        "revenue",
        "cost",
        "efficiency",
        "competitive",
        "risk",
        "growth",
        "roi",
    ];
    let sentence_split = Regex::new(r"[.!?]+").unwrap();

    let result = sentence_split
        .split(text)
        .find(|sentence| {
            let lower = sentence.to_lowercase();
            impact_keywords.iter().any(|k| lower.contains(k))
        })
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "Improves overall AI readiness and competitive positioning".to_string());
    result
}

fn extract_timeline(text: &str) -> String {
    let patterns = [
        r"(?i)\d+[-\s]?\w+\s+(months?|weeks?|years?)",
        r"(?i)short[- ]?term|long[- ]?term|immediate",
        r"(?i)Q[1-4]|\d+\s*quarters?",
    ];

    for pattern in patterns {
        let re = Regex::new(pattern).unwrap();
        if let Some(m) = re.find(text) {
            return m.as_str().to_string();
        }
    }

    "3-6 months".to_string()
}

fn determine_insight_type(text: &str) -> InsightType {
    let lower = text.to_lowercase();

    if lower.contains("strength") || lower.contains("excellent") || lower.contains("leading") {
        InsightType::Strength
    } else if lower.contains("risk") || lower.contains("critical") || lower.contains("urgent") {
        InsightType::Risk
    } else if lower.contains("recommend") || lower.contains("should") || lower.contains("consider")
    {
        InsightType::Recommendation
    } else {
        InsightType::Opportunity
    }
}

fn determine_priority(text: &str, score: Option<i32>) -> InsightPriority {
    let lower = text.to_lowercase();

    if lower.contains("critical") || lower.contains("urgent") || score.is_some_and(|s| s < 40) {
        InsightPriority::High
    } else if lower.contains("important")
        || lower.contains("significant")
        || score.is_some_and(|s| s < 60)
    {
        InsightPriority::Medium
    } else {
        InsightPriority::Low
    }
}

fn determine_investment_level(text: &str) -> InvestmentLevel {
    let lower = text.to_lowercase();

    if lower.contains("significant investment") || lower.contains("major") || lower.contains("enterprise") {
        InvestmentLevel::High
    } else if lower.contains("moderate") || lower.contains("training") || lower.contains("process") {
        InvestmentLevel::Medium
    } else {
        InvestmentLevel::Low
    }
}

/// Static fallback insights: one entry per lowest-scoring dimension.
pub fn generate_enhanced_static_insights(context: &AssessmentContext) -> Vec<PersonalizedInsight> {
    let mut sorted: Vec<(&String, &i32)> = context.dimension_scores.iter().collect();
    sorted.sort_by_key(|(_, &score)| score);

    sorted
        .into_iter()
        .take(3)
        .map(|(dimension, &score)| PersonalizedInsight {
            insight_type: if score < 50 {
                InsightType::Risk
            } else {
                InsightType::Opportunity
            },
            dimension: dimension.clone(),
            priority: if score < 40 {
                InsightPriority::High
            } else if score < 60 {
                InsightPriority::Medium
            } else {
                InsightPriority::Low
            },
            insight: format!(
                "{} requires attention with current score of {}% in {} sector",
                dimension, score, context.industry
            ),
            action_items: static_action_items(dimension),
            business_impact: format!(
                "Improving {} capabilities will enhance competitive positioning and operational efficiency in the {} sector",
                dimension, context.industry
            ),
            timeline: if score < 40 {
                "1-3 months".to_string()
            } else {
                "3-6 months".to_string()
            },
            investment_level: if score < 40 {
                InvestmentLevel::High
            } else {
                InvestmentLevel::Medium
            },
        })
        .collect()
}

fn static_action_items(dimension: &str) -> Vec<String> {
    let items: &[&str] = match dimension {
        "Strategic Alignment" => &[
            "Develop comprehensive AI strategy document",
            "Establish AI steering committee",
            "Align AI initiatives with business objectives",
        ],
        "Architecture & Infrastructure" => &[
            "Assess cloud infrastructure readiness",
            "Implement scalable data pipelines",
            "Establish MLOps capabilities",
        ],
        "Foundation & Governance" => &[
            "Create AI governance framework",
            "Establish risk management protocols",
            "Implement compliance procedures",
        ],
        "Ethics & Trust" => &[
            "Develop AI ethics guidelines",
            "Implement bias testing protocols",
            "Establish transparency requirements",
        ],
        "Data & Analytics" => &[
            "Improve data quality processes",
            "Implement data governance",
            "Build analytics capabilities",
        ],
        "Innovation & Agility" => &[
            "Establish innovation labs",
            "Create experimentation processes",
            "Build rapid prototyping capabilities",
        ],
        "Workforce & Culture" => &[
            "Implement AI literacy training",
            "Develop change management programs",
            "Foster AI-positive culture",
        ],
        "Execution & Operations" => &[
            "Establish AI project management",
            "Implement monitoring systems",
            "Develop maintenance protocols",
        ],
        _ => &[],
    };

    items.iter().map(|s| s.to_string()).collect()
}

/// Formats an insight as a single display line with priority/type markers.
pub fn format_insight_for_display(insight: &PersonalizedInsight) -> String {
    let priority_icon = match insight.priority {
        InsightPriority::High => "🔴",
        InsightPriority::Medium => "🟡",
        InsightPriority::Low => "🟢",
    };
    let type_icon = match insight.insight_type {
        InsightType::Strength => "💪",
        InsightType::Risk => "⚠️",
        InsightType::Recommendation => "💡",
        InsightType::Opportunity => "🎯",
    };

    format!("{} {} {}", priority_icon, type_icon, insight.insight)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(pairs: &[(&str, i32)]) -> AssessmentContext {
        AssessmentContext {
            dimension_scores: pairs.iter().map(|(d, s)| (d.to_string(), *s)).collect(),
            industry: "Technology".to_string(),
            company_size: Some("51-200".to_string()),
            job_title: Some("CTO".to_string()),
            overall_score: 55,
            benchmarks: vec![],
        }
    }

    #[test]
    fn prompt_buckets_dimensions_by_score() {
        let ctx = context(&[
            ("Data & Analytics", 80),
            ("Ethics & Trust", 60),
            ("Workforce & Culture", 30),
        ]);
        let prompt = prepare_analysis_context(&ctx);

        assert!(prompt.contains("Strengths (75%+): Data & Analytics: 80%"));
        assert!(prompt.contains("Opportunities (50-74%): Ethics & Trust: 60%"));
        assert!(prompt.contains("Critical Gaps (<50%): Workforce & Culture: 30%"));
        assert!(prompt.contains("Current AI Adoption Phase: AI Explorer"));
        assert!(prompt.contains("a CTO in Technology"));
    }

    #[test]
    fn parser_structures_llm_sections() {
        let ctx = context(&[("Data & Analytics", 35)]);
        let response = "Your Data & Analytics capability is a critical gap. You should implement data governance frameworks to reduce compliance risk. Plan for the next 6-12 months of moderate process changes.\n\nshort";
        let insights = parse_insights(response, &ctx);

        assert_eq!(insights.len(), 1); // Second section too short
        let insight = &insights[0];
        assert_eq!(insight.dimension, "Data & Analytics");
        assert_eq!(insight.insight_type, InsightType::Risk);
        assert_eq!(insight.priority, InsightPriority::High); // "critical" + score 35
        assert!(insight.action_items.iter().any(|a| a.contains("implement data governance")));
        assert!(insight.business_impact.contains("risk"));
        assert_eq!(insight.timeline, "6-12 months");
        assert_eq!(insight.investment_level, InvestmentLevel::Medium);
    }

    #[test]
    fn unknown_dimension_defaults_to_strategic_alignment() {
        assert_eq!(extract_dimension("something about chatbots"), "Strategic Alignment");
        assert_eq!(extract_dimension("improve your workforce now"), "Workforce & Culture");
    }

    #[test]
    fn timeline_extraction_falls_back() {
        assert_eq!(extract_timeline("act immediate"), "immediate");
        assert_eq!(extract_timeline("within 2 quarters"), "2 quarters");
        assert_eq!(extract_timeline("no timing here"), "3-6 months");
    }

    #[test]
    fn static_fallback_targets_three_lowest_dimensions() {
        let ctx = context(&[
            ("Data & Analytics", 80),
            ("Ethics & Trust", 45),
            ("Workforce & Culture", 30),
            ("Strategic Alignment", 55),
            ("Execution & Operations", 90),
        ]);
        let insights = generate_enhanced_static_insights(&ctx);

        assert_eq!(insights.len(), 3);
        assert_eq!(insights[0].dimension, "Workforce & Culture");
        assert_eq!(insights[0].priority, InsightPriority::High);
        assert_eq!(insights[0].insight_type, InsightType::Risk);
        assert_eq!(insights[0].timeline, "1-3 months");
        assert!(!insights[0].action_items.is_empty());
        assert_eq!(insights[1].dimension, "Ethics & Trust");
        assert_eq!(insights[2].dimension, "Strategic Alignment");
    }

    #[test]
    fn display_format_carries_markers() {
        let ctx = context(&[("Ethics & Trust", 30)]);
        let insight = &generate_enhanced_static_insights(&ctx)[0];
        let line = format_insight_for_display(insight);
        assert!(line.starts_with("🔴 ⚠️"));
    }
}
