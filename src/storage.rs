//! Persistence layer for leads, assessments and the static catalogs.
//!
//! Follows the pattern of pool-owning service structs; all queries are
//! runtime-checked `query_as` calls so the crate builds without a live
//! database.

use crate::errors::{AppError, ResultExt};
use crate::models::*;
use serde_json::json;
use sqlx::PgPool;

pub struct AssessmentStorage {
    pool: PgPool,
}

impl AssessmentStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Looks up a lead by its natural key.
    pub async fn find_lead_by_email(&self, email: &str) -> Result<Option<Lead>, AppError> {
        let lead = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE email = $1")
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        Ok(lead)
    }

    pub async fn get_lead(&self, lead_id: i64) -> Result<Option<Lead>, AppError> {
        let lead = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = $1")
            .bind(lead_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(lead)
    }

    /// Creates or updates a lead keyed by email.
    ///
    /// Returns the lead id and whether the row was newly created.
    pub async fn upsert_lead(&self, lead: &LeadRequest) -> Result<(i64, bool), AppError> {
        let email = lead.email.to_lowercase();

        if let Some(existing) = self.find_lead_by_email(&email).await? {
            sqlx::query(
                r#"
                UPDATE leads SET
                    company_name = $1, contact_name = $2, phone_number = $3,
                    job_title = $4, industry = $5, company_size = $6, country = $7,
                    updated_at = NOW()
                WHERE email = $8
                "#,
            )
            .bind(&lead.company_name)
            .bind(&lead.contact_name)
            .bind(&lead.phone_number)
            .bind(&lead.job_title)
            .bind(&lead.industry)
            .bind(&lead.company_size)
            .bind(&lead.country)
            .bind(&email)
            .execute(&self.pool)
            .await?;

            tracing::info!("Updated existing lead {} ({})", existing.id, email);
            return Ok((existing.id, false));
        }

        let lead_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO leads (email, company_name, contact_name, phone_number,
                               job_title, industry, company_size, country)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&email)
        .bind(&lead.company_name)
        .bind(&lead.contact_name)
        .bind(&lead.phone_number)
        .bind(&lead.job_title)
        .bind(&lead.industry)
        .bind(&lead.company_size)
        .bind(&lead.country)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Created lead {} ({})", lead_id, email);
        Ok((lead_id, true))
    }

    /// Active catalog questions for one tier, in display order.
    pub async fn active_questions(
        &self,
        assessment_type: AssessmentType,
    ) -> Result<Vec<AssessmentQuestion>, AppError> {
        let questions = sqlx::query_as::<_, AssessmentQuestion>(
            r#"
            SELECT * FROM assessment_questions
            WHERE question_type = $1 AND active = TRUE
            ORDER BY sort_order
            "#,
        )
        .bind(assessment_type.as_str())
        .fetch_all(&self.pool)
        .await
        .context("Failed to load question catalog")?;

        Ok(questions)
    }

    /// Benchmark rows for one industry.
    pub async fn benchmarks_for_industry(
        &self,
        industry: &str,
    ) -> Result<Vec<IndustryBenchmark>, AppError> {
        let benchmarks = sqlx::query_as::<_, IndustryBenchmark>(
            "SELECT * FROM industry_benchmarks WHERE industry = $1",
        )
        .bind(industry)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load industry benchmarks")?;

        Ok(benchmarks)
    }

    /// Stores a completed assessment snapshot. The caller provides only
    /// server-computed scores.
    pub async fn insert_assessment(
        &self,
        submission: &AssessmentSubmission,
        overall_score: i32,
        dimension_scores: &DimensionScores,
        insights: &[String],
    ) -> Result<i64, AppError> {
        let assessment_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO assessments (lead_id, assessment_type, industry, overall_score,
                                     dimension_scores, responses, insights)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(submission.lead_id)
        .bind(submission.assessment_type.as_str())
        .bind(&submission.industry)
        .bind(overall_score)
        .bind(json!(dimension_scores))
        .bind(json!(submission.responses))
        .bind(json!(insights))
        .fetch_one(&self.pool)
        .await?;

        Ok(assessment_id)
    }

    /// Queues the admin notification row for a completed assessment.
    pub async fn queue_admin_notification(
        &self,
        assessment_id: i64,
        recipient_email: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (assessment_id, email_type, recipient_email)
            VALUES ($1, 'ASSESSMENT_COMPLETE', $2)
            "#,
        )
        .bind(assessment_id)
        .bind(recipient_email)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Admin notifications not yet delivered.
    pub async fn pending_admin_notifications(&self) -> Result<Vec<AdminNotification>, AppError> {
        let rows = sqlx::query_as::<_, AdminNotification>(
            "SELECT * FROM notifications WHERE status = 'PENDING' ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn mark_admin_notification(
        &self,
        notification_id: i64,
        status: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE notifications SET status = $1, sent_at = NOW() WHERE id = $2",
        )
        .bind(status)
        .bind(notification_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Assessment joined with lead identity, for the results endpoint.
    pub async fn get_assessment_with_lead(
        &self,
        assessment_id: i64,
    ) -> Result<Option<AssessmentWithLead>, AppError> {
        let assessment = sqlx::query_as::<_, AssessmentWithLead>(
            r#"
            SELECT a.id, a.lead_id, a.assessment_type, a.industry, a.overall_score,
                   a.dimension_scores, a.responses, a.insights, a.completed_at,
                   l.company_name, l.contact_name, l.email
            FROM assessments a
            JOIN leads l ON a.lead_id = l.id
            WHERE a.id = $1
            "#,
        )
        .bind(assessment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(assessment)
    }

    /// Leads with assessment activity, newest first, for the admin list.
    pub async fn admin_leads(&self) -> Result<Vec<LeadSummary>, AppError> {
        let leads = sqlx::query_as::<_, LeadSummary>(
            r#"
            SELECT l.id, l.email, l.company_name, l.contact_name, l.industry,
                   l.company_size, l.country, l.created_at,
                   COUNT(a.id) AS assessment_count,
                   MAX(a.completed_at) AS last_assessment
            FROM leads l
            LEFT JOIN assessments a ON l.id = a.lead_id
            GROUP BY l.id
            ORDER BY l.created_at DESC
            LIMIT 100
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(leads)
    }

    /// Latest assessment per lead, the input set for lead scoring.
    pub async fn latest_assessed_leads(&self, limit: i64) -> Result<Vec<AssessedLeadRow>, AppError> {
        let rows = sqlx::query_as::<_, AssessedLeadRow>(
            r#"
            SELECT * FROM (
                SELECT DISTINCT ON (l.id)
                       l.id AS lead_id, l.email, l.company_name, l.contact_name,
                       l.job_title, l.industry, l.company_size,
                       a.id AS assessment_id, a.assessment_type, a.overall_score,
                       a.dimension_scores, a.completed_at
                FROM leads l
                JOIN assessments a ON a.lead_id = l.id
                ORDER BY l.id, a.completed_at DESC
            ) latest
            ORDER BY completed_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Aggregate counters for the admin analytics endpoint.
    pub async fn admin_analytics(&self) -> Result<serde_json::Value, AppError> {
        let total_leads =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM leads")
                .fetch_one(&self.pool)
                .await?;

        let total_assessments =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM assessments")
                .fetch_one(&self.pool)
                .await?;

        let average_score = sqlx::query_scalar::<_, f64>(
            "SELECT COALESCE(AVG(overall_score), 0)::float8 FROM assessments",
        )
        .fetch_one(&self.pool)
        .await?;

        let industry_distribution = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT industry, COUNT(*) FROM leads
            GROUP BY industry
            ORDER BY COUNT(*) DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let recent = sqlx::query_as::<_, RecentAssessmentRow>(
            r#"
            SELECT a.overall_score, a.assessment_type, a.completed_at,
                   l.company_name, l.industry
            FROM assessments a
            JOIN leads l ON a.lead_id = l.id
            ORDER BY a.completed_at DESC
            LIMIT 10
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(json!({
            "totalLeads": total_leads,
            "totalAssessments": total_assessments,
            "averageScore": average_score.round() as i64,
            "industryDistribution": industry_distribution
                .into_iter()
                .map(|(industry, count)| json!({ "industry": industry, "count": count }))
                .collect::<Vec<_>>(),
            "recentAssessments": recent,
        }))
    }
}

/// Row shape for the recent-assessments analytics panel.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentAssessmentRow {
    pub overall_score: i32,
    pub assessment_type: String,
    pub completed_at: chrono::DateTime<chrono::Utc>,
    pub company_name: String,
    pub industry: String,
}
