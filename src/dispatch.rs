//! Delivery pass over everything queued: admin assessment
//! notifications and monitoring reminders that have entered their send
//! window. Invoked from the dispatch endpoint and the one-shot
//! `dispatch_reminders` binary.

use crate::email::{AssessmentEmailData, EmailService};
use crate::errors::AppError;
use crate::models::*;
use crate::monitoring::MonitoringService;
use crate::storage::AssessmentStorage;
use serde::Serialize;
use sqlx::PgPool;

/// Outcome counters for one dispatch pass.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchSummary {
    pub admin_sent: u32,
    pub admin_failed: u32,
    pub reminders_sent: u32,
    pub reminders_failed: u32,
}

/// Sends every queued admin notification and every due reminder.
///
/// Delivery failures mark the individual row FAILED and the pass
/// continues; only query errors abort.
pub async fn dispatch_pending(
    pool: &PgPool,
    email: &EmailService,
    admin_email: &str,
    assessment_url: &str,
) -> Result<DispatchSummary, AppError> {
    let storage = AssessmentStorage::new(pool.clone());
    let monitoring = MonitoringService::new(pool.clone(), assessment_url.to_string());
    let mut summary = DispatchSummary::default();

    for notification in storage.pending_admin_notifications().await? {
        match build_assessment_email_data(&storage, notification.assessment_id).await {
            Ok(Some(data)) => {
                match email.send_assessment_notification(admin_email, &data).await {
                    Ok(()) => {
                        storage
                            .mark_admin_notification(notification.id, "SENT")
                            .await?;
                        summary.admin_sent += 1;
                    }
                    Err(e) => {
                        tracing::warn!(
                            "❌ Admin notification {} delivery failed: {}",
                            notification.id,
                            e
                        );
                        storage
                            .mark_admin_notification(notification.id, "FAILED")
                            .await?;
                        summary.admin_failed += 1;
                    }
                }
            }
            Ok(None) => {
                tracing::warn!(
                    "❌ Notification {} references missing assessment {}",
                    notification.id,
                    notification.assessment_id
                );
                storage
                    .mark_admin_notification(notification.id, "FAILED")
                    .await?;
                summary.admin_failed += 1;
            }
            Err(e) => return Err(e),
        }
    }

    for reminder in monitoring.get_pending_notifications().await? {
        match email
            .send_message(
                &reminder.recipient_email,
                &reminder.subject,
                &reminder.message_content,
            )
            .await
        {
            Ok(()) => {
                monitoring.mark_notification_sent(reminder.id).await?;
                summary.reminders_sent += 1;
            }
            Err(e) => {
                tracing::warn!("❌ Reminder {} delivery failed: {}", reminder.id, e);
                monitoring.mark_notification_failed(reminder.id).await?;
                summary.reminders_failed += 1;
            }
        }
    }

    tracing::info!(
        "✓ Dispatch pass complete: {} admin sent, {} admin failed, {} reminders sent, {} reminders failed",
        summary.admin_sent,
        summary.admin_failed,
        summary.reminders_sent,
        summary.reminders_failed
    );
    Ok(summary)
}

/// Assembles the admin email context for one assessment.
async fn build_assessment_email_data(
    storage: &AssessmentStorage,
    assessment_id: i64,
) -> Result<Option<AssessmentEmailData>, AppError> {
    let Some(assessment) = storage.get_assessment_with_lead(assessment_id).await? else {
        return Ok(None);
    };
    let Some(lead) = storage.get_lead(assessment.lead_id).await? else {
        return Ok(None);
    };

    let dimension_scores: DimensionScores =
        serde_json::from_value(assessment.dimension_scores.clone()).unwrap_or_default();

    Ok(Some(AssessmentEmailData {
        contact_name: assessment.contact_name,
        email: assessment.email,
        company_name: assessment.company_name,
        industry: assessment.industry,
        job_title: lead.job_title,
        phone_number: lead.phone_number,
        assessment_type: assessment.assessment_type,
        overall_score: assessment.overall_score,
        dimension_scores,
        completed_at: assessment.completed_at,
    }))
}
