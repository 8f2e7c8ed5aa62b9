//! Continuous monitoring: periodic re-assessment schedules and the
//! reminder notifications that keep them on track.
//!
//! Reminders are pull-based. Rows become due by date arithmetic in SQL
//! and a dispatch pass (HTTP endpoint or the `dispatch_reminders`
//! binary) delivers whatever is pending.

use crate::errors::AppError;
use crate::models::*;
use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;

/// Default reminder offsets, in days before the due date.
const DEFAULT_REMINDER_DAYS: [i64; 4] = [30, 14, 7, 1];

/// Counters for the monitoring dashboard endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringStats {
    pub total_active: i64,
    pub due_this_week: i64,
    pub due_this_month: i64,
    pub overdue: i64,
    /// Percentage of active schedules whose current cycle completed.
    pub completion_rate: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct ScheduleLeadInfo {
    email: String,
    company_name: String,
    contact_name: String,
    monitoring_type: String,
}

pub struct MonitoringService {
    pool: PgPool,
    assessment_url: String,
}

impl MonitoringService {
    pub fn new(pool: PgPool, assessment_url: String) -> Self {
        Self {
            pool,
            assessment_url,
        }
    }

    /// Creates an ACTIVE schedule for a lead's latest assessment and
    /// queues the reminder rows for its first cycle.
    pub async fn create_monitoring_schedule(
        &self,
        lead_id: i64,
        assessment_id: i64,
        monitoring_type: MonitoringType,
    ) -> Result<i64, AppError> {
        let frequency_days = monitoring_type.frequency_days();
        let next_due = Utc::now().date_naive() + Duration::days(frequency_days);

        let schedule_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO monitoring_schedules (
                lead_id, assessment_id, monitoring_type, monitoring_frequency,
                next_assessment_due, notification_schedule, auto_prompt_enabled
            ) VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            RETURNING id
            "#,
        )
        .bind(lead_id)
        .bind(assessment_id)
        .bind(monitoring_type.as_str())
        .bind(frequency_days as i32)
        .bind(next_due)
        .bind(json!(DEFAULT_REMINDER_DAYS))
        .fetch_one(&self.pool)
        .await?;

        self.create_notification_reminders(schedule_id, next_due, &DEFAULT_REMINDER_DAYS)
            .await?;

        tracing::info!(
            "✓ Created {} monitoring schedule {} for lead {}, next due {}",
            monitoring_type.as_str(),
            schedule_id,
            lead_id,
            next_due
        );
        Ok(schedule_id)
    }

    /// Queues one reminder row per offset for the given cycle.
    async fn create_notification_reminders(
        &self,
        schedule_id: i64,
        due_date: NaiveDate,
        reminder_days: &[i64],
    ) -> Result<(), AppError> {
        let info = sqlx::query_as::<_, ScheduleLeadInfo>(
            r#"
            SELECT l.email, l.company_name, l.contact_name, ms.monitoring_type
            FROM monitoring_schedules ms
            JOIN leads l ON ms.lead_id = l.id
            WHERE ms.id = $1
            "#,
        )
        .bind(schedule_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(info) = info else {
            tracing::warn!("❌ No lead found for monitoring schedule {}", schedule_id);
            return Ok(());
        };

        for &days in reminder_days {
            let (notification_type, subject, message) = if days == 1 {
                (
                    "ASSESSMENT_DUE",
                    format!(
                        "AI Readiness Re-Assessment Due Tomorrow - {}",
                        info.company_name
                    ),
                    assessment_due_message(&info, due_date, &self.assessment_url),
                )
            } else if days <= 7 {
                (
                    "REMINDER",
                    format!(
                        "AI Readiness Re-Assessment Due in {} Days - {}",
                        days, info.company_name
                    ),
                    reminder_message(&info, due_date, days, &self.assessment_url),
                )
            } else {
                (
                    "REMINDER",
                    format!("AI Readiness Check-in: {} Days Until Next Assessment", days),
                    advance_reminder_message(&info, due_date, days, &self.assessment_url),
                )
            };

            sqlx::query(
                r#"
                INSERT INTO monitoring_notifications (
                    monitoring_schedule_id, notification_type, days_before_due,
                    recipient_email, subject, message_content
                ) VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(schedule_id)
            .bind(notification_type)
            .bind(days as i32)
            .bind(&info.email)
            .bind(&subject)
            .bind(&message)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    /// The lead's ACTIVE schedule, if any. Used to close the cycle when
    /// a follow-up assessment arrives.
    pub async fn find_active_schedule_for_lead(
        &self,
        lead_id: i64,
    ) -> Result<Option<MonitoringSchedule>, AppError> {
        let schedule = sqlx::query_as::<_, MonitoringSchedule>(
            r#"
            SELECT * FROM monitoring_schedules
            WHERE lead_id = $1 AND status = 'ACTIVE'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(lead_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(schedule)
    }

    pub async fn get_active_schedules(&self) -> Result<Vec<MonitoringSchedule>, AppError> {
        let schedules = sqlx::query_as::<_, MonitoringSchedule>(
            r#"
            SELECT * FROM monitoring_schedules
            WHERE status = 'ACTIVE' AND auto_prompt_enabled = TRUE
            ORDER BY next_assessment_due ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(schedules)
    }

    /// Schedules whose re-assessment falls due within `days_ahead`
    /// days, joined with lead and last-score context.
    pub async fn get_due_assessments(
        &self,
        days_ahead: i64,
    ) -> Result<Vec<DueScheduleRow>, AppError> {
        let check_date = Utc::now().date_naive() + Duration::days(days_ahead);

        let due = sqlx::query_as::<_, DueScheduleRow>(
            r#"
            SELECT ms.id, ms.lead_id, ms.assessment_id, ms.monitoring_type,
                   ms.monitoring_frequency, ms.next_assessment_due, ms.status,
                   l.company_name, l.contact_name, l.email, l.industry,
                   a.overall_score AS last_score, a.assessment_type
            FROM monitoring_schedules ms
            JOIN leads l ON ms.lead_id = l.id
            JOIN assessments a ON ms.assessment_id = a.id
            WHERE ms.status = 'ACTIVE'
              AND ms.next_assessment_due <= $1
              AND ms.assessment_completed = FALSE
            ORDER BY ms.next_assessment_due ASC
            "#,
        )
        .bind(check_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(due)
    }

    /// Reminder rows that have entered their send window.
    pub async fn get_pending_notifications(&self) -> Result<Vec<PendingReminderRow>, AppError> {
        let pending = sqlx::query_as::<_, PendingReminderRow>(
            r#"
            SELECT mn.id, mn.monitoring_schedule_id, mn.notification_type,
                   mn.days_before_due, mn.recipient_email, mn.subject,
                   mn.message_content, ms.next_assessment_due, l.company_name
            FROM monitoring_notifications mn
            JOIN monitoring_schedules ms ON mn.monitoring_schedule_id = ms.id
            JOIN leads l ON ms.lead_id = l.id
            WHERE mn.status = 'PENDING'
              AND CURRENT_DATE + mn.days_before_due >= ms.next_assessment_due
            ORDER BY mn.days_before_due DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(pending)
    }

    pub async fn mark_notification_sent(&self, notification_id: i64) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE monitoring_notifications
            SET status = 'SENT', sent_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(notification_id)
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            UPDATE monitoring_schedules
            SET reminders_sent = reminders_sent + 1, last_reminder_sent = NOW()
            WHERE id = (SELECT monitoring_schedule_id FROM monitoring_notifications WHERE id = $1)
            "#,
        )
        .bind(notification_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn mark_notification_failed(&self, notification_id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE monitoring_notifications SET status = 'FAILED' WHERE id = $1")
            .bind(notification_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Closes the current cycle with a follow-up assessment and rolls
    /// the schedule forward by one frequency period: the due date
    /// advances, reminder counters reset, and the next cycle's reminder
    /// rows are queued.
    pub async fn complete_assessment_cycle(
        &self,
        schedule_id: i64,
        new_assessment_id: i64,
    ) -> Result<NaiveDate, AppError> {
        let schedule = sqlx::query_as::<_, MonitoringSchedule>(
            "SELECT * FROM monitoring_schedules WHERE id = $1",
        )
        .bind(schedule_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Monitoring schedule {} not found", schedule_id)))?;

        let next_due =
            schedule.next_assessment_due + Duration::days(schedule.monitoring_frequency as i64);

        sqlx::query(
            r#"
            UPDATE monitoring_schedules
            SET follow_up_assessment_id = $1,
                next_assessment_due = $2,
                assessment_completed = FALSE,
                reminders_sent = 0,
                last_reminder_sent = NULL,
                updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(new_assessment_id)
        .bind(next_due)
        .bind(schedule_id)
        .execute(&self.pool)
        .await?;

        let reminder_days: Vec<i64> =
            serde_json::from_value(schedule.notification_schedule.clone())
                .unwrap_or_else(|_| DEFAULT_REMINDER_DAYS.to_vec());
        self.create_notification_reminders(schedule_id, next_due, &reminder_days)
            .await?;

        tracing::info!(
            "✓ Completed monitoring cycle for schedule {}, next due {}",
            schedule_id,
            next_due
        );
        Ok(next_due)
    }

    pub async fn pause_monitoring(&self, schedule_id: i64) -> Result<(), AppError> {
        self.set_schedule_status(schedule_id, "PAUSED").await
    }

    pub async fn resume_monitoring(&self, schedule_id: i64) -> Result<(), AppError> {
        self.set_schedule_status(schedule_id, "ACTIVE").await
    }

    async fn set_schedule_status(&self, schedule_id: i64, status: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE monitoring_schedules SET status = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(status)
        .bind(schedule_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Monitoring schedule {} not found",
                schedule_id
            )));
        }

        Ok(())
    }

    /// Dashboard counters over the active schedule population.
    pub async fn get_monitoring_stats(&self) -> Result<MonitoringStats, AppError> {
        let today = Utc::now().date_naive();

        let total_active = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM monitoring_schedules WHERE status = 'ACTIVE'",
        )
        .fetch_one(&self.pool)
        .await?;

        let due_this_week = self.count_due_by(today + Duration::days(7)).await?;
        let due_this_month = self.count_due_by(today + Duration::days(30)).await?;

        let overdue = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM monitoring_schedules
            WHERE status = 'ACTIVE' AND next_assessment_due < $1
              AND assessment_completed = FALSE
            "#,
        )
        .bind(today)
        .fetch_one(&self.pool)
        .await?;

        let completed = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM monitoring_schedules WHERE follow_up_assessment_id IS NOT NULL",
        )
        .fetch_one(&self.pool)
        .await?;

        let completion_rate = if total_active > 0 {
            ((completed as f64 / total_active as f64) * 100.0).round() as i64
        } else {
            0
        };

        Ok(MonitoringStats {
            total_active,
            due_this_week,
            due_this_month,
            overdue,
            completion_rate,
        })
    }

    async fn count_due_by(&self, date: NaiveDate) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM monitoring_schedules
            WHERE status = 'ACTIVE' AND next_assessment_due <= $1
              AND assessment_completed = FALSE
            "#,
        )
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

fn format_due_date(due_date: NaiveDate) -> String {
    due_date.format("%a %b %d %Y").to_string()
}

fn assessment_due_message(info: &ScheduleLeadInfo, due_date: NaiveDate, url: &str) -> String {
    format!(
        "Dear {contact},\n\n\
         Your {cadence} AI readiness re-assessment is due tomorrow ({due}).\n\n\
         Regular assessments help track your AI transformation progress and identify new opportunities for improvement.\n\n\
         Complete your follow-up assessment:\n{url}\n\n\
         This only takes 5-10 minutes and provides updated insights based on your latest AI initiatives.\n\n\
         Benefits of regular monitoring:\n\
         • Track measurable progress in AI readiness\n\
         • Identify new opportunities and risks\n\
         • Benchmark against industry developments\n\
         • Adjust strategy based on changing landscape\n\n\
         Best regards,\n\
         The SAFE-8 Advisory Team\n\n\
         Need help? Reply to this email or book a consultation at your convenience.",
        contact = info.contact_name,
        cadence = info.monitoring_type.to_lowercase(),
        due = format_due_date(due_date),
        url = url,
    )
}

fn reminder_message(info: &ScheduleLeadInfo, due_date: NaiveDate, days: i64, url: &str) -> String {
    format!(
        "Dear {contact},\n\n\
         Your {cadence} AI readiness re-assessment is due in {days} {unit} ({due}).\n\n\
         Continuing to monitor your AI readiness ensures {company} stays on track with your transformation goals.\n\n\
         Quick Assessment Link:\n{url}\n\n\
         Why regular assessments matter:\n\
         • AI landscape evolves rapidly - stay current\n\
         • Track ROI from your AI investments\n\
         • Identify emerging opportunities early\n\
         • Maintain competitive advantage\n\n\
         The assessment takes just 5-10 minutes and provides immediate, actionable insights.\n\n\
         Best regards,\n\
         The SAFE-8 Advisory Team",
        contact = info.contact_name,
        cadence = info.monitoring_type.to_lowercase(),
        days = days,
        unit = if days == 1 { "day" } else { "days" },
        due = format_due_date(due_date),
        company = info.company_name,
        url = url,
    )
}

fn advance_reminder_message(
    info: &ScheduleLeadInfo,
    due_date: NaiveDate,
    days: i64,
    url: &str,
) -> String {
    let due = format_due_date(due_date);
    format!(
        "Dear {contact},\n\n\
         Hope you're making great progress with your AI initiatives at {company}!\n\n\
         This is an advance notice that your next AI readiness assessment is scheduled for {due} ({days} days from now).\n\n\
         Since your last assessment, we've seen significant developments in:\n\
         • Generative AI adoption across industries\n\
         • New regulatory frameworks for AI governance\n\
         • Advanced automation capabilities\n\
         • Enhanced data analytics platforms\n\n\
         Your upcoming assessment will help evaluate how these changes impact your AI strategy.\n\n\
         Mark your calendar: {due}\n\
         Assessment link: {url}\n\n\
         Looking forward to seeing your continued progress!\n\n\
         Best regards,\n\
         The SAFE-8 Advisory Team\n\n\
         Questions? Book a consultation or reply to this email.",
        contact = info.contact_name,
        company = info.company_name,
        due = due,
        days = days,
        url = url,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> ScheduleLeadInfo {
        ScheduleLeadInfo {
            email: "cio@globex.example".to_string(),
            company_name: "Globex".to_string(),
            contact_name: "Jordan Lee".to_string(),
            monitoring_type: "QUARTERLY".to_string(),
        }
    }

    #[test]
    fn due_tomorrow_message_names_cadence_and_link() {
        let due = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let msg = assessment_due_message(&info(), due, "https://assess.example.com");
        assert!(msg.starts_with("Dear Jordan Lee,"));
        assert!(msg.contains("quarterly AI readiness re-assessment is due tomorrow"));
        assert!(msg.contains("Mon Mar 02 2026"));
        assert!(msg.contains("https://assess.example.com"));
    }

    #[test]
    fn reminder_message_pluralizes_days() {
        let due = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let msg = reminder_message(&info(), due, 7, "https://assess.example.com");
        assert!(msg.contains("due in 7 days"));
        assert!(msg.contains("ensures Globex stays on track"));
    }

    #[test]
    fn advance_reminder_mentions_schedule_window() {
        let due = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let msg = advance_reminder_message(&info(), due, 30, "https://assess.example.com");
        assert!(msg.contains("(30 days from now)"));
        assert!(msg.contains("Mark your calendar: Mon Mar 02 2026"));
    }
}
