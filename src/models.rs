use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use std::str::FromStr;

// ============ Catalog Enums ============

/// The three questionnaire tiers served by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssessmentType {
    Core,
    Advanced,
    Frontier,
}

impl AssessmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentType::Core => "CORE",
            AssessmentType::Advanced => "ADVANCED",
            AssessmentType::Frontier => "FRONTIER",
        }
    }
}

impl FromStr for AssessmentType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CORE" => Ok(AssessmentType::Core),
            "ADVANCED" => Ok(AssessmentType::Advanced),
            "FRONTIER" => Ok(AssessmentType::Frontier),
            _ => Err(()),
        }
    }
}

/// Re-assessment cadence for monitoring schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitoringType {
    Quarterly,
    SemiAnnual,
    Annual,
}

impl MonitoringType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitoringType::Quarterly => "QUARTERLY",
            MonitoringType::SemiAnnual => "SEMI_ANNUAL",
            MonitoringType::Annual => "ANNUAL",
        }
    }

    /// Cycle length in days.
    pub fn frequency_days(&self) -> i64 {
        match self {
            MonitoringType::Quarterly => 90,
            MonitoringType::SemiAnnual => 180,
            MonitoringType::Annual => 365,
        }
    }
}

/// Per-dimension percentage scores, keyed by SAFE-8 dimension label.
pub type DimensionScores = BTreeMap<String, i32>;

// ============ Database Models ============

/// A prospective customer captured by the lead form. Unique per email.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Lead {
    /// Unique identifier for the lead.
    pub id: i64,
    /// Contact email, the natural key for upserts.
    pub email: String,
    /// Company the contact works for.
    pub company_name: String,
    /// Full name of the contact.
    pub contact_name: String,
    /// Optional phone number, free-form.
    pub phone_number: Option<String>,
    /// Job title, used by the lead-scoring authority heuristic.
    pub job_title: Option<String>,
    /// Industry label, matched against benchmark rows.
    pub industry: String,
    /// Company size bracket (e.g. "51-200").
    pub company_size: Option<String>,
    /// Country of the contact.
    pub country: Option<String>,
    /// Timestamp of creation.
    pub created_at: DateTime<Utc>,
    /// Timestamp of last update.
    pub updated_at: Option<DateTime<Utc>>,
}

/// A row of the static question catalog. Read-only at request time.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AssessmentQuestion {
    pub id: i64,
    /// Catalog tier: CORE, ADVANCED or FRONTIER.
    pub question_type: String,
    /// SAFE-8 dimension this question contributes to.
    pub dimension: String,
    pub question_text: String,
    /// Weight applied when aggregating Likert responses.
    pub weight: f64,
    pub sort_order: i32,
    pub active: bool,
}

/// A completed questionnaire instance, stored as an immutable snapshot.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Assessment {
    pub id: i64,
    pub lead_id: i64,
    pub assessment_type: String,
    pub industry: String,
    /// Server-computed overall percentage score.
    pub overall_score: i32,
    /// Per-dimension scores as stored JSON.
    pub dimension_scores: serde_json::Value,
    /// Raw question-id -> Likert response map as submitted.
    pub responses: serde_json::Value,
    /// Generated insight lines, frozen at submission time.
    pub insights: serde_json::Value,
    pub completed_at: DateTime<Utc>,
}

/// Static reference scores per (industry, dimension).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct IndustryBenchmark {
    pub id: i64,
    pub industry: String,
    pub dimension: String,
    pub average_score: f64,
    pub median_score: f64,
    pub top_quartile_score: f64,
}

/// Admin email queued when an assessment completes.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AdminNotification {
    pub id: i64,
    pub assessment_id: i64,
    pub email_type: String,
    pub recipient_email: String,
    /// PENDING, SENT or FAILED.
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

/// A consultation booking tied to a lead and optionally an assessment.
///
/// Lifecycle: PENDING -> CONFIRMED -> COMPLETED/CANCELLED.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ConsultationBooking {
    pub id: i64,
    pub lead_id: i64,
    pub assessment_id: Option<i64>,
    /// STRATEGY, TECHNICAL or IMPLEMENTATION.
    pub consultation_type: String,
    pub preferred_date: Option<NaiveDate>,
    pub preferred_time: Option<String>,
    pub timezone: String,
    /// Duration in minutes.
    pub consultation_duration: i32,
    /// Focus areas as a JSON string array.
    pub topic_focus: Option<serde_json::Value>,
    /// LOW, MEDIUM, HIGH or URGENT.
    pub urgency_level: String,
    pub company_background: Option<String>,
    pub specific_challenges: Option<String>,
    /// VIRTUAL, IN_PERSON or PHONE.
    pub meeting_preference: String,
    pub status: String,
    pub booking_confirmed_at: Option<DateTime<Utc>>,
    pub calendar_event_id: Option<String>,
    pub consultant_notes: Option<String>,
    pub follow_up_actions: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A bookable consultant time slot.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ConsultationSlot {
    pub id: i64,
    pub consultant_name: String,
    pub consultant_email: String,
    pub specialization: String,
    pub available_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub timezone: String,
    /// Slot length in minutes.
    pub duration: i32,
    pub max_bookings: i32,
    pub current_bookings: i32,
    pub is_available: bool,
}

/// Recurrence record driving periodic re-assessment reminders.
///
/// Lifecycle: ACTIVE <-> PAUSED, otherwise CANCELLED/COMPLETED. The
/// next-due date only advances when a new assessment closes the cycle.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MonitoringSchedule {
    pub id: i64,
    pub lead_id: i64,
    pub assessment_id: i64,
    /// Assessment that closed the previous cycle, if any.
    pub follow_up_assessment_id: Option<i64>,
    /// QUARTERLY, SEMI_ANNUAL or ANNUAL.
    pub monitoring_type: String,
    /// Cycle length in days.
    pub monitoring_frequency: i32,
    pub next_assessment_due: NaiveDate,
    /// Reminder-day offsets as a JSON number array, e.g. [30, 14, 7, 1].
    pub notification_schedule: serde_json::Value,
    pub auto_prompt_enabled: bool,
    pub last_reminder_sent: Option<DateTime<Utc>>,
    pub reminders_sent: i32,
    pub assessment_completed: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One scheduled reminder email. Lifecycle: PENDING -> SENT/FAILED.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MonitoringNotification {
    pub id: i64,
    pub monitoring_schedule_id: i64,
    /// ASSESSMENT_DUE, REMINDER or OVERDUE.
    pub notification_type: String,
    pub days_before_due: i32,
    pub recipient_email: String,
    pub subject: String,
    pub message_content: String,
    pub status: String,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// ============ Joined Query Rows ============

/// Lead row augmented with assessment activity, for the admin list.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LeadSummary {
    pub id: i64,
    pub email: String,
    pub company_name: String,
    pub contact_name: String,
    pub industry: String,
    pub company_size: Option<String>,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
    pub assessment_count: i64,
    pub last_assessment: Option<DateTime<Utc>>,
}

/// Assessment joined with its lead's identity fields.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AssessmentWithLead {
    pub id: i64,
    pub lead_id: i64,
    pub assessment_type: String,
    pub industry: String,
    pub overall_score: i32,
    pub dimension_scores: serde_json::Value,
    pub responses: serde_json::Value,
    pub insights: serde_json::Value,
    pub completed_at: DateTime<Utc>,
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
}

/// Latest assessment per lead, the input row for the lead-scoring engine.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AssessedLeadRow {
    pub lead_id: i64,
    pub email: String,
    pub company_name: String,
    pub contact_name: String,
    pub job_title: Option<String>,
    pub industry: String,
    pub company_size: Option<String>,
    pub assessment_id: i64,
    pub assessment_type: String,
    pub overall_score: i32,
    pub dimension_scores: serde_json::Value,
    pub completed_at: DateTime<Utc>,
}

/// Pending booking joined with lead identity and assessment context.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PendingBookingRow {
    pub id: i64,
    pub lead_id: i64,
    pub assessment_id: Option<i64>,
    pub consultation_type: String,
    pub preferred_date: Option<NaiveDate>,
    pub preferred_time: Option<String>,
    pub timezone: String,
    pub consultation_duration: i32,
    pub topic_focus: Option<serde_json::Value>,
    pub urgency_level: String,
    pub meeting_preference: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    pub overall_score: Option<i32>,
    pub assessment_type: Option<String>,
}

/// Active schedule joined with lead and last-assessment context.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DueScheduleRow {
    pub id: i64,
    pub lead_id: i64,
    pub assessment_id: i64,
    pub monitoring_type: String,
    pub monitoring_frequency: i32,
    pub next_assessment_due: NaiveDate,
    pub status: String,
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    pub industry: String,
    pub last_score: i32,
    pub assessment_type: String,
}

/// Reminder row joined with its schedule's due date, ready to send.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PendingReminderRow {
    pub id: i64,
    pub monitoring_schedule_id: i64,
    pub notification_type: String,
    pub days_before_due: i32,
    pub recipient_email: String,
    pub subject: String,
    pub message_content: String,
    pub next_assessment_due: NaiveDate,
    pub company_name: String,
}

// ============ API Request Models ============

/// Payload for the lead-capture upsert.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRequest {
    pub email: String,
    pub company_name: String,
    pub contact_name: String,
    pub phone_number: Option<String>,
    pub job_title: Option<String>,
    pub industry: String,
    pub company_size: Option<String>,
    pub country: Option<String>,
}

/// Payload for assessment submission.
///
/// `overall_score` and `dimension_scores` are accepted for wire
/// compatibility but ignored: scores are always recomputed server-side
/// from `responses`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentSubmission {
    pub lead_id: i64,
    pub assessment_type: AssessmentType,
    pub industry: String,
    /// question id (stringly keyed, as submitted) -> Likert response 0..=4.
    pub responses: BTreeMap<String, i32>,
    pub overall_score: Option<i32>,
    pub dimension_scores: Option<BTreeMap<String, i32>>,
}

/// Payload for creating a consultation booking.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub lead_id: i64,
    pub assessment_id: Option<i64>,
    pub consultation_type: String,
    pub preferred_date: Option<NaiveDate>,
    pub preferred_time: Option<String>,
    pub timezone: Option<String>,
    pub consultation_duration: Option<i32>,
    pub topic_focus: Option<Vec<String>>,
    pub urgency_level: Option<String>,
    pub company_background: Option<String>,
    pub specific_challenges: Option<String>,
    pub meeting_preference: Option<String>,
}

/// Payload for confirming a booking.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmBookingRequest {
    pub calendar_event_id: Option<String>,
}

/// Payload for consultant notes after a session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingNotesRequest {
    pub notes: String,
    pub follow_up_actions: Option<Vec<String>>,
}

/// Payload for the consultation-type suggestion endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestConsultationRequest {
    pub overall_score: i32,
    pub dimension_scores: DimensionScores,
}

/// Payload for creating a monitoring schedule.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringRequest {
    pub lead_id: i64,
    pub assessment_id: i64,
    pub monitoring_type: Option<MonitoringType>,
}

/// Payload for closing a monitoring cycle with a follow-up assessment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteCycleRequest {
    pub new_assessment_id: i64,
}

// ============ API Response Models ============

/// Response for lead-capture operations.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadResponse {
    pub lead_id: i64,
    pub message: String,
}

/// Response for assessment submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResponse {
    pub assessment_id: i64,
    pub overall_score: i32,
    pub dimension_scores: DimensionScores,
    pub insights: Vec<String>,
    pub benchmarks: Vec<IndustryBenchmark>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assessment_type_round_trips_through_str() {
        for (s, t) in [
            ("CORE", AssessmentType::Core),
            ("ADVANCED", AssessmentType::Advanced),
            ("FRONTIER", AssessmentType::Frontier),
        ] {
            assert_eq!(s.parse::<AssessmentType>().unwrap(), t);
            assert_eq!(t.as_str(), s);
        }
        assert!("BASIC".parse::<AssessmentType>().is_err());
        // Path parameters arrive lowercase from clients
        assert_eq!("core".parse::<AssessmentType>().unwrap(), AssessmentType::Core);
    }

    #[test]
    fn monitoring_frequencies_match_cadence() {
        assert_eq!(MonitoringType::Quarterly.frequency_days(), 90);
        assert_eq!(MonitoringType::SemiAnnual.frequency_days(), 180);
        assert_eq!(MonitoringType::Annual.frequency_days(), 365);
    }

    #[test]
    fn submission_ignores_unknown_fields_and_parses_camel_case() {
        let body = serde_json::json!({
            "leadId": 7,
            "assessmentType": "CORE",
            "industry": "Technology",
            "responses": {"1": 3, "2": 4},
            "overallScore": 99,
            "dimensionScores": {"Data & Analytics": 99}
        });
        let sub: AssessmentSubmission = serde_json::from_value(body).unwrap();
        assert_eq!(sub.lead_id, 7);
        assert_eq!(sub.assessment_type, AssessmentType::Core);
        assert_eq!(sub.responses.get("2"), Some(&4));
    }
}
