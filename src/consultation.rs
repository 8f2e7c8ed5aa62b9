//! Expert consultation booking: slot lookup, booking lifecycle and the
//! score-driven consultation-type suggestion.

use crate::errors::AppError;
use crate::models::*;
use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;

/// Calendar event payload handed to whichever calendar integration the
/// deployment wires up. Carries everything needed to create the meeting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub summary: String,
    pub description: String,
    /// ISO date + "HH:MM" time when both were provided, else None.
    pub start: Option<String>,
    pub duration: i32,
    pub attendees: Vec<String>,
    pub timezone: String,
}

/// Result of the consultation-type suggestion heuristic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationSuggestion {
    pub recommended: &'static str,
    pub reason: &'static str,
    pub urgency: &'static str,
}

pub struct ConsultationService {
    pool: PgPool,
}

impl ConsultationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a booking in PENDING state, applying the documented
    /// defaults for everything the client left out.
    pub async fn create_booking(&self, booking: &BookingRequest) -> Result<i64, AppError> {
        let topic_focus = booking.topic_focus.as_ref().map(|topics| json!(topics));

        let booking_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO consultation_bookings (
                lead_id, assessment_id, consultation_type, preferred_date,
                preferred_time, timezone, consultation_duration, topic_focus,
                urgency_level, company_background, specific_challenges,
                meeting_preference
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            "#,
        )
        .bind(booking.lead_id)
        .bind(booking.assessment_id)
        .bind(&booking.consultation_type)
        .bind(booking.preferred_date)
        .bind(&booking.preferred_time)
        .bind(booking.timezone.as_deref().unwrap_or("UTC"))
        .bind(booking.consultation_duration.unwrap_or(60))
        .bind(topic_focus)
        .bind(booking.urgency_level.as_deref().unwrap_or("MEDIUM"))
        .bind(&booking.company_background)
        .bind(&booking.specific_challenges)
        .bind(booking.meeting_preference.as_deref().unwrap_or("VIRTUAL"))
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            "✓ Created consultation booking {} for lead {}",
            booking_id,
            booking.lead_id
        );
        Ok(booking_id)
    }

    /// Open slots with remaining capacity. Without an explicit start
    /// date the window covers the next 30 days.
    pub async fn get_available_slots(
        &self,
        specialization: Option<&str>,
        from_date: Option<NaiveDate>,
    ) -> Result<Vec<ConsultationSlot>, AppError> {
        let today = Utc::now().date_naive();
        let (start, end) = match from_date {
            Some(date) => (date, date + Duration::days(365)),
            None => (today, today + Duration::days(30)),
        };

        let slots = sqlx::query_as::<_, ConsultationSlot>(
            r#"
            SELECT * FROM consultation_availability
            WHERE is_available = TRUE
              AND current_bookings < max_bookings
              AND available_date >= $1 AND available_date <= $2
              AND ($3::text IS NULL OR specialization = $3)
            ORDER BY available_date, start_time
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(specialization)
        .fetch_all(&self.pool)
        .await?;

        Ok(slots)
    }

    /// Moves a booking to CONFIRMED and records the calendar event id.
    pub async fn confirm_booking(
        &self,
        booking_id: i64,
        calendar_event_id: Option<&str>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE consultation_bookings
            SET status = 'CONFIRMED',
                booking_confirmed_at = NOW(),
                calendar_event_id = $1,
                updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(calendar_event_id)
        .bind(booking_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Booking {} not found",
                booking_id
            )));
        }

        tracing::info!("✓ Confirmed consultation booking {}", booking_id);
        Ok(())
    }

    pub async fn get_bookings_by_lead(
        &self,
        lead_id: i64,
    ) -> Result<Vec<ConsultationBooking>, AppError> {
        let bookings = sqlx::query_as::<_, ConsultationBooking>(
            r#"
            SELECT * FROM consultation_bookings
            WHERE lead_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    /// Pending bookings for the admin queue, most urgent first. Urgency
    /// labels don't sort alphabetically so the ranking is explicit.
    pub async fn get_pending_bookings(&self) -> Result<Vec<PendingBookingRow>, AppError> {
        let bookings = sqlx::query_as::<_, PendingBookingRow>(
            r#"
            SELECT cb.id, cb.lead_id, cb.assessment_id, cb.consultation_type,
                   cb.preferred_date, cb.preferred_time, cb.timezone,
                   cb.consultation_duration, cb.topic_focus, cb.urgency_level,
                   cb.meeting_preference, cb.status, cb.created_at,
                   l.company_name, l.contact_name, l.email,
                   a.overall_score, a.assessment_type
            FROM consultation_bookings cb
            JOIN leads l ON cb.lead_id = l.id
            LEFT JOIN assessments a ON cb.assessment_id = a.id
            WHERE cb.status = 'PENDING'
            ORDER BY CASE cb.urgency_level
                         WHEN 'URGENT' THEN 0
                         WHEN 'HIGH' THEN 1
                         WHEN 'MEDIUM' THEN 2
                         ELSE 3
                     END,
                     cb.created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    /// Stores post-session consultant notes and follow-up actions.
    pub async fn update_booking_notes(
        &self,
        booking_id: i64,
        notes: &str,
        follow_up_actions: Option<&[String]>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE consultation_bookings
            SET consultant_notes = $1,
                follow_up_actions = $2,
                updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(notes)
        .bind(follow_up_actions.map(|actions| json!(actions)))
        .bind(booking_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Booking {} not found",
                booking_id
            )));
        }

        Ok(())
    }
}

/// Builds the calendar event payload for a booking.
pub fn generate_calendar_event(booking: &ConsultationBooking, lead: &Lead) -> CalendarEvent {
    let focus_areas = booking
        .topic_focus
        .as_ref()
        .and_then(|value| value.as_array())
        .map(|topics| {
            topics
                .iter()
                .filter_map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "General AI Readiness".to_string());

    let description = format!(
        "Expert Consultation Session\n\n\
         Company: {}\n\
         Contact: {} ({})\n\
         Type: {}\n\
         Duration: {} minutes\n\n\
         Focus Areas: {}\n\n\
         Company Background:\n{}\n\n\
         Specific Challenges:\n{}\n\n\
         Meeting Link: Will be provided upon confirmation",
        lead.company_name,
        lead.contact_name,
        lead.email,
        booking.consultation_type,
        booking.consultation_duration,
        focus_areas,
        booking.company_background.as_deref().unwrap_or("Not provided"),
        booking.specific_challenges.as_deref().unwrap_or("To be discussed"),
    );

    let start = match (&booking.preferred_date, &booking.preferred_time) {
        (Some(date), Some(time)) => Some(format!("{}T{}:00", date, time)),
        _ => None,
    };

    CalendarEvent {
        summary: format!("AI Readiness Consultation - {}", lead.company_name),
        description,
        start,
        duration: booking.consultation_duration,
        attendees: vec![lead.email.clone()],
        timezone: booking.timezone.clone(),
    }
}

/// Maps assessment results to the consultation type worth pitching.
///
/// Low overall scores call for strategy work; mid-range scores with
/// weak technical dimensions call for a technical session; strong
/// results get implementation guidance or optimization strategy.
pub fn suggest_consultation_type(
    overall_score: i32,
    dimension_scores: &DimensionScores,
) -> ConsultationSuggestion {
    let has_technical_gap = dimension_scores.iter().any(|(dimension, &score)| {
        score < 60 && (dimension.contains("Architecture") || dimension.contains("Data"))
    });

    if overall_score < 40 {
        ConsultationSuggestion {
            recommended: "STRATEGY",
            reason: "Low overall readiness requires strategic foundation planning",
            urgency: "URGENT",
        }
    } else if overall_score < 60 {
        if has_technical_gap {
            ConsultationSuggestion {
                recommended: "TECHNICAL",
                reason: "Technical infrastructure gaps identified",
                urgency: "HIGH",
            }
        } else {
            ConsultationSuggestion {
                recommended: "STRATEGY",
                reason: "Multiple readiness areas need strategic coordination",
                urgency: "HIGH",
            }
        }
    } else if overall_score < 80 {
        ConsultationSuggestion {
            recommended: "IMPLEMENTATION",
            reason: "Good foundation, ready for implementation guidance",
            urgency: "MEDIUM",
        }
    } else {
        ConsultationSuggestion {
            recommended: "STRATEGY",
            reason: "Advanced optimization and innovation opportunities",
            urgency: "LOW",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    fn scores(pairs: &[(&str, i32)]) -> DimensionScores {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn very_low_score_suggests_urgent_strategy() {
        let suggestion = suggest_consultation_type(35, &BTreeMap::new());
        assert_eq!(suggestion.recommended, "STRATEGY");
        assert_eq!(suggestion.urgency, "URGENT");
    }

    #[test]
    fn mid_score_with_weak_data_dimension_suggests_technical() {
        let dims = scores(&[("Data & Analytics", 45), ("Strategic Alignment", 70)]);
        let suggestion = suggest_consultation_type(55, &dims);
        assert_eq!(suggestion.recommended, "TECHNICAL");
        assert_eq!(suggestion.urgency, "HIGH");
    }

    #[test]
    fn mid_score_without_technical_gap_suggests_strategy() {
        let dims = scores(&[("Governance & Ethics", 50), ("Strategic Alignment", 52)]);
        let suggestion = suggest_consultation_type(55, &dims);
        assert_eq!(suggestion.recommended, "STRATEGY");
        assert_eq!(suggestion.urgency, "HIGH");
    }

    #[test]
    fn good_score_suggests_implementation() {
        let suggestion = suggest_consultation_type(72, &BTreeMap::new());
        assert_eq!(suggestion.recommended, "IMPLEMENTATION");
        assert_eq!(suggestion.urgency, "MEDIUM");
    }

    #[test]
    fn high_score_suggests_low_urgency_strategy() {
        let suggestion = suggest_consultation_type(85, &BTreeMap::new());
        assert_eq!(suggestion.recommended, "STRATEGY");
        assert_eq!(suggestion.urgency, "LOW");
    }

    #[test]
    fn calendar_event_carries_booking_context() {
        let lead = Lead {
            id: 1,
            email: "cto@acme.example".to_string(),
            company_name: "Acme Corp".to_string(),
            contact_name: "Sam Doe".to_string(),
            phone_number: None,
            job_title: Some("CTO".to_string()),
            industry: "Technology".to_string(),
            company_size: Some("51-200".to_string()),
            country: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap(),
            updated_at: None,
        };
        let booking = ConsultationBooking {
            id: 9,
            lead_id: 1,
            assessment_id: Some(4),
            consultation_type: "TECHNICAL".to_string(),
            preferred_date: Some(chrono::NaiveDate::from_ymd_opt(2026, 2, 10).unwrap()),
            preferred_time: Some("14:30".to_string()),
            timezone: "UTC".to_string(),
            consultation_duration: 60,
            topic_focus: Some(serde_json::json!(["Data pipelines", "MLOps"])),
            urgency_level: "HIGH".to_string(),
            company_background: None,
            specific_challenges: Some("Legacy data silos".to_string()),
            meeting_preference: "VIRTUAL".to_string(),
            status: "PENDING".to_string(),
            booking_confirmed_at: None,
            calendar_event_id: None,
            consultant_notes: None,
            follow_up_actions: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 20, 9, 0, 0).unwrap(),
            updated_at: None,
        };

        let event = generate_calendar_event(&booking, &lead);
        assert_eq!(event.summary, "AI Readiness Consultation - Acme Corp");
        assert_eq!(event.start.as_deref(), Some("2026-02-10T14:30:00"));
        assert!(event.description.contains("Data pipelines, MLOps"));
        assert!(event.description.contains("Legacy data silos"));
        assert_eq!(event.attendees, vec!["cto@acme.example".to_string()]);
    }
}
