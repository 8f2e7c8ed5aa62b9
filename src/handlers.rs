use crate::ai_insights::{engine_from_config, AssessmentContext};
use crate::config::Config;
use crate::consultation::{self, ConsultationService};
use crate::dispatch;
use crate::email::EmailService;
use crate::errors::AppError;
use crate::insights::generate_insights;
use crate::lead_scoring::{self, LeadProfile};
use crate::models::*;
use crate::monitoring::MonitoringService;
use crate::scoring::{adoption_phase, calculate_dimension_scores, calculate_overall_score};
use crate::storage::AssessmentStorage;
use crate::validation::{is_valid_email, is_valid_likert};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use moka::future::Cache;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Application configuration.
    pub config: Config,
    /// Outbound email delivery, when a provider is configured.
    pub email: Option<Arc<EmailService>>,
    /// Question catalog cache, keyed by assessment type. The catalog
    /// changes only via migrations so a long TTL is safe.
    pub question_cache: Cache<String, Vec<AssessmentQuestion>>,
    /// Benchmark cache, keyed by industry.
    pub benchmark_cache: Cache<String, Vec<IndustryBenchmark>>,
}

/// Health check endpoint.
///
/// # Returns
///
/// * `(StatusCode, Json<serde_json::Value>)` - HTTP 200 OK with health status JSON.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "safe8-api",
            "version": "0.1.0"
        })),
    )
}

/// GET /api/v1/questions/:type
///
/// Active catalog questions for one assessment tier, in display order.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `assessment_type` - CORE, ADVANCED or FRONTIER (case-insensitive).
pub async fn get_questions(
    State(state): State<Arc<AppState>>,
    Path(assessment_type): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("GET /questions/{}", assessment_type);

    let assessment_type: AssessmentType = assessment_type
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid assessment type".to_string()))?;

    let questions = cached_questions(&state, assessment_type).await?;
    Ok(Json(json!({ "questions": questions })))
}

/// POST /api/v1/leads
///
/// Creates or updates a lead keyed by email.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `lead` - The lead-capture payload.
///
/// # Returns
///
/// * `Result<Json<LeadResponse>, AppError>` - The lead id and outcome message.
pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    Json(lead): Json<LeadRequest>,
) -> Result<Json<LeadResponse>, AppError> {
    tracing::info!("POST /leads - {} ({})", lead.company_name, lead.email);

    if !is_valid_email(&lead.email) {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    if lead.company_name.trim().is_empty() || lead.contact_name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "companyName and contactName are required".to_string(),
        ));
    }

    let storage = AssessmentStorage::new(state.db.clone());
    let (lead_id, created) = storage.upsert_lead(&lead).await?;

    Ok(Json(LeadResponse {
        lead_id,
        message: if created {
            "Lead created successfully".to_string()
        } else {
            "Lead updated successfully".to_string()
        },
    }))
}

/// POST /api/v1/assessments
///
/// Persists a completed questionnaire. Scores are always recomputed
/// server-side from the raw responses; any client-sent scores are
/// ignored. Queues the admin notification and, when the lead has an
/// active monitoring schedule, closes its current cycle.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `submission` - The assessment payload.
///
/// # Returns
///
/// * `Result<Json<AssessmentResponse>, AppError>` - Computed scores, insights and benchmarks.
pub async fn submit_assessment(
    State(state): State<Arc<AppState>>,
    Json(submission): Json<AssessmentSubmission>,
) -> Result<Json<AssessmentResponse>, AppError> {
    tracing::info!(
        "POST /assessments - lead {} type {}",
        submission.lead_id,
        submission.assessment_type.as_str()
    );

    for (question_id, &response) in &submission.responses {
        if !is_valid_likert(response) {
            return Err(AppError::BadRequest(format!(
                "Response for question {} must be between 0 and 4",
                question_id
            )));
        }
    }

    let storage = AssessmentStorage::new(state.db.clone());
    if storage.get_lead(submission.lead_id).await?.is_none() {
        return Err(AppError::BadRequest(format!(
            "Unknown leadId {}",
            submission.lead_id
        )));
    }

    let questions = cached_questions(&state, submission.assessment_type).await?;
    if questions.is_empty() {
        return Err(AppError::BadRequest(
            "No active questions for this assessment type".to_string(),
        ));
    }

    let dimension_scores = calculate_dimension_scores(&submission.responses, &questions);
    let overall_score = calculate_overall_score(&dimension_scores);
    let benchmarks = cached_benchmarks(&state, &submission.industry).await?;
    let insights = generate_insights(&dimension_scores, &submission.industry, &benchmarks);

    let assessment_id = storage
        .insert_assessment(&submission, overall_score, &dimension_scores, &insights)
        .await?;
    storage
        .queue_admin_notification(assessment_id, &state.config.admin_email)
        .await?;

    // A follow-up assessment rolls the lead's monitoring cycle forward
    let monitoring =
        MonitoringService::new(state.db.clone(), state.config.assessment_url.clone());
    if let Some(schedule) = monitoring
        .find_active_schedule_for_lead(submission.lead_id)
        .await?
    {
        monitoring
            .complete_assessment_cycle(schedule.id, assessment_id)
            .await?;
    }

    tracing::info!(
        "✓ Assessment {} stored for lead {}: overall {}%",
        assessment_id,
        submission.lead_id,
        overall_score
    );

    Ok(Json(AssessmentResponse {
        assessment_id,
        overall_score,
        dimension_scores,
        insights,
        benchmarks,
    }))
}

/// GET /api/v1/assessments/:id
///
/// Full assessment result joined with lead identity and the industry
/// benchmarks it was scored against.
pub async fn get_assessment(
    State(state): State<Arc<AppState>>,
    Path(assessment_id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("GET /assessments/{}", assessment_id);

    let storage = AssessmentStorage::new(state.db.clone());
    let assessment = storage
        .get_assessment_with_lead(assessment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Assessment {} not found", assessment_id)))?;

    let benchmarks = cached_benchmarks(&state, &assessment.industry).await?;

    let mut body = json!(assessment);
    body["benchmarks"] = json!(benchmarks);
    body["adoptionPhase"] = json!(adoption_phase(assessment.overall_score));
    Ok(Json(body))
}

/// GET /api/v1/assessments/:id/personalized
///
/// Personalized insights for an assessment, LLM-generated when an API
/// key is configured and static otherwise.
pub async fn get_personalized_insights(
    State(state): State<Arc<AppState>>,
    Path(assessment_id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("GET /assessments/{}/personalized", assessment_id);

    let storage = AssessmentStorage::new(state.db.clone());
    let assessment = storage
        .get_assessment_with_lead(assessment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Assessment {} not found", assessment_id)))?;
    let lead = storage
        .get_lead(assessment.lead_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Lead {} not found", assessment.lead_id)))?;

    let dimension_scores: DimensionScores =
        serde_json::from_value(assessment.dimension_scores.clone()).unwrap_or_default();
    let benchmarks = cached_benchmarks(&state, &assessment.industry).await?;

    let context = AssessmentContext {
        dimension_scores,
        industry: assessment.industry.clone(),
        company_size: lead.company_size,
        job_title: lead.job_title,
        overall_score: assessment.overall_score,
        benchmarks,
    };

    let engine = engine_from_config(&state.config);
    let insights = engine.generate_personalized_insights(&context).await;

    Ok(Json(json!({
        "assessmentId": assessment_id,
        "overallScore": assessment.overall_score,
        "insights": insights,
    })))
}

/// GET /api/v1/admin/leads
pub async fn admin_leads(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("GET /admin/leads");

    let storage = AssessmentStorage::new(state.db.clone());
    let leads = storage.admin_leads().await?;
    Ok(Json(json!({ "leads": leads })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredLeadsParams {
    pub limit: Option<i64>,
}

/// GET /api/v1/admin/leads/scored
///
/// Recent assessed leads run through the BANT-style scoring heuristic,
/// hottest first.
pub async fn admin_scored_leads(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ScoredLeadsParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("GET /admin/leads/scored");

    let limit = params.limit.unwrap_or(50).clamp(1, 200);
    let storage = AssessmentStorage::new(state.db.clone());
    let rows = storage.latest_assessed_leads(limit).await?;
    let now = Utc::now();

    let mut scored: Vec<serde_json::Value> = rows
        .into_iter()
        .map(|row| {
            let dimension_scores: DimensionScores =
                serde_json::from_value(row.dimension_scores.clone()).unwrap_or_default();
            let profile = LeadProfile {
                job_title: row.job_title.clone(),
                industry: row.industry.clone(),
                company_size: row.company_size.clone(),
                overall_score: row.overall_score,
                dimension_scores,
                assessment_type: row.assessment_type.clone(),
                completed_at: row.completed_at,
            };
            let score = lead_scoring::calculate_lead_score(&profile, now);
            json!({
                "lead": row,
                "score": score,
                "summary": lead_scoring::qualification_summary(&score),
                "nextAction": lead_scoring::next_action(&score),
            })
        })
        .collect();

    scored.sort_by_key(|entry| {
        -entry["score"]["totalScore"].as_i64().unwrap_or(0)
    });

    Ok(Json(json!({ "leads": scored })))
}

/// GET /api/v1/admin/analytics
pub async fn admin_analytics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("GET /admin/analytics");

    let storage = AssessmentStorage::new(state.db.clone());
    let analytics = storage.admin_analytics().await?;
    Ok(Json(analytics))
}

// ============ Consultations ============

/// POST /api/v1/consultations
pub async fn create_consultation(
    State(state): State<Arc<AppState>>,
    Json(booking): Json<BookingRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    tracing::info!(
        "POST /consultations - lead {} type {}",
        booking.lead_id,
        booking.consultation_type
    );

    if !matches!(
        booking.consultation_type.as_str(),
        "STRATEGY" | "TECHNICAL" | "IMPLEMENTATION"
    ) {
        return Err(AppError::BadRequest(
            "consultationType must be STRATEGY, TECHNICAL or IMPLEMENTATION".to_string(),
        ));
    }

    let storage = AssessmentStorage::new(state.db.clone());
    if storage.get_lead(booking.lead_id).await?.is_none() {
        return Err(AppError::BadRequest(format!(
            "Unknown leadId {}",
            booking.lead_id
        )));
    }

    let service = ConsultationService::new(state.db.clone());
    let booking_id = service.create_booking(&booking).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "bookingId": booking_id, "status": "PENDING" })),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotParams {
    pub specialization: Option<String>,
    pub date: Option<NaiveDate>,
}

/// GET /api/v1/consultations/slots
pub async fn get_consultation_slots(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SlotParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("GET /consultations/slots - {:?}", params);

    let service = ConsultationService::new(state.db.clone());
    let slots = service
        .get_available_slots(params.specialization.as_deref(), params.date)
        .await?;
    Ok(Json(json!({ "slots": slots })))
}

/// GET /api/v1/consultations/pending
pub async fn get_pending_consultations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("GET /consultations/pending");

    let service = ConsultationService::new(state.db.clone());
    let bookings = service.get_pending_bookings().await?;
    Ok(Json(json!({ "bookings": bookings })))
}

/// POST /api/v1/consultations/:id/confirm
///
/// Confirms a booking. A calendar event id is generated when the
/// client doesn't supply one.
pub async fn confirm_consultation(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<i64>,
    Json(payload): Json<ConfirmBookingRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("POST /consultations/{}/confirm", booking_id);

    let calendar_event_id = payload
        .calendar_event_id
        .unwrap_or_else(|| format!("evt-{}", Uuid::new_v4()));

    let service = ConsultationService::new(state.db.clone());
    service
        .confirm_booking(booking_id, Some(&calendar_event_id))
        .await?;

    Ok(Json(json!({
        "bookingId": booking_id,
        "status": "CONFIRMED",
        "calendarEventId": calendar_event_id,
    })))
}

/// POST /api/v1/consultations/:id/notes
pub async fn update_consultation_notes(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<i64>,
    Json(payload): Json<BookingNotesRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("POST /consultations/{}/notes", booking_id);

    let service = ConsultationService::new(state.db.clone());
    service
        .update_booking_notes(
            booking_id,
            &payload.notes,
            payload.follow_up_actions.as_deref(),
        )
        .await?;

    Ok(Json(json!({ "bookingId": booking_id, "updated": true })))
}

/// GET /api/v1/leads/:id/consultations
pub async fn get_lead_consultations(
    State(state): State<Arc<AppState>>,
    Path(lead_id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("GET /leads/{}/consultations", lead_id);

    let service = ConsultationService::new(state.db.clone());
    let bookings = service.get_bookings_by_lead(lead_id).await?;
    Ok(Json(json!({ "bookings": bookings })))
}

/// POST /api/v1/consultations/suggest
///
/// Pure heuristic, no persistence: maps assessment results to the
/// consultation type worth pitching.
pub async fn suggest_consultation(
    Json(payload): Json<SuggestConsultationRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let suggestion = consultation::suggest_consultation_type(
        payload.overall_score,
        &payload.dimension_scores,
    );
    Ok(Json(json!(suggestion)))
}

// ============ Monitoring ============

/// POST /api/v1/monitoring
pub async fn create_monitoring(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MonitoringRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let monitoring_type = request.monitoring_type.unwrap_or(MonitoringType::Quarterly);
    tracing::info!(
        "POST /monitoring - lead {} assessment {} ({})",
        request.lead_id,
        request.assessment_id,
        monitoring_type.as_str()
    );

    let storage = AssessmentStorage::new(state.db.clone());
    if storage.get_lead(request.lead_id).await?.is_none() {
        return Err(AppError::BadRequest(format!(
            "Unknown leadId {}",
            request.lead_id
        )));
    }

    let service = MonitoringService::new(state.db.clone(), state.config.assessment_url.clone());
    let schedule_id = service
        .create_monitoring_schedule(request.lead_id, request.assessment_id, monitoring_type)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "scheduleId": schedule_id, "status": "ACTIVE" })),
    ))
}

/// GET /api/v1/monitoring
pub async fn get_active_monitoring(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("GET /monitoring");

    let service = MonitoringService::new(state.db.clone(), state.config.assessment_url.clone());
    let schedules = service.get_active_schedules().await?;
    Ok(Json(json!({ "schedules": schedules })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DueParams {
    pub days_ahead: Option<i64>,
}

/// GET /api/v1/monitoring/due
pub async fn get_due_monitoring(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DueParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("GET /monitoring/due");

    let days_ahead = params.days_ahead.unwrap_or(30).clamp(0, 365);
    let service = MonitoringService::new(state.db.clone(), state.config.assessment_url.clone());
    let due = service.get_due_assessments(days_ahead).await?;
    Ok(Json(json!({ "due": due })))
}

/// GET /api/v1/monitoring/stats
pub async fn get_monitoring_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("GET /monitoring/stats");

    let service = MonitoringService::new(state.db.clone(), state.config.assessment_url.clone());
    let stats = service.get_monitoring_stats().await?;
    Ok(Json(json!(stats)))
}

/// GET /api/v1/monitoring/notifications/pending
pub async fn get_pending_reminders(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("GET /monitoring/notifications/pending");

    let service = MonitoringService::new(state.db.clone(), state.config.assessment_url.clone());
    let pending = service.get_pending_notifications().await?;
    Ok(Json(json!({ "notifications": pending })))
}

/// POST /api/v1/monitoring/:id/pause
pub async fn pause_monitoring(
    State(state): State<Arc<AppState>>,
    Path(schedule_id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("POST /monitoring/{}/pause", schedule_id);

    let service = MonitoringService::new(state.db.clone(), state.config.assessment_url.clone());
    service.pause_monitoring(schedule_id).await?;
    Ok(Json(json!({ "scheduleId": schedule_id, "status": "PAUSED" })))
}

/// POST /api/v1/monitoring/:id/resume
pub async fn resume_monitoring(
    State(state): State<Arc<AppState>>,
    Path(schedule_id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("POST /monitoring/{}/resume", schedule_id);

    let service = MonitoringService::new(state.db.clone(), state.config.assessment_url.clone());
    service.resume_monitoring(schedule_id).await?;
    Ok(Json(json!({ "scheduleId": schedule_id, "status": "ACTIVE" })))
}

/// POST /api/v1/monitoring/:id/complete
///
/// Closes the current cycle with a follow-up assessment and rolls the
/// schedule forward.
pub async fn complete_monitoring_cycle(
    State(state): State<Arc<AppState>>,
    Path(schedule_id): Path<i64>,
    Json(payload): Json<CompleteCycleRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("POST /monitoring/{}/complete", schedule_id);

    let service = MonitoringService::new(state.db.clone(), state.config.assessment_url.clone());
    let next_due = service
        .complete_assessment_cycle(schedule_id, payload.new_assessment_id)
        .await?;

    Ok(Json(json!({
        "scheduleId": schedule_id,
        "nextAssessmentDue": next_due,
    })))
}

/// POST /api/v1/notifications/dispatch
///
/// Runs one delivery pass over queued admin notifications and due
/// reminders. Fails when no email provider is configured.
pub async fn dispatch_notifications(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("POST /notifications/dispatch");

    let email = state.email.as_ref().ok_or_else(|| {
        AppError::BadRequest("No email provider configured".to_string())
    })?;

    let summary = dispatch::dispatch_pending(
        &state.db,
        email,
        &state.config.admin_email,
        &state.config.assessment_url,
    )
    .await?;

    Ok(Json(json!(summary)))
}

// ============ Cache helpers ============

async fn cached_questions(
    state: &AppState,
    assessment_type: AssessmentType,
) -> Result<Vec<AssessmentQuestion>, AppError> {
    let key = assessment_type.as_str().to_string();
    if let Some(questions) = state.question_cache.get(&key).await {
        return Ok(questions);
    }

    let storage = AssessmentStorage::new(state.db.clone());
    let questions = storage.active_questions(assessment_type).await?;
    state.question_cache.insert(key, questions.clone()).await;
    Ok(questions)
}

async fn cached_benchmarks(
    state: &AppState,
    industry: &str,
) -> Result<Vec<IndustryBenchmark>, AppError> {
    if let Some(benchmarks) = state.benchmark_cache.get(industry).await {
        return Ok(benchmarks);
    }

    let storage = AssessmentStorage::new(state.db.clone());
    let benchmarks = storage.benchmarks_for_industry(industry).await?;
    state
        .benchmark_cache
        .insert(industry.to_string(), benchmarks.clone())
        .await;
    Ok(benchmarks)
}
