//! SAFE-8 AI Readiness Assessment API Library
//!
//! Core functionality for the SAFE-8 assessment platform: lead capture,
//! server-side questionnaire scoring against industry benchmarks,
//! insight generation (rule-based and LLM-assisted), BANT-style lead
//! qualification, consultation booking and continuous re-assessment
//! monitoring.
//!
//! # Modules
//!
//! - `ai_insights`: Personalized insight generation with LLM fallback.
//! - `circuit_breaker`: Circuit breaker for the LLM integration.
//! - `config`: Configuration management.
//! - `consultation`: Consultation booking and suggestion heuristics.
//! - `db`: Database connection and pool management.
//! - `dispatch`: Delivery pass over queued notifications.
//! - `email`: Outbound email providers.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `insights`: Rule-based insight generation.
//! - `lead_scoring`: BANT-style lead qualification.
//! - `models`: Core data models.
//! - `monitoring`: Re-assessment schedules and reminders.
//! - `scoring`: Dimension and overall score computation.
//! - `storage`: Database storage operations.
//! - `validation`: Input validation helpers.

pub mod ai_insights;
pub mod circuit_breaker;
pub mod config;
pub mod consultation;
pub mod db;
pub mod dispatch;
pub mod email;
pub mod errors;
pub mod handlers;
pub mod insights;
pub mod lead_scoring;
pub mod models;
pub mod monitoring;
pub mod scoring;
pub mod storage;
pub mod validation;
