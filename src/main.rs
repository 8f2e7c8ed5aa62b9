mod ai_insights;
mod circuit_breaker;
mod config;
mod consultation;
mod db;
mod dispatch;
mod email;
mod errors;
mod handlers;
mod insights;
mod lead_scoring;
mod models;
mod monitoring;
mod scoring;
mod storage;
mod validation;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::email::EmailService;

/// Serves the OpenAPI specification YAML file.
///
/// # Returns
///
/// * `impl IntoResponse` - The HTTP response containing the OpenAPI YAML content or an error message.
async fn serve_openapi_spec() -> impl IntoResponse {
    match tokio::fs::read_to_string("openapi.yml").await {
        Ok(content) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/yaml")],
            content,
        )
            .into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "OpenAPI spec not found").into_response(),
    }
}

/// Serves the Swagger UI HTML page, configured to load the spec from
/// `serve_openapi_spec`.
async fn serve_swagger_ui() -> impl IntoResponse {
    let html = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>SAFE-8 API - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        body { margin: 0; padding: 0; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = function() {
            window.ui = SwaggerUIBundle({
                url: "/api-docs/openapi.yml",
                dom_id: '#swagger-ui',
                deepLinking: true,
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout"
            });
        };
    </script>
</body>
</html>
"#;
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
}

/// Main entry point for the application.
///
/// Initializes logging, configuration, the database pool, catalog
/// caches and the email service, then starts the Axum server.
///
/// # Returns
///
/// * `anyhow::Result<()>` - Ok if the server runs successfully, or an error if initialization fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "safe8_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize database connection pool and run pending migrations
    let db = Database::new(&config.database_url).await?;
    tracing::info!("Database connection pool established");

    // Question catalog cache (1 hour TTL). The catalog only changes via
    // migrations, so staleness is bounded by deploys anyway.
    let question_cache = Cache::builder()
        .time_to_live(Duration::from_secs(3600))
        .max_capacity(16)
        .build();

    // Benchmark cache, keyed by industry (1 hour TTL)
    let benchmark_cache = Cache::builder()
        .time_to_live(Duration::from_secs(3600))
        .max_capacity(256)
        .build();
    tracing::info!("Catalog caches initialized (1h TTL)");

    // Email delivery is optional: without a provider, notifications
    // stay queued and the dispatch endpoint reports a config error
    let email = EmailService::from_config(&config).map(Arc::new);
    if email.is_some() {
        tracing::info!("✓ Email service initialized");
    }

    let app_state = Arc::new(handlers::AppState {
        db: db.pool.clone(),
        config: config.clone(),
        email,
        question_cache,
        benchmark_cache,
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    // Build protected routes with security layers
    let protected_routes = Router::new()
        // API Documentation
        .route("/docs", get(serve_swagger_ui))
        .route("/api-docs/openapi.yml", get(serve_openapi_spec))
        // Questionnaire + lead capture
        .route("/api/v1/questions/:type", get(handlers::get_questions))
        .route("/api/v1/leads", post(handlers::create_lead))
        .route("/api/v1/assessments", post(handlers::submit_assessment))
        .route("/api/v1/assessments/:id", get(handlers::get_assessment))
        .route(
            "/api/v1/assessments/:id/personalized",
            get(handlers::get_personalized_insights),
        )
        // Admin dashboard
        .route("/api/v1/admin/leads", get(handlers::admin_leads))
        .route(
            "/api/v1/admin/leads/scored",
            get(handlers::admin_scored_leads),
        )
        .route("/api/v1/admin/analytics", get(handlers::admin_analytics))
        // Consultation booking
        .route(
            "/api/v1/consultations",
            post(handlers::create_consultation),
        )
        .route(
            "/api/v1/consultations/slots",
            get(handlers::get_consultation_slots),
        )
        .route(
            "/api/v1/consultations/pending",
            get(handlers::get_pending_consultations),
        )
        .route(
            "/api/v1/consultations/suggest",
            post(handlers::suggest_consultation),
        )
        .route(
            "/api/v1/consultations/:id/confirm",
            post(handlers::confirm_consultation),
        )
        .route(
            "/api/v1/consultations/:id/notes",
            post(handlers::update_consultation_notes),
        )
        .route(
            "/api/v1/leads/:id/consultations",
            get(handlers::get_lead_consultations),
        )
        // Continuous monitoring
        .route(
            "/api/v1/monitoring",
            post(handlers::create_monitoring).get(handlers::get_active_monitoring),
        )
        .route("/api/v1/monitoring/due", get(handlers::get_due_monitoring))
        .route(
            "/api/v1/monitoring/stats",
            get(handlers::get_monitoring_stats),
        )
        .route(
            "/api/v1/monitoring/notifications/pending",
            get(handlers::get_pending_reminders),
        )
        .route(
            "/api/v1/monitoring/:id/pause",
            post(handlers::pause_monitoring),
        )
        .route(
            "/api/v1/monitoring/:id/resume",
            post(handlers::resume_monitoring),
        )
        .route(
            "/api/v1/monitoring/:id/complete",
            post(handlers::complete_monitoring_cycle),
        )
        .route(
            "/api/v1/notifications/dispatch",
            post(handlers::dispatch_notifications),
        )
        .layer(
            ServiceBuilder::new()
                // Request size limit: 1MB max payload (prevents memory exhaustion)
                .layer(RequestBodyLimitLayer::new(1024 * 1024))
                // Rate limiting: 10 req/sec per IP, burst of 20
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Build final app with health check (bypasses rate limiting)
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
