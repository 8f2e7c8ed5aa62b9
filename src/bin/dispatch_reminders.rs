//! One-shot dispatcher for queued notifications, intended for cron.
//!
//! Runs a single delivery pass over pending admin notifications and
//! monitoring reminders that have entered their send window, then
//! exits with a summary.

use safe8_api::config::Config;
use safe8_api::db::Database;
use safe8_api::dispatch::dispatch_pending;
use safe8_api::email::EmailService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    let Some(email) = EmailService::from_config(&config) else {
        anyhow::bail!("EMAIL_PROVIDER must be configured to dispatch notifications");
    };

    let db = Database::new(&config.database_url).await?;
    tracing::info!("Connected to database, starting dispatch pass");

    let summary = dispatch_pending(
        &db.pool,
        &email,
        &config.admin_email,
        &config.assessment_url,
    )
    .await?;

    tracing::info!(
        "Dispatch finished: {} admin notifications sent ({} failed), {} reminders sent ({} failed)",
        summary.admin_sent,
        summary.admin_failed,
        summary.reminders_sent,
        summary.reminders_failed
    );

    Ok(())
}
