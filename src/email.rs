//! Outbound email delivery for admin notifications and reminders.
//!
//! Three interchangeable providers (SendGrid, Resend, generic webhook)
//! selected by configuration. Dispatch is enum-based; all providers post
//! JSON via reqwest and treat any non-success status as a failure. Bodies
//! are plain text.

use crate::config::Config;
use crate::errors::AppError;
use crate::models::DimensionScores;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::json;

/// Context for the admin "assessment completed" notification.
#[derive(Debug, Clone)]
pub struct AssessmentEmailData {
    pub contact_name: String,
    pub email: String,
    pub company_name: String,
    pub industry: String,
    pub job_title: Option<String>,
    pub phone_number: Option<String>,
    pub assessment_type: String,
    pub overall_score: i32,
    pub dimension_scores: DimensionScores,
    pub completed_at: DateTime<Utc>,
}

/// Configured delivery backend.
#[derive(Debug, Clone)]
enum Provider {
    SendGrid { api_key: String, base_url: String },
    Resend { api_key: String, base_url: String },
    Webhook { url: String },
}

pub struct EmailService {
    client: Client,
    provider: Provider,
    from: String,
}

impl EmailService {
    /// Builds the service from config; `None` when no provider is set.
    ///
    /// `email_api_base` overrides the provider default base URL, which is
    /// how the mocked integration tests point delivery at a local server.
    pub fn from_config(config: &Config) -> Option<Self> {
        let provider = match config.email_provider.as_deref()? {
            "sendgrid" => Provider::SendGrid {
                api_key: config.email_api_key.clone()?,
                base_url: config
                    .email_api_base
                    .clone()
                    .unwrap_or_else(|| "https://api.sendgrid.com".to_string()),
            },
            "resend" => Provider::Resend {
                api_key: config.email_api_key.clone()?,
                base_url: config
                    .email_api_base
                    .clone()
                    .unwrap_or_else(|| "https://api.resend.com".to_string()),
            },
            "webhook" => Provider::Webhook {
                url: config.email_webhook_url.clone()?,
            },
            other => {
                tracing::error!("Unsupported email provider: {}", other);
                return None;
            }
        };

        Some(Self {
            client: Client::new(),
            provider,
            from: config.email_from.clone(),
        })
    }

    /// Sends a plain-text message through the configured provider.
    pub async fn send_message(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), AppError> {
        match &self.provider {
            Provider::SendGrid { api_key, base_url } => {
                let response = self
                    .client
                    .post(format!("{}/v3/mail/send", base_url))
                    .bearer_auth(api_key)
                    .json(&json!({
                        "personalizations": [{
                            "to": [{ "email": to }],
                            "subject": subject
                        }],
                        "from": {
                            "email": self.from,
                            "name": "SAFE-8 Assessment System"
                        },
                        "content": [{
                            "type": "text/plain",
                            "value": body
                        }]
                    }))
                    .send()
                    .await
                    .map_err(|e| {
                        AppError::ExternalApiError(format!("SendGrid request failed: {}", e))
                    })?;

                if !response.status().is_success() {
                    return Err(AppError::ExternalApiError(format!(
                        "SendGrid returned status {}",
                        response.status()
                    )));
                }
            }
            Provider::Resend { api_key, base_url } => {
                let response = self
                    .client
                    .post(format!("{}/emails", base_url))
                    .bearer_auth(api_key)
                    .json(&json!({
                        "from": format!("SAFE-8 <{}>", self.from),
                        "to": [to],
                        "subject": subject,
                        "text": body
                    }))
                    .send()
                    .await
                    .map_err(|e| {
                        AppError::ExternalApiError(format!("Resend request failed: {}", e))
                    })?;

                if !response.status().is_success() {
                    return Err(AppError::ExternalApiError(format!(
                        "Resend returned status {}",
                        response.status()
                    )));
                }
            }
            Provider::Webhook { url } => {
                let response = self
                    .client
                    .post(url)
                    .json(&json!({
                        "type": "email_message",
                        "timestamp": Utc::now().to_rfc3339(),
                        "data": {
                            "to": to,
                            "from": self.from,
                            "subject": subject,
                            "body": body
                        }
                    }))
                    .send()
                    .await
                    .map_err(|e| {
                        AppError::ExternalApiError(format!("Webhook request failed: {}", e))
                    })?;

                if !response.status().is_success() {
                    return Err(AppError::ExternalApiError(format!(
                        "Webhook returned status {}",
                        response.status()
                    )));
                }
            }
        }

        tracing::info!("✓ Email sent to {} ({})", to, subject);
        Ok(())
    }

    /// Sends the admin notification for a completed assessment.
    pub async fn send_assessment_notification(
        &self,
        admin_email: &str,
        data: &AssessmentEmailData,
    ) -> Result<(), AppError> {
        let subject = format!(
            "New SAFE-8 Assessment Completed - {}",
            data.company_name
        );
        let body = render_assessment_summary(data);
        self.send_message(admin_email, &subject, &body).await
    }
}

/// Plain-text admin summary of a completed assessment.
pub fn render_assessment_summary(data: &AssessmentEmailData) -> String {
    let mut lines = vec![
        "New SAFE-8 Assessment Completed".to_string(),
        String::new(),
        format!("Overall AI Readiness: {}%", data.overall_score),
        String::new(),
        "Contact Information".to_string(),
        format!("  Name: {}", data.contact_name),
        format!("  Company: {}", data.company_name),
        format!("  Industry: {}", data.industry),
        format!("  Email: {}", data.email),
    ];

    if let Some(ref title) = data.job_title {
        lines.push(format!("  Job Title: {}", title));
    }
    if let Some(ref phone) = data.phone_number {
        lines.push(format!("  Phone: {}", phone));
    }

    lines.push(String::new());
    lines.push("SAFE-8 Dimension Scores".to_string());
    for (dimension, score) in &data.dimension_scores {
        lines.push(format!("  {}: {}%", dimension, score));
    }

    lines.push(String::new());
    lines.push(format!("Assessment Type: {}", data.assessment_type));
    lines.push(format!(
        "Completed: {}",
        data.completed_at.format("%Y-%m-%d %H:%M UTC")
    ));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data() -> AssessmentEmailData {
        AssessmentEmailData {
            contact_name: "Jane Smith".to_string(),
            email: "jane@acme.example".to_string(),
            company_name: "Acme Ltd".to_string(),
            industry: "Manufacturing".to_string(),
            job_title: Some("COO".to_string()),
            phone_number: None,
            assessment_type: "ADVANCED".to_string(),
            overall_score: 62,
            dimension_scores: [("Data & Analytics".to_string(), 55)].into_iter().collect(),
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn summary_includes_scores_and_contact() {
        let body = render_assessment_summary(&sample_data());
        assert!(body.contains("Overall AI Readiness: 62%"));
        assert!(body.contains("Company: Acme Ltd"));
        assert!(body.contains("Job Title: COO"));
        assert!(!body.contains("Phone:")); // Omitted when absent
        assert!(body.contains("Data & Analytics: 55%"));
        assert!(body.contains("Assessment Type: ADVANCED"));
    }

    #[test]
    fn from_config_requires_provider_credentials() {
        let config = Config {
            database_url: "postgresql://test".to_string(),
            port: 3000,
            admin_email: "admin@example.com".to_string(),
            email_provider: Some("sendgrid".to_string()),
            email_api_key: None,
            email_api_base: None,
            email_from: "safe8@example.com".to_string(),
            email_webhook_url: None,
            openai_api_key: None,
            openai_base_url: "https://api.openai.com".to_string(),
            assessment_url: "https://safe8.example.com".to_string(),
        };
        assert!(EmailService::from_config(&config).is_none());

        let config = Config {
            email_provider: None,
            ..config
        };
        assert!(EmailService::from_config(&config).is_none());
    }
}
