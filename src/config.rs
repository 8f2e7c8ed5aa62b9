use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Inbox that receives "assessment completed" notifications.
    pub admin_email: String,
    /// Email provider selector: "sendgrid", "resend" or "webhook".
    /// When unset, queued notifications stay PENDING until dispatched manually.
    pub email_provider: Option<String>,
    pub email_api_key: Option<String>,
    /// Override for the provider API base URL (used by tests to point at mocks).
    pub email_api_base: Option<String>,
    pub email_from: String,
    /// Target URL for the "webhook" provider (e.g. an Azure Logic Apps trigger).
    pub email_webhook_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    /// Public URL of the assessment front end, embedded in reminder messages.
    pub assessment_url: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DB_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("DB_URL or DATABASE_URL environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DB_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DB_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            admin_email: std::env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "advisory@example.com".to_string()),
            email_provider: std::env::var("EMAIL_PROVIDER")
                .ok()
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .map(|p| {
                    if p == "sendgrid" || p == "resend" || p == "webhook" {
                        Ok(p)
                    } else {
                        Err(anyhow::anyhow!(
                            "EMAIL_PROVIDER must be one of: sendgrid, resend, webhook"
                        ))
                    }
                })
                .transpose()?,
            email_api_key: std::env::var("EMAIL_API_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            email_api_base: std::env::var("EMAIL_API_BASE")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            email_from: std::env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "safe8@example.com".to_string()),
            email_webhook_url: std::env::var("EMAIL_WEBHOOK_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|url| {
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("EMAIL_WEBHOOK_URL must start with http:// or https://");
                    }
                    Ok(url)
                })
                .transpose()?,
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            assessment_url: std::env::var("ASSESSMENT_URL")
                .unwrap_or_else(|_| "https://safe8.example.com".to_string()),
        };

        // Provider selection without credentials is a config mistake, fail fast
        if let Some(ref provider) = config.email_provider {
            match provider.as_str() {
                "webhook" => {
                    if config.email_webhook_url.is_none() {
                        anyhow::bail!("EMAIL_WEBHOOK_URL required when EMAIL_PROVIDER=webhook");
                    }
                }
                _ => {
                    if config.email_api_key.is_none() {
                        anyhow::bail!(
                            "EMAIL_API_KEY required when EMAIL_PROVIDER={}",
                            provider
                        );
                    }
                }
            }
        }

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL: {}...",
            &config.database_url[..20.min(config.database_url.len())]
        );
        tracing::debug!("Server Port: {}", config.port);
        tracing::debug!("Admin email: {}", config.admin_email);
        if let Some(ref provider) = config.email_provider {
            tracing::info!("Email provider configured: {}", provider);
        } else {
            tracing::warn!("No email provider configured, notifications will stay queued");
        }
        if config.openai_api_key.is_some() {
            tracing::info!("OpenAI key present, personalized insights enabled");
        }

        Ok(config)
    }
}
