/// Integration tests with mocked external APIs
/// Tests email delivery and personalized insight generation without
/// hitting real providers.
use safe8_api::ai_insights::{engine_from_config, AssessmentContext};
use safe8_api::config::Config;
use safe8_api::email::{AssessmentEmailData, EmailService};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper function to create test config
fn create_test_config() -> Config {
    Config {
        database_url: "postgresql://test".to_string(),
        port: 8080,
        admin_email: "advisory@example.com".to_string(),
        email_provider: None,
        email_api_key: None,
        email_api_base: None,
        email_from: "safe8@example.com".to_string(),
        email_webhook_url: None,
        openai_api_key: None,
        openai_base_url: "https://api.openai.com".to_string(),
        assessment_url: "https://safe8.example.com".to_string(),
    }
}

fn sample_email_data() -> AssessmentEmailData {
    AssessmentEmailData {
        contact_name: "Sam Doe".to_string(),
        email: "sam@acme.example".to_string(),
        company_name: "Acme Corp".to_string(),
        industry: "Technology".to_string(),
        job_title: Some("CTO".to_string()),
        phone_number: None,
        assessment_type: "CORE".to_string(),
        overall_score: 62,
        dimension_scores: [
            ("Data & Analytics".to_string(), 55),
            ("Strategic Alignment".to_string(), 70),
        ]
        .into_iter()
        .collect(),
        completed_at: chrono::Utc::now(),
    }
}

fn sample_context() -> AssessmentContext {
    AssessmentContext {
        dimension_scores: [
            ("Data & Analytics".to_string(), 45),
            ("Strategic Alignment".to_string(), 72),
            ("Workforce & Culture".to_string(), 58),
        ]
        .into_iter()
        .collect(),
        industry: "Technology".to_string(),
        company_size: Some("51-200".to_string()),
        job_title: Some("CTO".to_string()),
        overall_score: 58,
        benchmarks: vec![],
    }
}

#[tokio::test]
async fn test_sendgrid_delivery_posts_mail_send() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .and(header("authorization", "Bearer sg_test_key"))
        .and(body_partial_json(serde_json::json!({
            "from": { "email": "safe8@example.com" }
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = Config {
        email_provider: Some("sendgrid".to_string()),
        email_api_key: Some("sg_test_key".to_string()),
        email_api_base: Some(mock_server.uri()),
        ..create_test_config()
    };
    let service = EmailService::from_config(&config).unwrap();

    let result = service
        .send_assessment_notification("advisory@example.com", &sample_email_data())
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_resend_delivery_posts_emails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(header("authorization", "Bearer re_test_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "email_123"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = Config {
        email_provider: Some("resend".to_string()),
        email_api_key: Some("re_test_key".to_string()),
        email_api_base: Some(mock_server.uri()),
        ..create_test_config()
    };
    let service = EmailService::from_config(&config).unwrap();

    let result = service
        .send_message("sam@acme.example", "Subject", "Body")
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_webhook_delivery_wraps_message_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_partial_json(serde_json::json!({
            "type": "email_message",
            "data": {
                "to": "sam@acme.example",
                "subject": "Reminder"
            }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = Config {
        email_provider: Some("webhook".to_string()),
        email_webhook_url: Some(format!("{}/hook", mock_server.uri())),
        ..create_test_config()
    };
    let service = EmailService::from_config(&config).unwrap();

    let result = service
        .send_message("sam@acme.example", "Reminder", "Body text")
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_email_provider_error_surfaces_as_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let config = Config {
        email_provider: Some("sendgrid".to_string()),
        email_api_key: Some("bad_key".to_string()),
        email_api_base: Some(mock_server.uri()),
        ..create_test_config()
    };
    let service = EmailService::from_config(&config).unwrap();

    let result = service.send_message("to@example.com", "S", "B").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_openai_response_becomes_structured_insights() {
    let mock_server = MockServer::start().await;

    let ai_text = "Data & Analytics is your most critical gap and addressing data quality \
        should come first. Implement a data governance framework and establish ownership \
        for your core datasets over the next 6-12 months.\n\n\
        Strategic Alignment is a genuine strength for a company of your size. Leverage \
        executive sponsorship to accelerate the remaining dimensions and prioritize \
        quick wins that demonstrate measurable business value.";

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "content": ai_text } }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = Config {
        openai_api_key: Some("sk-test".to_string()),
        openai_base_url: mock_server.uri(),
        ..create_test_config()
    };
    let engine = engine_from_config(&config);

    let insights = engine.generate_personalized_insights(&sample_context()).await;
    assert_eq!(insights.len(), 2);
    assert_eq!(insights[0].dimension, "Data & Analytics");
    assert!(!insights[0].action_items.is_empty());
}

#[tokio::test]
async fn test_openai_failure_falls_back_to_static_insights() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let config = Config {
        openai_api_key: Some("sk-test".to_string()),
        openai_base_url: mock_server.uri(),
        ..create_test_config()
    };
    let engine = engine_from_config(&config);

    let insights = engine.generate_personalized_insights(&sample_context()).await;
    // Static fallback covers the lowest-scoring dimensions
    assert!(!insights.is_empty());
    assert!(insights
        .iter()
        .any(|i| i.dimension == "Data & Analytics"));
}

#[tokio::test]
async fn test_no_api_key_skips_llm_entirely() {
    let config = create_test_config();
    let engine = engine_from_config(&config);

    let insights = engine.generate_personalized_insights(&sample_context()).await;
    assert!(!insights.is_empty());
}
