use reqwest::Method;
use serde_json::{json, Value};
use contact_relay::configuration::Environment;
use contact_relay::domain::SubmissionResult;
use crate::helpers::{spawn_app, spawn_app_with, RecordingTransport};

fn valid_body() -> Value {
    json!({
        "name": "Ada",
        "email": "ada@example.com",
        "subject": "Hi",
        "message": "Hello there",
    })
}

#[tokio::test]
async fn test_contact_returns_200_and_sends_two_emails_for_valid_data() {
    let app = spawn_app().await;

    let response = app.post_contact(&valid_body()).await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "success": true,
            "message": "Message sent successfully! I'll get back to you soon.",
        })
    );

    let sent = app.mail.sent();
    assert_eq!(sent.len(), 2);

    let notification = sent.iter().find(|e| e.to.email == "inbox@example.com").unwrap();
    assert_eq!(notification.reply_to.as_ref().unwrap().email, "ada@example.com");
    assert_eq!(notification.subject, "New Contact: Hi");
    assert!(notification.text_body.contains("Ada"));
    assert!(notification.text_body.contains("Hello there"));

    let acknowledgement = sent.iter().find(|e| e.to.email == "ada@example.com").unwrap();
    assert_eq!(acknowledgement.subject, "Thanks for reaching out! - Re: Hi");
    assert!(acknowledgement.text_body.contains("Hello there"));
}

#[tokio::test]
async fn test_contact_returns_400_listing_the_blank_field() {
    let app = spawn_app().await;
    let mut body = valid_body();
    body["name"] = json!("");
    body["message"] = json!("Hello");

    let response = app.post_contact(&body).await;

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "All fields are required");
    assert_eq!(body["errors"]["name"], "Name is required");
    assert!(body["errors"]["email"].is_null());
    assert!(body["errors"]["subject"].is_null());
    assert!(body["errors"]["message"].is_null());
    assert!(app.mail.sent().is_empty());
}

#[tokio::test]
async fn test_contact_returns_400_for_each_blank_or_missing_field() {
    let app = spawn_app().await;

    for field in ["name", "email", "subject", "message"] {
        for blank in [json!(""), json!("   "), json!(null), json!(7)] {
            let mut body = valid_body();
            body[field] = blank.clone();

            let response = app.post_contact(&body).await;
            assert_eq!(
                400,
                response.status().as_u16(),
                "API did not fail with 400 when {} was {}",
                field,
                blank
            );

            let body: Value = response.json().await.unwrap();
            let errors = body["errors"].as_object().unwrap();
            let reported: Vec<&String> = errors
                .iter()
                .filter(|(_, error)| !error.is_null())
                .map(|(key, _)| key)
                .collect();
            assert_eq!(reported, vec![field]);
        }

        let mut body = valid_body();
        body.as_object_mut().unwrap().remove(field);
        let response = app.post_contact(&body).await;
        assert_eq!(400, response.status().as_u16(), "missing {}", field);
    }

    assert!(app.mail.sent().is_empty());
}

#[tokio::test]
async fn test_contact_returns_400_for_a_malformed_email() {
    let app = spawn_app().await;
    let test_cases = vec![
        ("ada", "no at symbol"),
        ("ada@example", "no dot in the domain"),
        ("@example.com", "no local part"),
        ("ada lovelace@example.com", "whitespace"),
        ("ada@@example.com", "two at symbols"),
    ];

    for (email, description) in test_cases {
        let mut body = valid_body();
        body["email"] = json!(email);

        let response = app.post_contact(&body).await;
        assert_eq!(
            400,
            response.status().as_u16(),
            "API did not fail with 400 for an email with {}",
            description
        );

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["message"], "Invalid email format");
        assert_eq!(body["errors"]["email"], "Please enter a valid email address");
        assert!(body["errors"]["name"].is_null());
    }

    assert!(app.mail.sent().is_empty());
}

#[tokio::test]
async fn test_contact_sanitizes_fields_before_sending() {
    let app = spawn_app().await;
    let long_message = "x".repeat(6000);
    let body = json!({
        "name": "  Ada  ",
        "email": "ada@example.com",
        "subject": "\tHi\n",
        "message": long_message,
    });

    let response = app.post_contact(&body).await;
    assert_eq!(200, response.status().as_u16());

    for email in app.mail.sent() {
        assert!(email.subject.ends_with(": Hi"), "{}", email.subject);
        assert!(email.text_body.contains(&"x".repeat(5000)));
        assert!(!email.text_body.contains(&"x".repeat(5001)));
    }
    let acknowledgement = app
        .mail
        .sent()
        .into_iter()
        .find(|e| e.to.email == "ada@example.com")
        .unwrap();
    assert_eq!(acknowledgement.to.name.as_deref(), Some("Ada"));
}

#[tokio::test]
async fn test_contact_returns_400_for_a_body_that_is_not_json() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .post(&app.contact_url())
        .header("Content-Type", "application/json")
        .body("name=Ada&email=ada%40example.com")
        .send()
        .await
        .unwrap();

    assert_eq!(400, response.status().as_u16());
    let body: SubmissionResult = response.json().await.unwrap();
    assert_eq!(body, SubmissionResult::failure("Invalid request body"));
}

#[tokio::test]
async fn test_contact_fails_with_500_when_smtp_is_not_configured() {
    let app = spawn_app_with(RecordingTransport::accepting(), |c| {
        c.email_client.host = None;
    })
    .await;

    let response = app.post_contact(&valid_body()).await;

    assert_eq!(500, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "Email service is not configured. Please contact the site administrator."
    );
    assert!(body.get("errors").is_none());
    assert!(app.mail.sent().is_empty());
}

#[tokio::test]
async fn test_validation_wins_over_missing_smtp_configuration() {
    let app = spawn_app_with(RecordingTransport::accepting(), |c| {
        c.email_client.username = None;
        c.email_client.password = None;
    })
    .await;
    let mut body = valid_body();
    body["subject"] = json!("");

    let response = app.post_contact(&body).await;
    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn test_contact_fails_with_500_when_the_transport_fails() {
    let app = spawn_app_with(RecordingTransport::failing("535 authentication rejected"), |_| {}).await;

    let response = app.post_contact(&valid_body()).await;

    assert_eq!(500, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Failed to send message. Please try again later.");
    // Outside production the transport failure is echoed for diagnostics
    assert!(body["error"].as_str().unwrap().contains("535 authentication rejected"));
    // Both sends were attempted, no retry afterwards
    assert_eq!(app.mail.sent().len(), 2);
}

#[tokio::test]
async fn test_transport_failures_are_not_exposed_in_production() {
    let app = spawn_app_with(RecordingTransport::failing("535 authentication rejected"), |c| {
        c.environment = Environment::Production;
    })
    .await;

    let response = app.post_contact(&valid_body()).await;

    assert_eq!(500, response.status().as_u16());
    let text = response.text().await.unwrap();
    assert!(!text.contains("535"));
    let body: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        body,
        json!({
            "success": false,
            "message": "Failed to send message. Please try again later.",
        })
    );
}

#[tokio::test]
async fn test_preflight_returns_an_empty_200_with_cors_headers() {
    let app = spawn_app().await;

    let response = app.request_contact(Method::OPTIONS).await;

    assert_eq!(200, response.status().as_u16());
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "POST, OPTIONS");
    assert_eq!(headers["access-control-allow-headers"], "Content-Type");
    assert_eq!(response.text().await.unwrap(), "");
}

#[tokio::test]
async fn test_post_responses_carry_the_allow_origin_header() {
    let app = spawn_app().await;

    let response = app.post_contact(&valid_body()).await;

    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn test_other_methods_are_not_allowed() {
    let app = spawn_app().await;

    for method in [Method::GET, Method::PUT, Method::PATCH, Method::DELETE] {
        let response = app.request_contact(method.clone()).await;

        assert_eq!(
            405,
            response.status().as_u16(),
            "{} was not rejected with 405",
            method
        );
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({"success": false, "message": "Method not allowed"}));
    }
    assert!(app.mail.sent().is_empty());
}
