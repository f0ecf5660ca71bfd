use contact_relay::contact_client::ContactClient;
use contact_relay::domain::{ContactForm, FormField, SubmissionResult};
use contact_relay::submission_form::{FormStatus, SubmissionForm};
use crate::helpers::{spawn_app, spawn_app_with, RecordingTransport};

fn filled_form() -> SubmissionForm {
    let mut form = SubmissionForm::new();
    form.set_field(FormField::Name, "Ada").unwrap();
    form.set_field(FormField::Email, "ada@example.com").unwrap();
    form.set_field(FormField::Subject, "Hi").unwrap();
    form.set_field(FormField::Message, "Hello there").unwrap();
    form
}

#[tokio::test]
async fn test_form_submission_reaches_the_relay_and_resets_the_form() {
    let app = spawn_app().await;
    let client = ContactClient::for_base_url(&app.address).unwrap();
    let mut form = filled_form();

    let status = form.submit(&client).await.unwrap();

    assert!(matches!(status, FormStatus::Succeeded { .. }));
    assert_eq!(form.values(), &ContactForm::default());
    assert_eq!(app.mail.sent().len(), 2);
}

#[tokio::test]
async fn test_relay_failure_keeps_the_typed_values() {
    let app = spawn_app_with(RecordingTransport::failing("connection reset"), |_| {}).await;
    let client = ContactClient::for_base_url(&app.address).unwrap();
    let mut form = filled_form();

    form.submit(&client).await.unwrap();

    assert_eq!(
        form.status(),
        &FormStatus::Failed {
            message: SubmissionResult::DISPATCH_FAILED_MESSAGE.into()
        }
    );
    assert_eq!(form.values().name, "Ada");
    assert_eq!(form.values().message, "Hello there");
    assert!(!form.is_submitting());
}

#[tokio::test]
async fn test_client_and_relay_agree_on_invalid_emails() {
    let app = spawn_app().await;
    let client = ContactClient::for_base_url(&app.address).unwrap();

    for email in ["ada", "ada@example", " ada@example.com", "a b@example.com"] {
        let mut form = filled_form();
        form.set_field(FormField::Email, email).unwrap();
        assert!(form.begin_submission().is_err(), "form accepted {:?}", email);

        // Bypass the form and ask the relay directly
        let raw = ContactForm {
            email: email.to_string(),
            ..form.values().clone()
        };
        let rejected = client.post_submission(&raw).await.unwrap_err();
        assert_eq!(rejected.to_string(), "Invalid email format", "relay accepted {:?}", email);
    }
    assert!(app.mail.sent().is_empty());
}
