use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::http::StatusCode;
use actix_web::middleware::DefaultHeaders;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use crate::configuration::Environment;
use crate::domain::{ContactForm, SubmissionResult, ValidationFailure};
use crate::email_client::{EmailClient, MailError};
use crate::routes::error_chain_fmt;

/// Body of a contact submission.
///
/// Fields are taken as arbitrary JSON so that a missing key, `null` or a
/// non-string value all end up as an empty field and fail validation as
/// "required" instead of failing deserialization.
#[derive(serde::Deserialize)]
pub struct FormData {
    #[serde(default)]
    name: serde_json::Value,
    #[serde(default)]
    email: serde_json::Value,
    #[serde(default)]
    subject: serde_json::Value,
    #[serde(default)]
    message: serde_json::Value,
}

fn text_or_empty(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        _ => String::new(),
    }
}

impl From<FormData> for ContactForm {
    fn from(data: FormData) -> Self {
        Self {
            name: text_or_empty(data.name),
            email: text_or_empty(data.email),
            subject: text_or_empty(data.subject),
            message: text_or_empty(data.message),
        }
    }
}

#[derive(thiserror::Error)]
pub enum ContactError {
    #[error("{0}")]
    ValidationError(ValidationFailure),
    #[error("Email service is not configured")]
    ConfigurationError(#[source] MailError),
    #[error("Failed to send the contact emails")]
    DispatchError {
        #[source]
        source: MailError,
        diagnostic: Option<String>,
    },
}

impl std::fmt::Debug for ContactError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ContactError {
    fn status_code(&self) -> StatusCode {
        match self {
            ContactError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ContactError::ConfigurationError(_) | ContactError::DispatchError { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ContactError::ValidationError(failure) => {
                SubmissionResult::failure(failure.message).with_errors(failure.errors.clone())
            }
            ContactError::ConfigurationError(_) => {
                SubmissionResult::failure(SubmissionResult::NOT_CONFIGURED_MESSAGE)
            }
            ContactError::DispatchError { diagnostic, .. } => {
                SubmissionResult::failure(SubmissionResult::DISPATCH_FAILED_MESSAGE)
                    .with_detail(diagnostic.clone())
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

// The underlying transport failure, without our own wrapping message
fn diagnostic(e: &MailError) -> String {
    match e {
        MailError::DispatchFailed(source) => format!("{:#}", source),
        other => other.to_string(),
    }
}

#[tracing::instrument(
    name = "Relay a contact submission",
    skip(body, email_client, environment),
    fields(submitter_email = tracing::field::Empty)
)]
pub async fn contact(
    body: web::Json<FormData>,
    email_client: web::Data<EmailClient>,
    environment: web::Data<Environment>,
) -> Result<HttpResponse, ContactError> {
    let form: ContactForm = body.into_inner().into();
    tracing::Span::current().record("submitter_email", &tracing::field::display(&form.email));

    let submission = form.validate().map_err(ContactError::ValidationError)?;

    email_client
        .send_contact_emails(&submission)
        .await
        .map_err(|e| match e {
            MailError::NotConfigured(_) => {
                tracing::error!(error.cause_chain = ?e, "SMTP configuration missing");
                ContactError::ConfigurationError(e)
            }
            MailError::DispatchFailed(_) => {
                tracing::error!(error.cause_chain = ?e, "Failed to send the contact emails");
                let diagnostic = environment.exposes_error_details().then(|| diagnostic(&e));
                ContactError::DispatchError { source: e, diagnostic }
            }
        })?;

    tracing::info!("Contact emails sent successfully");
    Ok(HttpResponse::Ok().json(SubmissionResult::sent()))
}

/// Cross-origin pre-flight: an empty 200, the CORS headers are added by
/// [`cors_headers`].
pub async fn contact_preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}

pub async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed()
        .json(SubmissionResult::failure(SubmissionResult::METHOD_NOT_ALLOWED_MESSAGE))
}

/// Headers attached to every answer of the contact route.
pub fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add(("Access-Control-Allow-Methods", "POST, OPTIONS"))
        .add(("Access-Control-Allow-Headers", "Content-Type"))
}

/// Turns a body that is not a JSON object into the regular failure envelope.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    tracing::warn!(error = %err, "Rejected a malformed contact submission body");
    let response = HttpResponse::BadRequest()
        .json(SubmissionResult::failure(SubmissionResult::INVALID_BODY_MESSAGE));
    InternalError::from_response(err, response).into()
}
