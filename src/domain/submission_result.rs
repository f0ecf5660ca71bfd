use crate::domain::FieldErrors;

/// The envelope every answer of the contact route is wrapped in.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SubmissionResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    /// Diagnostic detail of a server failure, never set in production
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubmissionResult {
    pub const SENT_MESSAGE: &'static str = "Message sent successfully! I'll get back to you soon.";
    pub const DISPATCH_FAILED_MESSAGE: &'static str = "Failed to send message. Please try again later.";
    pub const NOT_CONFIGURED_MESSAGE: &'static str =
        "Email service is not configured. Please contact the site administrator.";
    pub const METHOD_NOT_ALLOWED_MESSAGE: &'static str = "Method not allowed";
    pub const INVALID_BODY_MESSAGE: &'static str = "Invalid request body";

    pub fn sent() -> Self {
        Self {
            success: true,
            message: Self::SENT_MESSAGE.to_string(),
            errors: None,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors: None,
            error: None,
        }
    }

    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_detail(mut self, detail: Option<String>) -> Self {
        self.error = detail;
        self
    }
}
