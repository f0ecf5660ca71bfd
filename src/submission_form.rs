use std::time::{Duration, Instant};
use crate::contact_client::{ClientError, ContactClient};
use crate::domain::{ContactForm, FieldErrors, FormField, SubmissionResult};

/// How long the confirmation stays up after a successful submission.
pub const SUCCESS_BANNER_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormStatus {
    Editing,
    /// A request is in flight, submitting again is refused
    Submitting,
    Succeeded { since: Instant },
    /// The values are kept so the user can retry without retyping
    Failed { message: String },
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum FormError {
    #[error("A submission is already in flight")]
    SubmissionInFlight,
    #[error("No submission is in flight")]
    NotSubmitting,
    #[error("Some fields are invalid")]
    Invalid(FieldErrors),
}

/// Client-side state of the contact form.
///
/// Validation runs locally before anything is sent, using the same rules as
/// the relay. At most one request is in flight at any time.
#[derive(Debug, Clone)]
pub struct SubmissionForm {
    values: ContactForm,
    errors: FieldErrors,
    status: FormStatus,
}

impl Default for SubmissionForm {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionForm {
    pub fn new() -> Self {
        Self {
            values: ContactForm::default(),
            errors: FieldErrors::default(),
            status: FormStatus::Editing,
        }
    }

    pub fn values(&self) -> &ContactForm {
        &self.values
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn status(&self) -> &FormStatus {
        &self.status
    }

    pub fn is_submitting(&self) -> bool {
        self.status == FormStatus::Submitting
    }

    /// Updates one field and clears its error.
    ///
    /// Editing dismisses a success confirmation. A failure message stays until
    /// the next submission.
    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) -> Result<(), FormError> {
        if self.is_submitting() {
            return Err(FormError::SubmissionInFlight);
        }
        *self.values.value_mut(field) = value.into();
        self.errors.clear(field);
        if let FormStatus::Succeeded { .. } = self.status {
            self.status = FormStatus::Editing;
        }
        Ok(())
    }

    /// Validates locally and, if valid, moves to `Submitting` and hands back
    /// the exact values to post.
    pub fn begin_submission(&mut self) -> Result<ContactForm, FormError> {
        if self.is_submitting() {
            return Err(FormError::SubmissionInFlight);
        }
        let errors = self.values.field_errors();
        if !errors.is_empty() {
            self.errors = errors.clone();
            self.status = FormStatus::Editing;
            return Err(FormError::Invalid(errors));
        }
        self.errors = FieldErrors::default();
        self.status = FormStatus::Submitting;
        Ok(self.values.clone())
    }

    /// Applies the outcome of the request started by [`Self::begin_submission`].
    pub fn complete_submission(
        &mut self,
        outcome: Result<SubmissionResult, ClientError>,
        now: Instant,
    ) -> Result<(), FormError> {
        if !self.is_submitting() {
            return Err(FormError::NotSubmitting);
        }
        match outcome {
            Ok(_) => {
                self.values = ContactForm::default();
                self.errors = FieldErrors::default();
                self.status = FormStatus::Succeeded { since: now };
            }
            Err(ClientError::Rejected(result)) => {
                self.errors = result.errors.unwrap_or_default();
                self.status = FormStatus::Failed {
                    message: result.message,
                };
            }
            Err(e) => {
                tracing::warn!(error.cause_chain = ?e, "Contact submission failed");
                self.status = FormStatus::Failed {
                    message: SubmissionResult::DISPATCH_FAILED_MESSAGE.to_string(),
                };
            }
        }
        Ok(())
    }

    /// Validates, posts once and applies the outcome.
    pub async fn submit(&mut self, client: &ContactClient) -> Result<&FormStatus, FormError> {
        let form = self.begin_submission()?;
        let outcome = client.post_submission(&form).await;
        self.complete_submission(outcome, Instant::now())?;
        Ok(&self.status)
    }

    /// Hides the success confirmation once it has been shown for
    /// [`SUCCESS_BANNER_DURATION`].
    pub fn tick(&mut self, now: Instant) {
        if let FormStatus::Succeeded { since } = self.status {
            if now.saturating_duration_since(since) >= SUCCESS_BANNER_DURATION {
                self.status = FormStatus::Editing;
            }
        }
    }
}
