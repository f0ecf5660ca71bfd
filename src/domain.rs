pub mod contact_email;
pub mod contact_form;
pub mod submission_result;

pub use contact_email::ContactEmail;
pub use contact_form::{ContactForm, ContactSubmission, FieldErrors, FormField, ValidationFailure};
pub use submission_result::SubmissionResult;

/// Upper bound on the length of every submitted field, in characters.
pub const MAX_FIELD_LENGTH: usize = 5000;

/// Trims the input and silently caps it at [`MAX_FIELD_LENGTH`].
///
/// Overlong input is truncated rather than rejected.
pub fn sanitize_input(value: &str) -> String {
    value.trim().chars().take(MAX_FIELD_LENGTH).collect()
}
