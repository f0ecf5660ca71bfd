use crate::domain::{sanitize_input, ContactEmail};

/// The four fields of the contact form, exactly as they were typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Name,
    Email,
    Subject,
    Message,
}

impl FormField {
    pub const ALL: [FormField; 4] = [
        FormField::Name,
        FormField::Email,
        FormField::Subject,
        FormField::Message,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            FormField::Name => "name",
            FormField::Email => "email",
            FormField::Subject => "subject",
            FormField::Message => "message",
        }
    }

    fn required_message(&self) -> &'static str {
        match self {
            FormField::Name => "Name is required",
            FormField::Email => "Email is required",
            FormField::Subject => "Subject is required",
            FormField::Message => "Message is required",
        }
    }
}

/// Per-field error messages. Serialized with every key present, `null` for
/// the fields without an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FieldErrors {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl FieldErrors {
    pub fn get(&self, field: FormField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    pub fn set(&mut self, field: FormField, error: impl Into<String>) {
        *self.slot_mut(field) = Some(error.into());
    }

    pub fn clear(&mut self, field: FormField) {
        *self.slot_mut(field) = None;
    }

    pub fn is_empty(&self) -> bool {
        FormField::ALL.iter().all(|field| self.slot(*field).is_none())
    }

    /// Fields which carry an error, in form order.
    pub fn fields(&self) -> Vec<FormField> {
        FormField::ALL
            .iter()
            .copied()
            .filter(|field| self.slot(*field).is_some())
            .collect()
    }

    fn slot(&self, field: FormField) -> &Option<String> {
        match field {
            FormField::Name => &self.name,
            FormField::Email => &self.email,
            FormField::Subject => &self.subject,
            FormField::Message => &self.message,
        }
    }

    fn slot_mut(&mut self, field: FormField) -> &mut Option<String> {
        match field {
            FormField::Name => &mut self.name,
            FormField::Email => &mut self.email,
            FormField::Subject => &mut self.subject,
            FormField::Message => &mut self.message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub message: &'static str,
    pub errors: FieldErrors,
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        for field in self.errors.fields() {
            write!(f, "; {}: {}", field.key(), self.errors.get(field).unwrap_or_default())?;
        }
        Ok(())
    }
}

/// A submission which passed validation, every field sanitized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: String,
    pub email: ContactEmail,
    pub subject: String,
    pub message: String,
}

impl ContactForm {
    pub const MISSING_FIELDS_MESSAGE: &'static str = "All fields are required";
    pub const INVALID_EMAIL_MESSAGE: &'static str = "Invalid email format";
    pub const INVALID_EMAIL_FIELD_ERROR: &'static str = "Please enter a valid email address";

    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.name,
            FormField::Email => &self.email,
            FormField::Subject => &self.subject,
            FormField::Message => &self.message,
        }
    }

    pub fn value_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Name => &mut self.name,
            FormField::Email => &mut self.email,
            FormField::Subject => &mut self.subject,
            FormField::Message => &mut self.message,
        }
    }

    /// Every field problem at once, for immediate feedback while editing.
    ///
    /// Uses the same rules as [`Self::validate`], but a filled-in email is
    /// checked for its shape even when other fields are still blank.
    pub fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        for field in FormField::ALL {
            if self.value(field).trim().is_empty() {
                errors.set(field, field.required_message());
            }
        }
        if errors.email.is_none() && !ContactEmail::is_valid(&self.email) {
            errors.set(FormField::Email, Self::INVALID_EMAIL_FIELD_ERROR);
        }
        errors
    }

    /// The single set of rules shared by the form and the relay.
    ///
    /// Blank fields (after trimming) are reported first and all together. The
    /// email shape is only checked once every field is filled in.
    pub fn validate(&self) -> Result<ContactSubmission, ValidationFailure> {
        let mut errors = FieldErrors::default();
        for field in FormField::ALL {
            if self.value(field).trim().is_empty() {
                errors.set(field, field.required_message());
            }
        }
        if !errors.is_empty() {
            return Err(ValidationFailure {
                message: Self::MISSING_FIELDS_MESSAGE,
                errors,
            });
        }

        let email = ContactEmail::parse(&self.email).map_err(|_| {
            let mut errors = FieldErrors::default();
            errors.set(FormField::Email, Self::INVALID_EMAIL_FIELD_ERROR);
            ValidationFailure {
                message: Self::INVALID_EMAIL_MESSAGE,
                errors,
            }
        })?;

        Ok(ContactSubmission {
            name: sanitize_input(&self.name),
            email,
            subject: sanitize_input(&self.subject),
            message: sanitize_input(&self.message),
        })
    }
}
