use anyhow::Context as _;
use tera::{Context, Tera};
use crate::domain::ContactSubmission;

/// Subject and both renditions of one message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// Renders the two contact emails.
///
/// Templates are embedded in the binary with `include_str!`. Tera autoescapes
/// the `.html` templates, so submitted text cannot inject markup; the `.txt`
/// templates are rendered verbatim.
pub struct ContactTemplates {
    engine: Tera,
}

impl ContactTemplates {
    const OWNER_NOTIFICATION: &'static str = "owner_notification";
    const SENDER_ACKNOWLEDGEMENT: &'static str = "sender_acknowledgement";

    pub fn new() -> Result<Self, anyhow::Error> {
        let mut engine = Tera::default();
        engine
            .add_raw_templates(vec![
                (
                    "owner_notification.html",
                    include_str!("../templates/owner_notification.html"),
                ),
                (
                    "owner_notification.txt",
                    include_str!("../templates/owner_notification.txt"),
                ),
                (
                    "sender_acknowledgement.html",
                    include_str!("../templates/sender_acknowledgement.html"),
                ),
                (
                    "sender_acknowledgement.txt",
                    include_str!("../templates/sender_acknowledgement.txt"),
                ),
            ])
            .context("Failed to register the contact email templates")?;

        Ok(Self { engine })
    }

    /// Message for the site owner, echoing all four fields.
    pub fn owner_notification(&self, submission: &ContactSubmission) -> Result<RenderedEmail, anyhow::Error> {
        let context = Self::context(submission);
        self.render(
            Self::OWNER_NOTIFICATION,
            format!("New Contact: {}", submission.subject),
            &context,
        )
    }

    /// Thank-you message for the submitter, echoing their subject and message.
    pub fn sender_acknowledgement(
        &self,
        submission: &ContactSubmission,
        signature_name: &str,
    ) -> Result<RenderedEmail, anyhow::Error> {
        let mut context = Self::context(submission);
        context.insert("signature_name", signature_name);
        self.render(
            Self::SENDER_ACKNOWLEDGEMENT,
            format!("Thanks for reaching out! - Re: {}", submission.subject),
            &context,
        )
    }

    fn context(submission: &ContactSubmission) -> Context {
        let mut context = Context::new();
        context.insert("name", &submission.name);
        context.insert("email", submission.email.as_ref());
        context.insert("subject", &submission.subject);
        context.insert("message", &submission.message);
        context
    }

    fn render(&self, template: &str, subject: String, context: &Context) -> Result<RenderedEmail, anyhow::Error> {
        let html_body = self
            .engine
            .render(&format!("{}.html", template), context)
            .with_context(|| format!("Failed to render {}.html", template))?;
        let text_body = self
            .engine
            .render(&format!("{}.txt", template), context)
            .with_context(|| format!("Failed to render {}.txt", template))?;

        Ok(RenderedEmail {
            subject,
            html_body,
            text_body: text_body.trim().to_string(),
        })
    }
}
