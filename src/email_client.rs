use std::sync::Arc;
use anyhow::Context;
use async_trait::async_trait;
use crate::configuration::{EmailClientSettings, SmtpSettings};
use crate::domain::ContactSubmission;
use crate::email_request::{EmailAddress, OutgoingEmail};
use crate::email_templates::{ContactTemplates, RenderedEmail};

pub mod smtp;

pub use smtp::SmtpMailTransport;

/// Anything able to deliver an [`OutgoingEmail`].
#[async_trait]
pub trait MailTransport: Send + Sync + 'static {
    async fn send(&self, email: OutgoingEmail) -> Result<(), anyhow::Error>;
}

#[derive(thiserror::Error, Debug)]
pub enum MailError {
    #[error("Mail transport is not configured: {0}")]
    NotConfigured(String),
    #[error("Failed to dispatch the contact emails")]
    DispatchFailed(#[source] anyhow::Error),
}

struct ReadyTransport {
    transport: Arc<dyn MailTransport>,
    sender: EmailAddress,
    recipient: EmailAddress,
}

enum TransportState {
    Ready(ReadyTransport),
    Unconfigured { reason: String },
}

/// Relays contact submissions as two emails: a notification to the site owner
/// and an acknowledgement to the submitter.
///
/// The transport settings are checked once when the client is built. A client
/// built from incomplete settings is still usable, every send then fails with
/// [`MailError::NotConfigured`] before anything goes out.
pub struct EmailClient {
    state: TransportState,
    templates: ContactTemplates,
    signature_name: String,
}

impl EmailClient {
    pub fn from_settings(settings: &EmailClientSettings) -> Result<Self, anyhow::Error> {
        Self::build(settings, |smtp| {
            let transport = SmtpMailTransport::new(smtp)?;
            Ok(Arc::new(transport) as Arc<dyn MailTransport>)
        })
    }

    /// Same readiness rules as [`EmailClient::from_settings`], but messages go
    /// through `transport` instead of SMTP.
    pub fn with_transport(
        settings: &EmailClientSettings,
        transport: Arc<dyn MailTransport>,
    ) -> Result<Self, anyhow::Error> {
        Self::build(settings, |_| Ok(transport))
    }

    fn build<F>(settings: &EmailClientSettings, make_transport: F) -> Result<Self, anyhow::Error>
    where
        F: FnOnce(&SmtpSettings<'_>) -> Result<Arc<dyn MailTransport>, anyhow::Error>,
    {
        let state = match settings.smtp() {
            Ok(smtp) => match make_transport(&smtp) {
                Ok(transport) => TransportState::Ready(ReadyTransport {
                    transport,
                    sender: EmailAddress::named(settings.sender_name.as_str(), smtp.username),
                    recipient: EmailAddress::new(settings.contact_recipient().unwrap_or(smtp.username)),
                }),
                Err(e) => TransportState::Unconfigured {
                    reason: format!("{:#}", e),
                },
            },
            Err(e) => TransportState::Unconfigured {
                reason: e.to_string(),
            },
        };
        if let TransportState::Unconfigured { reason } = &state {
            tracing::warn!(%reason, "Contact emails cannot be sent until SMTP is configured");
        }

        Ok(Self {
            state,
            templates: ContactTemplates::new()?,
            signature_name: settings.signature_name.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        matches!(self.state, TransportState::Ready(_))
    }

    /// Sends the owner notification and the sender acknowledgement concurrently
    /// and waits for both. The submission fails as a whole if either send fails.
    #[tracing::instrument(
        name = "Dispatch contact emails",
        skip(self, submission),
        fields(submitter_email = %submission.email)
    )]
    pub async fn send_contact_emails(&self, submission: &ContactSubmission) -> Result<(), MailError> {
        let ready = match &self.state {
            TransportState::Ready(ready) => ready,
            TransportState::Unconfigured { reason } => {
                return Err(MailError::NotConfigured(reason.clone()));
            }
        };

        let notification = self
            .templates
            .owner_notification(submission)
            .map_err(MailError::DispatchFailed)?;
        let acknowledgement = self
            .templates
            .sender_acknowledgement(submission, &self.signature_name)
            .map_err(MailError::DispatchFailed)?;

        let notification = compose(
            ready.sender.clone(),
            ready.recipient.clone(),
            Some(EmailAddress::new(submission.email.as_ref())),
            notification,
        );
        let acknowledgement = compose(
            EmailAddress::named(self.signature_name.as_str(), ready.sender.email.as_str()),
            EmailAddress::named(submission.name.as_str(), submission.email.as_ref()),
            None,
            acknowledgement,
        );

        // Both sends are in flight before either is awaited
        let (notified, acknowledged) = tokio::join!(
            ready.transport.send(notification),
            ready.transport.send(acknowledgement),
        );
        notified
            .context("Failed to send the owner notification")
            .map_err(MailError::DispatchFailed)?;
        acknowledged
            .context("Failed to send the sender acknowledgement")
            .map_err(MailError::DispatchFailed)?;

        Ok(())
    }
}

fn compose(
    from: EmailAddress,
    to: EmailAddress,
    reply_to: Option<EmailAddress>,
    rendered: RenderedEmail,
) -> OutgoingEmail {
    OutgoingEmail {
        from,
        to,
        reply_to,
        subject: rendered.subject,
        html_body: rendered.html_body,
        text_body: rendered.text_body,
    }
}
