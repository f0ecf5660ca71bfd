use anyhow::Context;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use crate::configuration::SmtpSettings;
use crate::email_client::MailTransport;
use crate::email_request::{EmailAddress, OutgoingEmail};

/// Sends mail through an SMTP relay.
///
/// `secure` selects implicit TLS (usually port 465), otherwise the connection
/// is upgraded with STARTTLS (usually port 587).
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    pub fn new(settings: &SmtpSettings<'_>) -> Result<Self, anyhow::Error> {
        let builder = if settings.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(settings.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(settings.host)
        }
        .with_context(|| format!("Failed to set up TLS for SMTP host {}", settings.host))?;

        let transport = builder
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.to_owned(),
                settings.password.expose_secret().to_owned(),
            ))
            .timeout(Some(settings.timeout))
            .build();

        Ok(Self { transport })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, email: OutgoingEmail) -> Result<(), anyhow::Error> {
        let message = build_message(email)?;
        let response = self
            .transport
            .send(message)
            .await
            .context("SMTP server rejected the message")?;
        tracing::debug!(code = %response.code(), "SMTP server accepted the message");
        Ok(())
    }
}

fn mailbox(address: &EmailAddress) -> Result<Mailbox, anyhow::Error> {
    let email = address
        .email
        .parse()
        .with_context(|| format!("{} is not a deliverable address", address.email))?;
    Ok(Mailbox::new(address.name.clone(), email))
}

pub(crate) fn build_message(email: OutgoingEmail) -> Result<Message, anyhow::Error> {
    let mut builder = Message::builder()
        .from(mailbox(&email.from)?)
        .to(mailbox(&email.to)?)
        .subject(email.subject);
    if let Some(reply_to) = &email.reply_to {
        builder = builder.reply_to(mailbox(reply_to)?);
    }

    builder
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(email.text_body),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(email.html_body),
                ),
        )
        .context("Failed to assemble the email message")
}
