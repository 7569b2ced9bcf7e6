//! Mail delivery entry point, with an SMTP implementation via `lettre`.
//!
//! Supports STARTTLS and implicit TLS connections; credentials come from
//! the `SMTP_USERNAME` / `SMTP_PASSWORD` environment variables.

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use importmail_core::config::MailSettings;

use crate::error::MailError;
use crate::message::OutboundMessage;

/// Delivery entry point for composed messages.
#[async_trait::async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver one message. No retries; the caller decides what a failure
    /// means.
    async fn send(&self, message: &OutboundMessage) -> Result<(), MailError>;

    /// Human-readable name for this transport (e.g. `"smtp"`).
    fn name(&self) -> &str;
}

/// Sends messages through an SMTP relay.
#[derive(Debug)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Build a mailer from process-wide [`MailSettings`].
    ///
    /// The port defaults to 587. Port 465 uses implicit TLS; any other port
    /// uses STARTTLS unless `tls` is explicitly off. If both `SMTP_USERNAME`
    /// and `SMTP_PASSWORD` are set they are passed to the transport,
    /// otherwise the connection is unauthenticated.
    pub fn from_settings(settings: &MailSettings) -> Result<Self, MailError> {
        let host = &settings.smtp.host;
        let port = settings.smtp.port.unwrap_or(587);
        let use_tls = settings.smtp.tls.unwrap_or(true);

        let mut builder = if port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| MailError::Config(e.to_string()))?
                .port(port)
        } else if use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| MailError::Config(e.to_string()))?
                .port(port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port)
        };

        if let (Ok(username), Ok(password)) =
            (std::env::var("SMTP_USERNAME"), std::env::var("SMTP_PASSWORD"))
        {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

/// Compose a lettre [`Message`] from an [`OutboundMessage`]: all recipients
/// on the To line, plain-text UTF-8 body.
fn compose(message: &OutboundMessage) -> Result<Message, MailError> {
    let from: Mailbox = message
        .from
        .parse()
        .map_err(|e: lettre::address::AddressError| MailError::Config(e.to_string()))?;

    let mut builder = Message::builder().from(from);
    for recipient in &message.to {
        let to: Mailbox = recipient
            .parse()
            .map_err(|e: lettre::address::AddressError| MailError::Config(e.to_string()))?;
        builder = builder.to(to);
    }

    builder
        .subject(&message.subject)
        .header(ContentType::TEXT_PLAIN)
        .body(message.body.clone())
        .map_err(|e| MailError::Smtp(e.to_string()))
}

#[async_trait::async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, message: &OutboundMessage) -> Result<(), MailError> {
        let email = compose(message)?;

        self.transport
            .send(email)
            .await
            .map_err(|e| MailError::Smtp(e.to_string()))?;

        tracing::info!(
            transport = "smtp",
            subject = %message.subject,
            to = %message.to_header(),
            "message delivered"
        );

        Ok(())
    }

    fn name(&self) -> &str {
        "smtp"
    }
}
