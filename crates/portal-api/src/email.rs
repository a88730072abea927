//! Outbound email over SMTP
//!
//! Implements the [`EmailSender`] collaborator with lettre's async
//! transport (STARTTLS relay, credentialed). The service only ever sends
//! HTML bodies; delivery failures surface as [`PortalError::EmailSend`]
//! and the caller decides whether they reach the user.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use portal_core::{EmailConfig, EmailSender, PortalError, Result};

/// SMTP-backed email sender
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let from: Mailbox = config
            .from_address
            .parse()
            .map_err(|e| PortalError::ConfigError(format!("invalid from address: {e}")))?;

        let credentials = Credentials::new(config.username.clone(), config.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| PortalError::ConfigError(format!("invalid SMTP relay: {e}")))?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl EmailSender for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| PortalError::EmailSend(format!("invalid recipient: {e}")))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| PortalError::EmailSend(format!("failed to build message: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| PortalError::EmailSend(e.to_string()))?;

        Ok(())
    }
}
