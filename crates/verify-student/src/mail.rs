//! Outgoing mail seam.
//!
//! Jobs talk to an [`EmailSender`]; production wires in [`SmtpEmailSender`]
//! backed by a pooled lettre SMTP transport.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::error::MailError;

#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send a single plain-text message.
    async fn send(&self, from: &str, to: &str, subject: &str, body: &str)
    -> Result<(), MailError>;
}

pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailSender {
    pub fn new(transport: AsyncSmtpTransport<Tokio1Executor>) -> Self {
        Self { transport }
    }

    pub fn from_config(smtp: &SmtpConfig) -> Result<Self, MailError> {
        let creds = Credentials::new(smtp.username.clone(), smtp.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.server)?
            .port(smtp.port)
            .credentials(creds)
            .build();
        Ok(Self::new(transport))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| MailError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

pub fn build_message(
    from: &str,
    to: &str,
    subject: &str,
    body: &str,
) -> Result<Message, MailError> {
    let message = Message::builder()
        .from(parse_mailbox(from)?)
        .to(parse_mailbox(to)?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .header(lettre::message::header::MIME_VERSION_1_0)
        .body(body.to_string())?;
    Ok(message)
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    #[tracing::instrument(skip(self, body))]
    async fn send(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), MailError> {
        let message = build_message(from, to, subject, body)?;
        self.transport.send(message).await?;
        Ok(())
    }
}
