// SMTP delivery of rendered reports
//
// STARTTLS relay (Gmail-style, port 587) with credentials whose password is
// read from an environment variable named in config. The recipient is
// parsed before any connection is opened.

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;
use tracing::info;

use super::{DeliveryChannel, DeliveryReceipt};
use crate::error::DeliveryError;
use crate::report::ReportArtifact;

pub const REPORT_SUBJECT: &str = "Your NeuroNote Analysis Report";

const REPORT_BODY: &str = "Hi,

Please find attached your comprehensive analysis report from NeuroNote.

This report includes:
- Detailed notes analysis
- Emotion detection summary
- Personalized insights

Thank you for using NeuroNote!

Best regards,
The NeuroNote Team
";

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    /// SMTP relay hostname (e.g. "smtp.gmail.com")
    #[serde(default = "default_host")]
    pub host: String,

    /// SMTP port (typically 587 for STARTTLS)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Sender address, also the login unless `username` is set
    pub sender: String,

    #[serde(default)]
    pub username: Option<String>,

    /// Environment variable holding the password or app password
    #[serde(default = "default_password_env")]
    pub password_env: String,
}

fn default_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_port() -> u16 {
    587
}

fn default_password_env() -> String {
    "NEURONOTE_SMTP_PASSWORD".to_string()
}

/// Email delivery over an authenticated SMTP relay
pub struct SmtpDelivery {
    sender: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
}

impl SmtpDelivery {
    pub fn from_config(config: &SmtpConfig) -> Result<Self, DeliveryError> {
        let password = std::env::var(&config.password_env).map_err(|_| {
            DeliveryError::MissingCredentials {
                variable: config.password_env.clone(),
            }
        })?;

        let sender: Mailbox = config.sender.parse().map_err(|e: lettre::address::AddressError| {
            DeliveryError::InvalidRecipient {
                address: config.sender.clone(),
                reason: e.to_string(),
            }
        })?;

        let username = config.username.clone().unwrap_or_else(|| config.sender.clone());
        let creds = Credentials::new(username, password);

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| DeliveryError::Transport {
                reason: e.to_string(),
            })?
            .port(config.port)
            .credentials(creds)
            .build();

        info!(
            "SMTP delivery configured via {}:{} as {}",
            config.host, config.port, config.sender
        );

        Ok(Self {
            sender,
            transport,
            host: config.host.clone(),
        })
    }
}

/// Parse a recipient address
pub fn parse_recipient(recipient: &str) -> Result<Mailbox, DeliveryError> {
    recipient
        .trim()
        .parse()
        .map_err(|e: lettre::address::AddressError| DeliveryError::InvalidRecipient {
            address: recipient.to_string(),
            reason: e.to_string(),
        })
}

/// Assemble the report email: plain-text body plus the PDF attachment
pub fn build_report_message(
    sender: Mailbox,
    recipient: Mailbox,
    artifact: &ReportArtifact,
) -> Result<Message, DeliveryError> {
    let pdf = ContentType::parse("application/pdf").map_err(|e| DeliveryError::Message {
        reason: e.to_string(),
    })?;

    let attachment = Attachment::new(artifact.file_name()).body(artifact.bytes.clone(), pdf);

    Message::builder()
        .from(sender)
        .to(recipient)
        .subject(REPORT_SUBJECT)
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(REPORT_BODY.to_string()))
                .singlepart(attachment),
        )
        .map_err(|e| DeliveryError::Message {
            reason: e.to_string(),
        })
}

#[async_trait::async_trait]
impl DeliveryChannel for SmtpDelivery {
    async fn deliver(
        &self,
        recipient: &str,
        artifact: &ReportArtifact,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let to = parse_recipient(recipient)?;
        let email = build_report_message(self.sender.clone(), to, artifact)?;

        info!(
            "Sending report {} to {} via {}",
            artifact.file_name(),
            recipient,
            self.host
        );

        let response = self
            .transport
            .send(email)
            .await
            .map_err(|e| DeliveryError::Transport {
                reason: e.to_string(),
            })?;

        Ok(DeliveryReceipt {
            recipient: recipient.trim().to_string(),
            detail: format!("Email sent ({})", response.code()),
        })
    }

    fn name(&self) -> &str {
        "smtp"
    }
}
