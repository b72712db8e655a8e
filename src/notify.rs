use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::Path;
use tracing::debug;

use crate::classify::Classification;
use crate::config::SmtpConfig;

/// Message-delivery boundary: filtered labels plus the frame artifact in,
/// a delivery identifier out. Fire-and-forget — the caller logs failures
/// and moves on, no retry.
#[async_trait]
pub trait NotifierAdapter: Send + Sync {
    async fn notify(
        &self,
        camera_name: &str,
        labels: &[Classification],
        attachment: &Path,
    ) -> Result<String, NotifyError>;
}

/// Human-readable subject line for a detection.
pub fn compose_subject(camera_name: &str, labels: &[Classification]) -> String {
    if labels.is_empty() {
        format!("[{camera_name}] change detected")
    } else {
        let names: Vec<&str> = labels.iter().map(|c| c.label.as_str()).collect();
        format!("[{camera_name}] detected: {}", names.join(", "))
    }
}

/// Body text enumerating the labels, or a generic line when the
/// classifier recognized nothing above the threshold.
pub fn compose_body(camera_name: &str, labels: &[Classification]) -> String {
    if labels.is_empty() {
        format!(
            "Camera \"{camera_name}\" saw the scene change, but nothing \
             recognizable was identified. Snapshot attached."
        )
    } else {
        let mut body = format!("Camera \"{camera_name}\" detected:\n");
        for c in labels {
            body.push_str(&format!("  - {} ({:.0}%)\n", c.label, c.confidence));
        }
        body.push_str("\nSnapshot attached.");
        body
    }
}

/// Sends detection mails over SMTP with the snapshot attached.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    recipients: Vec<String>,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, NotifyError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();
        Ok(Self {
            transport,
            from: config.from.clone(),
            recipients: config.recipients.clone(),
        })
    }
}

#[async_trait]
impl NotifierAdapter for SmtpNotifier {
    async fn notify(
        &self,
        camera_name: &str,
        labels: &[Classification],
        attachment: &Path,
    ) -> Result<String, NotifyError> {
        let jpeg = tokio::fs::read(attachment)
            .await
            .map_err(|e| NotifyError::Attachment(e.to_string()))?;

        let mut builder = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|_| NotifyError::Address(self.from.clone()))?,
            )
            .subject(compose_subject(camera_name, labels));
        for recipient in &self.recipients {
            builder = builder.to(recipient
                .parse()
                .map_err(|_| NotifyError::Address(recipient.clone()))?);
        }

        let message = builder
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(compose_body(camera_name, labels)))
                    .singlepart(
                        Attachment::new("snapshot.jpg".to_string())
                            .body(jpeg, ContentType::parse("image/jpeg").unwrap()),
                    ),
            )
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Send(e.to_string()))?;
        let message_id = response
            .message()
            .collect::<Vec<&str>>()
            .join(" ");
        debug!(message_id, "notification delivered");
        Ok(message_id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("failed to build SMTP transport: {0}")]
    Transport(String),
    #[error("invalid mail address: {0}")]
    Address(String),
    #[error("failed to read attachment: {0}")]
    Attachment(String),
    #[error("failed to build message: {0}")]
    Build(String),
    #[error("failed to send notification: {0}")]
    Send(String),
}
