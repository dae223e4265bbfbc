//! Email notification delivery via SMTP.
//!
//! [`EmailDelivery`] wraps the `lettre` async SMTP transport to send
//! one multipart alert email per fired notification: a plain-text body
//! naming the sensor and trigger time, and the snapshot attached as
//! `{HH-MM-SS}.jpg`. The transport is opened, used once, and dropped
//! per notification; there is no pooling and no retry.

use camwatch_core::SmtpConfig;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::dispatcher::Notification;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// A recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailDelivery
// ---------------------------------------------------------------------------

/// Sends one alert email per fired notification.
pub struct EmailDelivery {
    config: SmtpConfig,
}

impl EmailDelivery {
    /// Create a delivery service with the given SMTP settings. The
    /// configured user doubles as the sender address.
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    /// Compose and send the alert email to every configured recipient.
    ///
    /// One message, one STARTTLS session, one attempt; failures
    /// propagate to the caller.
    pub async fn deliver(&self, notification: &Notification) -> Result<(), EmailError> {
        let email = self.compose(notification)?;

        let transport =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.server)?
                .port(self.config.port)
                .credentials(Credentials::new(
                    self.config.user.clone(),
                    self.config.password.clone(),
                ))
                .build();

        transport.send(email).await?;

        tracing::info!(
            sensor = %notification.sensor_name,
            recipients = self.config.recipients.len(),
            "Alert email sent"
        );
        Ok(())
    }

    /// Build the multipart MIME message: text part plus jpeg attachment
    /// named after the trigger time.
    fn compose(&self, notification: &Notification) -> Result<Message, EmailError> {
        let mut builder = Message::builder()
            .from(self.config.user.parse::<Mailbox>()?)
            .subject(format!("Motion detected at {}", notification.sensor_name));

        for recipient in &self.config.recipients {
            builder = builder.to(recipient.parse::<Mailbox>()?);
        }

        let body = format!(
            "Motion detected at {} at {}.",
            notification.sensor_name,
            notification.trigger_time.format("%H:%M:%S"),
        );

        let attachment_name = format!("{}.jpg", notification.trigger_time.format("%H-%M-%S"));
        let jpeg = ContentType::parse("image/jpeg").map_err(|e| EmailError::Build(e.to_string()))?;

        builder
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(body))
                    .singlepart(
                        Attachment::new(attachment_name).body(notification.snapshot.clone(), jpeg),
                    ),
            )
            .map_err(|e| EmailError::Build(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
