//! Email delivery through the `SendGrid` SMTP relay.
//!
//! Uses lettre with STARTTLS. `SendGrid` authenticates the relay with the
//! literal username `apikey` and the API key as password.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use super::notification::RenderedEmail;
use crate::config::EmailConfig;

/// SMTP username `SendGrid` expects for API key authentication.
const SENDGRID_SMTP_USERNAME: &str = "apikey";

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// A required credential is not configured.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Email service for owner notifications.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    owner: Mailbox,
}

impl std::fmt::Debug for EmailService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailService")
            .field("from", &self.from.to_string())
            .field("owner", &self.owner.to_string())
            .finish_non_exhaustive()
    }
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// `sender_name` is shown as the display name of the From header.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::NotConfigured` naming the first missing
    /// credential, `EmailError::InvalidAddress` for malformed addresses, or
    /// `EmailError::Smtp` if the relay host is invalid.
    pub fn new(config: &EmailConfig, sender_name: &str) -> Result<Self, EmailError> {
        if let Some(var) = config.first_missing() {
            return Err(EmailError::NotConfigured(var));
        }
        let (Some(api_key), Some(sender), Some(owner)) = (
            config.api_key.as_ref(),
            config.verified_sender.as_deref(),
            config.owner_email.as_deref(),
        ) else {
            return Err(EmailError::NotConfigured("SENDGRID_API_KEY"));
        };

        let from = Mailbox::new(Some(sender_name.to_string()), parse_address(sender)?);
        let owner = Mailbox::new(None, parse_address(owner)?);

        let credentials = Credentials::new(
            SENDGRID_SMTP_USERNAME.to_string(),
            api_key.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from,
            owner,
        })
    }

    /// Send a rendered email to the store owner.
    ///
    /// # Errors
    ///
    /// Returns error if the message cannot be built or the relay rejects it.
    pub async fn send_to_owner(&self, email: &RenderedEmail) -> Result<(), EmailError> {
        self.send_multipart_email(self.owner.clone(), &email.subject, &email.text, &email.html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: Mailbox,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let recipient = to.email.to_string();
        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %recipient, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

fn parse_address(address: &str) -> Result<lettre::Address, EmailError> {
    address
        .parse()
        .map_err(|_| EmailError::InvalidAddress(address.to_string()))
}
