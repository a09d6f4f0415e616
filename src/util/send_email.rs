use crate::config::config::Config;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("invalid mail address : {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("error building mail : {0}")]
    Build(#[from] lettre::error::Error),
    #[error("error sending mail : {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send_mail(&self, to: &[String], subject: &str, body: &str) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &Config) -> Self {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .expect("Failed to create SMTP transport")
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_username.to_owned(),
                config.smtp_password.to_owned(),
            ))
            .build();

        SmtpMailer {
            transport,
            from: config.smtp_from.to_owned(),
        }
    }
}

#[async_trait]
impl MailSender for SmtpMailer {
    async fn send_mail(&self, to: &[String], subject: &str, body: &str) -> Result<(), MailError> {
        let mut builder = Message::builder()
            .from(self.from.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML);

        for recipient in to {
            builder = builder.to(recipient.parse()?);
        }

        let message = builder.body(body.to_string())?;
        self.transport.send(message).await?;

        Ok(())
    }
}

pub fn verification_email_body(url: &str) -> String {
    format!(
        "<p>Thanks for signing up. Please verify your email address by \
         clicking the link below.</p><p><a href=\"{url}\">Verify my email</a></p>\
         <p>The link expires in 15 minutes.</p>"
    )
}

pub fn reset_password_email_body(url: &str) -> String {
    format!(
        "<p>We received a request to reset your password. Click the link \
         below to choose a new one.</p><p><a href=\"{url}\">Change my password</a></p>\
         <p>If you did not request this, you can ignore this email.</p>"
    )
}
