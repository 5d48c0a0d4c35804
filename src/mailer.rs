use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, info};

use crate::config::MailConfig;

/// Out-of-band delivery of password-reset links.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, to: &str, reset_url: &str) -> anyhow::Result<()>;
}

pub(crate) const RESET_SUBJECT: &str = "Password Reset Request";

pub(crate) fn reset_email_html(reset_url: &str) -> String {
    format!(
        "<h2>Password Reset</h2>\
         <p>You requested a password reset. Click the link below (valid for 1 hour):</p>\
         <a href=\"{reset_url}\">{reset_url}</a>\
         <p>If you did not request this, ignore this email.</p>"
    )
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &MailConfig) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)
            .with_context(|| format!("smtp relay {}", cfg.host))?
            .port(cfg.port);
        if let (Some(user), Some(pass)) = (&cfg.username, &cfg.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        let from: Mailbox = cfg
            .from
            .parse()
            .with_context(|| format!("MAIL_FROM={}", cfg.from))?;
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_password_reset(&self, to: &str, reset_url: &str) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse().with_context(|| format!("recipient {to}"))?)
            .subject(RESET_SUBJECT)
            .header(ContentType::TEXT_HTML)
            .body(reset_email_html(reset_url))
            .context("build reset email")?;
        let response = self
            .transport
            .send(message)
            .await
            .context("smtp send")?;
        debug!(code = %response.code(), "smtp accepted reset email");
        Ok(())
    }
}

/// Used when no SMTP server is configured: records the attempt and succeeds.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, to: &str, _reset_url: &str) -> anyhow::Result<()> {
        info!(to = %to, "SMTP not configured; password reset email not sent");
        Ok(())
    }
}
