// src/notify/email.rs
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::{render_digest_html, NotifyError};
use crate::feed::CanonicalRecord;

pub struct EmailSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailSender {
    /// Build the sender from SMTP_* / NOTIFY_EMAIL_* env vars. A missing or
    /// malformed value fails this send attempt, not the pipeline run.
    pub fn from_env() -> Result<Self, NotifyError> {
        let host = require_env("SMTP_HOST")?;
        let user = require_env("SMTP_USER")?;
        let pass = require_env("SMTP_PASS")?;
        let from_addr = require_env("NOTIFY_EMAIL_FROM")?;
        let to_addr = require_env("NOTIFY_EMAIL_TO")?;

        let creds = Credentials::new(user, pass);
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
            .map_err(|e| NotifyError::InvalidConfig(format!("SMTP_HOST: {e}")))?
            .credentials(creds)
            .build();

        let from = from_addr
            .parse()
            .map_err(|e| NotifyError::InvalidConfig(format!("NOTIFY_EMAIL_FROM: {e}")))?;
        let to = to_addr
            .parse()
            .map_err(|e| NotifyError::InvalidConfig(format!("NOTIFY_EMAIL_TO: {e}")))?;

        Ok(Self { mailer, from, to })
    }

    /// Send the rendered digest for an already filtered, ordered record set.
    pub async fn send_digest(&self, records: &[CanonicalRecord]) -> Result<(), NotifyError> {
        let subject = format!("Tender watch: {} new listings", records.len());
        let body = render_digest_html(records);

        let msg = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(header::ContentType::TEXT_HTML)
            .body(body)?;

        self.mailer.send(msg).await?;
        Ok(())
    }
}

fn require_env(key: &'static str) -> Result<String, NotifyError> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(NotifyError::MissingConfig(key)),
    }
}
