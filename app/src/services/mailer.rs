// app/src/services/mailer.rs

//! Customer email: order confirmations and report delivery.
//!
//! With SMTP settings the message goes out through `lettre`; without them the message is
//! recorded in `email_log.json` and reported with method `logged`.

use crate::config::SmtpSettings;
use crate::errors::{AppError, Result as AppResult};
use crate::models::{AddonSet, Tier};
use crate::services::json_log::RollingJsonLog;
use chrono::Utc;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Serialize;
use serde_json::json;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

pub const EMAIL_LOG_FILE: &str = "email_log.json";
pub const EMAIL_LOG_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailKind {
  OrderConfirmation,
  ReportDelivery,
}

/// Details substituted into the templates.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
  pub order_id: String,
  pub tier: Tier,
  pub addons: AddonSet,
  pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
  pub subject: String,
  pub html: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
  Smtp,
  Logged,
}

impl DeliveryMethod {
  pub fn as_str(&self) -> &'static str {
    match self {
      DeliveryMethod::Smtp => "smtp",
      DeliveryMethod::Logged => "logged",
    }
  }
}

#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
  pub method: DeliveryMethod,
  pub subject: String,
}

fn addon_bullets(addons: &AddonSet) -> String {
  let mut html = String::new();
  for addon in addons.iter() {
    let _ = write!(html, "<li>{}</li>", addon.display_name());
  }
  html
}

pub fn render_email(kind: EmailKind, meta: &ReportMeta) -> RenderedEmail {
  let tier_name = meta.tier.display_name();
  match kind {
    EmailKind::OrderConfirmation => RenderedEmail {
      subject: format!("Your {} order is confirmed", tier_name),
      html: format!(
        "<h1>Thank you for your order!</h1>\
         <p>We have received your <strong>{tier}</strong> order (reference {id}).</p>\
         <p>Complete the short quiz and upload a photo, and we will prepare your personal reading.</p>\
         <ul><li>{tier}</li>{addons}</ul>\
         <p>With love,<br>The Soulsketch team</p>",
        tier = tier_name,
        id = meta.order_id,
        addons = addon_bullets(&meta.addons),
      ),
    },
    EmailKind::ReportDelivery => RenderedEmail {
      subject: format!("{}, your {} is ready", meta.display_name, tier_name),
      html: format!(
        "<h1>Your soulmate reading is here, {name}!</h1>\
         <p>Your <strong>{tier}</strong> report is attached as a PDF, together with your portrait.</p>\
         <p>Included in your reading:</p>\
         <ul><li>Soulmate portrait</li><li>Personality &amp; connection profile</li>{addons}</ul>\
         <p>With love,<br>The Soulsketch team</p>",
        name = meta.display_name,
        tier = tier_name,
        addons = addon_bullets(&meta.addons),
      ),
    },
  }
}

#[derive(Debug, Clone, Serialize)]
struct AttachmentRecord {
  file_name: String,
  size: u64,
}

pub struct Mailer {
  transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
  from: String,
  log: RollingJsonLog,
}

fn build_transport(smtp: &SmtpSettings) -> AppResult<AsyncSmtpTransport<Tokio1Executor>> {
  let builder = if smtp.secure {
    AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)
  } else {
    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
  }
  .map_err(|e| AppError::Config(format!("Failed to create SMTP transport: {}", e)))?;

  Ok(
    builder
      .port(smtp.port)
      .credentials(Credentials::new(smtp.username.clone(), smtp.password.clone()))
      .build(),
  )
}

fn file_name(path: &Path) -> String {
  path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| "attachment".to_string())
}

impl Mailer {
  pub fn new(smtp: Option<&SmtpSettings>, from: &str, log_dir: &Path) -> AppResult<Self> {
    let transport = smtp.map(build_transport).transpose()?;
    Ok(Self {
      transport,
      from: from.to_string(),
      log: RollingJsonLog::new(log_dir.join(EMAIL_LOG_FILE), EMAIL_LOG_CAPACITY),
    })
  }

  pub fn uses_smtp(&self) -> bool {
    self.transport.is_some()
  }

  pub fn log(&self) -> &RollingJsonLog {
    &self.log
  }

  #[instrument(name = "mailer::send_confirmation", skip_all, fields(order_id = %meta.order_id))]
  pub async fn send_confirmation(&self, recipient: &str, meta: &ReportMeta) -> AppResult<DeliveryReceipt> {
    let email = render_email(EmailKind::OrderConfirmation, meta);
    self.deliver(EmailKind::OrderConfirmation, recipient, email, Vec::new(), meta).await
  }

  /// Sends the finished report. The PDF must exist; the image is attached when present.
  #[instrument(name = "mailer::send_report", skip_all, fields(order_id = %meta.order_id))]
  pub async fn send_report(
    &self,
    recipient: &str,
    pdf_path: &Path,
    image_path: Option<&Path>,
    meta: &ReportMeta,
  ) -> AppResult<DeliveryReceipt> {
    if !tokio::fs::try_exists(pdf_path).await.unwrap_or(false) {
      return Err(AppError::Email(format!("PDF attachment {} does not exist", pdf_path.display())));
    }

    let mut attachments = vec![pdf_path.to_path_buf()];
    if let Some(image) = image_path {
      if tokio::fs::try_exists(image).await.unwrap_or(false) {
        attachments.push(image.to_path_buf());
      }
    }

    let email = render_email(EmailKind::ReportDelivery, meta);
    self.deliver(EmailKind::ReportDelivery, recipient, email, attachments, meta).await
  }

  async fn deliver(
    &self,
    kind: EmailKind,
    recipient: &str,
    email: RenderedEmail,
    attachments: Vec<PathBuf>,
    meta: &ReportMeta,
  ) -> AppResult<DeliveryReceipt> {
    let method = match self.transport.as_ref() {
      Some(transport) => {
        let message = self.build_message(recipient, &email, &attachments).await?;
        transport
          .send(message)
          .await
          .map_err(|e| AppError::Email(format!("Failed to send email via SMTP: {}", e)))?;
        DeliveryMethod::Smtp
      }
      None => {
        let mut records = Vec::with_capacity(attachments.len());
        for path in &attachments {
          let size = tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0);
          records.push(AttachmentRecord {
            file_name: file_name(path),
            size,
          });
        }
        self
          .log
          .append(json!({
            "timestamp": Utc::now().to_rfc3339(),
            "kind": kind,
            "method": DeliveryMethod::Logged,
            "to": recipient,
            "subject": email.subject,
            "attachments": records,
            "metadata": meta,
          }))
          .await?;
        DeliveryMethod::Logged
      }
    };

    info!(method = method.as_str(), "Email delivered.");
    Ok(DeliveryReceipt {
      method,
      subject: email.subject,
    })
  }

  async fn build_message(&self, recipient: &str, email: &RenderedEmail, attachments: &[PathBuf]) -> AppResult<Message> {
    let builder = Message::builder()
      .from(
        self
          .from
          .parse()
          .map_err(|e| AppError::Email(format!("Invalid from address: {}", e)))?,
      )
      .to(
        recipient
          .parse()
          .map_err(|e| AppError::Email(format!("Invalid recipient address: {}", e)))?,
      )
      .subject(&email.subject);

    let mut body = MultiPart::mixed().singlepart(SinglePart::html(email.html.clone()));
    for path in attachments {
      let bytes = tokio::fs::read(path).await?;
      let content_type = match path.extension().and_then(|e| e.to_str()) {
        Some("pdf") => ContentType::parse("application/pdf"),
        Some("png") => ContentType::parse("image/png"),
        _ => ContentType::parse("application/octet-stream"),
      }
      .map_err(|e| AppError::Email(format!("Invalid attachment content type: {}", e)))?;
      body = body.singlepart(Attachment::new(file_name(path)).body(bytes, content_type));
    }

    builder
      .multipart(body)
      .map_err(|e| AppError::Email(format!("Failed to build email: {}", e)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn meta(addons: &[&str]) -> ReportMeta {
    ReportMeta {
      order_id: "order-1".to_string(),
      tier: Tier::Plus,
      addons: AddonSet::from_names(addons.iter().copied()),
      display_name: "Mara".to_string(),
    }
  }

  #[test]
  fn templates_substitute_tier_and_addons() {
    let confirmation = render_email(EmailKind::OrderConfirmation, &meta(&[]));
    assert!(confirmation.subject.contains("Soulmate Sketch Plus"));
    assert!(confirmation.html.contains("order-1"));

    let delivery = render_email(EmailKind::ReportDelivery, &meta(&["aura", "past_life"]));
    assert!(delivery.subject.starts_with("Mara"));
    assert!(delivery.html.contains("<li>Aura Reading</li>"));
    assert!(delivery.html.contains("<li>Past Life Connection</li>"));
  }

  #[tokio::test]
  async fn without_smtp_the_email_is_logged() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("report.pdf");
    tokio::fs::write(&pdf, b"%PDF-1.5 test").await.unwrap();

    let mailer = Mailer::new(None, "Soulsketch <noreply@soulsketch.local>", dir.path()).unwrap();
    let receipt = mailer.send_report("a@b.com", &pdf, None, &meta(&["aura"])).await.unwrap();
    assert_eq!(receipt.method, DeliveryMethod::Logged);

    let entries = mailer.log().entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["to"], "a@b.com");
    assert_eq!(entries[0]["method"], "logged");
    assert_eq!(entries[0]["attachments"][0]["file_name"], "report.pdf");
    assert_eq!(entries[0]["attachments"][0]["size"], 13);
  }

  #[tokio::test]
  async fn missing_pdf_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mailer = Mailer::new(None, "noreply@soulsketch.local", dir.path()).unwrap();
    let err = mailer
      .send_report("a@b.com", &dir.path().join("nope.pdf"), None, &meta(&[]))
      .await
      .unwrap_err();
    assert!(matches!(err, AppError::Email(_)));
    assert!(mailer.log().entries().await.is_empty());
  }
}
