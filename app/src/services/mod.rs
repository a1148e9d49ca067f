// app/src/services/mod.rs

//! Outbound integrations and artifact writers used by the deliverables pipeline.
//!
//! Every provider-backed service is built from `AppConfig`: a live implementation when its
//! key is present, otherwise a deterministic fallback.

pub mod ai_client;
pub mod housekeeping;
pub mod json_log;
pub mod mailer;
pub mod payment;
pub mod portrait;
pub mod profile_text;
pub mod report;
pub mod storage;

use crate::config::AppConfig;
use crate::errors::Result as AppResult;
use ai_client::{http_client, ImageModel, OpenAiImageModel, OpenAiTextModel, TextModel};
use mailer::Mailer;
use payment::PaymentGateway;
use portrait::PortraitGenerator;
use profile_text::ProfileWriter;

/// All services the handlers and pipelines reach through `AppState`.
pub struct Services {
  pub payments: Box<dyn PaymentGateway>,
  pub profile_writer: ProfileWriter,
  pub portraits: PortraitGenerator,
  pub mailer: Mailer,
}

impl Services {
  pub fn from_config(config: &AppConfig) -> AppResult<Self> {
    let http = http_client(config.http_timeout_secs)?;

    let text_model: Option<Box<dyn TextModel>> = config.openai_api_key.as_deref().map(|key| {
      Box::new(OpenAiTextModel::new(http.clone(), &config.openai_base_url, key, &config.text_model)) as Box<dyn TextModel>
    });
    let image_model: Option<Box<dyn ImageModel>> = config.image_api_key.as_deref().map(|key| {
      Box::new(OpenAiImageModel::new(http.clone(), &config.openai_base_url, key, &config.image_model))
        as Box<dyn ImageModel>
    });

    Ok(Self {
      payments: payment::gateway_from_config(config.stripe_secret_key.as_deref()),
      profile_writer: ProfileWriter::new(text_model),
      portraits: PortraitGenerator::new(image_model, config.upload_dir.clone()),
      mailer: Mailer::new(config.smtp.as_ref(), &config.email_from, &config.log_dir)?,
    })
  }
}
