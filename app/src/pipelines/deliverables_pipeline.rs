// app/src/pipelines/deliverables_pipeline.rs

//! validation → text_generation → image_generation → pdf_generation → email_delivery
//!
//! Every step is required and strictly sequential. A listener mirrors each step
//! transition into the run's audit log, which [`generate_deliverables`] persists to
//! `delivery_log.json` whatever the outcome.

use crate::errors::{AppError, Result as AppResult};
use crate::models::{Order, QuizAnswers};
use crate::pipelines::contexts::DeliverablesCtxData;
use crate::services::json_log::RollingJsonLog;
use crate::services::mailer::ReportMeta;
use crate::services::report::{write_report, ReportInput};
use crate::services::storage::{path_string, unique_path};
use crate::state::AppState;
use sketchflow::{ContextData, FlowRegistry, Pipeline, PipelineControl, PipelineResult, StepEvent};
use std::path::PathBuf;
use tracing::{error, info, instrument, warn};

pub const DELIVERY_LOG_FILE: &str = "delivery_log.json";
pub const DELIVERY_LOG_CAPACITY: usize = 200;

pub const STEPS: [&str; 5] = [
  "validation",
  "text_generation",
  "image_generation",
  "pdf_generation",
  "email_delivery",
];

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct Deliverables {
  pub image_path: String,
  pub share_path: String,
  pub pdf_path: String,
  pub profile_text: String,
  pub order: Order,
}

/// An email is usable if it has something on both sides of an `@`.
pub fn is_plausible_email(email: &str) -> bool {
  let email = email.trim();
  match email.split_once('@') {
    Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace),
    None => false,
  }
}

pub fn register_deliverables_pipeline(flows: &FlowRegistry<AppError>) {
  let step_defs: Vec<(&str, bool, Option<sketchflow::SkipCondition<DeliverablesCtxData>>)> =
    STEPS.iter().map(|name| (*name, false, None)).collect();
  let mut p = Pipeline::<DeliverablesCtxData, AppError>::new(&step_defs);

  p.add_listener(|event: &StepEvent, ctx_data: &ContextData<DeliverablesCtxData>| {
    ctx_data.update(|data| data.audit.record_event(event));
  });

  // Step 1: Validation
  p.on_step("validation", |ctx_data: ContextData<DeliverablesCtxData>| {
    Box::pin(async move {
      // Quiz preferences always resolve through their defaults; only the email can be missing.
      let email = ctx_data.with(|d| d.order.email.clone());
      if email.trim().is_empty() {
        return Err(AppError::Validation("Order has no delivery email.".to_string()));
      }
      if !is_plausible_email(&email) {
        return Err(AppError::Validation(format!("Delivery email '{}' is not valid.", email)));
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Step 2: Profile text (never fails; falls back to fixed text)
  p.on_step("text_generation", |ctx_data: ContextData<DeliverablesCtxData>| {
    Box::pin(async move {
      let (state, quiz, tier, addons) = ctx_data.with(|d| {
        (d.app_state.clone(), d.quiz.clone(), d.order.tier, d.order.addons.clone())
      });

      let profile = state.services.profile_writer.generate(&quiz, tier, &addons).await;
      info!(source = profile.source.as_str(), chars = profile.text.len(), "Profile text ready.");

      ctx_data.update(|d| {
        d.audit.note_source("text", profile.source.as_str());
        d.profile = Some(profile);
      });
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Step 3: Portrait (model or placeholder; only file writes can fail)
  p.on_step("image_generation", |ctx_data: ContextData<DeliverablesCtxData>| {
    Box::pin(async move {
      let (state, quiz, addons) = ctx_data.with(|d| (d.app_state.clone(), d.quiz.clone(), d.order.addons.clone()));
      let style = quiz.art_style().to_string();

      let portrait = state.services.portraits.generate(&style, &quiz, &addons).await?;

      ctx_data.update(|d| {
        d.audit.note_source("image", portrait.source.as_str());
        if let Some(svg_path) = &portrait.placeholder_svg_path {
          d.audit.note_source("placeholder_svg", svg_path);
        }
        d.portrait = Some(portrait);
      });
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Step 4: PDF
  p.on_step("pdf_generation", |ctx_data: ContextData<DeliverablesCtxData>| {
    Box::pin(async move {
      let input = ctx_data.with(|d| ReportInput {
        text: d.profile.as_ref().map(|p| p.text.clone()).unwrap_or_default(),
        image_path: d.portrait.as_ref().map(|p| PathBuf::from(&p.image_path)),
        tier: d.order.tier,
        addons: d.order.addons.clone(),
        display_name: d.quiz.display_name().to_string(),
        output_path: unique_path(&d.app_state.config.upload_dir, "report", "pdf"),
      });

      let pdf_path = write_report(input).await?;
      if !tokio::fs::try_exists(&pdf_path).await.unwrap_or(false) {
        return Err(AppError::Pdf(format!("Report {} was not written.", pdf_path.display())));
      }

      ctx_data.update(|d| d.pdf_path = Some(pdf_path));
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Step 5: Email
  p.on_step("email_delivery", |ctx_data: ContextData<DeliverablesCtxData>| {
    Box::pin(async move {
      let (state, recipient, pdf_path, image_path, meta) = ctx_data.with(|d| {
        (
          d.app_state.clone(),
          d.order.email.clone(),
          d.pdf_path.clone(),
          d.portrait.as_ref().map(|p| PathBuf::from(&p.image_path)),
          ReportMeta {
            order_id: d.order.id.clone(),
            tier: d.order.tier,
            addons: d.order.addons.clone(),
            display_name: d.quiz.display_name().to_string(),
          },
        )
      });
      let pdf_path = pdf_path.ok_or_else(|| AppError::Email("No PDF to attach.".to_string()))?;

      let receipt = state
        .services
        .mailer
        .send_report(&recipient, &pdf_path, image_path.as_deref(), &meta)
        .await?;

      ctx_data.update(|d| {
        d.audit.note_source("email", receipt.method.as_str());
        d.delivery = Some(receipt);
      });
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  flows.register_pipeline(p);
}

/// Pulls the artifact paths out of a completed run.
fn finished_artifacts(ctx_data: &ContextData<DeliverablesCtxData>) -> AppResult<(String, String, String, String)> {
  ctx_data.with(|d| {
    let portrait = d
      .portrait
      .as_ref()
      .ok_or_else(|| AppError::Internal("Pipeline completed without a portrait.".to_string()))?;
    let pdf_path = d
      .pdf_path
      .as_ref()
      .ok_or_else(|| AppError::Internal("Pipeline completed without a PDF.".to_string()))?;
    let text = d.profile.as_ref().map(|p| p.text.clone()).unwrap_or_default();
    Ok((portrait.image_path.clone(), portrait.share_path.clone(), path_string(pdf_path), text))
  })
}

async fn run_and_record(state: &AppState, ctx_data: &ContextData<DeliverablesCtxData>) -> AppResult<Deliverables> {
  match state.flows.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {}
    PipelineResult::Stopped => {
      return Err(AppError::Internal("Deliverables pipeline stopped before completion.".to_string()));
    }
  }

  let (image_path, share_path, pdf_path, profile_text) = finished_artifacts(ctx_data)?;
  let order_id = ctx_data.with(|d| d.order.id.clone());
  let order = state
    .store
    .record_deliverables(&order_id, &image_path, &share_path, &pdf_path)
    .await?;

  Ok(Deliverables {
    image_path,
    share_path,
    pdf_path,
    profile_text,
    order,
  })
}

/// Runs the deliverables pipeline for `order` and updates the order row on success.
///
/// Validation failures come back as `AppError::Validation`; any other failure is wrapped
/// into a single `AppError::Deliverables`. The audit log is persisted in every case.
#[instrument(name = "deliverables::generate", skip_all, fields(order_id = %order.id))]
pub async fn generate_deliverables(state: &AppState, order: Order) -> AppResult<Deliverables> {
  let quiz = match order.quiz_answers.clone() {
    Some(value) => serde_json::from_value::<QuizAnswers>(value).unwrap_or_else(|e| {
      warn!(error = %e, "Stored quiz answers are unreadable; using defaults.");
      QuizAnswers::default()
    }),
    None => QuizAnswers::default(),
  }
  .normalized();

  let ctx_data = ContextData::new(DeliverablesCtxData::new(state.clone(), order, quiz));
  let outcome = run_and_record(state, &ctx_data).await;

  ctx_data.update(|d| match &outcome {
    Ok(_) => d.audit.succeed(),
    Err(e) => d.audit.fail(e.to_string()),
  });

  let audit = ctx_data.with(|d| serde_json::to_value(&d.audit));
  let log = RollingJsonLog::new(state.config.log_dir.join(DELIVERY_LOG_FILE), DELIVERY_LOG_CAPACITY);
  match audit {
    Ok(entry) => {
      if let Err(e) = log.append(entry).await {
        error!(error = %e, "Failed to persist delivery audit log.");
      }
    }
    Err(e) => error!(error = %e, "Failed to serialize delivery audit log."),
  }

  match outcome {
    Ok(deliverables) => {
      info!(pdf = %deliverables.pdf_path, "Deliverables generated.");
      Ok(deliverables)
    }
    Err(AppError::Validation(message)) => Err(AppError::Validation(message)),
    Err(e) => {
      error!(error = %e, "Deliverables generation failed.");
      Err(AppError::Deliverables(e.to_string()))
    }
  }
}
