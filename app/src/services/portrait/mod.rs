// app/src/services/portrait/mod.rs

pub mod placeholder;
pub mod prompt;

use crate::errors::{AppError, Result as AppResult};
use crate::models::{AddonSet, QuizAnswers};
use crate::services::ai_client::ImageModel;
use crate::services::storage::{path_string, unique_file_name};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

pub const PORTRAIT_SIZE: (u32, u32) = (1024, 1024);
pub const STORY_SIZE: (u32, u32) = (1080, 1920);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
  Model,
  Placeholder,
}

impl ImageSource {
  pub fn as_str(&self) -> &'static str {
    match self {
      ImageSource::Model => "model",
      ImageSource::Placeholder => "placeholder",
    }
  }
}

#[derive(Debug, Clone)]
pub struct PortraitOutput {
  /// Square crop.
  pub image_path: String,
  /// Tall story crop.
  pub share_path: String,
  pub source: ImageSource,
  pub prompt: String,
  /// Vector source of the placeholder, written next to the crops when it was used.
  pub placeholder_svg_path: Option<String>,
}

pub struct PortraitGenerator {
  model: Option<Box<dyn ImageModel>>,
  output_dir: PathBuf,
}

impl PortraitGenerator {
  pub fn new(model: Option<Box<dyn ImageModel>>, output_dir: impl Into<PathBuf>) -> Self {
    Self {
      model,
      output_dir: output_dir.into(),
    }
  }

  /// Produces both crops. Model unavailability never fails this call; only writing the
  /// files can.
  #[instrument(name = "portrait::generate", skip(self, quiz, addons))]
  pub async fn generate(&self, style: &str, quiz: &QuizAnswers, addons: &AddonSet) -> AppResult<PortraitOutput> {
    let prompt = prompt::build_image_prompt(style, quiz, addons);

    let generated = match self.model.as_ref() {
      Some(model) => match model.generate(&prompt).await {
        Ok(bytes) => match image::load_from_memory(&bytes) {
          Ok(img) => Some(img),
          Err(e) => {
            warn!(error = %e, "Generated image could not be decoded; using placeholder.");
            None
          }
        },
        Err(e) => {
          warn!(error = %format!("{:#}", e), "Image generation failed; using placeholder.");
          None
        }
      },
      None => {
        info!("No image model configured; using placeholder.");
        None
      }
    };

    tokio::fs::create_dir_all(&self.output_dir).await?;

    let (source_image, source, placeholder_svg_path) = match generated {
      Some(img) => (img, ImageSource::Model, None),
      None => {
        let svg = placeholder::placeholder_svg(style, quiz.display_name());
        let svg_path = self.write_file("placeholder", "svg", svg.as_bytes()).await?;
        let raster = tokio::task::spawn_blocking(move || placeholder::rasterize_svg(&svg))
          .await
          .map_err(|e| AppError::Image(format!("Placeholder rendering task failed: {}", e)))??;
        (raster, ImageSource::Placeholder, Some(svg_path))
      }
    };

    let (portrait_png, story_png) = tokio::task::spawn_blocking(move || -> AppResult<(Vec<u8>, Vec<u8>)> {
      Ok((
        encode_crop(&source_image, PORTRAIT_SIZE)?,
        encode_crop(&source_image, STORY_SIZE)?,
      ))
    })
    .await
    .map_err(|e| AppError::Image(format!("Crop task failed: {}", e)))??;

    let image_path = self.write_file("portrait", "png", &portrait_png).await?;
    let share_path = self.write_file("story", "png", &story_png).await?;

    info!(source = source.as_str(), image_path = %image_path, share_path = %share_path, "Portrait written.");
    Ok(PortraitOutput {
      image_path,
      share_path,
      source,
      prompt,
      placeholder_svg_path,
    })
  }

  async fn write_file(&self, prefix: &str, ext: &str, bytes: &[u8]) -> AppResult<String> {
    let path = self.output_dir.join(unique_file_name(prefix, ext));
    tokio::fs::write(&path, bytes).await?;
    Ok(path_string(&path))
  }

  pub fn output_dir(&self) -> &Path {
    &self.output_dir
  }
}

/// Center crop filling `(width, height)`, PNG-encoded.
pub fn encode_crop(source: &DynamicImage, (width, height): (u32, u32)) -> AppResult<Vec<u8>> {
  let cropped = source.resize_to_fill(width, height, FilterType::Triangle);
  let mut bytes = Vec::new();
  cropped
    .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
    .map_err(|e| AppError::Image(format!("PNG encoding failed: {}", e)))?;
  Ok(bytes)
}
