// app/tests/common/mod.rs
#![allow(dead_code)]

use serde_json::Value;
use soulsketch_app::config::AppConfig;
use soulsketch_app::state::AppState;
use std::io::Cursor;
use tempfile::TempDir;

pub const BOUNDARY: &str = "----soulsketch-test-boundary";

/// Application state rooted in a fresh temporary directory, all integrations in fallback mode.
pub async fn local_state() -> (TempDir, AppState) {
  let dir = tempfile::tempdir().expect("tempdir");
  let state = AppState::build(AppConfig::local(dir.path()))
    .await
    .expect("state builds");
  (dir, state)
}

/// Test service with the full route table over `state`.
macro_rules! init_app {
  ($state:expr) => {
    actix_web::test::init_service(
      actix_web::App::new()
        .app_data(actix_web::web::Data::new($state.clone()))
        .configure(soulsketch_app::web::configure_app_routes),
    )
    .await
  };
}

/// Small PNG for photo uploads.
pub fn sample_png() -> Vec<u8> {
  let img = image::RgbImage::from_pixel(32, 32, image::Rgb([180, 140, 120]));
  let mut bytes = Vec::new();
  image::DynamicImage::ImageRgb8(img)
    .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
    .expect("png encodes");
  bytes
}

/// Hand-built `multipart/form-data` body. Returns `(content_type, body)`.
pub fn multipart_body(photo: Option<(&str, &[u8])>, quiz: Option<&str>) -> (String, Vec<u8>) {
  let mut body = Vec::new();
  if let Some((file_name, bytes)) = photo {
    body.extend_from_slice(
      format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
      )
      .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
  }
  if let Some(quiz) = quiz {
    body.extend_from_slice(
      format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"quiz\"\r\n\r\n{quiz}\r\n").as_bytes(),
    );
  }
  body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
  (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

pub async fn read_json_file(path: &std::path::Path) -> Vec<Value> {
  match tokio::fs::read_to_string(path).await {
    Ok(raw) => serde_json::from_str(&raw).expect("log is a JSON array"),
    Err(_) => Vec::new(),
  }
}
