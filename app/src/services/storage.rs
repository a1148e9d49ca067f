// app/src/services/storage.rs

//! Artifact directories and file naming.

use crate::config::AppConfig;
use crate::errors::Result;
use chrono::Utc;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Creates the upload and log directories. Called once at startup.
pub async fn ensure_directories(config: &AppConfig) -> Result<()> {
  tokio::fs::create_dir_all(&config.upload_dir).await?;
  tokio::fs::create_dir_all(&config.log_dir).await?;
  Ok(())
}

/// `<prefix>_<unix-millis>_<rand>.<ext>`; unique across calls in the same millisecond.
pub fn unique_file_name(prefix: &str, extension: &str) -> String {
  let millis = Utc::now().timestamp_millis();
  let suffix = &Uuid::new_v4().simple().to_string()[..8];
  format!("{}_{}_{}.{}", prefix, millis, suffix, extension)
}

pub fn unique_path(dir: &Path, prefix: &str, extension: &str) -> PathBuf {
  dir.join(unique_file_name(prefix, extension))
}

/// Extension for an uploaded file, taken from its client-side name. Defaults to `jpg`.
pub fn upload_extension(original_name: Option<&str>) -> String {
  original_name
    .and_then(|name| Path::new(name).extension())
    .and_then(|ext| ext.to_str())
    .map(|ext| ext.to_ascii_lowercase())
    .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
    .unwrap_or_else(|| "jpg".to_string())
}

pub fn path_string(path: &Path) -> String {
  path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn file_names_are_prefixed_and_unique() {
    let a = unique_file_name("portrait", "png");
    let b = unique_file_name("portrait", "png");
    assert!(a.starts_with("portrait_") && a.ends_with(".png"));
    assert_ne!(a, b);
  }

  #[test]
  fn upload_extension_is_sanitized() {
    assert_eq!(upload_extension(Some("me.PNG")), "png");
    assert_eq!(upload_extension(Some("noext")), "jpg");
    assert_eq!(upload_extension(Some("x.p/ng")), "jpg");
    assert_eq!(upload_extension(None), "jpg");
  }
}
