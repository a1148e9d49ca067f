// app/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::path::{Path, PathBuf};

/// SMTP transport settings. Present only when host, user and password are all set.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
  pub host: String,
  pub port: u16,
  pub username: String,
  pub password: String,
  /// Implicit TLS (usually port 465) instead of STARTTLS.
  pub secure: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub upload_dir: PathBuf,
  pub log_dir: PathBuf,
  pub email_from: String,

  // AI text generation
  pub openai_api_key: Option<String>,
  pub openai_base_url: String,
  pub text_model: String,

  // AI image generation
  pub image_api_key: Option<String>,
  pub image_model: String,

  pub stripe_secret_key: Option<String>,
  pub smtp: Option<SmtpSettings>,

  pub file_max_age_hours: u64,
  pub http_timeout_secs: u64,
}

/// Reads an env var, treating unset and blank the same.
fn optional_env(var_name: &str) -> Option<String> {
  env::var(var_name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_or(var_name: &str, default: &str) -> String {
  optional_env(var_name).unwrap_or_else(|| default.to_string())
}

fn parse_env<T: std::str::FromStr>(var_name: &str, default: T) -> Result<T>
where
  T::Err: std::fmt::Display,
{
  match optional_env(var_name) {
    Some(raw) => raw
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", var_name, raw, e))),
    None => Ok(default),
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let server_host = env_or("SERVER_HOST", "127.0.0.1");
    let server_port = parse_env::<u16>("SERVER_PORT", 8080)?;
    let database_url = env_or("DATABASE_URL", "sqlite://data/soulsketch.db");

    let smtp = match (optional_env("SMTP_HOST"), optional_env("SMTP_USER"), optional_env("SMTP_PASS")) {
      (Some(host), Some(username), Some(password)) => Some(SmtpSettings {
        host,
        port: parse_env::<u16>("SMTP_PORT", 587)?,
        username,
        password,
        secure: parse_env::<bool>("SMTP_SECURE", false)?,
      }),
      _ => None,
    };

    let config = Self {
      server_host,
      server_port,
      database_url,
      upload_dir: PathBuf::from(env_or("UPLOAD_DIR", "uploads")),
      log_dir: PathBuf::from(env_or("LOG_DIR", "logs")),
      email_from: env_or("EMAIL_FROM", "Soulsketch <noreply@soulsketch.local>"),
      openai_api_key: optional_env("OPENAI_API_KEY"),
      openai_base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
      text_model: env_or("TEXT_MODEL", "gpt-4o-mini"),
      image_api_key: optional_env("IMAGE_API_KEY"),
      image_model: env_or("IMAGE_MODEL", "dall-e-3"),
      stripe_secret_key: optional_env("STRIPE_SECRET_KEY"),
      smtp,
      file_max_age_hours: parse_env::<u64>("FILE_MAX_AGE_HOURS", 72)?,
      http_timeout_secs: parse_env::<u64>("HTTP_TIMEOUT_SECS", 120)?,
    };

    tracing::info!(
      text_ai = config.openai_api_key.is_some(),
      image_ai = config.image_api_key.is_some(),
      payments_live = config.stripe_secret_key.is_some(),
      smtp = config.smtp.is_some(),
      "Application configuration loaded."
    );
    Ok(config)
  }

  /// Self-contained configuration rooted at `root`: SQLite file, uploads and logs all
  /// live below it, and every external integration runs in fallback mode.
  pub fn local(root: &Path) -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 0,
      database_url: format!("sqlite://{}", root.join("soulsketch.db").display()),
      upload_dir: root.join("uploads"),
      log_dir: root.join("logs"),
      email_from: "Soulsketch <noreply@soulsketch.local>".to_string(),
      openai_api_key: None,
      openai_base_url: "https://api.openai.com/v1".to_string(),
      text_model: "gpt-4o-mini".to_string(),
      image_api_key: None,
      image_model: "dall-e-3".to_string(),
      stripe_secret_key: None,
      smtp: None,
      file_max_age_hours: 72,
      http_timeout_secs: 120,
    }
  }
}
