// app/src/services/json_log.rs

use crate::errors::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A JSON array on disk holding the most recent `capacity` entries.
///
/// Appends read the whole file, push, truncate from the front and write it back. There is
/// no locking; concurrent appends can drop an entry.
#[derive(Debug, Clone)]
pub struct RollingJsonLog {
  path: PathBuf,
  capacity: usize,
}

impl RollingJsonLog {
  pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Self {
    Self {
      path: path.into(),
      capacity: capacity.max(1),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Current entries. A missing or unreadable file counts as empty.
  pub async fn entries(&self) -> Vec<Value> {
    let raw = match tokio::fs::read_to_string(&self.path).await {
      Ok(raw) => raw,
      Err(_) => return Vec::new(),
    };
    match serde_json::from_str::<Vec<Value>>(&raw) {
      Ok(entries) => entries,
      Err(e) => {
        warn!(path = %self.path.display(), error = %e, "Rolling log is not a JSON array; starting over.");
        Vec::new()
      }
    }
  }

  pub async fn append(&self, entry: Value) -> Result<()> {
    let mut entries = self.entries().await;
    entries.push(entry);
    if entries.len() > self.capacity {
      let excess = entries.len() - self.capacity;
      entries.drain(..excess);
    }

    if let Some(parent) = self.path.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }
    let body = serde_json::to_vec_pretty(&entries)?;
    tokio::fs::write(&self.path, body).await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[tokio::test]
  async fn keeps_only_most_recent_entries() {
    let dir = tempfile::tempdir().unwrap();
    let log = RollingJsonLog::new(dir.path().join("nested/log.json"), 3);

    for i in 0..5 {
      log.append(json!({ "n": i })).await.unwrap();
    }

    let entries = log.entries().await;
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["n"], 2);
    assert_eq!(entries[2]["n"], 4);
  }

  #[tokio::test]
  async fn corrupt_file_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.json");
    tokio::fs::write(&path, "not json").await.unwrap();

    let log = RollingJsonLog::new(&path, 10);
    log.append(json!({ "ok": true })).await.unwrap();
    assert_eq!(log.entries().await.len(), 1);
  }
}
