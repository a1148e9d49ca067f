// app/src/services/housekeeping.rs

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Deletes regular files directly inside `dir` last modified more than `max_age` ago.
/// Returns how many were removed.
pub async fn sweep_old_files(dir: &Path, max_age: Duration) -> std::io::Result<usize> {
  let cutoff = SystemTime::now().checked_sub(max_age).unwrap_or(SystemTime::UNIX_EPOCH);
  let mut removed = 0;

  let mut entries = match tokio::fs::read_dir(dir).await {
    Ok(entries) => entries,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
    Err(e) => return Err(e),
  };

  while let Some(entry) = entries.next_entry().await? {
    let metadata = match entry.metadata().await {
      Ok(m) if m.is_file() => m,
      _ => continue,
    };
    let Ok(modified) = metadata.modified() else {
      continue;
    };
    if modified < cutoff {
      match tokio::fs::remove_file(entry.path()).await {
        Ok(()) => {
          debug!(path = %entry.path().display(), "Removed expired file.");
          removed += 1;
        }
        Err(e) => warn!(path = %entry.path().display(), error = %e, "Could not remove expired file."),
      }
    }
  }
  Ok(removed)
}

/// Sweeps `dir` every `interval` for the lifetime of the runtime.
pub fn spawn_sweeper(dir: PathBuf, max_age: Duration, interval: Duration) -> JoinHandle<()> {
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(interval);
    loop {
      ticker.tick().await;
      match sweep_old_files(&dir, max_age).await {
        Ok(0) => {}
        Ok(removed) => info!(removed, dir = %dir.display(), "Housekeeping removed expired files."),
        Err(e) => warn!(dir = %dir.display(), error = %e, "Housekeeping sweep failed."),
      }
    }
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn removes_only_files_older_than_max_age() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("portrait_1.png");
    tokio::fs::write(&file, b"x").await.unwrap();
    tokio::fs::create_dir(dir.path().join("nested")).await.unwrap();

    assert_eq!(sweep_old_files(dir.path(), Duration::from_secs(3600)).await.unwrap(), 0);
    assert!(file.exists());

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(sweep_old_files(dir.path(), Duration::from_millis(1)).await.unwrap(), 1);
    assert!(!file.exists());
    assert!(dir.path().join("nested").exists());
  }

  #[tokio::test]
  async fn missing_directory_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(sweep_old_files(&dir.path().join("absent"), Duration::ZERO).await.unwrap(), 0);
  }
}
