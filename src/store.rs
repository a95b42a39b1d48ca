//! Library persistence: a JSON snapshot on disk.
//!
//! The snapshot is written atomically (temp file, fsync, rename) so a
//! crash mid-save never leaves a truncated library behind. Article
//! expiration happens once, at load, so a long-running process never
//! drops articles out from under the user.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::Library;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Library file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Loads the library, dropping articles past their retention window.
///
/// A missing file yields the default library (one empty "Default" group);
/// a present-but-corrupt file is an error, never silently replaced.
/// Saved articles are exempt from expiration. `default_days` applies to
/// groups that do not set their own retention.
pub fn load(path: &Path, default_days: i64) -> Result<Library, StoreError> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "No library file, starting fresh");
        return Ok(Library::default());
    }

    let content = std::fs::read_to_string(path)?;
    let mut library: Library = serde_json::from_str(&content)?;
    expire_articles(&mut library, default_days, Utc::now());
    Ok(library)
}

fn expire_articles(library: &mut Library, default_days: i64, now: DateTime<Utc>) {
    for group in &mut library.groups {
        let days = group.effective_days_to_keep(default_days);
        for feed in &mut group.feeds {
            let before = feed.articles.len();
            feed.articles
                .retain(|a| a.saved || !a.is_expired(days, now));
            let dropped = before - feed.articles.len();
            if dropped > 0 {
                tracing::debug!(feed = %feed.url, dropped = dropped, "Expired old articles");
            }
        }
    }
}

/// Saves the library atomically.
pub fn save(library: &Library, path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(library)?;

    // randomized temp name so a concurrent save cannot collide
    use std::time::{SystemTime, UNIX_EPOCH};
    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = path.with_extension(format!("tmp.{:016x}", random_suffix));

    let mut temp_file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)?;

    let written = temp_file
        .write_all(json.as_bytes())
        .and_then(|_| temp_file.sync_all());
    if let Err(e) = written {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }
    drop(temp_file);

    // rename is atomic on the same filesystem
    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }

    tracing::debug!(path = %path.display(), "Library saved");
    Ok(())
}
