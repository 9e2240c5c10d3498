//! Feedback persistence: a JSON array file rewritten on every append

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::FeedbackStats;

/// One stored feedback record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    /// RFC 3339 timestamp
    pub timestamp: String,
    pub question: String,
    pub answer: String,
    /// `like`, `dislike` or any other label
    pub feedback: String,
}

/// Append-only feedback file
pub struct FeedbackStore {
    path: PathBuf,
    lock: tokio::sync::Mutex<()>,
}

impl FeedbackStore {
    /// Open the store, creating the parent directory and an empty `[]` file when missing
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| persistence(&path, "create directory for", e))?;
        }

        if !tokio::fs::try_exists(&path)
            .await
            .map_err(|e| persistence(&path, "check", e))?
        {
            tokio::fs::write(&path, b"[]")
                .await
                .map_err(|e| persistence(&path, "initialize", e))?;
            tracing::info!("Created feedback file at {}", path.display());
        }

        Ok(Self {
            path,
            lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one feedback record
    pub async fn save_feedback(&self, question: &str, answer: &str, feedback: &str) -> Result<()> {
        let _guard = self.lock.lock().await;

        let mut entries = self.read_entries().await?;
        entries.push(FeedbackEntry {
            timestamp: Utc::now().to_rfc3339(),
            question: question.to_string(),
            answer: answer.to_string(),
            feedback: feedback.to_string(),
        });

        let data = serde_json::to_vec_pretty(&entries)
            .map_err(|e| Error::Persistence(format!("Failed to encode feedback: {}", e)))?;

        // Write a sibling file, then rename over the original
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data)
            .await
            .map_err(|e| persistence(&tmp, "write", e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| persistence(&self.path, "replace", e))?;

        tracing::debug!("Stored {} feedback ({} total)", feedback, entries.len());
        Ok(())
    }

    /// Count likes and dislikes
    pub async fn stats(&self) -> Result<FeedbackStats> {
        let _guard = self.lock.lock().await;
        let entries = self.read_entries().await?;

        let mut stats = FeedbackStats::default();
        for entry in &entries {
            match entry.feedback.as_str() {
                "like" => stats.likes += 1,
                "dislike" => stats.dislikes += 1,
                _ => {}
            }
        }
        Ok(stats)
    }

    async fn read_entries(&self) -> Result<Vec<FeedbackEntry>> {
        let raw = tokio::fs::read(&self.path)
            .await
            .map_err(|e| persistence(&self.path, "read", e))?;

        serde_json::from_slice(&raw).map_err(|e| {
            Error::Persistence(format!("Corrupt feedback file {}: {}", self.path.display(), e))
        })
    }
}

fn persistence(path: &Path, action: &str, err: std::io::Error) -> Error {
    Error::Persistence(format!("Failed to {} {}: {}", action, path.display(), err))
}
