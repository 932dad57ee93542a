//! File-backed blocked list and log-backed progress

use std::{fmt::Write as _, path::PathBuf};

use async_trait::async_trait;
use herald_broadcast::{BlockedSink, Progress, ProgressSink, RecipientId};
use herald_common::internal;
use tokio::io::AsyncWriteExt;

/// Appends blocked recipient ids to a file, one per line
#[derive(Debug, Clone)]
pub struct FileBlockedSink {
    path: PathBuf,
}

impl FileBlockedSink {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl BlockedSink for FileBlockedSink {
    async fn persist_blocked(&self, recipients: &[RecipientId]) -> anyhow::Result<()> {
        let mut lines = String::new();
        for recipient in recipients {
            writeln!(lines, "{recipient}")?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(lines.as_bytes()).await?;
        file.flush().await?;

        tracing::info!(
            path = %self.path.display(),
            count = recipients.len(),
            "Recorded blocked recipients"
        );
        Ok(())
    }
}

/// Writes each progress snapshot to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

#[async_trait]
impl ProgressSink for LogProgress {
    async fn report(&self, progress: Progress) -> anyhow::Result<()> {
        internal!(
            level = INFO,
            "Progress: {}/{} ({} sent, {} failed)",
            progress.completed,
            progress.total,
            progress.sent,
            progress.failed
        );
        Ok(())
    }
}
