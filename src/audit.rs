//! Append-only request audit log.
//!
//! One line per processed video reference: timestamp, requester identity and
//! the reference itself. Fire-and-forget: the log is never read back and a
//! write failure only produces a warning.

use crate::video::VideoId;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Writer for the request audit log.
#[derive(Clone)]
pub struct RequestLog {
    path: PathBuf,
}

impl RequestLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Append one audit record. Errors are logged and swallowed.
    pub async fn record(&self, user_id: i64, username: &str, video: &VideoId) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let line = format!(
            "{}, User ID: {}, Username: {}, Video: {}\n",
            timestamp, user_id, username, video
        );

        if let Err(e) = self.append(&line).await {
            warn!("Failed to write request audit log: {}", e);
        }
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_appends_lines() {
        let dir = std::env::temp_dir().join(format!("referat-audit-{}", std::process::id()));
        let path = dir.join("requests.log");
        let log = RequestLog::new(&path);
        let video = crate::video::extract_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap();

        log.record(42, "alice", &video).await;
        log.record(43, "bob", &video).await;

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("User ID: 42"));
        assert!(lines[0].contains("Username: alice"));
        assert!(lines[1].contains("dQw4w9WgXcQ"));

        tokio::fs::remove_dir_all(&dir).await.ok();
    }
}
