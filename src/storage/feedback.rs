use std::path::Path;

use anyhow::Context;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};

struct FeedbackInner {
    file: File,
    // a failed append may have left a partial line on disk
    dirty: bool,
}

/// Append-only sink for free-text user feedback, one `user,message` line
/// per submission. Write-only: nothing in the service reads it back.
pub struct FeedbackLog {
    inner: Mutex<FeedbackInner>,
}

impl FeedbackLog {
    /// Opens the log at `path`, creating the file and parent directories
    /// if missing. An existing file that ends mid-line is sealed with a
    /// newline so the next submission starts a fresh line.
    pub async fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("creating log directory {}", parent.display()))?;
            }
        }

        let torn_tail = match tokio::fs::read(path).await {
            Ok(content) => !content.is_empty() && content.last() != Some(&b'\n'),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                return Err(e).with_context(|| format!("reading feedback log {}", path.display()))
            }
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .with_context(|| format!("opening feedback log {}", path.display()))?;
        if torn_tail {
            file.write_all(b"\n")
                .await
                .with_context(|| format!("sealing feedback log {}", path.display()))?;
            file.flush()
                .await
                .with_context(|| format!("sealing feedback log {}", path.display()))?;
            tracing::warn!(
                path = %path.display(),
                "Sealed a torn trailing line in the feedback log"
            );
        }

        Ok(Self {
            inner: Mutex::new(FeedbackInner { file, dirty: false }),
        })
    }

    /// Appends one submission. Line breaks in either field are flattened
    /// to spaces so every submission stays a single line.
    pub async fn append(&self, user: &str, message: &str) -> AppResult<()> {
        let line = format!("{},{}\n", flatten(user), flatten(message));
        let mut inner = self.inner.lock().await;
        if inner.dirty {
            write_line(&mut inner.file, "\n").await?;
            inner.dirty = false;
        }
        inner.dirty = true;
        write_line(&mut inner.file, &line).await?;
        inner.dirty = false;
        Ok(())
    }
}

async fn write_line(file: &mut File, line: &str) -> AppResult<()> {
    file.write_all(line.as_bytes())
        .await
        .map_err(|e| AppError::LogAppend(e.to_string()))?;
    file.flush()
        .await
        .map_err(|e| AppError::LogAppend(e.to_string()))
}

fn flatten(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_appends_one_line_per_submission() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feedback.log");
        let log = FeedbackLog::open(&path).await.unwrap();

        log.append("alice", "more dice games please").await.unwrap();
        log.append("bob", "loved it").await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "alice,more dice games please\nbob,loved it\n");
    }

    #[tokio::test]
    async fn test_flattens_line_breaks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feedback.log");
        let log = FeedbackLog::open(&path).await.unwrap();

        log.append("alice", "first\nsecond\r\nthird").await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert_eq!(content, "alice,first second  third\n");
    }

    #[tokio::test]
    async fn test_append_after_torn_line_starts_fresh() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feedback.log");
        // an interrupted write left no trailing newline
        std::fs::write(&path, "alice,first thoughts").unwrap();

        let log = FeedbackLog::open(&path).await.unwrap();
        log.append("bob", "loved it").await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "alice,first thoughts\nbob,loved it\n");
    }

    #[tokio::test]
    async fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("logs").join("feedback.log");

        let log = FeedbackLog::open(&path).await.unwrap();
        log.append("alice", "hello").await.unwrap();

        assert!(path.exists());
    }
}
