use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};
use crate::models::{Algorithm, Outcome, UsageEntry};

/// Append-only record of which methods each user has judged.
///
/// Implementations must serialize appends so concurrent writers never
/// interleave or lose lines, and a read must only ever see fully committed
/// entries, in commit order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsageLog: Send + Sync {
    /// Durably commits one entry.
    async fn append(&self, entry: UsageEntry) -> AppResult<()>;

    /// Every committed entry for one user, oldest first.
    async fn entries_for(&self, user: &str) -> AppResult<Vec<UsageEntry>>;
}

struct LogInner {
    file: File,
    entries: Vec<UsageEntry>,
    // a failed append may have left a partial line on disk
    dirty: bool,
}

/// Usage log backed by a plain-text file, one `user,method,outcome` line
/// per entry.
///
/// The file is hydrated into an in-memory mirror at open time; reads never
/// touch the disk afterwards. Appends write and flush the line under the
/// write lock before the mirror is updated, so an entry becomes readable
/// only once it is on disk. After a failed append the next write opens a
/// fresh line first, so a half-written line cannot run into a later entry.
pub struct FileUsageLog {
    inner: RwLock<LogInner>,
}

impl FileUsageLog {
    /// Opens the log at `path`, creating the file (and parent directories)
    /// if missing, and replays any existing lines. Lines that do not parse
    /// are skipped with a warning; a torn final line from an interrupted
    /// append falls into that bucket and is sealed with a newline so the
    /// next append starts a fresh line.
    pub async fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("creating log directory {}", parent.display()))?;
            }
        }

        let (entries, torn_tail) = match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                let torn = !content.is_empty() && !content.ends_with('\n');
                (hydrate(&content, path), torn)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => (Vec::new(), false),
            Err(e) => {
                return Err(e).with_context(|| format!("reading usage log {}", path.display()))
            }
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .with_context(|| format!("opening usage log {}", path.display()))?;
        if torn_tail {
            file.write_all(b"\n")
                .await
                .with_context(|| format!("sealing usage log {}", path.display()))?;
            file.flush()
                .await
                .with_context(|| format!("sealing usage log {}", path.display()))?;
            tracing::warn!(
                path = %path.display(),
                "Sealed a torn trailing line in the usage log"
            );
        }

        tracing::info!(
            path = %path.display(),
            entries = entries.len(),
            "Usage log opened"
        );

        Ok(Self {
            inner: RwLock::new(LogInner {
                file,
                entries,
                dirty: false,
            }),
        })
    }
}

#[async_trait]
impl UsageLog for FileUsageLog {
    async fn append(&self, entry: UsageEntry) -> AppResult<()> {
        if entry.user.is_empty() || entry.user.contains([',', '\n', '\r']) {
            return Err(AppError::InvalidInput(format!(
                "user id {:?} cannot be stored in the usage log",
                entry.user
            )));
        }

        let line = encode_line(&entry);
        let mut inner = self.inner.write().await;
        if inner.dirty {
            write_line(&mut inner.file, "\n").await?;
            inner.dirty = false;
        }
        inner.dirty = true;
        write_line(&mut inner.file, &line).await?;
        inner.dirty = false;
        inner.entries.push(entry);
        Ok(())
    }

    async fn entries_for(&self, user: &str) -> AppResult<Vec<UsageEntry>> {
        let inner = self.inner.read().await;
        Ok(inner
            .entries
            .iter()
            .filter(|entry| entry.user == user)
            .cloned()
            .collect())
    }
}

/// Usage log held entirely in memory. Suits tests and embedded callers
/// that do not want anything on disk.
#[derive(Default)]
pub struct MemoryUsageLog {
    entries: RwLock<Vec<UsageEntry>>,
}

impl MemoryUsageLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageLog for MemoryUsageLog {
    async fn append(&self, entry: UsageEntry) -> AppResult<()> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn entries_for(&self, user: &str) -> AppResult<Vec<UsageEntry>> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|entry| entry.user == user)
            .cloned()
            .collect())
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

fn encode_line(entry: &UsageEntry) -> String {
    format!(
        "{},{},{}\n",
        entry.user,
        entry.algorithm.as_str(),
        entry.outcome.as_bit()
    )
}

fn parse_line(line: &str) -> Option<UsageEntry> {
    let mut parts = line.split(',');
    let user = parts.next()?;
    let algorithm = Algorithm::parse(parts.next()?)?;
    let outcome = Outcome::from_bit(parts.next()?)?;
    if user.is_empty() || parts.next().is_some() {
        return None;
    }
    Some(UsageEntry {
        user: user.to_string(),
        algorithm,
        outcome,
    })
}

fn hydrate(content: &str, path: &Path) -> Vec<UsageEntry> {
    let mut entries = Vec::new();
    for (i, line) in content.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(entry) => entries.push(entry),
            None => tracing::warn!(
                path = %path.display(),
                line = i + 1,
                "Skipping malformed usage log line"
            ),
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio_test::assert_ok;

    fn entry(user: &str, algorithm: Algorithm, outcome: Outcome) -> UsageEntry {
        UsageEntry {
            user: user.to_string(),
            algorithm,
            outcome,
        }
    }

    #[tokio::test]
    async fn test_append_then_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let log = FileUsageLog::open(dir.path().join("usage.log")).await.unwrap();

        assert_ok!(log.append(entry("alice", Algorithm::Svd, Outcome::Positive)).await);
        assert_ok!(log.append(entry("alice", Algorithm::Als, Outcome::Negative)).await);

        let entries = log.entries_for("alice").await.unwrap();
        assert_eq!(
            entries,
            vec![
                entry("alice", Algorithm::Svd, Outcome::Positive),
                entry("alice", Algorithm::Als, Outcome::Negative),
            ]
        );
    }

    #[tokio::test]
    async fn test_entries_scoped_per_user() {
        let dir = TempDir::new().unwrap();
        let log = FileUsageLog::open(dir.path().join("usage.log")).await.unwrap();

        log.append(entry("alice", Algorithm::Svd, Outcome::Positive))
            .await
            .unwrap();
        log.append(entry("bob", Algorithm::Cosine, Outcome::Negative))
            .await
            .unwrap();

        let entries = log.entries_for("bob").await.unwrap();
        assert_eq!(entries, vec![entry("bob", Algorithm::Cosine, Outcome::Negative)]);
        assert!(log.entries_for("carol").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hydrates_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("usage.log");
        std::fs::write(&path, "alice,svd,1\nalice,als,0\nbob,cos,1\n").unwrap();

        let log = FileUsageLog::open(&path).await.unwrap();

        let entries = log.entries_for("alice").await.unwrap();
        assert_eq!(
            entries,
            vec![
                entry("alice", Algorithm::Svd, Outcome::Positive),
                entry("alice", Algorithm::Als, Outcome::Negative),
            ]
        );
    }

    #[tokio::test]
    async fn test_skips_malformed_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("usage.log");
        std::fs::write(
            &path,
            "alice,svd,1\nnot a log line\nbob,pagerank,1\nbob,cos,7\nbob,cos,1\n",
        )
        .unwrap();

        let log = FileUsageLog::open(&path).await.unwrap();

        assert_eq!(log.entries_for("alice").await.unwrap().len(), 1);
        assert_eq!(
            log.entries_for("bob").await.unwrap(),
            vec![entry("bob", Algorithm::Cosine, Outcome::Positive)]
        );
    }

    #[tokio::test]
    async fn test_append_after_torn_line_stays_attributed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("usage.log");
        // an interrupted append left a partial line with no newline
        std::fs::write(&path, "alice,svd,1\nbo").unwrap();

        let log = FileUsageLog::open(&path).await.unwrap();
        log.append(entry("bob", Algorithm::Als, Outcome::Positive))
            .await
            .unwrap();
        assert_eq!(log.entries_for("bob").await.unwrap().len(), 1);

        // the committed entry must survive a rehydration intact
        let reopened = FileUsageLog::open(&path).await.unwrap();
        assert_eq!(
            reopened.entries_for("bob").await.unwrap(),
            vec![entry("bob", Algorithm::Als, Outcome::Positive)]
        );
        assert_eq!(reopened.entries_for("alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_reserved_characters_in_user() {
        let dir = TempDir::new().unwrap();
        let log = FileUsageLog::open(dir.path().join("usage.log")).await.unwrap();

        let err = log
            .append(entry("a,b", Algorithm::Svd, Outcome::Positive))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        // nothing was committed
        assert!(log.entries_for("a,b").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_appends_preserve_every_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("usage.log");
        let log = Arc::new(FileUsageLog::open(&path).await.unwrap());

        let mut handles = Vec::new();
        for task in 0..8 {
            let log = Arc::clone(&log);
            handles.push(tokio::spawn(async move {
                let user = format!("user{task}");
                for algorithm in Algorithm::ROTATION {
                    log.append(entry(&user, algorithm, Outcome::Positive))
                        .await
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // a fresh hydration from disk must see every line, well formed and
        // in per-user order
        let reopened = FileUsageLog::open(&path).await.unwrap();
        for task in 0..8 {
            let user = format!("user{task}");
            let methods: Vec<Algorithm> = reopened
                .entries_for(&user)
                .await
                .unwrap()
                .iter()
                .map(|e| e.algorithm)
                .collect();
            assert_eq!(methods, Algorithm::ROTATION.to_vec());
        }
    }

    #[tokio::test]
    async fn test_memory_log_round_trip() {
        let log = MemoryUsageLog::new();
        log.append(entry("alice", Algorithm::Cosine, Outcome::Negative))
            .await
            .unwrap();

        assert_eq!(
            log.entries_for("alice").await.unwrap(),
            vec![entry("alice", Algorithm::Cosine, Outcome::Negative)]
        );
        assert!(log.entries_for("bob").await.unwrap().is_empty());
    }
}
