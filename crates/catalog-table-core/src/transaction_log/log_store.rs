//! Async helpers for persisting and reading a table's commit log.
//!
//! This module owns all on-disk interactions with `_catalog_log/`:
//! - Resolving the head version: start from the `CURRENT` hint (missing means
//!   `0`) and roll forward over commit files newer than the hint.
//! - Writing zero-padded commit files with create-if-absent semantics so each
//!   version is created exactly once.
//! - Mapping storage-layer failures into [`CommitError`] variants so callers
//!   can tell conflicts, storage errors, and corrupt state apart.
//!
//! Deciding which actions to commit is left to the caller.
use chrono::Utc;
use snafu::{Backtrace, prelude::*};
use tracing::{Span, debug, warn};

use crate::layout;
use crate::storage::{self, StorageError, StorageLocation};
use crate::transaction_log::actions::{Commit, LogAction};
use crate::transaction_log::table_state::CommitInfo;
use crate::transaction_log::*;

/// Helper for reading and writing the commit log under a table root.
///
/// Layout:
///   <root>/_catalog_log/0000000001.json
///   <root>/_catalog_log/0000000002.json
///   <root>/_catalog_log/CURRENT
#[derive(Debug, Clone)]
pub struct TransactionLogStore {
    location: StorageLocation,
    span: Span,
}

impl TransactionLogStore {
    /// Create a new TransactionLogStore rooted at a table directory.
    pub fn new(location: StorageLocation) -> Self {
        Self {
            location,
            span: Span::none(),
        }
    }

    /// Attach the span log events are recorded under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// The table root this store reads and writes under.
    pub fn location(&self) -> &StorageLocation {
        &self.location
    }

    async fn commit_exists(&self, version: u64) -> Result<bool, CommitError> {
        storage::exists(&self.location, &layout::commit_rel_path(version))
            .await
            .context(StorageSnafu)
    }

    /// Load a single commit by version.
    ///
    /// - On storage-layer failures, returns `CommitError::Storage`.
    /// - On JSON parse failures, returns `CommitError::CorruptState`.
    pub async fn load_commit(&self, version: u64) -> Result<Commit, CommitError> {
        let rel = layout::commit_rel_path(version);
        let json = storage::read_to_string(&self.location, &rel)
            .await
            .context(StorageSnafu)?;

        let commit = serde_json::from_str(&json).map_err(|e| CommitError::CorruptState {
            msg: format!("failed to parse commit {version}: {e}"),
            backtrace: Backtrace::capture(),
        })?;

        Ok(commit)
    }

    /// Load the raw CURRENT hint.
    ///
    /// - If CURRENT does not exist, returns 0.
    /// - If CURRENT contains invalid or empty content, returns CorruptState.
    pub async fn load_current_hint(&self) -> Result<u64, CommitError> {
        let rel = layout::current_rel_path();

        let contents = match storage::read_to_string(&self.location, &rel).await {
            Ok(s) => s,
            Err(StorageError::NotFound { .. }) => return Ok(0),
            Err(source) => return Err(CommitError::Storage { source }),
        };

        let trimmed = contents.trim();
        if trimmed.is_empty() {
            return CorruptStateSnafu {
                msg: format!("CURRENT has empty content at {rel:?}"),
            }
            .fail();
        }
        trimmed
            .parse::<u64>()
            .map_err(|e| CommitError::CorruptState {
                msg: format!("CURRENT has invalid content {trimmed:?}: {e}"),
                backtrace: Backtrace::capture(),
            })
    }

    /// Resolve the latest committed version.
    ///
    /// Starts at the CURRENT hint and probes `hint + 1`, `hint + 2`, ... until
    /// a commit file is missing. A hint naming a commit that does not exist
    /// is corrupt state. Returns 0 for a log with no commits.
    pub async fn load_current_version(&self) -> Result<u64, CommitError> {
        let hint = self.load_current_hint().await?;

        if hint > 0 && !self.commit_exists(hint).await? {
            return CorruptStateSnafu {
                msg: format!("CURRENT points to version {hint}, but that commit does not exist"),
            }
            .fail();
        }

        let mut version = hint;
        while self.commit_exists(version + 1).await? {
            version += 1;
        }

        if version != hint {
            debug!(parent: &self.span, hint, version, "rolled forward past stale CURRENT");
        }
        Ok(version)
    }

    /// Commit a new version with an optimistic concurrency guard.
    ///
    /// ## Concurrency semantics
    ///
    /// - The head check is advisory. Two writers may both observe the same
    ///   head and attempt the same next version; the real guard is the
    ///   create-if-absent write of the commit file.
    /// - A writer that loses that race gets `Storage(AlreadyExists)`.
    ///   [`CommitError::is_conflict`] treats it the same as `Conflict`.
    ///
    /// ## CURRENT
    ///
    /// Once the commit file exists the commit is durable. Updating CURRENT
    /// afterwards is best effort: a failure is logged and the new version is
    /// still returned, since readers roll forward past a stale hint.
    pub async fn commit_with_expected_version(
        &self,
        expected: u64,
        actions: Vec<LogAction>,
    ) -> Result<u64, CommitError> {
        let current = self.load_current_version().await?;
        if current != expected {
            return ConflictSnafu {
                expected,
                found: current,
            }
            .fail();
        }

        let version = expected.checked_add(1).context(CorruptStateSnafu {
            msg: "version counter overflow".to_string(),
        })?;

        let commit = Commit {
            version,
            base_version: expected,
            timestamp: Utc::now(),
            actions,
        };

        let json = serde_json::to_vec_pretty(&commit).map_err(|e| CommitError::CorruptState {
            msg: format!("failed to serialize commit {version}: {e}"),
            backtrace: Backtrace::capture(),
        })?;

        storage::write_new(&self.location, &layout::commit_rel_path(version), &json)
            .await
            .context(StorageSnafu)?;

        self.update_current_hint(version).await;

        Ok(version)
    }

    async fn update_current_hint(&self, version: u64) {
        let rel = layout::current_rel_path();
        let contents = format!("{version}\n");
        if let Err(e) = storage::write_atomic(&self.location, &rel, contents.as_bytes()).await {
            warn!(parent: &self.span, version, error = %e, "failed to update CURRENT after commit");
        }
    }

    /// Summaries of every committed version, oldest first.
    pub async fn history(&self) -> Result<Vec<CommitInfo>, CommitError> {
        let head = self.load_current_version().await?;
        let mut out = Vec::with_capacity(head as usize);
        for v in 1..=head {
            let commit = self.load_commit(v).await?;
            out.push(CommitInfo::from(&commit));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn create_test_log_store() -> (TempDir, TransactionLogStore) {
        let tmp = TempDir::new().expect("create temp dir");
        let location = StorageLocation::local(tmp.path());
        let store = TransactionLogStore::new(location);
        (tmp, store)
    }

    async fn write_current(tmp: &TempDir, contents: &str) -> TestResult {
        let log_dir = tmp.path().join(layout::LOG_DIR_NAME);
        tokio::fs::create_dir_all(&log_dir).await?;
        tokio::fs::write(log_dir.join(layout::CURRENT_FILE_NAME), contents).await?;
        Ok(())
    }

    #[tokio::test]
    async fn empty_log_has_version_zero() -> TestResult {
        let (_tmp, store) = create_test_log_store();
        assert_eq!(store.load_current_hint().await?, 0);
        assert_eq!(store.load_current_version().await?, 0);
        assert!(store.history().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn current_hint_tolerates_whitespace() -> TestResult {
        let (tmp, store) = create_test_log_store();
        write_current(&tmp, "  42  \n").await?;
        assert_eq!(store.load_current_hint().await?, 42);
        Ok(())
    }

    #[tokio::test]
    async fn current_hint_rejects_garbage() -> TestResult {
        let (tmp, store) = create_test_log_store();
        write_current(&tmp, "not-a-number").await?;

        let err = store.load_current_hint().await.expect_err("expected CorruptState");
        assert!(matches!(err, CommitError::CorruptState { .. }));

        write_current(&tmp, "").await?;
        let err = store.load_current_hint().await.expect_err("expected CorruptState");
        assert!(matches!(err, CommitError::CorruptState { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn current_pointing_at_missing_commit_is_corrupt() -> TestResult {
        let (tmp, store) = create_test_log_store();
        write_current(&tmp, "3\n").await?;

        let err = store
            .load_current_version()
            .await
            .expect_err("expected CorruptState");
        assert!(matches!(err, CommitError::CorruptState { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn sequential_commits_advance_head_and_current() -> TestResult {
        let (tmp, store) = create_test_log_store();

        assert_eq!(store.commit_with_expected_version(0, vec![]).await?, 1);
        assert_eq!(store.commit_with_expected_version(1, vec![]).await?, 2);
        assert_eq!(store.commit_with_expected_version(2, vec![]).await?, 3);

        assert_eq!(store.load_current_version().await?, 3);
        let current = tokio::fs::read_to_string(
            tmp.path()
                .join(layout::LOG_DIR_NAME)
                .join(layout::CURRENT_FILE_NAME),
        )
        .await?;
        assert_eq!(current, "3\n");
        assert!(
            tmp.path()
                .join(layout::LOG_DIR_NAME)
                .join("0000000002.json")
                .exists()
        );
        Ok(())
    }

    #[tokio::test]
    async fn stale_expected_version_is_a_conflict() -> TestResult {
        let (_tmp, store) = create_test_log_store();
        store.commit_with_expected_version(0, vec![]).await?;

        let err = store
            .commit_with_expected_version(0, vec![])
            .await
            .expect_err("expected Conflict");
        match &err {
            CommitError::Conflict {
                expected, found, ..
            } => {
                assert_eq!(*expected, 0);
                assert_eq!(*found, 1);
            }
            other => panic!("expected Conflict, got {other:?}"),
        }
        assert!(err.is_conflict());
        Ok(())
    }

    #[tokio::test]
    async fn head_rolls_forward_past_stale_current() -> TestResult {
        let (tmp, store) = create_test_log_store();
        store.commit_with_expected_version(0, vec![]).await?;
        store.commit_with_expected_version(1, vec![]).await?;

        // Simulate a writer that died after creating commit 2 but before
        // advancing CURRENT.
        write_current(&tmp, "1\n").await?;

        assert_eq!(store.load_current_hint().await?, 1);
        assert_eq!(store.load_current_version().await?, 2);
        assert_eq!(store.commit_with_expected_version(2, vec![]).await?, 3);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_commits_on_same_version_have_one_winner() -> TestResult {
        let (_tmp, store) = create_test_log_store();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.commit_with_expected_version(0, vec![]).await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            match handle.await? {
                Ok(v) => {
                    assert_eq!(v, 1);
                    winners += 1;
                }
                Err(e) if e.is_conflict() => {}
                Err(e) => return Err(e.into()),
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(store.load_current_version().await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn unparsable_commit_is_corrupt() -> TestResult {
        let (tmp, store) = create_test_log_store();
        let log_dir = tmp.path().join(layout::LOG_DIR_NAME);
        tokio::fs::create_dir_all(&log_dir).await?;
        tokio::fs::write(log_dir.join("0000000001.json"), b"{ not json").await?;

        let err = store.load_commit(1).await.expect_err("expected CorruptState");
        assert!(matches!(err, CommitError::CorruptState { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn history_lists_every_commit() -> TestResult {
        let (_tmp, store) = create_test_log_store();
        store
            .commit_with_expected_version(
                0,
                vec![LogAction::AppendBatch(BatchMeta::new(BatchId::from("a"), 4))],
            )
            .await?;
        store
            .commit_with_expected_version(
                1,
                vec![LogAction::AppendBatch(BatchMeta::new(BatchId::from("b"), 6))],
            )
            .await?;

        let history = store.history().await?;
        let summary: Vec<(u64, u64)> = history.iter().map(|c| (c.version, c.rows_added)).collect();
        assert_eq!(summary, vec![(1, 4), (2, 6)]);
        Ok(())
    }
}
