//! Reconstructing table state by replaying log commits.
//!
//! `TableState` materializes what is stored in `_catalog_log/`:
//! [`TransactionLogStore::rebuild_table_state`] walks commits from version 1
//! up to the head and applies their actions in order. Batches stay in commit
//! order, which is the order scans return rows in.
use chrono::{DateTime, Utc};
use snafu::prelude::*;

use crate::transaction_log::*;

/// In-memory view of a table reconstructed from the log.
///
/// Invariant: `table_meta` and `batches` are the result of applying commits
/// 1 through `version` in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableState {
    /// Version this state was rebuilt at.
    pub version: u64,
    /// Metadata from the creation commit.
    pub table_meta: TableMeta,
    /// Committed batches, oldest first.
    pub batches: Vec<BatchMeta>,
}

impl TableState {
    /// Total rows across all batches.
    pub fn row_count(&self) -> u64 {
        self.batches.iter().map(|b| b.row_count).sum()
    }
}

/// Summary of one commit, as reported by table history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// Commit version.
    pub version: u64,
    /// When the commit was written.
    pub timestamp: DateTime<Utc>,
    /// Whether this commit created the table.
    pub created_table: bool,
    /// Rows appended by this commit.
    pub rows_added: u64,
}

impl From<&Commit> for CommitInfo {
    fn from(commit: &Commit) -> Self {
        Self {
            version: commit.version,
            timestamp: commit.timestamp,
            created_table: commit
                .actions
                .iter()
                .any(|a| matches!(a, LogAction::CreateTable(_))),
            rows_added: commit.appended_rows(),
        }
    }
}

impl TransactionLogStore {
    /// Read the table metadata from the creation commit.
    ///
    /// Returns `Storage(NotFound)` when the table has never been created.
    pub async fn load_table_meta(&self) -> Result<TableMeta, CommitError> {
        let commit = self.load_commit(1).await?;
        commit
            .actions
            .into_iter()
            .find_map(|action| match action {
                LogAction::CreateTable(meta) => Some(meta),
                LogAction::AppendBatch(_) => None,
            })
            .context(CorruptStateSnafu {
                msg: "commit 1 does not create the table".to_string(),
            })
    }

    /// Rebuild the TableState at the current head.
    ///
    /// A log with no commits is an uninitialized table and yields
    /// `CommitError::CorruptState`; callers that need "not found" semantics
    /// check the head first.
    pub async fn rebuild_table_state(&self) -> Result<TableState, CommitError> {
        let head = self.load_current_version().await?;
        self.rebuild_table_state_at(head).await
    }

    /// Rebuild the TableState as of `version` by replaying commits
    /// `1..=version`.
    pub async fn rebuild_table_state_at(&self, version: u64) -> Result<TableState, CommitError> {
        if version == 0 {
            return CorruptStateSnafu {
                msg: "Cannot rebuild TableState at version 0 (no commits)".to_string(),
            }
            .fail();
        }

        let mut table_meta: Option<TableMeta> = None;
        let mut batches: Vec<BatchMeta> = Vec::new();

        for v in 1..=version {
            let commit = self.load_commit(v).await?;

            ensure!(
                commit.version == v,
                CorruptStateSnafu {
                    msg: format!(
                        "Commit version mismatch: expected {v}, found {} in payload",
                        commit.version
                    ),
                }
            );

            for action in commit.actions {
                match action {
                    LogAction::CreateTable(meta) => {
                        ensure!(
                            v == 1 && table_meta.is_none(),
                            CorruptStateSnafu {
                                msg: format!("CreateTable found in commit {v}"),
                            }
                        );
                        table_meta = Some(meta);
                    }
                    LogAction::AppendBatch(batch) => {
                        ensure!(
                            table_meta.is_some(),
                            CorruptStateSnafu {
                                msg: format!("AppendBatch in commit {v} before table creation"),
                            }
                        );
                        batches.push(batch);
                    }
                }
            }
        }

        let table_meta = table_meta.context(CorruptStateSnafu {
            msg: format!("No CreateTable found in commits up to version {version}"),
        })?;

        Ok(TableState {
            version,
            table_meta,
            batches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{LogicalDataType, LogicalField, LogicalSchema};
    use crate::storage::{StorageError, StorageLocation};
    use tempfile::TempDir;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn create_test_log_store() -> (TempDir, TransactionLogStore) {
        let tmp = TempDir::new().expect("create temp dir");
        let location = StorageLocation::local(tmp.path());
        let store = TransactionLogStore::new(location);
        (tmp, store)
    }

    fn sample_table_meta() -> TableMeta {
        let schema = LogicalSchema::new(vec![LogicalField {
            name: "id".to_string(),
            data_type: LogicalDataType::Int64,
            nullable: false,
        }])
        .expect("valid schema");
        TableMeta::new("ns1.events", schema)
    }

    fn append(id: &str, rows: u64) -> LogAction {
        LogAction::AppendBatch(BatchMeta::new(BatchId::from(id), rows))
    }

    #[tokio::test]
    async fn rebuild_replays_batches_in_commit_order() -> TestResult {
        let (_tmp, store) = create_test_log_store();
        let meta = sample_table_meta();

        store
            .commit_with_expected_version(0, vec![LogAction::CreateTable(meta.clone())])
            .await?;
        store.commit_with_expected_version(1, vec![append("b1", 10)]).await?;
        store.commit_with_expected_version(2, vec![append("b2", 5)]).await?;

        let state = store.rebuild_table_state().await?;
        assert_eq!(state.version, 3);
        assert_eq!(state.table_meta, meta);
        let ids: Vec<&str> = state.batches.iter().map(|b| b.batch_id.0.as_str()).collect();
        assert_eq!(ids, vec!["b1", "b2"]);
        assert_eq!(state.row_count(), 15);
        Ok(())
    }

    #[tokio::test]
    async fn rebuild_at_older_version_ignores_later_commits() -> TestResult {
        let (_tmp, store) = create_test_log_store();
        store
            .commit_with_expected_version(0, vec![LogAction::CreateTable(sample_table_meta())])
            .await?;
        store.commit_with_expected_version(1, vec![append("b1", 10)]).await?;
        store.commit_with_expected_version(2, vec![append("b2", 5)]).await?;

        let state = store.rebuild_table_state_at(2).await?;
        assert_eq!(state.version, 2);
        assert_eq!(state.batches.len(), 1);

        let state = store.rebuild_table_state_at(1).await?;
        assert!(state.batches.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn rebuild_without_commits_is_corrupt() -> TestResult {
        let (_tmp, store) = create_test_log_store();
        let err = store
            .rebuild_table_state()
            .await
            .expect_err("expected CorruptState");
        assert!(matches!(err, CommitError::CorruptState { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn first_commit_without_create_table_is_corrupt() -> TestResult {
        let (_tmp, store) = create_test_log_store();
        store.commit_with_expected_version(0, vec![append("b1", 1)]).await?;

        let err = store
            .rebuild_table_state()
            .await
            .expect_err("expected CorruptState");
        assert!(matches!(err, CommitError::CorruptState { .. }));

        let err = store.load_table_meta().await.expect_err("expected CorruptState");
        assert!(matches!(err, CommitError::CorruptState { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn second_create_table_is_corrupt() -> TestResult {
        let (_tmp, store) = create_test_log_store();
        store
            .commit_with_expected_version(0, vec![LogAction::CreateTable(sample_table_meta())])
            .await?;
        store
            .commit_with_expected_version(1, vec![LogAction::CreateTable(sample_table_meta())])
            .await?;

        let err = store
            .rebuild_table_state()
            .await
            .expect_err("expected CorruptState");
        assert!(matches!(err, CommitError::CorruptState { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn load_table_meta_on_missing_table_is_not_found() -> TestResult {
        let (_tmp, store) = create_test_log_store();
        let err = store.load_table_meta().await.expect_err("expected NotFound");
        assert!(matches!(
            err,
            CommitError::Storage {
                source: StorageError::NotFound { .. }
            }
        ));
        Ok(())
    }
}
