//! Backing-store access for a warehouse.
//!
//! Everything the catalog persists goes through this module: namespace
//! metadata, per-table commit logs and Parquet batch files. Paths are always
//! relative to a [`StorageLocation`] root so that higher layers never build
//! absolute paths by hand.
//!
//! Two write primitives carry the concurrency story of the whole crate:
//!
//! - [`write_atomic`] replaces a file atomically (temp file + rename). Used
//!   for the `CURRENT` hint, where last-writer-wins is acceptable.
//! - [`write_new`] creates a file only if it does not exist yet and never
//!   exposes partially written contents (temp file + hard link). Used for
//!   commit files and namespace markers, where exactly one writer must win.
//!
//! Only the local filesystem is supported, but callers only see
//! [`StorageLocation`], so an object-store backend can be slotted in later.

mod error;

pub use error::{BackendError, StorageError};
use error::{AlreadyExistsSnafu, NotFoundSnafu, OtherIoSnafu};

use std::{
    io,
    path::{Path, PathBuf},
};

use snafu::IntoError;
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

/// General result type used by storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Root of a region of the backing store (a warehouse, a namespace, or a table).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageLocation {
    /// A directory on the local filesystem.
    Local(PathBuf),
}

impl StorageLocation {
    /// Creates a new location rooted at a local filesystem path.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        StorageLocation::Local(root.into())
    }

    /// Return a location rooted at `rel` below this one.
    pub fn child(&self, rel: impl AsRef<Path>) -> Self {
        match self {
            StorageLocation::Local(root) => StorageLocation::Local(root.join(rel)),
        }
    }

    /// Human-readable form of the root, used in errors and logs.
    pub fn display(&self) -> String {
        match self {
            StorageLocation::Local(root) => root.display().to_string(),
        }
    }
}

fn join_local(location: &StorageLocation, rel: &Path) -> PathBuf {
    match location {
        StorageLocation::Local(root) => root.join(rel),
    }
}

/// Map an I/O error on `path` into the matching [`StorageError`] variant.
fn classify(path: &Path, e: io::Error) -> StorageError {
    let path = path.display().to_string();
    let kind = e.kind();
    let source = BackendError::Local(e);
    match kind {
        io::ErrorKind::NotFound => NotFoundSnafu { path }.into_error(source),
        io::ErrorKind::AlreadyExists => AlreadyExistsSnafu { path }.into_error(source),
        _ => OtherIoSnafu { path }.into_error(source),
    }
}

async fn create_parent_dir(abs: &Path) -> StorageResult<()> {
    if let Some(parent) = abs.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| classify(parent, e))?;
    }
    Ok(())
}

/// Temp path next to `abs`, unique per call so concurrent writers never share one.
fn unique_tmp_path(abs: &Path) -> PathBuf {
    let file_name = abs
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    abs.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()))
}

/// Removes a temporary file on drop unless disarmed.
struct TempFileGuard {
    path: PathBuf,
    armed: bool,
}

impl TempFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if self.armed {
            // Best effort; we are usually already unwinding another error.
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

async fn write_synced(path: &Path, contents: &[u8]) -> StorageResult<()> {
    let mut file = fs::File::create(path).await.map_err(|e| classify(path, e))?;
    file.write_all(contents)
        .await
        .map_err(|e| classify(path, e))?;
    file.sync_all().await.map_err(|e| classify(path, e))?;
    Ok(())
}

/// Make sure the root directory of `location` exists.
///
/// This is how the catalog probes reachability of the backing store.
pub async fn ensure_root(location: &StorageLocation) -> StorageResult<()> {
    match location {
        StorageLocation::Local(root) => {
            fs::create_dir_all(root)
                .await
                .map_err(|e| classify(root, e))?;
            let meta = fs::metadata(root).await.map_err(|e| classify(root, e))?;
            if !meta.is_dir() {
                return Err(classify(root, io::Error::other("not a directory")));
            }
            Ok(())
        }
    }
}

/// Write `contents` to `rel_path` inside `location`, atomically replacing
/// any previous file.
///
/// Writes a uniquely named temp file next to the target, syncs it, and
/// renames it into place. Parent directories are created as needed.
pub async fn write_atomic(
    location: &StorageLocation,
    rel_path: &Path,
    contents: &[u8],
) -> StorageResult<()> {
    match location {
        StorageLocation::Local(_) => {
            let abs = join_local(location, rel_path);
            create_parent_dir(&abs).await?;

            let tmp_path = unique_tmp_path(&abs);
            let mut guard = TempFileGuard::new(tmp_path.clone());

            write_synced(&tmp_path, contents).await?;

            fs::rename(&tmp_path, &abs)
                .await
                .map_err(|e| classify(&abs, e))?;

            guard.disarm();
            Ok(())
        }
    }
}

/// Create a *new* file at `rel_path` holding `contents`, failing with
/// [`StorageError::AlreadyExists`] if the file already exists.
///
/// The payload is fully written and synced to a temp file first, then
/// hard-linked to the target name. `link(2)` refuses to replace an existing
/// entry, so exactly one of several racing writers succeeds, and readers
/// never observe a half-written file.
pub async fn write_new(
    location: &StorageLocation,
    rel_path: &Path,
    contents: &[u8],
) -> StorageResult<()> {
    match location {
        StorageLocation::Local(_) => {
            let abs = join_local(location, rel_path);
            create_parent_dir(&abs).await?;

            let tmp_path = unique_tmp_path(&abs);
            // The temp name is always removed: after a successful link the
            // target keeps its own directory entry.
            let _guard = TempFileGuard::new(tmp_path.clone());

            write_synced(&tmp_path, contents).await?;

            fs::hard_link(&tmp_path, &abs)
                .await
                .map_err(|e| classify(&abs, e))?;

            Ok(())
        }
    }
}

/// Read the file at `rel_path` as UTF-8 text.
///
/// A missing file yields [`StorageError::NotFound`].
pub async fn read_to_string(location: &StorageLocation, rel_path: &Path) -> StorageResult<String> {
    match location {
        StorageLocation::Local(_) => {
            let abs = join_local(location, rel_path);
            fs::read_to_string(&abs)
                .await
                .map_err(|e| classify(&abs, e))
        }
    }
}

/// Read the full contents of the file at `rel_path`.
pub async fn read_all_bytes(location: &StorageLocation, rel_path: &Path) -> StorageResult<Vec<u8>> {
    match location {
        StorageLocation::Local(_) => {
            let abs = join_local(location, rel_path);
            fs::read(&abs).await.map_err(|e| classify(&abs, e))
        }
    }
}

/// Whether a file or directory exists at `rel_path`.
pub async fn exists(location: &StorageLocation, rel_path: &Path) -> StorageResult<bool> {
    match location {
        StorageLocation::Local(_) => {
            let abs = join_local(location, rel_path);
            fs::try_exists(&abs).await.map_err(|e| classify(&abs, e))
        }
    }
}

/// Remove the file at `rel_path`. A file that is already gone is not an error.
pub async fn remove_file(location: &StorageLocation, rel_path: &Path) -> StorageResult<()> {
    match location {
        StorageLocation::Local(_) => {
            let abs = join_local(location, rel_path);
            match fs::remove_file(&abs).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(classify(&abs, e)),
            }
        }
    }
}

/// List the names of the sub-directories directly under `rel_path`, sorted.
///
/// A missing directory lists as empty.
pub async fn list_dirs(location: &StorageLocation, rel_path: &Path) -> StorageResult<Vec<String>> {
    match location {
        StorageLocation::Local(_) => {
            let abs = join_local(location, rel_path);
            let mut entries = match fs::read_dir(&abs).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(classify(&abs, e)),
            };

            let mut names = Vec::new();
            while let Some(entry) = entries.next_entry().await.map_err(|e| classify(&abs, e))? {
                let file_type = entry.file_type().await.map_err(|e| classify(&abs, e))?;
                if file_type.is_dir() {
                    names.push(entry.file_name().to_string_lossy().into_owned());
                }
            }
            names.sort();
            Ok(names)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[tokio::test]
    async fn write_atomic_creates_parent_directories() -> TestResult {
        let tmp = TempDir::new()?;
        let location = StorageLocation::local(tmp.path());
        let rel = Path::new("nested/deep/file.txt");

        write_atomic(&location, rel, b"nested content").await?;

        let read_back = tokio::fs::read_to_string(tmp.path().join(rel)).await?;
        assert_eq!(read_back, "nested content");
        Ok(())
    }

    #[tokio::test]
    async fn write_atomic_overwrites_and_leaves_no_temp_files() -> TestResult {
        let tmp = TempDir::new()?;
        let location = StorageLocation::local(tmp.path());
        let rel = Path::new("CURRENT");

        write_atomic(&location, rel, b"1\n").await?;
        write_atomic(&location, rel, b"2\n").await?;

        assert_eq!(read_to_string(&location, rel).await?, "2\n");
        let leftovers: Vec<_> = std::fs::read_dir(tmp.path())?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn read_to_string_returns_not_found_for_missing_file() -> TestResult {
        let tmp = TempDir::new()?;
        let location = StorageLocation::local(tmp.path());

        let err = read_to_string(&location, Path::new("missing.txt"))
            .await
            .expect_err("expected NotFound");
        assert!(matches!(err, StorageError::NotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn write_new_fails_if_file_exists_and_keeps_original() -> TestResult {
        let tmp = TempDir::new()?;
        let location = StorageLocation::local(tmp.path());
        let rel = Path::new("log/0000000001.json");

        write_new(&location, rel, b"first").await?;
        let err = write_new(&location, rel, b"second")
            .await
            .expect_err("expected AlreadyExists");

        assert!(matches!(err, StorageError::AlreadyExists { .. }));
        assert_eq!(read_to_string(&location, rel).await?, "first");

        let leftovers: Vec<_> = std::fs::read_dir(tmp.path().join("log"))?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn write_new_has_exactly_one_winner_under_contention() -> TestResult {
        let tmp = TempDir::new()?;
        let location = StorageLocation::local(tmp.path());

        let mut handles = Vec::new();
        for i in 0..16 {
            let location = location.clone();
            handles.push(tokio::spawn(async move {
                write_new(&location, Path::new("race.json"), format!("{i}").as_bytes()).await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            match handle.await? {
                Ok(()) => winners += 1,
                Err(StorageError::AlreadyExists { .. }) => {}
                Err(other) => return Err(other.into()),
            }
        }
        assert_eq!(winners, 1);
        Ok(())
    }

    #[tokio::test]
    async fn list_dirs_is_sorted_and_ignores_files() -> TestResult {
        let tmp = TempDir::new()?;
        let location = StorageLocation::local(tmp.path());
        std::fs::create_dir_all(tmp.path().join("b"))?;
        std::fs::create_dir_all(tmp.path().join("a"))?;
        std::fs::write(tmp.path().join("file.txt"), b"x")?;

        assert_eq!(list_dirs(&location, Path::new("")).await?, vec!["a", "b"]);
        assert!(list_dirs(&location, Path::new("nope")).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn remove_file_tolerates_missing_file() -> TestResult {
        let tmp = TempDir::new()?;
        let location = StorageLocation::local(tmp.path());
        let rel = Path::new("data/batch.parquet");

        write_new(&location, rel, b"PAR1").await?;
        remove_file(&location, rel).await?;
        remove_file(&location, rel).await?;
        assert!(!exists(&location, rel).await?);
        Ok(())
    }
}
