use super::kv::{KeyValueStorage, StorageError};
use async_trait::async_trait;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::task;

/// Storage backend keeping one `<key>.json` file per key inside a single
/// directory. Writes go through a temp file and an atomic rename, so a
/// crash mid-write leaves the previous value intact.
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open a storage directory, creating it if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Open the per-user default directory (`~/.backburner`)
    pub fn open_default() -> Result<Self, StorageError> {
        Self::open(Self::default_dir()?)
    }

    /// Resolve the per-user default directory without creating it
    pub fn default_dir() -> Result<PathBuf, StorageError> {
        let home = dirs::home_dir()
            .ok_or_else(|| StorageError::Backend("could not determine home directory".into()))?;
        Ok(home.join(".backburner"))
    }

    /// The directory this backend reads and writes
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.key_path(key);
        run_blocking(move || {
            if !path.exists() {
                return Ok(None);
            }
            Ok(Some(fs::read_to_string(&path)?))
        })
        .await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let path = self.key_path(key);
        run_blocking(move || atomic_write(&path, &value)).await
    }
}

/// Atomically write content to a file using temp file + rename
fn atomic_write(path: &Path, content: &str) -> Result<(), StorageError> {
    let dir = path.parent().ok_or_else(|| {
        StorageError::Backend(format!("file path has no parent directory: {}", path.display()))
    })?;

    // Create temp file in the same directory so the rename stays on one filesystem
    let mut temp_file = NamedTempFile::new_in(dir)?;
    temp_file.write_all(content.as_bytes())?;
    temp_file.as_file().sync_all()?;
    temp_file
        .persist(path)
        .map_err(|err| StorageError::Io(err.error))?;

    Ok(())
}

/// Run file I/O on the blocking pool, off the async workers
async fn run_blocking<T>(
    work: impl FnOnce() -> Result<T, StorageError> + Send + 'static,
) -> Result<T, StorageError>
where
    T: Send + 'static,
{
    match task::spawn_blocking(work).await {
        Ok(result) => result,
        Err(err) => Err(StorageError::Backend(format!("storage task failed: {err}"))),
    }
}
