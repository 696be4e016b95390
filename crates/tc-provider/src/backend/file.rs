//! JSON file backend: one file per record under a state directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rand::Rng;
use tc_proto::ResourceId;
use tokio::fs;
use tracing::{debug, warn};

use super::{Backend, BackendError, BackendResult, ResourceRecord};

/// Backend persisting records as `<dir>/<id>.json`.
///
/// Secret values are written in cleartext; the directory must be protected
/// accordingly.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Opens a state directory, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn open(dir: impl Into<PathBuf>) -> BackendResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(|source| BackendError::Io {
            path: dir.clone(),
            source,
        })?;
        debug!(dir = %dir.display(), "opened file backend");
        Ok(Self { dir })
    }

    fn path_for(&self, id: &ResourceId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    fn encode(path: &Path, record: &ResourceRecord) -> BackendResult<Vec<u8>> {
        serde_json::to_vec_pretty(record).map_err(|e| BackendError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Writes `bytes` to a fresh temporary file next to `path`.
    async fn write_temp(path: &Path, bytes: &[u8]) -> BackendResult<PathBuf> {
        let suffix: u32 = rand::thread_rng().r#gen();
        let tmp = path.with_extension(format!("json.{suffix:08x}.tmp"));
        fs::write(&tmp, bytes).await.map_err(|source| BackendError::Io {
            path: tmp.clone(),
            source,
        })?;
        Ok(tmp)
    }

    async fn discard_temp(tmp: &Path) {
        if let Err(e) = fs::remove_file(tmp).await {
            warn!(path = %tmp.display(), error = %e, "failed to remove temporary record");
        }
    }

    async fn read(&self, id: &ResourceId) -> BackendResult<Option<ResourceRecord>> {
        let path = self.path_for(id);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(BackendError::Io { path, source }),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| BackendError::Corrupt {
                path,
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl Backend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn insert(&self, record: ResourceRecord) -> BackendResult<()> {
        let path = self.path_for(&record.id);
        let bytes = Self::encode(&path, &record)?;

        // The record only appears under its final name once fully written.
        // Linking fails if the name is taken, so concurrent inserts of one id
        // cannot overwrite each other.
        let tmp = Self::write_temp(&path, &bytes).await?;
        let linked = fs::hard_link(&tmp, &path).await;
        Self::discard_temp(&tmp).await;
        match linked {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(BackendError::AlreadyExists(record.id))
            }
            Err(source) => Err(BackendError::Io { path, source }),
        }
    }

    async fn get(&self, id: &ResourceId) -> BackendResult<Option<ResourceRecord>> {
        self.read(id).await
    }

    async fn replace(&self, record: ResourceRecord) -> BackendResult<()> {
        let path = self.path_for(&record.id);
        if fs::metadata(&path).await.is_err() {
            return Err(BackendError::NotFound(record.id));
        }

        // Write then rename so readers never see a partial record.
        let bytes = Self::encode(&path, &record)?;
        let tmp = Self::write_temp(&path, &bytes).await?;
        if let Err(source) = fs::rename(&tmp, &path).await {
            Self::discard_temp(&tmp).await;
            return Err(BackendError::Io { path, source });
        }
        Ok(())
    }

    async fn remove(&self, id: &ResourceId) -> BackendResult<ResourceRecord> {
        let record = self
            .read(id)
            .await?
            .ok_or_else(|| BackendError::NotFound(id.clone()))?;
        let path = self.path_for(id);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(record),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(BackendError::NotFound(id.clone())),
            Err(source) => Err(BackendError::Io { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_proto::{PropertyBag, PropertyValue};

    fn record(id: &str) -> ResourceRecord {
        ResourceRecord::new(
            ResourceId::new(id).expect("valid id"),
            "test:index:Thing",
            PropertyBag::new().with("token", PropertyValue::secret("t0k")),
            PropertyBag::new().with("result", "abcd"),
        )
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let backend = FileBackend::open(dir.path()).await.expect("open");
            backend.insert(record("a")).await.expect("insert");
        }
        let backend = FileBackend::open(dir.path()).await.expect("reopen");
        let id = ResourceId::new("a").expect("valid id");
        let fetched = backend.get(&id).await.expect("get").expect("present");
        assert!(fetched.inputs.get("token").is_some_and(PropertyValue::is_secret));
    }

    #[tokio::test]
    async fn duplicate_insert_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = FileBackend::open(dir.path()).await.expect("open");
        backend.insert(record("a")).await.expect("insert");
        let err = backend.insert(record("a")).await.expect_err("duplicate");
        assert!(matches!(err, BackendError::AlreadyExists(_)));
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn writes_leave_only_record_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = FileBackend::open(dir.path()).await.expect("open");
        backend.insert(record("a")).await.expect("insert");
        backend.replace(record("a")).await.expect("replace");
        let _ = backend.insert(record("a")).await.expect_err("duplicate");
        assert_eq!(file_names(dir.path()), vec!["a.json".to_string()]);
    }

    #[tokio::test]
    async fn stray_temporary_file_is_not_a_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("a.json.0badf00d.tmp"), b"{\"id\":").expect("write");
        let backend = FileBackend::open(dir.path()).await.expect("open");
        let id = ResourceId::new("a").expect("valid id");

        assert!(backend.get(&id).await.expect("get").is_none());
        backend.insert(record("a")).await.expect("insert over partial write");
        assert!(backend.get(&id).await.expect("get").is_some());
    }

    #[tokio::test]
    async fn concurrent_inserts_of_one_id_have_one_winner() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = FileBackend::open(dir.path()).await.expect("open");
        let (first, second) =
            tokio::join!(backend.insert(record("a")), backend.insert(record("a")));
        assert_eq!(u8::from(first.is_ok()) + u8::from(second.is_ok()), 1);
        assert_eq!(file_names(dir.path()), vec!["a.json".to_string()]);
    }

    #[tokio::test]
    async fn replace_overwrites_existing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = FileBackend::open(dir.path()).await.expect("open");
        backend.insert(record("a")).await.expect("insert");

        let mut updated = record("a");
        updated.touch(PropertyBag::new(), PropertyBag::new().with("result", "wxyz"));
        backend.replace(updated).await.expect("replace");

        let id = ResourceId::new("a").expect("valid id");
        let fetched = backend.get(&id).await.expect("get").expect("present");
        assert_eq!(fetched.outputs.get("result").and_then(|v| v.as_str()), Some("wxyz"));
    }

    #[tokio::test]
    async fn missing_records() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = FileBackend::open(dir.path()).await.expect("open");
        let id = ResourceId::new("gone").expect("valid id");
        assert!(backend.get(&id).await.expect("get").is_none());
        assert!(matches!(backend.remove(&id).await, Err(BackendError::NotFound(_))));
        assert!(matches!(
            backend.replace(record("gone")).await,
            Err(BackendError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn corrupt_record_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = FileBackend::open(dir.path()).await.expect("open");
        std::fs::write(dir.path().join("bad.json"), b"{not json").expect("write");
        let id = ResourceId::new("bad").expect("valid id");
        assert!(matches!(backend.get(&id).await, Err(BackendError::Corrupt { .. })));
    }
}
