use async_trait::async_trait;
use log::debug;
use std::io::ErrorKind;
use std::path::{ Path, PathBuf };
use tokio::fs;
use super::{ BlobKey, RemoteStore, StoreError };

/// Stores each blob at `<root>/<repo_id>/<path>`.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    fn blob_path(&self, key: &BlobKey) -> Result<PathBuf, StoreError> {
        let relative = Path::new(&key.repo_id).join(&key.path);
        if
            relative
                .components()
                .any(|c| !matches!(c, std::path::Component::Normal(_)))
        {
            return Err(StoreError::Other(format!("invalid blob path '{}'", key)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl RemoteStore for LocalStore {
    async fn get(&self, key: &BlobKey) -> Result<Vec<u8>, StoreError> {
        let path = self.blob_path(key)?;
        debug!("reading {}", path.display());
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(key.clone())),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &BlobKey, bytes: Vec<u8>) -> Result<(), StoreError> {
        let path = self.blob_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        // Readers only ever see a complete blob.
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, &path).await?;
        debug!("wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}
