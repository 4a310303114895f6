use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use statefold_core::{Storage, StorageError};
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// On-disk format of a [`FileStorage`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    /// Human-readable JSON (default)
    #[default]
    Json,
    /// Compact binary encoding
    Bincode,
}

impl Encoding {
    fn encode<S: Serialize>(self, state: &S) -> Result<Vec<u8>, StorageError> {
        match self {
            Self::Json => serde_json::to_vec_pretty(state)
                .map_err(|e| StorageError::Serialization(e.to_string())),
            Self::Bincode => {
                bincode::serialize(state).map_err(|e| StorageError::Serialization(e.to_string()))
            }
        }
    }

    fn decode<S: DeserializeOwned>(self, bytes: &[u8]) -> Result<S, StorageError> {
        match self {
            Self::Json => {
                serde_json::from_slice(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
            }
            Self::Bincode => bincode::deserialize(bytes)
                .map_err(|e| StorageError::Serialization(e.to_string())),
        }
    }
}

/// Durable storage keeping the last saved state in a single file.
///
/// Saves write a sibling temporary file, sync it and rename it over the
/// target, so a crash mid-save leaves the previous state intact. Loading a
/// file that does not exist yet fails with [`StorageError::Empty`]; wrap the
/// storage with [`StorageExt::with_initial_value`](super::StorageExt) to
/// start from a default instead.
#[derive(Debug, Clone)]
pub struct FileStorage<S> {
    path: PathBuf,
    encoding: Encoding,
    _state: PhantomData<fn() -> S>,
}

impl<S> FileStorage<S> {
    /// Store state as JSON at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            encoding: Encoding::default(),
            _state: PhantomData,
        }
    }

    /// Use `encoding` instead of JSON.
    #[must_use]
    pub const fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Location of the state file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl<S> Storage<S> for FileStorage<S>
where
    S: Serialize + DeserializeOwned + Send + Sync,
{
    fn load(&self) -> BoxFuture<'_, Result<S, StorageError>> {
        Box::pin(async move {
            let bytes = match fs::read(&self.path).await {
                Ok(bytes) => bytes,
                Err(error) if error.kind() == ErrorKind::NotFound => {
                    return Err(StorageError::Empty);
                }
                Err(error) => return Err(error.into()),
            };
            tracing::trace!(path = %self.path.display(), bytes = bytes.len(), "Loaded state file");
            self.encoding.decode(&bytes)
        })
    }

    fn save<'a>(&'a self, state: &'a S) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            let bytes = self.encoding.encode(state)?;

            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).await?;
            }

            let temp_path = self.temp_path();
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(&bytes).await?;
            file.sync_all().await?;
            drop(file);

            fs::rename(&temp_path, &self.path).await?;
            tracing::trace!(path = %self.path.display(), bytes = bytes.len(), "Saved state file");
            Ok(())
        })
    }
}
