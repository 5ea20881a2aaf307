use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use thiserror::Error;

use dragontamer_game::SaveStorage;

#[derive(Debug, Error)]
pub enum FileStorageError {
    #[error("save key {0:?} may only contain letters, digits, '-' and '_'")]
    InvalidKey(String),
    #[error("{action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Keeps each slot as `<key>.json` under one directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) a save directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, FileStorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| FileStorageError::Io {
            action: "creating",
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key would escape the save directory.
    pub fn slot_path(&self, key: &str) -> Result<PathBuf, FileStorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(FileStorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl SaveStorage for FileStorage {
    type Error = FileStorageError;

    fn write_slot(&self, key: &str, payload: &str) -> Result<(), Self::Error> {
        let path = self.slot_path(key)?;
        // Staged then renamed; readers only ever see a complete payload.
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, payload).map_err(|source| FileStorageError::Io {
            action: "writing",
            path: staging.clone(),
            source,
        })?;
        fs::rename(&staging, &path).map_err(|source| FileStorageError::Io {
            action: "replacing",
            path,
            source,
        })
    }

    fn read_slot(&self, key: &str) -> Result<Option<String>, Self::Error> {
        let path = self.slot_path(key)?;
        match fs::read_to_string(&path) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(FileStorageError::Io {
                action: "reading",
                path,
                source,
            }),
        }
    }

    fn clear_slot(&self, key: &str) -> Result<(), Self::Error> {
        let path = self.slot_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(FileStorageError::Io {
                action: "removing",
                path,
                source,
            }),
        }
    }
}
