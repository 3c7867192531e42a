//! File-backed key-value storage for the CLI cart profile.
//!
//! Each key is a JSON file in the profile directory, so
//! `spicehub-cart` lives at `<profile>/spicehub-cart.json` and holds exactly
//! the array the storefront keeps in its session.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use spicehub_core::cart::{KeyValueStorage, StorageError};

/// Storage rooted at a profile directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the value under `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;

        // Write then rename so a crash never leaves half a cart behind.
        let path = self.path_for(key);
        let partial = path.with_extension("json.partial");
        fs::write(&partial, value)?;
        fs::rename(&partial, &path)?;
        Ok(())
    }
}
