use std::path::PathBuf;

use directories::ProjectDirs;

use crate::crypto::KdfParams;
use crate::error::{Error, Result};
use crate::session::UnlockCheck;

/// Settings for a [`crate::Sealbox`] backed by a [`crate::FileStore`].
#[derive(Debug, Clone)]
pub struct Config {
    pub store_dir: PathBuf,
    /// Work factor for newly sealed records only.
    pub kdf: KdfParams,
    pub unlock_check: UnlockCheck,
}

impl Config {
    pub fn new(store_dir: PathBuf) -> Self {
        Self {
            store_dir,
            kdf: KdfParams::default(),
            unlock_check: UnlockCheck::default(),
        }
    }

    /// Config rooted at the platform data directory.
    pub fn with_default_dir() -> Result<Self> {
        Ok(Self::new(default_store_dir()?))
    }

    pub fn iterations(mut self, iterations: u32) -> Result<Self> {
        self.kdf = KdfParams::new(iterations)?;
        Ok(self)
    }

    pub fn unlock_check(mut self, check: UnlockCheck) -> Self {
        self.unlock_check = check;
        self
    }
}

pub fn default_store_dir() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "sealbox").ok_or_else(|| {
        Error::InvalidInput("could not determine platform directories".to_string())
    })?;

    Ok(project_dirs.data_dir().join("records"))
}
