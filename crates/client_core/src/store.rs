//! Persistence for the remembered user name.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ClientError;

const STORE_DIR: &str = "webchat";
const STORE_FILE: &str = "user.toml";

pub trait UserStore: Send {
    fn load(&self) -> Result<Option<String>, ClientError>;
    fn save(&mut self, user: &str) -> Result<(), ClientError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    user: Option<String>,
}

impl MemoryUserStore {
    pub fn with_user(user: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
        }
    }
}

impl UserStore for MemoryUserStore {
    fn load(&self) -> Result<Option<String>, ClientError> {
        Ok(self.user.clone())
    }

    fn save(&mut self, user: &str) -> Result<(), ClientError> {
        self.user = Some(user.to_string());
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredUser {
    user: Option<String>,
}

/// Keeps the user name in a small TOML file.
#[derive(Debug, Clone)]
pub struct FileUserStore {
    path: PathBuf,
}

impl FileUserStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/webchat/user.toml`.
    pub fn in_config_dir() -> Result<Self, ClientError> {
        let base = dirs::config_dir().ok_or(ClientError::NoConfigDir)?;
        Ok(Self::new(base.join(STORE_DIR).join(STORE_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> ClientError {
        ClientError::StoreIo {
            path: self.path.clone(),
            source,
        }
    }
}

impl UserStore for FileUserStore {
    fn load(&self) -> Result<Option<String>, ClientError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error(err)),
        };
        let stored: StoredUser = toml::from_str(&raw).map_err(|source| ClientError::StoreFormat {
            path: self.path.clone(),
            source,
        })?;
        Ok(stored.user.filter(|user| !user.is_empty()))
    }

    fn save(&mut self, user: &str) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        let raw = toml::to_string(&StoredUser {
            user: Some(user.to_string()),
        })?;
        fs::write(&self.path, raw).map_err(|err| self.io_error(err))?;
        debug!(path = %self.path.display(), "remembered user name");
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
