// src/settings.rs
//
// Environment-driven runtime settings and the remember-me credential file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cloud;
use crate::error::{AppError, Result};
use crate::links;

pub const CREDENTIALS_FILENAME: &str = "credentials.json";

/// Runtime settings, read from `OVERTIME_`-prefixed environment variables
/// with sensible defaults. A `.env` file in the working directory is honored.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSettings {
    #[serde(default = "default_links_file")]
    pub links_file: PathBuf,
    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
}

fn default_links_file() -> PathBuf {
    links::default_links_path()
}

fn default_credentials_file() -> PathBuf {
    sibling_of_executable(CREDENTIALS_FILENAME)
}

fn default_download_timeout_secs() -> u64 {
    cloud::DEFAULT_DOWNLOAD_TIMEOUT.as_secs()
}

impl RunSettings {
    pub fn from_env() -> std::result::Result<Self, envy::Error> {
        dotenv::dotenv().ok();
        envy::prefixed("OVERTIME_").from_env::<RunSettings>()
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

/// A file placed next to the executable, or in the working directory when
/// the executable path cannot be resolved.
fn sibling_of_executable(filename: &str) -> PathBuf {
    match std::env::current_exe() {
        Ok(exe) => exe
            .parent()
            .map(|dir| dir.join(filename))
            .unwrap_or_else(|| PathBuf::from(filename)),
        Err(e) => {
            warn!(
                "Could not resolve the executable directory ({}), using the working directory",
                e
            );
            PathBuf::from(filename)
        }
    }
}

// --- Remember-me credentials ---

/// Saved sign-in state. The raw password is stored as entered; the file
/// lives next to the executable on the user's own machine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoredCredentials {
    pub username: String,
    pub password: String,
    pub remember_me: bool,
}

impl StoredCredentials {
    /// Loads saved credentials, returning `None` when the file is absent,
    /// unreadable, malformed, or was saved without remember-me.
    pub fn load(path: &Path) -> Option<Self> {
        let data = fs::read_to_string(path).ok()?;
        match serde_json::from_str::<StoredCredentials>(&data) {
            Ok(creds) if creds.remember_me => Some(creds),
            Ok(_) => None,
            Err(e) => {
                warn!("Could not parse {} ({}), ignoring it", path.display(), e);
                None
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data).map_err(|e| AppError::io(path, e))?;
        info!("Saved credentials to {}", path.display());
        Ok(())
    }

    /// Removes the credential file. A missing file is not an error.
    pub fn clear(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => {
                info!("Removed saved credentials at {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::io(path, e)),
        }
    }
}
