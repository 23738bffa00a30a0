//! Persistence for [`AppState`].

use crate::models::User;
use crate::session::state::AppState;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const USERS_FILE: &str = "users.json";
const CURRENT_USER_FILE: &str = "current_user.json";

/// Loads the session state at startup and saves it after each change.
pub trait SessionStore {
    fn load(&self) -> Result<AppState>;
    fn save(&self, state: &AppState) -> Result<()>;
}

/// Stores users and the signed-in user as two JSON files in a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read one file, treating a missing or unreadable file as absent.
    fn read_or_default<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        let path = self.dir.join(name);
        if !path.exists() {
            return T::default();
        }

        match std::fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|content| serde_json::from_str::<T>(&content).map_err(anyhow::Error::from))
        {
            Ok(value) => value,
            Err(e) => {
                warn!("Ignoring unreadable session file {}: {}", path.display(), e);
                T::default()
            }
        }
    }
}

impl SessionStore for JsonFileStore {
    fn load(&self) -> Result<AppState> {
        let users: Vec<User> = self.read_or_default(USERS_FILE);
        let current_user: Option<User> = self.read_or_default(CURRENT_USER_FILE);

        debug!(
            "Loaded session state: {} users, signed in: {}",
            users.len(),
            current_user.is_some()
        );

        Ok(AppState {
            users,
            current_user,
        })
    }

    fn save(&self, state: &AppState) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create session directory: {}", self.dir.display()))?;

        let users_path = self.dir.join(USERS_FILE);
        std::fs::write(&users_path, serde_json::to_string_pretty(&state.users)?)
            .with_context(|| format!("Failed to write {}", users_path.display()))?;

        let current_path = self.dir.join(CURRENT_USER_FILE);
        match state.current_user {
            Some(ref user) => {
                std::fs::write(&current_path, serde_json::to_string_pretty(user)?)
                    .with_context(|| format!("Failed to write {}", current_path.display()))?;
            }
            None if current_path.exists() => {
                std::fs::remove_file(&current_path)
                    .with_context(|| format!("Failed to remove {}", current_path.display()))?;
            }
            None => {}
        }

        debug!("Saved session state to {}", self.dir.display());
        Ok(())
    }
}
