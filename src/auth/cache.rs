use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::Session;
use crate::error::AuthError;

/// Single-file snapshot of the last signed-in session.
#[derive(Debug, Clone)]
pub struct SessionCache {
    path: PathBuf,
}

impl SessionCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn save(&self, session: &Session) -> Result<(), AuthError> {
        let json = serde_json::to_vec_pretty(session).map_err(|e| AuthError::Cache(e.to_string()))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| AuthError::Cache(format!("{}: {}", self.path.display(), e)))?;
        debug!(path = %self.path.display(), "Session cached");
        Ok(())
    }

    /// Missing or unreadable caches both yield `None`.
    pub async fn load(&self) -> Option<Session> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Could not read session cache");
                return None;
            }
        };
        serde_json::from_slice(&bytes)
            .map_err(|e| {
                warn!(path = %self.path.display(), error = %e, "Discarding corrupt session cache")
            })
            .ok()
    }

    pub async fn clear(&self) -> Result<(), AuthError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::Cache(format!("{}: {}", self.path.display(), e))),
        }
    }
}
