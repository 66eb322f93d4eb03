// src/session.rs
//! Bearer token handling. The token is created by the portal's login flow,
//! recorded here, and handed to clients explicitly as `Credentials`.

use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Key the token is stored under
pub const TOKEN_KEY: &str = "adminToken";

/// Environment override for the stored token
pub const TOKEN_ENV: &str = "CAREER_ADMIN_TOKEN";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to access session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Session file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Token must not be empty")]
    EmptyToken,
}

/// Opaque bearer credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// What a client is allowed to send on behalf of the current session
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    token: Option<SessionToken>,
}

impl Credentials {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: SessionToken) -> Self {
        Self { token: Some(token) }
    }

    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }
}

/// Session-scoped key/value file holding the token
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location: the OS temp dir, so the token does not outlive the
    /// machine session
    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join("career-admin-session.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored token, if any
    pub async fn load(&self) -> Result<Option<SessionToken>, SessionError> {
        let entries = self.read_entries().await?;
        Ok(entries
            .get(TOKEN_KEY)
            .and_then(Value::as_str)
            .and_then(SessionToken::new))
    }

    /// Credentials for this run: environment override first, then the store
    pub async fn credentials(&self) -> Result<Credentials, SessionError> {
        if let Some(token) = std::env::var(TOKEN_ENV).ok().and_then(SessionToken::new) {
            debug!("Using token from {}", TOKEN_ENV);
            return Ok(Credentials::with_token(token));
        }

        Ok(match self.load().await? {
            Some(token) => Credentials::with_token(token),
            None => Credentials::anonymous(),
        })
    }

    pub async fn save(&self, raw: &str) -> Result<SessionToken, SessionError> {
        let token = SessionToken::new(raw).ok_or(SessionError::EmptyToken)?;

        let mut entries = self.read_entries().await?;
        entries.insert(TOKEN_KEY.to_string(), Value::String(token.as_str().to_string()));
        self.write_entries(&entries).await?;

        info!("Session token stored in {}", self.path.display());
        Ok(token)
    }

    /// Drop the token; returns whether one was stored
    pub async fn clear(&self) -> Result<bool, SessionError> {
        let mut entries = self.read_entries().await?;
        let removed = entries.remove(TOKEN_KEY).is_some();

        if removed {
            if entries.is_empty() {
                tokio::fs::remove_file(&self.path)
                    .await
                    .map_err(|source| self.io_error(source))?;
            } else {
                self.write_entries(&entries).await?;
            }
            info!("Session token removed from {}", self.path.display());
        }

        Ok(removed)
    }

    async fn read_entries(&self) -> Result<Map<String, Value>, SessionError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => return Err(self.io_error(source)),
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        serde_json::from_str(&content).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    async fn write_entries(&self, entries: &Map<String, Value>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            crate::utils::ensure_dir_exists(parent)
                .await
                .map_err(|source| self.io_error(source))?;
        }

        let content = serde_json::to_string_pretty(entries).map_err(|source| {
            SessionError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;

        tokio::fs::write(&self.path, content)
            .await
            .map_err(|source| self.io_error(source))?;

        restrict_permissions(&self.path)
            .await
            .map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: std::io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_rejects_blank_and_redacts_debug() {
        assert!(SessionToken::new("   ").is_none());

        let token = SessionToken::new(" abc.def ").unwrap();
        assert_eq!(token.as_str(), "abc.def");
        assert_eq!(format!("{:?}", token), "SessionToken(***)");
        assert!(!format!("{:?}", Credentials::with_token(token)).contains("abc"));
    }

    #[tokio::test]
    async fn test_store_roundtrip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join("session.json"));

        assert!(store.load().await.unwrap().is_none());

        store.save("tok-1").await.unwrap();
        assert_eq!(store.load().await.unwrap().unwrap().as_str(), "tok-1");

        let raw = tokio::fs::read_to_string(store.path()).await.unwrap();
        assert!(raw.contains("\"adminToken\""));

        assert!(store.clear().await.unwrap());
        assert!(!store.path().exists());
        assert!(!store.clear().await.unwrap());
    }

    #[tokio::test]
    async fn test_store_keeps_unrelated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        tokio::fs::write(&path, r#"{ "theme": "dark", "adminToken": "x" }"#)
            .await
            .unwrap();

        let store = SessionStore::new(&path);
        assert!(store.clear().await.unwrap());
        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(raw.contains("theme"));
        assert!(!raw.contains("adminToken"));
    }

    #[tokio::test]
    async fn test_store_rejects_empty_token_and_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = SessionStore::new(&path);

        assert!(matches!(store.save("  ").await, Err(SessionError::EmptyToken)));

        tokio::fs::write(&path, "not json").await.unwrap();
        assert!(matches!(store.load().await, Err(SessionError::Corrupt { .. })));
    }
}
