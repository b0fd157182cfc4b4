//! Session token persistence
//!
//! Persists access/refresh tokens and expiry to disk so the session survives
//! process restarts. Pending login state (CSRF state, PKCE verifier) is
//! deliberately NOT persisted here; it lives in process memory only and dies
//! with the login attempt.

use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{Error, Result};

/// Current time in milliseconds since the Unix epoch
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Stored token set for the current session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTokens {
    /// Access token presented as `Authorization: Bearer`
    pub access_token: String,

    /// Refresh token, when the provider issued one
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Expiry instant in epoch milliseconds
    #[serde(default)]
    pub token_expiry: Option<u64>,
}

impl StoredTokens {
    /// Build a token set from a token-endpoint response, computing the expiry
    /// instant from `expires_in` seconds.
    #[must_use]
    pub fn from_response(
        access_token: String,
        refresh_token: Option<String>,
        expires_in: Option<u64>,
    ) -> Self {
        let token_expiry = expires_in.map(|secs| now_millis() + secs * 1000);
        Self {
            access_token,
            refresh_token,
            token_expiry,
        }
    }

    /// Whether the access token is still valid.
    ///
    /// A token with no recorded expiry counts as invalid; callers holding one
    /// must re-authenticate rather than guess.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.token_expiry.is_some_and(|expiry| now_millis() < expiry)
    }

    /// Milliseconds until expiry, if not already elapsed
    #[must_use]
    pub fn millis_until_expiry(&self) -> Option<u64> {
        self.token_expiry
            .and_then(|expiry| expiry.checked_sub(now_millis()))
            .filter(|remaining| *remaining > 0)
    }
}

/// On-disk session store
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Create a session store under the given directory, creating it if needed
    pub fn new(dir: PathBuf) -> Result<Self> {
        if !dir.exists() {
            fs::create_dir_all(&dir)
                .map_err(|e| Error::Internal(format!("Failed to create session dir: {e}")))?;
        }
        Ok(Self {
            path: dir.join("session.json"),
        })
    }

    /// Load the stored token set, if any.
    ///
    /// An unreadable or unparsable file is treated as no session.
    pub fn load(&self) -> Option<StoredTokens> {
        if !self.path.exists() {
            debug!("No stored session found");
            return None;
        }

        match fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str::<StoredTokens>(&content) {
                Ok(tokens) => {
                    debug!(valid = tokens.is_valid(), "Loaded stored session");
                    Some(tokens)
                }
                Err(e) => {
                    warn!(error = %e, "Failed to parse stored session");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "Failed to read session file");
                None
            }
        }
    }

    /// Persist the token set
    pub fn save(&self, tokens: &StoredTokens) -> Result<()> {
        let content = serde_json::to_string_pretty(tokens)
            .map_err(|e| Error::Internal(format!("Failed to serialize session: {e}")))?;

        fs::write(&self.path, content)
            .map_err(|e| Error::Internal(format!("Failed to write session file: {e}")))?;

        // Restrictive permissions (owner read/write only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            let _ = fs::set_permissions(&self.path, perms);
        }

        info!("Saved session tokens");
        Ok(())
    }

    /// Delete the stored token set. Idempotent.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .map_err(|e| Error::Internal(format!("Failed to delete session file: {e}")))?;
            info!("Cleared stored session");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    #[test]
    fn token_valid_until_expiry() {
        let tokens =
            StoredTokens::from_response("tok".to_string(), Some("ref".to_string()), Some(3600));
        assert!(tokens.is_valid());
        assert!(tokens.millis_until_expiry().unwrap() > 3_500_000);
    }

    #[test]
    fn token_without_expiry_is_invalid() {
        let tokens = StoredTokens::from_response("tok".to_string(), None, None);
        assert!(!tokens.is_valid());
        assert!(tokens.millis_until_expiry().is_none());
    }

    #[test]
    fn elapsed_expiry_is_invalid() {
        let mut tokens = StoredTokens::from_response("tok".to_string(), None, Some(3600));
        tokens.token_expiry = Some(0);
        assert!(!tokens.is_valid());
    }

    #[test]
    fn save_load_round_trip() {
        let (_dir, store) = store();
        let tokens =
            StoredTokens::from_response("tok".to_string(), Some("ref".to_string()), Some(60));
        store.save(&tokens).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.access_token, "tok");
        assert_eq!(loaded.refresh_token.as_deref(), Some("ref"));
        assert_eq!(loaded.token_expiry, tokens.token_expiry);
    }

    #[test]
    fn load_missing_file_returns_none() {
        let (_dir, store) = store();
        assert!(store.load().is_none());
    }

    #[test]
    fn load_corrupt_file_returns_none() {
        let (dir, store) = store();
        fs::write(dir.path().join("session.json"), "not json").unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn clear_is_idempotent() {
        let (_dir, store) = store();
        let tokens = StoredTokens::from_response("tok".to_string(), None, Some(60));
        store.save(&tokens).unwrap();

        store.clear().unwrap();
        assert!(store.load().is_none());
        store.clear().unwrap();
        assert!(store.load().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let (dir, store) = store();
        let tokens = StoredTokens::from_response("tok".to_string(), None, Some(60));
        store.save(&tokens).unwrap();

        let mode = fs::metadata(dir.path().join("session.json"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
