//! Bearer token plumbing
//!
//! Every backend call asks a [`TokenProvider`] for the current token right
//! before sending, so logging in or out takes effect on the next request
//! without rebuilding any client.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::models::AccountId;

/// Source of the bearer token attached to outgoing requests.
///
/// `None` means the user is logged out; callers must not send a request.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

impl<F> TokenProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn token(&self) -> Option<String> {
        self()
    }
}

/// A token provider that can also persist and forget tokens (login/logout).
pub trait TokenStore: TokenProvider {
    fn save(&self, token: &str) -> io::Result<()>;
    fn clear(&self) -> io::Result<()>;
}

/// Token kept in a single file readable only by the owner.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenProvider for FileTokenStore {
    fn token(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    None
                } else {
                    Some(token.to_string())
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("Failed to read token file {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

impl TokenStore for FileTokenStore {
    fn save(&self, token: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, token)?;
        restrict_permissions(&self.path)
    }

    fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// In-process token store, for tests and embedding hosts that keep the
/// token somewhere else.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenProvider for MemoryTokenStore {
    fn token(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl TokenStore for MemoryTokenStore {
    fn save(&self, token: &str) -> io::Result<()> {
        *self.token.lock().unwrap_or_else(|p| p.into_inner()) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        *self.token.lock().unwrap_or_else(|p| p.into_inner()) = None;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct UserClaims {
    #[serde(default)]
    id: Option<AccountId>,
    #[serde(default, rename = "userId")]
    user_id: Option<AccountId>,
    #[serde(default)]
    sub: Option<AccountId>,
}

/// Extract the user id from a JWT without checking its signature.
///
/// Signature and expiry are the backend's business; the client only needs the
/// id to build URLs. Returns `None` for anything undecodable, which callers
/// treat as logged out.
pub fn user_id_from_token(token: &str) -> Option<AccountId> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();

    match decode::<UserClaims>(token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(data) => {
            let claims = data.claims;
            claims.id.or(claims.user_id).or(claims.sub)
        }
        Err(e) => {
            log::debug!("Stored token is not a readable JWT: {}", e);
            None
        }
    }
}

/// User id of whoever is logged in through `tokens`, if anyone.
pub fn current_user_id(tokens: &dyn TokenProvider) -> Option<AccountId> {
    tokens.token().as_deref().and_then(user_id_from_token)
}
