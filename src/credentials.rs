//! Cached login tokens for the activity download step
//!
//! The downloader that talks to the fitness service receives a
//! [`CredentialStore`] instead of reading token files itself. The on-disk
//! layout matches the two-file token directory the service's Python client
//! writes, so tokens can be shared between tools.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Result, RunSplitsError};

pub const OAUTH1_FILE: &str = "oauth1_token.json";
pub const OAUTH2_FILE: &str = "oauth2_token.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuth1Token {
    pub oauth_token: String,
    pub oauth_token_secret: String,
    #[serde(default)]
    pub mfa_token: Option<String>,
    #[serde(default)]
    pub mfa_expiration_timestamp: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuth2Token {
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub jti: Option<String>,
    pub token_type: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    /// Unix seconds
    pub expires_at: i64,
    pub refresh_token_expires_in: i64,
    /// Unix seconds
    pub refresh_token_expires_at: i64,
}

impl OAuth2Token {
    pub fn is_expired_at(&self, unix_seconds: i64) -> bool {
        self.expires_at <= unix_seconds
    }

    pub fn refresh_expired_at(&self, unix_seconds: i64) -> bool {
        self.refresh_token_expires_at <= unix_seconds
    }
}

/// Both halves of a login session
#[derive(Debug, Clone, PartialEq)]
pub struct OAuthTokens {
    pub oauth1: OAuth1Token,
    pub oauth2: OAuth2Token,
}

impl OAuthTokens {
    /// Whether a fresh login is needed instead of a token refresh
    pub fn needs_login(&self) -> bool {
        self.oauth2.refresh_expired_at(Utc::now().timestamp())
    }
}

/// Where login tokens live between runs
pub trait CredentialStore {
    /// Cached tokens, `None` when nothing has been saved yet
    fn load(&self) -> Result<Option<OAuthTokens>>;

    /// Persist tokens for the next run
    fn save(&self, tokens: &OAuthTokens) -> Result<()>;
}

/// Token directory holding one JSON file per token
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_token<T: for<'de> Deserialize<'de>>(&self, name: &str) -> Result<Option<T>> {
        let path = self.dir.join(name);
        if !path.exists() {
            debug!("No token file at {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| RunSplitsError::Auth(format!("{}: {}", path.display(), e)))
    }

    fn write_token<T: Serialize>(&self, name: &str, token: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(token)
            .map_err(|e| RunSplitsError::Auth(e.to_string()))?;
        fs::write(self.dir.join(name), json)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<OAuthTokens>> {
        let oauth1 = self.read_token::<OAuth1Token>(OAUTH1_FILE)?;
        let oauth2 = self.read_token::<OAuth2Token>(OAUTH2_FILE)?;

        Ok(match (oauth1, oauth2) {
            (Some(oauth1), Some(oauth2)) => Some(OAuthTokens { oauth1, oauth2 }),
            _ => None,
        })
    }

    fn save(&self, tokens: &OAuthTokens) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        self.write_token(OAUTH1_FILE, &tokens.oauth1)?;
        self.write_token(OAUTH2_FILE, &tokens.oauth2)?;
        info!("OAuth tokens stored in '{}'", self.dir.display());
        Ok(())
    }
}
