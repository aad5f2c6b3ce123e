//! Auth collaborator
//!
//! Token acquisition is out of scope; the session asks a [`TokenSource`]
//! for a bearer token descriptor and turns it into an `Authorization`
//! header value. The spreadsheet creation flow authenticates against the
//! documents service separately, so sources are asked per [`Realm`].

use async_trait::async_trait;
use thiserror::Error;

/// Authentication failed at the collaborator. Propagated verbatim, never
/// retried here.
#[derive(Debug, Error)]
#[error("authentication failed: {0}")]
pub struct AuthError(pub String);

/// Which service a token is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Realm {
    Spreadsheets,
    Docs,
}

/// The scheme a token descriptor carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    GoogleLogin,
    Bearer,
}

/// An opaque bearer token descriptor.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub kind: TokenKind,
    pub secret: String,
}

impl AccessToken {
    pub fn bearer(secret: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Bearer,
            secret: secret.into(),
        }
    }

    pub fn google_login(secret: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::GoogleLogin,
            secret: secret.into(),
        }
    }

    /// The `Authorization` header value for this token.
    pub fn authorization_value(&self) -> String {
        match self.kind {
            TokenKind::GoogleLogin => format!("GoogleLogin auth={}", self.secret),
            TokenKind::Bearer => format!("Bearer {}", self.secret),
        }
    }
}

/// Asynchronously yields tokens for a realm.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch(&self, realm: Realm) -> Result<AccessToken, AuthError>;
}

/// A source that hands out one pre-acquired token for every realm.
pub struct StaticToken(pub AccessToken);

#[async_trait]
impl TokenSource for StaticToken {
    async fn fetch(&self, _realm: Realm) -> Result<AccessToken, AuthError> {
        Ok(self.0.clone())
    }
}
