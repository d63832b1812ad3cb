//! Credentials attached to outbound origin requests

use reqwest::RequestBuilder;
use std::fmt;
use std::sync::Arc;

/// Decorates an outbound request with credentials
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder;
}

/// Sends requests unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl Authenticator for Anonymous {
    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        request
    }
}

#[derive(Clone)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl Authenticator for BasicAuth {
    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.username, Some(&self.password))
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Clone)]
pub struct BearerToken(pub String);

impl Authenticator for BearerToken {
    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// Pick an authenticator from optional credentials.
///
/// A token wins over a username; a username without a password is sent
/// with an empty password.
pub fn from_credentials(
    username: Option<String>,
    password: Option<String>,
    token: Option<String>,
) -> Arc<dyn Authenticator> {
    match (token, username) {
        (Some(token), _) => Arc::new(BearerToken(token)),
        (None, Some(username)) => Arc::new(BasicAuth {
            username,
            password: password.unwrap_or_default(),
        }),
        (None, None) => Arc::new(Anonymous),
    }
}
