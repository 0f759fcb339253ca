//! Shared-secret authentication.

use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Principal};
use crate::config::AuthMethod;

/// Checks requests against one configured key, sent as either
/// `Authorization: Bearer <key>` or `X-API-Key: <key>`.
pub struct ApiKeyAuthenticator {
    expected_key: String,
}

impl ApiKeyAuthenticator {
    pub fn new(api_key: String) -> Self {
        Self {
            expected_key: api_key,
        }
    }

    fn presented_key<'a>(&self, request: &'a AuthRequest) -> Option<&'a str> {
        let bearer = request
            .headers
            .get("authorization")
            .and_then(|value| value.split_once(' '))
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
            .map(|(_, key)| key.trim());

        bearer.or_else(|| request.headers.get("x-api-key").map(|k| k.trim()))
    }
}

#[async_trait]
impl Authenticator for ApiKeyAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Principal, AuthError> {
        let presented = self
            .presented_key(request)
            .ok_or(AuthError::NotAuthenticated)?;

        if keys_match(presented.as_bytes(), self.expected_key.as_bytes()) {
            Ok(Principal {
                subject: "admin".to_string(),
                method: AuthMethod::ApiKey.as_str(),
            })
        } else {
            Err(AuthError::InvalidCredentials("Invalid API key".to_string()))
        }
    }

    fn method_name(&self) -> &'static str {
        AuthMethod::ApiKey.as_str()
    }
}

/// Comparison time depends only on the lengths.
fn keys_match(presented: &[u8], expected: &[u8]) -> bool {
    let mut diff = (presented.len() != expected.len()) as u8;
    for (i, byte) in expected.iter().enumerate() {
        diff |= byte ^ presented.get(i).copied().unwrap_or(0);
    }
    diff == 0
}
