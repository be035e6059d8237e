//! Client-held bearer token state.

use chrono::{DateTime, Utc};
use meter_proto::convert::from_timestamp;
use meter_proto::meter::meter_reading_service_client::MeterReadingServiceClient;
use meter_proto::meter::TokenRequest;
use tonic::transport::Channel;

use crate::error::AuthError;

/// Username/password pair presented when requesting a token.
///
/// Constructed per request and dropped afterwards; never stored by the
/// client.
#[derive(Debug, Clone)]
pub struct Credential {
    /// Client identity name.
    pub username: String,
    /// Client identity secret.
    pub password: String,
}

/// A bearer token together with its expiration.
#[derive(Debug, Clone)]
pub struct TokenState {
    token: String,
    expires_at: DateTime<Utc>,
}

impl TokenState {
    /// Token state expiring at `expires_at`.
    pub fn new(token: String, expires_at: DateTime<Utc>) -> Self {
        Self { token, expires_at }
    }

    /// `Authorization` header value for this token.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    // A token is usable while it is non-blank and its expiration lies in
    // the future.
    fn is_usable(&self) -> bool {
        !self.token.trim().is_empty() && self.expires_at > Utc::now()
    }
}

/// Owns the client's current bearer token and renews it via `CreateToken`.
#[derive(Debug, Default)]
pub struct TokenManager {
    state: Option<TokenState>,
}

impl TokenManager {
    /// True when no usable token is held and a login must happen before
    /// calling a protected operation.
    pub fn needs_login(&self) -> bool {
        self.state.as_ref().map_or(true, |state| !state.is_usable())
    }

    /// Current `Authorization` header value, when a token is held.
    pub fn bearer(&self) -> Option<String> {
        self.state.as_ref().map(TokenState::bearer)
    }

    /// Exchange credentials for a fresh token.
    ///
    /// The held state is replaced only by a successful issuance; rejected
    /// credentials and transport failures leave it untouched. Retry policy
    /// belongs to the caller.
    pub async fn authenticate(
        &mut self,
        client: &mut MeterReadingServiceClient<Channel>,
        credentials: &Credential,
    ) -> Result<(), AuthError> {
        let response = client
            .create_token(TokenRequest {
                username: credentials.username.clone(),
                password: credentials.password.clone(),
            })
            .await
            .map_err(AuthError::Rpc)?
            .into_inner();

        if !response.success {
            return Err(AuthError::Rejected);
        }

        let expires_at = response
            .expiration
            .as_ref()
            .and_then(from_timestamp)
            .ok_or(AuthError::MalformedExpiration)?;

        self.state = Some(TokenState::new(response.token, expires_at));
        Ok(())
    }

    #[cfg(test)]
    fn replace(&mut self, state: TokenState) {
        self.state = Some(state);
    }
}
