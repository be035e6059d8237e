//! Client error types.

use thiserror::Error;

/// Errors raised while building the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured server endpoint could not be parsed.
    #[error("invalid server endpoint: {0}")]
    Endpoint(#[from] tonic::transport::Error),
}

/// Errors raised while acquiring a bearer token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The server rejected the presented credentials.
    #[error("credentials were rejected")]
    Rejected,

    /// The issuance response carried no usable expiration.
    #[error("token response carried no usable expiration")]
    MalformedExpiration,

    /// The token issuance RPC itself failed.
    #[error("token request failed: {0}")]
    Rpc(tonic::Status),
}
