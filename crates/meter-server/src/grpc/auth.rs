//! Per-operation bearer-token enforcement.
//!
//! Each RPC method carries a `requires_auth` flag in a static table; a
//! tower layer consults the table and verifies the `Authorization` header
//! before dispatch, so a handler body never runs for an unauthenticated
//! call to a protected method.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Request, Response};
use tonic::body::{empty_body, BoxBody};
use tonic::Status;
use tower::{Layer, Service};

use crate::auth::{extract_bearer_token, JwtTokenService};

struct MethodPolicy {
    path: &'static str,
    requires_auth: bool,
}

/// Every operation on the ingestion surface. Token issuance is the only
/// anonymous entry point; unknown paths default to requiring a token.
const METHODS: &[MethodPolicy] = &[
    MethodPolicy {
        path: "/meter.MeterReadingService/CreateToken",
        requires_auth: false,
    },
    MethodPolicy {
        path: "/meter.MeterReadingService/SendDiagnostics",
        requires_auth: true,
    },
    MethodPolicy {
        path: "/meter.MeterReadingService/AddReading",
        requires_auth: true,
    },
];

fn requires_auth(path: &str) -> bool {
    METHODS
        .iter()
        .find(|method| method.path == path)
        .map_or(true, |method| method.requires_auth)
}

/// Validate the bearer token carried by a request's headers.
pub fn authorize(headers: &HeaderMap, tokens: &JwtTokenService) -> Result<(), Status> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| Status::unauthenticated("missing authorization token"))?;

    let token = extract_bearer_token(header)
        .ok_or_else(|| Status::unauthenticated("expected a bearer authorization header"))?;

    tokens
        .validate(token)
        .map(|_| ())
        .map_err(|_| Status::unauthenticated("invalid authentication token"))
}

/// Layer installing bearer-token checks in front of the ingestion service.
#[derive(Clone)]
pub struct BearerAuthLayer {
    tokens: Arc<JwtTokenService>,
}

impl BearerAuthLayer {
    /// Layer verifying tokens against the given token service.
    pub fn new(tokens: Arc<JwtTokenService>) -> Self {
        Self { tokens }
    }
}

impl<S> Layer<S> for BearerAuthLayer {
    type Service = BearerAuth<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BearerAuth {
            inner,
            tokens: Arc::clone(&self.tokens),
        }
    }
}

/// Service wrapper rejecting unauthenticated calls to protected methods.
#[derive(Clone)]
pub struct BearerAuth<S> {
    inner: S,
    tokens: Arc<JwtTokenService>,
}

impl<S, ReqBody> Service<Request<ReqBody>> for BearerAuth<S>
where
    S: Service<Request<ReqBody>, Response = Response<BoxBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        if requires_auth(request.uri().path()) {
            if let Err(status) = authorize(request.headers(), &self.tokens) {
                let response = reject(&status);
                return Box::pin(async move { Ok(response) });
            }
        }

        // Swap in the clone and drive the service poll_ready vouched for.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move { inner.call(request).await })
    }
}

/// A trailers-only gRPC error response for a rejected call.
fn reject(status: &Status) -> Response<BoxBody> {
    let mut response = Response::new(empty_body());
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/grpc"));
    headers.insert("grpc-status", HeaderValue::from(status.code() as i32));
    if let Ok(message) = HeaderValue::from_str(status.message()) {
        headers.insert("grpc-message", message);
    }
    response
}
