//! gRPC field client for the meter ingestion service.
//!
//! The client runs one periodic loop: every tick it builds a batch of
//! synthetic readings, logs in when its bearer token is missing or expired,
//! and submits the batch; every tenth tick it first streams a handful of
//! readings to the diagnostics endpoint. RPC failures are logged and the
//! loop carries on with the next cycle.

pub mod config;
pub mod error;
pub mod readings;
pub mod token;
pub mod worker;

pub use error::{AuthError, ClientError};
pub use worker::MeterWorker;
