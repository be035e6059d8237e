//! Ingestion service for utility meter readings.
//!
//! Field clients authenticate with a bearer token obtained from
//! `CreateToken`, stream telemetry readings to `SendDiagnostics`, and submit
//! reading batches to `AddReading`. Batches are validated fail-fast and
//! persisted in full or not at all through the [`repository`] seam.

pub mod auth;
pub mod config;
pub mod grpc;
pub mod repository;
pub mod validation;

pub use grpc::meter_service::MeterService;
