//! gRPC surface: the ingestion service and its auth middleware.

pub mod auth;
pub mod meter_service;

pub use auth::BearerAuthLayer;
pub use meter_service::MeterService;
