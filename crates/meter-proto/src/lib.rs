//! Protocol buffer definitions and conversions for the meter ingestion
//! service.
//!
//! This crate contains:
//! - Generated protobuf types from `proto/meter.proto`
//! - Conversion helpers between prost well-known types and `chrono`
//!
//! The wire types are kept separate from the server and client crates so
//! both sides share one definition of the protocol without pulling in each
//! other's collaborators.

#![allow(missing_docs)] // Generated code doesn't have docs

pub mod convert;

/// Generated meter ingestion protocol buffer types.
pub mod meter {
    tonic::include_proto!("meter");
}

// Re-export commonly used types at crate root
pub use meter::*;
