//! Typed client for the streamplane application control plane.
//!
//! This crate defines the wire types, error taxonomy and operation contract
//! used to manage versioned streaming applications, plus the HTTP binding.
//! The reconciliation engine in `streamplane-reconcile` consumes the
//! [`ControlPlane`] trait and never depends on the transport.

mod client;
mod error;
mod http;
pub mod types;

pub use client::ControlPlane;
pub use error::{ApiError, ErrorCode};
pub use http::HttpControlPlane;
