//! Endpoint registry and dispatch
//!
//! The registry maps endpoint ids to their request and parser; the client
//! drives requests through the session with bounded retry.

mod client;
pub mod registry;

pub use client::{PfSenseClient, SystemStats};
pub use registry::{resolve, supported_endpoints, EndpointDescriptor, ResponseKind};
