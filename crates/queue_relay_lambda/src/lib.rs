//! AWS-oriented adapters and handlers for the queue relay.
//!
//! This crate owns runtime integration details (Lambda handler, storage and
//! compute adapters, configuration, telemetry) on top of the contracts in
//! `queue_relay_core`.

pub mod adapters;
pub mod config;
pub mod deadline;
pub mod error;
pub mod handlers;
pub mod telemetry;
