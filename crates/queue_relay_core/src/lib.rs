//! Shared queue relay domain primitives.
//!
//! This crate owns the delivery record contract, payload parsing, storage key
//! layout, and response body shape. It intentionally excludes AWS SDK and
//! Lambda runtime concerns.

pub mod contract;
pub mod error;
pub mod storage_keys;
