//! Concurrency-limited batch execution for REST API fan-out.
//!
//! Data flows one way: `client` builds lazy, retry-wrapped operations from
//! caller requests, `executor` runs them with a hard ceiling on in-flight
//! concurrency, and results come back per item in input order with failures
//! captured, never raised.

pub mod config;
pub mod logging;

pub mod client;
pub mod executor;
pub mod retry;
