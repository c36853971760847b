//! Core library for the barangay document request portal.
//!
//! The portal modules are framework-independent: persistence, audit
//! storage, and file uploads sit behind traits so the HTTP service can wire
//! in adapters and the tests can exercise the rules in isolation.

pub mod config;
pub mod error;
pub mod portal;
pub mod telemetry;
