//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! billing core test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data for common entities
//! - `builders`: Builder patterns for test data construction
//! - `assertions`: Custom assertion helpers for domain types
//! - `generators`: Property-based test data generators
//! - `telemetry`: One-shot tracing initialization for test binaries

pub mod assertions;
pub mod builders;
pub mod fixtures;
pub mod generators;
pub mod telemetry;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
pub use generators::*;
pub use telemetry::init_tracing;
