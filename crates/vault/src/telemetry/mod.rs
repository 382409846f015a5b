//! Tracing setup: structured JSON logs, optionally exporting spans over OTLP.
//!
//! # Telemetry invariants
//!
//! - **No card data or key material** must appear in any span attribute or
//!   log field. The key fingerprint is the only key-derived value logged.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`); `RUST_LOG`
//!   takes precedence when set.

pub mod init;

pub use init::{init_telemetry, shutdown_telemetry};
