//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Router, chrome and pages produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stderr subscriber installed by the binary
//!     → whatever metrics recorder the embedding installs
//! ```
//!
//! # Design Decisions
//! - Every navigation carries a UUID so interleaved async page work
//!   can be attributed to the cycle that started it
//! - Metrics go through the `metrics` facade; without a recorder they
//!   cost nothing

pub mod logging;
pub mod metrics;
