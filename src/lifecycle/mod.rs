//! Page lifecycle subsystem.
//!
//! # Data Flow
//! ```text
//! Startup / fragment change
//!     → sequencer.rs: resolve → match → render shell → set title
//!                     → init header → spawn page init → init footer
//!     → cancel.rs: new cycle token, earlier cycles cancelled
//!
//! Shutdown (shutdown.rs):
//!     trigger → navigation loop exits after the current cycle
//! ```
//!
//! # Design Decisions
//! - Steps 1–5 and 7 are synchronous; only page init is async
//! - Page init is never awaited by the loop; stale inits are fenced by
//!   their token rather than aborted
//! - Guards and redirects live in pages, never in the sequencer

pub mod cancel;
pub mod sequencer;
pub mod shutdown;

pub use cancel::{CycleToken, CycleTracker};
pub use sequencer::{Navigation, NavigationSummary, Router, Settled};
pub use shutdown::Shutdown;
