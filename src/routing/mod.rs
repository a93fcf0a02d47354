//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Location fragment ("#/strategies/edit/42?tab=files")
//!     → path.rs (strip marker, default to "/")
//!     → router.rs (exact lookup, then ordered dynamic rules)
//!     → matcher.rs (evaluate one dynamic rule, capture params)
//!     → Return: Resolution (page + params), never an error
//!
//! Table construction (at startup):
//!     exact entries + ordered dynamic rules + fallback
//!     → detect general rules shadowing specific ones
//!     → freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Table immutable after construction, shared via Arc
//! - Query strings ride along in the path; lookups ignore them
//! - Deterministic: same path always resolves to the same page
//! - First matching dynamic rule wins (registration order)

pub mod matcher;
pub mod path;
pub mod router;

pub use matcher::{
    PatternError, PatternMatcher, PredicateMatcher, RouteMatcher, RouteParams, Segment, Specificity,
};
pub use path::{query_string, resolve_path, route_path};
pub use router::{MatchSource, Resolution, RouteTable, RouteTableBuilder, Shadowed};
