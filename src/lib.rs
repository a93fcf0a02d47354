//! Strategy and asset tracker: hash router, page lifecycle and pages.

pub mod backend;
pub mod config;
pub mod dom;
pub mod layout;
pub mod lifecycle;
pub mod observability;
pub mod page;
pub mod pages;
pub mod routing;
pub mod util;

pub use config::TrackerConfig;
pub use lifecycle::{Router, Shutdown};
pub use pages::build_route_table;
