//! Route lookup.
//!
//! # Responsibilities
//! - Store exact entries, ordered dynamic rules and the fallback page
//! - Resolve a path to exactly one page
//! - Flag dynamic rules shadowed by earlier, more general ones
//!
//! # Design Decisions
//! - Immutable after construction (shareable without locks)
//! - O(1) exact lookup via HashMap
//! - O(n) dynamic scan in registration order (tables are small)
//! - Fallback instead of an error for unmatched paths

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::page::Page;
use crate::routing::matcher::{
    segments_overlap, PatternError, PatternMatcher, RouteMatcher, RouteParams,
};
use crate::routing::path::route_path;

/// Where a resolution came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    Exact,
    /// Index of the dynamic rule in registration order.
    Dynamic(usize),
    Fallback,
}

impl MatchSource {
    /// Label used in logs, metrics and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            MatchSource::Exact => "exact",
            MatchSource::Dynamic(_) => "dynamic",
            MatchSource::Fallback => "fallback",
        }
    }
}

/// The outcome of resolving one path.
#[derive(Clone)]
pub struct Resolution {
    pub page: Arc<dyn Page>,
    pub params: RouteParams,
    pub source: MatchSource,
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolution")
            .field("page", &self.page.title())
            .field("params", &self.params)
            .field("source", &self.source)
            .finish()
    }
}

/// A dynamic rule registered after an overlapping, less specific one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shadowed {
    /// The earlier, more general rule.
    pub general: String,
    /// The later, more specific rule it captures paths from.
    pub specific: String,
}

struct DynamicRoute {
    matcher: Box<dyn RouteMatcher>,
    page: Arc<dyn Page>,
}

/// Immutable route table.
pub struct RouteTable {
    exact: HashMap<String, Arc<dyn Page>>,
    dynamic: Vec<DynamicRoute>,
    fallback: Arc<dyn Page>,
    shadowed: Vec<Shadowed>,
}

impl RouteTable {
    /// Start a table with the page used when nothing matches.
    pub fn builder(fallback: Arc<dyn Page>) -> RouteTableBuilder {
        RouteTableBuilder {
            exact: HashMap::new(),
            dynamic: Vec::new(),
            fallback,
        }
    }

    /// Resolve a path (query allowed) to exactly one page.
    pub fn resolve(&self, path: &str) -> Resolution {
        let route = route_path(path);

        if let Some(page) = self.exact.get(route) {
            return Resolution {
                page: page.clone(),
                params: RouteParams::new(),
                source: MatchSource::Exact,
            };
        }

        for (index, entry) in self.dynamic.iter().enumerate() {
            if let Some(params) = entry.matcher.match_path(route) {
                return Resolution {
                    page: entry.page.clone(),
                    params,
                    source: MatchSource::Dynamic(index),
                };
            }
        }

        Resolution {
            page: self.fallback.clone(),
            params: RouteParams::new(),
            source: MatchSource::Fallback,
        }
    }

    /// Dynamic rules that can never win for some of their paths.
    pub fn shadowed(&self) -> &[Shadowed] {
        &self.shadowed
    }

    /// `(path or pattern, page title)` for every entry, exact ones sorted
    /// first, then dynamic rules in evaluation order.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut exact: Vec<(String, String)> = self
            .exact
            .iter()
            .map(|(path, page)| (path.clone(), page.title().to_string()))
            .collect();
        exact.sort();
        exact.extend(
            self.dynamic
                .iter()
                .map(|d| (d.matcher.describe(), d.page.title().to_string())),
        );
        exact
    }

    pub fn fallback(&self) -> &Arc<dyn Page> {
        &self.fallback
    }
}

/// Builder for [`RouteTable`].
pub struct RouteTableBuilder {
    exact: HashMap<String, Arc<dyn Page>>,
    dynamic: Vec<DynamicRoute>,
    fallback: Arc<dyn Page>,
}

impl RouteTableBuilder {
    /// Register a literal path. Re-registering a path replaces it.
    pub fn exact(mut self, path: impl Into<String>, page: Arc<dyn Page>) -> Self {
        self.exact.insert(path.into(), page);
        self
    }

    /// Register a `{param}` pattern after every rule registered so far.
    pub fn pattern(self, pattern: &str, page: Arc<dyn Page>) -> Result<Self, PatternError> {
        let matcher = PatternMatcher::parse(pattern)?;
        Ok(self.matcher(Box::new(matcher), page))
    }

    /// Register any matcher after every rule registered so far.
    pub fn matcher(mut self, matcher: Box<dyn RouteMatcher>, page: Arc<dyn Page>) -> Self {
        self.dynamic.push(DynamicRoute { matcher, page });
        self
    }

    pub fn build(self) -> RouteTable {
        let shadowed = find_shadowed(&self.dynamic);
        for entry in &shadowed {
            tracing::warn!(
                general = %entry.general,
                specific = %entry.specific,
                "Dynamic route registered after a more general overlapping route"
            );
        }

        tracing::debug!(
            exact = self.exact.len(),
            dynamic = self.dynamic.len(),
            "Route table built"
        );

        RouteTable {
            exact: self.exact,
            dynamic: self.dynamic,
            fallback: self.fallback,
            shadowed,
        }
    }
}

fn find_shadowed(dynamic: &[DynamicRoute]) -> Vec<Shadowed> {
    let mut found = Vec::new();
    for (i, earlier) in dynamic.iter().enumerate() {
        let Some(earlier_segments) = earlier.matcher.segments() else {
            continue;
        };
        for later in &dynamic[i + 1..] {
            let Some(later_segments) = later.matcher.segments() else {
                continue;
            };
            if later.matcher.specificity() > earlier.matcher.specificity()
                && segments_overlap(earlier_segments, later_segments)
            {
                found.push(Shadowed {
                    general: earlier.matcher.describe(),
                    specific: later.matcher.describe(),
                });
            }
        }
    }
    found
}
