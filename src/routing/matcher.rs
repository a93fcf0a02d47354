//! Dynamic route matching logic.
//!
//! # Responsibilities
//! - Match a query-stripped path against a segment pattern
//! - Capture placeholder segments as route params
//! - Report how specific a rule is, for shadowing detection
//!
//! # Design Decisions
//! - Patterns are anchored: segment counts must agree
//! - A placeholder matches exactly one non-empty segment, never a `/`
//! - No regex; matching is a single pass over the segments

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Trait for matching paths against a dynamic route rule.
pub trait RouteMatcher: Send + Sync + fmt::Debug {
    /// Returns the captured params if the path matches this rule.
    fn match_path(&self, path: &str) -> Option<RouteParams>;

    /// How specific this rule is. Higher sorts as more specific.
    fn specificity(&self) -> Specificity {
        Specificity::default()
    }

    /// The rule's segments, when it has a segment shape.
    fn segments(&self) -> Option<&[Segment]> {
        None
    }

    /// Human readable form for listings and logs.
    fn describe(&self) -> String;
}

/// Params captured from placeholder segments, keyed by placeholder name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams(BTreeMap<String, String>);

impl RouteParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Ordering key for rule specificity: literal segments first, then length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity {
    pub literals: usize,
    pub segments: usize,
}

/// One segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
}

/// Error raised when a pattern string is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern '{0}' must start with '/'")]
    MissingLeadingSlash(String),

    #[error("pattern '{0}' has an empty segment")]
    EmptySegment(String),

    #[error("pattern '{0}' has an unnamed placeholder")]
    UnnamedParam(String),

    #[error("pattern '{pattern}' repeats placeholder '{name}'")]
    DuplicateParam { pattern: String, name: String },
}

/// Matches paths shaped like `/strategies/edit/{id}`.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pattern: String,
    segments: Vec<Segment>,
}

impl PatternMatcher {
    /// Parse a pattern. `{name}` marks a placeholder segment.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let rest = pattern
            .strip_prefix('/')
            .ok_or_else(|| PatternError::MissingLeadingSlash(pattern.to_string()))?;

        let mut segments = Vec::new();
        if !rest.is_empty() {
            for raw in rest.split('/') {
                if raw.is_empty() {
                    return Err(PatternError::EmptySegment(pattern.to_string()));
                }
                let segment = match raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    Some("") => return Err(PatternError::UnnamedParam(pattern.to_string())),
                    Some(name) => {
                        let duplicate = segments
                            .iter()
                            .any(|s| matches!(s, Segment::Param(existing) if existing == name));
                        if duplicate {
                            return Err(PatternError::DuplicateParam {
                                pattern: pattern.to_string(),
                                name: name.to_string(),
                            });
                        }
                        Segment::Param(name.to_string())
                    }
                    None => Segment::Literal(raw.to_string()),
                };
                segments.push(segment);
            }
        }

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl RouteMatcher for PatternMatcher {
    fn match_path(&self, path: &str) -> Option<RouteParams> {
        let rest = path.strip_prefix('/')?;
        let parts: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('/').collect()
        };

        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = RouteParams::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(_) if part.is_empty() => return None,
                Segment::Param(name) => params.insert(name.clone(), part),
            }
        }
        Some(params)
    }

    fn specificity(&self) -> Specificity {
        Specificity {
            literals: self
                .segments
                .iter()
                .filter(|s| matches!(s, Segment::Literal(_)))
                .count(),
            segments: self.segments.len(),
        }
    }

    fn segments(&self) -> Option<&[Segment]> {
        Some(&self.segments)
    }

    fn describe(&self) -> String {
        self.pattern.clone()
    }
}

/// Matches paths accepted by an arbitrary predicate. Captures nothing.
pub struct PredicateMatcher {
    label: String,
    predicate: Box<dyn Fn(&str) -> bool + Send + Sync>,
}

impl PredicateMatcher {
    pub fn new<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            predicate: Box::new(predicate),
        }
    }
}

impl fmt::Debug for PredicateMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateMatcher")
            .field("label", &self.label)
            .finish()
    }
}

impl RouteMatcher for PredicateMatcher {
    fn match_path(&self, path: &str) -> Option<RouteParams> {
        (self.predicate)(path).then(RouteParams::new)
    }

    fn describe(&self) -> String {
        format!("<{}>", self.label)
    }
}

/// True if some path could be matched by both segment lists.
pub fn segments_overlap(a: &[Segment], b: &[Segment]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|pair| match pair {
            (Segment::Literal(x), Segment::Literal(y)) => x == y,
            _ => true,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_captures_param() {
        let matcher = PatternMatcher::parse("/strategies/{id}").unwrap();
        let params = matcher.match_path("/strategies/abc123").unwrap();
        assert_eq!(params.get("id"), Some("abc123"));
    }

    #[test]
    fn test_param_never_spans_separators() {
        let matcher = PatternMatcher::parse("/strategies/{id}").unwrap();
        assert!(matcher.match_path("/strategies/edit/42").is_none());
        assert!(matcher.match_path("/strategies/").is_none());
        assert!(matcher.match_path("/strategies").is_none());
    }

    #[test]
    fn test_literal_segments_must_match() {
        let matcher = PatternMatcher::parse("/strategies/edit/{id}").unwrap();
        assert_eq!(
            matcher.match_path("/strategies/edit/42").unwrap().get("id"),
            Some("42")
        );
        assert!(matcher.match_path("/strategies/view/42").is_none());
    }

    #[test]
    fn test_root_pattern() {
        let matcher = PatternMatcher::parse("/").unwrap();
        assert!(matcher.match_path("/").is_some());
        assert!(matcher.match_path("/x").is_none());
    }

    #[test]
    fn test_malformed_patterns() {
        assert!(matches!(
            PatternMatcher::parse("strategies"),
            Err(PatternError::MissingLeadingSlash(_))
        ));
        assert!(matches!(
            PatternMatcher::parse("/a//b"),
            Err(PatternError::EmptySegment(_))
        ));
        assert!(matches!(
            PatternMatcher::parse("/a/{}"),
            Err(PatternError::UnnamedParam(_))
        ));
        assert!(matches!(
            PatternMatcher::parse("/a/{id}/{id}"),
            Err(PatternError::DuplicateParam { .. })
        ));
    }

    #[test]
    fn test_specificity_prefers_literals() {
        let edit = PatternMatcher::parse("/strategies/edit/{id}").unwrap();
        let detail = PatternMatcher::parse("/strategies/{id}").unwrap();
        let wide = PatternMatcher::parse("/{section}/{id}").unwrap();
        assert!(edit.specificity() > detail.specificity());
        assert!(detail.specificity() > wide.specificity());
    }

    #[test]
    fn test_overlap() {
        let detail = PatternMatcher::parse("/strategies/{id}").unwrap();
        let add = PatternMatcher::parse("/strategies/add").unwrap();
        let edit = PatternMatcher::parse("/strategies/edit/{id}").unwrap();
        assert!(segments_overlap(detail.segments().unwrap(), add.segments().unwrap()));
        assert!(!segments_overlap(detail.segments().unwrap(), edit.segments().unwrap()));
    }

    #[test]
    fn test_predicate_matcher() {
        let matcher = PredicateMatcher::new("legacy", |p| p.starts_with("/legacy/"));
        assert!(matcher.match_path("/legacy/x").unwrap().is_empty());
        assert!(matcher.match_path("/modern").is_none());
        assert_eq!(matcher.describe(), "<legacy>");
    }
}
