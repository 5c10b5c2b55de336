// src/verify/route.rs

//! Routing token extraction.
//!
//! Backends answer with a body made of `label: value` lines; one label
//! (`JVM route` by default) names the backend that served the request.

use std::fmt;

/// Routing token of a response.
///
/// `Unknown` (no line with the label) is distinct from
/// `Known("")` (the line is present with an empty value).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Known(String),
    Unknown,
}

impl Route {
    pub fn known(value: impl Into<String>) -> Self {
        Route::Known(value.into())
    }

    pub fn as_known(&self) -> Option<&str> {
        match self {
            Route::Known(v) => Some(v),
            Route::Unknown => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Known(v) if v.is_empty() => f.write_str("\"\""),
            Route::Known(v) => f.write_str(v),
            Route::Unknown => f.write_str("<unknown>"),
        }
    }
}

/// Split a `label ":" value` line. Label and value are trimmed; a line with
/// no colon or an empty label is not a header line.
pub fn parse_header_line(line: &str) -> Option<(&str, &str)> {
    let (label, value) = line.split_once(':')?;
    let label = label.trim();
    if label.is_empty() {
        return None;
    }
    Some((label, value.trim()))
}

/// Finds the routing token in response bodies.
#[derive(Debug, Clone)]
pub struct RouteExtractor {
    label: String,
}

impl RouteExtractor {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into().trim().to_string(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Value of the first line whose label matches exactly.
    pub fn extract(&self, body: &str) -> Route {
        body.lines()
            .filter_map(parse_header_line)
            .find(|(label, _)| *label == self.label)
            .map(|(_, value)| Route::known(value))
            .unwrap_or(Route::Unknown)
    }
}

impl Default for RouteExtractor {
    fn default() -> Self {
        Self::new("JVM route")
    }
}
