//! Template parsing.
//!
//! # Responsibilities
//! - Split path/host templates into literal text and `{name=default}` placeholders
//! - Generate anchored expressions with one named capture per placeholder
//! - Record each variable's default value
//!
//! # Design Decisions
//! - Literal text is escaped, constraint text is inserted verbatim
//! - Brace depth is tracked so constraint and placeholder text is never escaped
//! - Duplicate names and malformed braces fail at registration time

use std::collections::{HashMap, HashSet};
use std::ops::Deref;

use regex::{Regex, RegexBuilder};

use crate::routing::collection::RouteId;
use crate::routing::error::FormatError;
use crate::routing::route::Route;

/// Constraint used for variables without an explicit one.
pub const DEFAULT_VARIABLE_REGEX: &str = ".+";

/// Host expression of routes without a host template.
pub const ANY_HOST_PATTERN: &str = "^.*$";

/// One piece of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    Literal(String),
    Variable { name: String, default: String },
}

/// A route with its templates turned into expressions.
#[derive(Debug, Clone)]
pub struct ParsedRoute {
    id: RouteId,
    route: Route,
    path_parts: Vec<TemplatePart>,
    path_pattern: String,
    path_regex: Regex,
    host_pattern: String,
    host_regex: Regex,
    has_host: bool,
    defaults: HashMap<String, String>,
}

impl ParsedRoute {
    pub fn id(&self) -> RouteId {
        self.id
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn path_pattern(&self) -> &str {
        &self.path_pattern
    }

    pub fn path_regex(&self) -> &Regex {
        &self.path_regex
    }

    pub fn host_pattern(&self) -> &str {
        &self.host_pattern
    }

    pub fn host_regex(&self) -> &Regex {
        &self.host_regex
    }

    /// Whether the route constrains the request host.
    pub fn has_host(&self) -> bool {
        self.has_host
    }

    /// The literal/variable pieces of the path template.
    pub fn path_parts(&self) -> &[TemplatePart] {
        &self.path_parts
    }

    pub fn defaults(&self) -> &HashMap<String, String> {
        &self.defaults
    }

    pub fn default_value(&self, name: &str) -> Option<&str> {
        self.defaults.get(name).map(String::as_str)
    }

    pub(crate) fn set_id(&mut self, id: RouteId) {
        self.id = id;
    }

    /// Override or add a default. Used by synthetic routes.
    pub(crate) fn set_default_value(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.defaults.insert(name.into(), value.into());
    }
}

impl Deref for ParsedRoute {
    type Target = Route;

    fn deref(&self) -> &Route {
        &self.route
    }
}

/// Turns routes into [`ParsedRoute`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteParser;

impl RouteParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, route: Route) -> Result<ParsedRoute, FormatError> {
        let mut defaults = HashMap::new();

        let path_parts = scan(route.raw_path())?;
        let path_pattern = build_pattern(&route, &path_parts, &mut defaults);
        let path_regex = Regex::new(&path_pattern).map_err(|e| FormatError::InvalidConstraint {
            template: route.raw_path().to_string(),
            reason: e.to_string(),
        })?;

        let has_host = !route.raw_host().is_empty();
        let host_pattern = if has_host {
            let host_parts = scan(route.raw_host())?;
            build_pattern(&route, &host_parts, &mut defaults)
        } else {
            ANY_HOST_PATTERN.to_string()
        };
        let host_regex = RegexBuilder::new(&host_pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| FormatError::InvalidConstraint {
                template: route.raw_host().to_string(),
                reason: e.to_string(),
            })?;

        tracing::trace!(path = %path_pattern, host = %host_pattern, "Parsed route templates");

        Ok(ParsedRoute {
            id: RouteId::default(),
            route,
            path_parts,
            path_pattern,
            path_regex,
            host_pattern,
            host_regex,
            has_host,
            defaults,
        })
    }
}

fn build_pattern(
    route: &Route,
    parts: &[TemplatePart],
    defaults: &mut HashMap<String, String>,
) -> String {
    let mut pattern = String::from("^");
    for part in parts {
        match part {
            TemplatePart::Literal(text) => pattern.push_str(&regex::escape(text)),
            TemplatePart::Variable { name, default } => {
                let constraint = route.var_regex(name).unwrap_or(DEFAULT_VARIABLE_REGEX);
                pattern.push_str(&format!("(?P<{}>{})", name, constraint));
                defaults.insert(name.clone(), default.clone());
            }
        }
    }
    pattern.push('$');
    pattern
}

/// Split a template into literal and variable parts.
pub fn scan(template: &str) -> Result<Vec<TemplatePart>, FormatError> {
    let mut parts = Vec::new();
    let mut seen = HashSet::new();
    let mut literal = String::new();
    let mut body = String::new();
    let mut depth = 0usize;

    for ch in template.chars() {
        match ch {
            '{' => {
                if depth > 0 {
                    return Err(FormatError::NestedPlaceholder(template.to_string()));
                }
                depth += 1;
                if !literal.is_empty() {
                    parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
                }
            }
            '}' => {
                if depth == 0 {
                    return Err(FormatError::UnexpectedBrace(template.to_string()));
                }
                depth -= 1;
                let placeholder = std::mem::take(&mut body);
                let (name, default) = match placeholder.split_once('=') {
                    Some((name, default)) => (name.trim(), default),
                    None => (placeholder.trim(), ""),
                };
                if !is_identifier(name) {
                    return Err(FormatError::InvalidVariableName {
                        name: name.to_string(),
                        template: template.to_string(),
                    });
                }
                if !seen.insert(name.to_string()) {
                    return Err(FormatError::DuplicateVariable {
                        name: name.to_string(),
                        template: template.to_string(),
                    });
                }
                parts.push(TemplatePart::Variable {
                    name: name.to_string(),
                    default: default.to_string(),
                });
            }
            _ if depth > 0 => body.push(ch),
            _ => literal.push(ch),
        }
    }

    if depth > 0 {
        return Err(FormatError::UnclosedPlaceholder(template.to_string()));
    }
    if !literal.is_empty() {
        parts.push(TemplatePart::Literal(literal));
    }
    Ok(parts)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::route::RouteOptions;
    use axum::http::Method;

    fn parse(path: &str, options: RouteOptions) -> Result<ParsedRoute, FormatError> {
        let route = Route::new([Method::GET], path, "Users@show", options)?;
        RouteParser::new().parse(route)
    }

    #[test]
    fn test_literal_path_is_escaped() {
        let parsed = parse("/files/report.pdf", RouteOptions::new()).unwrap();
        assert_eq!(parsed.path_pattern(), r"^/files/report\.pdf$");
        assert!(parsed.path_regex().is_match("/files/report.pdf"));
        assert!(!parsed.path_regex().is_match("/files/reportXpdf"));
        assert!(!parsed.has_host());
        assert_eq!(parsed.host_pattern(), ANY_HOST_PATTERN);
    }

    #[test]
    fn test_variables_become_named_groups() {
        let parsed = parse("/users/{id}/posts/{slug=latest}", RouteOptions::new().var("id", r"\d+")).unwrap();
        assert_eq!(
            parsed.path_pattern(),
            r"^/users/(?P<id>\d+)/posts/(?P<slug>.+)$"
        );
        assert_eq!(parsed.default_value("id"), Some(""));
        assert_eq!(parsed.default_value("slug"), Some("latest"));
    }

    #[test]
    fn test_constraint_braces_pass_through() {
        let parsed = parse("/y/{year}", RouteOptions::new().var("year", r"\d{4}")).unwrap();
        assert_eq!(parsed.path_pattern(), r"^/y/(?P<year>\d{4})$");
        assert!(parsed.path_regex().is_match("/y/2024"));
        assert!(!parsed.path_regex().is_match("/y/24"));
    }

    #[test]
    fn test_duplicate_variable_rejected() {
        let err = parse("/{id}/{id}", RouteOptions::new()).unwrap_err();
        assert_eq!(
            err,
            FormatError::DuplicateVariable {
                name: "id".into(),
                template: "/{id}/{id}".into()
            }
        );
    }

    #[test]
    fn test_malformed_braces_rejected() {
        assert!(matches!(parse("/{id", RouteOptions::new()), Err(FormatError::UnclosedPlaceholder(_))));
        assert!(matches!(parse("/id}", RouteOptions::new()), Err(FormatError::UnexpectedBrace(_))));
        assert!(matches!(parse("/{a{b}}", RouteOptions::new()), Err(FormatError::NestedPlaceholder(_))));
        assert!(matches!(parse("/{1abc}", RouteOptions::new()), Err(FormatError::InvalidVariableName { .. })));
        assert!(matches!(parse("/{}", RouteOptions::new()), Err(FormatError::InvalidVariableName { .. })));
    }

    #[test]
    fn test_bad_constraint_rejected() {
        let err = parse("/{id}", RouteOptions::new().var("id", "(")).unwrap_err();
        assert!(matches!(err, FormatError::InvalidConstraint { .. }));
    }

    #[test]
    fn test_host_template() {
        let parsed = parse("/", RouteOptions::new().host("{tenant}.example.com")).unwrap();
        assert!(parsed.has_host());
        assert_eq!(parsed.host_pattern(), r"^(?P<tenant>.+)\.example\.com$");
        assert!(parsed.host_regex().is_match("ACME.Example.com"));
        assert_eq!(parsed.default_value("tenant"), Some(""));
    }

    #[test]
    fn test_scan_parts() {
        let parts = scan("/a/{b=c=d}").unwrap();
        assert_eq!(
            parts,
            vec![
                TemplatePart::Literal("/a/".into()),
                TemplatePart::Variable { name: "b".into(), default: "c=d".into() },
            ]
        );
    }
}
