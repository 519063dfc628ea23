//! Matching parsed routes against requests.

use std::collections::HashMap;
use std::sync::Arc;

use regex::{Captures, Regex};

use crate::http::Request;
use crate::routing::parser::ParsedRoute;

/// A parsed route evaluated against one request.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    route: Arc<ParsedRoute>,
    is_match: bool,
    bindings: HashMap<String, String>,
}

impl CompiledRoute {
    pub fn new(route: Arc<ParsedRoute>, is_match: bool, bindings: HashMap<String, String>) -> Self {
        Self {
            route,
            is_match,
            bindings,
        }
    }

    pub fn route(&self) -> &Arc<ParsedRoute> {
        &self.route
    }

    pub fn is_match(&self) -> bool {
        self.is_match
    }

    pub fn bindings(&self) -> &HashMap<String, String> {
        &self.bindings
    }

    /// Value bound to a variable.
    pub fn binding(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(String::as_str)
    }
}

/// Evaluates host, path and scheme constraints. Method filtering is done by
/// the caller, which only hands over routes from the request method's bucket.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteCompiler;

impl RouteCompiler {
    pub fn new() -> Self {
        Self
    }

    pub fn compile(&self, route: &Arc<ParsedRoute>, request: &Request) -> CompiledRoute {
        let no_match = || CompiledRoute::new(route.clone(), false, HashMap::new());

        if route.is_secure() && !request.is_secure() {
            return no_match();
        }

        let host_captures = if route.has_host() {
            match route.host_regex().captures(request.host()) {
                Some(captures) => Some(captures),
                None => return no_match(),
            }
        } else {
            None
        };

        let path_captures = match route.path_regex().captures(request.path()) {
            Some(captures) => captures,
            None => return no_match(),
        };

        let mut bindings = HashMap::new();
        if let Some(captures) = host_captures {
            bind(route, route.host_regex(), &captures, &mut bindings);
        }
        bind(route, route.path_regex(), &path_captures, &mut bindings);

        CompiledRoute::new(route.clone(), true, bindings)
    }
}

fn bind(
    route: &ParsedRoute,
    regex: &Regex,
    captures: &Captures<'_>,
    bindings: &mut HashMap<String, String>,
) {
    for name in regex.capture_names().flatten() {
        let Some(default) = route.default_value(name) else {
            continue;
        };
        let value = match captures.name(name) {
            Some(m) if !m.as_str().is_empty() => m.as_str().to_string(),
            _ => default.to_string(),
        };
        bindings.insert(name.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::parser::RouteParser;
    use crate::routing::route::{Route, RouteOptions};
    use axum::http::Method;

    fn parsed(path: &str, options: RouteOptions) -> Arc<ParsedRoute> {
        let route = Route::new([Method::GET], path, "Users@show", options).unwrap();
        Arc::new(RouteParser::new().parse(route).unwrap())
    }

    #[test]
    fn test_numeric_constraint() {
        let route = parsed("/users/{id}", RouteOptions::new().var("id", r"\d+"));
        let compiler = RouteCompiler::new();

        let compiled = compiler.compile(&route, &Request::get("/users/42"));
        assert!(compiled.is_match());
        assert_eq!(compiled.binding("id"), Some("42"));

        let compiled = compiler.compile(&route, &Request::get("/users/abc"));
        assert!(!compiled.is_match());
        assert!(compiled.bindings().is_empty());
    }

    #[test]
    fn test_empty_capture_falls_back_to_default() {
        let route = parsed("/posts{page=1}", RouteOptions::new().var("page", r"\d*"));
        let compiled = RouteCompiler::new().compile(&route, &Request::get("/posts"));
        assert!(compiled.is_match());
        assert_eq!(compiled.binding("page"), Some("1"));

        let compiled = RouteCompiler::new().compile(&route, &Request::get("/posts7"));
        assert_eq!(compiled.binding("page"), Some("7"));
    }

    #[test]
    fn test_optional_group_absent_falls_back_to_default() {
        let route = parsed("/docs{section=intro}", RouteOptions::new().var("section", r"(?:/[a-z]+)?"));
        let compiled = RouteCompiler::new().compile(&route, &Request::get("/docs"));
        assert!(compiled.is_match());
        assert_eq!(compiled.binding("section"), Some("intro"));
    }

    #[test]
    fn test_host_constraint_and_bindings() {
        let route = parsed("/users/{id}", RouteOptions::new().host("{tenant}.example.com"));
        let compiler = RouteCompiler::new();

        let request = Request::get("/users/7").with_host("acme.example.com");
        let compiled = compiler.compile(&route, &request);
        assert!(compiled.is_match());
        assert_eq!(compiled.binding("tenant"), Some("acme"));
        assert_eq!(compiled.binding("id"), Some("7"));

        let request = Request::get("/users/7").with_host("example.org");
        assert!(!compiler.compile(&route, &request).is_match());
    }

    #[test]
    fn test_secure_route_requires_secure_request() {
        let route = parsed("/login", RouteOptions::new().https(true));
        let compiler = RouteCompiler::new();
        assert!(!compiler.compile(&route, &Request::get("/login")).is_match());
        assert!(compiler.compile(&route, &Request::get("/login").with_secure(true)).is_match());
    }

    #[test]
    fn test_compile_is_idempotent() {
        let route = parsed("/users/{id}", RouteOptions::new());
        let compiler = RouteCompiler::new();
        let request = Request::get("/users/9");
        let first = compiler.compile(&route, &request);
        let second = compiler.compile(&route, &request);
        assert_eq!(first.is_match(), second.is_match());
        assert_eq!(first.bindings(), second.bindings());
        assert_eq!(route.default_value("id"), Some(""));
    }
}
