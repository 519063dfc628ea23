//! Reverse routing: building paths and URLs from named routes.

use std::collections::HashMap;

use regex::Regex;
use thiserror::Error;

use crate::routing::collection::RouteCollection;
use crate::routing::parser::{scan, ParsedRoute, TemplatePart, DEFAULT_VARIABLE_REGEX};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("no route named \"{0}\"")]
    UnknownRoute(String),

    #[error("route \"{route}\" needs a value for \"{variable}\"")]
    MissingArgument { route: String, variable: String },

    #[error("\"{value}\" does not satisfy the constraint of \"{variable}\" in route \"{route}\"")]
    InvalidArgument {
        route: String,
        variable: String,
        value: String,
    },
}

pub struct UrlGenerator<'a> {
    collection: &'a RouteCollection,
}

impl<'a> UrlGenerator<'a> {
    pub fn new(collection: &'a RouteCollection) -> Self {
        Self { collection }
    }

    /// Path of a named route with `args` substituted for its variables.
    /// Variables without an argument use their non-empty default.
    pub fn path(&self, name: &str, args: &[(&str, &str)]) -> Result<String, UrlError> {
        let route = self.named(name)?;
        let args: HashMap<&str, &str> = args.iter().copied().collect();
        fill(name, &route, route.path_parts(), &args)
    }

    /// Absolute URL when the route has a host template, otherwise the path.
    pub fn url(&self, name: &str, args: &[(&str, &str)]) -> Result<String, UrlError> {
        let route = self.named(name)?;
        let lookup: HashMap<&str, &str> = args.iter().copied().collect();
        let path = fill(name, &route, route.path_parts(), &lookup)?;
        if !route.has_host() {
            return Ok(path);
        }

        // Host templates were validated when the route was parsed.
        let host_parts = scan(route.raw_host()).unwrap_or_default();
        let host = fill(name, &route, &host_parts, &lookup)?;
        let scheme = if route.is_secure() { "https" } else { "http" };
        Ok(format!("{}://{}{}", scheme, host, path))
    }

    fn named(&self, name: &str) -> Result<std::sync::Arc<ParsedRoute>, UrlError> {
        self.collection
            .named(name)
            .ok_or_else(|| UrlError::UnknownRoute(name.to_string()))
    }
}

fn fill(
    route_name: &str,
    route: &ParsedRoute,
    parts: &[TemplatePart],
    args: &HashMap<&str, &str>,
) -> Result<String, UrlError> {
    let mut out = String::new();
    for part in parts {
        match part {
            TemplatePart::Literal(text) => out.push_str(text),
            TemplatePart::Variable { name, default } => {
                let value = match args.get(name.as_str()) {
                    Some(value) => *value,
                    None if !default.is_empty() => default.as_str(),
                    None => {
                        return Err(UrlError::MissingArgument {
                            route: route_name.to_string(),
                            variable: name.clone(),
                        })
                    }
                };
                let constraint = route.var_regex(name).unwrap_or(DEFAULT_VARIABLE_REGEX);
                let satisfied = Regex::new(&format!("^(?:{})$", constraint))
                    .map(|re| re.is_match(value))
                    .unwrap_or(false);
                if !satisfied {
                    return Err(UrlError::InvalidArgument {
                        route: route_name.to_string(),
                        variable: name.clone(),
                        value: value.to_string(),
                    });
                }
                out.push_str(value);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Container;
    use crate::routing::{Router, RouteOptions};
    use std::sync::Arc;

    fn router() -> Router {
        let mut router = Router::new(Arc::new(Container::new()));
        router
            .get(
                "/users/{id}/posts/{page=1}",
                "Posts@index",
                RouteOptions::new().name("posts").var("id", r"\d+").var("page", r"\d+"),
            )
            .unwrap();
        router
            .get(
                "/dashboard",
                "Dashboard@show",
                RouteOptions::new().name("dashboard").host("{tenant}.example.com").https(true),
            )
            .unwrap();
        router
    }

    #[test]
    fn test_path_generation() {
        let router = router();
        let urls = router.url_generator();
        assert_eq!(urls.path("posts", &[("id", "7")]).unwrap(), "/users/7/posts/1");
        assert_eq!(urls.path("posts", &[("id", "7"), ("page", "3")]).unwrap(), "/users/7/posts/3");
    }

    #[test]
    fn test_generation_errors() {
        let router = router();
        let urls = router.url_generator();
        assert_eq!(urls.path("nope", &[]), Err(UrlError::UnknownRoute("nope".into())));
        assert!(matches!(urls.path("posts", &[]), Err(UrlError::MissingArgument { .. })));
        assert!(matches!(
            urls.path("posts", &[("id", "abc")]),
            Err(UrlError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_url_with_host() {
        let router = router();
        let urls = router.url_generator();
        assert_eq!(
            urls.url("dashboard", &[("tenant", "acme")]).unwrap(),
            "https://acme.example.com/dashboard"
        );
        assert_eq!(urls.url("posts", &[("id", "1")]).unwrap(), "/users/1/posts/1");
    }
}
