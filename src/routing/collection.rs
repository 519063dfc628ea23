//! Route storage.
//!
//! # Responsibilities
//! - Bucket parsed routes by HTTP method, preserving registration order
//! - Index named routes for reverse lookup
//!
//! # Design Decisions
//! - Registration order is match priority; nothing is re-sorted
//! - The name index shares the bucket's `Arc`, it never copies
//! - Duplicate names are rejected instead of silently overwritten
//! - Supported methods are passed in, not held in a global

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::http::Method;

use crate::routing::error::FormatError;
use crate::routing::parser::ParsedRoute;
use crate::routing::route::SUPPORTED_METHODS;

/// Identifier assigned to a route when it enters a collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(pub u64);

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct RouteCollection {
    methods: Vec<Method>,
    routes: HashMap<Method, Vec<Arc<ParsedRoute>>>,
    named: HashMap<String, Arc<ParsedRoute>>,
    ordered: Vec<Arc<ParsedRoute>>,
    next_id: u64,
}

impl RouteCollection {
    pub fn new(methods: &[Method]) -> Self {
        let routes = methods
            .iter()
            .map(|method| (method.clone(), Vec::new()))
            .collect();
        Self {
            methods: methods.to_vec(),
            routes,
            named: HashMap::new(),
            ordered: Vec::new(),
            next_id: 1,
        }
    }

    /// Methods this collection accepts.
    pub fn supported_methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn supports(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    /// Insert a route into every bucket of its methods.
    pub fn add(&mut self, mut route: ParsedRoute) -> Result<Arc<ParsedRoute>, FormatError> {
        for method in route.methods() {
            if !self.supports(method) {
                return Err(FormatError::UnsupportedMethod {
                    method: method.clone(),
                    path: route.raw_path().to_string(),
                });
            }
        }
        if let Some(name) = route.name() {
            if self.named.contains_key(name) {
                return Err(FormatError::DuplicateRouteName(name.to_string()));
            }
        }

        route.set_id(self.reserve_id());
        let route = Arc::new(route);

        for method in route.methods() {
            self.routes
                .entry(method.clone())
                .or_default()
                .push(route.clone());
        }
        if let Some(name) = route.name() {
            self.named.insert(name.to_string(), route.clone());
        }
        self.ordered.push(route.clone());

        Ok(route)
    }

    /// Allocate an id without storing a route.
    pub(crate) fn reserve_id(&mut self) -> RouteId {
        let id = RouteId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Routes for one method, in registration order. Empty for unknown methods.
    pub fn get(&self, method: &Method) -> &[Arc<ParsedRoute>] {
        self.routes.get(method).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every bucket.
    pub fn all(&self) -> &HashMap<Method, Vec<Arc<ParsedRoute>>> {
        &self.routes
    }

    pub fn named(&self, name: &str) -> Option<Arc<ParsedRoute>> {
        self.named.get(name).cloned()
    }

    /// Each route once, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ParsedRoute>> {
        self.ordered.iter()
    }

    /// Number of distinct routes.
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

impl Default for RouteCollection {
    fn default() -> Self {
        Self::new(&SUPPORTED_METHODS)
    }
}
