//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check controller references, methods, templates and constraints
//! - Detect duplicate route names across the whole group tree
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::Method;
use regex::Regex;
use thiserror::Error;

use crate::config::schema::{AppConfig, GroupConfig, RouteConfig};
use crate::routing::parser::scan;
use crate::routing::{ControllerRef, SUPPORTED_METHODS};

/// Method keyword registering a route for every supported method.
pub const ANY_METHOD: &str = "ANY";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address \"{0}\"")]
    InvalidBindAddress(String),

    #[error("invalid metrics address \"{0}\"")]
    InvalidMetricsAddress(String),

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("{location}: {message}")]
    Invalid { location: String, message: String },

    #[error("{location}: route name \"{name}\" is already used")]
    DuplicateName { location: String, name: String },
}

impl ValidationError {
    fn invalid(location: &str, message: impl Into<String>) -> Self {
        ValidationError::Invalid {
            location: location.to_string(),
            message: message.into(),
        }
    }
}

/// Methods the configured router accepts.
pub fn supported_methods(config: &AppConfig) -> Result<Vec<Method>, Vec<ValidationError>> {
    if config.routing.methods.is_empty() {
        return Ok(SUPPORTED_METHODS.to_vec());
    }
    let mut errors = Vec::new();
    let mut methods = Vec::new();
    for method in &config.routing.methods {
        match Method::from_bytes(method.to_ascii_uppercase().as_bytes()) {
            Ok(method) => methods.push(method),
            Err(_) => errors.push(ValidationError::invalid(
                "routing.methods",
                format!("\"{}\" is not a method", method),
            )),
        }
    }
    if errors.is_empty() {
        Ok(methods)
    } else {
        Err(errors)
    }
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let methods = match supported_methods(config) {
        Ok(methods) => methods,
        Err(mut method_errors) => {
            errors.append(&mut method_errors);
            Vec::new()
        }
    };

    if let Some(controller) = &config.routing.missing_route_controller {
        if let Err(e) = ControllerRef::parse(controller) {
            errors.push(ValidationError::invalid("routing.missing_route_controller", e.to_string()));
        }
    }

    let mut checker = Checker {
        methods,
        names: HashSet::new(),
        errors,
    };
    for (i, route) in config.routes.iter().enumerate() {
        checker.route(&format!("routes[{}]", i), route);
    }
    for (i, group) in config.groups.iter().enumerate() {
        checker.group(&format!("groups[{}]", i), group);
    }

    if checker.errors.is_empty() {
        Ok(())
    } else {
        Err(checker.errors)
    }
}

struct Checker {
    methods: Vec<Method>,
    names: HashSet<String>,
    errors: Vec<ValidationError>,
}

impl Checker {
    fn group(&mut self, location: &str, group: &GroupConfig) {
        self.template(&format!("{}.path", location), &group.path);
        self.template(&format!("{}.host", location), &group.host);
        self.constraints(location, group.vars.values());
        if group.controller_namespace.contains('@') {
            self.errors.push(ValidationError::invalid(
                location,
                format!("controller namespace \"{}\" contains '@'", group.controller_namespace),
            ));
        }

        for (i, route) in group.routes.iter().enumerate() {
            self.route(&format!("{}.routes[{}]", location, i), route);
        }
        for (i, nested) in group.groups.iter().enumerate() {
            self.group(&format!("{}.groups[{}]", location, i), nested);
        }
    }

    fn route(&mut self, location: &str, route: &RouteConfig) {
        if route.methods.is_empty() {
            self.errors.push(ValidationError::invalid(location, "no methods"));
        }
        for method in &route.methods {
            if method.eq_ignore_ascii_case(ANY_METHOD) {
                continue;
            }
            let supported = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .map(|m| self.methods.is_empty() || self.methods.contains(&m))
                .unwrap_or(false);
            if !supported {
                self.errors.push(ValidationError::invalid(
                    location,
                    format!("unsupported method \"{}\"", method),
                ));
            }
        }

        if let Err(e) = ControllerRef::parse(&route.controller) {
            self.errors.push(ValidationError::invalid(location, e.to_string()));
        }

        self.template(&format!("{}.path", location), &route.path);
        if let Some(host) = &route.host {
            self.template(&format!("{}.host", location), host);
        }
        self.constraints(location, route.vars.values());

        if let Some(name) = route.name.as_ref().filter(|name| !name.is_empty()) {
            if !self.names.insert(name.clone()) {
                self.errors.push(ValidationError::DuplicateName {
                    location: location.to_string(),
                    name: name.clone(),
                });
            }
        }
    }

    fn template(&mut self, location: &str, template: &str) {
        if let Err(e) = scan(template) {
            self.errors.push(ValidationError::invalid(location, e.to_string()));
        }
    }

    fn constraints<'a>(&mut self, location: &str, constraints: impl Iterator<Item = &'a String>) {
        for constraint in constraints {
            if let Err(e) = Regex::new(constraint) {
                self.errors.push(ValidationError::invalid(
                    location,
                    format!("invalid constraint \"{}\": {}", constraint, e),
                ));
            }
        }
    }
}
