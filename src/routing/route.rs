//! User-declared routes.
//!
//! # Responsibilities
//! - Hold the raw method/path/host/controller mapping of one route
//! - Validate controller references once, at construction
//! - Carry per-route options (constraints, middleware, host, name, https)
//!
//! # Design Decisions
//! - Controllers are a tagged variant, never re-inspected at dispatch time
//! - Routes are only mutated by group application, before parsing

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use axum::http::Method;
use serde::{Deserialize, Serialize};

use crate::dispatch::controller::ClosureController;
use crate::routing::error::FormatError;

/// Separator between class and method in a controller string.
pub const CONTROLLER_SEPARATOR: char = '@';

/// Methods a router accepts unless configured otherwise.
pub const SUPPORTED_METHODS: [Method; 7] = [
    Method::DELETE,
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::HEAD,
    Method::OPTIONS,
    Method::PATCH,
];

/// What a route dispatches to.
#[derive(Clone)]
pub enum ControllerRef {
    /// A controller resolved by class name, then invoked by method name.
    Named { class: String, method: String },
    /// An inline handler.
    Closure(ClosureController),
}

impl ControllerRef {
    /// Parse a `Class@method` reference.
    pub fn parse(reference: &str) -> Result<Self, FormatError> {
        let mut parts = reference.split(CONTROLLER_SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(class), Some(method), None) if !class.is_empty() && !method.is_empty() => {
                Ok(ControllerRef::Named {
                    class: class.to_string(),
                    method: method.to_string(),
                })
            }
            _ => Err(FormatError::InvalidController(reference.to_string())),
        }
    }

    /// Wrap a closure as a controller.
    pub fn closure<F>(handler: F) -> Self
    where
        F: Fn(&crate::dispatch::RouteContext<'_>) -> Result<crate::http::Response, crate::dispatch::DispatchError>
            + Send
            + Sync
            + 'static,
    {
        ControllerRef::Closure(Arc::new(handler))
    }

    pub fn is_closure(&self) -> bool {
        matches!(self, ControllerRef::Closure(_))
    }

    /// Class name for named controllers.
    pub fn class(&self) -> Option<&str> {
        match self {
            ControllerRef::Named { class, .. } => Some(class),
            ControllerRef::Closure(_) => None,
        }
    }

    /// Method name for named controllers.
    pub fn method(&self) -> Option<&str> {
        match self {
            ControllerRef::Named { method, .. } => Some(method),
            ControllerRef::Closure(_) => None,
        }
    }
}

impl fmt::Debug for ControllerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerRef::Named { class, method } => f
                .debug_struct("Named")
                .field("class", class)
                .field("method", method)
                .finish(),
            ControllerRef::Closure(_) => f.write_str("Closure"),
        }
    }
}

impl fmt::Display for ControllerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerRef::Named { class, method } => {
                write!(f, "{}{}{}", class, CONTROLLER_SEPARATOR, method)
            }
            ControllerRef::Closure(_) => f.write_str("<closure>"),
        }
    }
}

/// Conversion into a validated [`ControllerRef`].
pub trait IntoControllerRef {
    fn into_controller_ref(self) -> Result<ControllerRef, FormatError>;
}

impl IntoControllerRef for ControllerRef {
    fn into_controller_ref(self) -> Result<ControllerRef, FormatError> {
        Ok(self)
    }
}

impl IntoControllerRef for &str {
    fn into_controller_ref(self) -> Result<ControllerRef, FormatError> {
        ControllerRef::parse(self)
    }
}

impl IntoControllerRef for String {
    fn into_controller_ref(self) -> Result<ControllerRef, FormatError> {
        ControllerRef::parse(&self)
    }
}

impl IntoControllerRef for &String {
    fn into_controller_ref(self) -> Result<ControllerRef, FormatError> {
        ControllerRef::parse(self)
    }
}

/// A middleware reference attached to a route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MiddlewareDescriptor {
    Named(String),
    Parameterized {
        name: String,
        #[serde(default)]
        parameters: BTreeMap<String, String>,
    },
}

impl MiddlewareDescriptor {
    pub fn with_parameters<I, K, V>(name: impl Into<String>, parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        MiddlewareDescriptor::Parameterized {
            name: name.into(),
            parameters: parameters
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            MiddlewareDescriptor::Named(name) => name,
            MiddlewareDescriptor::Parameterized { name, .. } => name,
        }
    }
}

impl From<&str> for MiddlewareDescriptor {
    fn from(name: &str) -> Self {
        MiddlewareDescriptor::Named(name.to_string())
    }
}

impl From<String> for MiddlewareDescriptor {
    fn from(name: String) -> Self {
        MiddlewareDescriptor::Named(name)
    }
}

/// Options recognized at registration.
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    /// Variable name -> regex constraint.
    pub vars: HashMap<String, String>,
    pub middleware: Vec<MiddlewareDescriptor>,
    pub host: Option<String>,
    pub name: Option<String>,
    pub https: bool,
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn var(mut self, name: impl Into<String>, regex: impl Into<String>) -> Self {
        self.vars.insert(name.into(), regex.into());
        self
    }

    pub fn middleware(mut self, middleware: impl Into<MiddlewareDescriptor>) -> Self {
        self.middleware.push(middleware.into());
        self
    }

    pub fn middlewares<I, M>(mut self, middleware: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<MiddlewareDescriptor>,
    {
        self.middleware.extend(middleware.into_iter().map(Into::into));
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn https(mut self, https: bool) -> Self {
        self.https = https;
        self
    }
}

/// A raw route, before its templates are turned into expressions.
#[derive(Debug, Clone)]
pub struct Route {
    methods: Vec<Method>,
    raw_path: String,
    raw_host: String,
    controller: ControllerRef,
    middleware: Vec<MiddlewareDescriptor>,
    secure: bool,
    var_regexes: HashMap<String, String>,
    name: Option<String>,
}

impl Route {
    /// Build a route. Duplicate methods are collapsed.
    pub fn new<I>(
        methods: I,
        raw_path: impl Into<String>,
        controller: impl IntoControllerRef,
        options: RouteOptions,
    ) -> Result<Self, FormatError>
    where
        I: IntoIterator<Item = Method>,
    {
        let raw_path = raw_path.into();
        let mut unique: Vec<Method> = Vec::new();
        for method in methods {
            if !unique.contains(&method) {
                unique.push(method);
            }
        }
        if unique.is_empty() {
            return Err(FormatError::NoMethods(raw_path));
        }

        Ok(Self {
            methods: unique,
            raw_path,
            raw_host: options.host.unwrap_or_default(),
            controller: controller.into_controller_ref()?,
            middleware: options.middleware,
            secure: options.https,
            var_regexes: options.vars,
            name: options.name.filter(|name| !name.is_empty()),
        })
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn raw_path(&self) -> &str {
        &self.raw_path
    }

    pub fn raw_host(&self) -> &str {
        &self.raw_host
    }

    pub fn controller(&self) -> &ControllerRef {
        &self.controller
    }

    pub fn middleware(&self) -> &[MiddlewareDescriptor] {
        &self.middleware
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn var_regexes(&self) -> &HashMap<String, String> {
        &self.var_regexes
    }

    /// Constraint registered for a variable, if any.
    pub fn var_regex(&self, name: &str) -> Option<&str> {
        self.var_regexes.get(name).map(String::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn set_raw_path(&mut self, raw_path: String) {
        self.raw_path = raw_path;
    }

    pub(crate) fn set_raw_host(&mut self, raw_host: String) {
        self.raw_host = raw_host;
    }

    pub(crate) fn set_secure(&mut self, secure: bool) {
        self.secure = secure;
    }

    pub(crate) fn set_var_regexes(&mut self, var_regexes: HashMap<String, String>) {
        self.var_regexes = var_regexes;
    }

    pub(crate) fn set_middleware(&mut self, middleware: Vec<MiddlewareDescriptor>) {
        self.middleware = middleware;
    }

    pub(crate) fn controller_mut(&mut self) -> &mut ControllerRef {
        &mut self.controller
    }
}
