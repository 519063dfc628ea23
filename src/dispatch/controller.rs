//! Controllers and their parameters.
//!
//! Controllers describe their method signatures up front through
//! [`Controller::parameters`]; the dispatcher turns those descriptions into a
//! cached [`ParameterPlan`](crate::dispatch::plan::ParameterPlan) instead of
//! inspecting anything per request.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::dispatch::error::{DispatchError, ResolutionError};
use crate::dispatch::resolver::{DependencyResolver, Instance};
use crate::http::{Request, Response};
use crate::routing::CompiledRoute;

/// Inline handler stored in a [`ControllerRef`](crate::routing::ControllerRef).
pub type ClosureController =
    Arc<dyn Fn(&RouteContext<'_>) -> Result<Response, DispatchError> + Send + Sync>;

/// What a closure controller sees of the dispatch.
pub struct RouteContext<'a> {
    request: &'a Request,
    route: &'a CompiledRoute,
    resolver: &'a dyn DependencyResolver,
}

impl<'a> RouteContext<'a> {
    pub(crate) fn new(
        request: &'a Request,
        route: &'a CompiledRoute,
        resolver: &'a dyn DependencyResolver,
    ) -> Self {
        Self {
            request,
            route,
            resolver,
        }
    }

    pub fn request(&self) -> &Request {
        self.request
    }

    pub fn route(&self) -> &CompiledRoute {
        self.route
    }

    /// Bound variable, falling back to the route's default.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.route
            .binding(name)
            .or_else(|| self.route.route().default_value(name))
    }

    /// Resolve a service and downcast it.
    pub fn resolve<T: Any + Send + Sync>(&self, type_name: &str) -> Result<Arc<T>, ResolutionError> {
        self.resolver
            .resolve(type_name)?
            .downcast::<T>()
            .map_err(|_| ResolutionError::TypeMismatch {
                name: type_name.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }
}

/// How a parameter is declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterKind {
    /// Filled from path variables or defaults.
    Scalar,
    /// Filled by the resolver using the named type.
    Object(String),
}

/// One declared controller-method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
    pub default: Option<String>,
}

impl Parameter {
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Scalar,
            default: None,
        }
    }

    pub fn object(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Object(type_name.into()),
            default: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// A resolved parameter value.
#[derive(Clone)]
pub enum Argument {
    Value(String),
    Service(Instance),
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Argument::Service(_) => f.write_str("Service"),
        }
    }
}

/// Arguments for one controller call, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    entries: Vec<(String, Argument)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, argument: Argument) {
        self.entries.push((name.into(), argument));
    }

    pub fn get(&self, name: &str) -> Option<&Argument> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, argument)| argument)
    }

    /// Scalar argument by name.
    pub fn value(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Argument::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// Injected argument by name, downcast to `T`.
    pub fn service<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        match self.get(name) {
            Some(Argument::Service(instance)) => instance.clone().downcast::<T>().ok(),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Argument)> {
        self.entries.iter().map(|(name, argument)| (name.as_str(), argument))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A controller resolved by class name.
pub trait Controller: Send + Sync {
    /// Declared parameters of `method`, or `None` if there is no such method.
    fn parameters(&self, method: &str) -> Option<Vec<Parameter>>;

    /// Invoke `method`.
    fn call(&self, method: &str, arguments: Arguments, request: &Request) -> Result<Response, DispatchError>;
}
