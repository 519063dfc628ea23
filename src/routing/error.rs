//! Routing error types.

use axum::http::{Method, StatusCode};
use thiserror::Error;

use crate::dispatch::DispatchError;

/// Malformed route declarations. Raised while routes are registered, never
/// while requests are matched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Controller string is not of the form `Class@method`.
    #[error("controller \"{0}\" is not of the form Class@method")]
    InvalidController(String),

    /// A route was declared without any HTTP method.
    #[error("route \"{0}\" declares no HTTP methods")]
    NoMethods(String),

    /// Method outside the router's supported list.
    #[error("method {method} is not supported (route \"{path}\")")]
    UnsupportedMethod { method: Method, path: String },

    /// The same variable appears twice in one template.
    #[error("variable \"{name}\" appears more than once in \"{template}\"")]
    DuplicateVariable { name: String, template: String },

    /// Placeholder names become capture group names.
    #[error("invalid variable name \"{name}\" in \"{template}\"")]
    InvalidVariableName { name: String, template: String },

    #[error("nested placeholder in \"{0}\"")]
    NestedPlaceholder(String),

    #[error("unclosed placeholder in \"{0}\"")]
    UnclosedPlaceholder(String),

    #[error("unexpected '}}' in \"{0}\"")]
    UnexpectedBrace(String),

    /// The generated expression (usually a user constraint) does not compile.
    #[error("invalid constraint in \"{template}\": {reason}")]
    InvalidConstraint { template: String, reason: String },

    /// Two routes registered under one name.
    #[error("a route named \"{0}\" is already registered")]
    DuplicateRouteName(String),
}

/// Errors surfaced by [`Router`](crate::routing::Router).
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error(transparent)]
    Format(#[from] FormatError),

    /// No registered route matches the method and path.
    #[error("no route matches {method} {path}")]
    NotFound { method: Method, path: String },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl RoutingError {
    /// The HTTP status a top-level error boundary should answer with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RoutingError::NotFound { .. } => StatusCode::NOT_FOUND,
            RoutingError::Format(_) | RoutingError::Dispatch(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RoutingError::NotFound { .. })
    }
}
