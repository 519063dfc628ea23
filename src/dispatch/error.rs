//! Dispatch error types.

use thiserror::Error;

/// The resolver could not produce an instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("nothing is bound to \"{0}\"")]
    Unbound(String),

    #[error("failed to build \"{name}\": {reason}")]
    Failed { name: String, reason: String },

    /// A binding exists but holds a different type.
    #[error("\"{name}\" does not resolve to {expected}")]
    TypeMismatch { name: String, expected: &'static str },
}

/// Failures while running a matched route.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("dependency resolution failed: {0}")]
    DependencyResolution(#[from] ResolutionError),

    /// No path variable, default or binding supplies a parameter.
    #[error("no value for parameter \"{parameter}\" of {controller}")]
    MissingParameter { controller: String, parameter: String },

    #[error("middleware {name} failed: {message}")]
    Middleware { name: String, message: String },

    #[error("{class} has no method \"{method}\"")]
    UnknownControllerMethod { class: String, method: String },

    #[error("controller failed: {0}")]
    Controller(String),
}

impl DispatchError {
    pub fn middleware(name: impl Into<String>, message: impl Into<String>) -> Self {
        DispatchError::Middleware {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn controller(message: impl Into<String>) -> Self {
        DispatchError::Controller(message.into())
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::DependencyResolution(_) => "dependency_resolution",
            DispatchError::MissingParameter { .. } => "missing_parameter",
            DispatchError::Middleware { .. } => "middleware",
            DispatchError::UnknownControllerMethod { .. } => "unknown_method",
            DispatchError::Controller(_) => "controller",
        }
    }
}
