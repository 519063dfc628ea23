//! Route matching and dispatch for HTTP applications.

pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::AppConfig;
pub use dispatch::{Container, DependencyResolver, RouteDispatcher};
pub use http::{HttpServer, Request, Response};
pub use lifecycle::Shutdown;
pub use routing::{GroupOptions, RouteOptions, Router, RoutingError};
