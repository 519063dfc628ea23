//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (at startup):
//!     Router::get/post/.../any/multiple
//!     → group.rs (apply active group stack)
//!     → parser.rs (templates → anchored expressions + defaults)
//!     → collection.rs (bucket by method, index by name)
//!
//! Incoming Request (method, host, path)
//!     → router.rs (bucket lookup, registration order)
//!     → compiler.rs (evaluate scheme, host and path)
//!     → first match → dispatch subsystem
//!     → no match → NotFound (or the missing route)
//! ```
//!
//! # Design Decisions
//! - Routes parsed at registration, immutable at runtime
//! - Deterministic: same input always matches same route
//! - First match wins (registration order, no specificity ranking)

pub mod collection;
pub mod compiler;
pub mod error;
pub mod group;
pub mod parser;
pub mod route;
pub mod router;
pub mod url_generator;

pub use collection::{RouteCollection, RouteId};
pub use compiler::{CompiledRoute, RouteCompiler};
pub use error::{FormatError, RoutingError};
pub use group::{GroupOptions, GroupSettings};
pub use parser::{ParsedRoute, RouteParser, TemplatePart};
pub use route::{
    ControllerRef, IntoControllerRef, MiddlewareDescriptor, Route, RouteOptions, SUPPORTED_METHODS,
};
pub use router::{GroupScope, Router, MISSING_ROUTE_STATUS_VAR};
pub use url_generator::{UrlError, UrlGenerator};
