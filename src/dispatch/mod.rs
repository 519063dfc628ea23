//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! CompiledRoute + Request
//!     → dispatcher.rs (resolve middleware by descriptor)
//!     → middleware.rs (run stages in declaration order)
//!     → controller.rs (closure, or named controller via resolver.rs)
//!     → plan.rs (cached parameter sources → arguments)
//!     → Response, plus the controller that produced it
//! ```
//!
//! # Design Decisions
//! - Controllers declare parameters; nothing is discovered per request
//! - Resolution goes through the `DependencyResolver` trait only
//! - Errors propagate unchanged; nothing is retried

pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod middleware;
pub mod plan;
pub mod resolver;

pub use controller::{Argument, Arguments, ClosureController, Controller, Parameter, ParameterKind, RouteContext};
pub use dispatcher::{Dispatched, MatchedController, RouteDispatcher};
pub use error::{DispatchError, ResolutionError};
pub use middleware::{Middleware, MiddlewareParameters, Next, Pipeline};
pub use plan::{ParameterPlan, ParameterSource};
pub use resolver::{Container, DependencyResolver, Instance};
