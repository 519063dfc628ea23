//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout, trace)
//!     → request.rs (method, host, path, scheme)
//!     → routing::Router (match + dispatch, on the blocking pool)
//!     → response.rs (status, headers, body)
//!     → Send to client
//! ```

pub mod controllers;
pub mod request;
pub mod response;
pub mod server;

pub use controllers::{default_container, EchoController, HttpErrorController};
pub use request::{Request, X_FORWARDED_PROTO, X_REQUEST_ID};
pub use response::Response;
pub use server::{activate, apply_reloads, HttpServer, SharedRouter};
