//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! routing, dispatch, http, config produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint
//! ```
//!
//! # Design Decisions
//! - Structured fields, never interpolated messages
//! - Request ID flows from the HTTP layer into every log line
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
