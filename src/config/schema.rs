//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router
//! service. All types derive Serde traits for deserialization from config
//! files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::routing::MiddlewareDescriptor;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address, scheme).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Router-wide settings.
    pub routing: RoutingConfig,

    /// Top-level routes, registered before any group.
    pub routes: Vec<RouteConfig>,

    /// Route groups, registered in order after `routes`.
    pub groups: Vec<GroupConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Treat every request as https, e.g. behind a TLS-terminating proxy
    /// that does not send `X-Forwarded-Proto`.
    pub assume_https: bool,

    /// Honor `X-Forwarded-Proto: https` from clients. Enable only when every
    /// connection comes through a proxy that overwrites the header.
    pub trust_forwarded_proto: bool,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            assume_https: false,
            trust_forwarded_proto: false,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (matching plus dispatch) in seconds.
    pub request_secs: u64,

    /// Grace period for in-flight requests on shutdown, in seconds.
    pub shutdown_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            shutdown_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Router-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RoutingConfig {
    /// `Class@method` dispatched when nothing matches. Unset means 404.
    pub missing_route_controller: Option<String>,

    /// Accepted methods. Empty means the standard seven.
    pub methods: Vec<String>,
}

/// One route.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RouteConfig {
    /// Name for reverse routing.
    #[serde(default)]
    pub name: Option<String>,

    /// Methods, or `["ANY"]` for every supported method.
    pub methods: Vec<String>,

    /// Path template.
    pub path: String,

    /// `Class@method`.
    pub controller: String,

    /// Host template.
    #[serde(default)]
    pub host: Option<String>,

    /// Require https.
    #[serde(default)]
    pub https: bool,

    /// Variable constraints (name to regular expression).
    #[serde(default)]
    pub vars: BTreeMap<String, String>,

    #[serde(default)]
    pub middleware: Vec<MiddlewareDescriptor>,
}

/// A group of routes sharing options. Groups nest.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GroupConfig {
    pub path: String,
    pub host: String,
    pub https: Option<bool>,
    pub controller_namespace: String,
    pub vars: BTreeMap<String, String>,
    pub middleware: Vec<MiddlewareDescriptor>,
    pub routes: Vec<RouteConfig>,
    pub groups: Vec<GroupConfig>,
}
