//! Built-in controllers.
//!
//! The server binary has no application code of its own, so routes loaded
//! from configuration point at these.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::http::StatusCode;

use crate::dispatch::{Arguments, Container, Controller, DispatchError, Parameter};
use crate::http::{Request, Response};
use crate::routing::MISSING_ROUTE_STATUS_VAR;

pub const ECHO_CONTROLLER: &str = "Echo";
pub const HTTP_ERROR_CONTROLLER: &str = "HttpError";

/// Answers with a JSON description of the request and its arguments.
///
/// Every method name is accepted. Methods registered with [`EchoController::method`]
/// declare scalar parameters, which makes their values part of the output.
#[derive(Debug, Default, Clone)]
pub struct EchoController {
    methods: BTreeMap<String, Vec<Parameter>>,
}

impl EchoController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method<I, S>(mut self, method: impl Into<String>, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods.insert(
            method.into(),
            parameters.into_iter().map(Parameter::scalar).collect(),
        );
        self
    }
}

impl Controller for EchoController {
    fn parameters(&self, method: &str) -> Option<Vec<Parameter>> {
        Some(self.methods.get(method).cloned().unwrap_or_default())
    }

    fn call(&self, method: &str, arguments: Arguments, request: &Request) -> Result<Response, DispatchError> {
        let values: serde_json::Map<String, serde_json::Value> = arguments
            .iter()
            .filter_map(|(name, _)| {
                arguments
                    .value(name)
                    .map(|value| (name.to_string(), serde_json::Value::from(value)))
            })
            .collect();

        Ok(Response::json(&serde_json::json!({
            "action": method,
            "method": request.method().as_str(),
            "host": request.host(),
            "path": request.path(),
            "arguments": values,
        })))
    }
}

/// Renders an error page for the status in its `status_code` parameter.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpErrorController;

impl Controller for HttpErrorController {
    fn parameters(&self, _method: &str) -> Option<Vec<Parameter>> {
        Some(vec![Parameter::scalar(MISSING_ROUTE_STATUS_VAR).with_default("500")])
    }

    fn call(&self, _method: &str, arguments: Arguments, _request: &Request) -> Result<Response, DispatchError> {
        let status = arguments
            .value(MISSING_ROUTE_STATUS_VAR)
            .and_then(|code| code.parse::<u16>().ok())
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let reason = status.canonical_reason().unwrap_or("Error");
        Ok(Response::new(status, format!("{} {}", status.as_u16(), reason)))
    }
}

/// Container with the built-in controllers bound.
pub fn default_container() -> Container {
    let container = Container::new();
    container.bind_controller_instance(ECHO_CONTROLLER, Arc::new(EchoController::new()));
    container.bind_controller_instance(HTTP_ERROR_CONTROLLER, Arc::new(HttpErrorController));
    container
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DependencyResolver;
    use crate::routing::{RouteOptions, Router};

    #[test]
    fn test_echo_reports_declared_arguments() {
        let container = Container::new();
        container.bind_controller_instance(
            ECHO_CONTROLLER,
            Arc::new(EchoController::new().method("show", ["id"])),
        );
        let mut router = Router::new(Arc::new(container));
        router
            .get("/items/{id}", "Echo@show", RouteOptions::new())
            .unwrap();

        let response = router.route(Request::get("/items/42")).unwrap();
        let body: serde_json::Value = serde_json::from_str(response.body()).unwrap();
        assert_eq!(body["action"], "show");
        assert_eq!(body["method"], "GET");
        assert_eq!(body["arguments"]["id"], "42");
    }

    #[test]
    fn test_http_error_uses_missing_route_status() {
        let router = Router::new(Arc::new(default_container()))
            .with_missing_route("HttpError@show")
            .unwrap();

        let response = router.route(Request::get("/nowhere")).unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.body(), "404 Not Found");
    }

    #[test]
    fn test_default_container_binds_builtins() {
        let container = default_container();
        assert!(container.resolve_controller(ECHO_CONTROLLER).is_ok());
        assert!(container.resolve_controller(HTTP_ERROR_CONTROLLER).is_ok());
    }
}
