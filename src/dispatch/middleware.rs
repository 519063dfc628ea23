//! Middleware pipeline.
//!
//! Middleware runs in declaration order around the controller. Each stage
//! receives the request and a [`Next`] handle; calling `next.run(request)`
//! continues the chain, returning a response without calling it
//! short-circuits everything after it.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::dispatch::error::DispatchError;
use crate::http::{Request, Response};

/// Parameters attached to a middleware reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MiddlewareParameters(BTreeMap<String, String>);

impl MiddlewareParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, String>> for MiddlewareParameters {
    fn from(parameters: BTreeMap<String, String>) -> Self {
        Self(parameters)
    }
}

pub trait Middleware: Send + Sync {
    fn handle(&self, request: Request, next: Next<'_>) -> Result<Response, DispatchError>;
}

/// Blanket impl: any `Fn(Request, Next) -> Result<Response, _>` is a middleware.
impl<F> Middleware for F
where
    F: for<'a> Fn(Request, Next<'a>) -> Result<Response, DispatchError> + Send + Sync,
{
    fn handle(&self, request: Request, next: Next<'_>) -> Result<Response, DispatchError> {
        (self)(request, next)
    }
}

type Terminal<'a> = dyn Fn(Request) -> Result<Response, DispatchError> + 'a;

/// The rest of the chain.
pub struct Next<'a> {
    stages: &'a [(String, Arc<dyn Middleware>)],
    terminal: &'a Terminal<'a>,
}

impl<'a> Next<'a> {
    /// Hand the request to the next stage, or the controller once stages run out.
    pub fn run(self, request: Request) -> Result<Response, DispatchError> {
        match self.stages.split_first() {
            Some(((name, middleware), rest)) => {
                tracing::trace!(middleware = %name, "Running middleware");
                middleware.handle(
                    request,
                    Next {
                        stages: rest,
                        terminal: self.terminal,
                    },
                )
            }
            None => (self.terminal)(request),
        }
    }
}

/// Ordered middleware stages.
#[derive(Default, Clone)]
pub struct Pipeline {
    stages: Vec<(String, Arc<dyn Middleware>)>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pipe(&mut self, name: impl Into<String>, middleware: Arc<dyn Middleware>) {
        self.stages.push((name.into(), middleware));
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run the request through every stage and then `terminal`.
    pub fn send<F>(&self, request: Request, terminal: F) -> Result<Response, DispatchError>
    where
        F: Fn(Request) -> Result<Response, DispatchError>,
    {
        let next = Next {
            stages: &self.stages,
            terminal: &terminal,
        };
        next.run(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use parking_lot::Mutex;

    fn recorder(log: Arc<Mutex<Vec<String>>>, label: &'static str) -> Arc<dyn Middleware> {
        Arc::new(move |request: Request, next: Next<'_>| {
            log.lock().push(format!("{} in", label));
            let response = next.run(request);
            log.lock().push(format!("{} out", label));
            response
        })
    }

    #[test]
    fn test_stages_run_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = Pipeline::new();
        pipeline.pipe("first", recorder(log.clone(), "first"));
        pipeline.pipe("second", recorder(log.clone(), "second"));

        let inner = log.clone();
        let response = pipeline
            .send(Request::get("/"), move |_| {
                inner.lock().push("controller".into());
                Ok(Response::text("done"))
            })
            .unwrap();

        assert_eq!(response.body(), "done");
        assert_eq!(
            *log.lock(),
            vec!["first in", "second in", "controller", "second out", "first out"]
        );
    }

    #[test]
    fn test_short_circuit() {
        let mut pipeline = Pipeline::new();
        pipeline.pipe(
            "deny",
            Arc::new(|_: Request, _: Next<'_>| Ok(Response::new(StatusCode::FORBIDDEN, "denied"))),
        );
        let response = pipeline
            .send(Request::get("/"), |_| panic!("controller must not run"))
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_stage_can_rewrite_request() {
        let mut pipeline = Pipeline::new();
        pipeline.pipe(
            "tag",
            Arc::new(|request: Request, next: Next<'_>| {
                next.run(request.with_header("x-tag", "tagged"))
            }),
        );
        let response = pipeline
            .send(Request::get("/"), |request| {
                Ok(Response::text(request.header("x-tag").unwrap_or("missing")))
            })
            .unwrap();
        assert_eq!(response.body(), "tagged");
    }
}
