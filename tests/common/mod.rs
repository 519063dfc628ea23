//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use parking_lot::Mutex;
use rdev_router::dispatch::{
    Arguments, Container, Controller, DispatchError, Middleware, Next, Parameter,
};
use rdev_router::routing::ControllerRef;
use rdev_router::{Request, Response, Router};

/// Closure controller answering with `label`.
pub fn label(label: &'static str) -> ControllerRef {
    ControllerRef::closure(move |_| Ok(Response::text(label)))
}

/// A mailer service resolved by type.
pub struct Mailer {
    pub from: String,
}

/// `Users` controller: `show(id)`, `list(page = 1)`, `notify(mailer, id)`.
#[derive(Default)]
pub struct UsersController {
    pub calls: AtomicUsize,
}

impl Controller for UsersController {
    fn parameters(&self, method: &str) -> Option<Vec<Parameter>> {
        match method {
            "show" => Some(vec![Parameter::scalar("id")]),
            "list" => Some(vec![Parameter::scalar("page").with_default("1")]),
            "notify" => Some(vec![Parameter::object("mailer", "Mailer"), Parameter::scalar("id")]),
            _ => None,
        }
    }

    fn call(&self, method: &str, arguments: Arguments, _request: &Request) -> Result<Response, DispatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match method {
            "show" => Ok(Response::text(format!("user {}", arguments.value("id").unwrap_or("?")))),
            "list" => Ok(Response::text(format!("page {}", arguments.value("page").unwrap_or("?")))),
            "notify" => {
                let mailer = arguments
                    .service::<Mailer>("mailer")
                    .ok_or_else(|| DispatchError::Controller("mailer missing".into()))?;
                Ok(Response::text(format!(
                    "{} notified {}",
                    mailer.from,
                    arguments.value("id").unwrap_or("?")
                )))
            }
            other => Err(DispatchError::Controller(format!("unexpected {}", other))),
        }
    }
}

/// Middleware appending its name to a shared log before continuing.
pub fn recording(log: Arc<Mutex<Vec<String>>>, name: &'static str) -> Arc<dyn Middleware> {
    Arc::new(move |request: Request, next: Next<'_>| {
        log.lock().push(name.to_string());
        next.run(request)
    })
}

/// Middleware requiring an `x-role` header equal to its `role` parameter.
pub fn bind_role_guard(container: &Container) {
    container.bind_middleware("Role", |_, parameters| {
        let role = parameters.get("role").unwrap_or("admin").to_string();
        let guard = move |request: Request, next: Next<'_>| {
            if request.header("x-role") == Some(role.as_str()) {
                next.run(request)
            } else {
                Ok(Response::new(StatusCode::FORBIDDEN, "forbidden"))
            }
        };
        Ok(Arc::new(guard) as Arc<dyn Middleware>)
    });
}

/// Container with `Users`, `Mailer`, and `Role` bound.
pub fn container() -> (Arc<Container>, Arc<UsersController>) {
    let container = Container::new();
    let users = Arc::new(UsersController::default());
    container.bind_controller_instance("Users", users.clone());
    container.bind_controller_instance("Admin::Users", users.clone());
    container.bind_instance("Mailer", Mailer { from: "noreply".into() });
    bind_role_guard(&container);
    (Arc::new(container), users)
}

pub fn router() -> Router {
    let (container, _) = container();
    Router::new(container)
}
