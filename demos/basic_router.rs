//! Registering routes in code and routing a few requests.
//!
//! Run with `cargo run --example basic_router`.

use std::sync::Arc;

use rdev_router::dispatch::{Arguments, Container, Controller, DispatchError, Parameter};
use rdev_router::routing::{ControllerRef, GroupOptions, RouteOptions};
use rdev_router::{Request, Response, Router, RoutingError};

struct Articles;

impl Controller for Articles {
    fn parameters(&self, method: &str) -> Option<Vec<Parameter>> {
        match method {
            "show" => Some(vec![Parameter::scalar("id"), Parameter::scalar("format").with_default("html")]),
            _ => None,
        }
    }

    fn call(&self, _method: &str, arguments: Arguments, _request: &Request) -> Result<Response, DispatchError> {
        Ok(Response::text(format!(
            "article {} as {}",
            arguments.value("id").unwrap_or("?"),
            arguments.value("format").unwrap_or("?"),
        )))
    }
}

fn main() -> Result<(), RoutingError> {
    let container = Container::new();
    container.bind_controller_instance("Blog::Articles", Arc::new(Articles));

    let mut router = Router::new(Arc::new(container));
    router.get(
        "/",
        ControllerRef::closure(|_| Ok(Response::text("welcome"))),
        RouteOptions::new().name("home"),
    )?;
    router.group(
        GroupOptions::new().path("/blog").controller_namespace("Blog"),
        |router| {
            router.get(
                "/articles/{id}",
                "Articles@show",
                RouteOptions::new().var("id", r"\d+").name("article"),
            )?;
            Ok(())
        },
    )?;

    for path in ["/", "/blog/articles/42", "/blog/articles/latest"] {
        match router.route(Request::get(path)) {
            Ok(response) => println!("{} -> {} {}", path, response.status(), response.body()),
            Err(e) => println!("{} -> {} ({})", path, e.status_code(), e),
        }
    }

    if let Ok(url) = router.url_generator().path("article", &[("id", "7")]) {
        println!("article 7 lives at {}", url);
    }
    Ok(())
}
