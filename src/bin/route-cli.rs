use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use axum::http::{Method, Uri};
use clap::{Parser, Subcommand};
use serde_json::json;

use rdev_router::config::{build_router, load_config};
use rdev_router::http::{default_container, Request};
use rdev_router::routing::Router;

#[derive(Parser)]
#[command(name = "route-cli")]
#[command(about = "Inspect the routes declared in a configuration file", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "routes.toml")]
    config: PathBuf,

    /// Print JSON instead of a table.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered routes in match order
    List,
    /// Show which route a request would match
    Match {
        /// HTTP method, e.g. GET
        method: String,
        /// Path or absolute URL, e.g. https://api.example.com/users/7
        url: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = load_config(&cli.config)?;
    let router = build_router(&config, Arc::new(default_container()))?;

    match &cli.command {
        Commands::List => list(&router, cli.json),
        Commands::Match { method, url } => match_request(&router, method, url, cli.json),
    }
}

fn list(router: &Router, as_json: bool) -> Result<ExitCode, Box<dyn std::error::Error>> {
    if as_json {
        let routes: Vec<_> = router
            .collection()
            .iter()
            .map(|route| {
                json!({
                    "id": route.id().0,
                    "name": route.name(),
                    "methods": route.methods().iter().map(Method::as_str).collect::<Vec<_>>(),
                    "host": route.raw_host(),
                    "path": route.raw_path(),
                    "https": route.is_secure(),
                    "controller": route.controller().to_string(),
                    "middleware": route.middleware().iter().map(|m| m.name()).collect::<Vec<_>>(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&routes)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{:<6} {:<24} {:<24} {:<40} {}", "ID", "METHODS", "NAME", "HOST+PATH", "CONTROLLER");
    for route in router.collection().iter() {
        let methods: Vec<&str> = route.methods().iter().map(Method::as_str).collect();
        let scheme = if route.is_secure() { "https://" } else { "" };
        println!(
            "{:<6} {:<24} {:<24} {:<40} {}",
            route.id().to_string(),
            methods.join("|"),
            route.name().unwrap_or("-"),
            format!("{}{}{}", scheme, route.raw_host(), route.raw_path()),
            route.controller(),
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn match_request(
    router: &Router,
    method: &str,
    url: &str,
    as_json: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
    let uri: Uri = url.parse()?;
    let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    let mut request = Request::new(method, path).with_secure(uri.scheme_str() == Some("https"));
    if let Some(host) = uri.host() {
        request = request.with_host(host);
    }

    let Some(compiled) = router.find(&request) else {
        if as_json {
            println!("{}", json!({ "matched": false }));
        } else {
            println!("no route matches {} {}", request.method(), url);
        }
        return Ok(ExitCode::from(2));
    };

    let route = compiled.route();
    if as_json {
        println!(
            "{}",
            json!({
                "matched": true,
                "id": route.id().0,
                "name": route.name(),
                "controller": route.controller().to_string(),
                "bindings": compiled.bindings(),
            })
        );
    } else {
        println!("route      {} {}", route.id(), route.name().unwrap_or(""));
        println!("pattern    {}", route.path_pattern());
        println!("controller {}", route.controller());
        let mut bindings: Vec<_> = compiled.bindings().iter().collect();
        bindings.sort();
        for (name, value) in bindings {
            println!("  {} = {}", name, value);
        }
    }
    Ok(ExitCode::SUCCESS)
}
