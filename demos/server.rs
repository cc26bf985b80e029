//! Minimal hyper server with request-scoped databases
//!
//! ```text
//! cargo run --example server -- databases.toml
//! curl 'http://127.0.0.1:8000/?db=analytics'
//! ```

use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server, StatusCode};
use rustf_databases::prelude::*;
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;

/// Decoded value of the `db` query parameter, if present
fn requested_db(query: Option<&str>) -> Option<String> {
    let query = query?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "db")
        .map(|(_, value)| value.into_owned())
}

async fn handle(req: Request<Body>) -> std::result::Result<Response<Body>, Infallible> {
    let name = requested_db(req.uri().query());

    let (status, body) = match req.get_db(name.as_deref()) {
        Ok(Some(database)) => (
            StatusCode::OK,
            json!({ "database": database.name(), "models": database.model_names() }),
        ),
        Ok(None) => (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({ "error": "no database registered" }),
        ),
        Err(e @ Error::DatabaseNotFound(_)) => {
            (StatusCode::NOT_FOUND, json!({ "error": e.to_string() }))
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": e.to_string() }),
        ),
    };

    let response = Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap_or_else(|_| Response::new(Body::empty()));
    Ok(response)
}

#[tokio::main]
async fn main() -> rustf_databases::Result<()> {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "databases.toml".to_string());
    let plugin = DatabasesPlugin::from_settings(DatabasesSettings::from_file(&path)?).await?;

    let addr: SocketAddr = ([127, 0, 0, 1], 8000).into();
    log::info!(
        "Serving {} database(s) on http://{}",
        plugin.registry().len(),
        addr
    );

    let make_svc = make_service_fn(move |_conn| {
        let plugin = plugin.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |mut req: Request<Body>| {
                plugin.decorate(&mut req);
                handle(req)
            }))
        }
    });

    Server::bind(&addr)
        .serve(make_svc)
        .await
        .map_err(|e| Error::internal(format!("Server error: {}", e)))
}
