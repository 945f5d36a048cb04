use axum::middleware;
use axum::response::Html;
use axum::Router;
use breakglass::{rescue_gate, RescueConfig, RescueContext};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging first
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "breakglass=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting breakglass v{}", env!("CARGO_PKG_VERSION"));

    let config = RescueConfig::load()?;
    info!("Configuration loaded");

    let ctx = Arc::new(RescueContext::from_config(&config));

    // Mint the secret up front so the operator can bookmark the URL while
    // the site still works.
    match ctx.rescue_url(&config.server.public_url) {
        Ok(url) => info!("Rescue URL (bookmark it now): {url}"),
        Err(e) => warn!(error = %e, "Rescue mode disabled: secret storage unavailable"),
    }

    // Stand-in host application. In production the gate wraps the real
    // router the same way; it only acts when the secret matches.
    let app = Router::new()
        .fallback(host_placeholder)
        .layer(middleware::from_fn_with_state(ctx.clone(), rescue_gate))
        .layer(TraceLayer::new_for_http());

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn host_placeholder() -> Html<&'static str> {
    Html(
        "<!DOCTYPE html><html><body><h1>Host application</h1>\
         <p>This page stands in for the application the rescue layer protects.</p>\
         </body></html>",
    )
}
