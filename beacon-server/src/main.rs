use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use beacon_server::backplane::RedisBackplane;
use beacon_server::config::Config;
use beacon_server::signaling::{RelayService, ws_handler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // The process must not accept client connections without a reachable
    // backplane, so this connect failure is fatal.
    let backplane = Arc::new(RedisBackplane::connect(&config.redis_url).await?);

    let instance = config.instance_id;
    let relay = RelayService::new(backplane.clone(), instance);
    tracing::info!(%instance, port = config.port, "beacon relay configured");

    tokio::spawn({
        let relay = relay.clone();
        async move {
            if let Err(e) = backplane.run_subscriber(relay).await {
                tracing::error!(error = %e, "backplane subscriber terminated");
                std::process::exit(1);
            }
        }
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(relay);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
