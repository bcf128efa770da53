use std::net::SocketAddr;

use invisibuilder::{init_store, make_router, run_app};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "invisibuilder=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(3001);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let router = make_router();

    let store = match init_store().await {
        Ok(store) => store,
        Err(error) => {
            tracing::error!("could not initialize content backend: {error:#}");
            std::process::exit(1);
        }
    };

    tracing::info!("Server started on {addr}");
    match run_app(router, store, addr).await {
        Ok(_) => (),
        Err(error) => tracing::error!("Error: {error}"),
    }
}
