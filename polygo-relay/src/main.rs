use axum::extract::Request;
use polygo_relay::RelayConfig;
use tower::Layer as _;
use tower_http::normalize_path::NormalizePathLayer;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "polygo_relay=debug".into()),
        )
        .init();

    let config = RelayConfig::from_env();
    let (app, _state) = polygo_relay::build_router(&config);

    let addr = config.addr();
    tracing::info!("Starting polygo-relay on {addr} (max {} peers per session)", config.max_peers);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    let app = NormalizePathLayer::trim_trailing_slash().layer(app);
    axum::serve(
        listener,
        axum::ServiceExt::<Request>::into_make_service(app),
    )
    .await
    .expect("Server error");
}
