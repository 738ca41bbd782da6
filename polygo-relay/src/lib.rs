use axum::Router;
use axum::routing::get;

pub mod config;
pub mod error;
pub mod routes;
pub mod ws;

pub use config::RelayConfig;

#[derive(Clone)]
pub struct AppState {
    pub registry: ws::registry::SessionRegistry,
}

pub fn build_router(config: &RelayConfig) -> (Router, AppState) {
    let state = AppState {
        registry: ws::registry::SessionRegistry::new(config.max_peers),
    };

    let app = Router::new()
        .route("/ws/{session}", get(ws::handler::ws_upgrade))
        .route("/up", get(routes::health::health_check))
        .with_state(state.clone());

    (app, state)
}
