use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/accounts", get(handlers::get_accounts))
        .route("/api/campaigns", get(handlers::get_campaigns))
        .route("/api/adsets", get(handlers::get_ad_sets))
        .route("/api/summary", get(handlers::get_summary))
        .route("/api/series", get(handlers::get_series))
        .route("/api/demographics", get(handlers::get_demographics))
        .route("/api/placements", get(handlers::get_placements))
        .route("/api/placements/export", get(handlers::export_placements))
        .route("/api/devices", get(handlers::get_devices))
        .route("/api/actions", get(handlers::get_actions))
        .route(
            "/api/session",
            get(handlers::get_session).put(handlers::put_session),
        )
        .with_state(state)
}
