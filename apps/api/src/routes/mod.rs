pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::applications::handlers as applications;
use crate::prefill::handlers as prefill;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Prefill API (local agent)
        .route(
            "/api/v1/prefill/create-intent",
            post(prefill::handle_create_intent),
        )
        .route(
            "/api/v1/prefill/intent/:intent_id",
            get(prefill::handle_get_intent),
        )
        .route(
            "/api/v1/prefill/report-result",
            post(prefill::handle_report_result),
        )
        .route("/api/v1/prefill/logs/:log_id", get(prefill::handle_get_log))
        // Applications API
        .route(
            "/api/v1/applications",
            get(applications::handle_list_applications),
        )
        .route(
            "/api/v1/applications/create",
            post(applications::handle_create_application),
        )
        .route(
            "/api/v1/applications/:id",
            get(applications::handle_get_application),
        )
        .route(
            "/api/v1/applications/:id/status",
            patch(applications::handle_update_status),
        )
        .with_state(state)
}
