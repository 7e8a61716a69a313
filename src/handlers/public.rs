// Marketing pages, the access-denied view and liveness.
use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::error::PageResult;
use crate::state::AppState;
use crate::views::Page;

async fn platform_page(state: &AppState, template: &str) -> PageResult<Page> {
    let config = state.store.platform_config().await?;
    Ok(Page::new(template).with("platform", &config.platform))
}

/// GET / - public for signed-in and anonymous visitors alike
pub async fn platform_home(State(state): State<AppState>) -> PageResult<Page> {
    platform_page(&state, "platform/index.html").await
}

/// GET /about
pub async fn platform_about(State(state): State<AppState>) -> PageResult<Page> {
    platform_page(&state, "platform/about.html").await
}

/// GET /services
pub async fn platform_services(State(state): State<AppState>) -> PageResult<Page> {
    platform_page(&state, "platform/services.html").await
}

/// GET /contact
pub async fn platform_contact(State(state): State<AppState>) -> PageResult<Page> {
    platform_page(&state, "platform/contact.html").await
}

/// GET /access-denied
pub async fn access_denied() -> Page {
    Page::new("platform/access_denied.html").status(StatusCode::FORBIDDEN)
}

pub async fn not_found() -> Page {
    Page::not_found()
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
