pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;
pub mod store;
pub mod views;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::handlers::{admin, api, auth as signin, public, tenant};
use crate::middleware::{require_login, require_tenant_access, session_context_middleware};
pub use crate::state::AppState;

/// Build the full application router.
///
/// Static segments take priority over `:tenant_slug`, so platform paths such
/// as `/about` or `/admin` can never be claimed by a tenant.
pub fn app(state: AppState) -> Router {
    let favicon = state.config.storage.static_dir.join("images").join("favicon.svg");
    let static_dir = state.config.storage.static_dir.clone();

    Router::new()
        .merge(public_routes())
        .merge(admin_routes())
        .merge(tenant_routes())
        .merge(api_routes())
        .route_service("/favicon.ico", ServeFile::new(favicon))
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(public::not_found)
        .layer(from_fn_with_state(state.clone(), session_context_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        )
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::platform_home))
        .route("/about", get(public::platform_about))
        .route("/services", get(public::platform_services))
        .route("/contact", get(public::platform_contact))
        .route("/access-denied", get(public::access_denied))
        .route("/health", get(public::health))
        .route("/login", get(signin::login_page).post(signin::password_login))
        .route("/login/password", post(signin::password_login))
        .route("/auth/google", get(signin::google_login))
        .route("/auth/google/callback", get(signin::google_callback))
        .route("/logout", get(signin::logout))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin::admin_dashboard))
        .route("/clients", get(admin::platform_clients))
        .route("/admin/users/add", post(admin::admin_add_user))
        .route("/admin/users/edit", post(admin::admin_edit_user))
        .route("/admin/users/toggle/:user_id", post(admin::admin_toggle_user))
        .route("/admin/users/delete/:user_id", post(admin::admin_delete_user))
        .route_layer(from_fn(require_login))
}

fn tenant_routes() -> Router<AppState> {
    // Layers run outermost-last: login is checked before tenant access.
    let guarded = Router::new()
        .route("/:tenant_slug/", get(tenant::tenant_home))
        .route("/:tenant_slug/projects", get(tenant::tenant_projects))
        .route("/:tenant_slug/project/:project_slug", get(tenant::tenant_project_detail))
        .route("/:tenant_slug/reports", get(tenant::tenant_reports))
        .route("/:tenant_slug/report/:project_slug", get(tenant::tenant_project_report))
        .route("/:tenant_slug/about", get(tenant::tenant_about))
        .route_layer(from_fn(require_tenant_access))
        .route_layer(from_fn(require_login));

    Router::new()
        .route("/:tenant_slug", get(tenant::tenant_root))
        .route("/:tenant_slug/login", get(signin::tenant_login))
        .merge(guarded)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/platform", get(api::api_platform))
        .route("/api/tenants", get(api::api_tenants))
        .route("/api/:tenant_slug/projects", get(api::api_tenant_projects))
        .route("/api/:tenant_slug/project/:project_slug", get(api::api_tenant_project))
        .layer(CorsLayer::permissive())
}
