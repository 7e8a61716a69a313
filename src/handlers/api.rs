// Read-only JSON API. Open reads: no session is required.
use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{PlatformConfig, Project, ProjectSet};

const TENANT_NOT_FOUND: &str = "العميل غير موجود";
const PROJECT_NOT_FOUND: &str = "المشروع غير موجود";

/// GET /api/platform
pub async fn api_platform(State(state): State<AppState>) -> Result<Json<PlatformConfig>, ApiError> {
    Ok(Json(state.store.platform_config().await?))
}

/// GET /api/tenants - active tenants only
pub async fn api_tenants(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let tenants = state.store.active_tenants().await?;
    Ok(Json(json!({ "tenants": tenants })))
}

/// GET /api/:tenant_slug/projects
pub async fn api_tenant_projects(
    State(state): State<AppState>,
    Path(tenant_slug): Path<String>,
) -> Result<Json<ProjectSet>, ApiError> {
    if state.store.tenant_by_slug(&tenant_slug).await?.is_none() {
        return Err(ApiError::not_found(TENANT_NOT_FOUND));
    }
    Ok(Json(state.store.tenant_projects(&tenant_slug).await?))
}

/// GET /api/:tenant_slug/project/:project_slug
///
/// Resolved against the tenant's project document only; a project file for
/// an unregistered tenant still answers.
pub async fn api_tenant_project(
    State(state): State<AppState>,
    Path((tenant_slug, project_slug)): Path<(String, String)>,
) -> Result<Json<Project>, ApiError> {
    state
        .store
        .project_by_slug(&tenant_slug, &project_slug)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(PROJECT_NOT_FOUND))
}
