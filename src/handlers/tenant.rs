// Tenant dashboard pages. Routed behind `require_login` and
// `require_tenant_access`, so the session may view `tenant_slug`.
use axum::{
    extract::{Path, State},
    response::Redirect,
};
use serde_json::Value;

use crate::error::{PageError, PageResult};
use crate::state::AppState;
use crate::store::{Project, Tenant};
use crate::views::{tenant_template, Page};

async fn load_tenant(state: &AppState, slug: &str) -> PageResult<Tenant> {
    state
        .store
        .tenant_by_slug(slug)
        .await?
        .ok_or(PageError::NotFound)
}

async fn load_project(state: &AppState, tenant_slug: &str, project_slug: &str) -> PageResult<Project> {
    state
        .store
        .project_by_slug(tenant_slug, project_slug)
        .await?
        .ok_or(PageError::NotFound)
}

fn template(state: &AppState, tenant_slug: &str, page: &str) -> String {
    tenant_template(&state.config.storage.templates_dir, tenant_slug, page)
}

/// GET /:tenant_slug
pub async fn tenant_root(Path(tenant_slug): Path<String>) -> Redirect {
    Redirect::permanent(&format!("/{}/", tenant_slug))
}

/// GET /:tenant_slug/
pub async fn tenant_home(
    State(state): State<AppState>,
    Path(tenant_slug): Path<String>,
) -> PageResult<Page> {
    let tenant = load_tenant(&state, &tenant_slug).await?;
    let data = state.store.tenant_projects(&tenant_slug).await?;
    let config = state.store.tenant_config(&tenant_slug).await?;

    // Without a config file the company profile may live in the projects
    // document.
    let config = if config.is_empty() && data.has_company_profile() {
        serde_json::to_value(&data).map_err(|e| PageError::Internal(e.to_string()))?
    } else {
        Value::Object(config)
    };

    Ok(Page::new(template(&state, &tenant_slug, "index.html"))
        .with("tenant", &tenant)
        .with("config", config)
        .with("projects", &data.projects))
}

/// GET /:tenant_slug/projects
pub async fn tenant_projects(
    State(state): State<AppState>,
    Path(tenant_slug): Path<String>,
) -> PageResult<Page> {
    let tenant = load_tenant(&state, &tenant_slug).await?;
    let data = state.store.tenant_projects(&tenant_slug).await?;

    Ok(Page::new(template(&state, &tenant_slug, "projects.html"))
        .with("tenant", &tenant)
        .with("projects", &data.projects))
}

/// GET /:tenant_slug/project/:project_slug
pub async fn tenant_project_detail(
    State(state): State<AppState>,
    Path((tenant_slug, project_slug)): Path<(String, String)>,
) -> PageResult<Page> {
    let tenant = load_tenant(&state, &tenant_slug).await?;
    let project = load_project(&state, &tenant_slug, &project_slug).await?;

    Ok(Page::new(template(&state, &tenant_slug, "project_detail.html"))
        .with("tenant", &tenant)
        .with("project", &project))
}

/// GET /:tenant_slug/reports
pub async fn tenant_reports(
    State(state): State<AppState>,
    Path(tenant_slug): Path<String>,
) -> PageResult<Page> {
    let tenant = load_tenant(&state, &tenant_slug).await?;
    let data = state.store.tenant_projects(&tenant_slug).await?;

    Ok(Page::new(template(&state, &tenant_slug, "reports.html"))
        .with("tenant", &tenant)
        .with("projects", &data.projects))
}

/// GET /:tenant_slug/report/:project_slug
pub async fn tenant_project_report(
    State(state): State<AppState>,
    Path((tenant_slug, project_slug)): Path<(String, String)>,
) -> PageResult<Page> {
    let tenant = load_tenant(&state, &tenant_slug).await?;
    let project = load_project(&state, &tenant_slug, &project_slug).await?;

    Ok(Page::new(template(&state, &tenant_slug, "project_report.html"))
        .with("tenant", &tenant)
        .with("project", &project))
}

/// GET /:tenant_slug/about
pub async fn tenant_about(
    State(state): State<AppState>,
    Path(tenant_slug): Path<String>,
) -> PageResult<Page> {
    let tenant = load_tenant(&state, &tenant_slug).await?;
    let config = state.store.tenant_config(&tenant_slug).await?;

    Ok(Page::new(template(&state, &tenant_slug, "about.html"))
        .with("tenant", &tenant)
        .with("config", &config))
}
