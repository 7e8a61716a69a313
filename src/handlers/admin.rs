// Admin dashboard, client list and user management.
//
// Routed behind `require_login`; each handler checks the admin role itself
// before touching data. Mutations rewrite users.json in full.
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};

use crate::auth::flash::messages;
use crate::auth::{FlashMessage, SessionContext};
use crate::error::PageResult;
use crate::middleware::deny_unless_admin;
use crate::state::AppState;
use crate::store::users::{AddUserOutcome, NewUser, UserEdit};
use crate::store::{Role, User};
use crate::views::{redirect_with_flash, Page};

const DASHBOARD_PATH: &str = "/admin";

/// Raw urlencoded pairs; `tenants` may repeat.
#[derive(Debug, Default)]
pub struct FormFields(Vec<(String, String)>);

impl FormFields {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }

    /// First value for `key`, trimmed; empty when absent.
    pub fn get(&self, key: &str) -> &str {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.trim())
            .unwrap_or("")
    }

    pub fn optional(&self, key: &str) -> Option<String> {
        Some(self.get(key))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn all(&self, key: &str) -> Vec<String> {
        self.0
            .iter()
            .filter(|(k, v)| k == key && !v.trim().is_empty())
            .map(|(_, v)| v.trim().to_string())
            .collect()
    }
}

/// Users as shown on the dashboard; stored passwords stay server-side.
fn without_passwords(users: Vec<User>) -> Vec<User> {
    users
        .into_iter()
        .map(|mut user| {
            user.password = None;
            user
        })
        .collect()
}

/// GET /admin
pub async fn admin_dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> PageResult<Response> {
    if let Some(denied) = deny_unless_admin(&session) {
        return Ok(denied);
    }

    let tenants = state.store.all_tenants().await?;
    let users = without_passwords(state.store.load_users().await?);

    Ok(Page::new("platform/admin.html")
        .with("tenants", &tenants)
        .with("users", &users)
        .into_response())
}

/// GET /clients
pub async fn platform_clients(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> PageResult<Response> {
    if let Some(denied) = deny_unless_admin(&session) {
        return Ok(denied);
    }

    let tenants = state.store.active_tenants().await?;
    Ok(Page::new("platform/clients.html")
        .with("tenants", &tenants)
        .into_response())
}

/// POST /admin/users/add
pub async fn admin_add_user(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> PageResult<Response> {
    if let Some(denied) = deny_unless_admin(&session) {
        return Ok(denied);
    }

    let form = FormFields::new(pairs);
    let new_user = NewUser {
        name: form.get("name").to_string(),
        email: form.get("email").to_lowercase(),
        role: Role::from_form(form.get("role")),
        default_tenant: form.optional("default_tenant"),
        tenant_access: form.all("tenants"),
    };

    let flash = match state.store.add_user(new_user).await? {
        AddUserOutcome::Added(user) => FlashMessage::success(messages::user_added(&user.name)),
        AddUserOutcome::MissingFields => FlashMessage::error(messages::NAME_AND_EMAIL_REQUIRED),
        AddUserOutcome::DuplicateEmail => FlashMessage::error(messages::EMAIL_ALREADY_REGISTERED),
    };
    Ok(redirect_with_flash(DASHBOARD_PATH, flash))
}

/// POST /admin/users/edit
pub async fn admin_edit_user(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> PageResult<Response> {
    if let Some(denied) = deny_unless_admin(&session) {
        return Ok(denied);
    }

    let form = FormFields::new(pairs);
    let user_id = form.get("user_id").to_string();
    let edit = UserEdit {
        name: form.get("name").to_string(),
        email: form.get("email").to_lowercase(),
        default_tenant: form.optional("default_tenant"),
        tenant_access: form.all("tenants"),
    };
    let name = edit.name.clone();

    if !state.store.edit_user(&user_id, edit).await? {
        tracing::debug!(%user_id, "edit for unknown user id");
    }
    Ok(redirect_with_flash(
        DASHBOARD_PATH,
        FlashMessage::success(messages::user_edited(&name)),
    ))
}

/// POST /admin/users/toggle/:user_id
pub async fn admin_toggle_user(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(user_id): Path<String>,
) -> PageResult<Response> {
    if let Some(denied) = deny_unless_admin(&session) {
        return Ok(denied);
    }

    Ok(match state.store.toggle_user(&user_id).await? {
        Some(user) => {
            tracing::info!(%user_id, active = user.active, "user toggled");
            redirect_with_flash(
                DASHBOARD_PATH,
                FlashMessage::success(messages::user_toggled(&user.name, user.active)),
            )
        }
        None => Redirect::to(DASHBOARD_PATH).into_response(),
    })
}

/// POST /admin/users/delete/:user_id
pub async fn admin_delete_user(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(user_id): Path<String>,
) -> PageResult<Response> {
    if let Some(denied) = deny_unless_admin(&session) {
        return Ok(denied);
    }

    state.store.delete_user(&user_id).await?;
    tracing::info!(%user_id, "user deleted");
    Ok(redirect_with_flash(
        DASHBOARD_PATH,
        FlashMessage::success(messages::USER_DELETED),
    ))
}
