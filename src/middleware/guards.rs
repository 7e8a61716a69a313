use std::collections::HashMap;

use axum::{
    extract::{Path, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::auth::flash::messages;
use crate::auth::{FlashMessage, SessionContext};
use crate::views::redirect_with_flash;

use super::session::CurrentSession;

pub const LOGIN_PATH: &str = "/login";
pub const ACCESS_DENIED_PATH: &str = "/access-denied";

/// Requires a signed-in user. Does not look at role or tenant. On success
/// the `SessionContext` is available to handlers as an extension.
pub async fn require_login(mut request: Request, next: Next) -> Response {
    let session = request
        .extensions()
        .get::<CurrentSession>()
        .and_then(|current| current.0.clone());

    let Some(session) = session else {
        tracing::debug!(path = %request.uri().path(), "no session; redirecting to login");
        return Redirect::to(LOGIN_PATH).into_response();
    };

    request.extensions_mut().insert(session);
    next.run(request).await
}

/// Requires the route's `tenant_slug` to be in the session's access list.
/// Must be layered inside `require_login`.
pub async fn require_tenant_access(
    Path(params): Path<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(session) = request.extensions().get::<SessionContext>() else {
        return Redirect::to(LOGIN_PATH).into_response();
    };

    if let Some(tenant_slug) = params.get("tenant_slug") {
        if !session.can_access(tenant_slug) {
            tracing::debug!(
                user_id = %session.user_id,
                tenant = %tenant_slug,
                "tenant access denied"
            );
            let destination = match &session.default_tenant {
                Some(default_tenant) => format!("/{}/", default_tenant),
                None => ACCESS_DENIED_PATH.to_string(),
            };
            return redirect_with_flash(&destination, FlashMessage::error(messages::NO_TENANT_ACCESS));
        }
    }

    next.run(request).await
}

/// Redirect used by admin-only handlers when the session is not an admin.
pub fn deny_unless_admin(session: &SessionContext) -> Option<Response> {
    if session.is_admin() {
        None
    } else {
        Some(Redirect::to(ACCESS_DENIED_PATH).into_response())
    }
}
