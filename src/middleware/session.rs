use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use chrono::Duration;

use crate::auth::session::{cookie_value, FLASH_COOKIE, SESSION_COOKIE};
use crate::auth::{FlashMessage, SessionContext, TokenKind};
use crate::state::AppState;
use crate::views::{OutgoingFlash, Page};

/// Session resolved for this request; `None` when nobody is signed in.
#[derive(Clone, Debug, Default)]
pub struct CurrentSession(pub Option<SessionContext>);

const FLASH_TTL_MINUTES: i64 = 10;

/// Builds the request-scoped session context from the signed cookie and
/// finishes page responses (flash delivery and HTML rendering).
pub async fn session_context_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let headers = request.headers();
    let session = cookie_value(headers, SESSION_COOKIE)
        .and_then(|token| state.keys.verify_session(token));
    let incoming: Vec<FlashMessage> = cookie_value(headers, FLASH_COOKIE)
        .and_then(|token| state.keys.open(TokenKind::Flash, token))
        .unwrap_or_default();

    request
        .extensions_mut()
        .insert(CurrentSession(session.clone()));

    let mut response = next.run(request).await;

    if let Some(page) = response.extensions_mut().remove::<Page>() {
        let html = page.render(session.as_ref(), &incoming);
        let (mut parts, _) = response.into_parts();
        parts.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        parts.headers.remove(header::CONTENT_LENGTH);
        response = Response::from_parts(parts, html.into());

        if !incoming.is_empty() {
            response
                .headers_mut()
                .append(header::SET_COOKIE, state.keys.expired_cookie(FLASH_COOKIE));
        }
    }

    if let Some(OutgoingFlash(flashes)) = response.extensions_mut().remove::<OutgoingFlash>() {
        match state
            .keys
            .sign(TokenKind::Flash, &flashes, Duration::minutes(FLASH_TTL_MINUTES))
        {
            Ok(token) => {
                let cookie = state.keys.cookie(FLASH_COOKIE, &token);
                response.headers_mut().append(header::SET_COOKIE, cookie);
            }
            Err(e) => tracing::error!(error = %e, "failed to sign flash message"),
        }
    }

    response
}
