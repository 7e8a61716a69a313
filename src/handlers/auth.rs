// Sign-in, single sign-on and sign-out.
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use chrono::Duration;
use serde::Deserialize;

use crate::auth::flash::messages;
use crate::auth::session::{cookie_value, SESSION_COOKIE, STATE_COOKIE};
use crate::auth::{FlashMessage, IdentityError, IdentityProvider, SessionContext, TokenKind};
use crate::error::{PageError, PageResult};
use crate::middleware::guards::LOGIN_PATH;
use crate::state::AppState;
use crate::store::users::CredentialFailure;
use crate::views::{redirect_with_flash, Page};

const SIGNIN_STATE_TTL_MINUTES: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// GET /login
pub async fn login_page() -> Page {
    Page::new("platform/login.html")
}

/// POST /login, POST /login/password
pub async fn password_login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> PageResult<Response> {
    let email = form.email.trim().to_lowercase();

    match state.store.verify_credentials(&email, &form.password).await? {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "password sign-in");
            establish_session(&state, SessionContext::for_user(&user))
        }
        Err(CredentialFailure::WrongPassword) => {
            tracing::info!(%email, "password sign-in rejected: wrong password");
            Ok(redirect_with_flash(LOGIN_PATH, FlashMessage::error(messages::WRONG_PASSWORD)))
        }
        Err(CredentialFailure::UnknownOrInactive) => {
            tracing::info!(%email, "password sign-in rejected: unknown or inactive");
            Ok(redirect_with_flash(
                LOGIN_PATH,
                FlashMessage::error(messages::EMAIL_NOT_REGISTERED),
            ))
        }
    }
}

/// GET /auth/google - start the provider handshake
pub async fn google_login(State(state): State<AppState>) -> Response {
    let Some(provider) = state.identity.as_deref() else {
        return redirect_with_flash(LOGIN_PATH, FlashMessage::info(messages::SSO_UNAVAILABLE));
    };

    let nonce = uuid::Uuid::new_v4().simple().to_string();
    let signed_state = state.keys.sign(
        TokenKind::SigninState,
        &nonce,
        Duration::minutes(SIGNIN_STATE_TTL_MINUTES),
    );
    let url = provider.authorization_url(&nonce, &state.config.google_callback_url());

    match (signed_state, url) {
        (Ok(token), Ok(url)) => {
            let mut response = Redirect::to(&url).into_response();
            response.headers_mut().append(
                header::SET_COOKIE,
                state
                    .keys
                    .cookie_with_max_age(STATE_COOKIE, &token, Some(SIGNIN_STATE_TTL_MINUTES * 60)),
            );
            response
        }
        (Err(e), _) => {
            tracing::error!(error = %e, "failed to sign sign-in state");
            redirect_with_flash(LOGIN_PATH, FlashMessage::error(messages::SSO_FAILED))
        }
        (_, Err(e)) => {
            tracing::error!(error = %e, "failed to build authorization url");
            redirect_with_flash(LOGIN_PATH, FlashMessage::error(messages::SSO_FAILED))
        }
    }
}

enum SigninOutcome {
    SignedIn(SessionContext),
    NotRegistered,
}

/// GET /auth/google/callback
///
/// Every failure ends on the login page with a flash; nothing here
/// surfaces as a server error and no session is set unless sign-in
/// completes.
pub async fn google_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    let mut response = match state.identity.as_deref() {
        None => redirect_with_flash(LOGIN_PATH, FlashMessage::info(messages::SSO_UNAVAILABLE)),
        Some(provider) => {
            let expected: Option<String> = cookie_value(&headers, STATE_COOKIE)
                .and_then(|token| state.keys.open(TokenKind::SigninState, token));

            match complete_signin(&state, provider, expected, params).await {
                Ok(SigninOutcome::SignedIn(session)) => {
                    tracing::info!(user_id = %session.user_id, "single sign-on");
                    establish_session(&state, session).unwrap_or_else(|e| e.into_response())
                }
                Ok(SigninOutcome::NotRegistered) => {
                    redirect_with_flash(LOGIN_PATH, FlashMessage::error(messages::SSO_NOT_REGISTERED))
                }
                Err(e) => {
                    tracing::warn!(error = %e, "single sign-on failed");
                    redirect_with_flash(LOGIN_PATH, FlashMessage::error(messages::SSO_FAILED))
                }
            }
        }
    };

    response
        .headers_mut()
        .append(header::SET_COOKIE, state.keys.expired_cookie(STATE_COOKIE));
    response
}

async fn complete_signin(
    state: &AppState,
    provider: &dyn IdentityProvider,
    expected_state: Option<String>,
    params: CallbackParams,
) -> anyhow::Result<SigninOutcome> {
    if let Some(error) = params.error {
        return Err(IdentityError::Provider(error).into());
    }

    match (expected_state, params.state) {
        (Some(expected), Some(actual)) if expected == actual => {}
        _ => return Err(IdentityError::StateMismatch.into()),
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| IdentityError::Provider("callback is missing the code".into()))?;

    let assertion = provider
        .exchange(&code, &state.config.google_callback_url())
        .await?;

    let user = match state.store.find_user_by_email(&assertion.email).await? {
        Some(user) if user.active => user,
        _ => {
            tracing::info!(email = %assertion.email, "single sign-on for unregistered or inactive email");
            return Ok(SigninOutcome::NotRegistered);
        }
    };

    let mut session = SessionContext::for_user(&user);
    if user.name.is_empty() && !assertion.name.is_empty() {
        session.user_name = assertion.name;
    }
    session.user_picture = assertion.picture;
    Ok(SigninOutcome::SignedIn(session))
}

/// Set the session cookie and send the user to their landing page.
fn establish_session(state: &AppState, session: SessionContext) -> PageResult<Response> {
    let token = state
        .keys
        .issue_session(&session)
        .map_err(|e| PageError::Internal(e.to_string()))?;

    let mut response = Redirect::to(&session.landing_path()).into_response();
    response
        .headers_mut()
        .append(header::SET_COOKIE, state.keys.cookie(SESSION_COOKIE, &token));
    Ok(response)
}

/// GET /logout
pub async fn logout(State(state): State<AppState>) -> Response {
    let mut response = Redirect::to("/").into_response();
    response
        .headers_mut()
        .append(header::SET_COOKIE, state.keys.expired_cookie(SESSION_COOKIE));
    response
}

/// GET /:tenant_slug/login - tenants share the platform login
pub async fn tenant_login(Path(_tenant_slug): Path<String>) -> Redirect {
    Redirect::to(LOGIN_PATH)
}
