//! Page responses.
//!
//! Handlers describe a page as a template name plus a JSON context. The
//! session middleware finishes the response: it attaches the current user
//! and any pending flash messages, then emits an HTML shell that embeds the
//! context for the front-end template layer.

use std::path::Path;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::auth::{FlashMessage, SessionContext};

/// A page waiting to be rendered by the response middleware.
#[derive(Debug, Clone)]
pub struct Page {
    pub template: String,
    pub status: StatusCode,
    pub context: Map<String, Value>,
}

/// Flash messages a response wants delivered on the next page.
#[derive(Debug, Clone, Default)]
pub struct OutgoingFlash(pub Vec<FlashMessage>);

impl Page {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            status: StatusCode::OK,
            context: Map::new(),
        }
    }

    pub fn not_found() -> Self {
        Self::new("404.html").status(StatusCode::NOT_FOUND)
    }

    pub fn server_error() -> Self {
        Self::new("500.html").status(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or_else(|e| {
            tracing::error!(key, error = %e, "page context value failed to serialize");
            Value::Null
        });
        self.context.insert(key.to_string(), value);
        self
    }

    /// Final HTML for this page.
    pub fn render(&self, session: Option<&SessionContext>, flashes: &[FlashMessage]) -> String {
        let mut context = self.context.clone();
        context.insert("template".into(), json!(self.template));
        context.insert("session".into(), json!(session));
        context.insert("flashes".into(), json!(flashes));

        // `<` only occurs inside JSON strings, where the escape is equivalent.
        let embedded = Value::Object(context).to_string().replace('<', "\\u003c");
        let template = escape_attr(&self.template);

        format!(
            "<!DOCTYPE html>\n<html lang=\"ar\" dir=\"rtl\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>{template}</title>\n</head>\n<body data-template=\"{template}\">\n\
             <script type=\"application/json\" id=\"page-context\">{embedded}</script>\n\
             </body>\n</html>\n"
        )
    }
}

impl IntoResponse for Page {
    fn into_response(self) -> Response {
        let mut response = self.status.into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// Redirect that carries one flash message to the next page.
pub fn redirect_with_flash(to: &str, flash: FlashMessage) -> Response {
    let mut response = Redirect::to(to).into_response();
    response.extensions_mut().insert(OutgoingFlash(vec![flash]));
    response
}

/// Template for a tenant page: the tenant's own override when present on
/// disk, otherwise the shared default. Checked on every call.
pub fn tenant_template(templates_dir: &Path, tenant_slug: &str, page: &str) -> String {
    let custom = templates_dir.join("tenant").join(tenant_slug).join(page);
    if crate::store::tenants::is_path_segment(tenant_slug) && custom.is_file() {
        format!("tenant/{}/{}", tenant_slug, page)
    } else {
        format!("tenant/{}", page)
    }
}

fn escape_attr(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
