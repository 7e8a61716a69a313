// Request handlers, grouped by the surface they serve.
pub mod admin;
pub mod api;
pub mod auth;
pub mod public;
pub mod tenant;
