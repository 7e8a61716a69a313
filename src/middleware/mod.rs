pub mod guards;
pub mod session;

pub use guards::{deny_unless_admin, require_login, require_tenant_access};
pub use session::{session_context_middleware, CurrentSession};
