pub mod flash;
pub mod identity;
pub mod session;

pub use flash::{FlashCategory, FlashMessage};
pub use identity::{GoogleProvider, IdentityAssertion, IdentityError, IdentityProvider};
pub use session::{SessionContext, SessionError, SessionKeys, TokenKind};
