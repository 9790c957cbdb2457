pub mod claims;
pub mod guard;

pub use claims::{peek_claims, token_expired, Claims};
pub use guard::{evaluate, Access, AuthSnapshot, Guard, Rendered, LOGIN_ENTRY};
