pub mod gate;
pub mod jwt;
pub mod password;
pub mod providers;
mod types;

pub use gate::require_privilege;
pub use jwt::TokenIssuer;
pub use types::{Claims, TokenBundle};
