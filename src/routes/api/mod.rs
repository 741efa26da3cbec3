pub mod admins;
pub mod auth;
pub mod devices;
pub mod environments;
pub mod health;
mod router;
pub mod users;

pub use router::router;
