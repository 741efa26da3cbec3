#[allow(unused_imports)]
pub mod prelude {
    pub use super::admin::Entity as Admin;
    pub use super::device::Entity as Device;
    pub use super::environment::Entity as Environment;
    pub use super::user::Entity as User;
    pub use super::user_environment::Entity as UserEnvironment;
}

pub mod admin;
pub mod device;
pub mod environment;
pub mod user;
pub mod user_environment;
