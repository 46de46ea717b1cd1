pub mod auth;
pub mod games;
pub mod reviews;
pub mod users;

pub use self::users::model::{User, UserRole};
