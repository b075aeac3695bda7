pub mod repo;
pub mod repo_types;

pub use repo::{PgUserRepo, UserRepo};
pub use repo_types::{ProfileChanges, User};
