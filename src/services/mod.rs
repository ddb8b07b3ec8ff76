// Service exports
pub mod postgres;
pub mod session;

pub use postgres::Database;
pub use session::{SessionScope, Sessions};
