pub mod manager;
pub mod models;
pub mod mysql;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use mysql::MySqlStore;
pub use store::Store;
