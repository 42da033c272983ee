pub mod activities;
pub mod connection;
pub mod connections;
pub mod messages;
pub mod migrations;
pub mod missions;
pub mod places;
pub mod users;

pub use connection::{get_db_pool, DatabaseConfig};
