pub mod constants;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod nucleus;
pub mod services;
pub mod state;
pub mod utils;

pub use db::connection::get_db_pool;
pub use error::{CoreError, Result};
pub use handlers::create_router;
pub use state::AppState;
pub use utils::config::Config;

// Re-export common types
pub use sqlx::PgPool;
pub use uuid::Uuid;
pub use chrono::{DateTime, Utc};
