// src/lib.rs
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;

// Re-export commonly used items
pub use db::DatabasePool;
pub use error::{Error, Result};
pub use handlers::{router, AppState};
pub use models::*;
