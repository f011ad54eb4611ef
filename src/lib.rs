// src/lib.rs

// --- Declaração dos Módulos ---
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod web;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
pub use web::routes::create_router;
