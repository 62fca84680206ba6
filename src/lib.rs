// Gallery Hub - content gallery backend

// Infrastructure - storage, object store, auth and request middleware
pub mod infrastructure;

// Typed rows and request payloads
pub mod models;

// Application services
pub mod services;

// HTTP routes
pub mod api;

// Common utilities
pub mod app_state;
pub mod config;
pub mod error;

// Re-exports for convenience
pub use app_state::AppState;
pub use error::{AppError, AppResult};
