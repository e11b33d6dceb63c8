// Postboard - blog platform core: groups, posts, comments, follows

// Privacy rules gating the mutating operations
pub mod ent_framework;

// Entities stored by the blog
pub mod entities;

// Storage, caching, identity and presentation components
pub mod infrastructure;

// Form binding and validation
pub mod forms;

// Pagination and feeds
pub mod services;

// Request handlers and the HTTP surface
pub mod handlers;
pub mod blog_interface;

// Common utilities
pub mod app_state;
pub mod config;
pub mod error;
pub mod data_seeder;

// Re-exports for convenience
pub use error::{AppError, AppResult};
