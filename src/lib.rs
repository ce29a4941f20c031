//! Medical lab report analysis service
//!
//! Accepts a PDF with laboratory results, extracts its text and asks a
//! large language model for a physician-style interpretation.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use handlers::{create_router, AppState};
