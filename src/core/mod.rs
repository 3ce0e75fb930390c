//! Core foundations of the Canvas gateway
//!
//! This module contains the fundamental building blocks of the service:
//! error handling and configuration.

pub mod config;
pub mod error;

// Re-export commonly used items
pub use config::Config;
pub use error::{CanvasError, Error, Result};
