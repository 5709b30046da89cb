//! # Kashif Common Library
//!
//! Shared code for the Kashif incident reporting services including:
//! - Error taxonomy (Error enum)
//! - Event types (KashifEvent enum) and EventBus
//! - Configuration loading
//! - Shared domain types (predictions, reports, wizard steps)

pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use error::{Error, Result};
