//! # Dining Gateway Core
//!
//! Core data structures and types for the Dining Gateway platform.
//!
//! This crate provides the fundamental building blocks shared by the
//! recommendation engine and its storage adapters: domain models, the
//! error taxonomy, validation helpers, configuration loading, and the
//! PostgreSQL connection pool.
//!
//! ## Modules
//!
//! - `types`: core enums (interaction kinds, spice levels, dietary tags, confidence)
//! - `models`: domain models for menu items and interactions
//! - `error`: error types and handling
//! - `validation`: write-boundary validation functions
//! - `config`: configuration loading and validation
//! - `database`: shared PostgreSQL connection pool

pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use config::{load_dotenv, ConfigLoader, DatabaseConfig, ServiceConfig};
pub use database::{DatabasePool, PoolStats};
pub use error::DiningGatewayError;
pub use models::{Interaction, ItemStats, MenuItem, NewInteraction};
pub use types::{Confidence, DietaryTag, InteractionKind, SpiceLevel};

/// Result type alias for Dining Gateway operations
pub type Result<T> = std::result::Result<T, DiningGatewayError>;
