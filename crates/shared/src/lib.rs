//! Shared types, errors, and configuration for Pocketbank.
//!
//! This crate provides common types used across all other crates:
//! - Integer won amounts (no floating point anywhere near a balance)
//! - Typed IDs for type-safe entity references
//! - Account numbers with 4-4-4 rendering
//! - Pagination types for list endpoints
//! - Configuration management
//! - JWT validation for bearer tokens issued by the auth service

pub mod auth;
pub mod config;
pub mod jwt;
pub mod types;

pub use auth::Claims;
pub use config::AppConfig;
pub use jwt::{JwtConfig, JwtError, JwtService};
