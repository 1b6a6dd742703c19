//! The `abacus` library crate.
//!
//! Contains the domain models, authentication flow, status/priority
//! normalization, the task query engine, routing configuration and error
//! handling for the Abacus task management backend. The main binary uses it
//! to construct and run the application.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod normalize;
pub mod query;
pub mod routes;

pub use crate::config::Config;
pub use crate::error::AppError;
