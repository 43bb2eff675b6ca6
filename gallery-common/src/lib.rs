//! # Gallery Common Library
//!
//! Shared code for the gallery backend:
//! - Configuration loading and root folder resolution
//! - Database schema, entity models and the generic repository
//! - Art/audio link queries
//! - Dominant colour extraction (`palette`)

pub mod config;
pub mod db;
pub mod error;
pub mod palette;

pub use error::{Error, Result};
