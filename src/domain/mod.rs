//! # Domain Layer
//!
//! Core definitions, types, and traits that define the business domain of the application.
//! Feeds, their message formats and the collaborator interfaces the bot talks to.

pub mod config;
pub mod traits;
pub mod types;
