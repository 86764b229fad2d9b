//! # Strings Module
//!
//! Centralizes user-facing strings: the localized message tables and the
//! formatting helpers around them.

pub mod messages;
pub mod translator;

pub use translator::Translator;
