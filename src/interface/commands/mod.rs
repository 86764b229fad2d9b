//! # Command Handlers
//!
//! Contains specific handler functions for each supported command (`message`, `help`).
//! These handlers are invoked by the Router.

pub mod help;
pub mod message;
