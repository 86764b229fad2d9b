//! # Application Layer
//!
//! Contains the core business logic and orchestration of the bot.
//! This includes the prompt pipeline, command routing and dialog state.

pub mod prompt;
pub mod router;
pub mod state;
