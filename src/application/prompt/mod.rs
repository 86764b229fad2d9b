//! # Prompt Pipeline
//!
//! Sequential interactive prompts. A [`Series`] asks each [`Step`] in order,
//! waits for the user's reply, and threads a [`Context`] from one step to the
//! next. A step may reject a reply with [`StepError::Validation`]; the user is
//! told why and asked again without leaving the step.

mod context;
mod selector;
mod series;
mod step;

pub use context::{Context, ContextError};
pub use selector::{Candidate, OnSelect, SelectorStep, SelectorText};
pub use series::{CancelReason, Outcome, Series, SeriesError, SeriesOptions};
pub use step::PromptStep;

use async_trait::async_trait;

use crate::domain::types::Reply;

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// Recoverable. The message is shown to the user and the step is asked again.
    #[error("{0}")]
    Validation(String),
    /// A selector was built over an empty candidate set.
    #[error("there is nothing to select")]
    EmptyCandidateSet,
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// One question/answer exchange of a [`Series`].
#[async_trait]
pub trait Step: Send + Sync {
    /// Builds the question for the current context. Runs before any reply is awaited.
    async fn prepare(&self, ctx: &Context) -> Result<String, StepError>;

    /// Turns one reply into the context handed to the next step.
    async fn respond(&self, reply: &Reply, ctx: &Context) -> Result<Context, StepError>;
}
