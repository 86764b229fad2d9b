use std::time::Duration;
use tokio::time::Instant;

use super::{Context, ContextError, Step, StepError};
use crate::domain::config::PromptsConfig;
use crate::domain::traits::{ChatError, ChatProvider, ReplySource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The user typed the exit keyword.
    Exit,
    /// No acceptable reply arrived before the step's deadline.
    TimedOut,
}

/// Terminal value of a [`Series`].
#[derive(Debug)]
pub enum Outcome {
    Complete(Context),
    Cancelled(CancelReason),
}

#[derive(Debug, thiserror::Error)]
pub enum SeriesError {
    /// Raised by a step before any reply was awaited.
    #[error("there is nothing to select")]
    EmptyCandidateSet,
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Step(anyhow::Error),
}

impl From<StepError> for SeriesError {
    fn from(err: StepError) -> Self {
        match err {
            StepError::EmptyCandidateSet => SeriesError::EmptyCandidateSet,
            StepError::Context(err) => SeriesError::Context(err),
            StepError::Failed(err) => SeriesError::Step(err),
            StepError::Validation(msg) => SeriesError::Step(anyhow::anyhow!(msg)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeriesOptions {
    /// Wall-clock budget of one step, retries included.
    pub step_timeout: Duration,
    /// Reply that abandons the whole series (compared case-insensitively).
    pub exit_keyword: String,
}

impl From<&PromptsConfig> for SeriesOptions {
    fn from(config: &PromptsConfig) -> Self {
        Self {
            step_timeout: config.timeout(),
            exit_keyword: config.exit_keyword.clone(),
        }
    }
}

/// Ordered list of steps run against one conversation.
pub struct Series<'a> {
    steps: Vec<Box<dyn Step + 'a>>,
    initial: Context,
    options: SeriesOptions,
}

impl<'a> Series<'a> {
    pub fn new(steps: Vec<Box<dyn Step + 'a>>, initial: Context, options: SeriesOptions) -> Self {
        Self {
            steps,
            initial,
            options,
        }
    }

    /// Runs every step in order. Only one reply is awaited at a time.
    pub async fn run<C, R>(self, chat: &C, replies: &mut R) -> Result<Outcome, SeriesError>
    where
        C: ChatProvider + ?Sized,
        R: ReplySource + ?Sized,
    {
        let mut context = self.initial;

        for (index, step) in self.steps.iter().enumerate() {
            let question = step.prepare(&context).await?;
            chat.send_message(&question).await?;

            let deadline = Instant::now() + self.options.step_timeout;
            loop {
                let Some(reply) = replies.next_reply(deadline).await? else {
                    tracing::debug!(room = %chat.room_id(), step = index, "Prompt timed out");
                    return Ok(Outcome::Cancelled(CancelReason::TimedOut));
                };

                if reply
                    .content
                    .trim()
                    .eq_ignore_ascii_case(&self.options.exit_keyword)
                {
                    tracing::debug!(
                        room = %chat.room_id(),
                        user = %reply.sender,
                        step = index,
                        "Prompt closed by user"
                    );
                    return Ok(Outcome::Cancelled(CancelReason::Exit));
                }

                match step.respond(&reply, &context).await {
                    Ok(next) => {
                        context = context.merge(&next);
                        break;
                    }
                    Err(StepError::Validation(message)) => {
                        tracing::debug!(
                            room = %chat.room_id(),
                            user = %reply.sender,
                            step = index,
                            "Rejected reply: {}",
                            message
                        );
                        chat.send_message(&message).await?;
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        }

        Ok(Outcome::Complete(context))
    }
}
