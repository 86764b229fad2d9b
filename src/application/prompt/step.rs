use async_trait::async_trait;

use super::{Context, Step, StepError};
use crate::domain::types::Reply;

/// A free-form question whose answer is checked by a pure validator.
///
/// The validator sees the reply exactly as it was sent.
pub struct PromptStep<R, V> {
    render: R,
    validate: V,
}

impl<R, V> PromptStep<R, V>
where
    R: Fn(&Context) -> Result<String, StepError> + Send + Sync,
    V: Fn(&str, &Context) -> Result<Context, StepError> + Send + Sync,
{
    pub fn new(render: R, validate: V) -> Self {
        Self { render, validate }
    }
}

#[async_trait]
impl<R, V> Step for PromptStep<R, V>
where
    R: Fn(&Context) -> Result<String, StepError> + Send + Sync,
    V: Fn(&str, &Context) -> Result<Context, StepError> + Send + Sync,
{
    async fn prepare(&self, ctx: &Context) -> Result<String, StepError> {
        (self.render)(ctx)
    }

    async fn respond(&self, reply: &Reply, ctx: &Context) -> Result<Context, StepError> {
        (self.validate)(&reply.content, ctx)
    }
}
