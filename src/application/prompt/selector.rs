use async_trait::async_trait;
use serde::Serialize;

use super::{Context, Step, StepError};
use crate::domain::types::Reply;

/// Something a user can pick from a numbered list.
pub trait Candidate: Serialize + Send + Sync {
    /// Text shown in the list.
    fn label(&self) -> String;

    /// Stable identity, also accepted as an answer.
    fn key(&self) -> String;
}

/// Hook run after a candidate was picked, adding fields the next step needs.
#[async_trait]
pub trait OnSelect<C>: Send + Sync {
    async fn on_select(&self, selected: &C, ctx: Context) -> Result<Context, StepError>;
}

/// Localized texts of a selector.
#[derive(Debug, Clone)]
pub struct SelectorText {
    /// Shown above the list.
    pub title: String,
    /// Sent when an answer matches nothing.
    pub no_match: String,
}

/// Lets the user pick one entry out of a fixed candidate set.
pub struct SelectorStep<C, H> {
    candidates: Vec<C>,
    key: String,
    text: SelectorText,
    hook: H,
}

impl<C: Candidate, H: OnSelect<C>> SelectorStep<C, H> {
    /// The picked candidate is stored in the context under `key`.
    pub fn new(candidates: Vec<C>, key: impl Into<String>, text: SelectorText, hook: H) -> Self {
        Self {
            candidates,
            key: key.into(),
            text,
            hook,
        }
    }

    pub fn render(&self) -> String {
        let mut output = self.text.title.clone();
        output.push('\n');
        for (index, candidate) in self.candidates.iter().enumerate() {
            let label = candidate.label();
            let key = candidate.key();
            output.push_str(&format!("\n{}. **{}**", index + 1, label));
            if key != label {
                output.push_str(&format!(" (`{key}`)"));
            }
        }
        output
    }

    /// Matches an answer by 1-based index, exact key, exact label, then a
    /// unique label substring (all label comparisons ignore case).
    pub fn resolve(&self, input: &str) -> Option<&C> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        if let Ok(index) = input.parse::<usize>() {
            if (1..=self.candidates.len()).contains(&index) {
                return self.candidates.get(index - 1);
            }
        }

        if let Some(found) = self.candidates.iter().find(|c| c.key() == input) {
            return Some(found);
        }

        let needle = input.to_lowercase();
        if let Some(found) = self
            .candidates
            .iter()
            .find(|c| c.label().to_lowercase() == needle)
        {
            return Some(found);
        }

        let mut partial = self
            .candidates
            .iter()
            .filter(|c| c.label().to_lowercase().contains(&needle));
        match (partial.next(), partial.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }
}

#[async_trait]
impl<C: Candidate, H: OnSelect<C>> Step for SelectorStep<C, H> {
    async fn prepare(&self, _ctx: &Context) -> Result<String, StepError> {
        if self.candidates.is_empty() {
            return Err(StepError::EmptyCandidateSet);
        }
        Ok(self.render())
    }

    async fn respond(&self, reply: &Reply, ctx: &Context) -> Result<Context, StepError> {
        let Some(selected) = self.resolve(&reply.content) else {
            return Err(StepError::Validation(self.text.no_match.clone()));
        };
        let ctx = ctx.with(&self.key, selected)?;
        self.hook.on_select(selected, ctx).await
    }
}
