//! # Command Router
//!
//! Routes incoming messages to the appropriate command handler (in `interface/commands`).
//! Messages from a user with an open dialog are handed to that dialog; everything
//! else is parsed as `<prefix><command> [args]`.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::application::state::{BotState, ConversationKey};
use crate::domain::config::AppConfig;
use crate::domain::traits::{ChatProvider, FeedSource, FormatStore, ProfileStore};
use crate::domain::types::Reply;
use crate::interface::commands;
use crate::interface::commands::message::{MessageCommand, resolve_locale, resolve_prefix};
use crate::strings::Translator;

/// What the router did with a message.
#[derive(Debug)]
pub enum Dispatch {
    /// Not a command and no dialog was waiting for it.
    Ignored,
    /// Delivered to the sender's open dialog.
    Forwarded,
    /// A command that completed inline.
    Handled,
    /// A dialog was started in the background.
    Dialog(JoinHandle<()>),
}

pub struct CommandRouter<S> {
    config: Arc<AppConfig>,
    store: Arc<S>,
    translator: Arc<Translator>,
    state: Arc<Mutex<BotState>>,
}

impl<S> Clone for CommandRouter<S> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            store: self.store.clone(),
            translator: self.translator.clone(),
            state: self.state.clone(),
        }
    }
}

impl<S> CommandRouter<S>
where
    S: ProfileStore + FeedSource + FormatStore + 'static,
{
    pub fn new(
        config: Arc<AppConfig>,
        store: Arc<S>,
        translator: Arc<Translator>,
        state: Arc<Mutex<BotState>>,
    ) -> Self {
        Self {
            config,
            store,
            translator,
            state,
        }
    }

    pub async fn route<C>(&self, chat: &C, message: &str, sender: &str) -> Result<Dispatch>
    where
        C: ChatProvider + Clone + 'static,
    {
        let key = ConversationKey::new(chat.room_id(), sender);

        // 1. Open dialogs take every message of their user.
        let inbox = self.state.lock().await.inbox_for(&key);
        if let Some(tx) = inbox {
            if tx.send(Reply::new(sender, message)).await.is_ok() {
                return Ok(Dispatch::Forwarded);
            }
            // The dialog ended between the lookup and the send.
            self.state.lock().await.release(&key);
        }

        // 2. Commands
        let profile = self.store.profile(&key.room).await?;
        let prefix = resolve_prefix(&self.config, profile.as_ref());
        let Some(command_line) = message.trim().strip_prefix(prefix.as_str()) else {
            return Ok(Dispatch::Ignored);
        };
        let (cmd, args) = match command_line.split_once(char::is_whitespace) {
            Some((cmd, args)) => (cmd, args.trim()),
            None => (command_line, ""),
        };
        if cmd.is_empty() {
            return Ok(Dispatch::Ignored);
        }
        tracing::info!(
            "Router dispatching cmd='{}' args='{}' sender='{}'",
            cmd,
            args,
            sender
        );

        let locale = resolve_locale(&self.config, &self.translator, profile.as_ref());
        let t = self.translator.for_locale(&locale);

        match cmd.to_lowercase().as_str() {
            "message" => Ok(self.start_message_dialog(chat.clone(), key).await),
            "help" => {
                commands::help::handle_help(chat, &t, &prefix, &self.config.prompts.exit_keyword)
                    .await?;
                Ok(Dispatch::Handled)
            }
            _ => {
                chat.send_message(&t.t("generics.unknownCommand", &[("prefix", &prefix)]))
                    .await?;
                Ok(Dispatch::Handled)
            }
        }
    }

    async fn start_message_dialog<C>(&self, chat: C, key: ConversationKey) -> Dispatch
    where
        C: ChatProvider + Clone + 'static,
    {
        let Some(mut inbox) = self.state.lock().await.open(key.clone()) else {
            return Dispatch::Forwarded;
        };

        let router = self.clone();
        let handle = tokio::spawn(async move {
            let command = MessageCommand {
                config: &router.config,
                store: router.store.as_ref(),
                translator: &router.translator,
            };
            commands::message::handle_message(&command, &chat, &mut inbox).await;
            drop(inbox);
            router.state.lock().await.release(&key);
        });
        Dispatch::Dialog(handle)
    }
}
