//! # Message Command
//!
//! Handles `message`: the user picks one of the room's feeds, sees its current
//! message template, and either replaces it, resets it to the default, or
//! leaves with the exit keyword.

use anyhow::Result;
use async_trait::async_trait;

use crate::application::prompt::{
    CancelReason, Candidate, Context, OnSelect, Outcome, PromptStep, SelectorStep, SelectorText,
    Series, SeriesError, SeriesOptions, Step, StepError,
};
use crate::domain::config::AppConfig;
use crate::domain::traits::{
    ChatError, ChatProvider, FeedSource, FormatStore, ProfileStore, ReplySource,
};
use crate::domain::types::{Feed, Format, Profile, Setting};
use crate::strings::Translator;
use crate::strings::messages::{
    code_block, escape_code, has_subscriptions_placeholder, message_recorded_log,
    message_reset_log,
};
use crate::strings::translator::LocaleTranslator;

/// Reply that drops the custom template (case-insensitive).
pub const RESET_KEYWORD: &str = "reset";
/// Reply that stores an intentionally empty template.
pub const EMPTY_LITERAL: &str = "{empty}";

pub const FEED_KEY: &str = "feed";
pub const FORMAT_KEY: &str = "format";
pub const PROFILE_KEY: &str = "profile";
pub const LOCALE_KEY: &str = "locale";
pub const SETTING_KEY: &str = "setting";

impl Candidate for Feed {
    fn label(&self) -> String {
        self.title.clone().unwrap_or_else(|| self.url.clone())
    }

    fn key(&self) -> String {
        self.url.clone()
    }
}

/// Everything the command reads besides the conversation itself.
pub struct MessageCommand<'a, S> {
    pub config: &'a AppConfig,
    pub store: &'a S,
    pub translator: &'a Translator,
}

/// Looks up the picked feed's current format for the message prompt.
struct FormatLookup<'a, S> {
    store: &'a S,
}

#[async_trait]
impl<S: FormatStore> OnSelect<Feed> for FormatLookup<'_, S> {
    async fn on_select(&self, feed: &Feed, ctx: Context) -> Result<Context, StepError> {
        let format = self
            .store
            .format(&feed.id)
            .await
            .map_err(anyhow::Error::from)?;
        Ok(ctx.with(FORMAT_KEY, &format)?)
    }
}

/// Validates the reply to the message prompt.
///
/// `reset` yields [`Setting::Clear`]; [`EMPTY_LITERAL`] is only accepted when
/// the feed's format has an embed to show instead. Any other reply is kept
/// as the template verbatim.
pub fn message_input(input: &str, ctx: &Context, no_empty: &str) -> Result<Context, StepError> {
    let keyword = input.trim();
    if keyword.eq_ignore_ascii_case(RESET_KEYWORD) {
        return Ok(ctx.with(SETTING_KEY, &Setting::Clear)?);
    }
    if keyword == EMPTY_LITERAL {
        let format: Option<Format> = ctx.get(FORMAT_KEY)?;
        if !format.is_some_and(|f| f.has_embeds()) {
            return Err(StepError::Validation(no_empty.to_string()));
        }
    }
    Ok(ctx.with(SETTING_KEY, &Setting::Text(input.to_string()))?)
}

/// Runs the command and reports failures back to the room.
///
/// Errors are logged with the room they happened in. They are sent back as
/// plain text unless the bot is not allowed to post there.
pub async fn handle_message<S, C, R>(command: &MessageCommand<'_, S>, chat: &C, replies: &mut R)
where
    S: ProfileStore + FeedSource + FormatStore,
    C: ChatProvider,
    R: ReplySource,
{
    let Err(err) = run(command, chat, replies).await else {
        return;
    };

    tracing::warn!(room = %chat.room_id(), "message command failed: {:#}", err);
    if is_permission_denied(&err) {
        return;
    }
    if let Err(send_err) = chat.send_message(&err.to_string()).await {
        tracing::warn!(room = %chat.room_id(), "Failed to report command error: {}", send_err);
    }
}

pub fn is_permission_denied(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<ChatError>(),
            Some(ChatError::PermissionDenied(_))
        )
    })
}

async fn run<S, C, R>(command: &MessageCommand<'_, S>, chat: &C, replies: &mut R) -> Result<()>
where
    S: ProfileStore + FeedSource + FormatStore,
    C: ChatProvider,
    R: ReplySource,
{
    let MessageCommand {
        config,
        store,
        translator,
    } = *command;
    let guild = chat.room_id();

    let profile = store.profile(&guild).await?;
    let locale = resolve_locale(config, translator, profile.as_ref());
    let prefix = resolve_prefix(config, profile.as_ref());
    let t = translator.for_locale(&locale);
    let exit = config.prompts.exit_keyword.as_str();

    let feeds = store.feeds(&guild).await?;
    let selector = SelectorStep::new(
        feeds,
        FEED_KEY,
        SelectorText {
            title: t.t("structs.FeedSelector.prompt", &[("exit", exit)]),
            no_match: t.t("structs.FeedSelector.invalidOption", &[("exit", exit)]),
        },
        FormatLookup { store },
    );

    let no_empty = t.t("commands.message.noEmpty", &[("exit", exit)]);
    let prompt = PromptStep::new(
        |ctx: &Context| render_prompt(ctx, &t, config, &prefix),
        move |input: &str, ctx: &Context| message_input(input, ctx, &no_empty),
    );

    let initial = Context::new()
        .with(LOCALE_KEY, &locale)?
        .with(PROFILE_KEY, &profile)?;
    let steps: Vec<Box<dyn Step + '_>> = vec![Box::new(selector), Box::new(prompt)];
    let series = Series::new(steps, initial, SeriesOptions::from(&config.prompts));

    let outcome = series.run(chat, &mut *replies).await;
    // Later messages are commands again, even while the result is stored.
    replies.close();

    let context = match outcome {
        Ok(Outcome::Complete(context)) => context,
        Ok(Outcome::Cancelled(CancelReason::TimedOut)) => {
            tracing::info!(room = %guild, "message menu timed out");
            return Ok(());
        }
        Ok(Outcome::Cancelled(CancelReason::Exit)) => {
            tracing::debug!(room = %guild, "message menu closed by user");
            return Ok(());
        }
        Err(SeriesError::EmptyCandidateSet) => {
            chat.send_message(&t.t("structs.FeedSelector.noFeeds", &[]))
                .await?;
            return Ok(());
        }
        Err(SeriesError::Chat(err)) => return Err(err.into()),
        Err(err) => return Err(err.into()),
    };

    let feed: Feed = context.require(FEED_KEY)?;
    let format: Option<Format> = context.get(FORMAT_KEY)?;
    match context.require::<Setting>(SETTING_KEY)? {
        Setting::Clear => reset_message(command, chat, &t, &feed, format).await,
        Setting::Text(text) => set_message(command, chat, &t, &prefix, &feed, format, text).await,
    }
}

async fn reset_message<S, C>(
    command: &MessageCommand<'_, S>,
    chat: &C,
    t: &LocaleTranslator<'_>,
    feed: &Feed,
    format: Option<Format>,
) -> Result<()>
where
    S: FormatStore,
    C: ChatProvider,
{
    if let Some(mut format) = format {
        format.text = None;
        if format.has_embeds() {
            command.store.save(&format).await?;
        } else {
            command.store.delete(&format).await?;
        }
    }
    tracing::info!(room = %chat.room_id(), "{}", message_reset_log(&feed.url));

    let reply = format!(
        "{}\n{}",
        t.t("commands.message.resetSuccess", &[("link", &feed.url)]),
        code_block(&command.config.feeds.default_message)
    );
    chat.send_message(&reply).await?;
    Ok(())
}

async fn set_message<S, C>(
    command: &MessageCommand<'_, S>,
    chat: &C,
    t: &LocaleTranslator<'_>,
    prefix: &str,
    feed: &Feed,
    format: Option<Format>,
    text: String,
) -> Result<()>
where
    S: FormatStore,
    C: ChatProvider,
{
    let record = match format {
        Some(mut format) => {
            format.text = Some(text.clone());
            format
        }
        None => Format::new(feed.id.clone(), Some(text.clone())),
    };
    command.store.save(&record).await?;
    tracing::info!(room = %chat.room_id(), "{}", message_recorded_log(&feed.url));

    let mut reply = format!(
        "{}\n{}\n{} {}",
        t.t("commands.message.setSuccess", &[("link", &feed.url)]),
        code_block(&escape_code(&text)),
        t.t("commands.message.reminder", &[("prefix", prefix)]),
        t.t("generics.backupReminder", &[("prefix", prefix)]),
    );
    if !has_subscriptions_placeholder(&text) {
        reply.push(' ');
        reply.push_str(&t.t(
            "commands.message.noSubscriptionsPlaceholder",
            &[("prefix", prefix)],
        ));
    }
    chat.send_message(&reply).await?;
    Ok(())
}

fn render_prompt(
    ctx: &Context,
    t: &LocaleTranslator<'_>,
    config: &AppConfig,
    prefix: &str,
) -> Result<String, StepError> {
    let feed: Feed = ctx.require(FEED_KEY)?;
    let format: Option<Format> = ctx.get(FORMAT_KEY)?;

    let current = match format.as_ref().and_then(|f| f.text.as_deref()) {
        Some(text) => code_block(&escape_code(text)),
        None => format!(
            "{}\n{}",
            code_block(&t.t("commands.message.noSetMessage", &[])),
            code_block(&config.feeds.default_message)
        ),
    };

    Ok(t.t(
        "commands.message.prompt",
        &[
            ("prefix", prefix),
            ("currentMsg", &current),
            ("link", &feed.url),
            ("exit", &config.prompts.exit_keyword),
        ],
    ))
}

/// Profile locale when it is one we have tables for, otherwise the configured default.
pub fn resolve_locale(config: &AppConfig, translator: &Translator, profile: Option<&Profile>) -> String {
    profile
        .and_then(|p| p.locale.as_deref())
        .filter(|locale| translator.has_locale(locale))
        .unwrap_or(&config.bot.locale)
        .to_string()
}

pub fn resolve_prefix(config: &AppConfig, profile: Option<&Profile>) -> String {
    profile
        .and_then(|p| p.prefix.as_deref())
        .unwrap_or(&config.bot.prefix)
        .to_string()
}
