//! # Help Command
//!
//! Handles the `help` command.
//! Lists the available commands with the room's active prefix.

use crate::domain::traits::ChatProvider;
use crate::strings::translator::LocaleTranslator;
use anyhow::Result;

pub async fn handle_help(
    chat: &impl ChatProvider,
    t: &LocaleTranslator<'_>,
    prefix: &str,
    exit_keyword: &str,
) -> Result<()> {
    let body = t.t(
        "commands.help.body",
        &[("prefix", prefix), ("exit", exit_keyword)],
    );
    chat.send_message(&body).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strings::Translator;
    use crate::testing::RecordingChat;

    #[tokio::test]
    async fn test_help_uses_prefix() {
        let translator = Translator::embedded().unwrap();
        let chat = RecordingChat::new("!room:x");

        handle_help(&chat, &translator.for_locale("en-US"), "!", "exit")
            .await
            .unwrap();

        let sent = chat.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("`!message`"));
        assert!(sent[0].contains("`!help`"));
        assert!(sent[0].contains("type `exit` to close it"));
    }
}
