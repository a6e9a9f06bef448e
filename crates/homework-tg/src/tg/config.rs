use crate::config::ConfigError;
use crate::error::err;
use crate::prelude::*;
use crate::Result;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use teloxide::types::{ChatId, Recipient};

/// Config as it is read from the environment
#[derive(Deserialize)]
pub(crate) struct RawConfig {
    pub(crate) token: Option<String>,
    pub(crate) chat_id: Option<String>,
}

#[derive(Clone)]
pub(crate) struct Config {
    pub(crate) token: String,

    /// Chat where all the notifications are sent
    pub(crate) chat: ChatDestination,
}

impl RawConfig {
    pub(crate) fn try_into_config(self) -> Result<Config> {
        let token = self
            .token
            .fatal_ctx(|| "TELEGRAM_TOKEN must be checked before building the config")?;

        let chat = self
            .chat_id
            .fatal_ctx(|| "TELEGRAM_CHAT_ID must be checked before building the config")?
            .parse()?;

        Ok(Config { token, chat })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ChatDestination {
    Id(ChatId),

    /// Public channel username including the leading `@`
    Channel(String),
}

impl FromStr for ChatDestination {
    type Err = crate::Error;

    fn from_str(value: &str) -> Result<Self> {
        let value = value.trim();

        if let Ok(id) = value.parse::<i64>() {
            return Ok(Self::Id(ChatId(id)));
        }

        match value.strip_prefix('@') {
            Some(name) if !name.is_empty() && !name.contains(char::is_whitespace) => {
                Ok(Self::Channel(value.to_owned()))
            }
            _ => Err(err!(ConfigError::InvalidChatId {
                value: value.to_owned()
            })),
        }
    }
}

impl fmt::Display for ChatDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id.0),
            Self::Channel(username) => f.write_str(username),
        }
    }
}

impl From<ChatDestination> for Recipient {
    fn from(chat: ChatDestination) -> Self {
        match chat {
            ChatDestination::Id(id) => Recipient::Id(id),
            ChatDestination::Channel(username) => Recipient::ChannelUsername(username),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chat_destination() {
        assert_eq!(
            "123456".parse::<ChatDestination>().unwrap(),
            ChatDestination::Id(ChatId(123456))
        );
        assert_eq!(
            " -1001234567890 ".parse::<ChatDestination>().unwrap(),
            ChatDestination::Id(ChatId(-1001234567890))
        );
        assert_eq!(
            "@homework".parse::<ChatDestination>().unwrap(),
            ChatDestination::Channel("@homework".to_owned())
        );

        for invalid in ["homework", "@", "@home work", "12ab"] {
            assert!(
                invalid.parse::<ChatDestination>().is_err(),
                "{invalid} must be rejected"
            );
        }
    }
}
