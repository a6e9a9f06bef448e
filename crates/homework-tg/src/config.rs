use crate::error::err;
use crate::{practicum, tg, Result};
use serde::de::DeserializeOwned;
use std::fmt;

/// Name of the env variable and its value, that must be non-empty before
/// the bot may start.
type RequiredValue<'a> = (&'static str, Option<&'a str>);

pub struct Config {
    pub(crate) practicum: practicum::Config,
    pub(crate) tg: tg::Config,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    #[error(
        "Программа принудительно остановлена. \
        Отсутствует обязательная переменная окружения: {name}"
    )]
    MissingToken { name: &'static str },

    #[error("Couldn't load {config} from environment")]
    Env {
        config: &'static str,
        source: envy::Error,
    },

    #[error("Invalid TELEGRAM_CHAT_ID '{value}', expected a numeric id or @channel_username")]
    InvalidChatId { value: String },
}

impl Config {
    pub fn from_env() -> Result<Config> {
        Self::from_vars(std::env::vars())
    }

    pub(crate) fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Result<Config> {
        let vars: Vec<_> = vars.into_iter().collect();

        let practicum: practicum::RawConfig = from_vars("PRACTICUM_", &vars)?;
        let tg: tg::RawConfig = from_vars("TELEGRAM_", &vars)?;

        let required: [RequiredValue<'_>; 3] = [
            ("PRACTICUM_TOKEN", practicum.token.as_deref()),
            ("TELEGRAM_TOKEN", tg.token.as_deref()),
            ("TELEGRAM_CHAT_ID", tg.chat_id.as_deref()),
        ];

        if !check_tokens(required.map(|(_, value)| value)) {
            let name = required
                .iter()
                .find(|(_, value)| !is_present(*value))
                .map(|(name, _)| *name)
                .unwrap_or("<unknown>");

            return Err(err!(ConfigError::MissingToken { name }));
        }

        Ok(Self {
            practicum: practicum.try_into_config()?,
            tg: tg.try_into_config()?,
        })
    }

    pub fn redacted(&self) -> Redacted<'_> {
        Redacted(self)
    }
}

/// Returns `true` only if every one of the required values is present and non-empty.
pub fn check_tokens(values: [Option<&str>; 3]) -> bool {
    values.into_iter().all(is_present)
}

fn is_present(value: Option<&str>) -> bool {
    value.is_some_and(|value| !value.is_empty())
}

pub(crate) fn from_vars<T: DeserializeOwned>(prefix: &str, vars: &[(String, String)]) -> Result<T> {
    envy::prefixed(prefix)
        .from_iter(vars.iter().cloned())
        .map_err(|source| {
            err!(ConfigError::Env {
                config: std::any::type_name::<T>(),
                source,
            })
        })
}

/// [`fmt::Debug`] view of the [`Config`] that doesn't leak the secrets.
pub struct Redacted<'a>(&'a Config);

impl fmt::Debug for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Config { practicum, tg } = self.0;
        f.debug_struct("Config")
            .field("practicum_endpoint", &practicum.endpoint.as_str())
            .field("practicum_token", &mask(&practicum.token))
            .field("retry_time", &practicum.retry_time)
            .field("timeout", &practicum.timeout)
            .field("tg_token", &mask(&tg.token))
            .field("tg_chat", &tg.chat.to_string())
            .finish()
    }
}

fn mask(secret: &str) -> String {
    match secret.get(..3) {
        Some(prefix) if secret.len() > 6 => format!("{prefix}***"),
        _ => "***".to_owned(),
    }
}
