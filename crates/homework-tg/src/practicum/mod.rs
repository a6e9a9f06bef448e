//! Client of the homework review status API and the parsing of its responses.

mod client;
mod model;
mod validate;

use crate::prelude::*;
use crate::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

pub(crate) use client::Client;
pub(crate) use model::*;
pub(crate) use validate::{check_response, current_date, parse_status};

const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";

/// Source of the homework statuses. Abstracted away to be able to drive the
/// polling loop without real network calls.
#[async_trait]
pub(crate) trait HomeworkApi: Send + Sync {
    /// Returns the raw JSON payload of the statuses changed since `from_date`.
    /// If `from_date` is [`None`] the current time is used.
    async fn get_homework_statuses(&self, from_date: Option<i64>) -> Result<serde_json::Value>;
}

/// Config as it is read from the environment
#[derive(Deserialize)]
pub(crate) struct RawConfig {
    pub(crate) token: Option<String>,

    #[serde(default = "default_endpoint")]
    endpoint: url::Url,

    #[serde(default = "default_retry_time_secs")]
    retry_time_secs: u64,

    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

fn default_endpoint() -> url::Url {
    DEFAULT_ENDPOINT
        .parse()
        .expect("BUG: default endpoint must be a valid URL")
}

fn default_retry_time_secs() -> u64 {
    600
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Clone)]
pub(crate) struct Config {
    pub(crate) token: String,
    pub(crate) endpoint: url::Url,

    /// Interval between the polling iterations
    pub(crate) retry_time: Duration,

    /// Timeout of a single HTTP request to the API
    pub(crate) timeout: Duration,
}

impl RawConfig {
    pub(crate) fn try_into_config(self) -> Result<Config> {
        let token = self
            .token
            .fatal_ctx(|| "PRACTICUM_TOKEN must be checked before building the config")?;

        Ok(Config {
            token,
            endpoint: self.endpoint,
            retry_time: Duration::from_secs(self.retry_time_secs),
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}
