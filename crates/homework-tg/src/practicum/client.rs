use super::{Config, HomeworkApi, PracticumError};
use crate::error::{err, err_ctx};
use crate::prelude::*;
use crate::{http, Result};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;

pub(crate) struct Client {
    http: http::Client,
    endpoint: url::Url,
    token: String,
}

impl Client {
    pub(crate) fn new(cfg: &Config, http: http::Client) -> Self {
        Self {
            http,
            endpoint: cfg.endpoint.clone(),
            token: cfg.token.clone(),
        }
    }
}

#[async_trait]
impl HomeworkApi for Client {
    async fn get_homework_statuses(&self, from_date: Option<i64>) -> Result<serde_json::Value> {
        let from_date = from_date.unwrap_or_else(|| chrono::Utc::now().timestamp());

        let endpoint = &self.endpoint;

        let response = self
            .http
            .get(endpoint.clone())
            .header(AUTHORIZATION, format!("OAuth {}", self.token))
            .query(&[("from_date", from_date)])
            .send()
            .await
            .map_err(err_ctx!(PracticumError::Request {
                endpoint: endpoint.clone()
            }))?;

        let status = response.status();

        if status != StatusCode::OK {
            return Err(err!(PracticumError::NonOkStatus {
                endpoint: endpoint.clone(),
                status,
            }));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(err_ctx!(PracticumError::Request {
                endpoint: endpoint.clone()
            }))?;

        serde_json::from_slice(&bytes).map_err(|err| {
            match std::str::from_utf8(&bytes) {
                Ok(response_body) => warn!(%response_body, "Bad JSON response"),
                Err(utf8_decode_err) => warn!(
                    response_body = ?bytes,
                    ?utf8_decode_err,
                    "Bad JSON response"
                ),
            };
            err!(PracticumError::Decode { source: err })
        })
    }
}
