//! Thin client for the bank's transaction-history endpoint.
//!
//! This is deliberately not a general bank API client: the monitor needs one
//! request, so one request is all this module knows how to make.

use crate::api::BankApi;
use crate::error::ApiError;
use crate::model::TransactionHistory;
use crate::{Config, Result};
use anyhow::{ensure, Context};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;

/// Date format the history endpoint expects in request bodies.
const FEED_DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryRequest<'a> {
    username: &'a str,
    password: &'a str,
    from_date: String,
    to_date: String,
}

/// Client for the account transaction-history endpoint.
///
/// Credentials travel with every request; the endpoint does not use
/// sessions. Responses that are not JSON (the gateway serves an HTML
/// maintenance page) and 503s map to transient [`ApiError`] kinds.
pub struct BankClient {
    client: reqwest::Client,
    endpoint: String,
    username: String,
    password: String,
    timeout_secs: u64,
}

impl BankClient {
    pub fn new(config: &Config, username: &str, password: &str) -> Result<Self> {
        let base = config.bank_api_url().trim_end_matches('/');
        ensure!(
            !base.is_empty(),
            "bank_api_url is not set, add it to {}",
            config.config_path().display()
        );
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Unable to build the bank HTTP client")?;
        Ok(Self {
            client,
            endpoint: format!("{base}/transaction-history"),
            username: username.to_string(),
            password: password.to_string(),
            timeout_secs: config.request_timeout().as_secs(),
        })
    }
}

#[async_trait]
impl BankApi for BankClient {
    async fn fetch_history(&self, from: NaiveDate, to: NaiveDate) -> Result<TransactionHistory> {
        let body = HistoryRequest {
            username: &self.username,
            password: &self.password,
            from_date: from.format(FEED_DATE_FORMAT).to_string(),
            to_date: to.format(FEED_DATE_FORMAT).to_string(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_send_error(e, self.timeout_secs))?;

        let status = response.status();
        if status.as_u16() == 503 {
            return Err(ApiError::Unavailable { status: 503 }.into());
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
            }
            .into());
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.contains("application/json") {
            return Err(ApiError::BadContentType { content_type }.into());
        }

        response
            .json::<TransactionHistory>()
            .await
            .context("Failed to decode the transaction history response")
    }
}

/// Maps reqwest transport errors onto the typed kinds the retry executor
/// understands; anything unrecognized keeps its original text, which the
/// executor still scans for connection-failure markers.
fn classify_send_error(err: reqwest::Error, timeout_secs: u64) -> anyhow::Error {
    if err.is_timeout() {
        return ApiError::Timeout {
            seconds: timeout_secs,
        }
        .into();
    }
    anyhow::Error::new(err).context("Bank history request failed")
}
