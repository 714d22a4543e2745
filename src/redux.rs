/// Client for the BBC Redux JSON API.
///
/// Every request is an authenticated GET. A non-success status is surfaced as
/// `AppError::Request` and never retried; callers treat it as fatal.
use std::time::Duration;

use anyhow::Context;
use serde::de::DeserializeOwned;

use crate::{
    config::AppConfig,
    error::{AppError, Result},
    models::{ProgrammeDetails, SearchMode, SearchResponse, SearchResult},
};

/// Maximum number of results requested from a single search.
const SEARCH_LIMIT: u32 = 256;

#[derive(Debug, Clone)]
pub struct ReduxClient {
    http: reqwest::Client,
    api_base: String,
    username: String,
    password: String,
}

impl ReduxClient {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("redux-dl/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            http,
            api_base: config.api_base.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// The underlying transport, shared with the downloader for connection reuse.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn search_url(&self, mode: &SearchMode) -> String {
        let field = match mode {
            SearchMode::ShowTitle(_) => "pname",
            SearchMode::FullText(_) => "q",
        };
        format!(
            "{}/search.json?limit={SEARCH_LIMIT}&sort=date&{field}={}",
            self.api_base,
            encode_query(mode.query())
        )
    }

    pub fn details_url(&self, diskref: &str) -> String {
        format!(
            "{}/programme/{}.json",
            self.api_base,
            urlencoding::encode(diskref)
        )
    }

    /// Run a search. Results come back newest first.
    pub async fn search(&self, mode: &SearchMode) -> Result<Vec<SearchResult>> {
        let url = self.search_url(mode);
        tracing::info!("Searching {url}");
        let response: SearchResponse = self.fetch_json(&url).await?;
        tracing::debug!("Search returned {} result(s)", response.results.len());
        Ok(response.results)
    }

    pub async fn programme_details(&self, diskref: &str) -> Result<ProgrammeDetails> {
        let url = self.details_url(diskref);
        self.fetch_json(&url).await
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self
            .http
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            if !status.is_client_error() {
                tracing::warn!("Unexpected status {status} from {url}");
            }
            return Err(AppError::Request {
                url: url.to_string(),
                status,
            });
        }

        let body = resp.bytes().await?;
        tracing::debug!("{url}: {}", String::from_utf8_lossy(&body));
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Percent-encode a query, turning each whitespace character into `+`.
fn encode_query(query: &str) -> String {
    query
        .split(char::is_whitespace)
        .map(|word| urlencoding::encode(word).into_owned())
        .collect::<Vec<_>>()
        .join("+")
}
