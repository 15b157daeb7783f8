use std::time::Duration;

use log::info;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::USER_AGENT;

use crate::error::{Error, Result};

pub const DEFAULT_USER_AGENT: &str = concat!("discussion/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub http_client: Option<HttpClient>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            http_client: None,
        }
    }
}

/// Blocking page fetcher shared by the source adapters.
pub struct Fetcher {
    http: HttpClient,
    user_agent: String,
}

impl Fetcher {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.user_agent.trim().is_empty() {
            return Err(Error::FetchFailed("user agent required".into()));
        }

        let http = match config.http_client {
            Some(client) => client,
            None => HttpClient::builder()
                .timeout(config.timeout)
                .build()
                .map_err(|err| Error::FetchFailed(format!("build http client: {err}")))?,
        };

        Ok(Fetcher {
            http,
            user_agent: config.user_agent,
        })
    }

    pub fn get_text(&self, url: &str) -> Result<String> {
        info!("fetching {url}");
        let response = self
            .http
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .map_err(|err| Error::FetchFailed(format!("{url}: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::FetchFailed(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .map_err(|err| Error::FetchFailed(format!("{url}: read body: {err}")))
    }
}
