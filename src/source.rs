use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use url::Url;

use crate::error::{ConfigurationError, RetrievalError};

pub const DEFAULT_STATUS_BASE_URL: &str =
    "https://raw.githubusercontent.com/Door43/d43-en/master/uwadmin";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CLIENT_USER_AGENT: &str = "obs-import/0.1";

pub fn http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .context("build http client")
}

/// Parse a location given on the command line.
pub fn parse_location(location: &str) -> Result<Url, ConfigurationError> {
    Url::parse(location).map_err(|err| ConfigurationError::InvalidLocation {
        location: location.to_owned(),
        reason: err.to_string(),
    })
}

/// Fetch a text document over http(s) or from a `file://` location.
pub async fn fetch_text(client: &reqwest::Client, url: &Url) -> Result<String, RetrievalError> {
    match url.scheme() {
        "file" => {
            let path = url
                .to_file_path()
                .map_err(|()| RetrievalError::new(url.as_str(), "not a local file path"))?;
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|err| RetrievalError::new(url.as_str(), err))
        }
        "http" | "https" => {
            let response = client
                .get(url.clone())
                .header(USER_AGENT, CLIENT_USER_AGENT)
                .send()
                .await
                .map_err(|err| RetrievalError::new(url.as_str(), err))?;

            let status = response.status();
            if !status.is_success() {
                return Err(RetrievalError::new(url.as_str(), format!("HTTP {status}")));
            }
            response
                .text()
                .await
                .map_err(|err| RetrievalError::new(url.as_str(), err))
        }
        scheme => Err(RetrievalError::new(
            url.as_str(),
            format!("unsupported scheme: {scheme}"),
        )),
    }
}

/// Location of the status document for `lang_code` under `base`.
pub fn status_url(base: &str, lang_code: &str) -> Result<Url, ConfigurationError> {
    let base = base.trim_end_matches('/');
    parse_location(&format!("{base}/{lang_code}/obs/status.txt"))
}

#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Raw DokuWiki text of one document, e.g. `01.txt` or `front-matter.txt`.
    async fn fetch(&self, identifier: &str) -> Result<String, RetrievalError>;
}

/// Story sources laid out as `<repo>/master/obs/<identifier>`.
#[derive(Debug, Clone)]
pub struct RepoSource {
    client: reqwest::Client,
    base: Url,
}

impl RepoSource {
    pub fn from_location(
        client: reqwest::Client,
        location: &str,
    ) -> Result<Self, ConfigurationError> {
        if !location.contains("github") {
            return Err(ConfigurationError::UnsupportedSource(location.to_owned()));
        }

        let location = location.trim_end_matches('/');
        let mut base = parse_location(&format!("{location}/"))?;
        if base.host_str() == Some("github.com") {
            base.set_host(Some("raw.githubusercontent.com"))
                .map_err(|err| ConfigurationError::InvalidLocation {
                    location: location.to_owned(),
                    reason: err.to_string(),
                })?;
        }

        Ok(Self { client, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn document_url(&self, identifier: &str) -> Result<Url, RetrievalError> {
        self.base
            .join(&format!("master/obs/{identifier}"))
            .map_err(|err| RetrievalError::new(identifier, err))
    }
}

#[async_trait]
impl SourceFetcher for RepoSource {
    async fn fetch(&self, identifier: &str) -> Result<String, RetrievalError> {
        let url = self.document_url(identifier)?;
        tracing::info!(%url, "downloading");
        fetch_text(&self.client, &url)
            .await
            .map_err(|err| RetrievalError::new(identifier, format!("{url}: {}", err.reason)))
    }
}
