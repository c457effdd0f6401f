use anyhow::Context as _;
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::error::ConfigurationError;
use crate::story::Direction;

pub const DEFAULT_LANGUAGES_URL: &str = "https://td.unfoldingword.org/exports/langnames.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageInfo {
    pub code: String,
    /// Name in the language itself.
    pub name: String,
    pub english_name: String,
    pub direction: Direction,
}

/// One entry of the `langnames.json` export.
#[derive(Debug, Clone, Deserialize)]
struct LanguageRecord {
    lc: String,
    #[serde(default)]
    ln: String,
    #[serde(default)]
    ang: String,
    #[serde(default)]
    ld: String,
}

impl From<LanguageRecord> for LanguageInfo {
    fn from(record: LanguageRecord) -> Self {
        Self {
            direction: Direction::from_code(&record.ld),
            code: record.lc,
            name: record.ln,
            english_name: record.ang,
        }
    }
}

pub fn parse_language_records(json: &str) -> anyhow::Result<Vec<LanguageInfo>> {
    let records: Vec<LanguageRecord> =
        serde_json::from_str(json).context("parse language records")?;
    Ok(records.into_iter().map(LanguageInfo::from).collect())
}

#[async_trait]
pub trait LanguageRegistry: Send + Sync {
    /// Fails with `ConfigurationError::UnknownLanguage` when `code` is not registered.
    async fn lookup(&self, code: &str) -> anyhow::Result<LanguageInfo>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticLanguageRegistry {
    languages: Vec<LanguageInfo>,
}

impl StaticLanguageRegistry {
    pub fn new(languages: Vec<LanguageInfo>) -> Self {
        Self { languages }
    }

    pub fn find(&self, code: &str) -> Result<LanguageInfo, ConfigurationError> {
        self.languages
            .iter()
            .find(|language| language.code == code)
            .cloned()
            .ok_or_else(|| ConfigurationError::UnknownLanguage(code.to_owned()))
    }
}

#[async_trait]
impl LanguageRegistry for StaticLanguageRegistry {
    async fn lookup(&self, code: &str) -> anyhow::Result<LanguageInfo> {
        Ok(self.find(code)?)
    }
}

/// Registry backed by the published language export, downloaded on each lookup.
#[derive(Debug, Clone)]
pub struct HttpLanguageRegistry {
    client: reqwest::Client,
    url: Url,
}

impl HttpLanguageRegistry {
    pub fn new(client: reqwest::Client, url: &str) -> Result<Self, ConfigurationError> {
        let url = crate::source::parse_location(url)?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl LanguageRegistry for HttpLanguageRegistry {
    async fn lookup(&self, code: &str) -> anyhow::Result<LanguageInfo> {
        tracing::info!(url = %self.url, "downloading language data");
        let json = crate::source::fetch_text(&self.client, &self.url).await?;
        let registry = StaticLanguageRegistry::new(parse_language_records(&json)?);
        Ok(registry.find(code)?)
    }
}
