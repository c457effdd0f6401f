use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::Context as _;
use regex::Regex;
use serde::Deserialize;

use crate::error::ConfigurationError;
use crate::markup::strip_markup_artifacts;

static LIST_SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*[;,]\s*").unwrap());

/// Split a `;`/`,` separated list, dropping empty entries.
pub fn split_list(text: &str) -> Vec<String> {
    LIST_SEPARATOR_RE
        .split(text.trim())
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Read a loose `key: value` document into a map.
///
/// Empty lines, `#` comments, `{{...}}` image lines and lines without a colon are skipped.
/// Keys are trimmed, lowercased and have spaces replaced by underscores. Later keys win.
pub fn parse_status_block(text: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    for line in text.replace('\r', "").lines() {
        if line.is_empty() || line.starts_with('#') || line.starts_with("{{") || !line.contains(':')
        {
            continue;
        }

        let cleaned = strip_markup_artifacts(line);
        let Some((key, value)) = cleaned.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase().replace(' ', "_");
        fields.insert(key, value.trim().to_owned());
    }
    fields
}

/// Publication status of one language's stories, as published in its status document.
///
/// A saved JSON copy may omit fields; they fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StatusFields {
    pub checking_entity: String,
    pub checking_level: String,
    pub comments: String,
    pub contributors: String,
    pub publish_date: String,
    pub source_text: String,
    pub source_text_version: String,
    pub version: String,
}

impl Default for StatusFields {
    fn default() -> Self {
        Self {
            checking_entity: String::new(),
            checking_level: "1".to_owned(),
            comments: String::new(),
            contributors: String::new(),
            publish_date: chrono::Local::now().format("%Y-%m-%d").to_string(),
            source_text: "en".to_owned(),
            source_text_version: String::new(),
            version: String::new(),
        }
    }
}

impl StatusFields {
    const REQUIRED: [&'static str; 8] = [
        "checking_entity",
        "checking_level",
        "comments",
        "contributors",
        "publish_date",
        "source_text",
        "source_text_version",
        "version",
    ];

    pub fn from_block(block: &HashMap<String, String>) -> Result<Self, ConfigurationError> {
        if let Some(missing) = Self::REQUIRED.iter().find(|key| !block.contains_key(**key)) {
            return Err(ConfigurationError::MissingStatusField((*missing).to_owned()));
        }
        let field = |key: &str| block.get(key).cloned().unwrap_or_default();

        Ok(Self {
            checking_entity: field("checking_entity"),
            checking_level: field("checking_level"),
            comments: field("comments"),
            contributors: field("contributors"),
            publish_date: field("publish_date"),
            source_text: field("source_text"),
            source_text_version: field("source_text_version"),
            version: field("version"),
        })
    }

    /// Read a JSON status file instead of a published status document.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = crate::store::read_file(path)?;
        serde_json::from_str(&json).with_context(|| format!("parse status file: {}", path.display()))
    }

    pub fn contributor_list(&self) -> Vec<String> {
        split_list(&self.contributors)
    }

    pub fn checking_entity_list(&self) -> Vec<String> {
        split_list(&self.checking_entity)
    }
}
