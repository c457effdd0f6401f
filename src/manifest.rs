use std::path::PathBuf;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::cli::ManifestUpgradeArgs;
use crate::languages::LanguageInfo;
use crate::status::StatusFields;
use crate::story::Direction;

pub const MANIFEST_FILE_NAME: &str = "manifest.json";
pub const PACKAGE_VERSION: u32 = 1;

// Field order in every struct below is the serialized order downstream consumers rely on.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestLanguage {
    pub slug: String,
    pub name: String,
    pub dir: Direction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTranslation {
    pub language_slug: String,
    pub resource_slug: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translate_mode: Option<String>,
    pub checking_entity: Vec<String>,
    pub checking_level: String,
    pub comments: String,
    pub contributors: Vec<String>,
    pub pub_date: String,
    pub version: String,
    pub license: String,
    pub checks_performed: Vec<String>,
    pub source_translations: Vec<SourceTranslation>,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            translate_mode: Some("all".to_owned()),
            checking_entity: Vec::new(),
            checking_level: "1".to_owned(),
            comments: String::new(),
            contributors: Vec::new(),
            pub_date: chrono::Local::now().format("%Y-%m-%d").to_string(),
            version: "4".to_owned(),
            license: "CC BY-SA".to_owned(),
            checks_performed: Vec::new(),
            source_translations: Vec::new(),
        }
    }
}

impl Status {
    pub fn from_status_fields(fields: &StatusFields) -> Self {
        Self {
            checking_entity: fields.checking_entity_list(),
            checking_level: fields.checking_level.clone(),
            comments: fields.comments.clone(),
            contributors: fields.contributor_list(),
            pub_date: fields.publish_date.clone(),
            version: fields.version.clone(),
            source_translations: vec![SourceTranslation {
                language_slug: fields.source_text.clone(),
                resource_slug: "obs".to_owned(),
                version: fields.source_text_version.clone(),
            }],
            ..Self::default()
        }
    }
}

/// Flat manifest with the resource fields at the top level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyManifest {
    pub syntax_version: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub content_mime_type: String,
    pub language: ManifestLanguage,
    pub slug: String,
    pub name: String,
    pub versification_slug: String,
    pub status: Status,
    pub finished_chunks: Vec<String>,
}

impl Default for LegacyManifest {
    fn default() -> Self {
        Self {
            syntax_version: "1.0".to_owned(),
            kind: "book".to_owned(),
            content_mime_type: "text/markdown".to_owned(),
            language: ManifestLanguage {
                slug: "en".to_owned(),
                name: "English".to_owned(),
                dir: Direction::Ltr,
            },
            slug: "obs".to_owned(),
            name: "Open Bible Stories".to_owned(),
            versification_slug: "ufw".to_owned(),
            status: Status::default(),
            finished_chunks: Vec::new(),
        }
    }
}

impl LegacyManifest {
    pub fn from_status(fields: &StatusFields, language: &LanguageInfo) -> Self {
        Self {
            language: ManifestLanguage {
                slug: language.code.clone(),
                name: language.english_name.clone(),
                dir: language.direction,
            },
            status: Status::from_status_fields(fields),
            ..Self::default()
        }
    }

    pub fn upgrade(self, modified_at: impl Into<String>) -> CurrentManifest {
        CurrentManifest {
            package_version: PACKAGE_VERSION,
            modified_at: modified_at.into(),
            content_mime_type: self.content_mime_type,
            versification_slug: self.versification_slug,
            language: self.language,
            resource: Resource {
                slug: self.slug,
                name: self.name,
                kind: self.kind,
                status: self.status,
            },
            chunk_status: self.finished_chunks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub slug: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: Status,
}

/// Package manifest with the resource description nested under `resource`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentManifest {
    pub package_version: u32,
    pub modified_at: String,
    pub content_mime_type: String,
    pub versification_slug: String,
    pub language: ManifestLanguage,
    pub resource: Resource,
    pub chunk_status: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Manifest {
    Legacy(LegacyManifest),
    Current(CurrentManifest),
}

impl Manifest {
    /// Read either shape. The shape is recognized by its version field; the rest of the
    /// document must then match that shape exactly.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json).context("parse manifest json")?;
        if value.get("syntax_version").is_some() {
            let manifest = serde_json::from_value(value).context("deserialize legacy manifest")?;
            return Ok(Self::Legacy(manifest));
        }
        if value.get("package_version").is_some() {
            let manifest = serde_json::from_value(value).context("deserialize current manifest")?;
            return Ok(Self::Current(manifest));
        }
        anyhow::bail!("unrecognized manifest: expected `syntax_version` or `package_version`")
    }

    pub fn to_json_pretty(&self) -> anyhow::Result<String> {
        let mut json = serde_json::to_string_pretty(self).context("serialize manifest")?;
        json.push('\n');
        Ok(json)
    }

    pub fn into_current(self, modified_at: impl Into<String>) -> CurrentManifest {
        match self {
            Self::Legacy(legacy) => legacy.upgrade(modified_at),
            Self::Current(current) => current,
        }
    }
}

pub fn upgrade(args: ManifestUpgradeArgs) -> anyhow::Result<()> {
    let input_path = PathBuf::from(&args.input);
    let out_path = PathBuf::from(&args.out);

    if out_path.exists() && !args.force {
        anyhow::bail!("manifest output already exists: {}", out_path.display());
    }

    let json = crate::store::read_file(&input_path)?;
    let manifest = Manifest::from_json(&json)
        .with_context(|| format!("read manifest: {}", input_path.display()))?;

    let modified_at = args
        .modified_at
        .unwrap_or_else(|| chrono::Local::now().format("%Y%m%d").to_string());
    let current = Manifest::Current(manifest.into_current(modified_at));

    crate::store::write_file(&out_path, &current.to_json_pretty()?)?;
    tracing::info!(out = %out_path.display(), "wrote current manifest");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn language() -> LanguageInfo {
        LanguageInfo {
            code: "fr".to_owned(),
            name: "français".to_owned(),
            english_name: "French".to_owned(),
            direction: Direction::Ltr,
        }
    }

    fn status_fields() -> StatusFields {
        StatusFields {
            checking_entity: "Wycliffe Associates; Door43".to_owned(),
            checking_level: "3".to_owned(),
            comments: "Reviewed".to_owned(),
            contributors: "Alice; Bob, Carol".to_owned(),
            publish_date: "2016-05-14".to_owned(),
            source_text: "en".to_owned(),
            source_text_version: "4".to_owned(),
            version: "4.1".to_owned(),
        }
    }

    fn assert_key_order(json: &str, keys: &[&str]) {
        let positions: Vec<usize> = keys
            .iter()
            .map(|key| {
                json.find(&format!("\"{key}\":"))
                    .unwrap_or_else(|| panic!("missing key {key} in {json}"))
            })
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted, "keys out of order: {keys:?}\n{json}");
    }

    #[test]
    fn legacy_manifest_is_built_from_status() {
        let manifest = LegacyManifest::from_status(&status_fields(), &language());

        assert_eq!(manifest.syntax_version, "1.0");
        assert_eq!(manifest.language.slug, "fr");
        assert_eq!(manifest.language.name, "French");
        assert_eq!(manifest.status.contributors, vec!["Alice", "Bob", "Carol"]);
        assert_eq!(
            manifest.status.checking_entity,
            vec!["Wycliffe Associates", "Door43"]
        );
        assert_eq!(manifest.status.pub_date, "2016-05-14");
        assert_eq!(manifest.status.license, "CC BY-SA");
        assert_eq!(
            manifest.status.source_translations,
            vec![SourceTranslation {
                language_slug: "en".to_owned(),
                resource_slug: "obs".to_owned(),
                version: "4".to_owned(),
            }]
        );
    }

    #[test]
    fn legacy_manifest_keeps_field_order() -> anyhow::Result<()> {
        let manifest = Manifest::Legacy(LegacyManifest::from_status(&status_fields(), &language()));
        let json = manifest.to_json_pretty()?;

        assert!(json.starts_with("{\n  \"syntax_version\": \"1.0\",\n  \"type\": \"book\","));
        assert_key_order(
            &json,
            &[
                "syntax_version",
                "type",
                "content_mime_type",
                "language",
                "slug",
                "name",
                "versification_slug",
                "status",
                "finished_chunks",
            ],
        );
        assert_key_order(
            &json,
            &[
                "translate_mode",
                "checking_entity",
                "checking_level",
                "comments",
                "contributors",
                "pub_date",
                "version",
                "license",
                "checks_performed",
                "source_translations",
            ],
        );
        Ok(())
    }

    #[test]
    fn current_manifest_keeps_field_order() -> anyhow::Result<()> {
        let legacy = LegacyManifest::from_status(&status_fields(), &language());
        let json = Manifest::Current(legacy.upgrade("20260101")).to_json_pretty()?;

        assert!(json.starts_with("{\n  \"package_version\": 1,"));
        assert_key_order(
            &json,
            &[
                "package_version",
                "modified_at",
                "content_mime_type",
                "versification_slug",
                "language",
                "resource",
                "chunk_status",
            ],
        );
        Ok(())
    }

    #[test]
    fn both_shapes_round_trip() -> anyhow::Result<()> {
        let mut legacy = LegacyManifest::from_status(&status_fields(), &language());
        legacy.finished_chunks = vec!["01-01".to_owned(), "01-02".to_owned()];
        legacy.status.checks_performed = vec!["peer".to_owned()];
        legacy.language.dir = Direction::Rtl;

        let manifest = Manifest::Legacy(legacy.clone());
        assert_eq!(Manifest::from_json(&manifest.to_json_pretty()?)?, manifest);

        let current = Manifest::Current(legacy.upgrade("20260101"));
        assert_eq!(Manifest::from_json(&current.to_json_pretty()?)?, current);
        Ok(())
    }

    #[test]
    fn upgrade_moves_resource_fields() {
        let mut legacy = LegacyManifest::from_status(&status_fields(), &language());
        legacy.finished_chunks = vec!["01-01".to_owned()];

        let current = Manifest::Legacy(legacy.clone()).into_current("20260101");
        assert_eq!(current.package_version, PACKAGE_VERSION);
        assert_eq!(current.modified_at, "20260101");
        assert_eq!(current.resource.slug, "obs");
        assert_eq!(current.resource.name, "Open Bible Stories");
        assert_eq!(current.resource.kind, "book");
        assert_eq!(current.resource.status, legacy.status);
        assert_eq!(current.chunk_status, vec!["01-01"]);

        let again = Manifest::Current(current.clone()).into_current("20270101");
        assert_eq!(again, current);
    }

    #[test]
    fn from_json_reports_missing_fields() {
        let err = Manifest::from_json(r#"{"syntax_version": "1.0", "type": "book"}"#).unwrap_err();
        assert!(format!("{err:#}").contains("deserialize legacy manifest"));

        let err = Manifest::from_json(r#"{"package_version": "seven"}"#).unwrap_err();
        assert!(format!("{err:#}").contains("deserialize current manifest"));

        let err = Manifest::from_json(r#"{"slug": "obs"}"#).unwrap_err();
        assert!(format!("{err:#}").contains("unrecognized manifest"));
    }

    #[test]
    fn status_without_translate_mode_omits_it() -> anyhow::Result<()> {
        let status = Status {
            translate_mode: None,
            ..Status::default()
        };
        let json = serde_json::to_string(&status)?;
        assert!(!json.contains("translate_mode"));
        assert_eq!(serde_json::from_str::<Status>(&json)?, status);
        Ok(())
    }
}
