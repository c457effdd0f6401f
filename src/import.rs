use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::cli::ImportArgs;
use crate::error::RetrievalError;
use crate::languages::{HttpLanguageRegistry, LanguageInfo, LanguageRegistry as _};
use crate::manifest::{LegacyManifest, MANIFEST_FILE_NAME, Manifest};
use crate::source::{RepoSource, SourceFetcher};
use crate::status::{StatusFields, parse_status_block};
use crate::story::{BackMatter, CHAPTER_COUNT, FrontMatter, StoryCollection};

pub const COLLECTION_FILE_NAME: &str = "obs.json";
pub const FRONT_MATTER_FILE_NAME: &str = "front-matter.json";
pub const BACK_MATTER_FILE_NAME: &str = "back-matter.json";

/// Everything parsed out of one repository besides the saved markdown.
#[derive(Debug, Clone)]
pub struct ImportedStories {
    pub collection: StoryCollection,
    pub front_matter: FrontMatter,
    pub back_matter: BackMatter,
}

/// One source document of a story repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Document {
    Chapter(u8),
    FrontMatter,
    BackMatter,
}

impl Document {
    pub fn all() -> Vec<Self> {
        (1..=CHAPTER_COUNT)
            .map(Self::Chapter)
            .chain([Self::FrontMatter, Self::BackMatter])
            .collect()
    }

    pub fn identifier(self) -> String {
        match self {
            Self::Chapter(number) => format!("{number:02}.txt"),
            Self::FrontMatter => "front-matter.txt".to_owned(),
            Self::BackMatter => "back-matter.txt".to_owned(),
        }
    }

    /// Markdown output path relative to the output root.
    pub fn output_path(self) -> PathBuf {
        let content = Path::new("content");
        match self {
            Self::Chapter(number) => content.join(format!("{number:02}.md")),
            Self::FrontMatter => content.join("_front").join("front-matter.md"),
            Self::BackMatter => content.join("_back").join("back-matter.md"),
        }
    }
}

pub async fn run(args: ImportArgs) -> anyhow::Result<()> {
    let out_dir = PathBuf::from(&args.out);
    if !args.force {
        crate::store::ensure_output_dir_does_not_exist(&out_dir)?;
    }

    let client = crate::source::http_client()?;
    let source = RepoSource::from_location(client.clone(), &args.repo)?;
    let registry = HttpLanguageRegistry::new(client.clone(), &args.languages_url)?;
    let language = registry
        .lookup(&args.lang)
        .await
        .context("look up language")?;

    let status = match &args.status_file {
        Some(path) => {
            let path = PathBuf::from(path);
            tracing::info!(path = %path.display(), "reading status file");
            StatusFields::load(&path)?
        }
        None => {
            let status_url = crate::source::status_url(&args.status_url, &language.code)?;
            tracing::info!(url = %status_url, "downloading status");
            let status_text = crate::source::fetch_text(&client, &status_url).await?;
            StatusFields::from_block(&parse_status_block(&status_text))?
        }
    };

    tracing::info!(repo = %source.base(), lang = %language.code, "importing stories");
    let imported = import_documents(Arc::new(source), &language, &out_dir, args.concurrency)
        .await
        .context("import documents")?;
    let collection = &imported.collection;

    let errors = crate::story::validate(collection);
    crate::verify::report(&errors);
    if args.strict && !errors.is_empty() {
        anyhow::bail!(
            "{} validation error(s); manifest not written",
            errors.len()
        );
    }

    let manifest = Manifest::Legacy(LegacyManifest::from_status(&status, &language));
    let manifest_path = out_dir.join(MANIFEST_FILE_NAME);
    crate::store::write_file(&manifest_path, &manifest.to_json_pretty()?)?;
    tracing::info!(path = %manifest_path.display(), "saved manifest");

    write_json(&out_dir.join(COLLECTION_FILE_NAME), collection)?;
    write_json(&out_dir.join(FRONT_MATTER_FILE_NAME), &imported.front_matter)?;
    write_json(&out_dir.join(BACK_MATTER_FILE_NAME), &imported.back_matter)?;

    Ok(())
}

fn write_json(path: &Path, value: &impl serde::Serialize) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("serialize: {}", path.display()))?;
    crate::store::write_file(path, &json)?;
    tracing::info!(path = %path.display(), "saved");
    Ok(())
}

/// Download, convert and save every document, returning the parsed chapters and matter.
pub async fn import_documents(
    source: Arc<dyn SourceFetcher>,
    language: &LanguageInfo,
    out_dir: &Path,
    concurrency: usize,
) -> anyhow::Result<ImportedStories> {
    let fetched = fetch_all(source, &Document::all(), concurrency).await?;

    let today = chrono::Local::now().format("%Y%m%d").to_string();
    let mut collection = StoryCollection::new(
        language.code.clone(),
        language.name.clone(),
        language.direction,
        today.clone(),
    );
    let mut front_matter = FrontMatter::from_source(&language.code, &today, "");
    let mut back_matter = BackMatter::from_source(&language.code, &today, "");

    for (document, raw) in fetched {
        let identifier = document.identifier();
        tracing::info!(document = %identifier, "converting to markdown");
        let markdown = crate::markup::translate(&raw);

        let save_as = out_dir.join(document.output_path());
        crate::store::write_file(&save_as, &markdown)?;
        tracing::info!(path = %save_as.display(), "saved");

        match document {
            Document::Chapter(number) => {
                let chapter = crate::story::parse_chapter(&markdown, number)
                    .with_context(|| format!("parse chapter: {identifier}"))?;
                collection.insert_chapter(chapter);
            }
            Document::FrontMatter => {
                front_matter = FrontMatter::from_source(&language.code, &today, &raw);
            }
            Document::BackMatter => {
                back_matter = BackMatter::from_source(&language.code, &today, &raw);
            }
        }
    }

    Ok(ImportedStories {
        collection,
        front_matter,
        back_matter,
    })
}

/// Fetch documents with at most `concurrency` requests in flight. Results come back in
/// document order; the first failure aborts the rest.
pub async fn fetch_all(
    source: Arc<dyn SourceFetcher>,
    documents: &[Document],
    concurrency: usize,
) -> anyhow::Result<Vec<(Document, String)>> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for &document in documents {
        let source = Arc::clone(&source);
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let identifier = document.identifier();
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|err| RetrievalError::new(identifier.as_str(), err))?;
            let text = source.fetch(&identifier).await?;
            Ok::<_, RetrievalError>((document, text))
        });
    }

    let mut fetched = Vec::with_capacity(documents.len());
    while let Some(joined) = tasks.join_next().await {
        let (document, text) = joined.context("join download task")??;
        fetched.push((document, text));
    }
    fetched.sort_by_key(|(document, _)| *document);

    Ok(fetched)
}
