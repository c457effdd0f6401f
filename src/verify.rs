use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::cli::VerifyArgs;
use crate::error::ValidationError;
use crate::story::{CHAPTER_COUNT, Direction, StoryCollection};

pub fn run(args: VerifyArgs) -> anyhow::Result<()> {
    let content_dir = PathBuf::from(&args.content);
    let collection = load_collection(&content_dir).context("load chapters")?;

    let errors = crate::story::validate(&collection);
    report(&errors);
    if !errors.is_empty() {
        anyhow::bail!(
            "{} validation error(s) in {}",
            errors.len(),
            content_dir.display()
        );
    }

    Ok(())
}

/// Parse every `NN.md` present in `content_dir`. Absent files become missing chapters.
pub fn load_collection(content_dir: &Path) -> anyhow::Result<StoryCollection> {
    if !content_dir.is_dir() {
        anyhow::bail!("content directory not found: {}", content_dir.display());
    }

    let today = chrono::Local::now().format("%Y%m%d").to_string();
    let mut collection = StoryCollection::new("und", "", Direction::Ltr, today);
    for number in 1..=CHAPTER_COUNT {
        let path = content_dir.join(format!("{number:02}.md"));
        if !path.exists() {
            tracing::debug!(path = %path.display(), "chapter file not found");
            continue;
        }
        let markdown = crate::store::read_file(&path)?;
        let chapter = crate::story::parse_chapter(&markdown, number)
            .with_context(|| format!("parse chapter: {}", path.display()))?;
        collection.insert_chapter(chapter);
    }

    Ok(collection)
}

/// Log a validation summary: the count, then one line per finding.
pub fn report(errors: &[ValidationError]) {
    if errors.is_empty() {
        tracing::info!("No errors were found in the OBS data.");
        return;
    }

    let frame_level = errors.iter().filter(|error| error.frame_id().is_some()).count();
    tracing::warn!(
        count = errors.len(),
        frame_level,
        "validation found errors"
    );
    for error in errors {
        match error.frame_id() {
            Some(frame) => tracing::warn!(frame, "{error}"),
            None => tracing::warn!("{error}"),
        }
    }
}
