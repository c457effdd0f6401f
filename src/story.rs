use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::{FormatError, ValidationError};

pub const CHAPTER_COUNT: u8 = 50;

/// Expected number of frames per chapter, indexed by `chapter number - 1`.
pub const FRAME_COUNTS: [u8; CHAPTER_COUNT as usize] = [
    16, 12, 16, 9, 10, 7, 10, 15, 15, 12, 8, 14, 15, 15, 13, 18, 14, 13, 18, 13, 15, 7, 10, 9,
    8, 10, 11, 10, 9, 9, 8, 16, 9, 10, 13, 7, 11, 15, 12, 9, 8, 11, 13, 9, 13, 10, 14, 14, 18, 17,
];

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#+[ \t]*(.*)$").unwrap());
static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^(.*)\z").unwrap());
static FRAME_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^!\[[^\]]*\]\([^)\s]*?obs-en-(\d{2})-(\d{2})\.jpg[^)]*\)").unwrap()
});

static MATTER_LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[(.*?)\]\]").unwrap());
static STORY_SET_NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\| (.*)\*\*").unwrap());
static TAGLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\n\*\*.*openbiblestories").unwrap());

pub const DEFAULT_STORY_SET_NAME: &str = "Open Bible Stories";

pub fn expected_frame_count(chapter_number: u8) -> Option<u8> {
    let index = usize::from(chapter_number).checked_sub(1)?;
    FRAME_COUNTS.get(index).copied()
}

pub fn frame_id(chapter_number: u8, frame_number: u8) -> String {
    format!("{chapter_number:02}-{frame_number:02}")
}

/// Full-size chapter illustration.
pub fn chapter_image_url(chapter_number: u8) -> String {
    format!("https://cdn.door43.org/obs/jpg/{chapter_number:02}.jpg")
}

/// Thumbnail for one frame, keyed by its `CC-FF` id.
pub fn frame_image_url(frame_id: &str) -> String {
    format!("https://cdn.door43.org/obs/jpg/360px/obs-en-{frame_id}.jpg")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Direction {
    /// Registry codes other than `rtl` are read as left-to-right.
    pub fn from_code(code: &str) -> Self {
        if code.trim().eq_ignore_ascii_case("rtl") {
            Self::Rtl
        } else {
            Self::Ltr
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ltr => "ltr",
            Self::Rtl => "rtl",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub id: String,
    #[serde(rename = "img")]
    pub image_reference: String,
    pub text: String,
}

impl Frame {
    pub fn new(id: String, text: String) -> Self {
        let image_reference = frame_image_url(&id);
        Self {
            id,
            image_reference,
            text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    #[serde(with = "two_digit_number")]
    pub number: u8,
    pub title: String,
    #[serde(rename = "ref")]
    pub reference: String,
    pub frames: Vec<Frame>,
}

impl Chapter {
    pub fn frame(&self, id: &str) -> Option<&Frame> {
        self.frames.iter().find(|frame| frame.id == id)
    }

    /// Whether `id` names one of the `expected` frames of this chapter.
    fn owns_frame(&self, id: &str, expected: u8) -> bool {
        (1..=expected).any(|frame| id == frame_id(self.number, frame))
    }

    /// Structural findings for this chapter against the frame-count table.
    pub fn errors(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push(ValidationError::MissingTitle(self.number));
        }
        if self.reference.trim().is_empty() {
            errors.push(ValidationError::MissingReference(self.number));
        }

        let expected = expected_frame_count(self.number).unwrap_or(0);
        for frame_number in 1..=expected {
            let id = frame_id(self.number, frame_number);
            let Some(frame) = self.frame(&id) else {
                errors.push(ValidationError::MissingFrame(id));
                continue;
            };
            if frame.image_reference.trim().is_empty() {
                errors.push(ValidationError::MissingImage(id.clone()));
            }
            if frame.text.trim().is_empty() {
                errors.push(ValidationError::MissingText(id));
            }
        }

        let mut seen = BTreeSet::new();
        for frame in &self.frames {
            if !self.owns_frame(&frame.id, expected) {
                errors.push(ValidationError::UnexpectedFrame(frame.id.clone()));
            } else if !seen.insert(frame.id.as_str()) {
                errors.push(ValidationError::DuplicateFrame(frame.id.clone()));
            }
        }

        errors
    }
}

pub fn default_app_words() -> BTreeMap<String, String> {
    [
        ("cancel", "Cancel"),
        ("chapters", "Chapters"),
        ("languages", "Languages"),
        ("next_chapter", "Next Chapter"),
        ("ok", "OK"),
        ("remove_locally", "Remove Locally"),
        (
            "remove_this_string",
            "Remove this language from offline storage. You will need an internet connection to view it in the future.",
        ),
        ("save_locally", "Save Locally"),
        (
            "save_this_string",
            "Save this language locally for offline use.",
        ),
        ("select_a_language", "Select a Language"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_owned(), value.to_owned()))
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryCollection {
    pub app_words: BTreeMap<String, String>,
    #[serde(deserialize_with = "sorted_chapters")]
    pub chapters: Vec<Chapter>,
    pub date_modified: String,
    pub direction: Direction,
    pub language: String,
    #[serde(default)]
    pub language_name: String,
}

impl StoryCollection {
    pub fn new(
        language: impl Into<String>,
        language_name: impl Into<String>,
        direction: Direction,
        date_modified: impl Into<String>,
    ) -> Self {
        Self {
            app_words: default_app_words(),
            chapters: Vec::with_capacity(usize::from(CHAPTER_COUNT)),
            date_modified: date_modified.into(),
            direction,
            language: language.into(),
            language_name: language_name.into(),
        }
    }

    /// Add a chapter, replacing one with the same number. Chapters stay sorted by number.
    pub fn insert_chapter(&mut self, chapter: Chapter) {
        match self
            .chapters
            .binary_search_by_key(&chapter.number, |existing| existing.number)
        {
            Ok(index) => self.chapters[index] = chapter,
            Err(index) => self.chapters.insert(index, chapter),
        }
    }

    pub fn chapter(&self, number: u8) -> Option<&Chapter> {
        self.chapters
            .binary_search_by_key(&number, |chapter| chapter.number)
            .ok()
            .map(|index| &self.chapters[index])
    }

    pub fn is_complete(&self) -> bool {
        self.chapters.len() == usize::from(CHAPTER_COUNT)
    }
}

// `StoryCollection::chapter` binary-searches, so chapters read from disk are put in order.
fn sorted_chapters<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<Chapter>, D::Error> {
    let mut chapters = Vec::<Chapter>::deserialize(deserializer)?;
    chapters.sort_by_key(|chapter| chapter.number);
    Ok(chapters)
}

/// Introductory pages of a story set, with the set's name and tagline pulled out of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontMatter {
    pub language: String,
    pub date_modified: String,
    pub name: String,
    pub tagline: String,
    #[serde(rename = "front-matter")]
    pub front_matter: String,
}

impl FrontMatter {
    /// Build from DokuWiki source. `[[target|label]]` links collapse to their label (bare
    /// `[[target]]` to the target); the name follows `| ` on a bold line, and the tagline is the
    /// first bold line ahead of the openbiblestories address.
    pub fn from_source(
        language: impl Into<String>,
        date_modified: impl Into<String>,
        source: &str,
    ) -> Self {
        let front_matter = MATTER_LINK_RE
            .replace_all(&source.replace('\r', ""), |caps: &Captures<'_>| {
                let link = &caps[1];
                match link.split('|').nth(1) {
                    Some(label) => label.replace(']', ""),
                    None => link.replace(['[', ']'], ""),
                }
            })
            .into_owned();

        let name = STORY_SET_NAME_RE
            .captures(&front_matter)
            .map_or_else(|| DEFAULT_STORY_SET_NAME.to_owned(), |caps| caps[1].to_owned());
        let tagline = TAGLINE_RE
            .find(&front_matter)
            .and_then(|found| found.as_str().split("**").nth(1))
            .map(|tagline| tagline.trim().to_owned())
            .unwrap_or_default();

        Self {
            language: language.into(),
            date_modified: date_modified.into(),
            name,
            tagline,
            front_matter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackMatter {
    pub language: String,
    pub date_modified: String,
    #[serde(rename = "back-matter")]
    pub back_matter: String,
}

impl BackMatter {
    pub fn from_source(
        language: impl Into<String>,
        date_modified: impl Into<String>,
        source: &str,
    ) -> Self {
        Self {
            language: language.into(),
            date_modified: date_modified.into(),
            back_matter: source.replace('\r', ""),
        }
    }
}

/// Parse one converted chapter back into the document model.
pub fn parse_chapter(markdown: &str, chapter_number: u8) -> Result<Chapter, FormatError> {
    if expected_frame_count(chapter_number).is_none() {
        return Err(FormatError::ChapterOutOfRange(chapter_number));
    }

    let mut text = markdown.replace('\r', "");

    let mut title = String::new();
    let title_match = TITLE_RE.captures(&text).map(|caps| {
        let range = caps.get(0).map(|m| m.range()).unwrap_or_default();
        (caps[1].trim().to_owned(), range)
    });
    if let Some((found, range)) = title_match {
        title = found;
        text.replace_range(range, "");
    }

    // Trailing blank lines would otherwise anchor the reference on an empty line.
    text.truncate(text.trim_end().len());
    let mut reference = String::new();
    let reference_match = REFERENCE_RE
        .find(&text)
        .map(|m| (m.as_str().trim().to_owned(), m.range()));
    if let Some((found, range)) = reference_match {
        reference = found;
        text.replace_range(range, "");
    }

    let markers: Vec<_> = FRAME_MARKER_RE.captures_iter(&text).collect();
    let mut frames = Vec::with_capacity(markers.len());
    for (idx, caps) in markers.iter().enumerate() {
        let marker = caps.get(0).map(|m| m.range()).unwrap_or_default();
        let found: u8 = caps[1].parse().unwrap_or_default();
        let id = format!("{}-{}", &caps[1], &caps[2]);
        if found != chapter_number {
            return Err(FormatError::ChapterMismatch {
                expected: chapter_number,
                found,
                frame: id,
            });
        }

        let end = markers
            .get(idx + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |next| next.start());
        let body = text[marker.end..end].trim().to_owned();
        frames.push(Frame::new(id, body));
    }
    frames.sort_by(|a, b| a.id.cmp(&b.id));

    tracing::debug!(
        chapter = chapter_number,
        frames = frames.len(),
        "parsed chapter"
    );

    Ok(Chapter {
        number: chapter_number,
        title,
        reference,
        frames,
    })
}

/// Check every chapter against the expected shape. All findings are returned; an empty list
/// means the collection is complete.
pub fn validate(collection: &StoryCollection) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for number in 1..=CHAPTER_COUNT {
        match collection.chapter(number) {
            Some(chapter) => errors.extend(chapter.errors()),
            None => errors.push(ValidationError::MissingChapter(number)),
        }
    }
    errors
}

mod two_digit_number {
    use serde::{Deserialize as _, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S: Serializer>(number: &u8, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{number:02}"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid chapter number: {raw:?}")))
    }
}
