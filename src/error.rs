use thiserror::Error;

/// A source document could not be obtained.
#[derive(Debug, Error)]
#[error("retrieve {identifier}: {reason}")]
pub struct RetrievalError {
    pub identifier: String,
    pub reason: String,
}

impl RetrievalError {
    pub fn new(identifier: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self {
            identifier: identifier.into(),
            reason: reason.to_string(),
        }
    }
}

/// Problems detected before any conversion work begins.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Currently only github repositories are supported: {0}")]
    UnsupportedSource(String),

    #[error("Information for language \"{0}\" was not found.")]
    UnknownLanguage(String),

    #[error("status document is missing required field: {0}")]
    MissingStatusField(String),

    #[error("invalid location {location}: {reason}")]
    InvalidLocation { location: String, reason: String },
}

/// Chapter markdown whose frame numbering disagrees with its chapter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("frame {frame} belongs to chapter {found:02}, expected chapter {expected:02}")]
    ChapterMismatch {
        expected: u8,
        found: u8,
        frame: String,
    },

    #[error("chapter number out of range (1..=50): {0}")]
    ChapterOutOfRange(u8),
}

/// A structural gap found by `story::validate`. Collected, never raised.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Chapter not found: {0:02}")]
    MissingChapter(u8),

    #[error("Title not found: {0:02}")]
    MissingTitle(u8),

    #[error("Ref not found: {0:02}")]
    MissingReference(u8),

    #[error("Frame not found: {0}")]
    MissingFrame(String),

    #[error("Attribute \"img\" is missing for frame {0}")]
    MissingImage(String),

    #[error("Attribute \"text\" is missing for frame {0}")]
    MissingText(String),

    #[error("Frame appears more than once: {0}")]
    DuplicateFrame(String),

    #[error("Frame not expected in this chapter: {0}")]
    UnexpectedFrame(String),
}

impl ValidationError {
    /// Frame id the finding refers to, if it is frame-level.
    pub fn frame_id(&self) -> Option<&str> {
        match self {
            Self::MissingFrame(id)
            | Self::MissingImage(id)
            | Self::MissingText(id)
            | Self::DuplicateFrame(id)
            | Self::UnexpectedFrame(id) => Some(id),
            Self::MissingChapter(_) | Self::MissingTitle(_) | Self::MissingReference(_) => None,
        }
    }
}
