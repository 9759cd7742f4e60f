use std::fmt;

use bitflags::bitflags;
use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

bitflags! {
    /// Canonical display attributes of a resolved run.
    ///
    /// Bits are declared in the order of their one-character codes, so
    /// iterating a set always yields codes sorted (`b i s u v w x z`).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FormatSet: u8 {
        const BOLD = 1 << 0;
        const ITALIC = 1 << 1;
        const STRIKE = 1 << 2;
        const UNDERLINE = 1 << 3;
        const SUBSCRIPT = 1 << 4;
        const DOUBLE_UNDERLINE = 1 << 5;
        const SUPERSCRIPT = 1 << 6;
        const DOUBLE_STRIKE = 1 << 7;
    }
}

const FORMAT_CODES: [(FormatSet, char, &str); 8] = [
    (FormatSet::BOLD, 'b', "bold"),
    (FormatSet::ITALIC, 'i', "italic"),
    (FormatSet::STRIKE, 's', "strike"),
    (FormatSet::UNDERLINE, 'u', "underline"),
    (FormatSet::SUBSCRIPT, 'v', "subscript"),
    (FormatSet::DOUBLE_UNDERLINE, 'w', "double-underline"),
    (FormatSet::SUPERSCRIPT, 'x', "superscript"),
    (FormatSet::DOUBLE_STRIKE, 'z', "double-strike"),
];

impl FormatSet {
    /// Serialization form: one character per attribute, sorted.
    pub fn codes(&self) -> String {
        FORMAT_CODES
            .iter()
            .filter(|(flag, _, _)| self.contains(*flag))
            .map(|(_, code, _)| *code)
            .collect()
    }

    /// Inverse of [`FormatSet::codes`]; unknown characters yield `None`.
    pub fn from_codes(codes: &str) -> Option<Self> {
        let mut set = FormatSet::empty();
        for c in codes.chars() {
            let (flag, _, _) = FORMAT_CODES.iter().find(|(_, code, _)| *code == c)?;
            set |= *flag;
        }
        Some(set)
    }

    /// Human-readable attribute tags, in code order.
    pub fn tags(&self) -> Vec<&'static str> {
        FORMAT_CODES
            .iter()
            .filter(|(flag, _, _)| self.contains(*flag))
            .map(|(_, _, tag)| *tag)
            .collect()
    }
}

impl Serialize for FormatSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.codes())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedRun {
    pub text: String,
    pub format: FormatSet,
}

impl ResolvedRun {
    pub fn new(text: impl Into<String>, format: FormatSet) -> Self {
        ResolvedRun {
            text: text.into(),
            format,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, FormatSet::empty())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CommentParagraph {
    pub runs: Vec<ResolvedRun>,
}

impl CommentParagraph {
    pub fn new(runs: Vec<ResolvedRun>) -> Self {
        CommentParagraph { runs }
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Comment timestamp: structured when it is ISO-8601 (optionally `Z`
/// suffixed), otherwise the raw attribute text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CommentDate {
    Parsed(NaiveDateTime),
    Raw(String),
}

impl CommentDate {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.strip_suffix('Z').unwrap_or(raw);
        match NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
            Ok(dt) => CommentDate::Parsed(dt),
            Err(_) => {
                if !raw.is_empty() {
                    log::warn!("Keeping unparseable comment date as text: {raw:?}");
                }
                CommentDate::Raw(raw.to_string())
            }
        }
    }
}

impl fmt::Display for CommentDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommentDate::Parsed(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            CommentDate::Raw(s) => f.write_str(s),
        }
    }
}

/// One fully resolved top-level comment, in report field order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CommentRecord {
    /// Batch-wide counter; equals `document_comment_number` for a single document.
    pub comment_number: usize,
    pub file_name: String,
    pub document_number: Option<u32>,
    pub commenter_code: String,
    pub document_comment_number: usize,
    pub author: String,
    pub initials: String,
    pub date: CommentDate,
    pub bubble: String,
    pub heading: Option<String>,
    pub paragraphs: Vec<CommentParagraph>,
    /// `w:id` of the comment inside its document.
    #[serde(skip)]
    pub comment_id: u32,
}

impl CommentRecord {
    /// Comment text with paragraphs joined by newlines, formats dropped.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(CommentParagraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
