use std::path::Path;

use crate::docx::CommentMetadata;
use crate::model::{CommentParagraph, CommentRecord};

/// Fields derived from a document's file name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilenameInfo {
    pub file_name: String,
    pub document_number: Option<u32>,
    pub commenter_code: String,
}

impl FilenameInfo {
    /// Splits the stem once at `delimiter`: a numeric prefix becomes the
    /// document number and the remainder the commenter code. Without a usable
    /// split the whole stem is the commenter code.
    pub fn parse(file_name: &str, delimiter: &str) -> Self {
        let stem = Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string());

        let split = (!delimiter.is_empty())
            .then(|| stem.split_once(delimiter))
            .flatten()
            .and_then(|(number, code)| {
                let number = number.trim();
                if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
                    return None;
                }
                number
                    .parse::<u32>()
                    .ok()
                    .map(|n| (n, code.trim().to_string()))
            });

        let (document_number, commenter_code) = match split {
            Some((n, code)) => (Some(n), code),
            None => {
                if !delimiter.is_empty() && stem.contains(delimiter) {
                    log::warn!("{file_name}: no document number before {delimiter:?}");
                }
                (None, stem.trim().to_string())
            }
        };
        FilenameInfo {
            file_name: file_name.to_string(),
            document_number,
            commenter_code,
        }
    }
}

/// Fields derived from a comment's bubble text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BubbleInfo {
    pub bubble: String,
    pub heading: Option<String>,
    /// Overrides the file name's commenter code when present.
    pub commenter_code: Option<String>,
}

impl BubbleInfo {
    pub fn parse(text: &str, delimiter: &str) -> Self {
        let bubble = text.trim().to_string();
        match (!delimiter.is_empty())
            .then(|| text.split_once(delimiter))
            .flatten()
        {
            Some((heading, code)) => BubbleInfo {
                heading: Some(heading.trim().to_string()),
                commenter_code: Some(code.trim().to_string()),
                bubble,
            },
            None => BubbleInfo {
                heading: (!bubble.is_empty()).then(|| bubble.clone()),
                commenter_code: None,
                bubble,
            },
        }
    }
}

/// Builds the record for one retained comment. `number` is the comment's
/// 1-based position in its document and doubles as the batch number until
/// [`number_records`] runs.
pub(crate) fn assemble(
    number: usize,
    file: &FilenameInfo,
    meta: &CommentMetadata,
    bubble_delimiter: &str,
    paragraphs: Vec<CommentParagraph>,
) -> CommentRecord {
    let bubble = BubbleInfo::parse(&meta.bubble_text(), bubble_delimiter);
    CommentRecord {
        comment_number: number,
        file_name: file.file_name.clone(),
        document_number: file.document_number,
        commenter_code: bubble
            .commenter_code
            .unwrap_or_else(|| file.commenter_code.clone()),
        document_comment_number: number,
        author: meta.author.clone(),
        initials: meta.initials.clone(),
        date: meta.date.clone(),
        bubble: bubble.bubble,
        heading: bubble.heading,
        paragraphs,
        comment_id: meta.id,
    }
}

/// Assigns the batch-wide comment counter in document-then-comment order.
pub fn number_records(records: &mut [CommentRecord]) {
    for (i, record) in records.iter_mut().enumerate() {
        record.comment_number = i + 1;
    }
}
