use std::collections::{HashMap, HashSet};

use crate::config::{Config, IgnoredFormats};
use crate::consolidate::consolidate;
use crate::docx::{
    CommentMetadata, CommentSpan, NotesTable, ParsedDocx, ReplyLinks, RunFormatter, StyleTable,
    comment_runs, locate_comments, read_comments, splice_notes,
};
use crate::error::Error;
use crate::model::CommentRecord;
use crate::record::{FilenameInfo, assemble};

/// The resolution context of one parsed document: its style and notes
/// tables, comment metadata and the spans of the comments to report.
///
/// Construction runs the structural checks; [`DocumentComments::records`]
/// then resolves comments lazily and can be called any number of times.
pub struct DocumentComments<'a> {
    file: FilenameInfo,
    bubble_delimiter: String,
    ignored: IgnoredFormats,
    styles: StyleTable,
    notes: NotesTable,
    metadata: HashMap<u32, CommentMetadata>,
    spans: Vec<CommentSpan<'a>>,
    comment_count: usize,
    reply_count: usize,
}

impl<'a> DocumentComments<'a> {
    pub fn new(
        parsed: &'a ParsedDocx<'_>,
        file_name: &str,
        config: &Config,
    ) -> Result<Self, Error> {
        let metadata = read_comments(parsed.comments.as_ref())?;
        let mut spans = locate_comments(parsed.body()?, metadata.len())?;

        let links = ReplyLinks::from_xml(&metadata, parsed.comments_extended.as_ref());
        let comment_count = metadata.len();
        let reply_count = links.len();
        log::info!("{file_name}: Read {comment_count} comments (with {reply_count} replies)");

        let metadata: HashMap<u32, CommentMetadata> =
            metadata.into_iter().map(|m| (m.id, m)).collect();
        if let Some(span) = spans.iter().find(|s| !metadata.contains_key(&s.id)) {
            return Err(Error::UnpairedAnchor { id: span.id });
        }

        if config.include_replies {
            for span in &spans {
                if let Some(parent) = links.parent_of(span.id) {
                    log::debug!("{file_name}: keeping comment {} (reply to {parent})", span.id);
                }
            }
        } else {
            let keep: HashSet<u32> = links
                .top_level(spans.iter().map(|s| s.id))
                .into_iter()
                .collect();
            spans.retain(|s| keep.contains(&s.id));
        }

        let styles = StyleTable::from_xml(parsed.styles.as_ref());
        let ignored = config.ignore_formatting;
        let notes = NotesTable::from_xml(
            parsed.footnotes.as_ref(),
            parsed.endnotes.as_ref(),
            &RunFormatter::new(&styles, ignored),
        );

        Ok(DocumentComments {
            file: FilenameInfo::parse(file_name, &config.filename_delimiter),
            bubble_delimiter: config.comment_bubble_delimiter.clone(),
            ignored,
            styles,
            notes,
            metadata,
            spans,
            comment_count,
            reply_count,
        })
    }

    /// Comments in the document, replies included.
    pub fn comment_count(&self) -> usize {
        self.comment_count
    }

    pub fn reply_count(&self) -> usize {
        self.reply_count
    }

    /// Number of records [`DocumentComments::records`] yields.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Resolved records in document order of their start anchors.
    pub fn records(&self) -> impl Iterator<Item = CommentRecord> + '_ {
        let formatter = RunFormatter::new(&self.styles, self.ignored);
        self.spans.iter().enumerate().filter_map(move |(i, span)| {
            let meta = self.metadata.get(&span.id)?;
            let formatted = span
                .paragraphs
                .iter()
                .map(|p| {
                    let runs = comment_runs(*p, span.id);
                    formatter.format_runs(*p, &runs)
                })
                .filter(|runs| !runs.is_empty())
                .collect();
            let paragraphs = consolidate(splice_notes(formatted, &self.notes));
            Some(assemble(
                i + 1,
                &self.file,
                meta,
                &self.bubble_delimiter,
                paragraphs,
            ))
        })
    }
}
