use std::collections::HashMap;

use crate::model::{CommentParagraph, FormatSet, ResolvedRun};

use super::format::{FormattedRun, RunFormatter};
use super::ranges::paragraph_runs;
use super::{WML_NS, is_wml};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoteKind {
    Footnote,
    Endnote,
}

impl NoteKind {
    fn element(self) -> &'static str {
        match self {
            NoteKind::Footnote => "footnote",
            NoteKind::Endnote => "endnote",
        }
    }
}

/// A `w:footnoteReference` or `w:endnoteReference` target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NoteRef {
    pub kind: NoteKind,
    pub id: i64,
}

/// Format-resolved footnote and endnote bodies of one document.
#[derive(Debug, Default)]
pub(crate) struct NotesTable {
    notes: HashMap<NoteRef, Vec<CommentParagraph>>,
}

impl NotesTable {
    pub(crate) fn from_xml(
        footnotes: Option<&roxmltree::Document>,
        endnotes: Option<&roxmltree::Document>,
        formatter: &RunFormatter,
    ) -> Self {
        let mut table = NotesTable::default();
        for (xml, kind) in [(footnotes, NoteKind::Footnote), (endnotes, NoteKind::Endnote)] {
            if let Some(xml) = xml {
                table.read_part(xml, kind, formatter);
            }
        }
        table
    }

    fn read_part(&mut self, xml: &roxmltree::Document, kind: NoteKind, formatter: &RunFormatter) {
        for node in xml.root_element().children() {
            if !is_wml(node, kind.element()) {
                continue;
            }
            // Separator and continuation notes carry a type and ids <= 0.
            if node.attribute((WML_NS, "type")).is_some_and(|t| t != "normal") {
                continue;
            }
            let Some(id) = node
                .attribute((WML_NS, "id"))
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|id| *id > 0)
            else {
                continue;
            };

            let paragraphs = node
                .children()
                .filter(|p| is_wml(*p, "p"))
                .map(|p| {
                    let runs = paragraph_runs(p);
                    let runs = formatter
                        .format_runs(p, &runs)
                        .into_iter()
                        .filter(|r| r.note.is_none())
                        .map(|r| ResolvedRun::new(r.text, r.format))
                        .collect();
                    CommentParagraph::new(runs)
                })
                .collect();
            self.notes.insert(NoteRef { kind, id }, paragraphs);
        }
    }

    #[cfg(test)]
    pub(crate) fn insert(&mut self, note: NoteRef, paragraphs: Vec<CommentParagraph>) {
        self.notes.insert(note, paragraphs);
    }

    pub(crate) fn get(&self, note: &NoteRef) -> Option<&[CommentParagraph]> {
        self.notes.get(note).map(Vec::as_slice)
    }
}

/// Numbers the note references of one comment from 1 (footnotes and endnotes
/// share the counter), replaces each reference with its number as
/// superscript, and appends the note bodies after the comment's paragraphs.
/// The first appended paragraph of each note starts with the same number.
///
/// A reference to a missing note becomes empty text and takes no number.
pub(crate) fn splice_notes(
    paragraphs: Vec<Vec<FormattedRun>>,
    notes: &NotesTable,
) -> Vec<CommentParagraph> {
    let mut number = 0;
    let mut appended: Vec<CommentParagraph> = Vec::new();
    let mut out = Vec::with_capacity(paragraphs.len());

    for runs in paragraphs {
        let mut resolved = Vec::with_capacity(runs.len());
        for run in runs {
            let Some(note) = run.note else {
                resolved.push(ResolvedRun::new(run.text, run.format));
                continue;
            };
            let Some(body) = notes.get(&note) else {
                log::warn!("Comment references missing {} {}", note.kind.element(), note.id);
                resolved.push(ResolvedRun::new(String::new(), run.format));
                continue;
            };

            number += 1;
            let label = number.to_string();
            resolved.push(ResolvedRun::new(label.clone(), FormatSet::SUPERSCRIPT));

            let mut body = body.to_vec();
            match body.first_mut() {
                Some(first) => first
                    .runs
                    .insert(0, ResolvedRun::new(label, FormatSet::SUPERSCRIPT)),
                None => body.push(CommentParagraph::new(vec![ResolvedRun::new(
                    label,
                    FormatSet::SUPERSCRIPT,
                )])),
            }
            appended.extend(body);
        }
        out.push(CommentParagraph::new(resolved));
    }

    out.extend(appended);
    out
}
