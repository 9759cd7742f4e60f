//! Run merging and text cleanup for resolved comment paragraphs.

use crate::model::{CommentParagraph, ResolvedRun};

/// Text of the single paragraph reported for a comment with no content.
pub const EMPTY_COMMENT: &str = "(( Empty comment ))";

/// Collapses every whitespace sequence to one plain space and straightens
/// curly quotation marks.
pub fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        out.push(match c {
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            other => other,
        });
    }
    out
}

fn merge_runs(runs: Vec<ResolvedRun>) -> Vec<ResolvedRun> {
    let mut merged: Vec<ResolvedRun> = Vec::with_capacity(runs.len());
    for run in runs.into_iter().filter(|r| !r.text.is_empty()) {
        match merged.last_mut() {
            Some(prev) if prev.format == run.format => prev.text.push_str(&run.text),
            _ => merged.push(run),
        }
    }
    for run in &mut merged {
        run.text = clean_text(&run.text);
    }
    merged
}

/// Merges same-format neighbours, cleans text, drops blank paragraphs and
/// trims the comment's outer edges. The result is stable under a second
/// pass; a comment left with no text becomes one unformatted
/// [`EMPTY_COMMENT`] paragraph.
pub fn consolidate(paragraphs: Vec<CommentParagraph>) -> Vec<CommentParagraph> {
    let mut out: Vec<CommentParagraph> = paragraphs
        .into_iter()
        .map(|p| CommentParagraph::new(merge_runs(p.runs)))
        .filter(|p| p.runs.iter().any(|r| !r.text.trim().is_empty()))
        .collect();

    trim_start(&mut out);
    trim_end(&mut out);

    if out.is_empty() {
        out.push(CommentParagraph::new(vec![ResolvedRun::plain(EMPTY_COMMENT)]));
    }
    out
}

fn trim_start(paragraphs: &mut Vec<CommentParagraph>) {
    while let Some(first) = paragraphs.first_mut() {
        while let Some(run) = first.runs.first_mut() {
            run.text = run.text.trim_start().to_string();
            if !run.text.is_empty() {
                return;
            }
            first.runs.remove(0);
        }
        paragraphs.remove(0);
    }
}

fn trim_end(paragraphs: &mut Vec<CommentParagraph>) {
    while let Some(last) = paragraphs.last_mut() {
        while let Some(run) = last.runs.last_mut() {
            run.text.truncate(run.text.trim_end().len());
            if !run.text.is_empty() {
                return;
            }
            last.runs.pop();
        }
        paragraphs.pop();
    }
}
