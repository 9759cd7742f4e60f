use std::collections::HashMap;

use roxmltree::{Node, NodeId};

use crate::error::Error;

use super::{WML_NS, is_wml, visible_text};

/// The body paragraphs covered by one comment's anchor pair.
#[derive(Debug)]
pub(crate) struct CommentSpan<'a> {
    pub(crate) id: u32,
    pub(crate) paragraphs: Vec<Node<'a, 'a>>,
}

/// Inline content of a paragraph, in document order.
#[derive(Clone, Copy, Debug)]
enum Inline<'a> {
    Run(Node<'a, 'a>),
    Start(Node<'a, 'a>),
    End(Node<'a, 'a>),
}

/// Flatten inline wrappers (hyperlinks, insertions, smart tags, simple
/// fields, content controls) so runs and anchors inside them are visited in order.
fn collect_inline<'a>(parent: Node<'a, 'a>, out: &mut Vec<Inline<'a>>) {
    for child in parent.children() {
        if child.tag_name().namespace() != Some(WML_NS) {
            continue;
        }
        match child.tag_name().name() {
            "r" => out.push(Inline::Run(child)),
            "commentRangeStart" => out.push(Inline::Start(child)),
            "commentRangeEnd" => out.push(Inline::End(child)),
            "hyperlink" | "ins" | "smartTag" | "fldSimple" | "customXml" | "sdtContent" => {
                collect_inline(child, out)
            }
            "sdt" => {
                if let Some(content) = child.children().find(|n| is_wml(*n, "sdtContent")) {
                    collect_inline(content, out);
                }
            }
            _ => {}
        }
    }
}

/// Runs of a paragraph that carry text or a note reference.
pub(crate) fn paragraph_runs<'a>(para: Node<'a, 'a>) -> Vec<Node<'a, 'a>> {
    let mut inline = Vec::new();
    collect_inline(para, &mut inline);
    inline
        .into_iter()
        .filter_map(|item| match item {
            Inline::Run(r) if run_has_content(r) => Some(r),
            _ => None,
        })
        .collect()
}

fn run_has_content(run: Node) -> bool {
    run.children().any(|c| is_wml(c, "t")) || has_note_reference(run)
}

fn has_note_reference(run: Node) -> bool {
    run.children()
        .any(|c| is_wml(c, "footnoteReference") || is_wml(c, "endnoteReference"))
}

fn anchor_id(node: Node) -> Result<u32, Error> {
    let raw = node.attribute((WML_NS, "id")).unwrap_or_default();
    raw.trim().parse().map_err(|_| {
        Error::InvalidDocx(format!(
            "{} has invalid id {raw:?}",
            node.tag_name().name()
        ))
    })
}

/// Runs of `para` inside comment `id`: after its start anchor when the anchor
/// is in this paragraph, up to its end anchor when that is in this paragraph.
pub(crate) fn comment_runs<'a>(para: Node<'a, 'a>, id: u32) -> Vec<Node<'a, 'a>> {
    let mut inline = Vec::new();
    collect_inline(para, &mut inline);

    let is_ours = |n: Node| anchor_id(n).is_ok_and(|a| a == id);
    let begin = inline
        .iter()
        .position(|item| matches!(item, Inline::Start(n) if is_ours(*n)))
        .map_or(0, |i| i + 1);

    let mut runs = Vec::new();
    for item in &inline[begin..] {
        match item {
            Inline::Run(r) if run_has_content(*r) => runs.push(*r),
            Inline::End(n) if is_ours(*n) => break,
            _ => {}
        }
    }
    runs
}

/// No visible text and no note reference.
fn is_blank(para: Node) -> bool {
    visible_text(para).chars().all(char::is_whitespace)
        && !paragraph_runs(para).into_iter().any(has_note_reference)
}

/// Top-level body paragraphs in document order, including table cells but
/// not paragraphs nested inside other paragraphs (text boxes).
fn block_paragraphs<'a>(body: Node<'a, 'a>) -> Vec<Node<'a, 'a>> {
    body.descendants()
        .filter(|n| is_wml(*n, "p") && !n.ancestors().skip(1).any(|a| is_wml(a, "p")))
        .collect()
}

struct ParagraphIndex<'a> {
    paragraphs: Vec<Node<'a, 'a>>,
    positions: HashMap<NodeId, usize>,
}

impl<'a> ParagraphIndex<'a> {
    fn new(body: Node<'a, 'a>) -> Self {
        let paragraphs = block_paragraphs(body);
        let positions = paragraphs
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id(), i))
            .collect();
        ParagraphIndex {
            paragraphs,
            positions,
        }
    }

    fn containing(&self, marker: Node) -> Option<usize> {
        marker
            .ancestors()
            .skip(1)
            .find_map(|a| self.positions.get(&a.id()).copied())
    }

    /// The paragraph containing the marker, or else the first one after it.
    /// Node ids follow document order.
    fn at_or_after(&self, marker: Node) -> Option<usize> {
        self.containing(marker).or_else(|| {
            let at = self.paragraphs.partition_point(|p| p.id().get() < marker.id().get());
            (at < self.paragraphs.len()).then_some(at)
        })
    }

    /// The paragraph containing the marker, or else the last one before it.
    fn at_or_before(&self, marker: Node) -> Option<usize> {
        self.containing(marker).or_else(|| {
            self.paragraphs
                .partition_point(|p| p.id().get() < marker.id().get())
                .checked_sub(1)
        })
    }
}

/// Finds every comment's anchor pair and paragraph span in document order.
///
/// The number of start anchors, end anchors and comment metadata entries
/// must agree, and every id must have exactly one start and one end;
/// otherwise the document is structurally corrupt.
pub(crate) fn locate_comments<'a>(
    body: Node<'a, 'a>,
    comment_count: usize,
) -> Result<Vec<CommentSpan<'a>>, Error> {
    let mut starts: Vec<(u32, Node<'a, 'a>)> = Vec::new();
    let mut ends: HashMap<u32, Vec<Node<'a, 'a>>> = HashMap::new();
    let mut end_count = 0;
    for node in body.descendants() {
        if is_wml(node, "commentRangeStart") {
            starts.push((anchor_id(node)?, node));
        } else if is_wml(node, "commentRangeEnd") {
            ends.entry(anchor_id(node)?).or_default().push(node);
            end_count += 1;
        }
    }

    if starts.len() != end_count || starts.len() != comment_count {
        return Err(Error::Integrity {
            starts: starts.len(),
            ends: end_count,
            comments: comment_count,
        });
    }

    let mut start_counts: HashMap<u32, usize> = HashMap::new();
    for (id, _) in &starts {
        *start_counts.entry(*id).or_default() += 1;
    }

    let index = ParagraphIndex::new(body);
    let mut spans = Vec::with_capacity(starts.len());
    for (id, start) in starts {
        let end = match ends.get(&id).map(Vec::as_slice) {
            Some([end]) if start_counts[&id] == 1 => *end,
            _ => return Err(Error::UnpairedAnchor { id }),
        };
        spans.push(CommentSpan {
            id,
            paragraphs: span_paragraphs(&index, id, start, end),
        });
    }
    Ok(spans)
}

fn span_paragraphs<'a>(
    index: &ParagraphIndex<'a>,
    id: u32,
    start: Node<'a, 'a>,
    end: Node<'a, 'a>,
) -> Vec<Node<'a, 'a>> {
    let (Some(first), Some(last)) = (index.at_or_after(start), index.at_or_before(end)) else {
        log::warn!("Comment {id} has no paragraph between its anchors");
        return Vec::new();
    };
    if first > last {
        if end.id().get() < start.id().get() {
            log::warn!("Comment {id} ends before it starts; treating it as empty");
        }
        return Vec::new();
    }
    let end_paragraph = index.containing(end);
    index.paragraphs[first..=last]
        .iter()
        .enumerate()
        .filter(|(i, p)| end_paragraph == Some(first + i) || !is_blank(**p))
        .map(|(_, p)| *p)
        .collect()
}
