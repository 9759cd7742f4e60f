use std::collections::HashMap;

use crate::error::Error;
use crate::model::CommentDate;

use super::{W14_NS, W15_NS, WML_NS, is_wml, visible_text};

/// One `w:comment` entry of `word/comments.xml`.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct CommentMetadata {
    pub(crate) id: u32,
    pub(crate) author: String,
    pub(crate) initials: String,
    pub(crate) date: CommentDate,
    /// Plain text of each bubble paragraph.
    pub(crate) paragraphs: Vec<String>,
    /// `w14:paraId` of the bubble's last paragraph.
    pub(crate) last_para_id: Option<String>,
}

impl CommentMetadata {
    pub(crate) fn bubble_text(&self) -> String {
        self.paragraphs.join("\n")
    }
}

/// Reads every comment's metadata in part order. A missing part means the
/// document has no comments.
pub(crate) fn read_comments(
    xml: Option<&roxmltree::Document>,
) -> Result<Vec<CommentMetadata>, Error> {
    let Some(xml) = xml else {
        return Ok(Vec::new());
    };

    let mut comments = Vec::new();
    for node in xml.root_element().children().filter(|n| is_wml(*n, "comment")) {
        let raw_id = node.attribute((WML_NS, "id")).unwrap_or_default();
        let id = raw_id
            .trim()
            .parse()
            .map_err(|_| Error::InvalidDocx(format!("comment has invalid id {raw_id:?}")))?;
        let attr = |name: &str| node.attribute((WML_NS, name)).unwrap_or_default().to_string();

        let paras: Vec<_> = node.children().filter(|p| is_wml(*p, "p")).collect();
        comments.push(CommentMetadata {
            id,
            author: attr("author"),
            initials: attr("initials"),
            date: CommentDate::parse(&attr("date")),
            paragraphs: paras.iter().map(|p| visible_text(*p)).collect(),
            last_para_id: paras
                .last()
                .and_then(|p| p.attribute((W14_NS, "paraId")))
                .map(str::to_string),
        });
    }
    Ok(comments)
}

/// Parent links between comments, from `word/commentsExtended.xml`.
///
/// A comment is a reply when the paragraph id of its last bubble paragraph
/// equals the `w15:paraId` of a `w15:commentEx` entry that carries a
/// `w15:paraIdParent`.
#[derive(Debug, Default)]
pub(crate) struct ReplyLinks {
    parents: HashMap<u32, Option<u32>>,
}

impl ReplyLinks {
    pub(crate) fn from_xml(
        comments: &[CommentMetadata],
        extended: Option<&roxmltree::Document>,
    ) -> Self {
        let Some(extended) = extended else {
            return ReplyLinks::default();
        };

        let mut child_to_parent: HashMap<&str, &str> = HashMap::new();
        for entry in extended.descendants().filter(|n| {
            n.tag_name().name() == "commentEx" && n.tag_name().namespace() == Some(W15_NS)
        }) {
            if let (Some(para), Some(parent)) = (
                entry.attribute((W15_NS, "paraId")),
                entry.attribute((W15_NS, "paraIdParent")),
            ) {
                child_to_parent.insert(para, parent);
            }
        }

        let by_para: HashMap<&str, u32> = comments
            .iter()
            .filter_map(|c| c.last_para_id.as_deref().map(|p| (p, c.id)))
            .collect();

        let mut parents = HashMap::new();
        for comment in comments {
            let Some(parent_para) = comment
                .last_para_id
                .as_deref()
                .and_then(|p| child_to_parent.get(p))
            else {
                continue;
            };
            let parent = by_para.get(parent_para).copied();
            if parent.is_none() {
                log::warn!(
                    "Reply comment {} points at unknown paragraph {parent_para}",
                    comment.id
                );
            }
            parents.insert(comment.id, parent);
        }
        ReplyLinks { parents }
    }

    pub(crate) fn is_reply(&self, id: u32) -> bool {
        self.parents.contains_key(&id)
    }

    pub(crate) fn parent_of(&self, id: u32) -> Option<u32> {
        self.parents.get(&id).copied().flatten()
    }

    pub(crate) fn len(&self) -> usize {
        self.parents.len()
    }

    /// Ids that are not replies, order preserved.
    pub(crate) fn top_level(&self, ids: impl IntoIterator<Item = u32>) -> Vec<u32> {
        ids.into_iter().filter(|id| !self.is_reply(*id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const COMMENTS: &str = r#"<w:comments xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"
        xmlns:w14="http://schemas.microsoft.com/office/word/2010/wordml">
      <w:comment w:id="0" w:author="Ann Lee" w:initials="AL" w:date="2024-01-02T03:04:05Z">
        <w:p w14:paraId="11111111"><w:r><w:annotationRef/></w:r><w:r><w:t>Style</w:t></w:r></w:p>
        <w:p w14:paraId="22222222"><w:r><w:t>Section 2</w:t></w:r></w:p>
      </w:comment>
      <w:comment w:id="1" w:author="Bo" w:initials="B" w:date="yesterday">
        <w:p w14:paraId="33333333"><w:r><w:t>Agreed</w:t></w:r></w:p>
      </w:comment>
      <w:comment w:id="2" w:author="Cy">
        <w:p w14:paraId="44444444"><w:r><w:t>Other</w:t></w:r></w:p>
      </w:comment>
    </w:comments>"#;

    const EXTENDED: &str = r#"<w15:commentsEx xmlns:w15="http://schemas.microsoft.com/office/word/2012/wordml">
      <w15:commentEx w15:paraId="22222222" w15:done="0"/>
      <w15:commentEx w15:paraId="33333333" w15:paraIdParent="22222222" w15:done="0"/>
      <w15:commentEx w15:paraId="4444444" w15:paraIdParent="22222222" w15:done="0"/>
    </w15:commentsEx>"#;

    #[test]
    fn reads_metadata() {
        let doc = roxmltree::Document::parse(COMMENTS).unwrap();
        let comments = read_comments(Some(&doc)).unwrap();
        assert_eq!(comments.len(), 3);
        assert_eq!(comments[0].author, "Ann Lee");
        assert_eq!(comments[0].initials, "AL");
        assert_eq!(comments[0].bubble_text(), "Style\nSection 2");
        assert_eq!(comments[0].last_para_id.as_deref(), Some("22222222"));
        assert!(matches!(comments[0].date, CommentDate::Parsed(_)));
        assert_eq!(comments[1].date, CommentDate::Raw("yesterday".into()));
        assert_eq!(comments[2].date, CommentDate::Raw(String::new()));
    }

    #[test]
    fn missing_part_means_no_comments() {
        assert!(read_comments(None).unwrap().is_empty());
    }

    #[test]
    fn replies_match_exact_paragraph_ids() {
        let doc = roxmltree::Document::parse(COMMENTS).unwrap();
        let ext = roxmltree::Document::parse(EXTENDED).unwrap();
        let comments = read_comments(Some(&doc)).unwrap();
        let links = ReplyLinks::from_xml(&comments, Some(&ext));

        assert!(links.is_reply(1));
        assert_eq!(links.parent_of(1), Some(0));
        // "4444444" is a prefix of comment 2's id, not a match
        assert!(!links.is_reply(2));
        assert_eq!(links.len(), 1);
        assert_eq!(links.top_level([0, 1, 2]), vec![0, 2]);
    }

    #[test]
    fn without_extended_part_all_are_top_level() {
        let doc = roxmltree::Document::parse(COMMENTS).unwrap();
        let comments = read_comments(Some(&doc)).unwrap();
        let links = ReplyLinks::from_xml(&comments, None);
        assert_eq!(links.top_level([0, 1, 2]), vec![0, 1, 2]);
        assert_eq!(links.len(), 0);
    }
}
