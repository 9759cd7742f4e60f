mod comments;
mod format;
mod notes;
mod ranges;
mod styles;

use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::Path;

use crate::error::Error;

pub(crate) use comments::{CommentMetadata, ReplyLinks, read_comments};
pub(crate) use format::RunFormatter;
pub(crate) use notes::{NotesTable, splice_notes};
pub(crate) use ranges::{CommentSpan, comment_runs, locate_comments};
pub(crate) use styles::StyleTable;

pub use format::decode_props;
pub use styles::{AttrValues, PropMap, StyleDef, StyleProps, resolve_style};

pub(crate) const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub(crate) const W14_NS: &str = "http://schemas.microsoft.com/office/word/2010/wordml";
pub(crate) const W15_NS: &str = "http://schemas.microsoft.com/office/word/2012/wordml";

pub const DOCUMENT_PART: &str = "word/document.xml";
pub const STYLES_PART: &str = "word/styles.xml";
pub const COMMENTS_PART: &str = "word/comments.xml";
pub const COMMENTS_EXTENDED_PART: &str = "word/commentsExtended.xml";
pub const FOOTNOTES_PART: &str = "word/footnotes.xml";
pub const ENDNOTES_PART: &str = "word/endnotes.xml";

const RELEVANT_PARTS: [&str; 6] = [
    DOCUMENT_PART,
    STYLES_PART,
    COMMENTS_PART,
    COMMENTS_EXTENDED_PART,
    FOOTNOTES_PART,
    ENDNOTES_PART,
];

pub(crate) fn is_wml(node: roxmltree::Node, name: &str) -> bool {
    node.tag_name().name() == name && node.tag_name().namespace() == Some(WML_NS)
}

pub(crate) fn wml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children().find(|n| is_wml(*n, name))
}

pub(crate) fn wml_attr<'a>(node: roxmltree::Node<'a, 'a>, child: &str) -> Option<&'a str> {
    wml(node, child).and_then(|n| n.attribute((WML_NS, "val")))
}

/// Text carried by a run or paragraph: `w:t` content plus whitespace for tabs and breaks.
/// Deleted text and field instructions are not part of it.
pub(crate) fn visible_text(node: roxmltree::Node) -> String {
    let mut text = String::new();
    for n in node.descendants() {
        if n.tag_name().namespace() != Some(WML_NS) {
            continue;
        }
        match n.tag_name().name() {
            "t" => text.push_str(n.text().unwrap_or("")),
            "tab" if n.parent().is_some_and(|p| is_wml(p, "r")) => text.push('\t'),
            "br" | "cr" => text.push('\n'),
            "noBreakHyphen" => text.push('-'),
            _ => {}
        }
    }
    text
}

/// Reads one archive entry as text; `Ok(None)` when the entry is absent.
pub(crate) fn read_zip_text<R: Read + Seek>(
    zip: &mut zip::ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, Error> {
    let mut entry = match zip.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut content = String::new();
    entry.read_to_string(&mut content)?;
    Ok(Some(content))
}

/// The XML parts of a DOCX package that comment extraction reads, as text.
pub struct DocxParts {
    parts: HashMap<String, String>,
}

impl DocxParts {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let file = std::fs::File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => Error::Io(
                std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())),
            ),
            _ => Error::Io(e),
        })?;
        let mut zip = zip::ZipArchive::new(file)
            .map_err(|_| Error::InvalidDocx("file is not a ZIP archive".into()))?;
        Self::from_archive(&mut zip)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let mut zip = zip::ZipArchive::new(std::io::Cursor::new(bytes))
            .map_err(|_| Error::InvalidDocx("data is not a ZIP archive".into()))?;
        Self::from_archive(&mut zip)
    }

    /// Builds the part set from already-extracted XML, keyed by part name.
    pub fn from_parts<I, K, V>(parts: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let parts: HashMap<String, String> = parts
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        if !parts.contains_key(DOCUMENT_PART) {
            return Err(Error::InvalidDocx(format!("missing {DOCUMENT_PART}")));
        }
        Ok(DocxParts { parts })
    }

    fn from_archive<R: Read + Seek>(zip: &mut zip::ZipArchive<R>) -> Result<Self, Error> {
        let mut parts = HashMap::new();
        for name in RELEVANT_PARTS {
            if let Some(text) = read_zip_text(zip, name)? {
                parts.insert(name.to_string(), text);
            }
        }
        if !parts.contains_key(DOCUMENT_PART) {
            return Err(Error::InvalidDocx(
                "missing word/document.xml (is this a DOCX file?)".into(),
            ));
        }
        Ok(DocxParts { parts })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.parts.get(name).map(String::as_str)
    }

    pub fn parse(&self) -> Result<ParsedDocx<'_>, Error> {
        ParsedDocx::parse(self)
    }
}

/// Parsed XML trees of one document; optional parts are `None` when absent.
pub struct ParsedDocx<'a> {
    pub(crate) document: roxmltree::Document<'a>,
    pub(crate) styles: Option<roxmltree::Document<'a>>,
    pub(crate) comments: Option<roxmltree::Document<'a>>,
    pub(crate) comments_extended: Option<roxmltree::Document<'a>>,
    pub(crate) footnotes: Option<roxmltree::Document<'a>>,
    pub(crate) endnotes: Option<roxmltree::Document<'a>>,
}

impl<'a> ParsedDocx<'a> {
    fn parse(parts: &'a DocxParts) -> Result<Self, Error> {
        let optional = |name: &str| -> Result<Option<roxmltree::Document<'a>>, Error> {
            parts
                .get(name)
                .map(roxmltree::Document::parse)
                .transpose()
                .map_err(Error::from)
        };
        let document_xml = parts
            .get(DOCUMENT_PART)
            .ok_or_else(|| Error::InvalidDocx(format!("missing {DOCUMENT_PART}")))?;
        Ok(ParsedDocx {
            document: roxmltree::Document::parse(document_xml)?,
            styles: optional(STYLES_PART)?,
            comments: optional(COMMENTS_PART)?,
            comments_extended: optional(COMMENTS_EXTENDED_PART)?,
            footnotes: optional(FOOTNOTES_PART)?,
            endnotes: optional(ENDNOTES_PART)?,
        })
    }

    pub(crate) fn body(&self) -> Result<roxmltree::Node<'_, 'a>, Error> {
        self.document
            .root_element()
            .children()
            .find(|n| is_wml(*n, "body"))
            .ok_or_else(|| Error::InvalidDocx("Missing w:body".into()))
    }
}
