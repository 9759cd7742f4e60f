#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;

pub const NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:w14="http://schemas.microsoft.com/office/word/2010/wordml" xmlns:w15="http://schemas.microsoft.com/office/word/2012/wordml""#;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

/// Assembles a minimal DOCX package in memory.
#[derive(Default)]
pub struct DocxBuilder {
    body: String,
    comments: Option<String>,
    comments_extended: Option<String>,
    styles: Option<String>,
    footnotes: Option<String>,
    endnotes: Option<String>,
}

impl DocxBuilder {
    pub fn new(body: &str) -> Self {
        DocxBuilder {
            body: body.to_string(),
            ..Default::default()
        }
    }

    /// `w:comment` elements.
    pub fn comments(mut self, inner: &str) -> Self {
        self.comments = Some(inner.to_string());
        self
    }

    /// `w15:commentEx` elements.
    pub fn comments_extended(mut self, inner: &str) -> Self {
        self.comments_extended = Some(inner.to_string());
        self
    }

    /// Content of `w:styles` (`w:docDefaults` and `w:style` elements).
    pub fn styles(mut self, inner: &str) -> Self {
        self.styles = Some(inner.to_string());
        self
    }

    pub fn footnotes(mut self, inner: &str) -> Self {
        self.footnotes = Some(inner.to_string());
        self
    }

    pub fn endnotes(mut self, inner: &str) -> Self {
        self.endnotes = Some(inner.to_string());
        self
    }

    fn parts(&self) -> Vec<(&'static str, String)> {
        let wrap = |root: &str, inner: &str| {
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><{root} {NS}>{inner}</{root}>"#
            )
        };
        let mut parts = vec![
            ("[Content_Types].xml", CONTENT_TYPES.to_string()),
            (
                "word/document.xml",
                wrap("w:document", &format!("<w:body>{}</w:body>", self.body)),
            ),
        ];
        let optional = [
            ("word/comments.xml", "w:comments", &self.comments),
            ("word/commentsExtended.xml", "w15:commentsEx", &self.comments_extended),
            ("word/styles.xml", "w:styles", &self.styles),
            ("word/footnotes.xml", "w:footnotes", &self.footnotes),
            ("word/endnotes.xml", "w:endnotes", &self.endnotes),
        ];
        for (name, root, inner) in optional {
            if let Some(inner) = inner {
                parts.push((name, wrap(root, inner)));
            }
        }
        parts
    }

    pub fn build(&self) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, content) in self.parts() {
            zip.start_file(name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    pub fn write_to(&self, path: &Path) {
        std::fs::write(path, self.build()).unwrap();
    }
}

/// A paragraph of plain runs.
pub fn p(texts: &[&str]) -> String {
    let runs: String = texts.iter().map(|t| r(t)).collect();
    format!("<w:p>{runs}</w:p>")
}

/// A plain run.
pub fn r(text: &str) -> String {
    format!(r#"<w:r><w:t xml:space="preserve">{text}</w:t></w:r>"#)
}

/// A run with the given `w:rPr` content.
pub fn styled(rpr: &str, text: &str) -> String {
    format!(r#"<w:r><w:rPr>{rpr}</w:rPr><w:t xml:space="preserve">{text}</w:t></w:r>"#)
}

pub fn start(id: u32) -> String {
    format!(r#"<w:commentRangeStart w:id="{id}"/>"#)
}

pub fn end(id: u32) -> String {
    format!(
        r#"<w:commentRangeEnd w:id="{id}"/><w:r><w:commentReference w:id="{id}"/></w:r>"#
    )
}

/// A `w:comment` whose bubble has one paragraph per entry of `bubble`; the
/// last paragraph gets `para_id`.
pub fn comment(id: u32, author: &str, bubble: &[&str], para_id: &str) -> String {
    let last = bubble.len().saturating_sub(1);
    let paragraphs: String = bubble
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let pid = if i == last {
                format!(r#" w14:paraId="{para_id}""#)
            } else {
                String::new()
            };
            format!(
                r#"<w:p{pid}><w:r><w:annotationRef/></w:r><w:r><w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#
            )
        })
        .collect();
    format!(
        r#"<w:comment w:id="{id}" w:author="{author}" w:initials="{}" w:date="2024-03-01T10:20:30Z">{paragraphs}</w:comment>"#,
        author.chars().next().unwrap_or('X')
    )
}
