//! Report columns and record sinks.
//!
//! Columns are a fixed, ordered table of typed accessors over
//! [`CommentRecord`]. Sinks only serialize; every record they receive is
//! already fully resolved.

use std::io::Write;

use chrono::NaiveDateTime;
use csv::WriterBuilder;

use crate::error::Error;
use crate::model::{CommentDate, CommentParagraph, CommentRecord};

/// Value of one report cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Empty,
    Integer(i64),
    Text(String),
    Date(NaiveDateTime),
    Rich(Vec<CommentParagraph>),
}

impl CellValue {
    /// Plain-text rendering: rich text loses its formats and joins
    /// paragraphs with newlines.
    pub fn render(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Integer(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Date(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            CellValue::Rich(paragraphs) => paragraphs
                .iter()
                .map(CommentParagraph::text)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

pub struct Column {
    pub label: &'static str,
    pub hidden: bool,
    pub accessor: fn(&CommentRecord) -> CellValue,
}

impl Column {
    const fn new(
        label: &'static str,
        hidden: bool,
        accessor: fn(&CommentRecord) -> CellValue,
    ) -> Self {
        Column {
            label,
            hidden,
            accessor,
        }
    }

    pub fn value(&self, record: &CommentRecord) -> CellValue {
        (self.accessor)(record)
    }
}

fn count(n: usize) -> CellValue {
    CellValue::Integer(n as i64)
}

fn text(s: &str) -> CellValue {
    if s.is_empty() {
        CellValue::Empty
    } else {
        CellValue::Text(s.to_string())
    }
}

fn date(d: &CommentDate) -> CellValue {
    match d {
        CommentDate::Parsed(dt) => CellValue::Date(*dt),
        CommentDate::Raw(s) => text(s),
    }
}

/// Report columns in output order. `add_response` inserts the hand-filled
/// Heading 2/Heading 3 columns and appends Response.
pub fn columns(add_response: bool) -> Vec<Column> {
    let mut cols = vec![
        Column::new("Comment Number", false, |r| count(r.comment_number)),
        Column::new("File Name", false, |r| text(&r.file_name)),
        Column::new("Document Number", false, |r| {
            r.document_number
                .map_or(CellValue::Empty, |n| CellValue::Integer(n.into()))
        }),
        Column::new("Commenter Code", false, |r| text(&r.commenter_code)),
        Column::new("Document Comment Number", false, |r| {
            count(r.document_comment_number)
        }),
        Column::new("Comment Author", true, |r| text(&r.author)),
        Column::new("Comment Author Initials", true, |r| text(&r.initials)),
        Column::new("Comment Date", true, |r| date(&r.date)),
        Column::new("Comment Bubble", true, |r| text(&r.bubble)),
        Column::new("Heading 1", false, |r| {
            r.heading.as_deref().map_or(CellValue::Empty, text)
        }),
        Column::new("Comment Data", false, |r| {
            CellValue::Rich(r.paragraphs.clone())
        }),
    ];
    if add_response {
        cols.insert(10, Column::new("Heading 2", false, |_| CellValue::Empty));
        cols.insert(11, Column::new("Heading 3", true, |_| CellValue::Empty));
        cols.push(Column::new("Response", false, |_| CellValue::Empty));
    }
    cols
}

/// Destination for resolved records, fed by a single writer.
pub trait RecordSink {
    fn write_record(&mut self, record: &CommentRecord) -> Result<(), Error>;

    fn finish(&mut self) -> Result<(), Error>;

    fn write_all(&mut self, records: &[CommentRecord]) -> Result<(), Error> {
        for record in records {
            self.write_record(record)?;
        }
        self.finish()
    }
}

/// CSV with one row per record over the visible columns.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    columns: Vec<Column>,
}

impl<W: Write> CsvSink<W> {
    /// Writes the header row immediately.
    pub fn new(out: W, columns: Vec<Column>) -> Result<Self, Error> {
        let columns: Vec<Column> = columns.into_iter().filter(|c| !c.hidden).collect();
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(out);
        writer.write_record(columns.iter().map(|c| c.label))?;
        Ok(CsvSink { writer, columns })
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn write_record(&mut self, record: &CommentRecord) -> Result<(), Error> {
        self.writer
            .write_record(self.columns.iter().map(|c| c.value(record).render()))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Error> {
        self.writer.flush()?;
        Ok(())
    }
}

/// JSON Lines: one serialized record per line, runs carrying format codes.
pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        JsonSink { out }
    }
}

impl<W: Write> RecordSink for JsonSink<W> {
    fn write_record(&mut self, record: &CommentRecord) -> Result<(), Error> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Error> {
        self.out.flush()?;
        Ok(())
    }
}
