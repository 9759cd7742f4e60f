mod config;
mod consolidate;
mod docx;
mod error;
mod extract;
mod model;
mod record;
pub mod report;

pub use config::{Config, IgnoredFormats, ResponseConfig};
pub use consolidate::{EMPTY_COMMENT, clean_text, consolidate};
pub use docx::{
    AttrValues, COMMENTS_EXTENDED_PART, COMMENTS_PART, DOCUMENT_PART, DocxParts, ENDNOTES_PART,
    FOOTNOTES_PART, ParsedDocx, PropMap, STYLES_PART, StyleDef, StyleProps, decode_props,
    resolve_style,
};
pub use error::Error;
pub use extract::DocumentComments;
pub use model::{CommentDate, CommentParagraph, CommentRecord, FormatSet, ResolvedRun};
pub use record::{BubbleInfo, FilenameInfo, number_records};

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;

/// Extracts the top-level comments of one DOCX file.
pub fn extract_comments(input: &Path, config: &Config) -> Result<Vec<CommentRecord>, Error> {
    let t0 = Instant::now();
    let parts = DocxParts::open(input)?;
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    extract_parts(&parts, &file_name, config, t0)
}

/// Like [`extract_comments`] for a DOCX package already in memory.
pub fn extract_comments_bytes(
    input: &[u8],
    file_name: &str,
    config: &Config,
) -> Result<Vec<CommentRecord>, Error> {
    let t0 = Instant::now();
    let parts = DocxParts::from_bytes(input)?;
    extract_parts(&parts, file_name, config, t0)
}

fn extract_parts(
    parts: &DocxParts,
    file_name: &str,
    config: &Config,
    t0: Instant,
) -> Result<Vec<CommentRecord>, Error> {
    let t_read = t0.elapsed();

    let parsed = parts.parse()?;
    let t_parse = t0.elapsed();

    let comments = DocumentComments::new(&parsed, file_name, config)?;
    let records: Vec<CommentRecord> = comments.records().collect();
    let t_total = t0.elapsed();

    log::debug!(
        "{file_name}: read={:.1}ms, parse={:.1}ms, resolve={:.1}ms, total={:.1}ms ({} records)",
        t_read.as_secs_f64() * 1000.0,
        (t_parse - t_read).as_secs_f64() * 1000.0,
        (t_total - t_parse).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        records.len(),
    );

    Ok(records)
}

/// Outcome of [`extract_batch`].
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Records of every successful document, numbered across the batch.
    pub records: Vec<CommentRecord>,
    /// Documents that could not be processed, in input order.
    pub failures: Vec<(PathBuf, Error)>,
    /// Number of documents that were processed successfully.
    pub documents: usize,
}

/// Processes `inputs` in parallel. A failing document contributes no
/// records and does not stop the others; records keep input order.
pub fn extract_batch(inputs: &[PathBuf], config: &Config) -> BatchReport {
    let results: Vec<(PathBuf, Result<Vec<CommentRecord>, Error>)> = inputs
        .par_iter()
        .map(|path| (path.clone(), extract_comments(path, config)))
        .collect();

    let mut report = BatchReport::default();
    for (path, result) in results {
        match result {
            Ok(records) => {
                report.records.extend(records);
                report.documents += 1;
            }
            Err(e) => report.failures.push((path, e)),
        }
    }
    number_records(&mut report.records);
    report
}
