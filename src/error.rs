use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Invalid DOCX: {0}")]
    InvalidDocx(String),

    /// Start anchors, end anchors and comment metadata entries disagree.
    #[error(
        "comment data appears corrupt: {starts} range starts, {ends} range ends, {comments} comments"
    )]
    Integrity {
        starts: usize,
        ends: usize,
        comments: usize,
    },

    #[error("comment {id} does not have exactly one start and one end anchor")]
    UnpairedAnchor { id: u32 },

    #[error("style '{style_id}' has a cyclic basedOn chain")]
    StyleCycle { style_id: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Structural errors abort the current document only.
    pub fn is_structural(&self) -> bool {
        matches!(self, Error::Integrity { .. } | Error::UnpairedAnchor { .. })
    }
}
