//! Error type shared by ingestion, export and the session reducer.

/// Every failure the crate reports.
///
/// Ingestion and export failures are terminal for the one operation that
/// raised them; callers keep their previous state.
#[derive(Debug, thiserror::Error)]
pub enum GradeError {
    /// The source file could not be read as a workbook.
    #[error("failed to read workbook: {message}")]
    Ingest { message: String },

    /// The updated workbook could not be produced.
    #[error("failed to export workbook: {message}")]
    Export { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An environment variable or argument held an unusable value.
    #[error("config error: {message}")]
    Config { message: String },

    #[error("no workbook is loaded")]
    NoWorkbook,

    /// Another load or export is still running.
    #[error("busy: {0}")]
    Busy(&'static str),

    #[error("sheet index {0} is out of range")]
    SheetOutOfRange(usize),

    #[error("unknown question '{0}', expected q21..q30")]
    UnknownQuestion(String),

    #[error("unknown grade '{0}'")]
    UnknownGrade(String),
}

pub type Result<T> = std::result::Result<T, GradeError>;

impl GradeError {
    pub fn ingest(msg: impl Into<String>) -> Self {
        Self::Ingest {
            message: msg.into(),
        }
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}

impl From<calamine::Error> for GradeError {
    fn from(e: calamine::Error) -> Self {
        Self::ingest(e.to_string())
    }
}
