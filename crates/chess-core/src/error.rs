//! Error types for parsing, upload validation and navigation.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PgnError {
    #[error("empty input")]
    EmptyInput,

    #[error("unreadable game record: {0}")]
    Unreadable(String),
}

/// Why an uploaded game record was refused. The display text is shown to the
/// uploader as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadRejection {
    #[error("file must be {}", allowed_list(.allowed))]
    InvalidExtension { allowed: Vec<String> },

    #[error("empty file")]
    EmptyFile,

    #[error("errors encountered while parsing: {}", .details.join("; "))]
    ParseErrors { details: Vec<String> },

    #[error("unable to parse first move")]
    UnparseableFirstMove,
}

fn allowed_list(allowed: &[String]) -> String {
    allowed
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(" or ")
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("File with game id {0} does not exist")]
    NotFound(i64),

    #[error("stored game record is empty")]
    EmptyRecord,

    #[error("no game is being viewed")]
    NotViewing,
}
