//! Archive error types.

use thiserror::Error;

/// Errors reading a job archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The archive has no entry with the mesh extension.
    #[error("archive contains no {extension} mesh")]
    MissingMesh { extension: String },

    /// The buffer is not a readable ZIP archive.
    #[error("corrupt archive: {0}")]
    Corrupt(String),

    /// A single entry could not be decompressed.
    #[error("failed to read archive entry '{name}': {source}")]
    EntryRead {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(err: zip::result::ZipError) -> Self {
        ArchiveError::Corrupt(err.to_string())
    }
}

/// Errors rewriting the mesh's material reference.
#[derive(Debug, Error)]
pub enum RelinkError {
    /// The mesh bytes are not valid UTF-8 text.
    #[error("mesh '{path}' is not valid UTF-8 text (invalid byte at offset {offset})")]
    Encoding { path: String, offset: usize },
}
