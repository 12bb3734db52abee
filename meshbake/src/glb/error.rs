use thiserror::Error;

/// Errors building a GLB asset.
///
/// Any of these aborts the conversion; no partial asset is produced.
#[derive(Debug, Error)]
pub enum AssembleError {
    /// The mesh text could not be parsed as geometry.
    #[error("malformed geometry at line {line}: {reason}")]
    MalformedGeometry { line: usize, reason: String },

    /// A face references a vertex attribute that does not exist.
    #[error("line {line}: {kind} index {index} out of range ({count} defined)")]
    IndexOutOfRange {
        line: usize,
        kind: &'static str,
        index: i64,
        count: usize,
    },

    /// The glTF JSON document could not be serialized.
    #[error("failed to serialize glTF document: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The container would exceed the 4 GiB GLB limit.
    #[error("GLB container too large: {0} bytes")]
    TooLarge(usize),
}

/// A byte buffer that is not a well-formed GLB container.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid GLB container: {0}")]
pub struct InvalidGlb(pub &'static str);
