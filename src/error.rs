use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ConsistencyReport;

/// The main error type for vocset operations.
#[derive(Debug, Error)]
pub enum VocError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corpus path does not exist: {path}")]
    CorpusPathMissing { path: PathBuf },

    #[error("Split item '{id}' is missing its counterpart at {path}")]
    SplitReferenceMissing { id: String, path: PathBuf },

    #[error("Malformed annotation {path}: {message}")]
    MalformedDocument { path: PathBuf, message: String },

    #[error("Annotation {path} has no <object> entries")]
    MissingObjectList { path: PathBuf },

    #[error("Unknown class '{name}' in {path} (object {object_index})")]
    UnknownClass {
        name: String,
        path: PathBuf,
        object_index: usize,
    },

    #[error("Vocabulary file not found: {path}")]
    VocabularyNotFound { path: PathBuf },

    #[error("Failed to parse vocabulary from {path}: {source}")]
    VocabularyParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write vocabulary to {path}: {source}")]
    VocabularyWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid vocabulary {path}: {message}")]
    VocabularyInvalid { path: PathBuf, message: String },

    #[error("Index {index} out of range for corpus of {len} item(s)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Image file not found: {path}")]
    ImageMissing { path: PathBuf },

    #[error("Failed to read image dimensions from {path}: {source}")]
    ImageDimensionRead {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("Image {path} is {width}x{height}, which exceeds the supported size")]
    ImageTooLarge {
        path: PathBuf,
        width: usize,
        height: usize,
    },

    #[error("Unsupported VOC year '{0}' (supported: 2007, 2012)")]
    UnsupportedYear(String),

    #[error("Failed to serialize output: {0}")]
    OutputSerialize(#[source] serde_json::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Consistency check failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ConsistencyReport,
    },

    #[error("Transform failed for item '{id}': {message}")]
    Transform { id: String, message: String },
}
