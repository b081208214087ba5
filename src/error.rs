use std::path::PathBuf;
use thiserror::Error;

/// The main error type for labelops operations.
#[derive(Debug, Error)]
pub enum LabelOpsError {
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

    #[error("Image list not found: {path}")]
    ListNotFound { path: PathBuf },

    #[error("Input directory not found: {path}")]
    InputDirNotFound { path: PathBuf },

    #[error("Class mapping file not found: {path}")]
    MappingNotFound { path: PathBuf },

    #[error("Failed to parse class mapping {path}: {message}")]
    MappingParse { path: PathBuf, message: String },

    #[error("Invalid class mapping '{input}': {message}")]
    InvalidClassMapping { input: String, message: String },

    #[error("Invalid class list '{input}': {message}")]
    InvalidClassList { input: String, message: String },

    #[error("--delete-classes and --select-classes are mutually exclusive")]
    ConflictingFilters,

    #[error("Invalid shift: {message}")]
    InvalidShift { message: String },

    #[error("Invalid class vocabulary: {message}")]
    InvalidVocabulary { message: String },

    #[error("Could not decode {path} as UTF-8, EUC-KR, CP949 or ASCII")]
    Undecodable { path: PathBuf },

    #[error("Failed to parse JSON from {path}: {source}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unrecognized annotation layout in {path}: {message}")]
    JsonSchema { path: PathBuf, message: String },

    #[error("Failed to write JSON to {path}: {source}")]
    JsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed while traversing {path}: {message}")]
    Walk { path: PathBuf, message: String },

    #[error("Interrupted by user")]
    Interrupted,
}

impl LabelOpsError {
    /// Process exit code for this error: 130 when interrupted, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            LabelOpsError::Interrupted => 130,
            _ => 1,
        }
    }
}
