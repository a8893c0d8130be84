use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum EtlError {
    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("expected file {name} not found in data directory {dir}")]
    MissingFile { dir: String, name: String },

    #[error("expected column {column} not found in header of {file}")]
    MissingColumn { file: String, column: String },

    #[error("malformed delimited input in {file}: {message}")]
    Table { file: String, message: String },

    #[error("malformed JSON document in {file}: {message}")]
    Json { file: String, message: String },

    #[error("failed to store record: {0}")]
    Store(String),

    #[error("failed to load symbol dictionary: {0}")]
    SymbolDictionary(String),

    #[error("failed to load gene list: {0}")]
    GeneList(String),
}
