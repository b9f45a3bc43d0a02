//! Error types for tablegen
//!
//! This module defines a comprehensive error hierarchy that covers:
//! - Configuration and CLI errors
//! - Schema derivation errors (DDL, comment options, decimal shapes)
//! - Object storage errors
//! - Worker/concurrency errors
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Errors should be actionable - include the column, path, or option
//!   that caused them
//! - Preserve error chains for debugging

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the tablegen application
#[derive(Error, Debug)]
pub enum TableGenError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Schema derivation errors
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Object storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// Parquet encoding errors
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Interrupted by signal
    #[error("Operation interrupted by signal")]
    Interrupted,

    /// Channel closed unexpectedly
    #[error("Chunk channel closed unexpectedly")]
    ChannelClosed,
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config '{path}': {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    /// Config file could not be parsed as TOML
    #[error("Failed to parse config '{path}': {reason}")]
    ParseFailed { path: PathBuf, reason: String },

    /// One or more invalid config values, collected in one pass
    #[error("invalid config:\n{}", .0.iter().map(|e| format!(" - {e}")).collect::<Vec<_>>().join("\n"))]
    Invalid(Vec<String>),

    /// Human-size string could not be parsed
    #[error("Invalid size '{value}': {reason}")]
    InvalidSize { value: String, reason: String },

    /// Invalid thread count
    #[error("Invalid thread count {count}: must be between 1 and {max}")]
    InvalidThreadCount { count: usize, max: usize },

    /// A required flag was not provided for the selected operation
    #[error("Missing required flag --{flag} for operation '{op}'")]
    MissingFlag { flag: &'static str, op: &'static str },
}

/// Schema derivation errors
#[derive(Error, Debug)]
pub enum SchemaError {
    /// SQL file could not be read
    #[error("Failed to read SQL file '{path}': {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    /// Statement is not a CREATE TABLE
    #[error("Not a CREATE TABLE statement")]
    NotCreateTable,

    /// DDL text could not be parsed
    #[error("Failed to parse CREATE TABLE: {0}")]
    Parse(String),

    /// Column type is not supported by the generator
    #[error("Unsupported column type '{sql_type}' for column '{column}'")]
    UnsupportedType { column: String, sql_type: String },

    /// Column comment options are malformed
    #[error("Malformed comment for column '{column}': {comment:?}")]
    MalformedComment { column: String, comment: String },

    /// A recognized comment option carries an invalid value
    #[error("Invalid {key} for column '{column}': {value:?}")]
    InvalidOption {
        column: String,
        key: &'static str,
        value: String,
    },

    /// Decimal precision/scale out of range
    #[error("Invalid decimal for column '{column}': {reason}")]
    InvalidDecimal { column: String, reason: String },
}

/// Object storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to create an object for writing
    #[error("Failed to create object '{path}': {reason}")]
    CreateFailed { path: String, reason: String },

    /// Write to an object failed
    #[error("Failed to write object '{path}': {reason}")]
    WriteFailed { path: String, reason: String },

    /// Close/finalize of an object failed
    #[error("Failed to close object '{path}': {reason}")]
    CloseFailed { path: String, reason: String },

    /// Listing objects failed
    #[error("Failed to list objects under '{path}': {reason}")]
    WalkFailed { path: String, reason: String },

    /// Deleting an object failed
    #[error("Failed to delete object '{path}': {reason}")]
    DeleteFailed { path: String, reason: String },

    /// The path names a backend this build cannot construct
    #[error("Unsupported storage backend '{scheme}': cloud stores are provided externally via the ObjectStore interface")]
    UnsupportedBackend { scheme: String },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// A generator or uploader thread panicked
    #[error("Worker thread panicked while processing file {file_no}")]
    Panicked { file_no: u64 },

    /// Chunk send failed because the uploader went away
    #[error("Uploader for file {file_no} stopped before the producer finished")]
    UploaderGone { file_no: u64 },
}

/// Result type alias for TableGenError
pub type Result<T> = std::result::Result<T, TableGenError>;

/// Result type alias for SchemaError
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

/// Result type alias for StorageError
pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_list_display() {
        let err = ConfigError::Invalid(vec![
            "common.path is required".to_string(),
            "common.rows must be greater than 0".to_string(),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("invalid config:"));
        assert!(msg.contains(" - common.path is required"));
        assert!(msg.contains(" - common.rows must be greater than 0"));
    }

    #[test]
    fn test_error_conversion() {
        let schema_err = SchemaError::UnsupportedType {
            column: "c0".into(),
            sql_type: "geometry".into(),
        };
        let top: TableGenError = schema_err.into();
        assert!(matches!(top, TableGenError::Schema(_)));
    }
}
