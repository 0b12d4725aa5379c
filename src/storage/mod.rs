//! Persistent storage
//!
//! This module handles data persistence for settings and input history,
//! plus model-file management (scanning, deletion, downloads).

pub mod huggingface;
pub mod models;
pub mod settings;

use directories::ProjectDirs;
use std::path::PathBuf;
use thiserror::Error;

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Could not determine application data directory")]
    NoDataDir,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Invalid scan pattern: {0}")]
    Pattern(String),
}

/// Get the application data directory, creating nothing.
pub fn get_data_dir() -> Result<PathBuf, StorageError> {
    ProjectDirs::from("com", "llamahelm", "LlamaHelm")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(StorageError::NoDataDir)
}
