//! Template engine error types

use thiserror::Error;

/// Template loading and rendering errors
#[derive(Debug, Error)]
pub enum ThemeError {
    /// Template parse or render error
    #[error("Template error: {0}")]
    TemplateError(String),

    /// IO error while reading the override directory
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
