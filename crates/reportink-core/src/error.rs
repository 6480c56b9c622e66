//! Error types for the editing engine.

use crate::element::ElementId;
use thiserror::Error;

/// Errors raised by editor operations that reference elements.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EditorError {
    #[error("Element not found: {0}")]
    ElementNotFound(ElementId),
    #[error("Element {0} already exists")]
    DuplicateElement(ElementId),
    #[error("Element {0} is read-only and cannot be moved")]
    ReadOnly(ElementId),
    #[error("Element {0} is locked and cannot be resized")]
    Locked(ElementId),
    #[error("A gesture is already in progress")]
    GestureActive,
}

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Errors raised while applying a command during undo or redo.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HistoryError {
    #[error("Snapshot references missing element {0}")]
    MissingElement(ElementId),
    #[error("Cannot restore element {0}: it is already present")]
    AlreadyPresent(ElementId),
    #[error("Command has no redo state")]
    MissingAfterState,
}

/// Errors raised while loading editor configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
