//! Errors for structural API misuse. Numeric input never fails; it is
//! normalized at the boundary instead.

use thiserror::Error;

use crate::sprite::ImageId;

/// Rejected packed batch buffers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BatchError {
    #[error("batch buffer truncated: expected at least {expected} values, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("invalid {section} record count: {value}")]
    InvalidCount { section: &'static str, value: f64 },
}

#[derive(Debug, Error)]
pub enum InterpError {
    #[error("unknown sprite '{id}'")]
    UnknownSprite { id: String },
    #[error("sprite '{id}' already exists")]
    DuplicateSprite { id: String },
    #[error("sprite '{sprite}' has no image {image}")]
    UnknownImage { sprite: String, image: ImageId },
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, InterpError>;
