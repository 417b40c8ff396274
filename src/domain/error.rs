// ============================================================
// Layer 3 — Error Types
// ============================================================
// Typed failures that callers may want to match on.
// Everything else (file I/O, recorder failures) travels as
// anyhow::Error with context attached at the call site.

use thiserror::Error;

/// Invalid command-line or configuration values.
/// Raised before any data is read or any training starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("dataset_name must be `cifar10`, `cifar100`, `svhn` (got `{0}`)")]
    UnknownDataset(String),

    #[error("model must be `cnn` (got `{0}`)")]
    UnknownModel(String),

    #[error("precision must be `16` or `32` (got `{0}`)")]
    UnknownPrecision(String),

    #[error("{name} must be {expected} (got {value})")]
    OutOfRange {
        name:     &'static str,
        expected: &'static str,
        value:    String,
    },
}

/// Malformed model configuration or incompatible tensor shapes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("dimension mismatch in {context}: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        context:  &'static str,
        expected: Vec<usize>,
        actual:   Vec<usize>,
    },

    #[error("invalid model configuration: {0}")]
    InvalidConfig(String),
}
