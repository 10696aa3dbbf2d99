//! Common error type.
//!
//! Sub-crates either wrap `CoreError` as one variant of their own enum
//! (`cm-store`, `cm-manager`) or return it directly (`cm-cell`, whose only
//! failure modes are invalid input).

use thiserror::Error;

/// Input-validation and configuration errors shared by all `cm-*` crates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid coordinate ({lat}, {lng}): latitude must be in [-90, 90] and longitude in [-180, 180]")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("invalid cell level {0}: supported levels are 0..={max}", max = crate::MAX_LEVEL)]
    InvalidLevel(u8),

    #[error("invalid radius {0} m: must be finite and non-negative")]
    InvalidRadius(f64),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Shorthand result type for `cm-core` and `cm-cell`.
pub type CoreResult<T> = Result<T, CoreError>;
