use thiserror::Error;

/// Errors returned by the clustering engine.
///
/// Degenerate inputs (no samples, one sample, a fully incompatible
/// population) are not errors; they produce empty or all-singleton
/// partitions. Only unusable rule parameters are reported here.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
