use thiserror::Error;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Recoverable failures at the boundary of the core: streams, files and
/// configuration. Caller bugs (wrong vector lengths, empty batches, backward
/// without forward) are not represented here; they panic.
#[derive(Error, Debug)]
pub enum Error {
    /// Reading or writing a file or stream failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A spec or config file is not valid JSON for its type.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The parameter stream ended in the middle of a layer record.
    #[error("parameter stream truncated inside layer {layer}")]
    TruncatedStream { layer: usize },

    /// A layer record declares dimensions that cannot describe a layer.
    #[error("layer {layer} has invalid dimensions {input_count}x{output_count}")]
    InvalidDimensions {
        layer: usize,
        input_count: i64,
        output_count: i64,
    },

    /// A layer record does not match the dimensions the caller expects.
    #[error("layer {layer}: expected {expected:?} (inputs, outputs), found {found:?}")]
    DimensionMismatch {
        layer: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Bytes remain after the last expected layer record.
    #[error("parameter stream has trailing data after {layers} layers")]
    TrailingData { layers: usize },

    /// A list of layer dimensions that cannot form a chain.
    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    /// A parameter became NaN or infinite.
    #[error("non-finite parameter {value} at layer {layer}, index {index}")]
    NonFinite { layer: usize, index: usize, value: f32 },
}
