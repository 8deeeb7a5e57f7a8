//! Error types for decoding, scanning and pipeline operations
//!
//! Every failure inside the decode/scan path is expected and transient: a
//! frame may be rejected and the next one retried. Only configuration errors
//! are raised before scanning starts.

use std::fmt;

/// Reed-Solomon correction failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UncorrectableError {
    /// More symbol errors than the redundancy can correct
    #[error("too many errors: capacity is {capacity} symbol errors")]
    CapacityExceeded {
        /// Maximum correctable symbol errors for the size class
        capacity: usize,
    },

    /// Codeword sequence does not match the size class total
    #[error("codeword count mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Codewords required by the size class
        expected: usize,
        /// Codewords supplied
        actual: usize,
    },
}

/// Malformed data codeword stream
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Encodation mode outside the ASCII subset
    #[error("unsupported mode switch codeword {0}")]
    UnsupportedMode(u8),

    /// Codeword value with no meaning in ASCII encodation
    #[error("invalid codeword {0}")]
    InvalidCodeword(u8),

    /// Stream ended in the middle of a construct (or carried nothing)
    #[error("premature end of codeword stream")]
    PrematureEnd,
}

/// Stage of the decoding chain at which a symbol was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeStage {
    /// Mapping matrix geometry / codeword extraction
    Placement,
    /// Reed-Solomon correction
    ErrorCorrection,
    /// Codeword interpretation
    Interpretation,
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DecodeStage::Placement => "placement",
            DecodeStage::ErrorCorrection => "error correction",
            DecodeStage::Interpretation => "interpretation",
        };
        f.write_str(name)
    }
}

/// Reason attached to a [`DecodeFailure`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FailureReason {
    /// Mapping matrix dimensions are not in the symbol size table
    #[error("unsupported mapping matrix {rows}x{cols}")]
    UnsupportedSize {
        /// Rows of the rejected matrix
        rows: usize,
        /// Columns of the rejected matrix
        cols: usize,
    },

    /// Error correction failed
    #[error(transparent)]
    Uncorrectable(#[from] UncorrectableError),

    /// Interpretation failed
    #[error(transparent)]
    Malformed(#[from] DecodeError),
}

/// A symbol that could not be decoded, tagged with the failing stage
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("decode failed at {stage}: {reason}")]
pub struct DecodeFailure {
    /// Stage that rejected the symbol
    pub stage: DecodeStage,
    /// Why it was rejected
    pub reason: FailureReason,
}

impl DecodeFailure {
    pub(crate) fn new(stage: DecodeStage, reason: impl Into<FailureReason>) -> Self {
        Self {
            stage,
            reason: reason.into(),
        }
    }
}

/// Invalid configuration, detected before scanning starts
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No built-in template has this name
    #[error("unknown geometry template '{0}'")]
    UnknownTemplate(String),

    /// Template fields are inconsistent
    #[error("invalid geometry template '{name}': {detail}")]
    InvalidTemplate {
        /// Template name
        name: String,
        /// What is wrong with it
        detail: String,
    },

    /// Template file could not be read
    #[error("failed to read template file: {0}")]
    Io(#[from] std::io::Error),

    /// Template file is not valid JSON for a template
    #[error("failed to parse template: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failure acquiring a frame from a capture device
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// Device could not be opened
    #[error("capture device unavailable: {0}")]
    Unavailable(String),

    /// A frame read failed; the next read may succeed
    #[error("frame read failed: {0}")]
    ReadFailed(String),

    /// Source has no more frames
    #[error("frame source exhausted")]
    Exhausted,

    /// Image file could not be decoded
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Failure of a pipeline unit
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A unit thread panicked
    #[error("{0} unit panicked")]
    UnitPanicked(&'static str),

    /// Scanner could not be configured
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Thread could not be spawned
    #[error("failed to spawn {unit} unit: {source}")]
    Spawn {
        /// Unit name
        unit: &'static str,
        /// OS error
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display_includes_stage() {
        let failure = DecodeFailure::new(
            DecodeStage::ErrorCorrection,
            UncorrectableError::CapacityExceeded { capacity: 3 },
        );
        let text = failure.to_string();
        assert!(text.contains("error correction"));
        assert!(text.contains("3 symbol errors"));
    }

    #[test]
    fn test_reason_from_decode_error() {
        let reason: FailureReason = DecodeError::UnsupportedMode(230).into();
        assert_eq!(reason, FailureReason::Malformed(DecodeError::UnsupportedMode(230)));
    }
}
