//! AppError - unified application error type
//!
//! Separates input errors (bad paths, undecodable files), configuration
//! errors (rejected at the setter boundary, never clamped) and I/O
//! failures. Build invariant violations (metric called without its table,
//! applying a tree that was never built) are contract bugs and panic
//! instead of surfacing here.

use crate::types::{IterationError, ThresholdError};
use std::fmt;
use std::path::PathBuf;

/// How a failed operation should be treated by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Abort the session; nothing sensible to retry.
    Fatal,
    /// A corrected configuration can be retried.
    Recoverable,
}

#[derive(Debug)]
pub enum AppError {
    FileNotFound {
        path: PathBuf,
    },

    /// Extension outside the accepted raster family.
    UnsupportedExtension {
        path: PathBuf,
    },

    DecodeError {
        path: PathBuf,
        reason: String,
    },

    /// Fewer than 3 channels (grayscale input is not supported).
    UnsupportedChannelCount {
        path: PathBuf,
        channels: u8,
    },

    InvalidThreshold(ThresholdError),

    /// Target compression fraction outside [0, 1].
    InvalidTargetCompression {
        value: f64,
    },

    /// Minimum block area must be at least one pixel.
    InvalidMinBlockSize {
        value: u32,
    },

    /// Output extension does not match the input format family.
    OutputExtensionMismatch {
        expected: String,
        actual: String,
    },

    /// A required session field was never set.
    MissingConfiguration {
        what: &'static str,
    },

    EncodeError {
        reason: String,
    },

    GifError {
        reason: String,
    },

    FileWriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    Io(std::io::Error),

    Other(anyhow::Error),
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::FileNotFound { .. }
            | AppError::DecodeError { .. }
            | AppError::UnsupportedChannelCount { .. }
            | AppError::EncodeError { .. }
            | AppError::GifError { .. }
            | AppError::FileWriteError { .. }
            | AppError::Io(_)
            | AppError::Other(_) => ErrorCategory::Fatal,

            AppError::UnsupportedExtension { .. }
            | AppError::InvalidThreshold(_)
            | AppError::InvalidTargetCompression { .. }
            | AppError::InvalidMinBlockSize { .. }
            | AppError::OutputExtensionMismatch { .. }
            | AppError::MissingConfiguration { .. } => ErrorCategory::Recoverable,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            AppError::FileNotFound { path } => {
                format!("❌ File not found: {}", path.display())
            }
            AppError::UnsupportedExtension { path } => {
                format!(
                    "❌ Unsupported extension: {}\n💡 Accepted: .png .jpg .jpeg .bmp .hdr .tga (input), .gif (animation)",
                    path.display()
                )
            }
            AppError::DecodeError { path, reason } => {
                format!("❌ Cannot decode {}: {}", path.display(), reason)
            }
            AppError::UnsupportedChannelCount { path, channels } => {
                format!(
                    "❌ {} has {} channel(s); at least 3 (RGB) are required",
                    path.display(),
                    channels
                )
            }
            AppError::InvalidThreshold(e) => {
                format!("❌ Invalid threshold: {}", e)
            }
            AppError::InvalidTargetCompression { value } => {
                format!("❌ Target compression {} out of range [0, 1]", value)
            }
            AppError::InvalidMinBlockSize { value } => {
                format!("❌ Minimum block size {} must be at least 1", value)
            }
            AppError::OutputExtensionMismatch { expected, actual } => {
                format!(
                    "❌ Output extension .{} does not match input format .{}",
                    actual, expected
                )
            }
            AppError::MissingConfiguration { what } => {
                format!("❌ Missing configuration: {}", what)
            }
            AppError::EncodeError { reason } => {
                format!("❌ Encoding failed: {}", reason)
            }
            AppError::GifError { reason } => {
                format!("❌ GIF write failed: {}", reason)
            }
            AppError::FileWriteError { path, source } => {
                format!("❌ Failed to write {}: {}", path.display(), source)
            }
            AppError::Io(e) => {
                format!("❌ IO error: {}", e)
            }
            AppError::Other(e) => {
                format!("❌ Error: {}", e)
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::FileNotFound { path } => {
                write!(f, "file not found: {}", path.display())
            }
            AppError::UnsupportedExtension { path } => {
                write!(f, "unsupported extension: {}", path.display())
            }
            AppError::DecodeError { path, reason } => {
                write!(f, "cannot decode {}: {}", path.display(), reason)
            }
            AppError::UnsupportedChannelCount { path, channels } => {
                write!(
                    f,
                    "unsupported channel count {} in {}",
                    channels,
                    path.display()
                )
            }
            AppError::InvalidThreshold(e) => write!(f, "invalid threshold: {}", e),
            AppError::InvalidTargetCompression { value } => {
                write!(f, "target compression {} out of range [0, 1]", value)
            }
            AppError::InvalidMinBlockSize { value } => {
                write!(f, "minimum block size {} must be at least 1", value)
            }
            AppError::OutputExtensionMismatch { expected, actual } => {
                write!(
                    f,
                    "output extension .{} does not match input format .{}",
                    actual, expected
                )
            }
            AppError::MissingConfiguration { what } => {
                write!(f, "missing configuration: {}", what)
            }
            AppError::EncodeError { reason } => write!(f, "encoding failed: {}", reason),
            AppError::GifError { reason } => write!(f, "gif write failed: {}", reason),
            AppError::FileWriteError { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            AppError::Io(e) => write!(f, "io error: {}", e),
            AppError::Other(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::FileWriteError { source, .. } => Some(source),
            AppError::Io(e) => Some(e),
            AppError::InvalidThreshold(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e)
    }
}

impl From<ThresholdError> for AppError {
    fn from(e: ThresholdError) -> Self {
        AppError::InvalidThreshold(e)
    }
}

impl From<IterationError> for AppError {
    fn from(e: IterationError) -> Self {
        AppError::Other(anyhow::anyhow!(e))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Other(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_split() {
        let err = AppError::FileNotFound {
            path: PathBuf::from("/x.png"),
        };
        assert_eq!(err.category(), ErrorCategory::Fatal);

        let err = AppError::InvalidTargetCompression { value: 1.5 };
        assert_eq!(err.category(), ErrorCategory::Recoverable);

        let err = AppError::OutputExtensionMismatch {
            expected: "png".to_string(),
            actual: "jpg".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Recoverable);
    }

    #[test]
    fn test_user_message_mentions_path() {
        let err = AppError::DecodeError {
            path: PathBuf::from("/photos/a.png"),
            reason: "truncated".to_string(),
        };
        let msg = err.user_message();
        assert!(msg.contains("/photos/a.png"));
        assert!(msg.contains("truncated"));
    }

    #[test]
    fn test_from_threshold_error() {
        let threshold_err = ThresholdError::OutOfRange {
            value: 9.0,
            lower: 0.0,
            upper: 1.0,
        };
        let err: AppError = threshold_err.into();
        assert!(matches!(err, AppError::InvalidThreshold(_)));
        assert_eq!(err.category(), ErrorCategory::Recoverable);
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: AppError = io.into();
        assert!(matches!(err, AppError::Io(_)));
    }
}
