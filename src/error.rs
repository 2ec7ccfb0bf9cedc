//! Error types for the tray_scan library

use thiserror::Error;

/// Result type alias for tray_scan operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Comprehensive error types for tray analysis operations
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Object detector is missing or failed to produce a result
    #[error("Detector unavailable: {reason}")]
    DetectorUnavailable {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Image payload could not be decoded
    #[error("Invalid image: {message}")]
    InvalidImage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration could not be loaded or serialized
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },

    /// Generic processing error
    #[error("Processing error: {0}")]
    ProcessingError(String),
}

impl AnalysisError {
    /// Create a detector-unavailable error with context
    pub fn detector_unavailable<E>(reason: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::DetectorUnavailable {
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a detector-unavailable error without an underlying cause
    pub fn detector_missing(reason: impl Into<String>) -> Self {
        Self::DetectorUnavailable {
            reason: reason.into(),
            source: None,
        }
    }

    /// Create an invalid-image error with context
    pub fn invalid_image<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::InvalidImage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error with context
    pub fn config<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ConfigError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Check if this error indicates a recoverable condition
    ///
    /// A detector outage is transient from the caller's point of view; a bad
    /// image payload is not going to get better on retry.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AnalysisError::DetectorUnavailable { .. })
    }

    /// Get user-friendly error description for application display
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::DetectorUnavailable { .. } => {
                "The item detector is currently unavailable. Please try again shortly.".to_string()
            }
            AnalysisError::InvalidImage { .. } => {
                "Could not read the image. Please check the file format and try again.".to_string()
            }
            AnalysisError::ConfigError { .. } | AnalysisError::InvalidParameter { .. } => {
                "The analysis service is misconfigured. Please contact an administrator.".to_string()
            }
            AnalysisError::ProcessingError(_) => {
                "Tray analysis failed. Please try with a different photo.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detector_unavailable_is_recoverable() {
        let err = AnalysisError::detector_missing("model not loaded");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_invalid_image_is_not_recoverable() {
        let err = AnalysisError::InvalidImage {
            message: "truncated JPEG".into(),
            source: None,
        };
        assert!(!err.is_recoverable());
        assert!(err.user_message().contains("image"));
    }

    #[test]
    fn test_error_display() {
        let err = AnalysisError::InvalidParameter {
            parameter: "roi_scales".into(),
            value: "[]".into(),
        };
        assert_eq!(err.to_string(), "Invalid parameter: roi_scales = []");
    }
}
