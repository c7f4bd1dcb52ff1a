//! Error types for formfilter.
//!
//! Every failure is local to a single conversion call and carries no
//! partial state. Variants are strongly typed using thiserror so callers
//! (typically an HTTP layer) can map them to user-visible responses.

use thiserror::Error;

/// Errors raised while converting a predicate between encodings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscodeError {
    #[error("Malformed escape sequence at byte {position}: {reason}")]
    MalformedEscapeSequence {
        position: usize,
        reason: String,
    },

    #[error("Invalid timestamp '{input}'")]
    InvalidTimestamp {
        input: String,
    },

    #[error("Unsupported predicate kind '{token}'")]
    UnsupportedPredicateKind {
        token: String,
    },

    #[error("Malformed filter fragment: {reason}")]
    MalformedFilterFragment {
        reason: String,
    },
}

impl TranscodeError {
    /// Creates a malformed-escape error at the given byte offset.
    #[must_use]
    pub fn malformed_escape(position: usize, reason: impl Into<String>) -> Self {
        Self::MalformedEscapeSequence {
            position,
            reason: reason.into(),
        }
    }

    /// Creates an invalid-timestamp error for the offending input.
    #[must_use]
    pub fn invalid_timestamp(input: impl Into<String>) -> Self {
        Self::InvalidTimestamp {
            input: input.into(),
        }
    }

    /// Creates an unsupported-kind error for an unknown JSON token or XML element.
    #[must_use]
    pub fn unsupported(token: impl Into<String>) -> Self {
        Self::UnsupportedPredicateKind {
            token: token.into(),
        }
    }

    /// Creates a malformed-fragment error.
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedFilterFragment {
            reason: reason.into(),
        }
    }

    /// Stable snake_case code for mapping onto caller-facing responses.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MalformedEscapeSequence { .. } => "malformed_escape_sequence",
            Self::InvalidTimestamp { .. } => "invalid_timestamp",
            Self::UnsupportedPredicateKind { .. } => "unsupported_predicate_kind",
            Self::MalformedFilterFragment { .. } => "malformed_filter_fragment",
        }
    }

    /// Returns true if this is an escaping error.
    #[must_use]
    pub const fn is_escape(&self) -> bool {
        matches!(self, Self::MalformedEscapeSequence { .. })
    }

    /// Returns true if this is a timestamp error.
    #[must_use]
    pub const fn is_timestamp(&self) -> bool {
        matches!(self, Self::InvalidTimestamp { .. })
    }

    /// Returns true if the predicate kind was not recognized.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedPredicateKind { .. })
    }

    /// Returns true if the document structure was malformed.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedFilterFragment { .. })
    }

    /// Returns true if this error is retryable.
    ///
    /// A malformed document cannot become well-formed by retrying, so this
    /// is always false.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        false
    }
}

impl From<serde_json::Error> for TranscodeError {
    fn from(e: serde_json::Error) -> Self {
        Self::malformed(format!("invalid JSON: {e}"))
    }
}

/// Result type alias for formfilter operations.
pub type TranscodeResult<T> = Result<T, TranscodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_escape_message() {
        let err = TranscodeError::malformed_escape(7, "trailing backslash");
        let msg = format!("{err}");
        assert!(msg.contains("byte 7"));
        assert!(msg.contains("trailing backslash"));
        assert!(err.is_escape());
    }

    #[test]
    fn test_invalid_timestamp_message() {
        let err = TranscodeError::invalid_timestamp("yesterday");
        assert!(format!("{err}").contains("yesterday"));
        assert!(err.is_timestamp());
    }

    #[test]
    fn test_unsupported_kind() {
        let err = TranscodeError::unsupported("PropertyIsNil");
        assert!(err.is_unsupported());
        assert_eq!(err.kind(), "unsupported_predicate_kind");
    }

    #[test]
    fn test_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: TranscodeError = json_err.into();
        assert!(err.is_malformed());
        assert!(format!("{err}").contains("invalid JSON"));
    }

    #[test]
    fn test_never_retryable() {
        let errors = [
            TranscodeError::malformed_escape(0, "x"),
            TranscodeError::invalid_timestamp("x"),
            TranscodeError::unsupported("x"),
            TranscodeError::malformed("x"),
        ];
        for err in errors {
            assert!(!err.is_retryable());
        }
    }
}
