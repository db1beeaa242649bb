//! Errors raised while reading or writing messages.

use core::fmt;
use std::io;

use protojson_value::ValueError;

use crate::scanner::{ScanError, ScanErrorKind};
use crate::{Span, Token};

/// A read or write call failed.
///
/// The error always aborts the whole call: no partially read message is
/// handed back, and an output stream may hold a truncated document.
#[derive(Debug)]
pub struct CodecError {
    /// The specific kind of error
    pub kind: CodecErrorKind,
    /// Input span the error points at, for read errors
    pub span: Option<Span>,
}

/// Specific error kinds.
#[derive(Debug)]
pub enum CodecErrorKind {
    /// The input is not well-formed JSON
    Syntax(ScanErrorKind),
    /// Well-formed JSON, but not the token the message structure calls for
    UnexpectedToken {
        /// What the codec was looking for
        expected: &'static str,
        /// What it found
        got: String,
    },
    /// The input ended before the value was complete
    UnexpectedEof {
        /// What the codec was looking for
        expected: &'static str,
    },
    /// A scalar that cannot be converted to its field's kind
    InvalidScalar {
        /// The field kind, e.g. `int32`
        kind: &'static str,
        /// The offending text
        value: String,
        /// Why it was rejected
        reason: &'static str,
    },
    /// A symbol or number that the enum does not define
    UnknownEnumValue {
        /// The enum type
        enum_name: String,
        /// The offending symbol or number
        value: String,
        /// A close symbol, if there is one
        suggestion: Option<String>,
    },
    /// A `bytes` value that is not valid base64
    InvalidBytes {
        /// What the decoder reported
        reason: String,
    },
    /// The type name is not known to the codec
    UnknownMessageType {
        /// The requested type
        type_name: String,
    },
    /// A message of one type was handed to a call for another
    MessageTypeMismatch {
        /// The type the call was made for
        expected: String,
        /// The type of the message supplied
        got: String,
    },
    /// A decoded value could not be stored in the message
    Value(ValueError),
    /// A token write that would produce malformed JSON
    InvalidWriterState {
        /// What was wrong with the call sequence
        reason: &'static str,
    },
    /// Non-whitespace input after the top-level value
    TrailingCharacters,
    /// Objects and arrays nested deeper than the reader allows
    DepthLimitExceeded {
        /// The reader's maximum depth
        limit: usize,
    },
    /// The underlying reader or writer failed
    Io(io::Error),
}

impl CodecError {
    /// Creates an error pointing at `span`.
    pub const fn new(kind: CodecErrorKind, span: Span) -> Self {
        Self {
            kind,
            span: Some(span),
        }
    }

    /// Creates an error without a location.
    pub const fn without_span(kind: CodecErrorKind) -> Self {
        Self { kind, span: None }
    }

    pub(crate) const fn at(kind: CodecErrorKind, span: Option<Span>) -> Self {
        Self { kind, span }
    }

    /// The error for finding `got` where `expected` should be.
    pub fn unexpected(expected: &'static str, got: &Token, span: Option<Span>) -> Self {
        let kind = match got {
            Token::Eof => CodecErrorKind::UnexpectedEof { expected },
            other => CodecErrorKind::UnexpectedToken {
                expected,
                got: other.describe(),
            },
        };
        Self::at(kind, span)
    }

    pub(crate) fn invalid_scalar(
        kind: &'static str,
        value: impl Into<String>,
        reason: &'static str,
        span: Option<Span>,
    ) -> Self {
        Self::at(
            CodecErrorKind::InvalidScalar {
                kind,
                value: value.into(),
                reason,
            },
            span,
        )
    }

    pub(crate) fn writer_state(reason: &'static str) -> Self {
        Self::without_span(CodecErrorKind::InvalidWriterState { reason })
    }

    /// Stable identifier for this class of error.
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// The underlying stream failed.
    pub const fn is_io(&self) -> bool {
        matches!(self.kind, CodecErrorKind::Io(_))
    }

    /// The input is not well-formed JSON.
    pub const fn is_syntax(&self) -> bool {
        matches!(self.kind, CodecErrorKind::Syntax(_))
    }

    /// The JSON is well-formed but its shape does not fit the message.
    pub const fn is_structural(&self) -> bool {
        matches!(
            self.kind,
            CodecErrorKind::UnexpectedToken { .. }
                | CodecErrorKind::UnexpectedEof { .. }
                | CodecErrorKind::TrailingCharacters
                | CodecErrorKind::DepthLimitExceeded { .. }
        )
    }

    /// A value could not be converted to its field's kind.
    pub const fn is_scalar(&self) -> bool {
        matches!(
            self.kind,
            CodecErrorKind::InvalidScalar { .. }
                | CodecErrorKind::UnknownEnumValue { .. }
                | CodecErrorKind::InvalidBytes { .. }
        )
    }
}

impl CodecErrorKind {
    /// Stable identifier for this class of error.
    pub const fn code(&self) -> &'static str {
        match self {
            CodecErrorKind::Syntax(_) => "protojson::syntax",
            CodecErrorKind::UnexpectedToken { .. } => "protojson::unexpected_token",
            CodecErrorKind::UnexpectedEof { .. } => "protojson::unexpected_eof",
            CodecErrorKind::InvalidScalar { .. } => "protojson::invalid_scalar",
            CodecErrorKind::UnknownEnumValue { .. } => "protojson::unknown_enum_value",
            CodecErrorKind::InvalidBytes { .. } => "protojson::invalid_bytes",
            CodecErrorKind::UnknownMessageType { .. } => "protojson::unknown_message_type",
            CodecErrorKind::MessageTypeMismatch { .. } => "protojson::message_type_mismatch",
            CodecErrorKind::Value(_) => "protojson::value",
            CodecErrorKind::InvalidWriterState { .. } => "protojson::invalid_writer_state",
            CodecErrorKind::TrailingCharacters => "protojson::trailing_characters",
            CodecErrorKind::DepthLimitExceeded { .. } => "protojson::depth_limit_exceeded",
            CodecErrorKind::Io(_) => "protojson::io",
        }
    }

    /// Short description of what the span points at.
    pub fn label(&self) -> String {
        match self {
            CodecErrorKind::Syntax(e) => e.to_string(),
            CodecErrorKind::UnexpectedToken { expected, got } => {
                format!("expected {expected}, got {got}")
            }
            CodecErrorKind::UnexpectedEof { expected } => format!("expected {expected}"),
            CodecErrorKind::InvalidScalar { kind, reason, .. } => format!("{reason} for {kind}"),
            CodecErrorKind::UnknownEnumValue { suggestion, .. } => match suggestion {
                Some(s) => format!("unknown enum value, did you mean `{s}`?"),
                None => "unknown enum value".into(),
            },
            CodecErrorKind::InvalidBytes { .. } => "invalid base64".into(),
            CodecErrorKind::UnknownMessageType { .. } => "unknown message type".into(),
            CodecErrorKind::MessageTypeMismatch { .. } => "wrong message type".into(),
            CodecErrorKind::Value(_) => "value does not fit its field".into(),
            CodecErrorKind::InvalidWriterState { reason } => (*reason).into(),
            CodecErrorKind::TrailingCharacters => "unexpected input after the value".into(),
            CodecErrorKind::DepthLimitExceeded { limit } => format!("nested deeper than {limit}"),
            CodecErrorKind::Io(_) => "I/O error".into(),
        }
    }
}

impl fmt::Display for CodecErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecErrorKind::Syntax(e) => write!(f, "invalid JSON: {e}"),
            CodecErrorKind::UnexpectedToken { expected, got } => {
                write!(f, "unexpected token: got {got}, expected {expected}")
            }
            CodecErrorKind::UnexpectedEof { expected } => {
                write!(f, "unexpected end of input, expected {expected}")
            }
            CodecErrorKind::InvalidScalar {
                kind,
                value,
                reason,
            } => write!(f, "invalid {kind} value `{value}`: {reason}"),
            CodecErrorKind::UnknownEnumValue {
                enum_name,
                value,
                suggestion,
            } => {
                write!(f, "`{value}` is not a value of enum `{enum_name}`")?;
                if let Some(suggested) = suggestion {
                    write!(f, " (did you mean `{suggested}`?)")?;
                }
                Ok(())
            }
            CodecErrorKind::InvalidBytes { reason } => {
                write!(f, "invalid base64 in bytes field: {reason}")
            }
            CodecErrorKind::UnknownMessageType { type_name } => {
                write!(f, "unknown message type `{type_name}`")
            }
            CodecErrorKind::MessageTypeMismatch { expected, got } => {
                write!(f, "expected a `{expected}` message, got `{got}`")
            }
            CodecErrorKind::Value(e) => write!(f, "{e}"),
            CodecErrorKind::InvalidWriterState { reason } => {
                write!(f, "invalid token sequence: {reason}")
            }
            CodecErrorKind::TrailingCharacters => {
                f.write_str("trailing characters after the top-level value")
            }
            CodecErrorKind::DepthLimitExceeded { limit } => {
                write!(f, "input nests objects and arrays deeper than {limit} levels")
            }
            CodecErrorKind::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(span) = self.span {
            write!(f, " at {span}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            CodecErrorKind::Io(e) => Some(e),
            CodecErrorKind::Value(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CodecError {
    fn from(err: io::Error) -> Self {
        Self::without_span(CodecErrorKind::Io(err))
    }
}

impl From<ValueError> for CodecError {
    fn from(err: ValueError) -> Self {
        Self::without_span(CodecErrorKind::Value(err))
    }
}

impl From<ScanError> for CodecError {
    fn from(err: ScanError) -> Self {
        Self::new(CodecErrorKind::Syntax(err.kind), err.span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protojson_testhelpers::test;

    #[test]
    fn unexpected_eof_is_its_own_kind() {
        let err = CodecError::unexpected("'{'", &Token::Eof, None);
        assert_eq!(err.code(), "protojson::unexpected_eof");
        assert!(err.is_structural());

        let err = CodecError::unexpected("'{'", &Token::StartArray, Some(Span::new(3, 1)));
        assert_eq!(err.to_string(), "unexpected token: got '[', expected '{' at 3..4");
    }

    #[test]
    fn classification() {
        let io = CodecError::from(io::Error::other("disk on fire"));
        assert!(io.is_io());
        assert!(!io.is_structural());
        assert!(std::error::Error::source(&io).is_some());

        let scalar = CodecError::invalid_scalar("int32", "1.5", "not an integer", None);
        assert!(scalar.is_scalar());
        assert_eq!(scalar.to_string(), "invalid int32 value `1.5`: not an integer");
    }

    #[test]
    fn enum_suggestion_in_message() {
        let err = CodecError::without_span(CodecErrorKind::UnknownEnumValue {
            enum_name: "Status".into(),
            value: "COMPLETE".into(),
            suggestion: Some("COMPLETED".into()),
        });
        assert_eq!(
            err.to_string(),
            "`COMPLETE` is not a value of enum `Status` (did you mean `COMPLETED`?)"
        );
        assert_eq!(err.kind.label(), "unknown enum value, did you mean `COMPLETED`?");
    }
}
