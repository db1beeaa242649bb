//! The token-level boundary between the message codec and JSON text.

use core::fmt;

use crate::CodecError;

/// A byte range in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Offset of the first byte
    pub offset: usize,
    /// Length in bytes
    pub len: usize,
}

impl Span {
    /// Creates a span.
    pub const fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// Offset one past the last byte.
    pub const fn end(&self) -> usize {
        self.offset + self.len
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.offset, self.end())
    }
}

/// A JSON token as seen by the message codec.
///
/// Object keys are reported as [`Token::FieldName`], distinct from string
/// values. Numbers keep their raw text, so each field kind can parse it at
/// its own width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `{`
    StartObject,
    /// `}`
    EndObject,
    /// `[`
    StartArray,
    /// `]`
    EndArray,
    /// An object key, unescaped
    FieldName(String),
    /// A string value, unescaped
    String(String),
    /// A number value, as written in the input
    Number(String),
    /// `true` or `false`
    Bool(bool),
    /// `null`
    Null,
    /// No more tokens
    Eof,
}

impl Token {
    /// How the token reads in an error message.
    pub fn describe(&self) -> String {
        match self {
            Token::StartObject => "'{'".into(),
            Token::EndObject => "'}'".into(),
            Token::StartArray => "'['".into(),
            Token::EndArray => "']'".into(),
            Token::FieldName(name) => format!("field name {name:?}"),
            Token::String(s) => format!("string {s:?}"),
            Token::Number(raw) => format!("number {raw}"),
            Token::Bool(b) => b.to_string(),
            Token::Null => "null".into(),
            Token::Eof => "end of input".into(),
        }
    }
}

/// Pull side of the token stream.
pub trait TokenReader {
    /// Consumes and returns the next token.
    ///
    /// Once the input is exhausted this keeps returning [`Token::Eof`].
    fn next_token(&mut self) -> Result<Token, CodecError>;

    /// Returns the next token without consuming it.
    fn peek_token(&mut self) -> Result<&Token, CodecError>;

    /// Raw input text of the token most recently returned by
    /// [`next_token`](Self::next_token).
    fn current_text(&self) -> Option<&str>;

    /// Where the token most recently returned by
    /// [`next_token`](Self::next_token) sits in the input.
    fn current_span(&self) -> Option<Span>;
}

impl<T: TokenReader + ?Sized> TokenReader for &mut T {
    fn next_token(&mut self) -> Result<Token, CodecError> {
        (**self).next_token()
    }

    fn peek_token(&mut self) -> Result<&Token, CodecError> {
        (**self).peek_token()
    }

    fn current_text(&self) -> Option<&str> {
        (**self).current_text()
    }

    fn current_span(&self) -> Option<Span> {
        (**self).current_span()
    }
}

/// Push side of the token stream.
///
/// Implementations reject calls that would produce malformed JSON, such as a
/// field name outside an object or an unbalanced end.
pub trait TokenWriter {
    /// Writes `{`.
    fn write_start_object(&mut self) -> Result<(), CodecError>;
    /// Writes `}`.
    fn write_end_object(&mut self) -> Result<(), CodecError>;
    /// Writes `[`.
    fn write_start_array(&mut self) -> Result<(), CodecError>;
    /// Writes `]`.
    fn write_end_array(&mut self) -> Result<(), CodecError>;
    /// Writes an object key; the next write is its value.
    fn write_field_name(&mut self, name: &str) -> Result<(), CodecError>;
    /// Writes a string value, escaping as needed.
    fn write_string(&mut self, value: &str) -> Result<(), CodecError>;
    /// Writes a number value. `raw` must already be valid JSON number text.
    fn write_number(&mut self, raw: &str) -> Result<(), CodecError>;
    /// Writes `true` or `false`.
    fn write_bool(&mut self, value: bool) -> Result<(), CodecError>;
    /// Writes `null`.
    fn write_null(&mut self) -> Result<(), CodecError>;
    /// Pushes buffered output to the underlying sink.
    fn flush(&mut self) -> Result<(), CodecError>;
}

impl<T: TokenWriter + ?Sized> TokenWriter for &mut T {
    fn write_start_object(&mut self) -> Result<(), CodecError> {
        (**self).write_start_object()
    }

    fn write_end_object(&mut self) -> Result<(), CodecError> {
        (**self).write_end_object()
    }

    fn write_start_array(&mut self) -> Result<(), CodecError> {
        (**self).write_start_array()
    }

    fn write_end_array(&mut self) -> Result<(), CodecError> {
        (**self).write_end_array()
    }

    fn write_field_name(&mut self, name: &str) -> Result<(), CodecError> {
        (**self).write_field_name(name)
    }

    fn write_string(&mut self, value: &str) -> Result<(), CodecError> {
        (**self).write_string(value)
    }

    fn write_number(&mut self, raw: &str) -> Result<(), CodecError> {
        (**self).write_number(raw)
    }

    fn write_bool(&mut self, value: bool) -> Result<(), CodecError> {
        (**self).write_bool(value)
    }

    fn write_null(&mut self) -> Result<(), CodecError> {
        (**self).write_null()
    }

    fn flush(&mut self) -> Result<(), CodecError> {
        (**self).flush()
    }
}
