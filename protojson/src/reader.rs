//! Pull reader over `std::io::Read`.

use std::io::{self, Read};

use crate::scanner::{Lexeme, Scanned, Scanner, decode_string};
use crate::{CodecError, CodecErrorKind, Span, Token, TokenReader, trace};

/// How much to read from the source at a time.
const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// How deeply objects and arrays may nest before reading fails.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Consumed bytes are dropped from the front of the buffer once there are
/// at least this many of them.
const COMPACT_THRESHOLD: usize = 4 * 1024;

#[derive(Debug, Clone, Copy)]
enum Frame {
    Object(ObjectState),
    Array(ArrayState),
}

#[derive(Debug, Clone, Copy)]
enum ObjectState {
    /// Right after `{`
    KeyOrEnd,
    /// After `,`
    Key,
    /// After `"key":`
    Value,
    CommaOrEnd,
}

#[derive(Debug, Clone, Copy)]
enum ArrayState {
    /// Right after `[`
    ValueOrEnd,
    /// After `,`
    Value,
    CommaOrEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Root {
    Pending,
    Complete,
}

/// Reads JSON tokens from any [`Read`] source.
///
/// The source is read in chunks into a growing buffer; consumed input is
/// dropped as the reader moves on, so a long array of messages never has to
/// be in memory all at once. A plain `&[u8]` works as a source.
///
/// The reader accepts exactly one top-level value. Anything but whitespace
/// after it is reported as [`CodecErrorKind::TrailingCharacters`].
///
/// Objects and arrays may nest at most [`DEFAULT_MAX_DEPTH`] levels deep,
/// see [`JsonReader::with_max_depth`]. Messages are read recursively, so the
/// limit also bounds how much stack a read can use.
pub struct JsonReader<R> {
    source: R,
    buf: Vec<u8>,
    /// Input offset of `buf[0]`
    base: usize,
    scanner: Scanner,
    eof: bool,
    chunk_size: usize,
    max_depth: usize,
    stack: Vec<Frame>,
    root: Root,
    peeked: Option<(Token, Span)>,
    current: Option<Span>,
}

impl<R: Read> JsonReader<R> {
    /// Creates a reader over `source`.
    pub fn new(source: R) -> Self {
        Self::with_chunk_size(source, DEFAULT_CHUNK_SIZE)
    }

    /// Creates a reader that pulls `chunk_size` bytes from `source` at a
    /// time.
    pub fn with_chunk_size(source: R, chunk_size: usize) -> Self {
        Self {
            source,
            buf: Vec::new(),
            base: 0,
            scanner: Scanner::new(),
            eof: false,
            chunk_size: chunk_size.max(1),
            max_depth: DEFAULT_MAX_DEPTH,
            stack: Vec::new(),
            root: Root::Pending,
            peeked: None,
            current: None,
        }
    }

    /// Sets how deeply objects and arrays may nest. Going deeper fails with
    /// [`CodecErrorKind::DepthLimitExceeded`].
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Checks that nothing but whitespace follows the top-level value.
    pub fn finish(&mut self) -> Result<(), CodecError> {
        match self.next_token()? {
            Token::Eof => Ok(()),
            _ => Err(CodecError::at(
                CodecErrorKind::TrailingCharacters,
                self.current,
            )),
        }
    }

    /// Input offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.base + self.scanner.pos()
    }

    /// Returns the source. Bytes already buffered are lost.
    pub fn into_inner(self) -> R {
        self.source
    }

    fn refill(&mut self) -> Result<(), CodecError> {
        // grow geometrically while a single token spans several refills
        let pending = self.buf.len() - self.scanner.pos();
        let want = self.chunk_size.max(pending);
        let filled = self.buf.len();
        self.buf.resize(filled + want, 0);
        loop {
            match self.source.read(&mut self.buf[filled..]) {
                Ok(n) => {
                    self.buf.truncate(filled + n);
                    if n == 0 {
                        self.eof = true;
                    }
                    trace!(read = n, buffered = self.buf.len(), "refilled input buffer");
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.buf.truncate(filled);
                    return Err(e.into());
                }
            }
        }
    }

    fn compact(&mut self) {
        // keep the current token's text for current_text()
        let keep_from = self
            .current
            .map_or(self.scanner.pos(), |span| span.offset.saturating_sub(self.base))
            .min(self.scanner.pos());
        if keep_from < COMPACT_THRESHOLD {
            return;
        }
        self.buf.drain(..keep_from);
        self.base += keep_from;
        self.scanner.set_pos(self.scanner.pos() - keep_from);
    }

    fn lex(&mut self) -> Result<Scanned, CodecError> {
        self.compact();
        loop {
            match self.scanner.next(&self.buf, self.eof) {
                Ok(Scanned {
                    lexeme: Lexeme::NeedMore,
                    ..
                }) => self.refill()?,
                Ok(mut scanned) => {
                    scanned.span.offset += self.base;
                    return Ok(scanned);
                }
                Err(mut e) => {
                    e.span.offset += self.base;
                    return Err(e.into());
                }
            }
        }
    }

    fn text(&self, start: usize, end: usize, has_escapes: bool) -> Result<String, CodecError> {
        decode_string(&self.buf, start - self.base, end - self.base, has_escapes).map_err(
            |mut e| {
                e.span.offset += self.base;
                e.into()
            },
        )
    }

    fn unexpected(scanned: &Scanned, expected: &'static str) -> CodecError {
        let kind = match scanned.lexeme {
            Lexeme::Eof | Lexeme::NeedMore => CodecErrorKind::UnexpectedEof { expected },
            other => CodecErrorKind::UnexpectedToken {
                expected,
                got: other.describe().into(),
            },
        };
        CodecError::new(kind, scanned.span)
    }

    fn finish_value_in_parent(&mut self) {
        match self.stack.last_mut() {
            Some(Frame::Object(state)) => *state = ObjectState::CommaOrEnd,
            Some(Frame::Array(state)) => *state = ArrayState::CommaOrEnd,
            None => self.root = Root::Complete,
        }
    }

    fn push(&mut self, frame: Frame, span: Span) -> Result<(), CodecError> {
        if self.stack.len() >= self.max_depth {
            return Err(CodecError::new(
                CodecErrorKind::DepthLimitExceeded {
                    limit: self.max_depth,
                },
                span,
            ));
        }
        self.stack.push(frame);
        Ok(())
    }

    fn set_state(&mut self, frame: Frame) {
        if let Some(top) = self.stack.last_mut() {
            *top = frame;
        }
    }

    /// Turns a lexeme in value position into a token.
    fn begin_value(&mut self, scanned: Scanned) -> Result<(Token, Span), CodecError> {
        let span = scanned.span;
        let token = match scanned.lexeme {
            Lexeme::ObjectStart => {
                self.push(Frame::Object(ObjectState::KeyOrEnd), span)?;
                return Ok((Token::StartObject, span));
            }
            Lexeme::ArrayStart => {
                self.push(Frame::Array(ArrayState::ValueOrEnd), span)?;
                return Ok((Token::StartArray, span));
            }
            Lexeme::String {
                start,
                end,
                has_escapes,
            } => Token::String(self.text(start, end, has_escapes)?),
            Lexeme::Number { start, end } => Token::Number(self.text(start, end, false)?),
            Lexeme::True => Token::Bool(true),
            Lexeme::False => Token::Bool(false),
            Lexeme::Null => Token::Null,
            _ => return Err(Self::unexpected(&scanned, "value")),
        };
        self.finish_value_in_parent();
        Ok((token, span))
    }

    fn produce(&mut self) -> Result<(Token, Span), CodecError> {
        loop {
            let scanned = self.lex()?;
            let span = scanned.span;

            let Some(frame) = self.stack.last().copied() else {
                return match (self.root, scanned.lexeme) {
                    (_, Lexeme::Eof) => Ok((Token::Eof, span)),
                    (Root::Pending, _) => self.begin_value(scanned),
                    (Root::Complete, _) => {
                        Err(CodecError::new(CodecErrorKind::TrailingCharacters, span))
                    }
                };
            };

            match frame {
                Frame::Object(state) => match (state, scanned.lexeme) {
                    (ObjectState::KeyOrEnd | ObjectState::CommaOrEnd, Lexeme::ObjectEnd) => {
                        self.stack.pop();
                        self.finish_value_in_parent();
                        return Ok((Token::EndObject, span));
                    }
                    (
                        ObjectState::KeyOrEnd | ObjectState::Key,
                        Lexeme::String {
                            start,
                            end,
                            has_escapes,
                        },
                    ) => {
                        let name = self.text(start, end, has_escapes)?;
                        let colon = self.lex()?;
                        if colon.lexeme != Lexeme::Colon {
                            return Err(Self::unexpected(&colon, "':'"));
                        }
                        self.set_state(Frame::Object(ObjectState::Value));
                        return Ok((Token::FieldName(name), span));
                    }
                    (ObjectState::Value, _) => return self.begin_value(scanned),
                    (ObjectState::CommaOrEnd, Lexeme::Comma) => {
                        self.set_state(Frame::Object(ObjectState::Key));
                    }
                    (ObjectState::KeyOrEnd, _) => {
                        return Err(Self::unexpected(&scanned, "field name or '}'"));
                    }
                    (ObjectState::Key, _) => return Err(Self::unexpected(&scanned, "field name")),
                    (ObjectState::CommaOrEnd, _) => {
                        return Err(Self::unexpected(&scanned, "',' or '}'"));
                    }
                },
                Frame::Array(state) => match (state, scanned.lexeme) {
                    (ArrayState::ValueOrEnd | ArrayState::CommaOrEnd, Lexeme::ArrayEnd) => {
                        self.stack.pop();
                        self.finish_value_in_parent();
                        return Ok((Token::EndArray, span));
                    }
                    (ArrayState::CommaOrEnd, Lexeme::Comma) => {
                        self.set_state(Frame::Array(ArrayState::Value));
                    }
                    (ArrayState::CommaOrEnd, _) => {
                        return Err(Self::unexpected(&scanned, "',' or ']'"));
                    }
                    (ArrayState::ValueOrEnd | ArrayState::Value, _) => {
                        return self.begin_value(scanned);
                    }
                },
            }
        }
    }
}

impl<R: Read> TokenReader for JsonReader<R> {
    fn next_token(&mut self) -> Result<Token, CodecError> {
        let (token, span) = match self.peeked.take() {
            Some(peeked) => peeked,
            None => self.produce()?,
        };
        self.current = Some(span);
        Ok(token)
    }

    fn peek_token(&mut self) -> Result<&Token, CodecError> {
        if self.peeked.is_none() {
            self.peeked = Some(self.produce()?);
        }
        match &self.peeked {
            Some((token, _)) => Ok(token),
            None => Err(CodecError::without_span(CodecErrorKind::UnexpectedEof {
                expected: "token",
            })),
        }
    }

    fn current_text(&self) -> Option<&str> {
        let span = self.current?;
        let start = span.offset.checked_sub(self.base)?;
        let bytes = self.buf.get(start..start + span.len)?;
        core::str::from_utf8(bytes).ok()
    }

    fn current_span(&self) -> Option<Span> {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protojson_testhelpers::test;

    fn tokens(input: &str) -> Result<Vec<Token>, CodecError> {
        let mut reader = JsonReader::new(input.as_bytes());
        let mut out = Vec::new();
        loop {
            match reader.next_token()? {
                Token::Eof => return Ok(out),
                token => out.push(token),
            }
        }
    }

    #[test]
    fn object_keys_become_field_names() {
        assert_eq!(
            tokens(r#"{"id": 1, "name": "x", "tags": [true, null], "sub": {}}"#).unwrap(),
            [
                Token::StartObject,
                Token::FieldName("id".into()),
                Token::Number("1".into()),
                Token::FieldName("name".into()),
                Token::String("x".into()),
                Token::FieldName("tags".into()),
                Token::StartArray,
                Token::Bool(true),
                Token::Null,
                Token::EndArray,
                Token::FieldName("sub".into()),
                Token::StartObject,
                Token::EndObject,
                Token::EndObject,
            ]
        );
    }

    #[test]
    fn scalar_at_top_level() {
        assert_eq!(tokens(" -2.5e3 ").unwrap(), [Token::Number("-2.5e3".into())]);
        assert_eq!(tokens("").unwrap(), []);
    }

    #[test]
    fn structural_errors() {
        for (input, code) in [
            (r#"{"a" 1}"#, "protojson::unexpected_token"),
            (r#"{"a": 1,}"#, "protojson::unexpected_token"),
            ("[1,]", "protojson::unexpected_token"),
            ("[1 2]", "protojson::unexpected_token"),
            ("{1: 2}", "protojson::unexpected_token"),
            ("]", "protojson::unexpected_token"),
            (r#"{"a": 1"#, "protojson::unexpected_eof"),
            ("[", "protojson::unexpected_eof"),
            ("{} {}", "protojson::trailing_characters"),
            ("[01]", "protojson::syntax"),
            ("\"abc", "protojson::syntax"),
        ] {
            let err = tokens(input).unwrap_err();
            assert_eq!(err.code(), code, "input: {input}");
        }
    }

    #[test]
    fn spans_point_into_the_input() {
        let err = tokens(r#"{"a": tru}"#).unwrap_err();
        assert!(err.is_syntax());
        assert_eq!(err.span, Some(Span::new(9, 1)));
    }

    #[test]
    fn peek_does_not_consume() {
        let mut reader = JsonReader::new(&b"[1, 2]"[..]);
        assert_eq!(reader.next_token().unwrap(), Token::StartArray);
        assert_eq!(reader.peek_token().unwrap(), &Token::Number("1".into()));
        assert_eq!(reader.peek_token().unwrap(), &Token::Number("1".into()));
        assert_eq!(reader.current_text(), Some("["));
        assert_eq!(reader.next_token().unwrap(), Token::Number("1".into()));
        assert_eq!(reader.current_span(), Some(Span::new(1, 1)));
        assert_eq!(reader.next_token().unwrap(), Token::Number("2".into()));
        assert_eq!(reader.next_token().unwrap(), Token::EndArray);
        assert_eq!(reader.next_token().unwrap(), Token::Eof);
        assert_eq!(reader.next_token().unwrap(), Token::Eof);
    }

    #[test]
    fn current_text_is_raw() {
        let mut reader = JsonReader::new(&br#"{"k\n": "vA"}"#[..]);
        reader.next_token().unwrap();
        assert_eq!(reader.next_token().unwrap(), Token::FieldName("k\n".into()));
        assert_eq!(reader.current_text(), Some(r#""k\n""#));
        assert_eq!(reader.next_token().unwrap(), Token::String("vA".into()));
        assert_eq!(reader.current_text(), Some(r#""vA""#));
    }

    /// Hands out its input a few bytes at a time.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn tokens_split_across_reads() {
        let input = r#"{"description": "a fairly long string value", "n": 12345678, "ok": false}"#;
        let expected = tokens(input).unwrap();
        for step in [1, 2, 3, 7, 64] {
            let mut reader = JsonReader::with_chunk_size(
                Trickle {
                    data: input.as_bytes(),
                    step,
                },
                1,
            );
            let mut got = Vec::new();
            loop {
                match reader.next_token().unwrap() {
                    Token::Eof => break,
                    token => got.push(token),
                }
            }
            assert_eq!(got, expected, "step {step}");
        }
    }

    #[test]
    fn long_input_is_compacted() {
        let element = r#"{"name": "task_name"}"#;
        let input = format!("[{}]", vec![element; 2000].join(","));
        let mut reader = JsonReader::with_chunk_size(input.as_bytes(), 256);
        let mut objects = 0;
        loop {
            match reader.next_token().unwrap() {
                Token::StartObject => objects += 1,
                Token::Eof => break,
                _ => {}
            }
        }
        assert_eq!(objects, 2000);
        assert!(reader.buf.len() < input.len() / 4);
        assert_eq!(reader.position(), input.len());
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "gone"))
        }
    }

    #[test]
    fn io_errors_propagate() {
        let err = JsonReader::new(Broken).next_token().unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn finish_rejects_trailing_input() {
        let mut reader = JsonReader::new(&b"{} x"[..]);
        reader.next_token().unwrap();
        reader.next_token().unwrap();
        let err = reader.finish().unwrap_err();
        assert!(matches!(err.kind, CodecErrorKind::Syntax(_)));

        let mut reader = JsonReader::new(&b"{}  \n"[..]);
        reader.next_token().unwrap();
        reader.next_token().unwrap();
        reader.finish().unwrap();
    }

    #[test]
    fn nesting_is_limited() {
        let input = format!("{}{}", "[".repeat(10_000), "]".repeat(10_000));
        let mut reader = JsonReader::new(input.as_bytes());
        let err = loop {
            match reader.next_token() {
                Ok(Token::Eof) => panic!("nesting was not limited"),
                Ok(_) => {}
                Err(e) => break e,
            }
        };
        assert!(err.is_structural());
        assert_eq!(err.code(), "protojson::depth_limit_exceeded");
        assert_eq!(err.span, Some(Span::new(DEFAULT_MAX_DEPTH, 1)));

        let mut reader = JsonReader::new(&br#"{"a": [{}]}"#[..]).with_max_depth(3);
        while reader.next_token().unwrap() != Token::Eof {}

        let mut reader = JsonReader::new(&br#"{"a": [{}]}"#[..]).with_max_depth(2);
        reader.next_token().unwrap();
        reader.next_token().unwrap();
        reader.next_token().unwrap();
        let err = reader.next_token().unwrap_err();
        assert!(matches!(err.kind, CodecErrorKind::DepthLimitExceeded { limit: 2 }));
    }
}
