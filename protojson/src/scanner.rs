//! Byte-level JSON lexer.
//!
//! The scanner finds token boundaries in a buffer without interpreting them:
//! strings come back as indices plus a `has_escapes` flag and numbers as the
//! index range of their raw text. It keeps no state between calls besides
//! its position, so when the buffer runs out in the middle of a token it
//! rewinds to the token start and reports [`Lexeme::NeedMore`]; the caller
//! appends more input and asks again.

use core::fmt;
use core::str;

use crate::Span;

/// A lexical token. Strings and numbers are index ranges into the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lexeme {
    ObjectStart,
    ObjectEnd,
    ArrayStart,
    ArrayEnd,
    Colon,
    Comma,
    Null,
    True,
    False,
    /// Content between the quotes
    String {
        start: usize,
        end: usize,
        has_escapes: bool,
    },
    /// Raw number text, already checked against the JSON number grammar
    Number { start: usize, end: usize },
    Eof,
    /// The buffer ends inside a token (or before one) and more input may follow
    NeedMore,
}

impl Lexeme {
    /// How the lexeme reads in an error message.
    pub(crate) fn describe(&self) -> &'static str {
        match self {
            Lexeme::ObjectStart => "'{'",
            Lexeme::ObjectEnd => "'}'",
            Lexeme::ArrayStart => "'['",
            Lexeme::ArrayEnd => "']'",
            Lexeme::Colon => "':'",
            Lexeme::Comma => "','",
            Lexeme::Null => "null",
            Lexeme::True => "true",
            Lexeme::False => "false",
            Lexeme::String { .. } => "string",
            Lexeme::Number { .. } => "number",
            Lexeme::Eof | Lexeme::NeedMore => "end of input",
        }
    }
}

/// A lexeme and where it sits in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Scanned {
    pub lexeme: Lexeme,
    pub span: Span,
}

/// Malformed JSON text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScanError {
    pub kind: ScanErrorKind,
    pub span: Span,
}

/// What is malformed about the JSON text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanErrorKind {
    /// A byte that cannot start or continue a token here
    UnexpectedChar(char),
    /// The input ended inside a token
    UnexpectedEof(&'static str),
    /// String content that is not valid UTF-8
    InvalidUtf8,
    /// A backslash escape JSON does not define, or a broken `\u` escape
    InvalidEscape(char),
    /// An unescaped control character inside a string
    ControlCharacter(u8),
    /// Number text that does not follow the JSON number grammar
    InvalidNumber,
}

impl fmt::Display for ScanErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanErrorKind::UnexpectedChar(c) => write!(f, "unexpected character {c:?}"),
            ScanErrorKind::UnexpectedEof(context) => write!(f, "unexpected end of input {context}"),
            ScanErrorKind::InvalidUtf8 => f.write_str("invalid UTF-8 in string"),
            ScanErrorKind::InvalidEscape(c) => write!(f, "invalid escape sequence `\\{c}`"),
            ScanErrorKind::ControlCharacter(b) => {
                write!(f, "unescaped control character 0x{b:02x} in string")
            }
            ScanErrorKind::InvalidNumber => f.write_str("malformed number"),
        }
    }
}

type ScanResult = Result<Scanned, ScanError>;

/// Lexer position within a buffer.
#[derive(Debug, Default)]
pub(crate) struct Scanner {
    pos: usize,
}

impl Scanner {
    pub(crate) const fn new() -> Self {
        Self { pos: 0 }
    }

    /// Current position in the buffer.
    pub(crate) const fn pos(&self) -> usize {
        self.pos
    }

    /// Moves the position, after the caller dropped a prefix of the buffer.
    pub(crate) const fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Scans the next lexeme.
    ///
    /// `at_eof` tells the scanner that `buf` holds the rest of the input, so
    /// running out of bytes finishes (or breaks) the current token instead
    /// of producing [`Lexeme::NeedMore`].
    pub(crate) fn next(&mut self, buf: &[u8], at_eof: bool) -> ScanResult {
        self.skip_whitespace(buf);

        let start = self.pos;
        let Some(&byte) = buf.get(start) else {
            let lexeme = if at_eof { Lexeme::Eof } else { Lexeme::NeedMore };
            return Ok(Scanned {
                lexeme,
                span: Span::new(start, 0),
            });
        };

        let single = match byte {
            b'{' => Some(Lexeme::ObjectStart),
            b'}' => Some(Lexeme::ObjectEnd),
            b'[' => Some(Lexeme::ArrayStart),
            b']' => Some(Lexeme::ArrayEnd),
            b':' => Some(Lexeme::Colon),
            b',' => Some(Lexeme::Comma),
            _ => None,
        };
        if let Some(lexeme) = single {
            self.pos += 1;
            return Ok(Scanned {
                lexeme,
                span: Span::new(start, 1),
            });
        }

        match byte {
            b'"' => self.scan_string(buf, start, at_eof),
            b'-' | b'0'..=b'9' => self.scan_number(buf, start, at_eof),
            b't' => self.scan_literal(buf, start, b"true", Lexeme::True, at_eof),
            b'f' => self.scan_literal(buf, start, b"false", Lexeme::False, at_eof),
            b'n' => self.scan_literal(buf, start, b"null", Lexeme::Null, at_eof),
            _ => Err(ScanError {
                kind: ScanErrorKind::UnexpectedChar(byte as char),
                span: Span::new(start, 1),
            }),
        }
    }

    fn skip_whitespace(&mut self, buf: &[u8]) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = buf.get(self.pos) {
            self.pos += 1;
        }
    }

    /// Rewinds to `start` and asks for more input, or fails if there is none.
    fn out_of_input(&mut self, start: usize, at_eof: bool, context: &'static str) -> ScanResult {
        if at_eof {
            return Err(ScanError {
                kind: ScanErrorKind::UnexpectedEof(context),
                span: Span::new(start, self.pos - start),
            });
        }
        self.pos = start;
        Ok(Scanned {
            lexeme: Lexeme::NeedMore,
            span: Span::new(start, 0),
        })
    }

    fn scan_string(&mut self, buf: &[u8], start: usize, at_eof: bool) -> ScanResult {
        const STEP_SIZE: usize = 16;
        type Chunk = [u8; STEP_SIZE];

        self.pos = start + 1;
        let content_start = self.pos;
        let mut has_escapes = false;

        loop {
            // skip runs of plain bytes 16 at a time
            while let Some(Ok(chunk)) = buf
                .get(self.pos..)
                .and_then(|rest| rest.get(..STEP_SIZE))
                .map(Chunk::try_from)
            {
                let window = u128::from_ne_bytes(chunk);
                if contains_byte(window, b'"')
                    || contains_byte(window, b'\\')
                    || !no_control_chars(window)
                {
                    break;
                }
                self.pos += STEP_SIZE;
            }

            match buf.get(self.pos) {
                None => return self.out_of_input(start, at_eof, "in string"),
                Some(b'"') => {
                    let content_end = self.pos;
                    self.pos += 1;
                    return Ok(Scanned {
                        lexeme: Lexeme::String {
                            start: content_start,
                            end: content_end,
                            has_escapes,
                        },
                        span: Span::new(start, self.pos - start),
                    });
                }
                Some(b'\\') => {
                    has_escapes = true;
                    if self.pos + 1 >= buf.len() {
                        self.pos = buf.len();
                        return self.out_of_input(start, at_eof, "in string");
                    }
                    // the escaped byte is validated when the string is decoded
                    self.pos += 2;
                }
                Some(&b) if b < 0x20 => {
                    return Err(ScanError {
                        kind: ScanErrorKind::ControlCharacter(b),
                        span: Span::new(self.pos, 1),
                    });
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn scan_number(&mut self, buf: &[u8], start: usize, at_eof: bool) -> ScanResult {
        let mut end = start;
        while let Some(b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E') = buf.get(end) {
            end += 1;
        }
        self.pos = end;

        // a number has no closing delimiter, so the buffer end is ambiguous
        if end == buf.len() && !at_eof {
            return self.out_of_input(start, false, "in number");
        }

        if !is_json_number(&buf[start..end]) {
            return Err(ScanError {
                kind: ScanErrorKind::InvalidNumber,
                span: Span::new(start, end - start),
            });
        }

        Ok(Scanned {
            lexeme: Lexeme::Number { start, end },
            span: Span::new(start, end - start),
        })
    }

    fn scan_literal(
        &mut self,
        buf: &[u8],
        start: usize,
        expected: &'static [u8],
        lexeme: Lexeme,
        at_eof: bool,
    ) -> ScanResult {
        for &want in expected {
            match buf.get(self.pos) {
                Some(&b) if b == want => self.pos += 1,
                Some(&b) => {
                    return Err(ScanError {
                        kind: ScanErrorKind::UnexpectedChar(b as char),
                        span: Span::new(self.pos, 1),
                    });
                }
                None => return self.out_of_input(start, at_eof, "in literal"),
            }
        }
        Ok(Scanned {
            lexeme,
            span: Span::new(start, expected.len()),
        })
    }
}

/// `-? (0 | [1-9][0-9]*) (. [0-9]+)? ([eE] [+-]? [0-9]+)?`
fn is_json_number(text: &[u8]) -> bool {
    fn digits(text: &[u8], mut i: usize) -> usize {
        while text.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    }

    let mut i = usize::from(text.first() == Some(&b'-'));
    match text.get(i) {
        Some(b'0') => i += 1,
        Some(b'1'..=b'9') => i = digits(text, i + 1),
        _ => return false,
    }
    if text.get(i) == Some(&b'.') {
        let after = digits(text, i + 1);
        if after == i + 1 {
            return false;
        }
        i = after;
    }
    if let Some(b'e' | b'E') = text.get(i) {
        i += 1;
        if let Some(b'+' | b'-') = text.get(i) {
            i += 1;
        }
        let after = digits(text, i);
        if after == i {
            return false;
        }
        i = after;
    }
    i == text.len()
}

/// Whether any byte of the 16-byte window equals `byte`.
#[inline]
const fn contains_byte(window: u128, byte: u8) -> bool {
    let pattern = u128::from_ne_bytes([byte; 16]);
    let xor = window ^ pattern;
    let has_zero = (xor.wrapping_sub(0x01010101010101010101010101010101))
        & !xor
        & 0x80808080808080808080808080808080;
    has_zero != 0
}

/// Whether every byte of the window is at least 0x20.
#[inline]
pub(crate) const fn no_control_chars(window: u128) -> bool {
    let masked = window & 0xe0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0;
    let has_zero = (masked.wrapping_sub(0x01010101010101010101010101010101))
        & !masked
        & 0x80808080808080808080808080808080;
    has_zero == 0
}

/// Decodes the content of a string lexeme, resolving escapes.
///
/// `start..end` excludes the quotes; spans in errors are buffer positions.
pub(crate) fn decode_string(
    buf: &[u8],
    start: usize,
    end: usize,
    has_escapes: bool,
) -> Result<String, ScanError> {
    let content = &buf[start..end];
    if !has_escapes {
        return match str::from_utf8(content) {
            Ok(s) => Ok(s.to_owned()),
            Err(e) => Err(ScanError {
                kind: ScanErrorKind::InvalidUtf8,
                span: Span::new(start + e.valid_up_to(), 1),
            }),
        };
    }

    let mut out = String::with_capacity(content.len());
    let mut i = 0;
    while i < content.len() {
        // copy everything up to the next backslash in one go; splitting on
        // an ASCII byte never cuts a UTF-8 sequence
        let run_end = content[i..]
            .iter()
            .position(|&b| b == b'\\')
            .map_or(content.len(), |offset| i + offset);
        match str::from_utf8(&content[i..run_end]) {
            Ok(run) => out.push_str(run),
            Err(e) => {
                return Err(ScanError {
                    kind: ScanErrorKind::InvalidUtf8,
                    span: Span::new(start + i + e.valid_up_to(), 1),
                });
            }
        }
        i = run_end;
        if i == content.len() {
            break;
        }

        let escape_at = start + i;
        let Some(&escaped) = content.get(i + 1) else {
            return Err(ScanError {
                kind: ScanErrorKind::UnexpectedEof("in escape sequence"),
                span: Span::new(escape_at, 1),
            });
        };
        i += 2;
        let c = match escaped {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{08}',
            b'f' => '\u{0c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => {
                let (c, used) = decode_unicode_escape(&content[i..]).ok_or(ScanError {
                    kind: ScanErrorKind::InvalidEscape('u'),
                    span: Span::new(escape_at, (i + 4).min(content.len()) - (i - 2)),
                })?;
                i += used;
                c
            }
            other => {
                return Err(ScanError {
                    kind: ScanErrorKind::InvalidEscape(other as char),
                    span: Span::new(escape_at, 2),
                });
            }
        };
        out.push(c);
    }
    Ok(out)
}

/// Decodes the `XXXX` after `\u`, plus a trailing `\uXXXX` low surrogate
/// when the first unit is a high surrogate. Returns the char and the number
/// of bytes used.
fn decode_unicode_escape(rest: &[u8]) -> Option<(char, usize)> {
    fn unit(hex: &[u8]) -> Option<u16> {
        let hex = str::from_utf8(hex.get(..4)?).ok()?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u16::from_str_radix(hex, 16).ok()
    }

    let high = unit(rest)?;
    match high {
        0xD800..=0xDBFF => {
            if rest.get(4..6)? != b"\\u" {
                return None;
            }
            let low = unit(&rest[6..])?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return None;
            }
            let code_point =
                0x10000 + ((u32::from(high) & 0x3FF) << 10) + (u32::from(low) & 0x3FF);
            Some((char::from_u32(code_point)?, 10))
        }
        0xDC00..=0xDFFF => None,
        _ => Some((char::from_u32(u32::from(high))?, 4)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protojson_testhelpers::test;

    fn lex_all(input: &str) -> Vec<Lexeme> {
        let mut scanner = Scanner::new();
        let mut out = Vec::new();
        loop {
            let scanned = scanner.next(input.as_bytes(), true).unwrap();
            if scanned.lexeme == Lexeme::Eof {
                return out;
            }
            out.push(scanned.lexeme);
        }
    }

    #[test]
    fn punctuation_and_literals() {
        assert_eq!(
            lex_all(" { [ ] } : , true false null "),
            [
                Lexeme::ObjectStart,
                Lexeme::ArrayStart,
                Lexeme::ArrayEnd,
                Lexeme::ObjectEnd,
                Lexeme::Colon,
                Lexeme::Comma,
                Lexeme::True,
                Lexeme::False,
                Lexeme::Null,
            ]
        );
    }

    #[test]
    fn string_indices_exclude_quotes() {
        let lexemes = lex_all(r#""abc" "a\"b""#);
        assert_eq!(
            lexemes,
            [
                Lexeme::String {
                    start: 1,
                    end: 4,
                    has_escapes: false
                },
                Lexeme::String {
                    start: 7,
                    end: 11,
                    has_escapes: true
                },
            ]
        );
    }

    #[test]
    fn long_strings_take_the_fast_path() {
        let body = "x".repeat(100);
        let input = format!("\"{body}\"");
        assert_eq!(
            lex_all(&input),
            [Lexeme::String {
                start: 1,
                end: 101,
                has_escapes: false
            }]
        );
    }

    #[test]
    fn numbers_follow_json_grammar() {
        for good in ["0", "-0", "12", "-3.5", "1e10", "1E+2", "2.5e-3"] {
            assert!(is_json_number(good.as_bytes()), "{good} should be accepted");
        }
        for bad in ["-", "01", "1.", ".5", "1e", "+1", "1-2", "--1", "1.2.3"] {
            assert!(!is_json_number(bad.as_bytes()), "{bad} should be rejected");
        }
    }

    #[test]
    fn malformed_number_is_an_error() {
        let err = Scanner::new().next(b"01 ", true).unwrap_err();
        assert_eq!(err.kind, ScanErrorKind::InvalidNumber);
        assert_eq!(err.span, Span::new(0, 2));
    }

    #[test]
    fn number_at_buffer_end_needs_more_unless_eof() {
        let mut scanner = Scanner::new();
        let scanned = scanner.next(b"  12", false).unwrap();
        assert_eq!(scanned.lexeme, Lexeme::NeedMore);
        assert_eq!(scanner.pos(), 2);

        let scanned = scanner.next(b"  12", true).unwrap();
        assert_eq!(scanned.lexeme, Lexeme::Number { start: 2, end: 4 });
    }

    #[test]
    fn split_tokens_rewind() {
        for partial in [&b"\"abc"[..], b"tr", b"\"a\\"] {
            let mut scanner = Scanner::new();
            assert_eq!(scanner.next(partial, false).unwrap().lexeme, Lexeme::NeedMore);
            assert_eq!(scanner.pos(), 0);
            assert!(matches!(
                scanner.next(partial, true).unwrap_err().kind,
                ScanErrorKind::UnexpectedEof(_)
            ));
        }
    }

    #[test]
    fn bad_characters() {
        let err = Scanner::new().next(b"@", true).unwrap_err();
        assert_eq!(err.kind, ScanErrorKind::UnexpectedChar('@'));

        let err = Scanner::new().next(b"nul!", true).unwrap_err();
        assert_eq!(err.kind, ScanErrorKind::UnexpectedChar('!'));
        assert_eq!(err.span, Span::new(3, 1));

        let err = Scanner::new().next(b"\"a\tb\"", true).unwrap_err();
        assert_eq!(err.kind, ScanErrorKind::ControlCharacter(b'\t'));
    }

    #[test]
    fn escapes_decode() {
        let input = br#"a\"b\\c\/d\b\f\n\r\te\u00e9\ud83d\ude00"#;
        let decoded = decode_string(input, 0, input.len(), true).unwrap();
        assert_eq!(decoded, "a\"b\\c/d\u{8}\u{c}\n\r\te\u{e9}\u{1f600}");
    }

    #[test]
    fn bad_escapes_are_rejected() {
        for bad in [&br"\x"[..], br"\u12", br"\ud800", br"\udc00", br"\u12zz"] {
            let err = decode_string(bad, 0, bad.len(), true).unwrap_err();
            assert!(
                matches!(err.kind, ScanErrorKind::InvalidEscape(_)),
                "{:?} gave {:?}",
                String::from_utf8_lossy(bad),
                err.kind
            );
        }
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let input = b"ab\xffcd";
        let err = decode_string(input, 0, input.len(), false).unwrap_err();
        assert_eq!(err.kind, ScanErrorKind::InvalidUtf8);
        assert_eq!(err.span, Span::new(2, 1));

        let input = b"\\n\xff";
        let err = decode_string(input, 0, input.len(), true).unwrap_err();
        assert_eq!(err.span, Span::new(2, 1));
    }

    #[test]
    fn multibyte_text_passes_through() {
        let input = "héllo wörld, ünïcode ✓".as_bytes();
        assert_eq!(
            decode_string(input, 0, input.len(), false).unwrap(),
            "héllo wörld, ünïcode ✓"
        );
    }
}
