//! Push writer over `std::io::Write`.

use std::io::Write;

use crate::scanner::no_control_chars;
use crate::{CodecError, TokenWriter, trace};

/// Buffered output is handed to the sink once it grows past this.
const FLUSH_THRESHOLD: usize = 8 * 1024;

/// Output formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Whether to pretty-print with newlines and indentation (default: false)
    pub pretty: bool,

    /// Indentation string for pretty-printing (default: two spaces)
    pub indent: &'static str,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            pretty: false,
            indent: "  ",
        }
    }
}

impl WriteOptions {
    /// Compact output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable pretty-printing with the default indentation.
    pub const fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Set the indentation string (implies pretty-printing).
    pub const fn indent(mut self, indent: &'static str) -> Self {
        self.indent = indent;
        self.pretty = true;
        self
    }
}

#[derive(Debug, Clone, Copy)]
enum Ctx {
    Object { first: bool, expecting_value: bool },
    Array { first: bool },
}

/// Writes JSON tokens to any [`Write`] sink.
///
/// Output is staged in an internal buffer; call [`flush`](TokenWriter::flush)
/// or [`into_inner`](Self::into_inner) to make sure everything reaches the
/// sink. Token sequences that would not form a single well-formed JSON value
/// are rejected with [`CodecErrorKind::InvalidWriterState`](crate::CodecErrorKind::InvalidWriterState).
pub struct JsonWriter<W: Write> {
    sink: W,
    out: Vec<u8>,
    stack: Vec<Ctx>,
    root_written: bool,
    options: WriteOptions,
}

impl<W: Write> JsonWriter<W> {
    /// Creates a compact writer.
    pub fn new(sink: W) -> Self {
        Self::with_options(sink, WriteOptions::default())
    }

    /// Creates a writer with the given formatting.
    pub fn with_options(sink: W, options: WriteOptions) -> Self {
        Self {
            sink,
            out: Vec::new(),
            stack: Vec::new(),
            root_written: false,
            options,
        }
    }

    /// Flushes and returns the sink.
    pub fn into_inner(mut self) -> Result<W, CodecError> {
        TokenWriter::flush(&mut self)?;
        Ok(self.sink)
    }

    /// The sink. Output still sitting in the buffer is not in it yet.
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    fn write_indent(&mut self) {
        if self.options.pretty {
            self.out.push(b'\n');
            for _ in 0..self.stack.len() {
                self.out.extend_from_slice(self.options.indent.as_bytes());
            }
        }
    }

    fn before_value(&mut self) -> Result<(), CodecError> {
        match self.stack.last_mut() {
            Some(Ctx::Array { first }) => {
                if !*first {
                    self.out.push(b',');
                }
                *first = false;
                self.write_indent();
            }
            Some(Ctx::Object {
                expecting_value, ..
            }) => {
                if !*expecting_value {
                    return Err(CodecError::writer_state("object value without a field name"));
                }
                *expecting_value = false;
            }
            None => {
                if self.root_written {
                    return Err(CodecError::writer_state("more than one top-level value"));
                }
                self.root_written = true;
            }
        }
        Ok(())
    }

    fn after_value(&mut self) -> Result<(), CodecError> {
        if self.out.len() >= FLUSH_THRESHOLD {
            self.drain()?;
        }
        Ok(())
    }

    fn drain(&mut self) -> Result<(), CodecError> {
        if !self.out.is_empty() {
            trace!(bytes = self.out.len(), "writing buffered output");
            self.sink.write_all(&self.out)?;
            self.out.clear();
        }
        Ok(())
    }

    /// Writes a quoted string, copying 16-byte runs that need no escaping
    /// in one go.
    fn write_json_string(&mut self, s: &str) {
        const STEP_SIZE: usize = 16;
        type Chunk = [u8; STEP_SIZE];

        self.out.push(b'"');

        let bytes = s.as_bytes();
        let mut i = 0;
        let mut run_start = 0;
        while i < bytes.len() {
            if let Some(Ok(chunk)) = bytes.get(i..i + STEP_SIZE).map(Chunk::try_from) {
                let window = u128::from_ne_bytes(chunk);
                if !contains_byte(window, b'"')
                    && !contains_byte(window, b'\\')
                    && no_control_chars(window)
                {
                    i += STEP_SIZE;
                    continue;
                }
            }

            let b = bytes[i];
            if b == b'"' || b == b'\\' || b < 0x20 {
                // bytes >= 0x80 never need escaping, so runs end on char boundaries
                self.out.extend_from_slice(&bytes[run_start..i]);
                self.write_json_escaped_byte(b);
                run_start = i + 1;
            }
            i += 1;
        }
        self.out.extend_from_slice(&bytes[run_start..]);

        self.out.push(b'"');
    }

    #[inline]
    fn write_json_escaped_byte(&mut self, b: u8) {
        match b {
            b'"' => self.out.extend_from_slice(b"\\\""),
            b'\\' => self.out.extend_from_slice(b"\\\\"),
            b'\n' => self.out.extend_from_slice(b"\\n"),
            b'\r' => self.out.extend_from_slice(b"\\r"),
            b'\t' => self.out.extend_from_slice(b"\\t"),
            0x08 => self.out.extend_from_slice(b"\\b"),
            0x0c => self.out.extend_from_slice(b"\\f"),
            _ => {
                const HEX: &[u8; 16] = b"0123456789abcdef";
                self.out.extend_from_slice(&[
                    b'\\',
                    b'u',
                    b'0',
                    b'0',
                    HEX[usize::from(b >> 4)],
                    HEX[usize::from(b & 0xf)],
                ]);
            }
        }
    }
}

impl<W: Write> TokenWriter for JsonWriter<W> {
    fn write_start_object(&mut self) -> Result<(), CodecError> {
        self.before_value()?;
        self.out.push(b'{');
        self.stack.push(Ctx::Object {
            first: true,
            expecting_value: false,
        });
        Ok(())
    }

    fn write_end_object(&mut self) -> Result<(), CodecError> {
        match self.stack.last() {
            Some(Ctx::Object {
                expecting_value: false,
                first,
            }) => {
                let first = *first;
                self.stack.pop();
                if !first {
                    self.write_indent();
                }
                self.out.push(b'}');
                self.after_value()
            }
            Some(Ctx::Object { .. }) => Err(CodecError::writer_state(
                "object closed after a field name with no value",
            )),
            _ => Err(CodecError::writer_state("'}' without a matching '{'")),
        }
    }

    fn write_start_array(&mut self) -> Result<(), CodecError> {
        self.before_value()?;
        self.out.push(b'[');
        self.stack.push(Ctx::Array { first: true });
        Ok(())
    }

    fn write_end_array(&mut self) -> Result<(), CodecError> {
        match self.stack.last() {
            Some(Ctx::Array { first }) => {
                let first = *first;
                self.stack.pop();
                if !first {
                    self.write_indent();
                }
                self.out.push(b']');
                self.after_value()
            }
            _ => Err(CodecError::writer_state("']' without a matching '['")),
        }
    }

    fn write_field_name(&mut self, name: &str) -> Result<(), CodecError> {
        match self.stack.last_mut() {
            Some(Ctx::Object {
                first,
                expecting_value,
            }) => {
                if *expecting_value {
                    return Err(CodecError::writer_state("two field names in a row"));
                }
                if !*first {
                    self.out.push(b',');
                }
                *first = false;
                *expecting_value = true;
            }
            _ => return Err(CodecError::writer_state("field name outside an object")),
        }
        self.write_indent();
        self.write_json_string(name);
        if self.options.pretty {
            self.out.extend_from_slice(b": ");
        } else {
            self.out.push(b':');
        }
        Ok(())
    }

    fn write_string(&mut self, value: &str) -> Result<(), CodecError> {
        self.before_value()?;
        self.write_json_string(value);
        self.after_value()
    }

    fn write_number(&mut self, raw: &str) -> Result<(), CodecError> {
        self.before_value()?;
        self.out.extend_from_slice(raw.as_bytes());
        self.after_value()
    }

    fn write_bool(&mut self, value: bool) -> Result<(), CodecError> {
        self.before_value()?;
        self.out
            .extend_from_slice(if value { b"true" } else { b"false" });
        self.after_value()
    }

    fn write_null(&mut self) -> Result<(), CodecError> {
        self.before_value()?;
        self.out.extend_from_slice(b"null");
        self.after_value()
    }

    fn flush(&mut self) -> Result<(), CodecError> {
        self.drain()?;
        self.sink.flush()?;
        Ok(())
    }
}

#[inline]
const fn contains_byte(window: u128, byte: u8) -> bool {
    let pattern = u128::from_ne_bytes([byte; 16]);
    let xor = window ^ pattern;
    let has_zero = (xor.wrapping_sub(0x01010101010101010101010101010101))
        & !xor
        & 0x80808080808080808080808080808080;
    has_zero != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CodecErrorKind;
    use protojson_testhelpers::test;

    fn written(options: WriteOptions, f: impl FnOnce(&mut JsonWriter<Vec<u8>>)) -> String {
        let mut writer = JsonWriter::with_options(Vec::new(), options);
        f(&mut writer);
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    fn sample(w: &mut JsonWriter<Vec<u8>>) {
        w.write_start_object().unwrap();
        w.write_field_name("id").unwrap();
        w.write_number("7").unwrap();
        w.write_field_name("tags").unwrap();
        w.write_start_array().unwrap();
        w.write_string("a").unwrap();
        w.write_bool(false).unwrap();
        w.write_end_array().unwrap();
        w.write_field_name("empty").unwrap();
        w.write_start_object().unwrap();
        w.write_end_object().unwrap();
        w.write_field_name("none").unwrap();
        w.write_null().unwrap();
        w.write_end_object().unwrap();
    }

    #[test]
    fn compact_output() {
        insta::assert_snapshot!(
            written(WriteOptions::new(), sample),
            @r#"{"id":7,"tags":["a",false],"empty":{},"none":null}"#
        );
    }

    #[test]
    fn pretty_output() {
        insta::assert_snapshot!(written(WriteOptions::new().pretty(), sample), @r#"
        {
          "id": 7,
          "tags": [
            "a",
            false
          ],
          "empty": {},
          "none": null
        }
        "#);
    }

    #[test]
    fn custom_indent() {
        let out = written(WriteOptions::new().indent("\t"), |w| {
            w.write_start_array().unwrap();
            w.write_number("1").unwrap();
            w.write_end_array().unwrap();
        });
        assert_eq!(out, "[\n\t1\n]");
    }

    #[test]
    fn strings_are_escaped() {
        let out = written(WriteOptions::new(), |w| {
            w.write_string("quote \" backslash \\ tab \t nul \0 bell \u{7} é ✓ and a long plain tail")
                .unwrap();
        });
        assert_eq!(
            out,
            r#""quote \" backslash \\ tab \t nul \u0000 bell \u0007 é ✓ and a long plain tail""#
        );
    }

    #[test]
    fn long_plain_strings_are_copied() {
        let s = "abcdefghijklmnopqrstuvwxyz".repeat(10);
        let out = written(WriteOptions::new(), |w| w.write_string(&s).unwrap());
        assert_eq!(out, format!("\"{s}\""));
    }

    #[test]
    fn misuse_is_rejected() {
        fn state_error(f: impl FnOnce(&mut JsonWriter<Vec<u8>>) -> Result<(), CodecError>) {
            let mut w = JsonWriter::new(Vec::new());
            let err = f(&mut w).unwrap_err();
            assert!(
                matches!(err.kind, CodecErrorKind::InvalidWriterState { .. }),
                "{err}"
            );
        }

        state_error(|w| w.write_field_name("a"));
        state_error(|w| w.write_end_object());
        state_error(|w| w.write_end_array());
        state_error(|w| {
            w.write_null()?;
            w.write_null()
        });
        state_error(|w| {
            w.write_start_object()?;
            w.write_string("no key")
        });
        state_error(|w| {
            w.write_start_object()?;
            w.write_field_name("a")?;
            w.write_field_name("b")
        });
        state_error(|w| {
            w.write_start_object()?;
            w.write_field_name("a")?;
            w.write_end_object()
        });
        state_error(|w| {
            w.write_start_array()?;
            w.write_end_object()
        });
    }

    #[test]
    fn large_output_reaches_the_sink_early() {
        let mut w = JsonWriter::new(Vec::new());
        w.write_start_array().unwrap();
        for _ in 0..2000 {
            w.write_string("0123456789").unwrap();
        }
        assert!(!w.get_ref().is_empty());
        w.write_end_array().unwrap();
        let out = w.into_inner().unwrap();
        assert_eq!(out.len(), 2 + 2000 * 13 - 1);
    }
}
