//! JSON representation of scalar and enum values.
//!
//! Integers are written as numbers. 64-bit integers may also be read from
//! quoted decimal strings, since many JSON consumers cannot hold them
//! exactly. Non-finite floats travel as the strings `"NaN"`, `"Infinity"`
//! and `"-Infinity"`. Bytes are standard padded base64.

use core::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use protojson_schema::ScalarKind;

use crate::{CodecError, CodecErrorKind, KeyStrategy, Span, Token, TokenReader, TokenWriter};

const NAN: &str = "NaN";
const INFINITY: &str = "Infinity";
const NEG_INFINITY: &str = "-Infinity";

/// Writes `true` or `false`.
pub fn write_bool<W: TokenWriter + ?Sized>(out: &mut W, value: bool) -> Result<(), CodecError> {
    out.write_bool(value)
}

/// Writes any integer as a JSON number.
pub fn write_int<W: TokenWriter + ?Sized, I: itoa::Integer>(
    out: &mut W,
    value: I,
) -> Result<(), CodecError> {
    let mut buf = itoa::Buffer::new();
    out.write_number(buf.format(value))
}

/// Writes a `double`.
pub fn write_f64<W: TokenWriter + ?Sized>(out: &mut W, value: f64) -> Result<(), CodecError> {
    write_float(out, value)
}

/// Writes a `float`.
pub fn write_f32<W: TokenWriter + ?Sized>(out: &mut W, value: f32) -> Result<(), CodecError> {
    write_float(out, value)
}

fn write_float<W: TokenWriter + ?Sized, F: Float>(out: &mut W, value: F) -> Result<(), CodecError> {
    if value.is_nan() {
        out.write_string(NAN)
    } else if value.is_infinite() {
        out.write_string(if value.is_sign_negative() {
            NEG_INFINITY
        } else {
            INFINITY
        })
    } else {
        let mut buf = ryu::Buffer::new();
        out.write_number(buf.format_finite(value))
    }
}

/// Writes a `string`.
pub fn write_string<W: TokenWriter + ?Sized>(out: &mut W, value: &str) -> Result<(), CodecError> {
    out.write_string(value)
}

/// Writes `bytes` as a base64 string.
pub fn write_bytes<W: TokenWriter + ?Sized>(out: &mut W, value: &[u8]) -> Result<(), CodecError> {
    out.write_string(&STANDARD.encode(value))
}

/// Writes an enum value.
///
/// With named keys the symbol is written when there is one; otherwise, and
/// always with numeric keys, the number.
pub fn write_enum<W: TokenWriter + ?Sized>(
    out: &mut W,
    keys: KeyStrategy,
    number: i32,
    symbol: Option<&str>,
) -> Result<(), CodecError> {
    match symbol {
        Some(symbol) if !keys.enums_as_numbers() => out.write_string(symbol),
        _ => write_int(out, number),
    }
}

/// Reads a `bool`.
pub fn read_bool<R: TokenReader + ?Sized>(input: &mut R) -> Result<bool, CodecError> {
    match input.next_token()? {
        Token::Bool(value) => Ok(value),
        other => Err(CodecError::unexpected("boolean", &other, input.current_span())),
    }
}

/// Reads an integer of the given kind into `T`, which must be wide enough
/// for it.
///
/// The text must be an integer literal that fits `T` exactly: `1.0`, `1e3`
/// and out-of-range values are rejected rather than converted.
pub fn read_int<T: FromStr, R: TokenReader + ?Sized>(
    input: &mut R,
    kind: ScalarKind,
) -> Result<T, CodecError> {
    let token = input.next_token()?;
    let span = input.current_span();
    match &token {
        Token::Number(raw) => parse_int(raw, kind, span),
        Token::String(text) if kind.is_64_bit() => parse_int(text, kind, span),
        _ if kind.is_64_bit() => Err(CodecError::unexpected(
            "number or numeric string",
            &token,
            span,
        )),
        _ => Err(CodecError::unexpected("number", &token, span)),
    }
}

fn parse_int<T: FromStr>(text: &str, kind: ScalarKind, span: Option<Span>) -> Result<T, CodecError> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodecError::invalid_scalar(
            kind.proto_name(),
            text,
            "not an integer",
            span,
        ));
    }
    text.parse()
        .map_err(|_| CodecError::invalid_scalar(kind.proto_name(), text, "out of range", span))
}

/// Reads a `double`.
pub fn read_f64<R: TokenReader + ?Sized>(input: &mut R) -> Result<f64, CodecError> {
    read_float(input, ScalarKind::Double)
}

/// Reads a `float`. Finite input too large for `f32` is an error.
pub fn read_f32<R: TokenReader + ?Sized>(input: &mut R) -> Result<f32, CodecError> {
    read_float(input, ScalarKind::Float)
}

fn read_float<F: Float, R: TokenReader + ?Sized>(
    input: &mut R,
    kind: ScalarKind,
) -> Result<F, CodecError> {
    let token = input.next_token()?;
    let span = input.current_span();
    match &token {
        Token::Number(raw) => match raw.parse::<F>() {
            Ok(value) if !value.is_infinite() => Ok(value),
            _ => Err(CodecError::invalid_scalar(
                kind.proto_name(),
                raw.as_str(),
                "out of range",
                span,
            )),
        },
        Token::String(text) => match text.as_str() {
            NAN => Ok(F::NAN),
            INFINITY => Ok(F::INFINITY),
            NEG_INFINITY => Ok(F::NEG_INFINITY),
            _ => Err(CodecError::invalid_scalar(
                kind.proto_name(),
                text.as_str(),
                "not a number",
                span,
            )),
        },
        _ => Err(CodecError::unexpected("number", &token, span)),
    }
}

/// Reads a `string`.
pub fn read_string<R: TokenReader + ?Sized>(input: &mut R) -> Result<String, CodecError> {
    match input.next_token()? {
        Token::String(value) => Ok(value),
        other => Err(CodecError::unexpected("string", &other, input.current_span())),
    }
}

/// Reads base64 `bytes`.
pub fn read_bytes<R: TokenReader + ?Sized>(input: &mut R) -> Result<Vec<u8>, CodecError> {
    match input.next_token()? {
        Token::String(text) => STANDARD.decode(text.as_bytes()).map_err(|e| {
            CodecError::at(
                CodecErrorKind::InvalidBytes {
                    reason: e.to_string(),
                },
                input.current_span(),
            )
        }),
        other => Err(CodecError::unexpected("base64 string", &other, input.current_span())),
    }
}

/// Symbols at least this similar to an unknown one are suggested.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Reads an enum value given as a symbol or a number, whatever the key
/// strategy, and returns its number.
///
/// `values` lists the `(symbol, number)` pairs the enum defines.
pub fn read_enum<'v, R: TokenReader + ?Sized>(
    input: &mut R,
    enum_name: &str,
    values: impl IntoIterator<Item = (&'v str, i32)>,
) -> Result<i32, CodecError> {
    let token = input.next_token()?;
    let span = input.current_span();
    let unknown = |value: &str, suggestion: Option<&str>| {
        CodecError::at(
            CodecErrorKind::UnknownEnumValue {
                enum_name: enum_name.to_owned(),
                value: value.to_owned(),
                suggestion: suggestion.map(str::to_owned),
            },
            span,
        )
    };

    match &token {
        Token::String(symbol) => {
            let mut best: Option<(&str, f64)> = None;
            for (candidate, number) in values {
                if candidate == symbol {
                    return Ok(number);
                }
                let score = strsim::jaro_winkler(symbol, candidate);
                if score >= SUGGESTION_THRESHOLD && best.is_none_or(|(_, s)| score > s) {
                    best = Some((candidate, score));
                }
            }
            Err(unknown(symbol, best.map(|(candidate, _)| candidate)))
        }
        Token::Number(raw) => {
            let number: i32 = parse_int(raw, ScalarKind::Int32, span)?;
            if values.into_iter().any(|(_, n)| n == number) {
                Ok(number)
            } else {
                Err(unknown(raw, None))
            }
        }
        _ => Err(CodecError::unexpected("enum symbol or number", &token, span)),
    }
}

/// What the float helpers need from `f32` and `f64`.
trait Float: FromStr + Copy + ryu::Float {
    const NAN: Self;
    const INFINITY: Self;
    const NEG_INFINITY: Self;

    fn is_nan(self) -> bool;
    fn is_infinite(self) -> bool;
    fn is_sign_negative(self) -> bool;
}

macro_rules! impl_float {
    ($($t:ident),*) => {$(
        impl Float for $t {
            const NAN: Self = $t::NAN;
            const INFINITY: Self = $t::INFINITY;
            const NEG_INFINITY: Self = $t::NEG_INFINITY;

            fn is_nan(self) -> bool {
                $t::is_nan(self)
            }

            fn is_infinite(self) -> bool {
                $t::is_infinite(self)
            }

            fn is_sign_negative(self) -> bool {
                $t::is_sign_negative(self)
            }
        }
    )*};
}

impl_float!(f32, f64);
