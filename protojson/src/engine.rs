//! The message codec, written once against [`MessageAccess`].
//!
//! Both dispatch strategies plug in here: the reflective one walks
//! descriptors at runtime, generated code implements the access directly.
//! Everything about object framing, absence, unknown keys and sequences
//! lives in this module and nowhere else.

use protojson_schema::ScalarKind;

use crate::scalar;
use crate::{
    CodecError, CodecErrorKind, FieldIndex, KeyStrategy, Repeated, Token, TokenReader, TokenWriter,
};
use crate::{debug, trace};

/// Field-level access to one message type.
///
/// `Field` identifies a field cheaply (a descriptor reference, a tag).
/// `Builder` accumulates fields while reading; it is only turned into a
/// `Message` once the whole object has been read, so a failed read never
/// yields a partial message.
pub trait MessageAccess: FieldIndex<Field: Copy> {
    /// The message representation.
    type Message;
    /// Work-in-progress state while reading.
    type Builder;

    /// Name of the message type.
    fn type_name(&self) -> &str;

    /// A builder with every field absent.
    fn new_builder(&self) -> Self::Builder;

    /// Reads the value of `field` and merges it into `builder`.
    ///
    /// Singular fields are replaced; repeated fields are appended to and
    /// become present even when the array is empty.
    fn merge_field<R: TokenReader + ?Sized>(
        &self,
        builder: &mut Self::Builder,
        field: Self::Field,
        input: &mut ValueReader<'_, R>,
    ) -> Result<(), CodecError>;

    /// Turns a builder into a message.
    fn finish(&self, builder: Self::Builder) -> Result<Self::Message, CodecError>;

    /// Writes every present field, key and value, in declaration order.
    fn write_fields<W: TokenWriter + ?Sized>(
        &self,
        message: &Self::Message,
        out: &mut ValueWriter<'_, W>,
    ) -> Result<(), CodecError>;
}

/// A value that can be read from the token stream.
pub trait Decode: Sized {
    /// Reads one value.
    fn decode<R: TokenReader + ?Sized>(input: &mut ValueReader<'_, R>) -> Result<Self, CodecError>;
}

/// A value that can be written to the token stream.
pub trait Encode {
    /// Writes the value.
    fn encode<W: TokenWriter + ?Sized>(
        &self,
        out: &mut ValueWriter<'_, W>,
    ) -> Result<(), CodecError>;
}

/// Storage for one field of a generated message: `Option<T>` for singular
/// fields, [`Repeated<T>`] for repeated ones.
pub trait FieldSlot {
    /// Reads the field's value into the slot.
    fn merge<R: TokenReader + ?Sized>(
        &mut self,
        input: &mut ValueReader<'_, R>,
    ) -> Result<(), CodecError>;

    /// Writes key and value, or nothing when the slot is empty.
    fn write<W: TokenWriter + ?Sized>(
        &self,
        out: &mut ValueWriter<'_, W>,
        tag: u32,
        name: &str,
    ) -> Result<(), CodecError>;
}

impl<T: Decode + Encode> FieldSlot for Option<T> {
    fn merge<R: TokenReader + ?Sized>(
        &mut self,
        input: &mut ValueReader<'_, R>,
    ) -> Result<(), CodecError> {
        *self = Some(input.read()?);
        Ok(())
    }

    fn write<W: TokenWriter + ?Sized>(
        &self,
        out: &mut ValueWriter<'_, W>,
        tag: u32,
        name: &str,
    ) -> Result<(), CodecError> {
        out.optional(tag, name, self.as_ref())
    }
}

impl<T: Decode + Encode> FieldSlot for Repeated<T> {
    fn merge<R: TokenReader + ?Sized>(
        &mut self,
        input: &mut ValueReader<'_, R>,
    ) -> Result<(), CodecError> {
        self.mark_present();
        input.repeated(&mut **self)
    }

    fn write<W: TokenWriter + ?Sized>(
        &self,
        out: &mut ValueWriter<'_, W>,
        tag: u32,
        name: &str,
    ) -> Result<(), CodecError> {
        if !self.is_present() {
            return Ok(());
        }
        out.repeated(tag, name, self.as_slice())
    }
}

/// The read side handed to [`MessageAccess::merge_field`].
pub struct ValueReader<'a, R: ?Sized> {
    input: &'a mut R,
    keys: KeyStrategy,
}

impl<'a, R: TokenReader + ?Sized> ValueReader<'a, R> {
    /// Wraps a token reader.
    pub fn new(input: &'a mut R, keys: KeyStrategy) -> Self {
        Self { input, keys }
    }

    /// The key strategy in effect.
    pub fn keys(&self) -> KeyStrategy {
        self.keys
    }

    /// The underlying token reader.
    pub fn input(&mut self) -> &mut R {
        &mut *self.input
    }

    /// Reads one value.
    pub fn read<T: Decode>(&mut self) -> Result<T, CodecError> {
        T::decode(self)
    }

    /// Reads a JSON array, appending each element to `out`.
    pub fn repeated<T: Decode>(&mut self, out: &mut Vec<T>) -> Result<(), CodecError> {
        self.repeated_with(|input| {
            out.push(T::decode(input)?);
            Ok(())
        })
    }

    /// Reads a JSON array, calling `element` once per element with the
    /// reader positioned on it.
    pub fn repeated_with(
        &mut self,
        mut element: impl FnMut(&mut Self) -> Result<(), CodecError>,
    ) -> Result<(), CodecError> {
        match self.input.next_token()? {
            Token::StartArray => {}
            other => return Err(CodecError::unexpected("'['", &other, self.input.current_span())),
        }
        loop {
            if matches!(self.input.peek_token()?, Token::EndArray) {
                self.input.next_token()?;
                return Ok(());
            }
            element(self)?;
        }
    }

    /// Reads a nested message.
    pub fn message<A: MessageAccess + ?Sized>(
        &mut self,
        access: &A,
    ) -> Result<A::Message, CodecError> {
        read_message(&mut *self.input, access, self.keys)
    }

    /// Skips one value of any shape.
    pub fn skip(&mut self) -> Result<(), CodecError> {
        skip_value(&mut *self.input)
    }
}

/// The write side handed to [`MessageAccess::write_fields`].
pub struct ValueWriter<'a, W: ?Sized> {
    out: &'a mut W,
    keys: KeyStrategy,
}

impl<'a, W: TokenWriter + ?Sized> ValueWriter<'a, W> {
    /// Wraps a token writer.
    pub fn new(out: &'a mut W, keys: KeyStrategy) -> Self {
        Self { out, keys }
    }

    /// The key strategy in effect.
    pub fn keys(&self) -> KeyStrategy {
        self.keys
    }

    /// The underlying token writer.
    pub fn output(&mut self) -> &mut W {
        &mut *self.out
    }

    /// Writes the key for a field.
    pub fn key(&mut self, tag: u32, name: &str) -> Result<(), CodecError> {
        let key = self.keys.encode_key(tag, name);
        self.out.write_field_name(&key)
    }

    /// Writes one value.
    pub fn write<T: Encode + ?Sized>(&mut self, value: &T) -> Result<(), CodecError> {
        value.encode(self)
    }

    /// Writes a singular field.
    pub fn field<T: Encode + ?Sized>(
        &mut self,
        tag: u32,
        name: &str,
        value: &T,
    ) -> Result<(), CodecError> {
        self.key(tag, name)?;
        value.encode(self)
    }

    /// Writes a singular field if it is present.
    pub fn optional<T: Encode>(
        &mut self,
        tag: u32,
        name: &str,
        value: Option<&T>,
    ) -> Result<(), CodecError> {
        match value {
            Some(value) => self.field(tag, name, value),
            None => Ok(()),
        }
    }

    /// Writes a repeated field. An empty slice is written as `[]`.
    pub fn repeated<T: Encode>(
        &mut self,
        tag: u32,
        name: &str,
        values: &[T],
    ) -> Result<(), CodecError> {
        self.key(tag, name)?;
        self.out.write_start_array()?;
        for value in values {
            value.encode(self)?;
        }
        self.out.write_end_array()
    }

    /// Writes a nested message.
    pub fn message<A: MessageAccess + ?Sized>(
        &mut self,
        access: &A,
        message: &A::Message,
    ) -> Result<(), CodecError> {
        write_message(&mut *self.out, access, self.keys, message)
    }
}

/// Writes one message as a JSON object. Absent fields are left out.
pub fn write_message<W, A>(
    out: &mut W,
    access: &A,
    keys: KeyStrategy,
    message: &A::Message,
) -> Result<(), CodecError>
where
    W: TokenWriter + ?Sized,
    A: MessageAccess + ?Sized,
{
    trace!(type_name = access.type_name(), "writing message");
    out.write_start_object()?;
    access.write_fields(message, &mut ValueWriter::new(&mut *out, keys))?;
    out.write_end_object()
}

/// Writes messages as a JSON array of objects.
pub fn write_many<W, A>(
    out: &mut W,
    access: &A,
    keys: KeyStrategy,
    messages: &[A::Message],
) -> Result<(), CodecError>
where
    W: TokenWriter + ?Sized,
    A: MessageAccess + ?Sized,
{
    trace!(
        type_name = access.type_name(),
        count = messages.len(),
        "writing message array"
    );
    out.write_start_array()?;
    for message in messages {
        write_message(out, access, keys, message)?;
    }
    out.write_end_array()
}

/// Reads one JSON object as a message.
///
/// Keys the message does not define are skipped, whatever their value. A
/// `null` value leaves its field absent.
pub fn read_message<R, A>(
    input: &mut R,
    access: &A,
    keys: KeyStrategy,
) -> Result<A::Message, CodecError>
where
    R: TokenReader + ?Sized,
    A: MessageAccess + ?Sized,
{
    match input.next_token()? {
        Token::StartObject => {}
        other => return Err(CodecError::unexpected("'{'", &other, input.current_span())),
    }
    trace!(type_name = access.type_name(), "reading message");

    let mut builder = access.new_builder();
    loop {
        let key = match input.next_token()? {
            Token::EndObject => break,
            Token::FieldName(key) => key,
            other => {
                return Err(CodecError::unexpected(
                    "field name or '}'",
                    &other,
                    input.current_span(),
                ));
            }
        };

        let Some(field) = keys.resolve_key(access, &key) else {
            debug!(
                type_name = access.type_name(),
                key = key.as_str(),
                "skipping unknown field"
            );
            skip_value(input)?;
            continue;
        };

        if matches!(input.peek_token()?, Token::Null) {
            input.next_token()?;
            continue;
        }

        trace!(key = key.as_str(), "reading field");
        access.merge_field(&mut builder, field, &mut ValueReader::new(&mut *input, keys))?;
    }

    access.finish(builder)
}

/// Reads a JSON array of objects, appending each message to `out`, and
/// returns how many were appended.
///
/// On error `out` is truncated back to its original length.
pub fn append_many<R, A>(
    input: &mut R,
    access: &A,
    keys: KeyStrategy,
    out: &mut Vec<A::Message>,
) -> Result<usize, CodecError>
where
    R: TokenReader + ?Sized,
    A: MessageAccess + ?Sized,
{
    let start = out.len();
    match read_array(input, access, keys, out) {
        Ok(()) => {
            let count = out.len() - start;
            trace!(type_name = access.type_name(), count, "read message array");
            Ok(count)
        }
        Err(e) => {
            out.truncate(start);
            Err(e)
        }
    }
}

fn read_array<R, A>(
    input: &mut R,
    access: &A,
    keys: KeyStrategy,
    out: &mut Vec<A::Message>,
) -> Result<(), CodecError>
where
    R: TokenReader + ?Sized,
    A: MessageAccess + ?Sized,
{
    match input.next_token()? {
        Token::StartArray => {}
        other => return Err(CodecError::unexpected("'['", &other, input.current_span())),
    }
    loop {
        if matches!(input.peek_token()?, Token::EndArray) {
            input.next_token()?;
            return Ok(());
        }
        out.push(read_message(input, access, keys)?);
    }
}

/// Consumes one complete value: a scalar, or a whole object or array.
pub fn skip_value<R: TokenReader + ?Sized>(input: &mut R) -> Result<(), CodecError> {
    let mut depth = 0usize;
    loop {
        let token = input.next_token()?;
        match token {
            Token::StartObject | Token::StartArray => depth += 1,
            Token::EndObject | Token::EndArray if depth > 0 => depth -= 1,
            Token::FieldName(_) if depth > 0 => continue,
            Token::String(_) | Token::Number(_) | Token::Bool(_) | Token::Null => {}
            Token::Eof => {
                return Err(CodecError::at(
                    CodecErrorKind::UnexpectedEof { expected: "value" },
                    input.current_span(),
                ));
            }
            other => return Err(CodecError::unexpected("value", &other, input.current_span())),
        }
        if depth == 0 {
            return Ok(());
        }
    }
}

macro_rules! impl_scalar_codec {
    ($($t:ty => |$out:ident, $value:ident| $write:expr, |$input:ident| $read:expr;)*) => {$(
        impl Encode for $t {
            fn encode<W: TokenWriter + ?Sized>(
                &self,
                out: &mut ValueWriter<'_, W>,
            ) -> Result<(), CodecError> {
                let $value = self;
                let $out = out.output();
                $write
            }
        }

        impl Decode for $t {
            fn decode<R: TokenReader + ?Sized>(
                input: &mut ValueReader<'_, R>,
            ) -> Result<Self, CodecError> {
                let $input = input.input();
                $read
            }
        }
    )*};
}

impl_scalar_codec! {
    bool => |out, v| scalar::write_bool(out, *v), |input| scalar::read_bool(input);
    i32 => |out, v| scalar::write_int(out, *v), |input| scalar::read_int(input, ScalarKind::Int32);
    i64 => |out, v| scalar::write_int(out, *v), |input| scalar::read_int(input, ScalarKind::Int64);
    u32 => |out, v| scalar::write_int(out, *v), |input| scalar::read_int(input, ScalarKind::Uint32);
    u64 => |out, v| scalar::write_int(out, *v), |input| scalar::read_int(input, ScalarKind::Uint64);
    f32 => |out, v| scalar::write_f32(out, *v), |input| scalar::read_f32(input);
    f64 => |out, v| scalar::write_f64(out, *v), |input| scalar::read_f64(input);
    String => |out, v| scalar::write_string(out, v), |input| scalar::read_string(input);
    Vec<u8> => |out, v| scalar::write_bytes(out, v), |input| scalar::read_bytes(input);
}
