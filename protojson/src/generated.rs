//! Compile-time dispatch: message types carry their own field routines.
//!
//! The routines are produced by [`proto_message!`](crate::proto_message)
//! and [`proto_enum!`](crate::proto_enum); the traits here are what those
//! macros implement, and what [`GeneratedJson`] is generic over.

use core::fmt;
use core::marker::PhantomData;

use protojson_schema::Describe;

use crate::engine::{self, MessageAccess, ValueReader, ValueWriter};
use crate::{
    CodecError, CodecErrorKind, FieldIndex, KeyStrategy, ProtobufJson, Repeated, TokenReader,
    TokenWriter, scalar,
};

/// A message type with generated field routines.
///
/// Fields are identified by tag. Singular fields are stored as `Option<T>`
/// and repeated fields as [`Repeated<T>`], which remembers that a field was
/// present even when it holds no values.
pub trait GeneratedMessage: Describe + Default {
    /// The tag of the field declared as `name`.
    fn field_by_name(name: &str) -> Option<u32>;

    /// `tag`, if the message declares it.
    fn field_by_tag(tag: u32) -> Option<u32>;

    /// Reads the value of field `tag` into `self`.
    fn merge_field<R: TokenReader + ?Sized>(
        &mut self,
        tag: u32,
        input: &mut ValueReader<'_, R>,
    ) -> Result<(), CodecError>;

    /// Writes every present field in declaration order.
    fn write_fields<W: TokenWriter + ?Sized>(
        &self,
        out: &mut ValueWriter<'_, W>,
    ) -> Result<(), CodecError>;
}

/// An enum type with generated symbol tables.
pub trait ProtoEnum: Copy + Describe + 'static {
    /// Every value, in declaration order.
    const VALUES: &'static [Self];

    /// The declared number.
    fn number(self) -> i32;

    /// The value declared with `number`.
    fn from_number(number: i32) -> Option<Self>;

    /// The declared symbol.
    fn symbol(self) -> &'static str;

    /// The value declared as `symbol`.
    fn from_symbol(symbol: &str) -> Option<Self>;
}

/// Field equality for generated messages.
///
/// Floats compare by bit pattern, so a `NaN` field equals itself and a
/// message holding one still equals its decoded copy.
pub trait FieldEq {
    /// Whether `self` and `other` hold the same value.
    fn field_eq(&self, other: &Self) -> bool;
}

macro_rules! impl_field_eq {
    ($($ty:ty),* ; $($float:ty),*) => {
        $(
            impl FieldEq for $ty {
                fn field_eq(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
        $(
            impl FieldEq for $float {
                fn field_eq(&self, other: &Self) -> bool {
                    self.to_bits() == other.to_bits()
                }
            }
        )*
    };
}

impl_field_eq!(bool, i32, i64, u32, u64, String, Vec<u8>; f32, f64);

impl<T: FieldEq> FieldEq for Option<T> {
    fn field_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.field_eq(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: FieldEq> FieldEq for Repeated<T> {
    fn field_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a.field_eq(b))
    }
}

/// Whether no tag appears twice. Checked at compile time by
/// [`proto_message!`](crate::proto_message).
pub const fn distinct_tags(tags: &[u32]) -> bool {
    let mut i = 0;
    while i < tags.len() {
        let mut j = i + 1;
        while j < tags.len() {
            if tags[i] == tags[j] {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

/// Whether no name appears twice. Checked at compile time by
/// [`proto_message!`](crate::proto_message) and
/// [`proto_enum!`](crate::proto_enum).
pub const fn distinct_names(names: &[&str]) -> bool {
    let mut i = 0;
    while i < names.len() {
        let mut j = i + 1;
        while j < names.len() {
            if same_bytes(names[i].as_bytes(), names[j].as_bytes()) {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

const fn same_bytes(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

/// [`MessageAccess`] for a generated message type.
pub struct GeneratedAccess<M>(PhantomData<fn() -> M>);

impl<M> GeneratedAccess<M> {
    /// The access for `M`. It holds no state.
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<M> Default for GeneratedAccess<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: GeneratedMessage> FieldIndex for GeneratedAccess<M> {
    type Field = u32;

    fn field_by_name(&self, name: &str) -> Option<u32> {
        M::field_by_name(name)
    }

    fn field_by_tag(&self, tag: u32) -> Option<u32> {
        M::field_by_tag(tag)
    }
}

impl<M: GeneratedMessage> MessageAccess for GeneratedAccess<M> {
    type Message = M;
    type Builder = M;

    fn type_name(&self) -> &str {
        M::TYPE_NAME
    }

    fn new_builder(&self) -> M {
        M::default()
    }

    fn merge_field<R: TokenReader + ?Sized>(
        &self,
        builder: &mut M,
        field: u32,
        input: &mut ValueReader<'_, R>,
    ) -> Result<(), CodecError> {
        builder.merge_field(field, input)
    }

    fn finish(&self, builder: M) -> Result<M, CodecError> {
        Ok(builder)
    }

    fn write_fields<W: TokenWriter + ?Sized>(
        &self,
        message: &M,
        out: &mut ValueWriter<'_, W>,
    ) -> Result<(), CodecError> {
        message.write_fields(out)
    }
}

/// Writes a nested generated message. Used by [`proto_message!`](crate::proto_message).
pub fn encode_message<M: GeneratedMessage, W: TokenWriter + ?Sized>(
    message: &M,
    out: &mut ValueWriter<'_, W>,
) -> Result<(), CodecError> {
    out.message(&GeneratedAccess::<M>::new(), message)
}

/// Reads a nested generated message. Used by [`proto_message!`](crate::proto_message).
pub fn decode_message<M: GeneratedMessage, R: TokenReader + ?Sized>(
    input: &mut ValueReader<'_, R>,
) -> Result<M, CodecError> {
    input.message(&GeneratedAccess::<M>::new())
}

/// Writes a generated enum value. Used by [`proto_enum!`](crate::proto_enum).
pub fn encode_enum<E: ProtoEnum, W: TokenWriter + ?Sized>(
    value: E,
    out: &mut ValueWriter<'_, W>,
) -> Result<(), CodecError> {
    let keys = out.keys();
    scalar::write_enum(out.output(), keys, value.number(), Some(value.symbol()))
}

/// Reads a generated enum value. Used by [`proto_enum!`](crate::proto_enum).
pub fn decode_enum<E: ProtoEnum, R: TokenReader + ?Sized>(
    input: &mut ValueReader<'_, R>,
) -> Result<E, CodecError> {
    let values = E::VALUES.iter().map(|value| (value.symbol(), value.number()));
    let number = scalar::read_enum(input.input(), E::TYPE_NAME, values)?;
    E::from_number(number).ok_or_else(|| {
        CodecError::without_span(CodecErrorKind::UnknownEnumValue {
            enum_name: E::TYPE_NAME.to_owned(),
            value: number.to_string(),
            suggestion: None,
        })
    })
}

/// Codec bound to one generated message type.
///
/// ```
/// use protojson::{GeneratedJson, ProtobufJson, proto_enum, proto_message};
///
/// proto_enum! {
///     pub enum Status {
///         Pending = 0 as "PENDING",
///         Completed = 1 as "COMPLETED",
///     }
/// }
///
/// proto_message! {
///     pub struct Task {
///         pub id(1, "id"): optional int64,
///         pub status(4, "status"): optional enumeration<Status>,
///     }
/// }
///
/// let task = Task { id: Some(1), status: Some(Status::Completed) };
/// let named = GeneratedJson::<Task>::named();
/// assert_eq!(named.to_string(&task)?, r#"{"id":1,"status":"COMPLETED"}"#);
/// let numeric = GeneratedJson::<Task>::numeric();
/// assert_eq!(numeric.to_string(&task)?, r#"{"1":1,"4":1}"#);
/// assert_eq!(numeric.from_str(r#"{"1":1,"4":1}"#, "Task")?, task);
/// # Ok::<(), protojson::CodecError>(())
/// ```
pub struct GeneratedJson<M> {
    keys: KeyStrategy,
    _message: PhantomData<fn() -> M>,
}

impl<M> GeneratedJson<M> {
    /// A codec with the given key strategy.
    pub const fn new(keys: KeyStrategy) -> Self {
        Self {
            keys,
            _message: PhantomData,
        }
    }

    /// A codec using field names as keys.
    pub const fn named() -> Self {
        Self::new(KeyStrategy::Named)
    }

    /// A codec using field numbers as keys.
    pub const fn numeric() -> Self {
        Self::new(KeyStrategy::Numeric)
    }
}

impl<M> Clone for GeneratedJson<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for GeneratedJson<M> {}

impl<M> fmt::Debug for GeneratedJson<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedJson")
            .field("message", &core::any::type_name::<M>())
            .field("keys", &self.keys)
            .finish()
    }
}

impl<M: GeneratedMessage> GeneratedJson<M> {
    fn check_type(type_name: &str) -> Result<(), CodecError> {
        if type_name == M::TYPE_NAME {
            Ok(())
        } else {
            Err(CodecError::without_span(CodecErrorKind::MessageTypeMismatch {
                expected: M::TYPE_NAME.to_owned(),
                got: type_name.to_owned(),
            }))
        }
    }
}

impl<M: GeneratedMessage> ProtobufJson for GeneratedJson<M> {
    type Message = M;

    fn key_strategy(&self) -> KeyStrategy {
        self.keys
    }

    fn write_to<W: TokenWriter + ?Sized>(&self, out: &mut W, message: &M) -> Result<(), CodecError> {
        engine::write_message(out, &GeneratedAccess::<M>::new(), self.keys, message)
    }

    fn write_many<W: TokenWriter + ?Sized>(
        &self,
        out: &mut W,
        messages: &[M],
        type_name: &str,
    ) -> Result<(), CodecError> {
        Self::check_type(type_name)?;
        engine::write_many(out, &GeneratedAccess::<M>::new(), self.keys, messages)
    }

    fn parse_from<R: TokenReader + ?Sized>(
        &self,
        input: &mut R,
        type_name: &str,
    ) -> Result<M, CodecError> {
        Self::check_type(type_name)?;
        engine::read_message(input, &GeneratedAccess::<M>::new(), self.keys)
    }

    fn append_many<R: TokenReader + ?Sized>(
        &self,
        input: &mut R,
        out: &mut Vec<M>,
        type_name: &str,
    ) -> Result<usize, CodecError> {
        Self::check_type(type_name)?;
        engine::append_many(input, &GeneratedAccess::<M>::new(), self.keys, out)
    }
}
