use protojson_schema::{FieldKind, ScalarKind};

use crate::DynamicMessage;

/// A single field value.
///
/// The variant is dictated by the field kind: the protobuf integer
/// encodings collapse to their Rust width (`sint32`, `sfixed32` and `int32`
/// are all [`Value::I32`]), enums carry their number, nested messages are
/// [`DynamicMessage`]s.
///
/// Floats compare by bit pattern, so `NaN` equals itself and `0.0` differs
/// from `-0.0`.
#[derive(Debug, Clone)]
pub enum Value {
    /// `bool`
    Bool(bool),
    /// `int32`, `sint32`, `sfixed32`
    I32(i32),
    /// `int64`, `sint64`, `sfixed64`
    I64(i64),
    /// `uint32`, `fixed32`
    U32(u32),
    /// `uint64`, `fixed64`
    U64(u64),
    /// `float`
    F32(f32),
    /// `double`
    F64(f64),
    /// `string`
    String(String),
    /// `bytes`
    Bytes(Vec<u8>),
    /// An enum value, by number
    Enum(i32),
    /// A nested message
    Message(DynamicMessage),
}

impl Value {
    /// Short name of the variant, for error messages.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Enum(_) => "enum",
            Value::Message(_) => "message",
        }
    }

    /// Whether this value may be stored in a field of `kind`.
    ///
    /// Enum numbers are not checked against the enum's values here; the
    /// codec does that when it has the enum descriptor at hand.
    pub fn matches(&self, kind: &FieldKind) -> bool {
        match (self, kind) {
            (Value::Enum(_), FieldKind::Enum(_)) => true,
            (Value::Message(message), FieldKind::Message(name)) => message.type_name() == name,
            (value, FieldKind::Scalar(scalar)) => value.matches_scalar(*scalar),
            _ => false,
        }
    }

    fn matches_scalar(&self, kind: ScalarKind) -> bool {
        use ScalarKind as K;
        matches!(
            (self, kind),
            (Value::Bool(_), K::Bool)
                | (Value::I32(_), K::Int32 | K::Sint32 | K::Sfixed32)
                | (Value::I64(_), K::Int64 | K::Sint64 | K::Sfixed64)
                | (Value::U32(_), K::Uint32 | K::Fixed32)
                | (Value::U64(_), K::Uint64 | K::Fixed64)
                | (Value::F32(_), K::Float)
                | (Value::F64(_), K::Double)
                | (Value::String(_), K::String)
                | (Value::Bytes(_), K::Bytes)
        )
    }

    /// The string, for `string` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The number, for any signed or unsigned integer value that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I32(v) => Some(v.into()),
            Value::I64(v) => Some(v),
            Value::U32(v) => Some(v.into()),
            Value::U64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// The enum number, for enum values.
    pub fn as_enum(&self) -> Option<i32> {
        match *self {
            Value::Enum(number) => Some(number),
            _ => None,
        }
    }

    /// The nested message, for message values.
    pub fn as_message(&self) -> Option<&DynamicMessage> {
        match self {
            Value::Message(message) => Some(message),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a.to_bits() == b.to_bits(),
            (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Message(a), Value::Message(b)) => a == b,
            _ => false,
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i32 => I32,
    i64 => I64,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => String,
    &str => String,
    Vec<u8> => Bytes,
    &[u8] => Bytes,
    DynamicMessage => Message,
}

/// The stored state of a present field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A singular field's value
    Single(Value),
    /// A repeated field's values, possibly none
    Repeated(Vec<Value>),
}

impl FieldValue {
    /// The value, for singular fields.
    pub fn as_single(&self) -> Option<&Value> {
        match self {
            FieldValue::Single(value) => Some(value),
            FieldValue::Repeated(_) => None,
        }
    }

    /// The values, for repeated fields.
    pub fn as_repeated(&self) -> Option<&[Value]> {
        match self {
            FieldValue::Single(_) => None,
            FieldValue::Repeated(values) => Some(values),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protojson_testhelpers::test;

    #[test]
    fn scalar_width_matching() {
        let int32 = FieldKind::Scalar(ScalarKind::Sfixed32);
        assert!(Value::I32(-1).matches(&int32));
        assert!(!Value::I64(-1).matches(&int32));
        assert!(!Value::U32(1).matches(&int32));

        let fixed64 = FieldKind::Scalar(ScalarKind::Fixed64);
        assert!(Value::U64(7).matches(&fixed64));
        assert!(!Value::F64(7.0).matches(&fixed64));
    }

    #[test]
    fn enum_and_message_matching() {
        assert!(Value::Enum(3).matches(&FieldKind::Enum("Status".into())));
        assert!(!Value::I32(3).matches(&FieldKind::Enum("Status".into())));
        assert!(!Value::Enum(3).matches(&FieldKind::Message("Task".into())));
    }

    #[test]
    fn floats_compare_by_bits() {
        assert_eq!(Value::F64(f64::NAN), Value::F64(f64::NAN));
        assert_eq!(Value::F32(f32::NAN), Value::F32(f32::NAN));
        assert_ne!(Value::F64(0.0), Value::F64(-0.0));
        assert_ne!(Value::F64(1.0), Value::F32(1.0));
        assert_eq!(Value::F32(1.5), Value::from(1.5f32));
    }

    #[test]
    fn accessors() {
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::U64(u64::MAX).as_i64(), None);
        assert_eq!(Value::U32(5).as_i64(), Some(5));
        assert_eq!(Value::Enum(1).as_enum(), Some(1));
        assert_eq!(Value::from(&b"ab"[..]), Value::Bytes(vec![b'a', b'b']));
    }
}
