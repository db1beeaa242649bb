use core::fmt;

/// Protobuf scalar field types.
///
/// The wire-level distinctions between, say, `int32`, `sint32` and `sfixed32`
/// do not exist in JSON; they are kept so a descriptor can describe a
/// `.proto` declaration faithfully. What matters to the codec is the value
/// width ([`ScalarKind::is_64_bit`]) and signedness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// 64-bit IEEE 754 float
    Double,
    /// 32-bit IEEE 754 float
    Float,
    /// signed 32-bit, varint encoded
    Int32,
    /// signed 64-bit, varint encoded
    Int64,
    /// unsigned 32-bit, varint encoded
    Uint32,
    /// unsigned 64-bit, varint encoded
    Uint64,
    /// signed 32-bit, zigzag encoded
    Sint32,
    /// signed 64-bit, zigzag encoded
    Sint64,
    /// unsigned 32-bit, fixed width
    Fixed32,
    /// unsigned 64-bit, fixed width
    Fixed64,
    /// signed 32-bit, fixed width
    Sfixed32,
    /// signed 64-bit, fixed width
    Sfixed64,
    /// boolean
    Bool,
    /// UTF-8 text
    String,
    /// arbitrary bytes
    Bytes,
}

impl ScalarKind {
    /// All scalar kinds, in `.proto` declaration-table order.
    pub const ALL: [ScalarKind; 15] = [
        ScalarKind::Double,
        ScalarKind::Float,
        ScalarKind::Int32,
        ScalarKind::Int64,
        ScalarKind::Uint32,
        ScalarKind::Uint64,
        ScalarKind::Sint32,
        ScalarKind::Sint64,
        ScalarKind::Fixed32,
        ScalarKind::Fixed64,
        ScalarKind::Sfixed32,
        ScalarKind::Sfixed64,
        ScalarKind::Bool,
        ScalarKind::String,
        ScalarKind::Bytes,
    ];

    /// The keyword used for this kind in a `.proto` file.
    pub const fn proto_name(self) -> &'static str {
        match self {
            ScalarKind::Double => "double",
            ScalarKind::Float => "float",
            ScalarKind::Int32 => "int32",
            ScalarKind::Int64 => "int64",
            ScalarKind::Uint32 => "uint32",
            ScalarKind::Uint64 => "uint64",
            ScalarKind::Sint32 => "sint32",
            ScalarKind::Sint64 => "sint64",
            ScalarKind::Fixed32 => "fixed32",
            ScalarKind::Fixed64 => "fixed64",
            ScalarKind::Sfixed32 => "sfixed32",
            ScalarKind::Sfixed64 => "sfixed64",
            ScalarKind::Bool => "bool",
            ScalarKind::String => "string",
            ScalarKind::Bytes => "bytes",
        }
    }

    /// Integer kinds holding 64-bit values.
    ///
    /// JSON numbers lose precision past 2^53, so readers also accept these
    /// as quoted decimal strings.
    pub const fn is_64_bit(self) -> bool {
        matches!(
            self,
            ScalarKind::Int64
                | ScalarKind::Uint64
                | ScalarKind::Sint64
                | ScalarKind::Fixed64
                | ScalarKind::Sfixed64
        )
    }

    /// Any of the integer kinds.
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            ScalarKind::Int32
                | ScalarKind::Int64
                | ScalarKind::Uint32
                | ScalarKind::Uint64
                | ScalarKind::Sint32
                | ScalarKind::Sint64
                | ScalarKind::Fixed32
                | ScalarKind::Fixed64
                | ScalarKind::Sfixed32
                | ScalarKind::Sfixed64
        )
    }

    /// `float` or `double`.
    pub const fn is_floating(self) -> bool {
        matches!(self, ScalarKind::Double | ScalarKind::Float)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.proto_name())
    }
}

/// What a field holds.
///
/// Enum and message references are by type name and are resolved against
/// the [`Schema`](crate::Schema) that owns the descriptor, which is what
/// allows a message to refer to itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A scalar value.
    Scalar(ScalarKind),
    /// An enum value; the string names the enum type.
    Enum(String),
    /// A nested message; the string names the message type.
    Message(String),
}

impl FieldKind {
    /// The referenced enum or message type, if any.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            FieldKind::Scalar(_) => None,
            FieldKind::Enum(name) | FieldKind::Message(name) => Some(name),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Scalar(kind) => write!(f, "{kind}"),
            FieldKind::Enum(name) => write!(f, "enum {name}"),
            FieldKind::Message(name) => write!(f, "message {name}"),
        }
    }
}
