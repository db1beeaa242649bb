#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

/// Trace-level logging macro that forwards to `tracing::trace!` when the `tracing` feature is enabled.
#[cfg(feature = "tracing")]
#[allow(unused_macros)]
macro_rules! trace {
    ($($arg:tt)*) => {
        ::tracing::trace!($($arg)*)
    };
}

/// Trace-level logging macro (no-op when `tracing` feature is disabled).
#[cfg(not(feature = "tracing"))]
#[allow(unused_macros)]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

/// Debug-level logging macro that forwards to `tracing::debug!` when the `tracing` feature is enabled.
#[cfg(feature = "tracing")]
#[allow(unused_macros)]
macro_rules! debug {
    ($($arg:tt)*) => {
        ::tracing::debug!($($arg)*)
    };
}

/// Debug-level logging macro (no-op when `tracing` feature is disabled).
#[cfg(not(feature = "tracing"))]
#[allow(unused_macros)]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

#[allow(unused_imports)]
pub(crate) use debug;
#[allow(unused_imports)]
pub(crate) use trace;

mod codec;
mod engine;
mod error;
mod generated;
mod keys;
mod macros;
mod reader;
mod reflective;
mod repeated;
pub mod scalar;
mod scanner;
mod stream;
mod writer;

pub use protojson_schema as schema;
pub use protojson_value as value;

pub use codec::ProtobufJson;
pub use engine::{
    Decode, Encode, FieldSlot, MessageAccess, ValueReader, ValueWriter, append_many,
    read_message, skip_value, write_many, write_message,
};
pub use error::{CodecError, CodecErrorKind};
pub use generated::{FieldEq, GeneratedAccess, GeneratedJson, GeneratedMessage, ProtoEnum};
pub use keys::{FieldIndex, KeyStrategy};
pub use reader::{DEFAULT_MAX_DEPTH, JsonReader};
pub use reflective::{ReflectiveAccess, ReflectiveJson};
pub use repeated::Repeated;
pub use scanner::ScanErrorKind;
pub use stream::{Span, Token, TokenReader, TokenWriter};
pub use writer::{JsonWriter, WriteOptions};

#[doc(hidden)]
pub use generated::{
    decode_enum, decode_message, distinct_names, distinct_tags, encode_enum, encode_message,
};
