#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod enum_;
mod error;
mod field;
mod kind;
mod message;
mod schema;

pub use enum_::{EnumDescriptor, EnumDescriptorBuilder};
pub use error::{SchemaError, SchemaErrorKind};
pub use field::{FieldDescriptor, MAX_TAG, RESERVED_TAGS};
pub use kind::{FieldKind, ScalarKind};
pub use message::{MessageDescriptor, MessageDescriptorBuilder};
pub use schema::{Describe, Schema, SchemaBuilder};
