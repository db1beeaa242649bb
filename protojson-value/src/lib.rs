#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod error;
mod message;
mod value;

pub use error::ValueError;
pub use message::{DynamicMessage, DynamicMessageBuilder};
pub use value::{FieldValue, Value};
