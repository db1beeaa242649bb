//! Mapping between fields and JSON object keys.

use std::borrow::Cow;

use protojson_schema::{FieldDescriptor, MessageDescriptor};

/// How fields are keyed in JSON objects.
///
/// The same strategy must be used on both ends: a reader configured for
/// numeric keys treats named keys as unknown fields (and skips them), and
/// vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyStrategy {
    /// Keys are declared field names, e.g. `"firstName"`. Enums are written
    /// as their symbols.
    #[default]
    Named,
    /// Keys are field numbers in decimal, e.g. `"2"`. Enums are written as
    /// their numbers.
    Numeric,
}

impl KeyStrategy {
    /// The key for a field.
    pub fn encode_key(self, tag: u32, name: &str) -> Cow<'_, str> {
        match self {
            KeyStrategy::Named => Cow::Borrowed(name),
            KeyStrategy::Numeric => {
                let mut buf = itoa::Buffer::new();
                Cow::Owned(buf.format(tag).to_owned())
            }
        }
    }

    /// The field a key refers to, or `None` for a key this message does not
    /// know about.
    pub fn resolve_key<I: FieldIndex + ?Sized>(self, index: &I, key: &str) -> Option<I::Field> {
        match self {
            KeyStrategy::Named => index.field_by_name(key),
            KeyStrategy::Numeric => {
                // u32's parser would also take a leading '+'
                if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                index.field_by_tag(key.parse().ok()?)
            }
        }
    }

    /// Whether enum values are written as numbers rather than symbols.
    pub const fn enums_as_numbers(self) -> bool {
        matches!(self, KeyStrategy::Numeric)
    }
}

/// Field lookup by name or by number.
pub trait FieldIndex {
    /// Whatever identifies a field to the caller.
    type Field;

    /// Finds a field by its declared name.
    fn field_by_name(&self, name: &str) -> Option<Self::Field>;

    /// Finds a field by its number.
    fn field_by_tag(&self, tag: u32) -> Option<Self::Field>;
}

impl<'a> FieldIndex for &'a MessageDescriptor {
    type Field = &'a FieldDescriptor;

    fn field_by_name(&self, name: &str) -> Option<Self::Field> {
        MessageDescriptor::field_by_name(*self, name)
    }

    fn field_by_tag(&self, tag: u32) -> Option<Self::Field> {
        MessageDescriptor::field_by_tag(*self, tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protojson_schema::ScalarKind;
    use protojson_testhelpers::test;

    fn task() -> MessageDescriptor {
        MessageDescriptor::builder("Task")
            .field(FieldDescriptor::scalar(1, "id", ScalarKind::Int64))
            .field(FieldDescriptor::scalar(2, "name", ScalarKind::String))
            .field(FieldDescriptor::enumeration(4, "status", "Status"))
            .build()
            .unwrap()
    }

    #[test]
    fn encode() {
        assert_eq!(KeyStrategy::Named.encode_key(4, "status"), "status");
        assert_eq!(KeyStrategy::Numeric.encode_key(4, "status"), "4");
        assert_eq!(KeyStrategy::Numeric.encode_key(536_870_911, "x"), "536870911");
    }

    #[test]
    fn resolve_named() {
        let task = task();
        let index = &task;
        let keys = KeyStrategy::Named;
        assert_eq!(keys.resolve_key(&index, "name").map(|f| f.tag()), Some(2));
        assert!(keys.resolve_key(&index, "Name").is_none());
        assert!(keys.resolve_key(&index, "2").is_none());
    }

    #[test]
    fn resolve_numeric() {
        let task = task();
        let index = &task;
        let keys = KeyStrategy::Numeric;
        assert_eq!(keys.resolve_key(&index, "4").map(|f| f.name()), Some("status"));
        assert_eq!(keys.resolve_key(&index, "01").map(|f| f.tag()), Some(1));
        for unknown in ["3", "name", "", "+1", "-1", "1.0", "99999999999"] {
            assert!(keys.resolve_key(&index, unknown).is_none(), "{unknown:?}");
        }
    }

    #[test]
    fn enum_representation_follows_keys() {
        assert!(!KeyStrategy::Named.enums_as_numbers());
        assert!(KeyStrategy::Numeric.enums_as_numbers());
        assert_eq!(KeyStrategy::default(), KeyStrategy::Named);
    }
}
