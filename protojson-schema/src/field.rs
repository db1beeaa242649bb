use crate::{FieldKind, ScalarKind};

/// Largest field number protobuf allows (2^29 - 1).
pub const MAX_TAG: u32 = 536_870_911;

/// Field numbers reserved for the protobuf implementation itself.
pub const RESERVED_TAGS: core::ops::RangeInclusive<u32> = 19_000..=19_999;

/// Describes one field of a message type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    tag: u32,
    name: String,
    kind: FieldKind,
    repeated: bool,
}

impl FieldDescriptor {
    /// A singular field of the given kind.
    pub fn new(tag: u32, name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            tag,
            name: name.into(),
            kind,
            repeated: false,
        }
    }

    /// A singular scalar field.
    pub fn scalar(tag: u32, name: impl Into<String>, kind: ScalarKind) -> Self {
        Self::new(tag, name, FieldKind::Scalar(kind))
    }

    /// A singular field holding a value of the enum `type_name`.
    pub fn enumeration(tag: u32, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(tag, name, FieldKind::Enum(type_name.into()))
    }

    /// A singular field holding a nested `type_name` message.
    pub fn message(tag: u32, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(tag, name, FieldKind::Message(type_name.into()))
    }

    /// Marks the field as repeated.
    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    /// The field number.
    pub fn tag(&self) -> u32 {
        self.tag
    }

    /// The declared field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// What the field holds.
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Whether the field holds a sequence of values.
    pub fn is_repeated(&self) -> bool {
        self.repeated
    }

    /// The scalar kind, for scalar fields.
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self.kind {
            FieldKind::Scalar(kind) => Some(kind),
            _ => None,
        }
    }

    pub(crate) fn has_valid_tag(&self) -> bool {
        (1..=MAX_TAG).contains(&self.tag) && !RESERVED_TAGS.contains(&self.tag)
    }
}
