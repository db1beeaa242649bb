use std::collections::HashMap;

use crate::{FieldDescriptor, SchemaError, SchemaErrorKind};

/// Describes a message type: its name and its fields in declaration order.
///
/// Lookups by tag and by name are served from indices built once, when the
/// descriptor is built.
#[derive(Debug, Clone)]
pub struct MessageDescriptor {
    name: String,
    fields: Vec<FieldDescriptor>,
    by_tag: HashMap<u32, usize>,
    by_name: HashMap<String, usize>,
}

impl MessageDescriptor {
    /// Starts describing the message type `name`.
    pub fn builder(name: impl Into<String>) -> MessageDescriptorBuilder {
        MessageDescriptorBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// The type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Looks a field up by tag.
    pub fn field_by_tag(&self, tag: u32) -> Option<&FieldDescriptor> {
        self.by_tag.get(&tag).map(|&index| &self.fields[index])
    }

    /// Looks a field up by its exact, case-sensitive name.
    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|&index| &self.fields[index])
    }
}

impl PartialEq for MessageDescriptor {
    fn eq(&self, other: &Self) -> bool {
        // the indices are derived from `fields`
        self.name == other.name && self.fields == other.fields
    }
}

impl Eq for MessageDescriptor {}

/// Accumulates fields for a [`MessageDescriptor`].
#[derive(Debug, Clone)]
pub struct MessageDescriptorBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl MessageDescriptorBuilder {
    /// Appends a field; declaration order is the order of these calls.
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Appends several fields.
    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Validates the fields and builds the lookup indices.
    pub fn build(self) -> Result<MessageDescriptor, SchemaError> {
        let mut by_tag = HashMap::with_capacity(self.fields.len());
        let mut by_name = HashMap::with_capacity(self.fields.len());

        for (index, field) in self.fields.iter().enumerate() {
            if !field.has_valid_tag() {
                return Err(SchemaError::new(
                    &self.name,
                    SchemaErrorKind::InvalidTag {
                        field: field.name().to_owned(),
                        tag: field.tag(),
                    },
                ));
            }
            if field.name().is_empty() {
                return Err(SchemaError::new(
                    &self.name,
                    SchemaErrorKind::EmptyFieldName { tag: field.tag() },
                ));
            }
            if let Some(&first) = by_tag.get(&field.tag()) {
                let first: &FieldDescriptor = &self.fields[first];
                return Err(SchemaError::new(
                    &self.name,
                    SchemaErrorKind::DuplicateTag {
                        tag: field.tag(),
                        first: first.name().to_owned(),
                        second: field.name().to_owned(),
                    },
                ));
            }
            if by_name.contains_key(field.name()) {
                return Err(SchemaError::new(
                    &self.name,
                    SchemaErrorKind::DuplicateFieldName {
                        name: field.name().to_owned(),
                    },
                ));
            }
            by_tag.insert(field.tag(), index);
            by_name.insert(field.name().to_owned(), index);
        }

        Ok(MessageDescriptor {
            name: self.name,
            fields: self.fields,
            by_tag,
            by_name,
        })
    }
}
