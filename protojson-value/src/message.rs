use core::fmt;
use std::collections::BTreeMap;
use std::sync::Arc;

use protojson_schema::{FieldDescriptor, MessageDescriptor};

use crate::{FieldValue, Value, ValueError};

/// A message whose shape is given by a [`MessageDescriptor`] at runtime.
///
/// Only present fields are stored. Built through [`DynamicMessageBuilder`],
/// which type-checks every value against its field.
#[derive(Clone)]
pub struct DynamicMessage {
    descriptor: Arc<MessageDescriptor>,
    fields: BTreeMap<u32, FieldValue>,
}

impl DynamicMessage {
    /// A message of type `descriptor` with every field absent.
    pub fn new(descriptor: Arc<MessageDescriptor>) -> Self {
        Self {
            descriptor,
            fields: BTreeMap::new(),
        }
    }

    /// Starts building a message of type `descriptor`.
    pub fn builder(descriptor: Arc<MessageDescriptor>) -> DynamicMessageBuilder {
        DynamicMessageBuilder {
            message: Self::new(descriptor),
        }
    }

    /// Reopens the message for modification.
    pub fn into_builder(self) -> DynamicMessageBuilder {
        DynamicMessageBuilder { message: self }
    }

    /// The message type.
    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    /// The message type name.
    pub fn type_name(&self) -> &str {
        self.descriptor.name()
    }

    /// The stored state of field `tag`, or `None` when absent.
    pub fn get(&self, tag: u32) -> Option<&FieldValue> {
        self.fields.get(&tag)
    }

    /// Like [`get`](Self::get), by field name.
    pub fn get_by_name(&self, name: &str) -> Option<&FieldValue> {
        let field = self.descriptor.field_by_name(name)?;
        self.fields.get(&field.tag())
    }

    /// The value of singular field `tag`, or `None` when absent.
    pub fn single(&self, tag: u32) -> Option<&Value> {
        self.get(tag).and_then(FieldValue::as_single)
    }

    /// The elements of repeated field `tag`; empty when absent.
    pub fn repeated(&self, tag: u32) -> &[Value] {
        self.get(tag)
            .and_then(FieldValue::as_repeated)
            .unwrap_or_default()
    }

    /// Whether field `tag` is present.
    pub fn has(&self, tag: u32) -> bool {
        self.fields.contains_key(&tag)
    }

    /// Number of elements in repeated field `tag`.
    pub fn repeated_len(&self, tag: u32) -> usize {
        self.repeated(tag).len()
    }

    /// Present fields, in declaration order.
    pub fn present_fields(&self) -> impl Iterator<Item = (&FieldDescriptor, &FieldValue)> {
        self.descriptor
            .fields()
            .iter()
            .filter_map(|field| Some((field, self.fields.get(&field.tag())?)))
    }
}

impl PartialEq for DynamicMessage {
    fn eq(&self, other: &Self) -> bool {
        if self.type_name() != other.type_name() {
            return false;
        }
        // an absent repeated field reads as empty, so both sides are
        // compared through the same accessors
        self.descriptor.fields().iter().all(|field| {
            let tag = field.tag();
            if field.is_repeated() {
                self.repeated(tag) == other.repeated(tag)
            } else {
                self.single(tag) == other.single(tag)
            }
        })
    }
}

impl fmt::Debug for DynamicMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.type_name());
        for (field, value) in self.present_fields() {
            match value {
                FieldValue::Single(value) => s.field(field.name(), value),
                FieldValue::Repeated(values) => s.field(field.name(), values),
            };
        }
        s.finish()
    }
}

/// Mutable access to a [`DynamicMessage`] under construction.
#[derive(Debug, Clone)]
pub struct DynamicMessageBuilder {
    message: DynamicMessage,
}

impl DynamicMessageBuilder {
    /// The message type.
    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.message.descriptor
    }

    /// Sets singular field `tag`, replacing any previous value.
    pub fn set(&mut self, tag: u32, value: Value) -> Result<&mut Self, ValueError> {
        let field = self.field(tag)?;
        if field.is_repeated() {
            return Err(ValueError::NotSingular {
                field: self.qualified(field),
            });
        }
        self.check(field, &value)?;
        self.message.fields.insert(tag, FieldValue::Single(value));
        Ok(self)
    }

    /// Like [`set`](Self::set), by field name.
    pub fn set_by_name(&mut self, name: &str, value: Value) -> Result<&mut Self, ValueError> {
        let tag = self
            .message
            .descriptor
            .field_by_name(name)
            .map(FieldDescriptor::tag)
            .ok_or_else(|| ValueError::UnknownField {
                message: self.message.type_name().to_owned(),
                field: name.to_owned(),
            })?;
        self.set(tag, value)
    }

    /// Appends an element to repeated field `tag`, making it present.
    pub fn push(&mut self, tag: u32, value: Value) -> Result<&mut Self, ValueError> {
        self.extend(tag, [value])
    }

    /// Appends elements to repeated field `tag`, making it present even
    /// when `values` is empty.
    ///
    /// Nothing is appended if any element has the wrong kind.
    pub fn extend(
        &mut self,
        tag: u32,
        values: impl IntoIterator<Item = Value>,
    ) -> Result<&mut Self, ValueError> {
        let field = self.field(tag)?;
        if !field.is_repeated() {
            return Err(ValueError::NotRepeated {
                field: self.qualified(field),
            });
        }
        let values: Vec<Value> = values.into_iter().collect();
        for value in &values {
            self.check(field, value)?;
        }
        let entry = self
            .message
            .fields
            .entry(tag)
            .or_insert_with(|| FieldValue::Repeated(Vec::new()));
        // set() never stores a single value under a repeated tag
        if let FieldValue::Repeated(existing) = entry {
            existing.extend(values);
        }
        Ok(self)
    }

    /// Replaces the elements of repeated field `tag`.
    pub fn set_repeated(
        &mut self,
        tag: u32,
        values: impl IntoIterator<Item = Value>,
    ) -> Result<&mut Self, ValueError> {
        let field = self.field(tag)?;
        if !field.is_repeated() {
            return Err(ValueError::NotRepeated {
                field: self.qualified(field),
            });
        }
        let values: Vec<Value> = values.into_iter().collect();
        for value in &values {
            self.check(field, value)?;
        }
        self.message.fields.insert(tag, FieldValue::Repeated(values));
        Ok(self)
    }

    /// Makes field `tag` absent again.
    pub fn clear(&mut self, tag: u32) -> &mut Self {
        self.message.fields.remove(&tag);
        self
    }

    /// Whether field `tag` is present so far.
    pub fn has(&self, tag: u32) -> bool {
        self.message.has(tag)
    }

    /// Finishes the message.
    pub fn build(self) -> DynamicMessage {
        self.message
    }

    fn field(&self, tag: u32) -> Result<&FieldDescriptor, ValueError> {
        self.message
            .descriptor
            .field_by_tag(tag)
            .ok_or_else(|| ValueError::UnknownField {
                message: self.message.type_name().to_owned(),
                field: tag.to_string(),
            })
    }

    fn qualified(&self, field: &FieldDescriptor) -> String {
        format!("{}.{}", self.message.type_name(), field.name())
    }

    fn check(&self, field: &FieldDescriptor, value: &Value) -> Result<(), ValueError> {
        if value.matches(field.kind()) {
            Ok(())
        } else {
            Err(ValueError::TypeMismatch {
                field: self.qualified(field),
                expected: field.kind().to_string(),
                found: value.kind_name(),
            })
        }
    }
}
