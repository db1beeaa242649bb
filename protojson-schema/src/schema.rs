use std::collections::HashMap;
use std::sync::Arc;

use crate::{EnumDescriptor, FieldKind, MessageDescriptor, SchemaError, SchemaErrorKind};

/// A validated set of message and enum descriptors.
///
/// Every enum or message reference made by a field resolves to a descriptor
/// in the same schema. A schema is immutable and meant to be built once and
/// shared (it is `Send + Sync`; wrap it in an [`Arc`] to hand it to several
/// codecs).
#[derive(Debug, Clone, Default)]
pub struct Schema {
    messages: HashMap<String, Arc<MessageDescriptor>>,
    enums: HashMap<String, Arc<EnumDescriptor>>,
}

impl Schema {
    /// Starts collecting descriptors.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// The message type called `name`.
    pub fn message(&self, name: &str) -> Option<&Arc<MessageDescriptor>> {
        self.messages.get(name)
    }

    /// The enum type called `name`.
    pub fn enumeration(&self, name: &str) -> Option<&Arc<EnumDescriptor>> {
        self.enums.get(name)
    }

    /// All message types, in no particular order.
    pub fn messages(&self) -> impl Iterator<Item = &Arc<MessageDescriptor>> {
        self.messages.values()
    }

    /// All enum types, in no particular order.
    pub fn enums(&self) -> impl Iterator<Item = &Arc<EnumDescriptor>> {
        self.enums.values()
    }
}

/// A type that can add its own descriptor (and those of the types it
/// refers to) to a [`SchemaBuilder`].
///
/// Types produced by `protojson`'s generation macros implement this, so a
/// reflective codec can be built from the same list of types a generated
/// codec is bound to.
pub trait Describe {
    /// Name the type is registered under.
    const TYPE_NAME: &'static str;

    /// Adds this type's descriptor to `schema`, then its dependencies.
    ///
    /// Implementations must check [`SchemaBuilder::contains`] first so that
    /// recursive types terminate.
    fn describe(schema: &mut SchemaBuilder);
}

/// Collects descriptors, then validates them all at once in [`build`].
///
/// [`build`]: SchemaBuilder::build
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    messages: HashMap<String, Arc<MessageDescriptor>>,
    enums: HashMap<String, Arc<EnumDescriptor>>,
    errors: Vec<SchemaError>,
}

impl SchemaBuilder {
    /// Adds a message descriptor.
    pub fn message(mut self, descriptor: MessageDescriptor) -> Self {
        self.insert_message(descriptor);
        self
    }

    /// Adds an enum descriptor.
    pub fn enumeration(mut self, descriptor: EnumDescriptor) -> Self {
        self.insert_enum(descriptor);
        self
    }

    /// Adds a type (and, transitively, the types it refers to).
    pub fn register<T: Describe>(mut self) -> Self {
        T::describe(&mut self);
        self
    }

    /// Whether a type called `name` was already added.
    pub fn contains(&self, name: &str) -> bool {
        self.messages.contains_key(name) || self.enums.contains_key(name)
    }

    /// Adds a message descriptor in place.
    ///
    /// Adding an identical descriptor twice is a no-op; adding a different
    /// one under a name already taken is reported by [`build`](Self::build).
    pub fn insert_message(&mut self, descriptor: MessageDescriptor) {
        if let Some(existing) = self.messages.get(descriptor.name()) {
            if **existing != descriptor {
                self.duplicate(descriptor.name());
            }
            return;
        }
        if self.enums.contains_key(descriptor.name()) {
            self.duplicate(descriptor.name());
            return;
        }
        self.messages
            .insert(descriptor.name().to_owned(), Arc::new(descriptor));
    }

    /// Adds an enum descriptor in place. Same duplicate rules as
    /// [`insert_message`](Self::insert_message).
    pub fn insert_enum(&mut self, descriptor: EnumDescriptor) {
        if let Some(existing) = self.enums.get(descriptor.name()) {
            if **existing != descriptor {
                self.duplicate(descriptor.name());
            }
            return;
        }
        if self.messages.contains_key(descriptor.name()) {
            self.duplicate(descriptor.name());
            return;
        }
        self.enums
            .insert(descriptor.name().to_owned(), Arc::new(descriptor));
    }

    /// Records an error hit while producing a descriptor, to be returned
    /// from [`build`](Self::build).
    pub fn record_error(&mut self, error: SchemaError) {
        self.errors.push(error);
    }

    fn duplicate(&mut self, name: &str) {
        self.errors
            .push(SchemaError::new(name, SchemaErrorKind::DuplicateType));
    }

    /// Checks every field reference and freezes the schema.
    ///
    /// Reports the first recorded error, if any.
    pub fn build(mut self) -> Result<Schema, SchemaError> {
        if !self.errors.is_empty() {
            return Err(self.errors.swap_remove(0));
        }

        for message in self.messages.values() {
            for field in message.fields() {
                let (reference, expected) = match field.kind() {
                    FieldKind::Scalar(_) => continue,
                    FieldKind::Enum(name) => (name, "enum"),
                    FieldKind::Message(name) => (name, "message"),
                };
                let found = match expected {
                    "enum" => self.enums.contains_key(reference.as_str()),
                    _ => self.messages.contains_key(reference.as_str()),
                };
                if found {
                    continue;
                }
                let kind = if self.contains(reference) {
                    SchemaErrorKind::WrongTypeKind {
                        field: field.name().to_owned(),
                        reference: reference.clone(),
                        expected,
                    }
                } else {
                    SchemaErrorKind::UnresolvedType {
                        field: field.name().to_owned(),
                        reference: reference.clone(),
                    }
                };
                return Err(SchemaError::new(message.name(), kind));
            }
        }

        Ok(Schema {
            messages: self.messages,
            enums: self.enums,
        })
    }
}
