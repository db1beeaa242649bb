//! Runtime dispatch: fields are found by walking a [`Schema`].

use std::sync::Arc;

use protojson_schema::{
    EnumDescriptor, FieldDescriptor, FieldKind, MessageDescriptor, ScalarKind, Schema,
};
use protojson_value::{DynamicMessage, DynamicMessageBuilder, FieldValue, Value, ValueError};

use crate::engine::{self, MessageAccess, ValueReader, ValueWriter};
use crate::{
    CodecError, CodecErrorKind, FieldIndex, KeyStrategy, ProtobufJson, TokenReader, TokenWriter,
    scalar,
};

/// [`MessageAccess`] for one message type of a [`Schema`], over
/// [`DynamicMessage`].
#[derive(Debug, Clone, Copy)]
pub struct ReflectiveAccess<'s> {
    schema: &'s Schema,
    descriptor: &'s Arc<MessageDescriptor>,
}

impl<'s> ReflectiveAccess<'s> {
    /// Access to the message type `type_name` of `schema`.
    pub fn new(schema: &'s Schema, type_name: &str) -> Result<Self, CodecError> {
        let descriptor = schema.message(type_name).ok_or_else(|| {
            CodecError::without_span(CodecErrorKind::UnknownMessageType {
                type_name: type_name.to_owned(),
            })
        })?;
        Ok(Self { schema, descriptor })
    }

    /// The message type.
    pub fn descriptor(&self) -> &'s Arc<MessageDescriptor> {
        self.descriptor
    }

    /// Fails unless `message` is of this access's message type.
    pub fn check(&self, message: &DynamicMessage) -> Result<(), CodecError> {
        let theirs = message.descriptor();
        if Arc::ptr_eq(theirs, self.descriptor) || **theirs == **self.descriptor {
            Ok(())
        } else {
            Err(CodecError::without_span(CodecErrorKind::MessageTypeMismatch {
                expected: self.descriptor.name().to_owned(),
                got: message.type_name().to_owned(),
            }))
        }
    }

    fn enumeration(&self, type_name: &str) -> Result<&'s EnumDescriptor, CodecError> {
        // schemas are validated on build, so this only fails for hand-built access
        self.schema
            .enumeration(type_name)
            .map(|descriptor| &**descriptor)
            .ok_or_else(|| {
                CodecError::without_span(CodecErrorKind::UnknownMessageType {
                    type_name: type_name.to_owned(),
                })
            })
    }

    fn read_value<R: TokenReader + ?Sized>(
        &self,
        field: &FieldDescriptor,
        input: &mut ValueReader<'_, R>,
    ) -> Result<Value, CodecError> {
        match field.kind() {
            FieldKind::Scalar(kind) => read_scalar(*kind, input.input()),
            FieldKind::Enum(type_name) => {
                let descriptor = self.enumeration(type_name)?;
                let number =
                    scalar::read_enum(input.input(), descriptor.name(), descriptor.values())?;
                Ok(Value::Enum(number))
            }
            FieldKind::Message(type_name) => {
                let nested = Self::new(self.schema, type_name)?;
                Ok(Value::Message(input.message(&nested)?))
            }
        }
    }

    fn write_value<W: TokenWriter + ?Sized>(
        &self,
        field: &FieldDescriptor,
        value: &Value,
        out: &mut ValueWriter<'_, W>,
    ) -> Result<(), CodecError> {
        match (field.kind(), value) {
            (FieldKind::Scalar(_), value) => write_scalar(out.output(), field, value),
            (FieldKind::Enum(type_name), Value::Enum(number)) => {
                let descriptor = self.enumeration(type_name)?;
                let Some(symbol) = descriptor.symbol(*number) else {
                    return Err(CodecError::without_span(CodecErrorKind::UnknownEnumValue {
                        enum_name: descriptor.name().to_owned(),
                        value: number.to_string(),
                        suggestion: None,
                    }));
                };
                let keys = out.keys();
                scalar::write_enum(out.output(), keys, *number, Some(symbol))
            }
            (FieldKind::Message(type_name), Value::Message(message)) => {
                let nested = Self::new(self.schema, type_name)?;
                nested.check(message)?;
                out.message(&nested, message)
            }
            (_, value) => Err(mismatch(field, value)),
        }
    }
}

fn mismatch(field: &FieldDescriptor, value: &Value) -> CodecError {
    ValueError::TypeMismatch {
        field: field.name().to_owned(),
        expected: field.kind().to_string(),
        found: value.kind_name(),
    }
    .into()
}

fn read_scalar<R: TokenReader + ?Sized>(
    kind: ScalarKind,
    input: &mut R,
) -> Result<Value, CodecError> {
    use ScalarKind as K;
    Ok(match kind {
        K::Double => Value::F64(scalar::read_f64(input)?),
        K::Float => Value::F32(scalar::read_f32(input)?),
        K::Int32 | K::Sint32 | K::Sfixed32 => Value::I32(scalar::read_int(input, kind)?),
        K::Int64 | K::Sint64 | K::Sfixed64 => Value::I64(scalar::read_int(input, kind)?),
        K::Uint32 | K::Fixed32 => Value::U32(scalar::read_int(input, kind)?),
        K::Uint64 | K::Fixed64 => Value::U64(scalar::read_int(input, kind)?),
        K::Bool => Value::Bool(scalar::read_bool(input)?),
        K::String => Value::String(scalar::read_string(input)?),
        K::Bytes => Value::Bytes(scalar::read_bytes(input)?),
    })
}

fn write_scalar<W: TokenWriter + ?Sized>(
    out: &mut W,
    field: &FieldDescriptor,
    value: &Value,
) -> Result<(), CodecError> {
    if !value.matches(field.kind()) {
        return Err(mismatch(field, value));
    }
    match value {
        Value::Bool(v) => scalar::write_bool(out, *v),
        Value::I32(v) => scalar::write_int(out, *v),
        Value::I64(v) => scalar::write_int(out, *v),
        Value::U32(v) => scalar::write_int(out, *v),
        Value::U64(v) => scalar::write_int(out, *v),
        Value::F32(v) => scalar::write_f32(out, *v),
        Value::F64(v) => scalar::write_f64(out, *v),
        Value::String(v) => scalar::write_string(out, v),
        Value::Bytes(v) => scalar::write_bytes(out, v),
        Value::Enum(_) | Value::Message(_) => Err(mismatch(field, value)),
    }
}

impl<'s> FieldIndex for ReflectiveAccess<'s> {
    type Field = &'s FieldDescriptor;

    fn field_by_name(&self, name: &str) -> Option<Self::Field> {
        let descriptor: &'s MessageDescriptor = self.descriptor;
        descriptor.field_by_name(name)
    }

    fn field_by_tag(&self, tag: u32) -> Option<Self::Field> {
        let descriptor: &'s MessageDescriptor = self.descriptor;
        descriptor.field_by_tag(tag)
    }
}

impl<'s> MessageAccess for ReflectiveAccess<'s> {
    type Message = DynamicMessage;
    type Builder = DynamicMessageBuilder;

    fn type_name(&self) -> &str {
        self.descriptor.name()
    }

    fn new_builder(&self) -> DynamicMessageBuilder {
        DynamicMessage::builder(Arc::clone(self.descriptor))
    }

    fn merge_field<R: TokenReader + ?Sized>(
        &self,
        builder: &mut DynamicMessageBuilder,
        field: &'s FieldDescriptor,
        input: &mut ValueReader<'_, R>,
    ) -> Result<(), CodecError> {
        let tag = field.tag();
        if field.is_repeated() {
            // `[]` still makes the field present
            builder.extend(tag, std::iter::empty())?;
            input.repeated_with(|input| {
                let value = self.read_value(field, input)?;
                builder.push(tag, value)?;
                Ok(())
            })
        } else {
            let value = self.read_value(field, input)?;
            builder.set(tag, value)?;
            Ok(())
        }
    }

    fn finish(&self, builder: DynamicMessageBuilder) -> Result<DynamicMessage, CodecError> {
        Ok(builder.build())
    }

    fn write_fields<W: TokenWriter + ?Sized>(
        &self,
        message: &DynamicMessage,
        out: &mut ValueWriter<'_, W>,
    ) -> Result<(), CodecError> {
        for (field, value) in message.present_fields() {
            out.key(field.tag(), field.name())?;
            match value {
                FieldValue::Single(value) => self.write_value(field, value, out)?,
                FieldValue::Repeated(values) => {
                    out.output().write_start_array()?;
                    for value in values {
                        self.write_value(field, value, out)?;
                    }
                    out.output().write_end_array()?;
                }
            }
        }
        Ok(())
    }
}

/// Codec that resolves fields at runtime from a [`Schema`] and reads and
/// writes [`DynamicMessage`]s.
///
/// ```
/// use std::sync::Arc;
/// use protojson::schema::{FieldDescriptor, MessageDescriptor, ScalarKind, Schema};
/// use protojson::value::{DynamicMessage, Value};
/// use protojson::{ProtobufJson, ReflectiveJson};
///
/// let task = MessageDescriptor::builder("Task")
///     .field(FieldDescriptor::scalar(1, "id", ScalarKind::Int64))
///     .field(FieldDescriptor::scalar(2, "name", ScalarKind::String))
///     .build()?;
/// let schema = Arc::new(Schema::builder().message(task).build()?);
///
/// let mut message = DynamicMessage::builder(Arc::clone(schema.message("Task").unwrap()));
/// message.set(1, Value::I64(7))?;
/// let message = message.build();
///
/// let named = ReflectiveJson::named(Arc::clone(&schema));
/// assert_eq!(named.to_string(&message)?, r#"{"id":7}"#);
///
/// let numeric = ReflectiveJson::numeric(schema);
/// assert_eq!(numeric.to_string(&message)?, r#"{"1":7}"#);
/// assert_eq!(numeric.from_str(r#"{"1":7}"#, "Task")?, message);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct ReflectiveJson {
    schema: Arc<Schema>,
    keys: KeyStrategy,
}

impl ReflectiveJson {
    /// A codec over `schema` with the given key strategy.
    pub fn new(schema: Arc<Schema>, keys: KeyStrategy) -> Self {
        Self { schema, keys }
    }

    /// A codec using field names as keys.
    pub fn named(schema: Arc<Schema>) -> Self {
        Self::new(schema, KeyStrategy::Named)
    }

    /// A codec using field numbers as keys.
    pub fn numeric(schema: Arc<Schema>) -> Self {
        Self::new(schema, KeyStrategy::Numeric)
    }

    /// The schema messages are resolved against.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Field access for the message type `type_name`.
    pub fn access(&self, type_name: &str) -> Result<ReflectiveAccess<'_>, CodecError> {
        ReflectiveAccess::new(&self.schema, type_name)
    }
}

impl ProtobufJson for ReflectiveJson {
    type Message = DynamicMessage;

    fn key_strategy(&self) -> KeyStrategy {
        self.keys
    }

    fn write_to<W: TokenWriter + ?Sized>(
        &self,
        out: &mut W,
        message: &DynamicMessage,
    ) -> Result<(), CodecError> {
        let access = self.access(message.type_name())?;
        access.check(message)?;
        engine::write_message(out, &access, self.keys, message)
    }

    fn write_many<W: TokenWriter + ?Sized>(
        &self,
        out: &mut W,
        messages: &[DynamicMessage],
        type_name: &str,
    ) -> Result<(), CodecError> {
        let access = self.access(type_name)?;
        for message in messages {
            access.check(message)?;
        }
        engine::write_many(out, &access, self.keys, messages)
    }

    fn parse_from<R: TokenReader + ?Sized>(
        &self,
        input: &mut R,
        type_name: &str,
    ) -> Result<DynamicMessage, CodecError> {
        let access = self.access(type_name)?;
        engine::read_message(input, &access, self.keys)
    }

    fn append_many<R: TokenReader + ?Sized>(
        &self,
        input: &mut R,
        out: &mut Vec<DynamicMessage>,
        type_name: &str,
    ) -> Result<usize, CodecError> {
        let access = self.access(type_name)?;
        engine::append_many(input, &access, self.keys, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protojson_schema::EnumDescriptor;
    use protojson_testhelpers::test;

    fn schema() -> Arc<Schema> {
        let status = EnumDescriptor::builder("Status")
            .value("PENDING", 0)
            .value("COMPLETED", 1)
            .build()
            .unwrap();
        let node = MessageDescriptor::builder("Node")
            .field(FieldDescriptor::scalar(1, "label", ScalarKind::String))
            .field(FieldDescriptor::enumeration(2, "status", "Status"))
            .field(FieldDescriptor::message(3, "children", "Node").repeated())
            .field(FieldDescriptor::scalar(4, "weights", ScalarKind::Float).repeated())
            .field(FieldDescriptor::scalar(5, "blob", ScalarKind::Bytes))
            .build()
            .unwrap();
        Arc::new(Schema::builder().enumeration(status).message(node).build().unwrap())
    }

    fn node(schema: &Schema, label: &str, children: Vec<DynamicMessage>) -> DynamicMessage {
        let mut builder = DynamicMessage::builder(Arc::clone(schema.message("Node").unwrap()));
        builder.set(1, Value::String(label.into())).unwrap();
        builder
            .extend(3, children.into_iter().map(Value::Message))
            .unwrap();
        builder.build()
    }

    #[test]
    fn recursive_messages() {
        let schema = schema();
        let tree = node(&schema, "root", vec![node(&schema, "leaf", vec![])]);
        let codec = ReflectiveJson::named(Arc::clone(&schema));
        let json = codec.to_string(&tree).unwrap();
        assert_eq!(
            json,
            r#"{"label":"root","children":[{"label":"leaf","children":[]}]}"#
        );
        assert_eq!(codec.from_str(&json, "Node").unwrap(), tree);
    }

    #[test]
    fn empty_repeated_stays_present() {
        let schema = schema();
        let codec = ReflectiveJson::numeric(schema);
        let message = codec.from_str(r#"{"3": [], "4": [1.5, "NaN"]}"#, "Node").unwrap();
        assert!(message.has(3));
        assert_eq!(message.repeated_len(3), 0);
        assert_eq!(message.repeated(4)[0], Value::F32(1.5));
        assert!(matches!(message.repeated(4)[1], Value::F32(v) if v.is_nan()));
        assert!(!message.has(1));
        assert_eq!(codec.to_string(&message).unwrap(), r#"{"3":[],"4":[1.5,"NaN"]}"#);
    }

    #[test]
    fn enums_follow_key_strategy() {
        let schema = schema();
        let mut builder = DynamicMessage::builder(Arc::clone(schema.message("Node").unwrap()));
        builder.set(2, Value::Enum(1)).unwrap();
        let message = builder.build();

        let named = ReflectiveJson::named(Arc::clone(&schema));
        assert_eq!(named.to_string(&message).unwrap(), r#"{"status":"COMPLETED"}"#);
        let numeric = ReflectiveJson::numeric(Arc::clone(&schema));
        assert_eq!(numeric.to_string(&message).unwrap(), r#"{"2":1}"#);

        // either form is read back by either strategy
        assert_eq!(named.from_str(r#"{"status": 1}"#, "Node").unwrap(), message);
        assert_eq!(numeric.from_str(r#"{"2": "COMPLETED"}"#, "Node").unwrap(), message);
    }

    #[test]
    fn undefined_enum_number_is_not_written() {
        let schema = schema();
        let mut builder = DynamicMessage::builder(Arc::clone(schema.message("Node").unwrap()));
        builder.set(2, Value::Enum(42)).unwrap();
        let err = ReflectiveJson::numeric(schema)
            .to_string(&builder.build())
            .unwrap_err();
        assert_eq!(err.code(), "protojson::unknown_enum_value");
    }

    #[test]
    fn unknown_and_mismatched_types() {
        let schema = schema();
        let codec = ReflectiveJson::named(Arc::clone(&schema));
        let err = codec.from_str("{}", "Missing").unwrap_err();
        assert_eq!(err.code(), "protojson::unknown_message_type");

        let other = Arc::new(
            MessageDescriptor::builder("Node")
                .field(FieldDescriptor::scalar(1, "label", ScalarKind::Bytes))
                .build()
                .unwrap(),
        );
        let err = codec.to_string(&DynamicMessage::new(other)).unwrap_err();
        assert_eq!(err.code(), "protojson::message_type_mismatch");

        let err = codec
            .many_to_string(&[node(&schema, "a", vec![])], "Status")
            .unwrap_err();
        assert_eq!(err.code(), "protojson::unknown_message_type");
    }

    #[test]
    fn bytes_field() {
        let schema = schema();
        let codec = ReflectiveJson::named(Arc::clone(&schema));
        let message = codec.from_str(r#"{"blob": "AAEC/w=="}"#, "Node").unwrap();
        assert_eq!(message.single(5), Some(&Value::Bytes(vec![0, 1, 2, 255])));
        assert_eq!(codec.to_string(&message).unwrap(), r#"{"blob":"AAEC/w=="}"#);
    }
}
