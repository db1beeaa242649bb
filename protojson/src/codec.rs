use std::io;

use crate::{
    CodecError, JsonReader, JsonWriter, KeyStrategy, TokenReader, TokenWriter, WriteOptions,
};

/// The codec surface shared by every dispatch strategy.
///
/// Implementations differ only in how they find fields: [`ReflectiveJson`]
/// consults a schema at runtime, [`GeneratedJson`] calls routines compiled
/// into the message type. Given the same [`KeyStrategy`] both produce the
/// same JSON for the same message and read each other's output.
///
/// The required methods work on token streams; the provided ones wrap them
/// for strings, byte slices and `std::io` readers and writers.
///
/// [`ReflectiveJson`]: crate::ReflectiveJson
/// [`GeneratedJson`]: crate::GeneratedJson
pub trait ProtobufJson {
    /// The in-memory message representation.
    type Message;

    /// How fields are keyed.
    fn key_strategy(&self) -> KeyStrategy;

    /// Writes one message as a JSON object.
    fn write_to<W: TokenWriter + ?Sized>(
        &self,
        out: &mut W,
        message: &Self::Message,
    ) -> Result<(), CodecError>;

    /// Writes messages of type `type_name` as a JSON array of objects.
    fn write_many<W: TokenWriter + ?Sized>(
        &self,
        out: &mut W,
        messages: &[Self::Message],
        type_name: &str,
    ) -> Result<(), CodecError>;

    /// Reads one JSON object as a message of type `type_name`.
    fn parse_from<R: TokenReader + ?Sized>(
        &self,
        input: &mut R,
        type_name: &str,
    ) -> Result<Self::Message, CodecError>;

    /// Reads a JSON array of objects as messages of type `type_name`,
    /// appending them to `out`, and returns how many were appended.
    ///
    /// If reading fails, `out` is left as it was.
    fn append_many<R: TokenReader + ?Sized>(
        &self,
        input: &mut R,
        out: &mut Vec<Self::Message>,
        type_name: &str,
    ) -> Result<usize, CodecError>;

    /// Serializes a message to compact JSON.
    fn to_string(&self, message: &Self::Message) -> Result<String, CodecError> {
        self.to_string_with_options(message, WriteOptions::default())
    }

    /// Serializes a message to indented JSON.
    fn to_string_pretty(&self, message: &Self::Message) -> Result<String, CodecError> {
        self.to_string_with_options(message, WriteOptions::default().pretty())
    }

    /// Serializes a message with the given formatting.
    fn to_string_with_options(
        &self,
        message: &Self::Message,
        options: WriteOptions,
    ) -> Result<String, CodecError> {
        let mut writer = JsonWriter::with_options(Vec::new(), options);
        self.write_to(&mut writer, message)?;
        into_string(writer.into_inner()?)
    }

    /// Serializes a message to compact JSON bytes.
    fn to_vec(&self, message: &Self::Message) -> Result<Vec<u8>, CodecError> {
        let mut writer = JsonWriter::new(Vec::new());
        self.write_to(&mut writer, message)?;
        writer.into_inner()
    }

    /// Serializes a message to an `std::io::Write` sink, flushes it and
    /// hands it back.
    fn to_writer<W: io::Write>(&self, sink: W, message: &Self::Message) -> Result<W, CodecError> {
        let mut writer = JsonWriter::new(sink);
        self.write_to(&mut writer, message)?;
        writer.into_inner()
    }

    /// Parses a message of type `type_name` from a string holding exactly
    /// one JSON object.
    fn from_str(&self, json: &str, type_name: &str) -> Result<Self::Message, CodecError> {
        self.from_slice(json.as_bytes(), type_name)
    }

    /// Parses a message of type `type_name` from bytes holding exactly one
    /// JSON object.
    fn from_slice(&self, json: &[u8], type_name: &str) -> Result<Self::Message, CodecError> {
        self.from_reader(json, type_name)
    }

    /// Parses a message of type `type_name` from an `std::io::Read` source
    /// holding exactly one JSON object. The source is read incrementally.
    fn from_reader<R: io::Read>(
        &self,
        source: R,
        type_name: &str,
    ) -> Result<Self::Message, CodecError> {
        let mut reader = JsonReader::new(source);
        let message = self.parse_from(&mut reader, type_name)?;
        reader.finish()?;
        Ok(message)
    }

    /// Serializes messages of type `type_name` to a compact JSON array.
    fn many_to_string(
        &self,
        messages: &[Self::Message],
        type_name: &str,
    ) -> Result<String, CodecError> {
        let mut writer = JsonWriter::new(Vec::new());
        self.write_many(&mut writer, messages, type_name)?;
        into_string(writer.into_inner()?)
    }

    /// Parses a JSON array of `type_name` messages from a string.
    fn many_from_str(
        &self,
        json: &str,
        type_name: &str,
    ) -> Result<Vec<Self::Message>, CodecError> {
        let mut reader = JsonReader::new(json.as_bytes());
        let mut messages = Vec::new();
        self.append_many(&mut reader, &mut messages, type_name)?;
        reader.finish()?;
        Ok(messages)
    }
}

fn into_string(bytes: Vec<u8>) -> Result<String, CodecError> {
    // the writer only ever emits UTF-8
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
}
