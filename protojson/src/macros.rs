//! Macros that generate message and enum types with compiled-in codecs.

/// Declares a message struct along with its generated codec.
///
/// Each field is written `name(tag, "jsonName"): label kind`, where `label`
/// is `optional` (stored as `Option<T>`) or `repeated` (stored as
/// [`Repeated<T>`](crate::Repeated))
/// and `kind` is one of the protobuf scalar keywords, `enumeration<E>` for a
/// type declared with [`proto_enum!`], or `message<M>` for another
/// [`proto_message!`] type.
///
/// | kind | Rust type |
/// |---|---|
/// | `double` / `float` | `f64` / `f32` |
/// | `int32`, `sint32`, `sfixed32` | `i32` |
/// | `int64`, `sint64`, `sfixed64` | `i64` |
/// | `uint32`, `fixed32` | `u32` |
/// | `uint64`, `fixed64` | `u64` |
/// | `bool` | `bool` |
/// | `string` | `String` |
/// | `bytes` | `Vec<u8>` |
///
/// The struct derives `Debug`, `Clone` and `Default`, and implements
/// [`GeneratedMessage`](crate::GeneratedMessage) and
/// [`Describe`](crate::schema::Describe). `PartialEq` compares field by
/// field through [`FieldEq`](crate::FieldEq), so float fields compare by bit
/// pattern. A message may contain itself through a `repeated` field; an
/// `optional` self-reference would make the struct infinitely sized.
///
/// Tags and JSON names must be unique within the message, which is checked
/// at compile time:
///
/// ```compile_fail
/// protojson::proto_message! {
///     pub struct Broken {
///         pub a(1, "a"): optional int32,
///         pub b(1, "b"): optional int32,
///     }
/// }
/// ```
///
/// ```
/// use protojson::proto_message;
///
/// proto_message! {
///     #[derive(Eq)]
///     pub struct Person {
///         pub id(1, "id"): optional int32,
///         pub first_name(2, "firstName"): optional string,
///         pub repeated_long(9, "repeatedLong"): repeated int64,
///     }
/// }
///
/// let person = Person { id: Some(1), ..Person::default() };
/// assert!(person.repeated_long.is_empty());
/// assert!(!person.repeated_long.is_present());
///
/// let person = Person { repeated_long: vec![].into(), ..person };
/// assert!(person.repeated_long.is_present());
/// ```
#[macro_export]
macro_rules! proto_message {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fattr:meta])*
                $fvis:vis $field:ident ( $tag:literal , $json:literal ) : $label:ident $kind:ident $(< $ref:ty >)?
            ),* $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Default)]
        $vis struct $name {
            $(
                $(#[$fattr])*
                $fvis $field: $crate::__proto_rust_type!($label $kind $(<$ref>)?),
            )*
        }

        const _: () = ::core::assert!(
            $crate::distinct_tags(&[$($tag),*]) && $crate::distinct_names(&[$($json),*]),
            "a field tag or JSON name is declared twice",
        );

        impl ::core::cmp::PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                true $(&& $crate::FieldEq::field_eq(&self.$field, &other.$field))*
            }
        }

        impl $crate::FieldEq for $name {
            fn field_eq(&self, other: &Self) -> bool {
                self == other
            }
        }

        impl $crate::schema::Describe for $name {
            const TYPE_NAME: &'static str = ::core::stringify!($name);

            fn describe(schema: &mut $crate::schema::SchemaBuilder) {
                if schema.contains(Self::TYPE_NAME) {
                    return;
                }
                let descriptor = $crate::schema::MessageDescriptor::builder(Self::TYPE_NAME)
                    $(.field($crate::__proto_field!($tag, $json, $label $kind $(<$ref>)?)))*
                    .build();
                match descriptor {
                    ::core::result::Result::Ok(descriptor) => {
                        schema.insert_message(descriptor);
                        $($crate::__proto_describe_dependency!(schema, $kind $(<$ref>)?);)*
                    }
                    ::core::result::Result::Err(error) => schema.record_error(error),
                }
            }
        }

        impl $crate::GeneratedMessage for $name {
            fn field_by_name(name: &str) -> ::core::option::Option<u32> {
                match name {
                    $($json => ::core::option::Option::Some($tag),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn field_by_tag(tag: u32) -> ::core::option::Option<u32> {
                match tag {
                    $($tag => ::core::option::Option::Some($tag),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn merge_field<R: $crate::TokenReader + ?Sized>(
                &mut self,
                tag: u32,
                input: &mut $crate::ValueReader<'_, R>,
            ) -> ::core::result::Result<(), $crate::CodecError> {
                match tag {
                    $($tag => $crate::FieldSlot::merge(&mut self.$field, input),)*
                    _ => input.skip(),
                }
            }

            fn write_fields<W: $crate::TokenWriter + ?Sized>(
                &self,
                out: &mut $crate::ValueWriter<'_, W>,
            ) -> ::core::result::Result<(), $crate::CodecError> {
                $($crate::FieldSlot::write(&self.$field, out, $tag, $json)?;)*
                ::core::result::Result::Ok(())
            }
        }

        impl $crate::Encode for $name {
            fn encode<W: $crate::TokenWriter + ?Sized>(
                &self,
                out: &mut $crate::ValueWriter<'_, W>,
            ) -> ::core::result::Result<(), $crate::CodecError> {
                $crate::encode_message(self, out)
            }
        }

        impl $crate::Decode for $name {
            fn decode<R: $crate::TokenReader + ?Sized>(
                input: &mut $crate::ValueReader<'_, R>,
            ) -> ::core::result::Result<Self, $crate::CodecError> {
                $crate::decode_message(input)
            }
        }
    };
}

/// Declares a protobuf enum along with its generated codec.
///
/// Each value is written `Variant = number as "SYMBOL"`. The first value is
/// the default. The enum derives `Debug`, `Clone`, `Copy`, `PartialEq`,
/// `Eq`, `Hash` and `Default`, and implements
/// [`ProtoEnum`](crate::ProtoEnum), [`Describe`](crate::schema::Describe) and
/// [`FieldEq`](crate::FieldEq).
///
/// ```
/// use protojson::{ProtoEnum, proto_enum};
///
/// proto_enum! {
///     pub enum Status {
///         Pending = 0 as "PENDING",
///         Completed = 1 as "COMPLETED",
///     }
/// }
///
/// assert_eq!(Status::from_symbol("COMPLETED"), Some(Status::Completed));
/// assert_eq!(Status::default().number(), 0);
/// ```
#[macro_export]
macro_rules! proto_enum {
    (
        $(#[$attr:meta])*
        $vis:vis enum $name:ident {
            $(#[$first_attr:meta])*
            $first:ident = $first_number:literal as $first_symbol:literal
            $(
                ,
                $(#[$vattr:meta])*
                $variant:ident = $number:literal as $symbol:literal
            )* $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        #[repr(i32)]
        $vis enum $name {
            $(#[$first_attr])*
            #[default]
            $first = $first_number,
            $(
                $(#[$vattr])*
                $variant = $number,
            )*
        }

        const _: () = ::core::assert!(
            $crate::distinct_names(&[$first_symbol, $($symbol),*]),
            "an enum symbol is declared twice",
        );

        impl $crate::FieldEq for $name {
            fn field_eq(&self, other: &Self) -> bool {
                self == other
            }
        }

        impl $crate::ProtoEnum for $name {
            const VALUES: &'static [Self] = &[Self::$first, $(Self::$variant,)*];

            fn number(self) -> i32 {
                self as i32
            }

            fn from_number(number: i32) -> ::core::option::Option<Self> {
                match number {
                    $first_number => ::core::option::Option::Some(Self::$first),
                    $($number => ::core::option::Option::Some(Self::$variant),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn symbol(self) -> &'static str {
                match self {
                    Self::$first => $first_symbol,
                    $(Self::$variant => $symbol,)*
                }
            }

            fn from_symbol(symbol: &str) -> ::core::option::Option<Self> {
                match symbol {
                    $first_symbol => ::core::option::Option::Some(Self::$first),
                    $($symbol => ::core::option::Option::Some(Self::$variant),)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl $crate::schema::Describe for $name {
            const TYPE_NAME: &'static str = ::core::stringify!($name);

            fn describe(schema: &mut $crate::schema::SchemaBuilder) {
                if schema.contains(Self::TYPE_NAME) {
                    return;
                }
                let descriptor = $crate::schema::EnumDescriptor::builder(Self::TYPE_NAME)
                    .value($first_symbol, $first_number)
                    $(.value($symbol, $number))*
                    .build();
                match descriptor {
                    ::core::result::Result::Ok(descriptor) => schema.insert_enum(descriptor),
                    ::core::result::Result::Err(error) => schema.record_error(error),
                }
            }
        }

        impl $crate::Encode for $name {
            fn encode<W: $crate::TokenWriter + ?Sized>(
                &self,
                out: &mut $crate::ValueWriter<'_, W>,
            ) -> ::core::result::Result<(), $crate::CodecError> {
                $crate::encode_enum(*self, out)
            }
        }

        impl $crate::Decode for $name {
            fn decode<R: $crate::TokenReader + ?Sized>(
                input: &mut $crate::ValueReader<'_, R>,
            ) -> ::core::result::Result<Self, $crate::CodecError> {
                $crate::decode_enum(input)
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __proto_rust_type {
    (optional $($kind:tt)+) => {
        ::core::option::Option<$crate::__proto_value_type!($($kind)+)>
    };
    (repeated $($kind:tt)+) => {
        $crate::Repeated<$crate::__proto_value_type!($($kind)+)>
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __proto_value_type {
    (double) => { f64 };
    (float) => { f32 };
    (int32) => { i32 };
    (sint32) => { i32 };
    (sfixed32) => { i32 };
    (int64) => { i64 };
    (sint64) => { i64 };
    (sfixed64) => { i64 };
    (uint32) => { u32 };
    (fixed32) => { u32 };
    (uint64) => { u64 };
    (fixed64) => { u64 };
    (bool) => { bool };
    (string) => { ::std::string::String };
    (bytes) => { ::std::vec::Vec<u8> };
    (enumeration < $t:ty >) => { $t };
    (message < $t:ty >) => { $t };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __proto_field {
    ($tag:literal, $json:literal, optional $($kind:tt)+) => {
        $crate::__proto_field_kind!($tag, $json, $($kind)+)
    };
    ($tag:literal, $json:literal, repeated $($kind:tt)+) => {
        $crate::__proto_field_kind!($tag, $json, $($kind)+).repeated()
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __proto_field_kind {
    ($tag:literal, $json:literal, enumeration < $t:ty >) => {
        $crate::schema::FieldDescriptor::enumeration(
            $tag,
            $json,
            <$t as $crate::schema::Describe>::TYPE_NAME,
        )
    };
    ($tag:literal, $json:literal, message < $t:ty >) => {
        $crate::schema::FieldDescriptor::message(
            $tag,
            $json,
            <$t as $crate::schema::Describe>::TYPE_NAME,
        )
    };
    ($tag:literal, $json:literal, $kind:ident) => {
        $crate::schema::FieldDescriptor::scalar($tag, $json, $crate::__proto_scalar_kind!($kind))
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __proto_scalar_kind {
    (double) => { $crate::schema::ScalarKind::Double };
    (float) => { $crate::schema::ScalarKind::Float };
    (int32) => { $crate::schema::ScalarKind::Int32 };
    (sint32) => { $crate::schema::ScalarKind::Sint32 };
    (sfixed32) => { $crate::schema::ScalarKind::Sfixed32 };
    (int64) => { $crate::schema::ScalarKind::Int64 };
    (sint64) => { $crate::schema::ScalarKind::Sint64 };
    (sfixed64) => { $crate::schema::ScalarKind::Sfixed64 };
    (uint32) => { $crate::schema::ScalarKind::Uint32 };
    (fixed32) => { $crate::schema::ScalarKind::Fixed32 };
    (uint64) => { $crate::schema::ScalarKind::Uint64 };
    (fixed64) => { $crate::schema::ScalarKind::Fixed64 };
    (bool) => { $crate::schema::ScalarKind::Bool };
    (string) => { $crate::schema::ScalarKind::String };
    (bytes) => { $crate::schema::ScalarKind::Bytes };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __proto_describe_dependency {
    ($schema:ident, enumeration < $t:ty >) => {
        <$t as $crate::schema::Describe>::describe($schema)
    };
    ($schema:ident, message < $t:ty >) => {
        <$t as $crate::schema::Describe>::describe($schema)
    };
    ($schema:ident, $kind:ident) => {};
}
