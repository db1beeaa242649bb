//! Errors raised while building descriptors.

use core::fmt;

/// A descriptor or schema could not be built.
///
/// These are construction-time errors: they surface when a descriptor is
/// assembled, never while a stream is being read or written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    /// The type whose definition is invalid
    pub type_name: String,
    /// What is wrong with it
    pub kind: SchemaErrorKind,
}

/// Specific schema problems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaErrorKind {
    /// Two fields share a tag
    DuplicateTag {
        /// The repeated tag
        tag: u32,
        /// Field that claimed the tag first
        first: String,
        /// Field that claimed it again
        second: String,
    },
    /// Two fields share a name
    DuplicateFieldName {
        /// The repeated name
        name: String,
    },
    /// A tag outside `1..=536_870_911`, or inside the reserved `19000..=19999`
    InvalidTag {
        /// Field carrying the tag
        field: String,
        /// The rejected tag
        tag: u32,
    },
    /// A field name that is empty
    EmptyFieldName {
        /// Tag of the offending field
        tag: u32,
    },
    /// Two enum values share a symbol
    DuplicateEnumSymbol {
        /// The repeated symbol
        symbol: String,
    },
    /// Two enum values share a number
    DuplicateEnumNumber {
        /// The repeated number
        number: i32,
    },
    /// An enum without values
    EmptyEnum,
    /// Two different definitions registered under one name
    DuplicateType,
    /// A field refers to a type the schema does not contain
    UnresolvedType {
        /// Field holding the reference
        field: String,
        /// The missing type
        reference: String,
    },
    /// A field refers to an enum where a message is required, or the reverse
    WrongTypeKind {
        /// Field holding the reference
        field: String,
        /// The referenced type
        reference: String,
        /// `"enum"` or `"message"`
        expected: &'static str,
    },
}

impl SchemaError {
    /// Creates an error for `type_name`.
    pub fn new(type_name: impl Into<String>, kind: SchemaErrorKind) -> Self {
        Self {
            type_name: type_name.into(),
            kind,
        }
    }

    /// Stable identifier for this class of error.
    pub const fn code(&self) -> &'static str {
        match self.kind {
            SchemaErrorKind::DuplicateTag { .. } => "schema::duplicate_tag",
            SchemaErrorKind::DuplicateFieldName { .. } => "schema::duplicate_field_name",
            SchemaErrorKind::InvalidTag { .. } => "schema::invalid_tag",
            SchemaErrorKind::EmptyFieldName { .. } => "schema::empty_field_name",
            SchemaErrorKind::DuplicateEnumSymbol { .. } => "schema::duplicate_enum_symbol",
            SchemaErrorKind::DuplicateEnumNumber { .. } => "schema::duplicate_enum_number",
            SchemaErrorKind::EmptyEnum => "schema::empty_enum",
            SchemaErrorKind::DuplicateType => "schema::duplicate_type",
            SchemaErrorKind::UnresolvedType { .. } => "schema::unresolved_type",
            SchemaErrorKind::WrongTypeKind { .. } => "schema::wrong_type_kind",
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ty = &self.type_name;
        match &self.kind {
            SchemaErrorKind::DuplicateTag { tag, first, second } => write!(
                f,
                "`{ty}`: tag {tag} is used by both `{first}` and `{second}`"
            ),
            SchemaErrorKind::DuplicateFieldName { name } => {
                write!(f, "`{ty}`: field name `{name}` is declared twice")
            }
            SchemaErrorKind::InvalidTag { field, tag } => {
                write!(f, "`{ty}.{field}`: tag {tag} is not a valid field number")
            }
            SchemaErrorKind::EmptyFieldName { tag } => {
                write!(f, "`{ty}`: field with tag {tag} has an empty name")
            }
            SchemaErrorKind::DuplicateEnumSymbol { symbol } => {
                write!(f, "enum `{ty}`: symbol `{symbol}` is declared twice")
            }
            SchemaErrorKind::DuplicateEnumNumber { number } => {
                write!(f, "enum `{ty}`: number {number} is used twice")
            }
            SchemaErrorKind::EmptyEnum => write!(f, "enum `{ty}` has no values"),
            SchemaErrorKind::DuplicateType => {
                write!(f, "`{ty}` is registered twice with different definitions")
            }
            SchemaErrorKind::UnresolvedType { field, reference } => write!(
                f,
                "`{ty}.{field}` refers to `{reference}`, which is not in the schema"
            ),
            SchemaErrorKind::WrongTypeKind {
                field,
                reference,
                expected,
            } => write!(
                f,
                "`{ty}.{field}` refers to `{reference}`, which is not a {expected}"
            ),
        }
    }
}

impl std::error::Error for SchemaError {}
