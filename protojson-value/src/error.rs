use core::fmt;

/// A value could not be stored in a [`DynamicMessage`](crate::DynamicMessage).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The message type has no such field
    UnknownField {
        /// Message type name
        message: String,
        /// The tag or name that was looked up
        field: String,
    },
    /// The value's variant does not fit the field kind
    TypeMismatch {
        /// `Type.field`
        field: String,
        /// The declared field kind
        expected: String,
        /// The variant that was supplied
        found: &'static str,
    },
    /// An element was pushed onto a singular field
    NotRepeated {
        /// `Type.field`
        field: String,
    },
    /// A single value was set on a repeated field
    NotSingular {
        /// `Type.field`
        field: String,
    },
}

impl ValueError {
    /// Stable identifier for this class of error.
    pub const fn code(&self) -> &'static str {
        match self {
            ValueError::UnknownField { .. } => "value::unknown_field",
            ValueError::TypeMismatch { .. } => "value::type_mismatch",
            ValueError::NotRepeated { .. } => "value::not_repeated",
            ValueError::NotSingular { .. } => "value::not_singular",
        }
    }
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueError::UnknownField { message, field } => {
                write!(f, "`{message}` has no field `{field}`")
            }
            ValueError::TypeMismatch {
                field,
                expected,
                found,
            } => write!(f, "`{field}` holds {expected}, got a {found} value"),
            ValueError::NotRepeated { field } => {
                write!(f, "`{field}` is not repeated")
            }
            ValueError::NotSingular { field } => {
                write!(f, "`{field}` is repeated; set its elements instead")
            }
        }
    }
}

impl std::error::Error for ValueError {}
