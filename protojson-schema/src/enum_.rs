use std::collections::HashMap;

use crate::{SchemaError, SchemaErrorKind};

/// Describes an enum type: symbolic names mapped to numbers, both unique.
#[derive(Debug, Clone)]
pub struct EnumDescriptor {
    name: String,
    values: Vec<(String, i32)>,
    by_symbol: HashMap<String, usize>,
    by_number: HashMap<i32, usize>,
}

impl EnumDescriptor {
    /// Starts describing the enum type `name`.
    pub fn builder(name: impl Into<String>) -> EnumDescriptorBuilder {
        EnumDescriptorBuilder {
            name: name.into(),
            values: Vec::new(),
        }
    }

    /// The type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `(symbol, number)` pairs in declaration order.
    pub fn values(&self) -> impl ExactSizeIterator<Item = (&str, i32)> + '_ {
        self.values.iter().map(|(symbol, number)| (symbol.as_str(), *number))
    }

    /// The number for `symbol`.
    pub fn number(&self, symbol: &str) -> Option<i32> {
        self.by_symbol.get(symbol).map(|&index| self.values[index].1)
    }

    /// The symbol for `number`.
    pub fn symbol(&self, number: i32) -> Option<&str> {
        self.by_number
            .get(&number)
            .map(|&index| self.values[index].0.as_str())
    }

    /// The first declared value, which protobuf treats as the default.
    pub fn default_number(&self) -> i32 {
        // build() rejects empty enums
        self.values[0].1
    }
}

impl PartialEq for EnumDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.values == other.values
    }
}

impl Eq for EnumDescriptor {}

/// Accumulates values for an [`EnumDescriptor`].
#[derive(Debug, Clone)]
pub struct EnumDescriptorBuilder {
    name: String,
    values: Vec<(String, i32)>,
}

impl EnumDescriptorBuilder {
    /// Adds a value.
    pub fn value(mut self, symbol: impl Into<String>, number: i32) -> Self {
        self.values.push((symbol.into(), number));
        self
    }

    /// Checks that symbols and numbers are unique and builds the indices.
    pub fn build(self) -> Result<EnumDescriptor, SchemaError> {
        if self.values.is_empty() {
            return Err(SchemaError::new(self.name, SchemaErrorKind::EmptyEnum));
        }

        let mut by_symbol = HashMap::with_capacity(self.values.len());
        let mut by_number = HashMap::with_capacity(self.values.len());
        for (index, (symbol, number)) in self.values.iter().enumerate() {
            if by_symbol.insert(symbol.clone(), index).is_some() {
                return Err(SchemaError::new(
                    &self.name,
                    SchemaErrorKind::DuplicateEnumSymbol {
                        symbol: symbol.clone(),
                    },
                ));
            }
            if by_number.insert(*number, index).is_some() {
                return Err(SchemaError::new(
                    &self.name,
                    SchemaErrorKind::DuplicateEnumNumber { number: *number },
                ));
            }
        }

        Ok(EnumDescriptor {
            name: self.name,
            values: self.values,
            by_symbol,
            by_number,
        })
    }
}
