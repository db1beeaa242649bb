//! Storage for the repeated fields of generated messages.

use core::fmt;
use core::ops::{Deref, DerefMut};

/// The values of a repeated field, and whether the field is present.
///
/// A field read from `[]`, or set from a `Vec` or an iterator, is present
/// even when it holds no values and is then written as `[]`. A defaulted
/// field is absent and left out. A field holding values is always present.
///
/// Equality looks at the values only, so an absent field equals a present
/// empty one. The values are reached through `Deref` to `Vec<T>`.
#[derive(Clone)]
pub struct Repeated<T> {
    values: Vec<T>,
    present: bool,
}

impl<T> Repeated<T> {
    /// An absent field.
    pub const fn new() -> Self {
        Self {
            values: Vec::new(),
            present: false,
        }
    }

    /// Whether the field is written at all.
    pub fn is_present(&self) -> bool {
        self.present || !self.values.is_empty()
    }

    /// Marks the field present, so it is written as `[]` when empty.
    pub fn mark_present(&mut self) {
        self.present = true;
    }

    /// Removes every value and marks the field absent.
    pub fn reset(&mut self) {
        self.values.clear();
        self.present = false;
    }

    /// The values.
    pub fn into_vec(self) -> Vec<T> {
        self.values
    }
}

impl<T> Default for Repeated<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for Repeated<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        &self.values
    }
}

impl<T> DerefMut for Repeated<T> {
    fn deref_mut(&mut self) -> &mut Vec<T> {
        &mut self.values
    }
}

impl<T> From<Vec<T>> for Repeated<T> {
    fn from(values: Vec<T>) -> Self {
        Self {
            values,
            present: true,
        }
    }
}

impl<T> FromIterator<T> for Repeated<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Vec::from_iter(iter).into()
    }
}

impl<T> Extend<T> for Repeated<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.present = true;
        self.values.extend(iter);
    }
}

impl<T> IntoIterator for Repeated<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Repeated<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for Repeated<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.values.is_empty() && self.present {
            return f.write_str("[] (present)");
        }
        f.debug_list().entries(&self.values).finish()
    }
}

impl<T: PartialEq> PartialEq for Repeated<T> {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl<T: Eq> Eq for Repeated<T> {}

impl<T: PartialEq> PartialEq<Vec<T>> for Repeated<T> {
    fn eq(&self, other: &Vec<T>) -> bool {
        self.values == *other
    }
}

impl<T: PartialEq> PartialEq<[T]> for Repeated<T> {
    fn eq(&self, other: &[T]) -> bool {
        self.values == other
    }
}

impl<T: PartialEq<U>, U, const N: usize> PartialEq<[U; N]> for Repeated<T> {
    fn eq(&self, other: &[U; N]) -> bool {
        self.values == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protojson_testhelpers::test;

    #[test]
    fn presence() {
        let mut field = Repeated::<i64>::new();
        assert!(!field.is_present());
        field.push(1);
        assert!(field.is_present());
        field.clear();
        assert!(!field.is_present());

        assert!(Repeated::<i64>::from(Vec::new()).is_present());
        assert!(Repeated::<i64>::from_iter([]).is_present());

        let mut field = Repeated::<i64>::default();
        field.mark_present();
        assert!(field.is_present());
        field.reset();
        assert!(!field.is_present());
    }

    #[test]
    fn equality_ignores_presence() {
        assert_eq!(Repeated::<i64>::new(), Repeated::from(Vec::new()));
        assert_eq!(Repeated::from(vec![1, 2]), [1, 2]);
        assert_eq!(Repeated::from(vec![1, 2]), vec![1, 2]);
        assert_ne!(Repeated::from(vec![1]), Repeated::from(vec![2]));
    }

    #[test]
    fn debug_shows_present_empty() {
        assert_eq!(format!("{:?}", Repeated::<i64>::new()), "[]");
        assert_eq!(format!("{:?}", Repeated::<i64>::from(vec![])), "[] (present)");
        assert_eq!(format!("{:?}", Repeated::from(vec![1, 2])), "[1, 2]");
    }
}
