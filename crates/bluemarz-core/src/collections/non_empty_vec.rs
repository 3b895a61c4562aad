//! Non-empty vector implementation.
//!
//! `NonEmptyVec<T>` is a vector that is guaranteed to contain at least one element.
//! Run results use it for their tool-call and message payloads so that an empty
//! batch cannot be represented once a result has been constructed.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Index;

/// A vector that is guaranteed to contain at least one element.
///
/// Serializes as a plain sequence; deserializing an empty sequence fails.
///
/// # Example
///
/// ```rust
/// use bluemarz_core::collections::NonEmptyVec;
///
/// let calls = NonEmptyVec::new("add", vec!["sub"]);
/// assert_eq!(calls.len(), 2);
/// assert_eq!(calls.first(), &"add");
///
/// assert!(NonEmptyVec::<u8>::try_from(Vec::new()).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyVec<T> {
    head: T,
    tail: Vec<T>,
}

impl<T> NonEmptyVec<T> {
    /// Create a new non-empty vector from a head element and the remaining elements.
    pub fn new(head: T, tail: Vec<T>) -> Self {
        NonEmptyVec { head, tail }
    }

    /// Create a non-empty vector with a single element.
    pub fn singleton(value: T) -> Self {
        NonEmptyVec {
            head: value,
            tail: Vec::new(),
        }
    }

    pub fn first(&self) -> &T {
        &self.head
    }

    pub fn last(&self) -> &T {
        self.tail.last().unwrap_or(&self.head)
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        1 + self.tail.len()
    }

    pub fn is_singleton(&self) -> bool {
        self.tail.is_empty()
    }

    pub fn push(&mut self, value: T) {
        self.tail.push(value);
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        if index == 0 {
            Some(&self.head)
        } else {
            self.tail.get(index - 1)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        std::iter::once(&self.head).chain(self.tail.iter())
    }

    /// Map every element, preserving the non-empty guarantee.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> NonEmptyVec<U> {
        NonEmptyVec {
            head: f(self.head),
            tail: self.tail.into_iter().map(f).collect(),
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        let mut vec = Vec::with_capacity(1 + self.tail.len());
        vec.push(self.head);
        vec.extend(self.tail);
        vec
    }
}

impl<T> TryFrom<Vec<T>> for NonEmptyVec<T> {
    type Error = EmptyVecError;

    fn try_from(vec: Vec<T>) -> Result<Self, Self::Error> {
        let mut iter = vec.into_iter();
        match iter.next() {
            Some(head) => Ok(NonEmptyVec {
                head,
                tail: iter.collect(),
            }),
            None => Err(EmptyVecError),
        }
    }
}

impl<T> From<NonEmptyVec<T>> for Vec<T> {
    fn from(non_empty: NonEmptyVec<T>) -> Self {
        non_empty.into_vec()
    }
}

impl<T> Index<usize> for NonEmptyVec<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.get(index).expect("index out of bounds")
    }
}

impl<T> IntoIterator for NonEmptyVec<T> {
    type Item = T;
    type IntoIter = std::iter::Chain<std::iter::Once<T>, std::vec::IntoIter<T>>;

    fn into_iter(self) -> Self::IntoIter {
        std::iter::once(self.head).chain(self.tail)
    }
}

impl<'a, T> IntoIterator for &'a NonEmptyVec<T> {
    type Item = &'a T;
    type IntoIter = std::iter::Chain<std::iter::Once<&'a T>, std::slice::Iter<'a, T>>;

    fn into_iter(self) -> Self::IntoIter {
        std::iter::once(&self.head).chain(self.tail.iter())
    }
}

impl<T: Serialize> Serialize for NonEmptyVec<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for NonEmptyVec<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<T>::deserialize(deserializer)?;
        NonEmptyVec::try_from(items).map_err(D::Error::custom)
    }
}

/// Returned when converting an empty `Vec` into a [`NonEmptyVec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyVecError;

impl fmt::Display for EmptyVecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cannot create NonEmptyVec from empty Vec")
    }
}

impl std::error::Error for EmptyVecError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_nonempty_vec() {
        let vec = NonEmptyVec::new(1, vec![2, 3]);
        assert_eq!(vec.first(), &1);
        assert_eq!(vec.last(), &3);
        assert_eq!(vec.len(), 3);
    }

    #[test]
    fn singleton_creates_single_element() {
        let vec = NonEmptyVec::singleton(42);
        assert_eq!(vec.first(), &42);
        assert_eq!(vec.last(), &42);
        assert!(vec.is_singleton());
    }

    #[test]
    fn try_from_vec_rejects_empty() {
        let empty: Vec<i32> = vec![];
        assert_eq!(NonEmptyVec::try_from(empty), Err(EmptyVecError));

        let non_empty = NonEmptyVec::try_from(vec![1, 2]).unwrap();
        assert_eq!(non_empty.into_vec(), vec![1, 2]);
    }

    #[test]
    fn map_preserves_order() {
        let vec = NonEmptyVec::new(1, vec![2, 3]).map(|n| n * 10);
        assert_eq!(vec.iter().copied().collect::<Vec<_>>(), vec![10, 20, 30]);
    }

    #[test]
    fn serializes_as_plain_sequence() {
        let vec = NonEmptyVec::new("a", vec!["b"]);
        assert_eq!(serde_json::to_string(&vec).unwrap(), r#"["a","b"]"#);
    }

    #[test]
    fn deserializing_empty_sequence_fails() {
        let err = serde_json::from_str::<NonEmptyVec<u8>>("[]").unwrap_err();
        assert!(err.to_string().contains("empty"));

        let vec: NonEmptyVec<u8> = serde_json::from_str("[7, 8]").unwrap();
        assert_eq!(vec[1], 8);
    }
}
