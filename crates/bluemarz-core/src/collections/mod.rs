//! Non-empty collections for construction-time guarantees.

pub mod non_empty_vec;

pub use non_empty_vec::{EmptyVecError, NonEmptyVec};
