//! Workspace root package.
//!
//! Re-exports the [`bluemarz`] facade (with its testing helpers) so the
//! workspace-level integration tests and downstream experiments have a single
//! import path.

pub use bluemarz::*;
