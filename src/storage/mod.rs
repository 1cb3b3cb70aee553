//! Filesystem access layer.
//!
//! Every archive the server touches is reached through [`PathSandbox`], which
//! maps a client-supplied relative path onto the configured root and refuses
//! anything that would land outside of it.

mod sandbox;

pub use sandbox::{normalize_lexically, PathSandbox};
