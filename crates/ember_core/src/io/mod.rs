//! # Serialization I/O
//!
//! Opaque ordered byte streams consumed by component serialization hooks.

mod stream;

pub use stream::{StreamReader, StreamWriter};
