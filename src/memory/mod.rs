//! Arena-backed storage. Nothing allocated here is freed before its arena.

mod arena;
mod collection;

pub use arena::*;
pub use collection::*;
