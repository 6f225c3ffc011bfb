//! Domain models for the fuzzy-rx system.

mod catalog;
mod record;
mod resolution;

pub use catalog::*;
pub use record::*;
pub use resolution::*;
