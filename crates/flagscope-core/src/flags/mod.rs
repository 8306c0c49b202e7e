//! Flag reference catalog

pub mod class;
pub mod data;
pub mod entry;

pub use class::{ClassKey, FlagClass};
pub use data::FlagCatalog;
pub use entry::{AspectRatio, FlagReferenceEntry, LinePattern};
