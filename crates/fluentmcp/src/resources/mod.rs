//! Resource registration entries and output normalization.

pub mod entry;
pub mod output;

pub use entry::ResourceEntry;
pub use output::ResourceOutput;
