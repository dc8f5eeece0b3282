//! Tool registration entries and output normalization.

pub mod entry;
pub mod output;

pub use entry::ToolEntry;
pub use output::ToolOutput;
