//! Prompt registration entries and output normalization.

pub mod entry;
pub mod output;

pub use entry::PromptEntry;
pub use output::PromptOutput;
