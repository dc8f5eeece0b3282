//! Transport adapters over the generic session runner.

pub mod stdio;

pub use stdio::StdioTransport;
