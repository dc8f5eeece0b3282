//! Per-connection session state and the loop that serves it.

pub mod notifier;
pub mod runner;
pub mod state;

pub use notifier::Notifier;
pub use runner::{RunnerLimits, SessionRunner};
pub use state::{Session, SessionState};
