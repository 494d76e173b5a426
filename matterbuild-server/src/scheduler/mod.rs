//! Scheduler layer for the server
//!
//! Turns asynchronous remote builds into results the actions can branch on,
//! and carries the shutdown signal every wait loop listens to.

pub mod poller;
pub mod shutdown;

pub use poller::{PollPolicy, Poller};
pub use shutdown::ShutdownSignal;
