//! Core domain types
//!
//! These types describe what the bridge talks about: remote builds and the
//! jobs that produce them, release versions, and the slash commands that
//! trigger everything. They carry no I/O.

pub mod build;
pub mod command;
pub mod release;
