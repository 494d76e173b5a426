//! Service layer
//!
//! Authorization, command parsing and the actions behind every slash
//! command, including the release cut workflow.

mod actions;
pub mod auth;
pub mod ci_config;
pub mod command;
pub mod dispatch;
pub mod probe;
pub mod release;

pub use dispatch::Dispatcher;
