//! Data Transfer Objects
//!
//! Payloads exchanged with the chat server.

pub mod slash;
