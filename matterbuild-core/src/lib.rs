//! Matterbuild Core
//!
//! Core types shared by the Matterbuild services.
//!
//! This crate contains:
//! - Domain types: builds, job invocations, release versions, slash commands
//! - DTOs: the response payload returned to the chat server

pub mod domain;
pub mod dto;
