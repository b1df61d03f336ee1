//! Shared domain types for Rolecall.
//!
//! This crate contains the core domain types used across the Rolecall
//! workspace: guild/channel/user ids, the Character record, inbound chat
//! messages, configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, indexmap, uuid, chrono, thiserror.

pub mod character;
pub mod config;
pub mod error;
pub mod ids;
pub mod message;
