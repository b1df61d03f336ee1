//! Business logic and repository trait definitions for Rolecall.
//!
//! This crate defines the "ports" (repository and transport traits) that the
//! infrastructure and application layers implement, plus the character
//! flows built on top of them. It depends only on `rolecall-types` -- never
//! on `rolecall-infra` or any database/IO crate.

pub mod conversation;
pub mod meta;
pub mod repository;
pub mod service;
