//! Shared domain types for Recall.
//!
//! This crate contains the core domain types used across the Recall index:
//! Document, Conversation, search results, configuration, and their
//! associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod conversation;
pub mod document;
pub mod error;
