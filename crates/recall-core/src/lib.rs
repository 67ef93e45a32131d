//! Capability traits and the indexing pipeline for Recall.
//!
//! This crate defines the "ports" (the embedding provider and the two
//! store traits) that the infrastructure layer implements, plus the
//! pipeline that glues them together. It depends only on `recall-types` --
//! never on `recall-infra` or any database/HTTP crate.

pub mod embedding;
pub mod index;
pub mod storage;
