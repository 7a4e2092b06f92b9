//! # memex-core
//!
//! Core types, traits, and abstractions for the memex knowledge base.
//!
//! This crate provides the foundational data structures and trait definitions
//! that other memex crates depend on: the entity models (conversations,
//! messages, canvas notes, edges), the repository and backend traits, the
//! shared error taxonomy, and central default constants.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
pub use uuid_utils::new_v7;
