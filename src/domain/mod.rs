//! Domain layer containing business entities and the store contract.
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//!
//! The domain layer has no dependencies on infrastructure or presentation
//! layers; the resolution engine in [`crate::application::services`] consumes
//! these traits.

pub mod entities;
pub mod repositories;
