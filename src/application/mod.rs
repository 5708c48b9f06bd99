//! Application layer services implementing business logic.
//!
//! Services consume repository traits and the cache guard, and provide a
//! clean API for HTTP handlers, the server and the admin CLI.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Shortening, resolution and statistics
//! - [`services::sweeper::ExpirationSweeper`] - Background deactivation and purging

pub mod services;
