//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx.
//!
//! # Repositories
//!
//! - [`PgUrlRepository`] - URL record storage, click counters and expiration sweeps

pub mod pg_url_repository;

pub use pg_url_repository::PgUrlRepository;
