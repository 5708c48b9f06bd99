//! Business logic services for the application layer.

pub mod link_service;
pub mod sweeper;

pub use link_service::{LinkService, LinkSettings, ShortenOptions, ShortenedLink};
pub use sweeper::{ExpirationSweeper, SweepReport, SweeperConfig};
