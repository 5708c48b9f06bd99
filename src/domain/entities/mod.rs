//! Core domain entities.
//!
//! - [`UrlRecord`] - A stored short code to long URL mapping
//! - [`NewUrlRecord`] - Input for creating a record
//!
//! Cache entries are not entities: they are derived from [`UrlRecord`] and
//! can always be rebuilt from it.

pub mod url_record;

pub use url_record::{NewUrlRecord, UrlRecord};
