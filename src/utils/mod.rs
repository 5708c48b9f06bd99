//! Pure helpers used by the resolution engine and the HTTP layer.
//!
//! - [`code_generator`] - Short code generation over the safe alphabet
//! - [`alias_policy`] - Custom alias syntax and reservation checks
//! - [`url_normalizer`] - URL normalization and sanitization
//! - [`url_filter`] - Pluggable malicious-URL screening
//! - [`client_ip`] - Client address extraction from HTTP requests
//! - [`db_error`] - Classification of database errors

pub mod alias_policy;
pub mod client_ip;
pub mod code_generator;
pub mod db_error;
pub mod url_filter;
pub mod url_normalizer;
