//! Gateway domain: configuration, HTTP error mapping and wire types.

pub mod config;
pub mod error;
pub mod types;
