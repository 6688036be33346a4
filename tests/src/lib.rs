//! # Preference Service Test Suite
//!
//! Cross-crate flows that no single crate can test on its own.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── store_contract.rs   # Same contract against memory and SQLite stores
//!     └── http_flows.rs       # HTTP requests through the node's wiring
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p preference-tests
//! cargo test -p preference-tests integration::http_flows::
//! ```

pub mod integration;
