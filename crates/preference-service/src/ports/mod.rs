//! # Ports Layer
//!
//! ## Hexagonal Architecture
//!
//! - `inbound.rs` - Driving port (API exposed to the HTTP gateway)
//! - `outbound.rs` - Driven ports (store, transactioner, clock)

pub mod inbound;
pub mod outbound;
