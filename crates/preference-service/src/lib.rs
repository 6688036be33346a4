//! # preference-service
//!
//! Per-user key/value preference storage: validation, the store contract and
//! the transactional batch upsert.
//!
//! ## Overview
//!
//! This crate provides:
//! - **Validation**: key/value size rules enforced before any I/O
//! - **Store contract**: four scoped operations that report "no such row"
//!   distinctly from generic failures
//! - **Atomic batch upsert**: every write of a batch runs inside one
//!   transaction opened by a [`Transactioner`]
//! - **Error taxonomy**: store failures collapse to [`ServiceError::InternalError`],
//!   except `NotFound` which is preserved
//!
//! ## Architecture
//!
//! ```text
//! HTTP gateway ──→ PreferenceApi (inbound port)
//!                        │
//!                        ├── validation (domain)
//!                        │
//!                        ├──→ PreferenceStore ──────────────┐
//!                        │      (StoreContext::Direct)      │
//!                        │                                  ↓
//!                        └──→ Transactioner ──→ PreferenceStore (StoreContext::Transaction)
//!                                                           │
//!                                        ┌──────────────────┼──────────────────┐
//!                                        ↓                  ↓                  ↓
//!                                    In-memory           Postgres            SQLite
//! ```
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Entities and validation rules
//! - `ports/` - Inbound API and outbound store/transaction/clock traits
//! - `adapters/` - Store backends
//! - `service.rs` - Application service implementing the API
//!
//! ## Example
//!
//! ```rust,ignore
//! use preference_service::adapters::{InMemoryPreferenceStore, InMemoryTransactioner};
//! use preference_service::{PreferenceApi, PreferenceService};
//!
//! let store = InMemoryPreferenceStore::new("default");
//! let transactioner = InMemoryTransactioner::new(&store);
//! let service = PreferenceService::new(store, transactioner);
//!
//! let written = service.upsert_preferences("user-1", prefs).await?;
//! let all = service.get_preferences_by_user_id("user-1").await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use domain::entities::Preference;
pub use domain::validation::{
    validate_preference_key, validate_preference_value, MAX_PREFERENCE_KEY_LENGTH,
    MAX_PREFERENCE_VALUE_LENGTH,
};
pub use error::{ErrorType, ServiceError, ServiceResult, StoreError, StoreResult};
pub use ports::inbound::PreferenceApi;
pub use ports::outbound::{Clock, PreferenceStore, StoreContext, SystemClock, Transactioner};
pub use service::PreferenceService;
