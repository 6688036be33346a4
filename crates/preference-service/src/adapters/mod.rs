//! # Adapters Layer
//!
//! Store backends implementing [`PreferenceStore`](crate::ports::outbound::PreferenceStore)
//! and [`Transactioner`](crate::ports::outbound::Transactioner).
//!
//! - `memory` - process-local, used by tests and the `memory` backend
//! - `postgres` - `sqlx::PgPool` (feature `postgres`)
//! - `sqlite` - `sqlx::SqlitePool` (feature `sqlite`)

pub mod memory;
pub mod queries;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::{InMemoryPreferenceStore, InMemoryTransactioner, MemoryTransaction};
pub use queries::{Dialect, QueryId};

#[cfg(feature = "postgres")]
pub use postgres::{PostgresPreferenceStore, PostgresTransactioner};

#[cfg(feature = "sqlite")]
pub use sqlite::{SqlitePreferenceStore, SqliteTransactioner};
