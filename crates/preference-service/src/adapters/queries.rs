//! SQL statements for the SQL store backends.
//!
//! One table keyed by [`QueryId`], one statement per [`Dialect`]. Postgres
//! uses `$n` placeholders, SQLite uses positional `?`, so SQLite statements
//! may bind the same argument more than once.

/// SQL dialect of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

/// Identifies a statement independent of dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryId {
    CreateTable,
    GetPreferenceByKey,
    GetPreferencesByUserId,
    UpsertPreference,
    DeletePreference,
}

impl QueryId {
    /// Stable name used in log fields.
    pub const fn name(&self) -> &'static str {
        match self {
            QueryId::CreateTable => "create_table",
            QueryId::GetPreferenceByKey => "get_preference_by_key",
            QueryId::GetPreferencesByUserId => "get_preferences_by_user_id",
            QueryId::UpsertPreference => "upsert_preference",
            QueryId::DeletePreference => "delete_preference",
        }
    }

    /// Statement text for `dialect`.
    pub const fn sql(&self, dialect: Dialect) -> &'static str {
        match (self, dialect) {
            (QueryId::CreateTable, Dialect::Postgres) => POSTGRES_CREATE_TABLE,
            (QueryId::CreateTable, Dialect::Sqlite) => SQLITE_CREATE_TABLE,

            // Bind order: user_id, key, deployment_id
            (QueryId::GetPreferenceByKey, Dialect::Postgres) => {
                "SELECT PREFERENCE_KEY, PREFERENCE_VALUE, CREATED_AT, UPDATED_AT \
                 FROM USER_PREFERENCE \
                 WHERE USER_ID = $1 AND PREFERENCE_KEY = $2 AND DEPLOYMENT_ID = $3"
            }
            (QueryId::GetPreferenceByKey, Dialect::Sqlite) => {
                "SELECT PREFERENCE_KEY, PREFERENCE_VALUE, CREATED_AT, UPDATED_AT \
                 FROM USER_PREFERENCE \
                 WHERE USER_ID = ? AND PREFERENCE_KEY = ? AND DEPLOYMENT_ID = ?"
            }

            // Bind order: user_id, deployment_id
            (QueryId::GetPreferencesByUserId, Dialect::Postgres) => {
                "SELECT PREFERENCE_KEY, PREFERENCE_VALUE, CREATED_AT, UPDATED_AT \
                 FROM USER_PREFERENCE \
                 WHERE USER_ID = $1 AND DEPLOYMENT_ID = $2 \
                 ORDER BY PREFERENCE_KEY COLLATE \"C\" ASC"
            }
            (QueryId::GetPreferencesByUserId, Dialect::Sqlite) => {
                "SELECT PREFERENCE_KEY, PREFERENCE_VALUE, CREATED_AT, UPDATED_AT \
                 FROM USER_PREFERENCE \
                 WHERE USER_ID = ? AND DEPLOYMENT_ID = ? \
                 ORDER BY PREFERENCE_KEY ASC"
            }

            // Bind order: user_id, key, value, deployment_id, now (twice for SQLite)
            (QueryId::UpsertPreference, Dialect::Postgres) => {
                "INSERT INTO USER_PREFERENCE \
                 (USER_ID, PREFERENCE_KEY, PREFERENCE_VALUE, DEPLOYMENT_ID, \
                 CREATED_AT, UPDATED_AT) \
                 VALUES ($1, $2, $3, $4, $5, $5) \
                 ON CONFLICT (USER_ID, DEPLOYMENT_ID, PREFERENCE_KEY) \
                 DO UPDATE SET PREFERENCE_VALUE = EXCLUDED.PREFERENCE_VALUE, \
                 UPDATED_AT = EXCLUDED.UPDATED_AT"
            }
            (QueryId::UpsertPreference, Dialect::Sqlite) => {
                "INSERT INTO USER_PREFERENCE \
                 (USER_ID, PREFERENCE_KEY, PREFERENCE_VALUE, DEPLOYMENT_ID, \
                 CREATED_AT, UPDATED_AT) \
                 VALUES (?, ?, ?, ?, ?, ?) \
                 ON CONFLICT (USER_ID, DEPLOYMENT_ID, PREFERENCE_KEY) \
                 DO UPDATE SET PREFERENCE_VALUE = excluded.PREFERENCE_VALUE, \
                 UPDATED_AT = excluded.UPDATED_AT"
            }

            // Bind order: user_id, key, deployment_id
            (QueryId::DeletePreference, Dialect::Postgres) => {
                "DELETE FROM USER_PREFERENCE \
                 WHERE USER_ID = $1 AND PREFERENCE_KEY = $2 AND DEPLOYMENT_ID = $3"
            }
            (QueryId::DeletePreference, Dialect::Sqlite) => {
                "DELETE FROM USER_PREFERENCE \
                 WHERE USER_ID = ? AND PREFERENCE_KEY = ? AND DEPLOYMENT_ID = ?"
            }
        }
    }
}

const POSTGRES_CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS USER_PREFERENCE (
    ID BIGSERIAL PRIMARY KEY,
    USER_ID VARCHAR(255) NOT NULL,
    DEPLOYMENT_ID VARCHAR(255) NOT NULL,
    PREFERENCE_KEY VARCHAR(255) NOT NULL,
    PREFERENCE_VALUE TEXT NOT NULL,
    CREATED_AT TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UPDATED_AT TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
    CONSTRAINT UQ_USER_PREFERENCE UNIQUE (USER_ID, DEPLOYMENT_ID, PREFERENCE_KEY)
)";

const SQLITE_CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS USER_PREFERENCE (
    ID INTEGER PRIMARY KEY AUTOINCREMENT,
    USER_ID TEXT NOT NULL,
    DEPLOYMENT_ID TEXT NOT NULL,
    PREFERENCE_KEY TEXT NOT NULL,
    PREFERENCE_VALUE TEXT NOT NULL,
    CREATED_AT DATETIME NOT NULL,
    UPDATED_AT DATETIME NOT NULL,
    UNIQUE (USER_ID, DEPLOYMENT_ID, PREFERENCE_KEY)
)";

/// Row shape returned by both select statements.
pub(crate) type PreferenceRow = (
    String,
    String,
    chrono::DateTime<chrono::Utc>,
    chrono::DateTime<chrono::Utc>,
);

pub(crate) fn into_preference(row: PreferenceRow) -> crate::domain::entities::Preference {
    let (key, value, created_at, updated_at) = row;
    crate::domain::entities::Preference {
        key,
        value,
        created_at,
        updated_at,
    }
}
