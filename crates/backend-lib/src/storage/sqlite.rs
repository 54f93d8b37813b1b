// ============================
// crates/backend-lib/src/storage/sqlite.rs
// ============================
//! SQLite-backed identity store.
//!
//! Table `users`: id, email (unique), hashed_password, session_id (unique
//! when present), reset_token, session_created_at.
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use tracing::{debug, instrument, warn};

use account_auth_common::UserId;

use super::{FieldValue, StoreError, User, UserFilter, UserStore, UserUpdate};
use crate::auth::HashedPassword;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email VARCHAR(250) NOT NULL UNIQUE,
    hashed_password VARCHAR(250) NOT NULL,
    session_id VARCHAR(250) UNIQUE,
    reset_token VARCHAR(250),
    session_created_at INTEGER
);";

const SELECT_COLUMNS: &str =
    "SELECT id, email, hashed_password, session_id, reset_token, session_created_at FROM users";

/// Default bound on a single store call
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite identity store
///
/// A single connection is shared behind a mutex; every call runs on the
/// blocking thread pool and is bounded by the operation timeout.
#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
    operation_timeout: Duration,
}

impl SqliteUserStore {
    /// Open (or create) the database at `path`
    pub fn open(path: &Path, busy_timeout: Duration, operation_timeout: Duration) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        // WAL mode for concurrent readers, crash safety
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        Self::from_connection(conn, busy_timeout, operation_timeout)
    }

    /// Private in-memory database, used in tests
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, Duration::from_secs(1), DEFAULT_OPERATION_TIMEOUT)
    }

    fn from_connection(conn: Connection, busy_timeout: Duration, operation_timeout: Duration) -> Result<Self, StoreError> {
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            operation_timeout,
        })
    }

    /// Run `op` in a transaction on the blocking pool
    ///
    /// A call that has already returned [`StoreError::Timeout`] rolls back
    /// instead of committing. The window between the final check and the
    /// commit is not covered.
    async fn run<T, F>(&self, behavior: TransactionBehavior, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Transaction<'_>) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let abandoned = Arc::new(AtomicBool::new(false));
        let task = tokio::task::spawn_blocking({
            let abandoned = Arc::clone(&abandoned);
            move || {
                let mut guard = conn.lock();
                if abandoned.load(Ordering::Acquire) {
                    return Err(StoreError::Timeout);
                }
                let tx = guard.transaction_with_behavior(behavior)?;
                let value = op(&tx)?;
                if abandoned.load(Ordering::Acquire) {
                    debug!("store call abandoned, rolling back");
                    return Err(StoreError::Timeout);
                }
                tx.commit()?;
                Ok(value)
            }
        });

        match tokio::time::timeout(self.operation_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => {
                warn!(error = %join_err, "store task failed");
                Err(StoreError::Unavailable(join_err.to_string()))
            },
            Err(_) => {
                abandoned.store(true, Ordering::Release);
                warn!(timeout_ms = self.operation_timeout.as_millis() as u64, "store call timed out");
                Err(StoreError::Timeout)
            },
        }
    }
}

fn to_sql(value: &FieldValue) -> Value {
    match value {
        FieldValue::Integer(v) => Value::Integer(*v),
        FieldValue::Text(v) => Value::Text(v.clone()),
        FieldValue::Null => Value::Null,
    }
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        hashed_password: HashedPassword::from(row.get::<_, String>(2)?),
        session_id: row.get(3)?,
        reset_token: row.get(4)?,
        session_created_at: row.get(5)?,
    })
}

/// `SELECT ... WHERE (c1, c2) IN (VALUES (?1, ?2)) ORDER BY id` and its bind values
fn filter_query(filter: &UserFilter, limit: Option<usize>) -> (String, Vec<Value>) {
    let columns: Vec<&str> = filter.terms().iter().map(|(field, _)| field.column()).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    let mut sql = format!(
        "{SELECT_COLUMNS} WHERE ({}) IN (VALUES ({})) ORDER BY id",
        columns.join(", "),
        placeholders.join(", "),
    );
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    let values = filter.terms().iter().map(|(_, value)| to_sql(value)).collect();
    (sql, values)
}

#[async_trait]
impl UserStore for SqliteUserStore {
    #[instrument(skip_all, level = "debug")]
    async fn find_one_by(&self, filter: &UserFilter) -> Result<User, StoreError> {
        filter.ensure_valid()?;
        let (sql, values) = filter_query(filter, Some(1));
        self.run(TransactionBehavior::Deferred, move |tx| {
            tx.query_row(&sql, params_from_iter(values.iter()), row_to_user)
                .map_err(StoreError::from)
        })
        .await
    }

    #[instrument(skip_all, level = "debug")]
    async fn find_all_by(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError> {
        filter.ensure_valid()?;
        let (sql, values) = filter_query(filter, None);
        self.run(TransactionBehavior::Deferred, move |tx| {
            let mut stmt = tx.prepare(&sql)?;
            let users = stmt
                .query_map(params_from_iter(values.iter()), row_to_user)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(users)
        })
        .await
    }

    #[instrument(skip_all, level = "debug")]
    async fn add(&self, email: &str, hashed_password: &HashedPassword) -> Result<User, StoreError> {
        let email = email.to_string();
        let hashed_password = hashed_password.clone();
        self.run(TransactionBehavior::Immediate, move |tx| {
            tx.execute(
                "INSERT INTO users (email, hashed_password) VALUES (?1, ?2)",
                rusqlite::params![email, hashed_password.as_str()],
            )?;
            let id = tx.last_insert_rowid();
            debug!(user_id = id, "user row inserted");
            Ok(User {
                id,
                email,
                hashed_password,
                session_id: None,
                reset_token: None,
                session_created_at: None,
            })
        })
        .await
    }

    #[instrument(skip(self, update), level = "debug")]
    async fn update(&self, user_id: UserId, update: &UserUpdate) -> Result<(), StoreError> {
        let assignments: Vec<(&'static str, Value)> = update
            .assignments()
            .iter()
            .map(|(field, value)| (field.column(), to_sql(value)))
            .collect();

        self.run(TransactionBehavior::Immediate, move |tx| {
            let exists = tx
                .query_row("SELECT id FROM users WHERE id = ?1", [user_id], |row| row.get::<_, i64>(0))
                .optional()?;
            if exists.is_none() {
                return Err(StoreError::NotFound);
            }

            if !assignments.is_empty() {
                let set_clause: Vec<String> = assignments
                    .iter()
                    .enumerate()
                    .map(|(i, (column, _))| format!("{column} = ?{}", i + 1))
                    .collect();
                let sql = format!(
                    "UPDATE users SET {} WHERE id = ?{}",
                    set_clause.join(", "),
                    assignments.len() + 1
                );
                let mut values: Vec<Value> = assignments.into_iter().map(|(_, value)| value).collect();
                values.push(Value::Integer(user_id));
                tx.execute(&sql, params_from_iter(values.iter()))?;
            }
            Ok(())
        })
        .await
    }
}
