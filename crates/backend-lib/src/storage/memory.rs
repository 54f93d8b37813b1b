// ============================
// crates/backend-lib/src/storage/memory.rs
// ============================
//! In-memory identity store.
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use account_auth_common::UserId;

use super::{StoreError, User, UserFilter, UserStore, UserUpdate};
use crate::auth::HashedPassword;

#[derive(Default)]
struct Table {
    next_id: UserId,
    rows: BTreeMap<UserId, User>,
}

/// Identity store kept in process memory
///
/// Enforces the same uniqueness constraints as the SQLite schema
/// (`email`, and `session_id` when present).
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    table: Arc<RwLock<Table>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub fn len(&self) -> usize {
        self.table.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_one_by(&self, filter: &UserFilter) -> Result<User, StoreError> {
        filter.ensure_valid()?;
        let table = self.table.read();
        table
            .rows
            .values()
            .find(|user| filter.matches(user))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_all_by(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError> {
        filter.ensure_valid()?;
        let table = self.table.read();
        Ok(table
            .rows
            .values()
            .filter(|user| filter.matches(user))
            .cloned()
            .collect())
    }

    async fn add(&self, email: &str, hashed_password: &HashedPassword) -> Result<User, StoreError> {
        let mut table = self.table.write();
        if table.rows.values().any(|user| user.email == email) {
            return Err(StoreError::Conflict("UNIQUE constraint failed: users.email".to_string()));
        }
        table.next_id += 1;
        let user = User {
            id: table.next_id,
            email: email.to_string(),
            hashed_password: hashed_password.clone(),
            session_id: None,
            reset_token: None,
            session_created_at: None,
        };
        table.rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user_id: UserId, update: &UserUpdate) -> Result<(), StoreError> {
        let mut table = self.table.write();
        let mut updated = table.rows.get(&user_id).cloned().ok_or(StoreError::NotFound)?;
        updated.apply(update);

        if let Some(session_id) = updated.session_id.as_deref() {
            let taken = table
                .rows
                .values()
                .any(|other| other.id != user_id && other.session_id.as_deref() == Some(session_id));
            if taken {
                return Err(StoreError::Conflict(
                    "UNIQUE constraint failed: users.session_id".to_string(),
                ));
            }
        }

        table.rows.insert(user_id, updated);
        Ok(())
    }
}
