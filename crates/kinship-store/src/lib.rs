//! Kinship Storage Layer
//!
//! Implements the `UserDirectory` and `RelationshipStore` traits on SQLite.
//!
//! # Architecture
//!
//! - One `users` table serving the directory
//! - One `relationships` table holding a single active row per unordered pair,
//!   enforced by a partial unique index over the normalized pair
//! - State updates are compare-and-swap on the stored state
//!
//! # Examples
//!
//! ```no_run
//! use kinship_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for directory and relationship operations
//! ```

#![warn(missing_docs)]

use kinship_domain::traits::{RelationshipStore, UserDirectory};
use kinship_domain::{
    FriendState, ListKind, Relationship, RelationshipId, StateUpdate, User, UserId,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A uniqueness rule rejected the write
    #[error("Conflict: {0}")]
    Conflict(String),
}

const RELATIONSHIP_COLUMNS: &str =
    "r.id, r.left_id, r.right_id, r.state, r.created_at, r.updated_at";

const USER_COLUMNS: &str = "u.id, u.contact, u.display_name, u.avatar, u.bio";

/// Current timestamp in seconds since Unix epoch
fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// SQLite-based implementation of the user directory and relationship store
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Share a store between threads by
/// wrapping it in a mutex, as `kinship-engine` does.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::open(path, Duration::from_secs(5))
    }

    /// Open a store, waiting up to `busy_timeout` for locks held by other connections
    pub fn open<P: AsRef<Path>>(path: P, busy_timeout: Duration) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Add a user to the directory
    ///
    /// Fails with [`StoreError::Conflict`] if the identity or contact is taken.
    pub fn insert_user(&mut self, user: &User) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO users (id, contact, display_name, avatar, bio)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    Self::user_id_to_bytes(user.id),
                    &user.contact,
                    &user.display_name,
                    &user.avatar,
                    &user.bio,
                ],
            )
            .map_err(|e| Self::map_unique(e, format!("user {} already exists", user.contact)))?;
        Ok(())
    }

    /// Soft-delete a relationship so it drops out of every active query
    ///
    /// Returns `false` if no active record had that id.
    pub fn soft_delete_relationship(&mut self, id: RelationshipId) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            "UPDATE relationships SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
            params![current_timestamp() as i64, id.value()],
        )?;
        Ok(changed == 1)
    }

    /// Number of active relationship records
    pub fn count_active_relationships(&self) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM relationships WHERE deleted_at IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Check that the database answers queries
    pub fn ping(&self) -> Result<(), StoreError> {
        self.conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    /// Convert UserId to bytes for storage
    fn user_id_to_bytes(id: UserId) -> Vec<u8> {
        id.value().to_be_bytes().to_vec()
    }

    /// Convert bytes to UserId
    fn bytes_to_user_id(bytes: &[u8]) -> Result<UserId, StoreError> {
        if bytes.len() != 16 {
            return Err(StoreError::InvalidData(format!(
                "Expected 16 bytes for UserId, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(bytes);
        Ok(UserId::from_value(u128::from_be_bytes(arr)))
    }

    /// Decode a stored state code
    fn code_to_state(code: i64) -> Result<FriendState, StoreError> {
        match FriendState::from_code(code) {
            Some(state) if state.is_persisted() => Ok(state),
            _ => Err(StoreError::InvalidData(format!("Unknown relationship state: {}", code))),
        }
    }

    fn conversion_error(

        index: usize,

        ty: rusqlite::types::Type,

        e: StoreError,

    ) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(index, ty, Box::new(e))
    }

    /// Read a relationship from six columns starting at `offset`
    fn row_to_relationship(row: &Row<'_>, offset: usize) -> rusqlite::Result<Relationship> {
        let left_bytes: Vec<u8> = row.get(offset + 1)?;
        let right_bytes: Vec<u8> = row.get(offset + 2)?;
        let code: i64 = row.get(offset + 3)?;

        let left = Self::bytes_to_user_id(&left_bytes)
            .map_err(|e| Self::conversion_error(offset + 1, rusqlite::types::Type::Blob, e))?;
        let right = Self::bytes_to_user_id(&right_bytes)
            .map_err(|e| Self::conversion_error(offset + 2, rusqlite::types::Type::Blob, e))?;
        let state = Self::code_to_state(code)
            .map_err(|e| Self::conversion_error(offset + 3, rusqlite::types::Type::Integer, e))?;

        Ok(Relationship {
            id: RelationshipId::new(row.get(offset)?),
            left,
            right,
            state,
            created_at: row.get::<_, i64>(offset + 4)? as u64,
            updated_at: row.get::<_, i64>(offset + 5)? as u64,
        })
    }

    /// Read a user from five columns starting at `offset`
    fn row_to_user(row: &Row<'_>, offset: usize) -> rusqlite::Result<User> {
        let id_bytes: Vec<u8> = row.get(offset)?;
        let id = Self::bytes_to_user_id(&id_bytes)
            .map_err(|e| Self::conversion_error(offset, rusqlite::types::Type::Blob, e))?;

        Ok(User {
            id,
            contact: row.get(offset + 1)?,
            display_name: row.get(offset + 2)?,
            avatar: row.get(offset + 3)?,
            bio: row.get(offset + 4)?,
        })
    }

    /// Turn unique-constraint failures into [`StoreError::Conflict`]
    fn map_unique(e: rusqlite::Error, context: String) -> StoreError {
        match &e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                StoreError::Conflict(context)
            }
            _ => StoreError::Database(e),
        }
    }

    fn find_user(

        &self,

        column: &str,

        value: &dyn rusqlite::ToSql,

    ) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users u WHERE u.{} = ?1", USER_COLUMNS, column);
        let user = self
            .conn
            .query_row(&sql, [value], |row| Self::row_to_user(row, 0))
            .optional()?;
        Ok(user)
    }
}

impl UserDirectory for SqliteStore {
    type Error = StoreError;

    fn find_by_identity(&self, id: UserId) -> Result<Option<User>, Self::Error> {
        self.find_user("id", &Self::user_id_to_bytes(id))
    }

    fn find_by_contact(&self, contact: &str) -> Result<Option<User>, Self::Error> {
        self.find_user("contact", &contact)
    }
}

impl RelationshipStore for SqliteStore {
    type Error = StoreError;

    fn find_active_by_pair(

        &self,

        a: UserId,

        b: UserId,

    ) -> Result<Option<Relationship>, Self::Error> {
        let sql = format!(
            "SELECT {} FROM relationships r
             WHERE ((r.left_id = ?1 AND r.right_id = ?2) OR (r.left_id = ?2 AND r.right_id = ?1))
               AND r.deleted_at IS NULL",
            RELATIONSHIP_COLUMNS
        );
        let relationship = self
            .conn
            .query_row(
                &sql,
                params![Self::user_id_to_bytes(a), Self::user_id_to_bytes(b)],
                |row| Self::row_to_relationship(row, 0),
            )
            .optional()?;
        Ok(relationship)
    }

    fn find_active_by_id(&self, id: RelationshipId) -> Result<Option<Relationship>, Self::Error> {
        let sql = format!(
            "SELECT {} FROM relationships r WHERE r.id = ?1 AND r.deleted_at IS NULL",
            RELATIONSHIP_COLUMNS
        );
        let relationship = self
            .conn
            .query_row(&sql, params![id.value()], |row| Self::row_to_relationship(row, 0))
            .optional()?;
        Ok(relationship)
    }

    fn insert_relationship(

        &mut self,

        left: UserId,

        right: UserId,

        state: FriendState,

    ) -> Result<Relationship, Self::Error> {
        if left == right {
            return Err(StoreError::InvalidData(
                "A relationship needs two distinct users".to_string(),
            ));
        }
        if !state.is_persisted() {
            return Err(StoreError::InvalidData(format!("State {} cannot be stored", state)));
        }

        let now = current_timestamp();
        self.conn
            .execute(
                "INSERT INTO relationships (left_id, right_id, state, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![
                    Self::user_id_to_bytes(left),
                    Self::user_id_to_bytes(right),
                    state.code(),
                    now as i64,
                ],
            )
            .map_err(|e| {
                let context =
                    format!("an active relationship between {} and {} exists", left, right);
                Self::map_unique(e, context)
            })?;

        Ok(Relationship {
            id: RelationshipId::new(self.conn.last_insert_rowid()),
            left,
            right,
            state,
            created_at: now,
            updated_at: now,
        })
    }

    fn update_state(&mut self, update: &StateUpdate) -> Result<bool, Self::Error> {
        if !update.next.is_persisted() {
            return Err(StoreError::InvalidData(format!("State {} cannot be stored", update.next)));
        }

        // Right-hand sides read the pre-update row, so the CASEs swap in place
        let changed = self.conn.execute(
            "UPDATE relationships
             SET state = ?1,
                 updated_at = ?2,
                 left_id = CASE WHEN ?3 THEN right_id ELSE left_id END,
                 right_id = CASE WHEN ?3 THEN left_id ELSE right_id END
             WHERE id = ?4 AND state = ?5 AND deleted_at IS NULL",
            params![
                update.next.code(),
                current_timestamp() as i64,
                update.swap,
                update.id.value(),
                update.expected.code(),
            ],
        )?;

        Ok(changed == 1)
    }

    fn list_active(

        &self,

        user: UserId,

        kind: ListKind,

    ) -> Result<Vec<(Relationship, User)>, Self::Error> {
        let sql = format!(
            "SELECT {}, {} FROM relationships r
             JOIN users u ON u.id = CASE WHEN r.left_id = ?1 THEN r.right_id ELSE r.left_id END
             WHERE (r.left_id = ?1 OR r.right_id = ?1) AND r.deleted_at IS NULL
             ORDER BY u.display_name ASC, r.id ASC",
            RELATIONSHIP_COLUMNS, USER_COLUMNS
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![Self::user_id_to_bytes(user)], |row| {
                Ok((Self::row_to_relationship(row, 0)?, Self::row_to_user(row, 6)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .filter(|(relationship, _)| {
                relationship
                    .role_of(user)
                    .is_some_and(|role| kind.includes(role, relationship.state))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_bytes_roundtrip() {
        let id = UserId::new();
        let bytes = SqliteStore::user_id_to_bytes(id);
        assert_eq!(bytes.len(), 16);
        assert_eq!(SqliteStore::bytes_to_user_id(&bytes).unwrap(), id);
    }

    #[test]
    fn test_bytes_to_user_id_rejects_wrong_length() {
        assert!(matches!(
            SqliteStore::bytes_to_user_id(&[1, 2, 3]),
            Err(StoreError::InvalidData(_))
        ));
    }

    #[test]
    fn test_code_to_state_rejects_none_and_unknown() {
        assert_eq!(SqliteStore::code_to_state(2).unwrap(), FriendState::Mutual);
        assert!(SqliteStore::code_to_state(-1).is_err());
        assert!(SqliteStore::code_to_state(42).is_err());
    }
}
