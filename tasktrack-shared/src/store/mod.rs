/// Persistence collaborator
///
/// The services never talk to a database directly. They open one unit of
/// work per call with [`Store::begin`], load snapshots, mutate them, save
/// them back, and [`StoreTx::commit`]. Dropping a transaction without
/// committing discards every change made through it.
///
/// Entities cross this boundary as plain snapshots with id references only
/// (`admin_id`, `member_ids`, `creator_id`, `team_id`, `assignee_ids`).
///
/// # Implementations
///
/// - [`memory::MemoryStore`]: in-process, serialisable, used in tests
/// - [`postgres::PgStore`]: sqlx transactions with row locks
///
/// Both enforce the same constraints: unique usernames and emails, RESTRICT
/// references from teams and tasks to their admin, creator and team, and
/// cascading membership/assignment rows when a user is deleted.
///
/// # Example
///
/// ```
/// use tasktrack_shared::store::{memory::MemoryStore, Store, StoreTx};
///
/// # async fn example() -> Result<(), tasktrack_shared::store::StoreError> {
/// let store = MemoryStore::new();
/// let mut tx = store.begin().await?;
/// assert!(tx.find_user_by_username("nobody").await?.is_none());
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{task::Task, team::Team, user::User};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint was violated (constraint name)
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A referential constraint was violated (constraint name)
    #[error("Referential constraint violated: {0}")]
    ForeignKeyViolation(String),

    /// A stored row could not be turned back into a model
    #[error("Failed to decode stored row: {0}")]
    Decode(String),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Source of transactions
#[async_trait]
pub trait Store: Send + Sync {
    /// Opens a unit of work
    async fn begin(&self) -> Result<Box<dyn StoreTx + '_>, StoreError>;

    /// Checks that the backing store is reachable
    async fn ping(&self) -> Result<(), StoreError>;
}

/// One atomic unit of work
///
/// `find_*` are plain reads. `lock_team` / `lock_task` also lock the row for
/// the rest of the transaction where the backend supports it; mutations load
/// through them.
#[async_trait]
pub trait StoreTx: Send {
    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError>;

    /// Loads the users among `ids` that exist, in no particular order
    async fn find_users(&mut self, ids: &[Uuid]) -> Result<Vec<User>, StoreError>;

    async fn insert_user(&mut self, user: &User) -> Result<(), StoreError>;

    async fn update_user(&mut self, user: &User) -> Result<(), StoreError>;

    /// Returns false if no such user existed
    async fn delete_user(&mut self, id: Uuid) -> Result<bool, StoreError>;

    async fn find_team(&mut self, id: Uuid) -> Result<Option<Team>, StoreError>;

    /// Like `find_team`, holding a row lock until commit or rollback
    async fn lock_team(&mut self, id: Uuid) -> Result<Option<Team>, StoreError>;

    /// Teams that have `user_id` among their members, oldest first
    async fn list_teams_for_member(&mut self, user_id: Uuid) -> Result<Vec<Team>, StoreError>;

    /// Inserts or replaces a team together with its member set
    async fn save_team(&mut self, team: &Team) -> Result<(), StoreError>;

    /// Returns false if no such team existed
    async fn delete_team(&mut self, id: Uuid) -> Result<bool, StoreError>;

    async fn find_task(&mut self, id: Uuid) -> Result<Option<Task>, StoreError>;

    /// Like `find_task`, holding a row lock until commit or rollback
    async fn lock_task(&mut self, id: Uuid) -> Result<Option<Task>, StoreError>;

    /// Tasks owned by `team_id`, oldest first
    async fn list_tasks_for_team(&mut self, team_id: Uuid) -> Result<Vec<Task>, StoreError>;

    /// Tasks that have `user_id` among their assignees, oldest first
    async fn list_tasks_for_assignee(&mut self, user_id: Uuid) -> Result<Vec<Task>, StoreError>;

    /// Inserts or replaces a task together with its assignee set
    async fn save_task(&mut self, task: &Task) -> Result<(), StoreError>;

    /// Returns false if no such task existed
    async fn delete_task(&mut self, id: Uuid) -> Result<bool, StoreError>;

    /// Publishes every change made through this transaction
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
