/// In-memory store
///
/// All state sits behind one `tokio::sync::Mutex`. A transaction holds the
/// lock for its whole lifetime and works on a private copy of the state;
/// `commit` swaps the copy in, dropping the transaction throws it away.
/// Transactions are therefore fully serialised.
///
/// The same constraints as the PostgreSQL schema are enforced and reported
/// with the same constraint names.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{Store, StoreError, StoreTx};
use crate::models::{task::Task, team::Team, user::User};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    teams: HashMap<Uuid, Team>,
    tasks: HashMap<Uuid, Task>,
}

/// Store backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx + '_>, StoreError> {
        let guard = self.state.lock().await;
        let working = guard.clone();

        Ok(Box::new(MemoryTx { guard, working }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Transaction over a [`MemoryStore`]
pub struct MemoryTx<'a> {
    guard: MutexGuard<'a, MemoryState>,
    working: MemoryState,
}

impl MemoryTx<'_> {
    fn require_user(&self, id: Uuid, constraint: &str) -> Result<(), StoreError> {
        if self.working.users.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::ForeignKeyViolation(constraint.to_string()))
        }
    }

    fn check_unique(&self, user: &User) -> Result<(), StoreError> {
        for other in self.working.users.values().filter(|u| u.id != user.id) {
            if other.username == user.username {
                return Err(StoreError::UniqueViolation("users_username_key".to_string()));
            }
            if other.email == user.email {
                return Err(StoreError::UniqueViolation("users_email_key".to_string()));
            }
        }
        Ok(())
    }
}

fn oldest_first<T, F>(mut items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> (chrono::DateTime<chrono::Utc>, Uuid),
{
    items.sort_by_key(|item| key(item));
    items
}

#[async_trait]
impl StoreTx for MemoryTx<'_> {
    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.working.users.get(&id).cloned())
    }

    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .working
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.working.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_users(&mut self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.working.users.get(id).cloned())
            .collect())
    }

    async fn insert_user(&mut self, user: &User) -> Result<(), StoreError> {
        if self.working.users.contains_key(&user.id) {
            return Err(StoreError::UniqueViolation("users_pkey".to_string()));
        }
        self.check_unique(user)?;

        self.working.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user(&mut self, user: &User) -> Result<(), StoreError> {
        if !self.working.users.contains_key(&user.id) {
            return Ok(());
        }
        self.check_unique(user)?;

        self.working.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete_user(&mut self, id: Uuid) -> Result<bool, StoreError> {
        if !self.working.users.contains_key(&id) {
            return Ok(false);
        }
        if self.working.teams.values().any(|t| t.admin_id == id) {
            return Err(StoreError::ForeignKeyViolation("teams_admin_id_fkey".to_string()));
        }
        if self.working.tasks.values().any(|t| t.creator_id == id) {
            return Err(StoreError::ForeignKeyViolation("tasks_creator_id_fkey".to_string()));
        }

        for team in self.working.teams.values_mut() {
            team.member_ids.remove(&id);
        }
        for task in self.working.tasks.values_mut() {
            task.assignee_ids.remove(&id);
        }
        self.working.users.remove(&id);
        Ok(true)
    }

    async fn find_team(&mut self, id: Uuid) -> Result<Option<Team>, StoreError> {
        Ok(self.working.teams.get(&id).cloned())
    }

    // The transaction already holds the store-wide lock
    async fn lock_team(&mut self, id: Uuid) -> Result<Option<Team>, StoreError> {
        self.find_team(id).await
    }

    async fn list_teams_for_member(&mut self, user_id: Uuid) -> Result<Vec<Team>, StoreError> {
        let teams = self
            .working
            .teams
            .values()
            .filter(|t| t.is_member(user_id))
            .cloned()
            .collect();

        Ok(oldest_first(teams, |t: &Team| (t.created_at, t.id)))
    }

    async fn save_team(&mut self, team: &Team) -> Result<(), StoreError> {
        self.require_user(team.admin_id, "teams_admin_id_fkey")?;
        for member_id in &team.member_ids {
            self.require_user(*member_id, "team_members_user_id_fkey")?;
        }

        self.working.teams.insert(team.id, team.clone());
        Ok(())
    }

    async fn delete_team(&mut self, id: Uuid) -> Result<bool, StoreError> {
        if !self.working.teams.contains_key(&id) {
            return Ok(false);
        }
        if self.working.tasks.values().any(|t| t.team_id == Some(id)) {
            return Err(StoreError::ForeignKeyViolation("tasks_team_id_fkey".to_string()));
        }

        self.working.teams.remove(&id);
        Ok(true)
    }

    async fn find_task(&mut self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(self.working.tasks.get(&id).cloned())
    }

    async fn lock_task(&mut self, id: Uuid) -> Result<Option<Task>, StoreError> {
        self.find_task(id).await
    }

    async fn list_tasks_for_team(&mut self, team_id: Uuid) -> Result<Vec<Task>, StoreError> {
        let tasks = self
            .working
            .tasks
            .values()
            .filter(|t| t.team_id == Some(team_id))
            .cloned()
            .collect();

        Ok(oldest_first(tasks, |t: &Task| (t.created_at, t.id)))
    }

    async fn list_tasks_for_assignee(&mut self, user_id: Uuid) -> Result<Vec<Task>, StoreError> {
        let tasks = self
            .working
            .tasks
            .values()
            .filter(|t| t.is_assignee(user_id))
            .cloned()
            .collect();

        Ok(oldest_first(tasks, |t: &Task| (t.created_at, t.id)))
    }

    async fn save_task(&mut self, task: &Task) -> Result<(), StoreError> {
        self.require_user(task.creator_id, "tasks_creator_id_fkey")?;
        if let Some(team_id) = task.team_id {
            if !self.working.teams.contains_key(&team_id) {
                return Err(StoreError::ForeignKeyViolation("tasks_team_id_fkey".to_string()));
            }
        }
        for assignee_id in &task.assignee_ids {
            self.require_user(*assignee_id, "task_assignees_user_id_fkey")?;
        }

        self.working.tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn delete_task(&mut self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.working.tasks.remove(&id).is_some())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
