/// Task orchestration
///
/// Creation needs no team membership. A supplied team id must resolve,
/// otherwise the request is a `Conflict` (the caller pointed at something
/// that does not exist). Assignee ids that do not resolve to users are
/// dropped without error, both at creation and when an update replaces
/// the assignee set.
///
/// Status changes are unconstrained: any status can follow any other.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::access;
use crate::auth::authorization::Operation;
use crate::error::{ServiceError, ServiceResult};
use crate::models::task::{CreateTask, Priority, Task, TaskStatus, UpdateTask};
use crate::models::user::User;
use crate::store::{Store, StoreTx};

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn Store>,
}

/// Keeps only the ids that name existing users
async fn resolve_assignees<T>(tx: &mut T, task_id: Uuid, requested: &[Uuid]) -> ServiceResult<BTreeSet<Uuid>>
where
    T: StoreTx + ?Sized,
{
    let found: BTreeSet<Uuid> = tx
        .find_users(requested)
        .await?
        .into_iter()
        .map(|user| user.id)
        .collect();

    let skipped = requested.iter().filter(|id| !found.contains(id)).count();
    if skipped > 0 {
        debug!(task_id = %task_id, skipped, "Dropped unknown assignee ids");
    }

    Ok(found)
}

impl TaskService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Creates a task owned by `actor`, in TO_DO
    ///
    /// # Errors
    ///
    /// - `BadRequest` for an unknown priority
    /// - `Conflict` when `team_id` names no team
    pub async fn create(&self, actor: &User, input: CreateTask) -> ServiceResult<Task> {
        let priority = match input.priority.as_deref() {
            Some(raw) => raw.parse::<Priority>()?,
            None => Priority::default(),
        };

        let mut tx = self.store.begin().await?;

        if let Some(team_id) = input.team_id {
            if tx.find_team(team_id).await?.is_none() {
                return Err(ServiceError::Conflict(format!("Team {} does not exist", team_id)));
            }
        }

        let mut task = Task::new(
            input.title,
            input.description,
            input.due_date,
            priority,
            actor.id,
            input.team_id,
        );
        task.assignee_ids = resolve_assignees(&mut *tx, task.id, &input.assignee_ids).await?;

        tx.save_task(&task).await?;
        tx.commit().await?;

        info!(task_id = %task.id, creator_id = %actor.id, team_id = ?task.team_id, "Task created");
        Ok(task)
    }

    pub async fn get(&self, task_id: Uuid) -> ServiceResult<Task> {
        let mut tx = self.store.begin().await?;
        let loaded = access::load_task(&mut *tx, task_id).await?;

        Ok(loaded.task)
    }

    /// Tasks owned by a team; the team must exist
    pub async fn list_by_team(&self, team_id: Uuid) -> ServiceResult<Vec<Task>> {
        let mut tx = self.store.begin().await?;
        access::load_team(&mut *tx, team_id).await?;
        let tasks = tx.list_tasks_for_team(team_id).await?;

        Ok(tasks)
    }

    /// Tasks assigned to `user_id`; empty for an unknown user
    pub async fn list_by_assignee(&self, user_id: Uuid) -> ServiceResult<Vec<Task>> {
        let mut tx = self.store.begin().await?;
        let tasks = tx.list_tasks_for_assignee(user_id).await?;

        Ok(tasks)
    }

    /// Applies a partial update
    ///
    /// Permission is checked before the input is parsed, so an outsider
    /// sending garbage gets `Forbidden`, not `BadRequest`.
    pub async fn update(&self, actor: &User, task_id: Uuid, update: UpdateTask) -> ServiceResult<Task> {
        let mut tx = self.store.begin().await?;
        let mut task = access::authorize_task(&mut *tx, actor.id, &Operation::UpdateTask, task_id)
            .await?
            .task;

        let priority = update.priority.as_deref().map(str::parse::<Priority>).transpose()?;
        let status = update.status.as_deref().map(str::parse::<TaskStatus>).transpose()?;

        if let Some(title) = update.title {
            task.title = title;
        }
        if let Some(description) = update.description {
            task.description = Some(description);
        }
        if let Some(due_date) = update.due_date {
            task.due_date = Some(due_date);
        }
        if let Some(priority) = priority {
            task.priority = priority;
        }
        if let Some(status) = status {
            task.status = status;
        }
        if let Some(assignee_ids) = update.assignee_ids {
            task.assignee_ids = resolve_assignees(&mut *tx, task_id, &assignee_ids).await?;
        }

        tx.save_task(&task).await?;
        tx.commit().await?;

        info!(task_id = %task_id, actor_id = %actor.id, "Task updated");
        Ok(task)
    }

    pub async fn delete(&self, actor: &User, task_id: Uuid) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        access::authorize_task(&mut *tx, actor.id, &Operation::DeleteTask, task_id).await?;

        tx.delete_task(task_id).await?;
        tx.commit().await?;

        info!(task_id = %task_id, actor_id = %actor.id, "Task deleted");
        Ok(())
    }

    pub async fn assign(&self, actor: &User, task_id: Uuid, user_id: Uuid) -> ServiceResult<Task> {
        let operation = Operation::AssignUser { user_id };

        let mut tx = self.store.begin().await?;
        let mut task = access::authorize_task(&mut *tx, actor.id, &operation, task_id)
            .await?
            .task;

        if task.assignee_ids.insert(user_id) {
            tx.save_task(&task).await?;
            tx.commit().await?;
            info!(task_id = %task_id, user_id = %user_id, "User assigned");
        }

        Ok(task)
    }

    pub async fn unassign(&self, actor: &User, task_id: Uuid, user_id: Uuid) -> ServiceResult<Task> {
        let operation = Operation::UnassignUser { user_id };

        let mut tx = self.store.begin().await?;
        let mut task = access::authorize_task(&mut *tx, actor.id, &operation, task_id)
            .await?
            .task;

        if task.assignee_ids.remove(&user_id) {
            tx.save_task(&task).await?;
            tx.commit().await?;
            info!(task_id = %task_id, user_id = %user_id, "User unassigned");
        }

        Ok(task)
    }

    /// Sets the status; the string must name a known status
    pub async fn change_status(&self, actor: &User, task_id: Uuid, status: &str) -> ServiceResult<Task> {
        let mut tx = self.store.begin().await?;
        let mut task = access::authorize_task(&mut *tx, actor.id, &Operation::ChangeTaskStatus, task_id)
            .await?
            .task;

        task.status = status.parse::<TaskStatus>()?;
        tx.save_task(&task).await?;
        tx.commit().await?;

        info!(task_id = %task_id, status = %task.status, "Task status changed");
        Ok(task)
    }
}
