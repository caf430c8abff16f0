/// Entity loading and permission checks shared by the orchestrators
///
/// Order is always: load the entity (and, for tasks, its team), load any
/// user the operation names, then run the permission engine. A missing
/// entity is reported as `NotFound` before any rule is evaluated.
///
/// `load_*` are plain reads for queries. The `authorize_*` paths lock the
/// entity row, since every authorized operation goes on to modify it.

use uuid::Uuid;

use crate::auth::authorization::{self, EntityKind, Operation, Target, TaskRelations};
use crate::error::{ServiceError, ServiceResult};
use crate::models::{task::Task, team::Team, user::User};
use crate::store::StoreTx;

/// A task together with its owning team, if any
#[derive(Debug, Clone)]
pub struct TaskAccess {
    pub task: Task,
    pub team: Option<Team>,
}

impl TaskAccess {
    pub fn relations(&self) -> TaskRelations<'_> {
        TaskRelations::of(&self.task, self.team.as_ref())
    }
}

/// Entity an authorized operation applies to
#[derive(Debug, Clone)]
pub enum Authorized {
    Task(TaskAccess),
    Team(Team),
}

pub async fn load_user<T>(tx: &mut T, id: Uuid) -> ServiceResult<User>
where
    T: StoreTx + ?Sized,
{
    tx.find_user(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User"))
}

pub async fn load_team<T>(tx: &mut T, id: Uuid) -> ServiceResult<Team>
where
    T: StoreTx + ?Sized,
{
    tx.find_team(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Team"))
}

pub async fn load_task<T>(tx: &mut T, id: Uuid) -> ServiceResult<TaskAccess>
where
    T: StoreTx + ?Sized,
{
    let task = tx
        .find_task(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Task"))?;

    let team = match task.team_id {
        Some(team_id) => tx.find_team(team_id).await?,
        None => None,
    };

    Ok(TaskAccess { task, team })
}

/// `load_team` for a mutation: the row stays locked until the transaction ends
async fn lock_team<T>(tx: &mut T, id: Uuid) -> ServiceResult<Team>
where
    T: StoreTx + ?Sized,
{
    tx.lock_team(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Team"))
}

/// `load_task` for a mutation; only the task row is locked
async fn lock_task<T>(tx: &mut T, id: Uuid) -> ServiceResult<TaskAccess>
where
    T: StoreTx + ?Sized,
{
    let task = tx
        .lock_task(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Task"))?;

    let team = match task.team_id {
        Some(team_id) => tx.find_team(team_id).await?,
        None => None,
    };

    Ok(TaskAccess { task, team })
}

async fn load_subject_user<T>(tx: &mut T, operation: &Operation) -> ServiceResult<()>
where
    T: StoreTx + ?Sized,
{
    if let Some(user_id) = operation.subject_user() {
        load_user(tx, user_id).await?;
    }
    Ok(())
}

fn check(actor_id: Uuid, operation: &Operation, entity_id: Uuid, target: Target<'_>) -> ServiceResult<()> {
    authorization::require(actor_id, operation, target).map_err(|e| {
        tracing::warn!(
            actor_id = %actor_id,
            entity_id = %entity_id,
            operation = ?operation,
            "Operation denied"
        );
        ServiceError::from(e)
    })
}

/// Loads a task and checks `operation` against it
pub async fn authorize_task<T>(
    tx: &mut T,
    actor_id: Uuid,
    operation: &Operation,
    task_id: Uuid,
) -> ServiceResult<TaskAccess>
where
    T: StoreTx + ?Sized,
{
    let access = lock_task(tx, task_id).await?;
    load_subject_user(tx, operation).await?;
    check(actor_id, operation, task_id, Target::Task(access.relations()))?;

    Ok(access)
}

/// Loads a team and checks `operation` against it
pub async fn authorize_team<T>(
    tx: &mut T,
    actor_id: Uuid,
    operation: &Operation,
    team_id: Uuid,
) -> ServiceResult<Team>
where
    T: StoreTx + ?Sized,
{
    let team = lock_team(tx, team_id).await?;
    load_subject_user(tx, operation).await?;
    check(actor_id, operation, team_id, Target::Team(&team))?;

    Ok(team)
}

/// Checks `operation` on whichever entity kind it applies to
pub async fn authorize<T>(
    tx: &mut T,
    actor_id: Uuid,
    operation: &Operation,
    entity_id: Uuid,
) -> ServiceResult<Authorized>
where
    T: StoreTx + ?Sized,
{
    match operation.entity_kind() {
        EntityKind::Task => authorize_task(tx, actor_id, operation, entity_id)
            .await
            .map(Authorized::Task),
        EntityKind::Team => authorize_team(tx, actor_id, operation, entity_id)
            .await
            .map(Authorized::Team),
    }
}
