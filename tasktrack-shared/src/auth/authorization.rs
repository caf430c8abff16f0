/// Permission engine
///
/// Pure decision functions answering "can actor X perform operation O on
/// entity E". Nothing here touches the store: callers load snapshots first
/// (entity-not-found is reported before any rule runs) and pass them in.
///
/// # Rules
///
/// | Operation                | Allowed if actor is                                   |
/// |--------------------------|-------------------------------------------------------|
/// | Update task              | creator, team admin, or an assignee                   |
/// | Delete task              | creator or team admin                                 |
/// | Assign user to task      | team admin or creator                                 |
/// | Unassign user from task  | team admin, creator, or the user being unassigned     |
/// | Change task status       | creator, team admin, or an assignee                   |
/// | Update / delete team     | team admin                                            |
/// | Add team member          | team admin                                            |
/// | Remove team member       | team admin or the member themself; never the admin    |
/// | Read task / team         | anyone authenticated                                  |
///
/// A task without a team never satisfies a "team admin" clause.
///
/// Every denial is the same [`AuthzError::Forbidden`], whichever clause failed.
///
/// # Example
///
/// ```
/// use tasktrack_shared::auth::authorization::{require, Operation, Target};
/// use tasktrack_shared::models::team::Team;
/// use uuid::Uuid;
///
/// let admin = Uuid::new_v4();
/// let outsider = Uuid::new_v4();
/// let team = Team::new("Alpha".to_string(), None, admin);
///
/// assert!(require(admin, &Operation::UpdateTeam, Target::Team(&team)).is_ok());
/// assert!(require(outsider, &Operation::UpdateTeam, Target::Team(&team)).is_err());
/// ```

use std::collections::BTreeSet;
use uuid::Uuid;

use crate::models::task::Task;
use crate::models::team::Team;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Actor is authenticated but not entitled to the operation
    #[error("Not authorized to perform this operation")]
    Forbidden,
}

/// Operations subject to a permission decision
///
/// Variants that name a second user carry its id so that the user can be
/// resolved (and reported missing) before the decision is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ReadTask,
    UpdateTask,
    DeleteTask,
    ChangeTaskStatus,
    AssignUser { user_id: Uuid },
    UnassignUser { user_id: Uuid },
    ReadTeam,
    UpdateTeam,
    DeleteTeam,
    AddMember { user_id: Uuid },
    RemoveMember { user_id: Uuid },
}

/// Kind of entity an operation applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Task,
    Team,
}

impl Operation {
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            Operation::ReadTask
            | Operation::UpdateTask
            | Operation::DeleteTask
            | Operation::ChangeTaskStatus
            | Operation::AssignUser { .. }
            | Operation::UnassignUser { .. } => EntityKind::Task,
            Operation::ReadTeam
            | Operation::UpdateTeam
            | Operation::DeleteTeam
            | Operation::AddMember { .. }
            | Operation::RemoveMember { .. } => EntityKind::Team,
        }
    }

    /// Second user named by the operation, if any
    pub fn subject_user(&self) -> Option<Uuid> {
        match *self {
            Operation::AssignUser { user_id }
            | Operation::UnassignUser { user_id }
            | Operation::AddMember { user_id }
            | Operation::RemoveMember { user_id } => Some(user_id),
            _ => None,
        }
    }
}

/// The relationships of a task that matter for permission decisions
#[derive(Debug, Clone, Copy)]
pub struct TaskRelations<'a> {
    pub creator_id: Uuid,

    /// Admin of the owning team; `None` when the task has no team
    pub team_admin_id: Option<Uuid>,

    pub assignee_ids: &'a BTreeSet<Uuid>,
}

impl<'a> TaskRelations<'a> {
    /// Collects the relations of `task`
    ///
    /// `team` is only consulted when it is the task's own team.
    pub fn of(task: &'a Task, team: Option<&Team>) -> Self {
        let team_admin_id = team
            .filter(|team| task.team_id == Some(team.id))
            .map(|team| team.admin_id);

        Self {
            creator_id: task.creator_id,
            team_admin_id,
            assignee_ids: &task.assignee_ids,
        }
    }

    fn is_creator(&self, actor: Uuid) -> bool {
        self.creator_id == actor
    }

    fn is_team_admin(&self, actor: Uuid) -> bool {
        self.team_admin_id == Some(actor)
    }

    fn is_assignee(&self, actor: Uuid) -> bool {
        self.assignee_ids.contains(&actor)
    }
}

/// Entity an operation is evaluated against
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Task(TaskRelations<'a>),
    Team(&'a Team),
}

pub fn can_update_task(actor: Uuid, task: &TaskRelations<'_>) -> bool {
    task.is_creator(actor) || task.is_team_admin(actor) || task.is_assignee(actor)
}

pub fn can_delete_task(actor: Uuid, task: &TaskRelations<'_>) -> bool {
    task.is_creator(actor) || task.is_team_admin(actor)
}

pub fn can_assign_user(actor: Uuid, task: &TaskRelations<'_>) -> bool {
    task.is_team_admin(actor) || task.is_creator(actor)
}

pub fn can_unassign_user(actor: Uuid, task: &TaskRelations<'_>, user_id: Uuid) -> bool {
    task.is_team_admin(actor) || task.is_creator(actor) || actor == user_id
}

pub fn can_change_task_status(actor: Uuid, task: &TaskRelations<'_>) -> bool {
    task.is_creator(actor) || task.is_team_admin(actor) || task.is_assignee(actor)
}

pub fn can_update_team(actor: Uuid, team: &Team) -> bool {
    team.is_admin(actor)
}

pub fn can_delete_team(actor: Uuid, team: &Team) -> bool {
    team.is_admin(actor)
}

pub fn can_add_member(actor: Uuid, team: &Team) -> bool {
    team.is_admin(actor)
}

/// The admin can never be removed, not even by themself
pub fn can_remove_member(actor: Uuid, team: &Team, member_id: Uuid) -> bool {
    if team.is_admin(member_id) {
        return false;
    }
    team.is_admin(actor) || actor == member_id
}

/// Evaluates `operation` for `actor` against `target`
///
/// An operation paired with the wrong kind of target is denied.
pub fn evaluate(actor: Uuid, operation: &Operation, target: Target<'_>) -> bool {
    match (operation, target) {
        (Operation::ReadTask, Target::Task(_)) => true,
        (Operation::UpdateTask, Target::Task(task)) => can_update_task(actor, &task),
        (Operation::DeleteTask, Target::Task(task)) => can_delete_task(actor, &task),
        (Operation::ChangeTaskStatus, Target::Task(task)) => can_change_task_status(actor, &task),
        (Operation::AssignUser { .. }, Target::Task(task)) => can_assign_user(actor, &task),
        (Operation::UnassignUser { user_id }, Target::Task(task)) => {
            can_unassign_user(actor, &task, *user_id)
        }
        (Operation::ReadTeam, Target::Team(_)) => true,
        (Operation::UpdateTeam, Target::Team(team)) => can_update_team(actor, team),
        (Operation::DeleteTeam, Target::Team(team)) => can_delete_team(actor, team),
        (Operation::AddMember { .. }, Target::Team(team)) => can_add_member(actor, team),
        (Operation::RemoveMember { user_id }, Target::Team(team)) => {
            can_remove_member(actor, team, *user_id)
        }
        _ => false,
    }
}

/// Like [`evaluate`], returning `Forbidden` on denial
pub fn require(actor: Uuid, operation: &Operation, target: Target<'_>) -> Result<(), AuthzError> {
    if evaluate(actor, operation, target) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden)
    }
}
