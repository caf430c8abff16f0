/// Task model
///
/// Tasks are created by any authenticated user, optionally inside a team.
/// Status transitions are unconstrained: any status is reachable from any
/// other, only the spelling is validated.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     due_date DATE,
///     priority VARCHAR(16) NOT NULL DEFAULT 'MEDIUM',
///     status VARCHAR(16) NOT NULL DEFAULT 'TO_DO',
///     creator_id UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
///     team_id UUID REFERENCES teams(id) ON DELETE RESTRICT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE task_assignees (
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     PRIMARY KEY (task_id, user_id)
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::UnknownVariant;

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        }
    }
}

impl FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Priority::Low),
            "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            other => Err(UnknownVariant {
                kind: "priority",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    ToDo,
    InProgress,
    Blocked,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "TO_DO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Blocked => "BLOCKED",
            TaskStatus::Done => "DONE",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TO_DO" => Ok(TaskStatus::ToDo),
            "IN_PROGRESS" => Ok(TaskStatus::InProgress),
            "BLOCKED" => Ok(TaskStatus::Blocked),
            "DONE" => Ok(TaskStatus::Done),
            other => Err(UnknownVariant {
                kind: "status",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub status: TaskStatus,

    /// Set at creation, never changes
    pub creator_id: Uuid,

    /// Owning team, if any
    pub team_id: Option<Uuid>,

    pub assignee_ids: BTreeSet<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a task
///
/// Enum fields arrive as raw strings so that unknown values surface as a
/// `BadRequest` from the service layer.
#[derive(Debug, Clone, Default)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,

    /// Defaults to MEDIUM
    pub priority: Option<String>,

    /// Must name an existing team
    pub team_id: Option<Uuid>,

    /// Ids that do not resolve to a user are dropped
    pub assignee_ids: Vec<Uuid>,
}

/// Partial task update; only `Some` fields are applied
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<String>,
    pub status: Option<String>,

    /// Replaces the whole assignee set when present
    pub assignee_ids: Option<Vec<Uuid>>,
}

impl Task {
    /// Builds a task in TO_DO with the given creator
    pub fn new(
        title: String,
        description: Option<String>,
        due_date: Option<NaiveDate>,
        priority: Priority,
        creator_id: Uuid,
        team_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            due_date,
            priority,
            status: TaskStatus::default(),
            creator_id,
            team_id,
            assignee_ids: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }

    pub fn is_creator(&self, user_id: Uuid) -> bool {
        self.creator_id == user_id
    }

    pub fn is_assignee(&self, user_id: Uuid) -> bool {
        self.assignee_ids.contains(&user_id)
    }
}
