/// PostgreSQL store
///
/// Each [`PgTx`] wraps one `sqlx::Transaction`. Plain finds are ordinary
/// reads; `lock_team` / `lock_task` take `FOR UPDATE` row locks so concurrent
/// read-modify-write cycles on member and assignee sets serialise on the row.
/// Join tables are rewritten on every save.
///
/// Constraint names from the schema are passed through in
/// [`StoreError::UniqueViolation`] / [`StoreError::ForeignKeyViolation`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{postgres::PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{Store, StoreError, StoreTx};
use crate::models::{
    task::{Task, TaskStatus, Priority},
    team::Team,
    user::User,
};

const USER_COLUMNS: &str =
    "id, username, email, display_name, password_hash, roles, created_at, updated_at";

const TEAM_SELECT: &str = "SELECT t.id, t.name, t.description, t.admin_id, \
     ARRAY(SELECT m.user_id FROM team_members m WHERE m.team_id = t.id) AS member_ids, \
     t.created_at, t.updated_at \
     FROM teams t";

const TASK_SELECT: &str = "SELECT t.id, t.title, t.description, t.due_date, t.priority, t.status, \
     t.creator_id, t.team_id, \
     ARRAY(SELECT a.user_id FROM task_assignees a WHERE a.task_id = t.id) AS assignee_ids, \
     t.created_at \
     FROM tasks t";

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx + '_>, StoreError> {
        let tx = self.pool.begin().await.map_err(map_db_error)?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::db::pool::health_check(&self.pool)
            .await
            .map_err(StoreError::from)
    }
}

/// Transaction over a [`PgStore`]
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[derive(sqlx::FromRow)]
struct TeamRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    admin_id: Uuid,
    member_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TeamRow> for Team {
    fn from(row: TeamRow) -> Self {
        Team {
            id: row.id,
            name: row.name,
            description: row.description,
            admin_id: row.admin_id,
            member_ids: row.member_ids.into_iter().collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    due_date: Option<NaiveDate>,
    priority: String,
    status: String,
    creator_id: Uuid,
    team_id: Option<Uuid>,
    assignee_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = StoreError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let priority: Priority = row
            .priority
            .parse()
            .map_err(|e| StoreError::Decode(format!("task {}: {}", row.id, e)))?;
        let status: TaskStatus = row
            .status
            .parse()
            .map_err(|e| StoreError::Decode(format!("task {}: {}", row.id, e)))?;

        Ok(Task {
            id: row.id,
            title: row.title,
            description: row.description,
            due_date: row.due_date,
            priority,
            status,
            creator_id: row.creator_id,
            team_id: row.team_id,
            assignee_ids: row.assignee_ids.into_iter().collect(),
            created_at: row.created_at,
        })
    }
}

fn map_db_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let constraint = db_err.constraint().unwrap_or("unknown").to_string();

        if db_err.is_unique_violation() {
            return StoreError::UniqueViolation(constraint);
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::ForeignKeyViolation(constraint);
        }
    }

    StoreError::Database(err)
}

fn into_tasks(rows: Vec<TaskRow>) -> Result<Vec<Task>, StoreError> {
    rows.into_iter().map(Task::try_from).collect()
}

#[async_trait]
impl StoreTx for PgTx {
    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error)
    }

    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_error)
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS))
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error)
    }

    async fn find_users(&mut self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ANY($1)",
            USER_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_db_error)
    }

    async fn insert_user(&mut self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (id, username, email, display_name, password_hash, roles, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(&user.roles)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn update_user(&mut self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE users
             SET username = $2, email = $3, display_name = $4, password_hash = $5,
                 roles = $6, updated_at = $7
             WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(&user.roles)
        .bind(user.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn delete_user(&mut self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_team(&mut self, id: Uuid) -> Result<Option<Team>, StoreError> {
        let row = sqlx::query_as::<_, TeamRow>(&format!("{} WHERE t.id = $1", TEAM_SELECT))
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        Ok(row.map(Team::from))
    }

    async fn lock_team(&mut self, id: Uuid) -> Result<Option<Team>, StoreError> {
        let row = sqlx::query_as::<_, TeamRow>(&format!(
            "{} WHERE t.id = $1 FOR UPDATE OF t",
            TEAM_SELECT
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Ok(row.map(Team::from))
    }

    async fn list_teams_for_member(&mut self, user_id: Uuid) -> Result<Vec<Team>, StoreError> {
        let rows = sqlx::query_as::<_, TeamRow>(&format!(
            "{} WHERE EXISTS (
                 SELECT 1 FROM team_members m WHERE m.team_id = t.id AND m.user_id = $1
             )
             ORDER BY t.created_at, t.id",
            TEAM_SELECT
        ))
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(Team::from).collect())
    }

    async fn save_team(&mut self, team: &Team) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO teams (id, name, description, admin_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (id) DO UPDATE
             SET name = EXCLUDED.name,
                 description = EXCLUDED.description,
                 admin_id = EXCLUDED.admin_id,
                 updated_at = EXCLUDED.updated_at",
        )
        .bind(team.id)
        .bind(&team.name)
        .bind(&team.description)
        .bind(team.admin_id)
        .bind(team.created_at)
        .bind(team.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        let member_ids: Vec<Uuid> = team.member_ids.iter().copied().collect();

        sqlx::query("DELETE FROM team_members WHERE team_id = $1 AND NOT (user_id = ANY($2))")
            .bind(team.id)
            .bind(&member_ids)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        sqlx::query(
            "INSERT INTO team_members (team_id, user_id)
             SELECT $1, UNNEST($2::uuid[])
             ON CONFLICT DO NOTHING",
        )
        .bind(team.id)
        .bind(&member_ids)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn delete_team(&mut self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_task(&mut self, id: Uuid) -> Result<Option<Task>, StoreError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!("{} WHERE t.id = $1", TASK_SELECT))
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        row.map(Task::try_from).transpose()
    }

    async fn lock_task(&mut self, id: Uuid) -> Result<Option<Task>, StoreError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "{} WHERE t.id = $1 FOR UPDATE OF t",
            TASK_SELECT
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        row.map(Task::try_from).transpose()
    }

    async fn list_tasks_for_team(&mut self, team_id: Uuid) -> Result<Vec<Task>, StoreError> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "{} WHERE t.team_id = $1 ORDER BY t.created_at, t.id",
            TASK_SELECT
        ))
        .bind(team_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        into_tasks(rows)
    }

    async fn list_tasks_for_assignee(&mut self, user_id: Uuid) -> Result<Vec<Task>, StoreError> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "{} WHERE EXISTS (
                 SELECT 1 FROM task_assignees a WHERE a.task_id = t.id AND a.user_id = $1
             )
             ORDER BY t.created_at, t.id",
            TASK_SELECT
        ))
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        into_tasks(rows)
    }

    async fn save_task(&mut self, task: &Task) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO tasks (id, title, description, due_date, priority, status, creator_id, team_id, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (id) DO UPDATE
             SET title = EXCLUDED.title,
                 description = EXCLUDED.description,
                 due_date = EXCLUDED.due_date,
                 priority = EXCLUDED.priority,
                 status = EXCLUDED.status,
                 team_id = EXCLUDED.team_id",
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(task.priority.as_str())
        .bind(task.status.as_str())
        .bind(task.creator_id)
        .bind(task.team_id)
        .bind(task.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        let assignee_ids: Vec<Uuid> = task.assignee_ids.iter().copied().collect();

        sqlx::query("DELETE FROM task_assignees WHERE task_id = $1 AND NOT (user_id = ANY($2))")
            .bind(task.id)
            .bind(&assignee_ids)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        sqlx::query(
            "INSERT INTO task_assignees (task_id, user_id)
             SELECT $1, UNNEST($2::uuid[])
             ON CONFLICT DO NOTHING",
        )
        .bind(task.id)
        .bind(&assignee_ids)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn delete_task(&mut self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(map_db_error)
    }
}
