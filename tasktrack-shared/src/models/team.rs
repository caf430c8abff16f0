/// Team model
///
/// A team has exactly one admin and a set of members. The admin is always a
/// member; member removal never removes the admin.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE teams (
///     id UUID PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     admin_id UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE team_members (
///     team_id UUID NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     PRIMARY KEY (team_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Team snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,

    /// The single privileged member
    pub admin_id: Uuid,

    /// Member ids; always contains `admin_id`
    pub member_ids: BTreeSet<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a team
#[derive(Debug, Clone, Default)]
pub struct CreateTeam {
    pub name: String,
    pub description: Option<String>,
}

/// Partial team update; only `Some` fields are applied
#[derive(Debug, Clone, Default)]
pub struct UpdateTeam {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Team {
    /// Creates a team whose creator is both admin and sole initial member
    pub fn new(name: String, description: Option<String>, admin_id: Uuid) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            name,
            description,
            admin_id,
            member_ids: BTreeSet::from([admin_id]),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self, user_id: Uuid) -> bool {
        self.admin_id == user_id
    }

    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.member_ids.contains(&user_id)
    }

    /// Applies a partial update and bumps `updated_at`
    pub fn apply(&mut self, update: UpdateTeam) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        self.touch();
    }

    /// Adds a member. Returns false if the user was already a member.
    pub fn add_member(&mut self, user_id: Uuid) -> bool {
        let added = self.member_ids.insert(user_id);
        if added {
            self.touch();
        }
        added
    }

    /// Removes a member. The admin is never removed.
    pub fn remove_member(&mut self, user_id: Uuid) -> bool {
        if self.is_admin(user_id) {
            return false;
        }
        let removed = self.member_ids.remove(&user_id);
        if removed {
            self.touch();
        }
        removed
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
