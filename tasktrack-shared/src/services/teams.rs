/// Team orchestration
///
/// Mutations run as one transaction: load, authorize, mutate, save, commit.

use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::access;
use crate::auth::authorization::Operation;
use crate::error::ServiceResult;
use crate::models::team::{CreateTeam, Team, UpdateTeam};
use crate::models::user::User;
use crate::store::Store;

#[derive(Clone)]
pub struct TeamService {
    store: Arc<dyn Store>,
}

impl TeamService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Creates a team with `actor` as admin and sole member
    pub async fn create(&self, actor: &User, input: CreateTeam) -> ServiceResult<Team> {
        let team = Team::new(input.name, input.description, actor.id);

        let mut tx = self.store.begin().await?;
        tx.save_team(&team).await?;
        tx.commit().await?;

        info!(team_id = %team.id, admin_id = %actor.id, "Team created");
        Ok(team)
    }

    pub async fn get(&self, team_id: Uuid) -> ServiceResult<Team> {
        let mut tx = self.store.begin().await?;
        let team = access::load_team(&mut *tx, team_id).await?;

        Ok(team)
    }

    /// Teams `user_id` belongs to; the user must exist
    pub async fn list_for_user(&self, user_id: Uuid) -> ServiceResult<Vec<Team>> {
        let mut tx = self.store.begin().await?;
        access::load_user(&mut *tx, user_id).await?;
        let teams = tx.list_teams_for_member(user_id).await?;

        debug!(user_id = %user_id, count = teams.len(), "Listed teams for user");
        Ok(teams)
    }

    /// Member snapshots, ordered by username
    pub async fn list_members(&self, team_id: Uuid) -> ServiceResult<Vec<User>> {
        let mut tx = self.store.begin().await?;
        let team = access::load_team(&mut *tx, team_id).await?;

        let ids: Vec<Uuid> = team.member_ids.iter().copied().collect();
        let mut members = tx.find_users(&ids).await?;
        members.sort_by(|a, b| a.username.cmp(&b.username));

        Ok(members)
    }

    pub async fn update(&self, actor: &User, team_id: Uuid, update: UpdateTeam) -> ServiceResult<Team> {
        let mut tx = self.store.begin().await?;
        let mut team = access::authorize_team(&mut *tx, actor.id, &Operation::UpdateTeam, team_id).await?;

        team.apply(update);
        tx.save_team(&team).await?;
        tx.commit().await?;

        info!(team_id = %team_id, actor_id = %actor.id, "Team updated");
        Ok(team)
    }

    /// Deletes a team; fails with `Conflict` while tasks still reference it
    pub async fn delete(&self, actor: &User, team_id: Uuid) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        access::authorize_team(&mut *tx, actor.id, &Operation::DeleteTeam, team_id).await?;

        tx.delete_team(team_id).await?;
        tx.commit().await?;

        info!(team_id = %team_id, actor_id = %actor.id, "Team deleted");
        Ok(())
    }

    pub async fn add_member(&self, actor: &User, team_id: Uuid, user_id: Uuid) -> ServiceResult<Team> {
        let operation = Operation::AddMember { user_id };

        let mut tx = self.store.begin().await?;
        let mut team = access::authorize_team(&mut *tx, actor.id, &operation, team_id).await?;

        if team.add_member(user_id) {
            tx.save_team(&team).await?;
            tx.commit().await?;
            info!(team_id = %team_id, user_id = %user_id, "Member added");
        }

        Ok(team)
    }

    /// Removes a member; the admin can never be removed
    pub async fn remove_member(&self, actor: &User, team_id: Uuid, user_id: Uuid) -> ServiceResult<Team> {
        let operation = Operation::RemoveMember { user_id };

        let mut tx = self.store.begin().await?;
        let mut team = access::authorize_team(&mut *tx, actor.id, &operation, team_id).await?;

        if team.remove_member(user_id) {
            tx.save_team(&team).await?;
            tx.commit().await?;
            info!(team_id = %team_id, user_id = %user_id, "Member removed");
        }

        Ok(team)
    }
}
