/// Domain models for TaskTrack
///
/// Entities are plain snapshots. Relationships are carried as ids
/// (`admin_id`, `member_ids`, `creator_id`, `team_id`, `assignee_ids`) and are
/// resolved through explicit store lookups, never traversed implicitly.
///
/// # Models
///
/// - `user`: User accounts and global roles
/// - `team`: Teams with a single admin and a member set
/// - `task`: Tasks with priority, status, creator, optional team and assignees
///
/// # Example
///
/// ```
/// use tasktrack_shared::models::team::Team;
/// use uuid::Uuid;
///
/// let admin = Uuid::new_v4();
/// let team = Team::new("Alpha".to_string(), None, admin);
/// assert!(team.is_admin(admin));
/// assert!(team.is_member(admin));
/// ```

pub mod task;
pub mod team;
pub mod user;

/// Error returned when a string does not name a known enum variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind} value: {value}")]
pub struct UnknownVariant {
    /// Name of the enum being parsed (e.g. "priority")
    pub kind: &'static str,

    /// Rejected input
    pub value: String,
}
