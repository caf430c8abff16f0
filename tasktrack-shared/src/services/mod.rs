/// Mutation orchestrators
///
/// Each service method takes the acting user as an explicit argument and
/// runs in a single store transaction: load, authorize, mutate, persist.
/// Nothing is cached between calls.
///
/// - [`auth::AuthService`]: login, registration, token authentication
/// - [`users::UserService`]: the caller's own profile
/// - [`teams::TeamService`]: teams and membership
/// - [`tasks::TaskService`]: tasks, assignees, status

pub mod access;
pub mod auth;
pub mod tasks;
pub mod teams;
pub mod users;

pub use auth::AuthService;
pub use tasks::TaskService;
pub use teams::TeamService;
pub use users::UserService;
