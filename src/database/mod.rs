pub mod event_repo;
pub mod participation_repo;
pub mod schema;
pub mod snapshot_repo;
pub mod user_repo;
