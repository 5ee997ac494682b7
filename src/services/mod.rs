pub mod checkin_service;
pub mod lifecycle_service;
pub mod participation_service;
pub mod scheduler_service;
pub mod snapshot_service;
