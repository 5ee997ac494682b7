pub mod checkin;
pub mod events;
pub mod participations;
pub mod snapshots;
pub mod tasks;
