pub mod events;
pub mod participations;
pub mod snapshots;
pub mod users;

pub use events::EventRow;
pub use participations::{ParticipationRow, ParticipationStatus, RosterRow};
pub use snapshots::{SnapshotEntryRow, SnapshotRow};
pub use users::UserRow;
