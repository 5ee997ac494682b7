use serde::Serialize;

pub const ROLE_PARTICIPANT: &str = "participant";
pub const ROLE_STAFF: &str = "staff";
pub const ROLE_ORGANIZER: &str = "organizer";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub role: String,
}

impl UserRow {
    pub fn is_staff(&self) -> bool {
        self.role == ROLE_STAFF || self.role == ROLE_ORGANIZER
    }
}
