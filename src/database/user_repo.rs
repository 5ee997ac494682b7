use sqlx::SqlitePool;

use crate::models::UserRow;

const SQL_LOAD_USER: &str = r#"
SELECT id, name, email, role
FROM users
WHERE id = ?
LIMIT 1
"#;

pub async fn load_user(pool: &SqlitePool, user_id: i64) -> sqlx::Result<Option<UserRow>> {
    sqlx::query_as::<_, UserRow>(SQL_LOAD_USER)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}
