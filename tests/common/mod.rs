#![allow(dead_code)]

use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

use checkin_backend::database::schema;

/// Fresh in-memory database with the full schema. A single connection keeps
/// `:memory:` stable across queries.
pub async fn setup_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    schema::init_schema(&pool).await.unwrap();
    pool
}

pub async fn insert_user(pool: &SqlitePool, name: &str, role: &str) -> i64 {
    sqlx::query("INSERT INTO users (name, email, role) VALUES (?, ?, ?)")
        .bind(name)
        .bind(format!("{}@example.test", name.to_lowercase()))
        .bind(role)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
}

pub async fn insert_single_day_event(
    pool: &SqlitePool,
    title: &str,
    date: NaiveDate,
    max_participants: Option<i64>,
) -> i64 {
    sqlx::query(
        r#"
INSERT INTO events (title, event_type, event_date, max_participants, is_active, is_published)
VALUES (?, 'single_day', ?, ?, 1, 1)
"#,
    )
    .bind(title)
    .bind(date)
    .bind(max_participants)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}

pub async fn insert_multi_day_event(
    pool: &SqlitePool,
    title: &str,
    start: NaiveDate,
    end: NaiveDate,
    max_checkins_per_user: Option<i64>,
) -> i64 {
    sqlx::query(
        r#"
INSERT INTO events (title, event_type, event_date, event_end_date, max_checkins_per_user, is_active, is_published)
VALUES (?, 'multi_day', ?, ?, ?, 1, 1)
"#,
    )
    .bind(title)
    .bind(start)
    .bind(end)
    .bind(max_checkins_per_user)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}

pub fn day(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

pub fn at(s: &str) -> chrono::DateTime<chrono::Utc> {
    s.parse().unwrap()
}
