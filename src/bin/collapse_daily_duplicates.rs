use dotenvy::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::env;
use std::str::FromStr;

use checkin_backend::database::schema;

/// One-off maintenance run for databases written before the per-day unique
/// index existed: collapses duplicate (user, event, day) rows keeping the
/// newest, then creates the index so new duplicates are rejected outright.
#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in .env");
    let options = SqliteConnectOptions::from_str(&db_url)
        .expect("DATABASE_URL is not a valid sqlite URL")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .expect("Cannot connect to DB");

    match schema::ensure_daily_unique_index(&pool).await {
        Ok(removed) => {
            println!("daily dedupe: removed={removed}, unique index in place");
        }
        Err(e) => {
            eprintln!("daily dedupe failed: {}", e);
            std::process::exit(1);
        }
    }
}
