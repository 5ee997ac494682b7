use axum::{
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use dotenvy::dotenv;
use serde_json::json;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use tower_http::catch_panic::CatchPanicLayer;

use checkin_backend::database::schema;
use checkin_backend::services::scheduler_service;
use checkin_backend::state::{AppState, LifecyclePolicy};
use checkin_backend::web::middleware::auth as auth_middleware;
use checkin_backend::web::routes::{checkin, events, participations, snapshots, tasks};

#[tokio::main]
async fn main() {
    dotenv().ok();

    // 1. Start logging
    tracing_subscriber::fmt::init();

    // 2. Connect to the database
    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in .env");
    println!("Connecting to database: {}", db_url);

    let options = SqliteConnectOptions::from_str(&db_url)
        .expect("DATABASE_URL is not a valid sqlite URL")
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .expect("Cannot connect to DB");
    schema::init_schema(&pool)
        .await
        .expect("Schema initialization failed");

    let state = AppState {
        pool: pool.clone(),
        policy: LifecyclePolicy::from_env(),
    };

    // 3. Background lifecycle scheduler
    scheduler_service::spawn(pool.clone());

    // 4. Protected routes under one middleware layer
    let protected_routes = Router::new()
        .route("/events/{event_id}", get(events::event_detail_handler))
        .route("/events/{event_id}/join", post(events::join_handler))
        .route(
            "/events/{event_id}/pre-register",
            post(events::pre_register_handler).delete(events::cancel_pre_registration_handler),
        )
        .route(
            "/events/{event_id}/pre-registration",
            get(events::pre_registration_status_handler),
        )
        .route(
            "/events/{event_id}/participations",
            get(events::event_participations_handler),
        )
        .route(
            "/events/{event_id}/checkin-stats",
            get(events::checkin_stats_handler),
        )
        .route(
            "/events/{event_id}/snapshots",
            get(snapshots::list_snapshots_handler).post(snapshots::create_snapshot_handler),
        )
        .route(
            "/snapshots/{snapshot_id}",
            delete(snapshots::delete_snapshot_handler),
        )
        .route(
            "/snapshots/{snapshot_id}/entries",
            get(snapshots::snapshot_entries_handler),
        )
        .route("/me/participations", get(participations::my_participations_handler))
        .route(
            "/participations/{participation_id}",
            get(participations::participation_detail_handler),
        )
        .route(
            "/participations/{participation_id}/cancel",
            post(participations::cancel_handler),
        )
        .route(
            "/participations/{participation_id}/complete",
            post(participations::complete_handler),
        )
        .route("/checkin", post(checkin::check_in_handler))
        .route("/tasks/run-unlock", post(tasks::run_unlock_handler))
        .route("/tasks/run-expire", post(tasks::run_expire_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::require_auth,
        ));

    // 5. Assemble the application
    let app = Router::new()
        // Public routes
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        // Protected routes
        .merge(protected_routes)
        // Layers
        .layer(CatchPanicLayer::new())
        // State
        .with_state(state);

    // 6. Start the server (with fallback port)
    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("Cannot parse host/port");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!(
                "Could not bind {}: {}. Trying fallback {}:{}",
                addr,
                e,
                host,
                port + 1
            );
            let fallback: SocketAddr = format!("{}:{}", host, port + 1)
                .parse()
                .expect("Cannot parse fallback address");
            tokio::net::TcpListener::bind(fallback)
                .await
                .expect("Cannot bind fallback port")
        }
    };

    let bound_addr = listener.local_addr().expect("Listener has no local addr");
    println!("Server running on http://{}", bound_addr);

    axum::serve(listener, app).await.expect("Server failed");
}
