mod common;

use checkin_backend::database::participation_repo;
use checkin_backend::error::AppError;
use checkin_backend::models::users::{ROLE_PARTICIPANT, ROLE_STAFF};
use checkin_backend::services::{checkin_service, lifecycle_service, participation_service};
use checkin_backend::state::LifecyclePolicy;
use common::*;

#[tokio::test]
async fn pre_register_issues_code_for_the_first_day() {
    let pool = setup_pool().await;
    let user = insert_user(&pool, "Alice", ROLE_PARTICIPANT).await;
    let event = insert_multi_day_event(&pool, "Conference", day("2026-06-01"), day("2026-06-03"), None).await;

    let row = participation_service::pre_register(&pool, user, event, at("2026-05-28T10:00:00Z"))
        .await
        .unwrap();

    assert_eq!(row.pre_registered, 1);
    assert_eq!(row.status, "joined");
    assert_eq!(row.checkin_date, Some(day("2026-06-01")));
    assert_eq!(
        row.code_expires_at.unwrap(),
        at("2026-06-01T23:59:59Z")
    );
}

#[tokio::test]
async fn pre_register_mid_event_starts_today() {
    let pool = setup_pool().await;
    let user = insert_user(&pool, "Alice", ROLE_PARTICIPANT).await;
    let event = insert_multi_day_event(&pool, "Conference", day("2026-06-01"), day("2026-06-03"), None).await;

    let row = participation_service::pre_register(&pool, user, event, at("2026-06-02T10:00:00Z"))
        .await
        .unwrap();
    assert_eq!(row.checkin_date, Some(day("2026-06-02")));
}

#[tokio::test]
async fn pre_register_rejects_single_day_events_and_duplicates() {
    let pool = setup_pool().await;
    let user = insert_user(&pool, "Alice", ROLE_PARTICIPANT).await;
    let single = insert_single_day_event(&pool, "Workshop", day("2026-06-01"), None).await;
    let multi = insert_multi_day_event(&pool, "Conference", day("2026-06-01"), day("2026-06-03"), None).await;
    let now = at("2026-05-28T10:00:00Z");

    let err = participation_service::pre_register(&pool, user, single, now)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotMultiDayEvent));

    participation_service::pre_register(&pool, user, multi, now)
        .await
        .unwrap();
    let err = participation_service::pre_register(&pool, user, multi, now)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyPreRegistered));
}

#[tokio::test]
async fn unlock_pass_mints_once_per_user_per_day() {
    let pool = setup_pool().await;
    let alice = insert_user(&pool, "Alice", ROLE_PARTICIPANT).await;
    let bob = insert_user(&pool, "Bob", ROLE_PARTICIPANT).await;
    let event = insert_multi_day_event(&pool, "Conference", day("2026-06-01"), day("2026-06-03"), None).await;

    participation_service::pre_register(&pool, alice, event, at("2026-06-01T08:00:00Z"))
        .await
        .unwrap();
    participation_service::pre_register(&pool, bob, event, at("2026-06-01T08:00:00Z"))
        .await
        .unwrap();

    let day_two = at("2026-06-02T00:00:01Z");
    let minted = lifecycle_service::run_unlock_pass(&pool, day_two).await.unwrap();
    assert_eq!(minted, 2);

    // Re-running the pass is a no-op.
    let minted = lifecycle_service::run_unlock_pass(&pool, day_two).await.unwrap();
    assert_eq!(minted, 0);

    let rows = participation_repo::list_daily_for_user_event(&pool, alice, event)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    let codes: Vec<_> = rows.iter().filter_map(|r| r.join_code.clone()).collect();
    assert_eq!(codes.len(), 2);
    assert_ne!(codes[0], codes[1]);
}

#[tokio::test]
async fn unlock_pass_honors_per_user_checkin_cap() {
    let pool = setup_pool().await;
    let user = insert_user(&pool, "Alice", ROLE_PARTICIPANT).await;
    let event = insert_multi_day_event(&pool, "Conference", day("2026-06-01"), day("2026-06-03"), Some(1)).await;

    participation_service::pre_register(&pool, user, event, at("2026-06-01T08:00:00Z"))
        .await
        .unwrap();

    let minted = lifecycle_service::run_unlock_pass(&pool, at("2026-06-02T00:00:01Z"))
        .await
        .unwrap();
    assert_eq!(minted, 0);
}

#[tokio::test]
async fn expire_pass_flips_overdue_codes_once() {
    let pool = setup_pool().await;
    let user = insert_user(&pool, "Alice", ROLE_PARTICIPANT).await;
    let event = insert_multi_day_event(&pool, "Conference", day("2026-06-01"), day("2026-06-03"), None).await;

    let row = participation_service::pre_register(&pool, user, event, at("2026-06-01T08:00:00Z"))
        .await
        .unwrap();

    // Before the expiry instant nothing moves.
    let expired = lifecycle_service::run_expire_pass(&pool, at("2026-06-01T12:00:00Z"))
        .await
        .unwrap();
    assert_eq!(expired, 0);

    let expired = lifecycle_service::run_expire_pass(&pool, at("2026-06-01T23:59:59Z"))
        .await
        .unwrap();
    assert_eq!(expired, 1);
    let expired = lifecycle_service::run_expire_pass(&pool, at("2026-06-01T23:59:59Z"))
        .await
        .unwrap();
    assert_eq!(expired, 0);

    let row = participation_repo::load_by_id(&pool, row.id).await.unwrap().unwrap();
    assert_eq!(row.status, "expired");
}

#[tokio::test]
async fn three_day_lifecycle_keeps_one_row_per_day() {
    let pool = setup_pool().await;
    let user = insert_user(&pool, "Alice", ROLE_PARTICIPANT).await;
    let staff = insert_user(&pool, "Sam", ROLE_STAFF).await;
    let event = insert_multi_day_event(&pool, "Conference", day("2026-06-01"), day("2026-06-03"), None).await;

    // Day 1: code issued at pre-registration, never used.
    participation_service::pre_register(&pool, user, event, at("2026-06-01T08:00:00Z"))
        .await
        .unwrap();
    lifecycle_service::run_expire_pass(&pool, at("2026-06-01T23:59:59Z"))
        .await
        .unwrap();

    // Day 2: unlocked, used at the door.
    lifecycle_service::run_unlock_pass(&pool, at("2026-06-02T00:00:01Z"))
        .await
        .unwrap();
    let status = participation_service::pre_registration_status(&pool, user, event, day("2026-06-02"))
        .await
        .unwrap();
    let today = status.today_code.unwrap();
    checkin_service::check_in(&pool, staff, &today.code, at("2026-06-02T09:30:00Z"))
        .await
        .unwrap();
    lifecycle_service::run_expire_pass(&pool, at("2026-06-02T23:59:59Z"))
        .await
        .unwrap();

    // Day 3: fresh code waiting.
    lifecycle_service::run_unlock_pass(&pool, at("2026-06-03T00:00:01Z"))
        .await
        .unwrap();

    let rows = participation_repo::list_daily_for_user_event(&pool, user, event)
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
    // Newest first.
    assert_eq!(rows[0].checkin_date, Some(day("2026-06-03")));
    assert_eq!(rows[0].status, "joined");
    assert_eq!(rows[1].checkin_date, Some(day("2026-06-02")));
    assert_eq!(rows[1].status, "checked_in");
    assert_eq!(rows[2].checkin_date, Some(day("2026-06-01")));
    assert_eq!(rows[2].status, "expired");
}

#[tokio::test]
async fn direct_join_on_multi_day_event_covers_today_only() {
    let pool = setup_pool().await;
    let user = insert_user(&pool, "Alice", ROLE_PARTICIPANT).await;
    let event = insert_multi_day_event(&pool, "Conference", day("2026-06-01"), day("2026-06-03"), None).await;
    let now = at("2026-06-02T10:00:00Z");

    let row = participation_service::join(&pool, LifecyclePolicy::default(), user, event, now)
        .await
        .unwrap();
    assert_eq!(row.checkin_date, Some(day("2026-06-02")));
    assert_eq!(row.pre_registered, 0);

    let err = participation_service::join(&pool, LifecyclePolicy::default(), user, event, now)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyJoined));

    // Outside the event window there is nothing to join.
    let err = participation_service::join(
        &pool,
        LifecyclePolicy::default(),
        user,
        event,
        at("2026-06-04T10:00:00Z"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::EventNotOpen));
}

#[tokio::test]
async fn cancelling_a_pre_registration_spares_used_codes() {
    let pool = setup_pool().await;
    let user = insert_user(&pool, "Alice", ROLE_PARTICIPANT).await;
    let staff = insert_user(&pool, "Sam", ROLE_STAFF).await;
    let event = insert_multi_day_event(&pool, "Conference", day("2026-06-01"), day("2026-06-03"), None).await;

    let first = participation_service::pre_register(&pool, user, event, at("2026-06-01T08:00:00Z"))
        .await
        .unwrap();
    let code = first.join_code.clone().unwrap();
    checkin_service::check_in(&pool, staff, &code, at("2026-06-01T09:00:00Z"))
        .await
        .unwrap();

    lifecycle_service::run_unlock_pass(&pool, at("2026-06-02T00:00:01Z"))
        .await
        .unwrap();

    let cancelled = participation_service::cancel_pre_registration(
        &pool,
        user,
        event,
        None,
        at("2026-06-02T10:00:00Z"),
    )
    .await
    .unwrap();
    assert_eq!(cancelled, 1);

    let kept = participation_repo::load_by_id(&pool, first.id).await.unwrap().unwrap();
    assert_eq!(kept.status, "checked_in");

    // Nothing left to cancel.
    let err = participation_service::cancel_pre_registration(
        &pool,
        user,
        event,
        None,
        at("2026-06-02T10:00:00Z"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn checkin_stats_track_streak_and_totals() {
    let pool = setup_pool().await;
    let user = insert_user(&pool, "Alice", ROLE_PARTICIPANT).await;
    let staff = insert_user(&pool, "Sam", ROLE_STAFF).await;
    let event = insert_multi_day_event(&pool, "Conference", day("2026-06-01"), day("2026-06-05"), None).await;

    let first = participation_service::pre_register(&pool, user, event, at("2026-06-01T08:00:00Z"))
        .await
        .unwrap();
    checkin_service::check_in(
        &pool,
        staff,
        &first.join_code.clone().unwrap(),
        at("2026-06-01T09:00:00Z"),
    )
    .await
    .unwrap();

    lifecycle_service::run_unlock_pass(&pool, at("2026-06-02T00:00:01Z"))
        .await
        .unwrap();
    let status = participation_service::pre_registration_status(&pool, user, event, day("2026-06-02"))
        .await
        .unwrap();
    checkin_service::check_in(
        &pool,
        staff,
        &status.today_code.unwrap().code,
        at("2026-06-02T09:00:00Z"),
    )
    .await
    .unwrap();

    let stats = participation_service::daily_checkin_stats(&pool, user, event, day("2026-06-02"))
        .await
        .unwrap();
    assert_eq!(stats.total_days_registered, 2);
    assert_eq!(stats.total_days_checked_in, 2);
    assert_eq!(stats.total_days_expired, 0);
    assert_eq!(stats.current_streak, 2);
    assert_eq!(stats.calendar.len(), 2);
}

#[tokio::test]
async fn pre_registration_status_reports_today_code() {
    let pool = setup_pool().await;
    let user = insert_user(&pool, "Alice", ROLE_PARTICIPANT).await;
    let event = insert_multi_day_event(&pool, "Conference", day("2026-06-01"), day("2026-06-03"), None).await;

    let none = participation_service::pre_registration_status(&pool, user, event, day("2026-06-01"))
        .await
        .unwrap();
    assert!(!none.is_registered);
    assert!(none.today_code.is_none());

    let row = participation_service::pre_register(&pool, user, event, at("2026-06-01T08:00:00Z"))
        .await
        .unwrap();
    let status = participation_service::pre_registration_status(&pool, user, event, day("2026-06-01"))
        .await
        .unwrap();
    assert!(status.is_registered);
    assert_eq!(status.total_codes, 1);
    assert_eq!(status.active_codes, 1);
    assert_eq!(status.today_code.unwrap().code, row.join_code.unwrap());
}
