mod common;

use checkin_backend::database::participation_repo;
use checkin_backend::error::AppError;
use checkin_backend::models::users::{ROLE_PARTICIPANT, ROLE_STAFF};
use checkin_backend::services::{checkin_service, participation_service};
use checkin_backend::state::LifecyclePolicy;
use common::*;

#[tokio::test]
async fn check_in_redeems_the_code() {
    let pool = setup_pool().await;
    let user = insert_user(&pool, "Alice", ROLE_PARTICIPANT).await;
    let staff = insert_user(&pool, "Sam", ROLE_STAFF).await;
    let event = insert_single_day_event(&pool, "Workshop", day("2026-05-01"), None).await;
    let now = at("2026-05-01T09:00:00Z");

    let row = participation_service::join(&pool, LifecyclePolicy::default(), user, event, now)
        .await
        .unwrap();
    let code = row.join_code.clone().unwrap();

    let checked = checkin_service::check_in(&pool, staff, &code, now).await.unwrap();
    assert_eq!(checked.status, "checked_in");
    assert_eq!(checked.code_used, 1);
    assert_eq!(checked.checkin_count, 1);
    assert_eq!(checked.checked_in_by, Some(staff));
    assert!(checked.checked_in_at.is_some());
}

#[tokio::test]
async fn unknown_code_is_not_found() {
    let pool = setup_pool().await;
    let staff = insert_user(&pool, "Sam", ROLE_STAFF).await;

    let err = checkin_service::check_in(&pool, staff, "00000", at("2026-05-01T09:00:00Z"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::CodeNotFound));
}

#[tokio::test]
async fn a_code_works_exactly_once() {
    let pool = setup_pool().await;
    let user = insert_user(&pool, "Alice", ROLE_PARTICIPANT).await;
    let staff = insert_user(&pool, "Sam", ROLE_STAFF).await;
    let event = insert_single_day_event(&pool, "Workshop", day("2026-05-01"), None).await;
    let now = at("2026-05-01T09:00:00Z");

    let row = participation_service::join(&pool, LifecyclePolicy::default(), user, event, now)
        .await
        .unwrap();
    let code = row.join_code.clone().unwrap();

    checkin_service::check_in(&pool, staff, &code, now).await.unwrap();
    let err = checkin_service::check_in(&pool, staff, &code, now).await.unwrap_err();
    assert!(matches!(err, AppError::CodeAlreadyUsed));
}

#[tokio::test]
async fn overdue_code_expires_at_the_door() {
    let pool = setup_pool().await;
    let user = insert_user(&pool, "Alice", ROLE_PARTICIPANT).await;
    let staff = insert_user(&pool, "Sam", ROLE_STAFF).await;
    let event = insert_multi_day_event(&pool, "Conference", day("2026-06-01"), day("2026-06-03"), None).await;

    let row = participation_service::pre_register(&pool, user, event, at("2026-06-01T08:00:00Z"))
        .await
        .unwrap();
    let code = row.join_code.clone().unwrap();

    // Presented the next morning, before any expire pass has run.
    let err = checkin_service::check_in(&pool, staff, &code, at("2026-06-02T09:00:00Z"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::CodeExpired));

    // The row was flipped on the spot.
    let row = participation_repo::load_by_id(&pool, row.id).await.unwrap().unwrap();
    assert_eq!(row.status, "expired");

    // A second attempt sees the terminal status.
    let err = checkin_service::check_in(&pool, staff, &code, at("2026-06-02T09:01:00Z"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::CodeExpired));
}

#[tokio::test]
async fn cancelled_rows_release_their_code() {
    let pool = setup_pool().await;
    let user = insert_user(&pool, "Alice", ROLE_PARTICIPANT).await;
    let staff = insert_user(&pool, "Sam", ROLE_STAFF).await;
    let event = insert_single_day_event(&pool, "Workshop", day("2026-05-01"), None).await;
    let now = at("2026-05-01T09:00:00Z");

    let row = participation_service::join(&pool, LifecyclePolicy::default(), user, event, now)
        .await
        .unwrap();
    let code = row.join_code.clone().unwrap();
    participation_service::cancel(&pool, user, false, row.id, "leaving", now)
        .await
        .unwrap();

    let err = checkin_service::check_in(&pool, staff, &code, now).await.unwrap_err();
    assert!(matches!(err, AppError::CodeNotFound));
}

#[tokio::test]
async fn complete_closes_a_checked_in_row() {
    let pool = setup_pool().await;
    let user = insert_user(&pool, "Alice", ROLE_PARTICIPANT).await;
    let staff = insert_user(&pool, "Sam", ROLE_STAFF).await;
    let event = insert_single_day_event(&pool, "Workshop", day("2026-05-01"), None).await;
    let now = at("2026-05-01T09:00:00Z");

    let row = participation_service::join(&pool, LifecyclePolicy::default(), user, event, now)
        .await
        .unwrap();

    // Cannot complete before checking in.
    let err = checkin_service::complete(&pool, staff, row.id, now).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(ref s) if s == "joined"));

    let code = row.join_code.clone().unwrap();
    checkin_service::check_in(&pool, staff, &code, now).await.unwrap();
    let completed = checkin_service::complete(&pool, staff, row.id, now).await.unwrap();
    assert_eq!(completed.status, "completed");
    assert_eq!(completed.completed_by, Some(staff));

    let err = checkin_service::complete(&pool, staff, row.id, now).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(ref s) if s == "completed"));
}
