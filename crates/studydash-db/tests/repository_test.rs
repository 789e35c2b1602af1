//! Postgres repository tests.
//!
//! Run with a migrated database:
//! `DATABASE_URL=postgres://... cargo test -p studydash-db -- --ignored`

use studydash_db::test_fixtures::{connect_test_database, unique_new_user};
use studydash_db::{
    DashboardDocument, DashboardRepository, Error, ProfileUpdate, UserRepository,
};
use uuid::Uuid;

#[tokio::test]
#[ignore] // Requires DATABASE_URL pointing at a PostgreSQL instance
async fn test_create_and_find_user_case_insensitive() {
    let db = connect_test_database().await.expect("connect");
    let new_user = unique_new_user("Jo");
    let email = new_user.email.clone();

    let created = db.users.create(new_user).await.expect("create");
    assert_eq!(created.email, email);
    assert_eq!(created.avatar.as_deref(), Some("JO"));

    let found = db
        .users
        .find_by_email(&email.to_uppercase())
        .await
        .expect("query")
        .expect("user exists");
    assert_eq!(found.user.id, created.id);
    assert!(!found.password_hash.is_empty());
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL pointing at a PostgreSQL instance
async fn test_duplicate_email_is_conflict() {
    let db = connect_test_database().await.expect("connect");
    let first = unique_new_user("Jo");
    let mut second = unique_new_user("Al");
    second.email = first.email.to_uppercase();

    db.users.create(first).await.expect("create");
    let err = db.users.create(second).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)), "got {:?}", err);
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL pointing at a PostgreSQL instance
async fn test_update_profile_clears_student_id() {
    let db = connect_test_database().await.expect("connect");
    let mut new_user = unique_new_user("Jo");
    new_user.student_id = Some("STU1".to_string());
    let user = db.users.create(new_user).await.expect("create");

    let updated = db
        .users
        .update_profile(
            user.id,
            ProfileUpdate {
                name: Some("Maya".to_string()),
                student_id: Some(None),
                department: None,
                avatar: Some("MA".to_string()),
            },
        )
        .await
        .expect("update");
    assert_eq!(updated.name, "Maya");
    assert_eq!(updated.avatar.as_deref(), Some("MA"));
    assert!(updated.student_id.is_none());
    assert_eq!(updated.department, user.department);

    let unchanged = db
        .users
        .update_profile(user.id, ProfileUpdate::default())
        .await
        .expect("empty update");
    assert_eq!(unchanged, updated);
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL pointing at a PostgreSQL instance
async fn test_missing_document_is_none() {
    let db = connect_test_database().await.expect("connect");
    assert!(db.dashboards.get(Uuid::new_v4()).await.expect("get").is_none());
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL pointing at a PostgreSQL instance
async fn test_upsert_replaces_whole_document() {
    let db = connect_test_database().await.expect("connect");
    let user = db.users.create(unique_new_user("Jo")).await.expect("create");

    let first: DashboardDocument = serde_json::from_value(serde_json::json!({
        "courses": [{ "id": "1", "name": "X", "semesterId": null, "properties": {}, "progress": 0, "color": "#fff" }],
        "grades": [{ "id": "1", "grade": "A", "credits": "4", "semester": "Fall 2025", "properties": {} }]
    }))
    .unwrap();
    db.dashboards.upsert(user.id, &first).await.expect("upsert");
    assert_eq!(db.dashboards.get(user.id).await.unwrap(), Some(first));

    let second: DashboardDocument = serde_json::from_value(serde_json::json!({
        "courses": [{ "id": "2", "name": "Y", "semesterId": "s1", "properties": {}, "progress": 10, "color": "#000" }],
        "seedVersion": 1
    }))
    .unwrap();
    db.dashboards.upsert(user.id, &second).await.expect("upsert");

    let stored = db.dashboards.get(user.id).await.unwrap().unwrap();
    assert_eq!(stored, second);
    assert!(stored.grades.is_empty());
    assert_eq!(stored.seed_version, Some(1));
}
