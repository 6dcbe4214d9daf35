//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `worklink_test`)
//!   `TEST_DB_PASSWORD` (default: `worklink_test`)
//!   `TEST_DB_NAME` (default: `worklink_test`)

#![allow(clippy::unwrap_used)]

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use worklink_common::AppError;
use worklink_db::entities::{
    support_ticket::{self, TicketStatus},
    user::UserRole,
};
use worklink_db::repositories::{ClaimOutcome, TicketRepository};
use worklink_db::test_utils::{TestDatabase, TestDbConfig};

fn open_ticket(id: &str, requester: &str) -> support_ticket::ActiveModel {
    let now = Utc::now();
    support_ticket::ActiveModel {
        id: Set(id.to_string()),
        requester_id: Set(requester.to_string()),
        subject: Set("Payment issue".to_string()),
        status: Set(TicketStatus::Open),
        assignee_id: Set(None),
        created_at: Set(now.into()),
        last_activity_at: Set(now.into()),
        closed_at: Set(None),
        closed_by: Set(None),
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection() {
    let config = TestDbConfig::default();
    let result = TestDatabase::with_config(config).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_unique_database_is_migrated() {
    let db = TestDatabase::create_unique().await.unwrap();

    // All tables exist once the seed insert succeeds.
    let user = db.seed_user("u1", UserRole::Client).await.unwrap();
    assert_eq!(user.role, UserRole::Client);

    db.reset().await.unwrap();
    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_second_active_ticket_is_a_conflict() {
    let db = TestDatabase::create_unique().await.unwrap();
    db.seed_user("u1", UserRole::Client).await.unwrap();
    let repo = TicketRepository::new(db.connection());

    repo.create(open_ticket("t1", "u1")).await.unwrap();

    // Deliberately skips the service's active-ticket pre-check: this is
    // what two concurrent creates look like once both have passed it.
    let err = repo.create(open_ticket("t2", "u1")).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");

    // A closed ticket does not count against the limit.
    assert!(repo.close("t1", "u1", Utc::now()).await.unwrap());
    repo.create(open_ticket("t3", "u1")).await.unwrap();

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_claim_has_a_single_winner() {
    let db = TestDatabase::create_unique().await.unwrap();
    db.seed_user("u1", UserRole::Client).await.unwrap();
    let repo = TicketRepository::new(db.connection());

    repo.create(open_ticket("t1", "u1")).await.unwrap();

    let first = repo.claim("t1", "mod1", Utc::now()).await.unwrap();
    let second = repo.claim("t1", "mod2", Utc::now()).await.unwrap();
    assert_eq!(first, ClaimOutcome::Claimed);
    assert_eq!(second, ClaimOutcome::Lost);

    let ticket = repo.get_by_id("t1").await.unwrap();
    assert_eq!(ticket.assignee_id.as_deref(), Some("mod1"));

    db.drop_database().await.unwrap();
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}

#[test]
fn test_database_url_format() {
    let config = TestDbConfig {
        host: "testhost".to_string(),
        port: 5432,
        username: "testuser".to_string(),
        password: "testpass".to_string(),
        database: "testdb".to_string(),
    };

    let url = config.database_url();
    assert!(url.starts_with("postgres://"));
    assert!(url.contains("testhost"));
    assert!(url.contains("5432"));
    assert!(url.contains("testdb"));
}
