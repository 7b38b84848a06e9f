//! Shared test utilities for the coupon ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        coupon::{self, NewCoupon},
        user,
    },
    entities,
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Builds an unsaved coupon model for pure status tests.
///
/// # Defaults
/// * `code`: `"TEST10"`
/// * `coupon_type`: `"percentage"`
/// * `value`: 10.0
pub fn coupon_model(
    uses: i32,
    max_uses: i32,
    expires_at: Option<DateTime<Utc>>,
) -> entities::coupon::Model {
    let now = Utc::now();
    entities::coupon::Model {
        id: 1,
        code: "TEST10".to_string(),
        coupon_type: "percentage".to_string(),
        value: 10.0,
        uses,
        max_uses,
        expires_at,
        created_at: now,
        updated_at: now,
    }
}

/// Creation input with sensible defaults.
///
/// # Defaults
/// * `coupon_type`: `"percentage"`
/// * `value`: 10.0
/// * `max_uses`: 10
/// * `expires_at`: None
pub fn new_coupon(code: &str) -> NewCoupon {
    NewCoupon {
        code: code.to_string(),
        coupon_type: "percentage".to_string(),
        value: 10.0,
        max_uses: 10,
        expires_at: None,
    }
}

/// Creates a test coupon with the defaults of [`new_coupon`].
pub async fn create_test_coupon(
    db: &DatabaseConnection,
    code: &str,
) -> Result<entities::coupon::Model> {
    coupon::create_coupon(db, new_coupon(code)).await
}

/// Creates a test coupon with a custom ceiling and expiry.
pub async fn create_custom_coupon(
    db: &DatabaseConnection,
    code: &str,
    max_uses: i32,
    expires_at: Option<DateTime<Utc>>,
) -> Result<entities::coupon::Model> {
    coupon::create_coupon(
        db,
        NewCoupon {
            max_uses,
            expires_at,
            ..new_coupon(code)
        },
    )
    .await
}

/// Creates a test user.
pub async fn create_test_user(db: &DatabaseConnection, name: &str) -> Result<entities::user::Model> {
    user::create_user(db, name).await
}

/// Sets up a complete test environment with a coupon (`"TEST10"`) and a user.
/// Returns (db, coupon, user) for redemption scenarios.
pub async fn setup_with_coupon_and_user() -> Result<(
    DatabaseConnection,
    entities::coupon::Model,
    entities::user::Model,
)> {
    let db = setup_test_db().await?;
    let coupon = create_test_coupon(&db, "TEST10").await?;
    let user = create_test_user(&db, "test_user").await?;
    Ok((db, coupon, user))
}
