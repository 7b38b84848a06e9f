//! User business logic.
//!
//! Users are owned by the surrounding application; this crate only needs enough of
//! them to record who redeemed which coupon.

use crate::{
    entities::{Coupon, User, coupon, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};

/// Creates a user with the given display name.
pub async fn create_user(db: &DatabaseConnection, name: &str) -> Result<user::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Config {
            message: "User name cannot be empty".to_string(),
        });
    }

    let user = user::ActiveModel {
        name: Set(name.to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let result = user.insert(db).await?;
    Ok(result)
}

/// Finds a user by its unique ID.
pub async fn get_user_by_id(db: &DatabaseConnection, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Retrieves the distinct coupons a user has redeemed, ordered by code.
pub async fn get_user_coupons(
    db: &DatabaseConnection,
    user: &user::Model,
) -> Result<Vec<coupon::Model>> {
    user.find_related(Coupon)
        .distinct()
        .order_by_asc(coupon::Column::Code)
        .all(db)
        .await
        .map_err(Into::into)
}
