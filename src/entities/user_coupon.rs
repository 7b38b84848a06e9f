//! User coupon entity - One row per redemption of a coupon by a user.
//!
//! The same (`user_id`, `coupon_id`) pair may appear several times; the row count
//! for a pair is that user's usage count for the coupon.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Redemption event database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_coupons")]
pub struct Model {
    /// Unique identifier for the redemption
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User who redeemed the coupon
    pub user_id: i64,
    /// Coupon that was redeemed
    pub coupon_id: i64,
    /// When the redemption happened
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `UserCoupon` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each redemption belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// Each redemption belongs to one coupon
    #[sea_orm(
        belongs_to = "super::coupon::Entity",
        from = "Column::CouponId",
        to = "super::coupon::Column::Id"
    )]
    Coupon,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::coupon::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Coupon.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
