//! Coupon entity - A redeemable discount code with usage and expiry limits.
//!
//! `uses` counts redemptions and is only ever incremented by the redemption flow.
//! Coupons relate to users many-to-many through `user_coupons`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Coupon database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    /// Unique identifier for the coupon
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Redemption token entered by customers
    #[sea_orm(unique)]
    pub code: String,
    /// Discount kind (e.g. `"percentage"`, `"fixed"`)
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub coupon_type: String,
    /// Magnitude of the discount
    pub value: f64,
    /// Number of redemptions so far
    pub uses: i32,
    /// Global redemption ceiling
    pub max_uses: i32,
    /// When the coupon stops being valid, None for never
    pub expires_at: Option<DateTimeUtc>,
    /// When the coupon was created
    pub created_at: DateTimeUtc,
    /// When the coupon was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Coupon and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One coupon has many redemption rows
    #[sea_orm(has_many = "super::user_coupon::Entity")]
    UserCoupons,
}

impl Related<super::user_coupon::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserCoupons.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        super::user_coupon::Relation::User.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::user_coupon::Relation::Coupon.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
