//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod activity_log;
pub mod coupon;
pub mod user;
pub mod user_coupon;

// Re-export specific types to avoid conflicts
pub use activity_log::{
    Column as ActivityLogColumn, Entity as ActivityLog, Model as ActivityLogModel,
};
pub use coupon::{Column as CouponColumn, Entity as Coupon, Model as CouponModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
pub use user_coupon::{
    Column as UserCouponColumn, Entity as UserCoupon, Model as UserCouponModel,
};
