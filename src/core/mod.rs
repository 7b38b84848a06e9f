/// Field-level change tracking and the activity log sink
pub mod audit;
/// Coupon record behaviour: status, per-user limits, code generation and CRUD
pub mod coupon;
/// Redeeming coupons on behalf of users
pub mod redemption;
/// Localized status labels and date rendering
pub mod report;
/// Minimal user records referenced by redemptions
pub mod user;
