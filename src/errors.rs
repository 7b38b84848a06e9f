//! Unified error types for the coupon ledger.

use crate::core::coupon::CouponStatus;
use thiserror::Error;

/// Every failure the crate can surface. Collaborator errors are wrapped, never handled locally.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid input or configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Failure reported by the persistence layer
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// No coupon matched the given code or id
    #[error("Coupon not found: {code}")]
    CouponNotFound {
        /// The code (or id) that was looked up
        code: String,
    },

    /// No user matched the given id
    #[error("User not found: {user_id}")]
    UserNotFound {
        /// The user id that was looked up
        user_id: i64,
    },

    /// Discount magnitude was negative or not finite
    #[error("Invalid coupon value: {value}")]
    InvalidValue {
        /// The rejected value
        value: f64,
    },

    /// Coupon exists but its status forbids redemption
    #[error("Coupon {code} cannot be redeemed: {status}")]
    CouponUnavailable {
        /// Coupon code
        code: String,
        /// Status at the time of the attempt
        status: CouponStatus,
    },

    /// The user already redeemed this coupon as often as allowed
    #[error("User {user_id} has reached the per-user limit for coupon {code}")]
    PerUserLimitReached {
        /// Redeeming user
        user_id: i64,
        /// Coupon code
        code: String,
    },

    /// The operating system random source failed
    #[error("Random code generation failed: {0}")]
    RandomGeneration(#[from] rand::Error),

    /// Audit snapshot could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
