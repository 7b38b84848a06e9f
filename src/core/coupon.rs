//! Coupon business logic - Handles all coupon-related operations.
//!
//! Covers the record's own behaviour (derived status, per-user redemption limit,
//! random code generation) and the create/read/update/delete functions used by the
//! admin flow. Every write is audited through [`crate::core::audit`]. `uses` is never
//! modified here; see [`crate::core::redemption`].

use crate::{
    config::settings::{CouponSeed, CouponSettings},
    core::audit::{self, ActivityEvent, Auditable, LogOptions},
    entities::{Coupon, User, UserCoupon, coupon, user, user_coupon},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use rand::{RngCore, rngs::OsRng};
use sea_orm::{PaginatorTrait, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date format shared with clients rendering or parsing coupon dates.
pub const DATE_FORMAT: &str = "Y-MM-DD HH:mm:ss";

/// `chrono` equivalent of [`DATE_FORMAT`].
pub const CHRONO_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Number of codes produced when the caller does not ask for a specific amount.
pub const DEFAULT_GENERATED_AMOUNT: usize = 10;

/// Random bytes per generated code; each byte renders as two hex characters.
const CODE_BYTES: usize = 3;

/// Derived state of a coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CouponStatus {
    /// `uses` has reached `max_uses`
    UsesLimitReached,
    /// `expires_at` is in the past
    Expired,
    /// Redeemable
    Valid,
}

impl CouponStatus {
    /// Stable token, also the translation key.
    #[must_use]
    pub const fn as_token(self) -> &'static str {
        match self {
            Self::UsesLimitReached => "USES_LIMIT_REACHED",
            Self::Expired => "EXPIRED",
            Self::Valid => "VALID",
        }
    }
}

impl fmt::Display for CouponStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

impl coupon::Model {
    /// Derives the status at `now`. The uses limit takes precedence over expiry.
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> CouponStatus {
        if self.uses >= self.max_uses {
            return CouponStatus::UsesLimitReached;
        }

        match self.expires_at {
            Some(expires_at) if expires_at <= now => CouponStatus::Expired,
            _ => CouponStatus::Valid,
        }
    }

    /// Derives the status at the current instant.
    #[must_use]
    pub fn status(&self) -> CouponStatus {
        self.status_at(Utc::now())
    }
}

impl Auditable for coupon::Model {
    const SUBJECT_TYPE: &'static str = "coupon";

    fn subject_id(&self) -> i64 {
        self.id
    }

    fn log_options() -> LogOptions {
        LogOptions::default()
            .log_only_dirty()
            .log_all()
            .dont_submit_empty_logs()
    }
}

/// Input for [`create_coupon`]
#[derive(Debug, Clone, PartialEq)]
pub struct NewCoupon {
    /// Redemption code, trimmed before storage
    pub code: String,
    /// Discount kind
    pub coupon_type: String,
    /// Discount magnitude
    pub value: f64,
    /// Global redemption ceiling
    pub max_uses: i32,
    /// Expiry, None for never
    pub expires_at: Option<DateTime<Utc>>,
}

/// Partial update for [`update_coupon`]; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CouponUpdate {
    /// New redemption code
    pub code: Option<String>,
    /// New discount kind
    pub coupon_type: Option<String>,
    /// New discount magnitude
    pub value: Option<f64>,
    /// New redemption ceiling
    pub max_uses: Option<i32>,
    /// New expiry; `Some(None)` clears it
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

fn validate_code(code: &str) -> Result<String> {
    let code = code.trim();
    if code.is_empty() {
        return Err(Error::Config {
            message: "Coupon code cannot be empty".to_string(),
        });
    }
    Ok(code.to_string())
}

fn validate_value(value: f64) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::InvalidValue { value });
    }
    Ok(value)
}

fn validate_max_uses(max_uses: i32) -> Result<i32> {
    if max_uses < 0 {
        return Err(Error::Config {
            message: format!("Coupon max_uses cannot be negative: {max_uses}"),
        });
    }
    Ok(max_uses)
}

/// Creates a coupon with zero uses after validating the input.
///
/// The code must be non-empty after trimming, the value finite and non-negative,
/// and `max_uses` non-negative. Codes are unique at the database level, so a duplicate
/// surfaces as a database error.
pub async fn create_coupon(db: &DatabaseConnection, new_coupon: NewCoupon) -> Result<coupon::Model> {
    let code = validate_code(&new_coupon.code)?;
    let value = validate_value(new_coupon.value)?;
    let max_uses = validate_max_uses(new_coupon.max_uses)?;

    let txn = db.begin().await?;

    let now = Utc::now();
    let coupon = coupon::ActiveModel {
        code: Set(code),
        coupon_type: Set(new_coupon.coupon_type),
        value: Set(value),
        uses: Set(0),
        max_uses: Set(max_uses),
        expires_at: Set(new_coupon.expires_at),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let result = coupon.insert(&txn).await?;
    audit::record_activity(&txn, ActivityEvent::Created, None, Some(&result)).await?;

    txn.commit().await?;

    tracing::info!(coupon_id = result.id, code = %result.code, "Created coupon");
    Ok(result)
}

/// Finds a coupon by its unique ID.
pub async fn get_coupon_by_id<C>(db: &C, coupon_id: i64) -> Result<Option<coupon::Model>>
where
    C: ConnectionTrait,
{
    Coupon::find_by_id(coupon_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a coupon by its redemption code (exact match).
pub async fn get_coupon_by_code<C>(db: &C, code: &str) -> Result<Option<coupon::Model>>
where
    C: ConnectionTrait,
{
    Coupon::find()
        .filter(coupon::Column::Code.eq(code))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves every coupon, ordered alphabetically by code.
pub async fn get_all_coupons(db: &DatabaseConnection) -> Result<Vec<coupon::Model>> {
    Coupon::find()
        .order_by_asc(coupon::Column::Code)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies a partial update and audits the changed fields.
///
/// Fields equal to their stored value are not written. When nothing differs the
/// coupon is returned untouched: no write, no `updated_at` bump, no log entry.
#[allow(clippy::float_cmp)]
pub async fn update_coupon(
    db: &DatabaseConnection,
    coupon_id: i64,
    changes: CouponUpdate,
) -> Result<coupon::Model> {
    let txn = db.begin().await?;

    let existing = get_coupon_by_id(&txn, coupon_id)
        .await?
        .ok_or_else(|| Error::CouponNotFound {
            code: coupon_id.to_string(),
        })?;

    let mut active: coupon::ActiveModel = existing.clone().into();

    if let Some(code) = changes.code {
        let code = validate_code(&code)?;
        if code != existing.code {
            active.code = Set(code);
        }
    }
    if let Some(coupon_type) = changes.coupon_type {
        if coupon_type != existing.coupon_type {
            active.coupon_type = Set(coupon_type);
        }
    }
    if let Some(value) = changes.value {
        let value = validate_value(value)?;
        if value != existing.value {
            active.value = Set(value);
        }
    }
    if let Some(max_uses) = changes.max_uses {
        let max_uses = validate_max_uses(max_uses)?;
        if max_uses != existing.max_uses {
            active.max_uses = Set(max_uses);
        }
    }
    if let Some(expires_at) = changes.expires_at {
        if expires_at != existing.expires_at {
            active.expires_at = Set(expires_at);
        }
    }

    if !active.is_changed() {
        tracing::debug!(coupon_id, "Coupon update contained no changes");
        return Ok(existing);
    }

    active.updated_at = Set(Utc::now());
    let updated = active.update(&txn).await?;
    audit::record_activity(&txn, ActivityEvent::Updated, Some(&existing), Some(&updated)).await?;

    txn.commit().await?;

    tracing::info!(coupon_id, code = %updated.code, "Updated coupon");
    Ok(updated)
}

/// Deletes a coupon together with its redemption rows.
pub async fn delete_coupon(db: &DatabaseConnection, coupon_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let coupon = get_coupon_by_id(&txn, coupon_id)
        .await?
        .ok_or_else(|| Error::CouponNotFound {
            code: coupon_id.to_string(),
        })?;

    UserCoupon::delete_many()
        .filter(user_coupon::Column::CouponId.eq(coupon_id))
        .exec(&txn)
        .await?;

    audit::record_activity(&txn, ActivityEvent::Deleted, Some(&coupon), None).await?;
    coupon.clone().delete(&txn).await?;

    txn.commit().await?;

    tracing::info!(coupon_id, code = %coupon.code, "Deleted coupon");
    Ok(())
}

/// Counts how many times `user_id` has redeemed the coupon.
pub async fn count_user_redemptions<C>(db: &C, user_id: i64, coupon_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    UserCoupon::find()
        .filter(user_coupon::Column::UserId.eq(user_id))
        .filter(user_coupon::Column::CouponId.eq(coupon_id))
        .count(db)
        .await
        .map_err(Into::into)
}

/// True when `redemptions` has reached the per-user limit.
#[must_use]
pub const fn uses_limit_reached(redemptions: u64, settings: &CouponSettings) -> bool {
    redemptions >= settings.max_uses_per_user
}

/// Checks whether a user has already redeemed `coupon` as often as `settings` allow.
pub async fn is_limits_uses_reached<C>(
    db: &C,
    user_id: i64,
    coupon: &coupon::Model,
    settings: &CouponSettings,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    let redemptions = count_user_redemptions(db, user_id, coupon.id).await?;
    Ok(uses_limit_reached(redemptions, settings))
}

/// Retrieves the distinct users who redeemed the coupon, ordered by ID.
pub async fn get_coupon_users<C>(db: &C, coupon: &coupon::Model) -> Result<Vec<user::Model>>
where
    C: ConnectionTrait,
{
    coupon
        .find_related(User)
        .distinct()
        .order_by_asc(user::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

fn generate_code<R: RngCore>(rng: &mut R) -> Result<String> {
    let mut bytes = [0u8; CODE_BYTES];
    rng.try_fill_bytes(&mut bytes)?;
    Ok(hex::encode_upper(bytes))
}

/// Generates `amount` random codes of six uppercase hex characters.
///
/// Bytes come from the operating system's random source. Codes are not checked
/// against existing coupons; the unique constraint on `code` rejects collisions
/// when they are stored.
pub fn generate_random_coupons(amount: usize) -> Result<Vec<String>> {
    let mut rng = OsRng;
    (0..amount).map(|_| generate_code(&mut rng)).collect()
}

/// Creates the configured coupons whose codes are not taken yet.
///
/// Returns the number of coupons created.
pub async fn seed_coupons(db: &DatabaseConnection, seeds: &[CouponSeed]) -> Result<usize> {
    let mut created = 0;

    for seed in seeds {
        if get_coupon_by_code(db, seed.code.trim()).await?.is_some() {
            tracing::debug!(code = %seed.code, "Seed coupon already exists");
            continue;
        }

        create_coupon(
            db,
            NewCoupon {
                code: seed.code.clone(),
                coupon_type: seed.coupon_type.clone(),
                value: seed.value,
                max_uses: seed.max_uses,
                expires_at: seed.expiry()?,
            },
        )
        .await?;
        created += 1;
    }

    Ok(created)
}
