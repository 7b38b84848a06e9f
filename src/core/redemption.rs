//! Redemption business logic - Applies a coupon on behalf of a user.
//!
//! A redemption records one `user_coupons` row and increments the coupon's `uses`
//! inside a single database transaction. The increment is a conditional
//! `UPDATE coupons SET uses = uses + 1 WHERE id = ? AND uses < max_uses`, so two
//! concurrent redemptions can never push `uses` past `max_uses`.

use crate::{
    config::settings::CouponSettings,
    core::{
        audit::{self, ActivityEvent},
        coupon::{self as coupon_core, CouponStatus},
    },
    entities::{Coupon, User, UserCoupon, coupon, user_coupon},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};

/// Redeems the coupon identified by `code` for `user_id`.
///
/// # Errors
/// - [`Error::CouponNotFound`] / [`Error::UserNotFound`] for unknown ids
/// - [`Error::CouponUnavailable`] when the coupon is expired or used up
/// - [`Error::PerUserLimitReached`] when the user hit `max_uses_per_user`
pub async fn redeem_coupon(
    db: &DatabaseConnection,
    user_id: i64,
    code: &str,
    settings: &CouponSettings,
) -> Result<user_coupon::Model> {
    let txn = db.begin().await?;

    let coupon = coupon_core::get_coupon_by_code(&txn, code)
        .await?
        .ok_or_else(|| Error::CouponNotFound {
            code: code.to_string(),
        })?;

    User::find_by_id(user_id)
        .one(&txn)
        .await?
        .ok_or(Error::UserNotFound { user_id })?;

    let status = coupon.status();
    if status != CouponStatus::Valid {
        tracing::warn!(user_id, code = %coupon.code, %status, "Refusing redemption");
        return Err(Error::CouponUnavailable {
            code: coupon.code,
            status,
        });
    }

    if coupon_core::is_limits_uses_reached(&txn, user_id, &coupon, settings).await? {
        tracing::warn!(user_id, code = %coupon.code, "Per-user redemption limit reached");
        return Err(Error::PerUserLimitReached {
            user_id,
            code: coupon.code,
        });
    }

    let now = Utc::now();

    // Guarded increment: a concurrent redemption may have taken the last slot
    let result = Coupon::update_many()
        .col_expr(
            coupon::Column::Uses,
            Expr::col(coupon::Column::Uses).add(1),
        )
        .col_expr(coupon::Column::UpdatedAt, Expr::value(now))
        .filter(coupon::Column::Id.eq(coupon.id))
        .filter(Expr::col(coupon::Column::Uses).lt(Expr::col(coupon::Column::MaxUses)))
        .exec(&txn)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::CouponUnavailable {
            code: coupon.code,
            status: CouponStatus::UsesLimitReached,
        });
    }

    let redemption = user_coupon::ActiveModel {
        user_id: Set(user_id),
        coupon_id: Set(coupon.id),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let updated = coupon_core::get_coupon_by_id(&txn, coupon.id)
        .await?
        .ok_or_else(|| Error::CouponNotFound {
            code: coupon.code.clone(),
        })?;
    audit::record_activity(&txn, ActivityEvent::Updated, Some(&coupon), Some(&updated)).await?;

    txn.commit().await?;

    tracing::info!(
        user_id,
        code = %updated.code,
        uses = updated.uses,
        max_uses = updated.max_uses,
        "Redeemed coupon"
    );
    Ok(redemption)
}

/// Retrieves a user's redemption rows, newest first.
pub async fn get_redemptions_for_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<user_coupon::Model>> {
    UserCoupon::find()
        .filter(user_coupon::Column::UserId.eq(user_id))
        .order_by_desc(user_coupon::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_redeem_coupon_increments_uses() -> Result<()> {
        let (db, coupon, user) = setup_with_coupon_and_user().await?;

        let redemption =
            redeem_coupon(&db, user.id, &coupon.code, &CouponSettings::default()).await?;
        assert_eq!(redemption.user_id, user.id);
        assert_eq!(redemption.coupon_id, coupon.id);

        let reloaded = coupon_core::get_coupon_by_id(&db, coupon.id).await?.unwrap();
        assert_eq!(reloaded.uses, 1);
        assert_eq!(
            coupon_core::count_user_redemptions(&db, user.id, coupon.id).await?,
            1
        );

        let entries = audit::get_activity_for(&db, "coupon", coupon.id).await?;
        let last = entries.last().unwrap();
        assert_eq!(last.description, "updated");
        assert_eq!(
            last.properties,
            serde_json::json!({"attributes": {"uses": 1}, "old": {"uses": 0}})
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_redeem_coupon_enforces_per_user_limit() -> Result<()> {
        let (db, coupon, user) = setup_with_coupon_and_user().await?;
        let settings = CouponSettings::default();

        redeem_coupon(&db, user.id, &coupon.code, &settings).await?;
        let result = redeem_coupon(&db, user.id, &coupon.code, &settings).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::PerUserLimitReached { .. }
        ));

        // Refused redemption leaves no trace
        let reloaded = coupon_core::get_coupon_by_id(&db, coupon.id).await?.unwrap();
        assert_eq!(reloaded.uses, 1);
        assert_eq!(get_redemptions_for_user(&db, user.id).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_redeem_coupon_stops_at_max_uses() -> Result<()> {
        let db = setup_test_db().await?;
        let coupon = create_custom_coupon(&db, "TWICE", 2, None).await?;
        let settings = CouponSettings::default();

        for name in ["a", "b"] {
            let user = create_test_user(&db, name).await?;
            redeem_coupon(&db, user.id, "TWICE", &settings).await?;
        }

        let late = create_test_user(&db, "c").await?;
        let result = redeem_coupon(&db, late.id, "TWICE", &settings).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::CouponUnavailable {
                status: CouponStatus::UsesLimitReached,
                ..
            }
        ));

        let reloaded = coupon_core::get_coupon_by_id(&db, coupon.id).await?.unwrap();
        assert_eq!(reloaded.uses, 2);
        assert_eq!(reloaded.status(), CouponStatus::UsesLimitReached);
        Ok(())
    }

    #[tokio::test]
    async fn test_redeem_expired_coupon() -> Result<()> {
        let db = setup_test_db().await?;
        create_custom_coupon(&db, "OLD", 10, Some(Utc::now() - Duration::hours(1))).await?;
        let user = create_test_user(&db, "late").await?;

        let result = redeem_coupon(&db, user.id, "OLD", &CouponSettings::default()).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::CouponUnavailable {
                status: CouponStatus::Expired,
                ..
            }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_redeem_unknown_coupon_or_user() -> Result<()> {
        let (db, coupon, user) = setup_with_coupon_and_user().await?;
        let settings = CouponSettings::default();

        let result = redeem_coupon(&db, user.id, "NOPE", &settings).await;
        assert!(matches!(result.unwrap_err(), Error::CouponNotFound { .. }));

        let result = redeem_coupon(&db, 999, &coupon.code, &settings).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::UserNotFound { user_id: 999 }
        ));
        Ok(())
    }
}
