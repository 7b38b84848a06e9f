//! Presentation helpers for coupons.
//!
//! Maps [`CouponStatus`] to user-facing text and renders dates in the configured
//! timezone. All functions are pure and return strings for the caller to display.

use crate::{
    core::coupon::{CHRONO_DATE_FORMAT, CouponStatus},
    entities::coupon,
};
use chrono::{DateTime, FixedOffset, Utc};
use std::collections::HashMap;

/// Status token to localized text, falling back to the token itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Translations {
    entries: HashMap<String, String>,
}

impl Translations {
    /// Wraps a token-to-text map (usually the `[translations]` config table).
    #[must_use]
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    /// Looks up `token`, returning it unchanged when no translation exists.
    #[must_use]
    pub fn translate(&self, token: &str) -> String {
        self.entries
            .get(token)
            .cloned()
            .unwrap_or_else(|| token.to_string())
    }
}

/// User-facing label for a status.
///
/// `EXPIRED` and `VALID` are localized; `USES_LIMIT_REACHED` is always the raw token.
#[must_use]
pub fn status_label(status: CouponStatus, translations: &Translations) -> String {
    match status {
        CouponStatus::UsesLimitReached => status.as_token().to_string(),
        CouponStatus::Expired | CouponStatus::Valid => translations.translate(status.as_token()),
    }
}

/// Renders a timestamp in `offset` using the shared coupon date format.
#[must_use]
pub fn format_date(date: DateTime<Utc>, offset: FixedOffset) -> String {
    date.with_timezone(&offset)
        .format(CHRONO_DATE_FORMAT)
        .to_string()
}

/// One-line summary of a coupon, e.g. `SPRING25 | percentage 10.00 | 3/10 uses | expires never | VALID`.
#[must_use]
pub fn format_coupon_summary(
    coupon: &coupon::Model,
    now: DateTime<Utc>,
    translations: &Translations,
    offset: FixedOffset,
) -> String {
    let expiry = coupon
        .expires_at
        .map_or_else(|| "never".to_string(), |date| format_date(date, offset));
    let label = status_label(coupon.status_at(now), translations);

    format!(
        "{} | {} {:.2} | {}/{} uses | expires {} | {}",
        coupon.code, coupon.coupon_type, coupon.value, coupon.uses, coupon.max_uses, expiry, label
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::coupon_model;
    use chrono::{Duration, TimeZone};

    fn french() -> Translations {
        Translations::new(HashMap::from([
            ("EXPIRED".to_string(), "Expiré".to_string()),
            ("VALID".to_string(), "Valide".to_string()),
            ("USES_LIMIT_REACHED".to_string(), "Épuisé".to_string()),
        ]))
    }

    #[test]
    fn test_status_label_translates_expiry_labels() {
        let translations = french();
        assert_eq!(status_label(CouponStatus::Expired, &translations), "Expiré");
        assert_eq!(status_label(CouponStatus::Valid, &translations), "Valide");
    }

    #[test]
    fn test_status_label_keeps_uses_limit_token() {
        assert_eq!(
            status_label(CouponStatus::UsesLimitReached, &french()),
            "USES_LIMIT_REACHED"
        );
    }

    #[test]
    fn test_status_label_falls_back_to_token() {
        let translations = Translations::default();
        assert_eq!(status_label(CouponStatus::Valid, &translations), "VALID");
        assert_eq!(status_label(CouponStatus::Expired, &translations), "EXPIRED");
    }

    #[test]
    fn test_format_date_applies_offset() {
        let date = Utc.with_ymd_and_hms(2026, 3, 1, 22, 30, 5).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();

        assert_eq!(format_date(date, utc), "2026-03-01 22:30:05");
        assert_eq!(format_date(date, plus_two), "2026-03-02 00:30:05");
    }

    #[test]
    fn test_format_coupon_summary() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();

        let mut coupon = coupon_model(3, 10, None);
        coupon.code = "SPRING25".to_string();
        assert_eq!(
            format_coupon_summary(&coupon, now, &Translations::default(), utc),
            "SPRING25 | percentage 10.00 | 3/10 uses | expires never | VALID"
        );

        coupon.expires_at = Some(now - Duration::days(1));
        assert_eq!(
            format_coupon_summary(&coupon, now, &french(), utc),
            "SPRING25 | percentage 10.00 | 3/10 uses | expires 2026-05-31 12:00:00 | Expiré"
        );
    }
}
