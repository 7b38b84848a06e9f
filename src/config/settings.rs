//! Application settings loading from config.toml
//!
//! Holds the process-wide timezone, the coupon redemption settings, status
//! translations and the coupons to seed on startup. Every section is optional;
//! a missing file yields the defaults.

use crate::errors::{Error, Result};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Deserialize;
use std::{collections::HashMap, path::Path};

const DEFAULT_CONFIG_PATH: &str = "config.toml";
const DEFAULT_TIMEZONE: &str = "UTC";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Fixed UTC offset used when rendering dates (`"UTC"` or e.g. `"+02:00"`)
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Redemption limits applied to every coupon
    #[serde(default)]
    pub coupon_settings: CouponSettings,
    /// Status token to user-facing text
    #[serde(default)]
    pub translations: HashMap<String, String>,
    /// Coupons created on startup when their code is not yet taken
    #[serde(default)]
    pub coupons: Vec<CouponSeed>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            coupon_settings: CouponSettings::default(),
            translations: HashMap::new(),
            coupons: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Parses `timezone` into a fixed offset.
    pub fn offset(&self) -> Result<FixedOffset> {
        let tz = self.timezone.trim();
        if tz.eq_ignore_ascii_case("utc") || tz == "Z" {
            return Ok(Utc.fix());
        }

        tz.parse::<FixedOffset>().map_err(|e| Error::Config {
            message: format!("Invalid timezone '{tz}': {e}"),
        })
    }
}

/// Redemption limits shared by all coupons
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct CouponSettings {
    /// How many times a single user may redeem the same coupon
    pub max_uses_per_user: u64,
}

impl Default for CouponSettings {
    fn default() -> Self {
        Self {
            max_uses_per_user: 1,
        }
    }
}

/// A coupon to seed from configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CouponSeed {
    /// Redemption code
    pub code: String,
    /// Discount kind
    #[serde(rename = "type")]
    pub coupon_type: String,
    /// Discount magnitude
    pub value: f64,
    /// Global redemption ceiling
    pub max_uses: i32,
    /// RFC 3339 expiry, e.g. `"2026-12-31T23:59:59Z"`
    #[serde(default)]
    pub expires_at: Option<String>,
}

impl CouponSeed {
    /// Parses `expires_at` into a UTC timestamp.
    pub fn expiry(&self) -> Result<Option<DateTime<Utc>>> {
        self.expires_at
            .as_deref()
            .map(|raw| {
                DateTime::parse_from_rfc3339(raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| Error::Config {
                        message: format!("Invalid expires_at '{raw}' for coupon {}: {e}", self.code),
                    })
            })
            .transpose()
    }
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

/// Loads application configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A field has the wrong type
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);

    let contents = std::fs::read_to_string(path_ref)
        .inspect_err(|e| tracing::error!("Failed to read config file {:?}: {}", path_ref, e))?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })
}

/// Loads configuration from `COUPON_CONFIG` (default `./config.toml`).
///
/// A missing file is not an error; the defaults are used instead.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("COUPON_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    if !Path::new(&path).exists() {
        tracing::warn!(path = %path, "Config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    let config = load_config(&path)?;
    config.offset()?;
    tracing::info!(
        path = %path,
        seeds = config.coupons.len(),
        max_uses_per_user = config.coupon_settings.max_uses_per_user,
        "Loaded configuration"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            timezone = "+02:00"

            [coupon_settings]
            max_uses_per_user = 3

            [translations]
            EXPIRED = "Expiré"
            VALID = "Valide"

            [[coupons]]
            code = "WELCOME10"
            type = "percentage"
            value = 10.0
            max_uses = 100

            [[coupons]]
            code = "SUMMER5"
            type = "fixed"
            value = 5.0
            max_uses = 20
            expires_at = "2026-09-01T00:00:00Z"
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.coupon_settings.max_uses_per_user, 3);
        assert_eq!(config.translations["EXPIRED"], "Expiré");
        assert_eq!(config.coupons.len(), 2);
        assert_eq!(config.coupons[0].coupon_type, "percentage");
        assert_eq!(config.coupons[0].value, 10.0);
        assert!(config.coupons[0].expiry().unwrap().is_none());
        assert_eq!(
            config.coupons[1].expiry().unwrap(),
            Some(Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            config.offset().unwrap(),
            FixedOffset::east_opt(2 * 3600).unwrap()
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.timezone, "UTC");
        assert_eq!(config.coupon_settings, CouponSettings::default());
        assert_eq!(config.coupon_settings.max_uses_per_user, 1);
        assert!(config.translations.is_empty());
        assert!(config.coupons.is_empty());
        assert_eq!(config.offset().unwrap(), Utc.fix());
    }

    #[test]
    fn test_invalid_timezone_is_config_error() {
        let config = AppConfig {
            timezone: "Mars/Olympus".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(config.offset(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_invalid_expiry_is_config_error() {
        let seed = CouponSeed {
            code: "BAD".to_string(),
            coupon_type: "fixed".to_string(),
            value: 1.0,
            max_uses: 1,
            expires_at: Some("tomorrow".to_string()),
        };
        assert!(matches!(seed.expiry(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("definitely/not/here.toml");
        assert!(matches!(
            result,
            Err(Error::Io(ref e)) if e.kind() == std::io::ErrorKind::NotFound
        ));
    }
}
