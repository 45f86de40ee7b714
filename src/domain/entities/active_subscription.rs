use chrono::{
    serde::{ts_milliseconds, ts_milliseconds_option},
    DateTime, Utc,
};
use serde::Serialize;
use serde_with::skip_serializing_none;

use super::platform::Platform;

/// Current state of one subscription product, derived from entitlement or
/// status queries at call time. Never cached.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSubscription {
    pub product_id: String,
    pub is_active: bool,
    pub transaction_id: String,
    pub purchase_token: Option<String>,
    #[serde(with = "ts_milliseconds")]
    pub transaction_date: DateTime<Utc>,
    pub platform: Platform,
    /// True when a subscription that has not expired yet expires within seven
    /// days.
    pub will_expire_soon: Option<bool>,
    #[serde(rename = "expirationDateIOS", with = "ts_milliseconds_option")]
    pub expiration_date_ios: Option<DateTime<Utc>>,
    #[serde(rename = "daysUntilExpirationIOS")]
    pub days_until_expiration_ios: Option<i64>,
    #[serde(rename = "environmentIOS")]
    pub environment_ios: Option<String>,
    #[serde(rename = "renewalInfoIOS")]
    pub renewal_info_ios: Option<RenewalInfoIos>,
    pub auto_renewing_android: Option<bool>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewalInfoIos {
    pub will_auto_renew: bool,
    pub auto_renew_preference: Option<String>,
    pub expiration_reason: Option<String>,
    #[serde(with = "ts_milliseconds_option")]
    pub renewal_date: Option<DateTime<Utc>>,
    #[serde(with = "ts_milliseconds_option")]
    pub grace_period_expiration_date: Option<DateTime<Utc>>,
    pub is_in_billing_retry: bool,
    pub jws_representation: Option<String>,
}
