use chrono::{serde::ts_milliseconds_option, DateTime, Utc};
use serde::Deserialize;

use super::transaction_model::StoreKitTransactionModel;

/// `Product.SubscriptionInfo.Status` for one subscription group.
///
/// https://developer.apple.com/documentation/storekit/product/subscriptioninfo/status
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreKitSubscriptionStatusModel {
    pub state: RenewalState,
    /// The latest transaction for the subscription group.
    pub transaction: StoreKitTransactionModel,
    pub renewal_info: Option<StoreKitRenewalInfoModel>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RenewalState {
    Subscribed,
    Expired,
    InBillingRetryPeriod,
    InGracePeriod,
    Revoked,

    #[serde(untagged)]
    Unknown(String),
}

impl RenewalState {
    /// Whether the customer is entitled to the subscription's content. Billing
    /// retry is excluded: access lapses until the payment issue is resolved.
    pub(crate) fn grants_access(&self) -> bool {
        matches!(self, RenewalState::Subscribed | RenewalState::InGracePeriod)
    }
}

/// `Product.SubscriptionInfo.RenewalInfo`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreKitRenewalInfoModel {
    #[serde(default)]
    pub will_auto_renew: bool,
    /// The product that renews at the next billing period.
    pub auto_renew_preference: Option<String>,
    pub expiration_reason: Option<String>,
    #[serde(default, with = "ts_milliseconds_option")]
    pub renewal_date: Option<DateTime<Utc>>,
    #[serde(default, with = "ts_milliseconds_option")]
    pub grace_period_expiration_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_in_billing_retry: bool,
    pub jws_representation: Option<String>,
}
