use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::Deserialize;
use serde_repr::Deserialize_repr;

/// A Play Billing `Purchase`.
///
/// https://developer.android.com/reference/com/android/billingclient/api/Purchase
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayBillingPurchaseModel {
    /// The unique order identifier. Absent for pending purchases and for
    /// test purchases made with license testers.
    pub order_id: Option<String>,
    /// Token that uniquely identifies the purchase for a given item and user.
    pub purchase_token: String,
    /// Product ids in the purchase; more than one for multi-line purchases.
    pub products: Vec<String>,
    /// The time the product was purchased, in milliseconds since the epoch.
    #[serde(with = "ts_milliseconds")]
    pub purchase_time: DateTime<Utc>,
    pub purchase_state: PurchaseStateModel,
    #[serde(default)]
    pub is_acknowledged: bool,
    #[serde(default)]
    pub is_auto_renewing: bool,
    pub package_name: Option<String>,
    /// String containing the signature of the purchase data signed with the
    /// developer's private key.
    pub signature: Option<String>,
    /// The purchase data in JSON format, as signed by Play.
    pub original_json: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub obfuscated_account_id: Option<String>,
    pub obfuscated_profile_id: Option<String>,
    pub developer_payload: Option<String>,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize_repr)]
#[repr(u8)]
pub enum PurchaseStateModel {
    #[default]
    Unspecified = 0,
    Purchased = 1,
    Pending = 2,
}
