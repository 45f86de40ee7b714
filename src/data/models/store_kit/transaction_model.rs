use chrono::{
    serde::{ts_milliseconds, ts_milliseconds_option},
    DateTime, Utc,
};
use serde::Deserialize;

use super::common::{
    Environment, OfferDiscountType, OfferType, OwnershipType, RevocationReason, TransactionReason,
};

/// A StoreKit 2 `Transaction` as handed over by the host, together with its
/// JWS representation.
///
/// https://developer.apple.com/documentation/storekit/transaction
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreKitTransactionModel {
    /// The unique identifier for the transaction.
    pub id: String,
    /// The original transaction identifier of a purchase.
    pub original_id: Option<String>,
    /// `SKPaymentTransaction.transactionIdentifier` from StoreKit 1 hosts.
    /// Deprecated; read only so that legacy hosts keep working.
    pub transaction_id: Option<String>,
    /// The product identifier of the in-app purchase.
    pub product_id: String,
    /// The date that the App Store charged the user's account.
    #[serde(with = "ts_milliseconds")]
    pub purchase_date: DateTime<Utc>,
    /// The date of purchase for the original transaction.
    #[serde(default, with = "ts_milliseconds_option")]
    pub original_purchase_date: Option<DateTime<Utc>>,
    /// The date the subscription expires or renews.
    #[serde(default, with = "ts_milliseconds_option")]
    pub expiration_date: Option<DateTime<Utc>>,
    /// The date that the App Store refunded the transaction or revoked it from
    /// Family Sharing.
    #[serde(default, with = "ts_milliseconds_option")]
    pub revocation_date: Option<DateTime<Utc>>,
    pub revocation_reason: Option<RevocationReason>,
    /// The number of consumable products purchased.
    #[serde(default = "default_quantity")]
    pub purchased_quantity: i32,
    pub app_account_token: Option<String>,
    pub environment: Option<Environment>,
    pub ownership_type: Option<OwnershipType>,
    pub subscription_group_id: Option<String>,
    pub web_order_line_item_id: Option<String>,
    /// Whether the user upgraded to another subscription.
    #[serde(default)]
    pub is_upgraded: bool,
    pub reason: Option<TransactionReason>,
    pub storefront_country_code: Option<String>,
    /// The subscription offer that applies to the transaction.
    pub offer: Option<StoreKitOfferModel>,
    /// The signed JWS form of the transaction.
    pub jws_representation: Option<String>,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreKitOfferModel {
    /// The offer code or promotional offer identifier. Absent for
    /// introductory offers.
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub offer_type: OfferType,
    pub payment_mode: Option<OfferDiscountType>,
}
