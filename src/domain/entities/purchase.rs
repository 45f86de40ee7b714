use chrono::{
    serde::{ts_milliseconds, ts_milliseconds_option},
    DateTime, Utc,
};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use super::platform::Platform;

/// Canonical purchase record, discriminated by `platform`.
///
/// Both variants share the common fields (`id`, `productId`,
/// `transactionDate`, `purchaseToken`, ...); platform-only data lives in the
/// suffixed fields of each variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "platform", rename_all = "lowercase")]
pub enum Purchase {
    Ios(PurchaseIos),
    Android(PurchaseAndroid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PurchaseState {
    Pending,
    Purchased,
    Unknown,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseIos {
    pub id: String,
    pub ids: Option<Vec<String>>,
    pub product_id: String,
    /// Deprecated alias of `id` kept for StoreKit 1 era consumers.
    pub transaction_id: Option<String>,
    #[serde(with = "ts_milliseconds")]
    pub transaction_date: DateTime<Utc>,
    /// JWS representation of the transaction.
    pub purchase_token: Option<String>,
    pub purchase_state: PurchaseState,
    pub quantity: i32,
    pub is_auto_renewing: bool,
    #[serde(rename = "originalTransactionIdentifierIOS")]
    pub original_transaction_identifier_ios: Option<String>,
    #[serde(
        rename = "originalTransactionDateIOS",
        default,
        with = "ts_milliseconds_option"
    )]
    pub original_transaction_date_ios: Option<DateTime<Utc>>,
    #[serde(rename = "expirationDateIOS", default, with = "ts_milliseconds_option")]
    pub expiration_date_ios: Option<DateTime<Utc>>,
    #[serde(rename = "revocationDateIOS", default, with = "ts_milliseconds_option")]
    pub revocation_date_ios: Option<DateTime<Utc>>,
    #[serde(rename = "revocationReasonIOS")]
    pub revocation_reason_ios: Option<String>,
    #[serde(rename = "appAccountTokenIOS")]
    pub app_account_token_ios: Option<String>,
    #[serde(rename = "environmentIOS")]
    pub environment_ios: Option<String>,
    #[serde(rename = "ownershipTypeIOS")]
    pub ownership_type_ios: Option<String>,
    #[serde(rename = "subscriptionGroupIdIOS")]
    pub subscription_group_id_ios: Option<String>,
    #[serde(rename = "webOrderLineItemIdIOS")]
    pub web_order_line_item_id_ios: Option<String>,
    #[serde(rename = "isUpgradedIOS")]
    pub is_upgraded_ios: Option<bool>,
    #[serde(rename = "reasonIOS")]
    pub reason_ios: Option<String>,
    #[serde(rename = "storefrontCountryCodeIOS")]
    pub storefront_country_code_ios: Option<String>,
    #[serde(rename = "offerIOS")]
    pub offer_ios: Option<PurchaseOfferIos>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOfferIos {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub offer_type: String,
    pub payment_mode: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseAndroid {
    pub id: String,
    pub ids: Option<Vec<String>>,
    pub product_id: String,
    /// Deprecated; the Play order id.
    pub transaction_id: Option<String>,
    #[serde(with = "ts_milliseconds")]
    pub transaction_date: DateTime<Utc>,
    pub purchase_token: Option<String>,
    pub purchase_state: PurchaseState,
    pub quantity: i32,
    pub is_auto_renewing: bool,
    /// The signed purchase JSON.
    pub data_android: Option<String>,
    pub signature_android: Option<String>,
    pub auto_renewing_android: Option<bool>,
    pub is_acknowledged_android: Option<bool>,
    pub package_name_android: Option<String>,
    pub obfuscated_account_id_android: Option<String>,
    pub obfuscated_profile_id_android: Option<String>,
    pub developer_payload_android: Option<String>,
}

impl Purchase {
    pub fn platform(&self) -> Platform {
        match self {
            Purchase::Ios(_) => Platform::Ios,
            Purchase::Android(_) => Platform::Android,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Purchase::Ios(p) => &p.id,
            Purchase::Android(p) => &p.id,
        }
    }

    pub fn product_id(&self) -> &str {
        match self {
            Purchase::Ios(p) => &p.product_id,
            Purchase::Android(p) => &p.product_id,
        }
    }

    /// Every product id covered by the purchase, `productId` first.
    pub fn product_ids(&self) -> Vec<&str> {
        let ids = match self {
            Purchase::Ios(p) => p.ids.as_deref(),
            Purchase::Android(p) => p.ids.as_deref(),
        };
        let mut out = vec![self.product_id()];
        for id in ids.unwrap_or_default() {
            if !out.contains(&id.as_str()) {
                out.push(id.as_str());
            }
        }
        out
    }

    pub fn transaction_id(&self) -> Option<&str> {
        match self {
            Purchase::Ios(p) => p.transaction_id.as_deref(),
            Purchase::Android(p) => p.transaction_id.as_deref(),
        }
    }

    pub fn transaction_date(&self) -> DateTime<Utc> {
        match self {
            Purchase::Ios(p) => p.transaction_date,
            Purchase::Android(p) => p.transaction_date,
        }
    }

    pub fn purchase_token(&self) -> Option<&str> {
        match self {
            Purchase::Ios(p) => p.purchase_token.as_deref(),
            Purchase::Android(p) => p.purchase_token.as_deref(),
        }
    }

    pub fn purchase_state(&self) -> PurchaseState {
        match self {
            Purchase::Ios(p) => p.purchase_state,
            Purchase::Android(p) => p.purchase_state,
        }
    }

    pub(crate) fn set_id(&mut self, id: String) {
        match self {
            Purchase::Ios(p) => p.id = id,
            Purchase::Android(p) => p.id = id,
        }
    }
}
