use serde::{Deserialize, Serialize};

use super::{
    product::{ProductQueryType, ProductType},
    purchase::Purchase,
};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchProductsRequest {
    pub skus: Vec<String>,
    #[serde(rename = "type", default)]
    pub query_type: ProductQueryType,
}

/// Platform-agnostic purchase request. Only the branch for the running
/// platform is read.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPurchaseProps {
    pub request: RequestPurchasePropsByPlatforms,
    #[serde(rename = "type")]
    pub product_type: ProductType,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RequestPurchasePropsByPlatforms {
    pub ios: Option<RequestPurchaseIosProps>,
    pub android: Option<RequestPurchaseAndroidProps>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPurchaseIosProps {
    pub sku: String,
    pub quantity: Option<i32>,
    pub app_account_token: Option<String>,
    pub with_offer: Option<DiscountOfferInputIos>,
    pub and_dangerously_finish_transaction_automatically: Option<bool>,
}

/// Server-signed promotional offer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountOfferInputIos {
    pub identifier: String,
    pub key_identifier: String,
    pub nonce: String,
    pub signature: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPurchaseAndroidProps {
    pub skus: Vec<String>,
    pub obfuscated_account_id_android: Option<String>,
    pub obfuscated_profile_id_android: Option<String>,
    pub is_offer_personalized: Option<bool>,
    /// Required for subscriptions: one offer token per SKU.
    pub subscription_offers: Option<Vec<AndroidSubscriptionOfferInput>>,
    /// Token of the subscription being replaced (upgrade/downgrade).
    pub purchase_token_android: Option<String>,
    pub replacement_mode_android: Option<ReplacementModeAndroid>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidSubscriptionOfferInput {
    pub sku: String,
    pub offer_token: String,
}

/// `SubscriptionUpdateParams.ReplacementMode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplacementModeAndroid {
    UnknownReplacementMode,
    WithTimeProration,
    ChargeProratedPrice,
    WithoutProration,
    ChargeFullPrice,
    Deferred,
}

impl ReplacementModeAndroid {
    pub fn raw_value(&self) -> i32 {
        match self {
            ReplacementModeAndroid::UnknownReplacementMode => 0,
            ReplacementModeAndroid::WithTimeProration => 1,
            ReplacementModeAndroid::ChargeProratedPrice => 2,
            ReplacementModeAndroid::WithoutProration => 3,
            ReplacementModeAndroid::ChargeFullPrice => 5,
            ReplacementModeAndroid::Deferred => 6,
        }
    }
}

/// A request that passed validation, resolved to the running platform's
/// branch.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformPurchaseRequest {
    Ios(RequestPurchaseIosProps),
    Android {
        props: RequestPurchaseAndroidProps,
        product_type: ProductType,
    },
}

impl PlatformPurchaseRequest {
    /// The SKU the request is correlated under.
    pub fn primary_sku(&self) -> &str {
        match self {
            PlatformPurchaseRequest::Ios(props) => &props.sku,
            PlatformPurchaseRequest::Android { props, .. } => {
                props.skus.first().map(String::as_str).unwrap_or_default()
            }
        }
    }

    pub fn is_subscription_replacement(&self) -> bool {
        matches!(
            self,
            PlatformPurchaseRequest::Android { props, .. } if props.purchase_token_android.is_some()
        )
    }
}

/// iOS purchases resolve to one record, Play Billing flows to a list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PurchaseResult {
    Single(Purchase),
    Multiple(Vec<Purchase>),
}

impl PurchaseResult {
    pub fn into_vec(self) -> Vec<Purchase> {
        match self {
            PurchaseResult::Single(p) => vec![p],
            PurchaseResult::Multiple(ps) => ps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishTransactionProps {
    pub purchase: Purchase,
    #[serde(default)]
    pub is_consumable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PurchaseOptions {
    /// Re-emit every returned purchase as a `purchase-updated` event.
    #[serde(rename = "alsoPublishToEventListenerIOS", default)]
    pub also_publish_to_event_listener_ios: bool,
    /// Return current entitlements only instead of the full history.
    #[serde(rename = "onlyIncludeActiveItemsIOS", default)]
    pub only_include_active_items_ios: bool,
}
