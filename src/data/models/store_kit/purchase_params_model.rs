use serde::Serialize;

/// Arguments for `Product.purchase(options:)`, ready for the host to apply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreKitPurchaseParamsModel {
    pub product_id: String,
    pub quantity: i32,
    /// Becomes `Product.PurchaseOption.appAccountToken`; must be a UUID.
    pub app_account_token: Option<String>,
    pub promotional_offer: Option<StoreKitPromotionalOfferModel>,
    /// When set, the host finishes the transaction itself right after it is
    /// delivered.
    pub finish_automatically: bool,
}

/// Signed promotional offer, becomes
/// `Product.PurchaseOption.promotionalOffer(offerID:keyID:nonce:signature:timestamp:)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreKitPromotionalOfferModel {
    pub offer_id: String,
    pub key_id: String,
    pub nonce: String,
    pub signature: String,
    pub timestamp: i64,
}
