use serde::Serialize;

/// Arguments for `BillingClient.launchBillingFlow`, ready for the host to
/// turn into `BillingFlowParams`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingFlowParamsModel {
    /// `inapp` or `subs`.
    pub product_type: String,
    pub product_details_params: Vec<ProductDetailsParamsModel>,
    pub obfuscated_account_id: Option<String>,
    pub obfuscated_profile_id: Option<String>,
    pub is_offer_personalized: bool,
    /// Present when the flow replaces an existing subscription.
    pub subscription_update: Option<SubscriptionUpdateParamsModel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailsParamsModel {
    pub product_id: String,
    /// Mandatory for subscriptions, absent for one-time products.
    pub offer_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionUpdateParamsModel {
    pub old_purchase_token: String,
    /// `BillingFlowParams.SubscriptionUpdateParams.ReplacementMode` raw value.
    pub replacement_mode: i32,
}
