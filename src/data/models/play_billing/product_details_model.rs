use serde::Deserialize;

/// A Play Billing `ProductDetails`.
///
/// https://developer.android.com/reference/com/android/billingclient/api/ProductDetails
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayProductDetailsModel {
    pub product_id: String,
    /// `inapp` or `subs`.
    pub product_type: String,
    pub title: String,
    pub name: String,
    pub description: String,
    pub one_time_purchase_offer_details: Option<OneTimePurchaseOfferDetailsModel>,
    pub subscription_offer_details: Option<Vec<SubscriptionOfferDetailsModel>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OneTimePurchaseOfferDetailsModel {
    pub formatted_price: String,
    pub price_amount_micros: i64,
    pub price_currency_code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionOfferDetailsModel {
    pub base_plan_id: String,
    pub offer_id: Option<String>,
    /// Required to launch a billing flow for this offer.
    pub offer_token: String,
    #[serde(default)]
    pub offer_tags: Vec<String>,
    pub pricing_phases: Vec<PricingPhaseModel>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingPhaseModel {
    pub formatted_price: String,
    pub price_amount_micros: i64,
    pub price_currency_code: String,
    /// ISO 8601 duration, for example `P1M`.
    pub billing_period: String,
    pub billing_cycle_count: i32,
    pub recurrence_mode: i32,
}
