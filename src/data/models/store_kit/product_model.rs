use serde::Deserialize;

/// A StoreKit 2 `Product`, flattened by the host.
///
/// https://developer.apple.com/documentation/storekit/product
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreKitProductModel {
    pub id: String,
    pub display_name: String,
    pub description: String,
    /// Localized price string, for example `"$0.99"`.
    pub display_price: String,
    pub price: f64,
    pub currency_code: Option<String>,
    #[serde(rename = "type")]
    pub product_type: StoreKitProductType,
    #[serde(default)]
    pub is_family_shareable: bool,
    pub subscription: Option<StoreKitSubscriptionInfoModel>,
    /// The raw JSON representation of the product, as returned by StoreKit.
    pub json_representation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StoreKitProductType {
    Consumable,
    NonConsumable,
    AutoRenewable,
    NonRenewable,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreKitSubscriptionInfoModel {
    pub subscription_group_id: String,
    /// `day`, `week`, `month` or `year`.
    pub period_unit: String,
    pub period_value: i32,
    pub introductory_offer_display_price: Option<String>,
}
