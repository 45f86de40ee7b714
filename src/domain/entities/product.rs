use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductType {
    InApp,
    Subs,
}

/// Product type filter for queries; `All` covers both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductQueryType {
    #[default]
    InApp,
    Subs,
    All,
}

impl ProductQueryType {
    pub fn includes(&self, product_type: ProductType) -> bool {
        match self {
            ProductQueryType::InApp => product_type == ProductType::InApp,
            ProductQueryType::Subs => product_type == ProductType::Subs,
            ProductQueryType::All => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "platform", rename_all = "lowercase")]
pub enum Product {
    Ios(ProductIos),
    Android(ProductAndroid),
}

impl Product {
    pub fn id(&self) -> &str {
        match self {
            Product::Ios(p) => &p.id,
            Product::Android(p) => &p.id,
        }
    }

    pub fn product_type(&self) -> ProductType {
        match self {
            Product::Ios(p) => p.product_type,
            Product::Android(p) => p.product_type,
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductIos {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub display_price: String,
    pub currency: Option<String>,
    pub price: Option<f64>,
    #[serde(rename = "displayNameIOS")]
    pub display_name_ios: String,
    #[serde(rename = "isFamilyShareableIOS")]
    pub is_family_shareable_ios: bool,
    /// `consumable`, `non-consumable`, `auto-renewable` or `non-renewing`.
    #[serde(rename = "typeIOS")]
    pub type_ios: String,
    #[serde(rename = "subscriptionInfoIOS")]
    pub subscription_info_ios: Option<SubscriptionInfoIos>,
    #[serde(rename = "jsonRepresentationIOS")]
    pub json_representation_ios: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionInfoIos {
    pub subscription_group_id: String,
    pub subscription_period_unit: String,
    pub subscription_period_value: i32,
    pub introductory_offer_display_price: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAndroid {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub display_price: String,
    pub currency: Option<String>,
    pub price: Option<f64>,
    pub name_android: String,
    pub subscription_offer_details_android: Option<Vec<SubscriptionOfferAndroid>>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionOfferAndroid {
    pub base_plan_id: String,
    pub offer_id: Option<String>,
    pub offer_token: String,
    pub offer_tags: Vec<String>,
    pub pricing_phases: Vec<PricingPhaseAndroid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingPhaseAndroid {
    pub formatted_price: String,
    pub price_amount_micros: i64,
    pub price_currency_code: String,
    pub billing_period: String,
    pub billing_cycle_count: i32,
    pub recurrence_mode: i32,
}
