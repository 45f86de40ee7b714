use serde::Deserialize;

use crate::domain::entities::error_code::NativeErrorCode;

/// `BillingClient.BillingResponseCode` raw values.
///
/// https://developer.android.com/reference/com/android/billingclient/api/BillingClient.BillingResponseCode
pub mod billing_response_code {
    /// Deprecated upstream in favour of `SERVICE_UNAVAILABLE`.
    pub const SERVICE_TIMEOUT: i64 = -3;
    pub const FEATURE_NOT_SUPPORTED: i64 = -2;
    pub const SERVICE_DISCONNECTED: i64 = -1;
    pub const OK: i64 = 0;
    pub const USER_CANCELED: i64 = 1;
    pub const SERVICE_UNAVAILABLE: i64 = 2;
    pub const BILLING_UNAVAILABLE: i64 = 3;
    pub const ITEM_UNAVAILABLE: i64 = 4;
    pub const DEVELOPER_ERROR: i64 = 5;
    pub const ERROR: i64 = 6;
    pub const ITEM_ALREADY_OWNED: i64 = 7;
    pub const ITEM_NOT_OWNED: i64 = 8;
    pub const NETWORK_ERROR: i64 = 12;
}

/// `BillingResult` as returned by every Play Billing call and listener.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingResultModel {
    pub response_code: i64,
    #[serde(default)]
    pub debug_message: String,
    /// Set by the host when the failing call concerned a single product.
    pub product_id: Option<String>,
}

impl BillingResultModel {
    pub fn new(response_code: i64, debug_message: impl Into<String>) -> Self {
        Self {
            response_code,
            debug_message: debug_message.into(),
            product_id: None,
        }
    }

    pub fn for_product(mut self, product_id: impl Into<String>) -> Self {
        self.product_id = Some(product_id.into());
        self
    }

    pub fn is_ok(&self) -> bool {
        self.response_code == billing_response_code::OK
    }

    pub(crate) fn native_code(&self) -> NativeErrorCode {
        NativeErrorCode::Int(self.response_code)
    }
}
