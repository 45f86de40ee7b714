use serde::Deserialize;

use crate::domain::entities::error_code::NativeErrorCode;

/// `SKError.Code` raw values.
///
/// https://developer.apple.com/documentation/storekit/skerror/code
pub mod sk_error_code {
    pub const UNKNOWN: i64 = 0;
    pub const CLIENT_INVALID: i64 = 1;
    pub const PAYMENT_CANCELLED: i64 = 2;
    pub const PAYMENT_INVALID: i64 = 3;
    pub const PAYMENT_NOT_ALLOWED: i64 = 4;
    pub const STORE_PRODUCT_NOT_AVAILABLE: i64 = 5;
    pub const CLOUD_SERVICE_PERMISSION_DENIED: i64 = 6;
    pub const CLOUD_SERVICE_NETWORK_CONNECTION_FAILED: i64 = 7;
    pub const CLOUD_SERVICE_REVOKED: i64 = 8;
    pub const PRIVACY_ACKNOWLEDGEMENT_REQUIRED: i64 = 9;
    pub const UNAUTHORIZED_REQUEST_DATA: i64 = 10;
    pub const INVALID_OFFER_IDENTIFIER: i64 = 11;
    pub const INVALID_SIGNATURE: i64 = 12;
    pub const MISSING_OFFER_PARAMS: i64 = 13;
    pub const INVALID_OFFER_PRICE: i64 = 14;
    pub const OVERLAY_CANCELLED: i64 = 15;
    pub const OVERLAY_INVALID_CONFIGURATION: i64 = 16;
    pub const OVERLAY_TIMEOUT: i64 = 17;
    pub const INELIGIBLE_FOR_OFFER: i64 = 18;
    pub const UNSUPPORTED_PLATFORM: i64 = 19;
    pub const OVERLAY_PRESENTED_IN_BACKGROUND_SCENE: i64 = 20;
}

/// Failure reported by the StoreKit host, either as an `SKError` code or as a
/// StoreKit 2 error case name (`userCancelled`, `notEntitled`, ...).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreKitErrorModel {
    pub code: NativeErrorCode,
    pub message: String,
    /// Set when the failure concerns a single product.
    pub product_id: Option<String>,
    /// `localizedDescription` of the underlying `NSError`, if any.
    pub underlying_description: Option<String>,
}

impl StoreKitErrorModel {
    pub fn new(code: impl Into<NativeErrorCode>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            product_id: None,
            underlying_description: None,
        }
    }

    pub fn for_product(mut self, product_id: impl Into<String>) -> Self {
        self.product_id = Some(product_id.into());
        self
    }
}
