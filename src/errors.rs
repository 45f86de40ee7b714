use std::fmt::Debug;

use serde::Serialize;
use serde_with::skip_serializing_none;

use crate::domain::{
    entities::{
        error_code::{ErrorCode, NativeErrorCode},
        platform::Platform,
    },
    logic::error_taxonomy,
};

/// Canonical error surfaced by every bridge operation and carried by
/// `purchase-error` events.
///
/// Fields are private: bridge-originated errors are built through the
/// per-kind types below, native failures through [`PurchaseError::from_native`].
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{code}: {message}")]
pub struct PurchaseError {
    code: ErrorCode,
    message: String,
    response_code: Option<i64>,
    debug_message: Option<String>,
    product_id: Option<String>,
    platform: Option<Platform>,
}

impl PurchaseError {
    pub(crate) fn with_code(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            response_code: None,
            debug_message: None,
            product_id: None,
            platform: None,
        }
    }

    /// Translates a native code through the error taxonomy. Numeric native
    /// codes are kept in `response_code`.
    pub(crate) fn from_native(
        code: &NativeErrorCode,
        platform: Platform,
        message: impl Into<String>,
    ) -> Self {
        let mut error = Self::with_code(
            error_taxonomy::from_platform_code(code, platform),
            message,
        );
        error.platform = Some(platform);
        if let NativeErrorCode::Int(raw) = code {
            error.response_code = Some(*raw);
        }
        error
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn response_code(&self) -> Option<i64> {
        self.response_code
    }

    pub fn debug_message(&self) -> Option<&str> {
        self.debug_message.as_deref()
    }

    pub fn product_id(&self) -> Option<&str> {
        self.product_id.as_deref()
    }

    pub fn platform(&self) -> Option<Platform> {
        self.platform
    }

    pub(crate) fn with_product_id(mut self, product_id: impl Into<String>) -> Self {
        self.product_id = Some(product_id.into());
        self
    }

    pub(crate) fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub(crate) fn with_debug_message(mut self, debug_message: impl Into<String>) -> Self {
        self.debug_message = Some(debug_message.into());
        self
    }

    /// Attaches a native failure to a bridge-level error, keeping its raw
    /// code and description for diagnostics.
    pub(crate) fn caused_by(mut self, cause: &PurchaseError) -> Self {
        self.response_code = cause.response_code;
        self.platform = cause.platform.or(self.platform);
        self.debug_message = Some(cause.to_string());
        self
    }
}

macro_rules! define_purchase_error_type {
    ($name:ident, $code:expr, $text:expr) => {
        pub struct $name;

        #[allow(dead_code)]
        impl $name {
            pub(crate) fn new(details: &str) -> PurchaseError {
                PurchaseError::with_code($code, format!("{} {}", $text, details).trim_end())
            }

            pub(crate) fn with_debug(details: &str, debug: &impl Debug) -> PurchaseError {
                Self::new(details).with_debug_message(format!("{:?}", debug))
            }
        }
    };
}

define_purchase_error_type!(
    NotPrepared,
    ErrorCode::NotPrepared,
    "Billing connection is not initialized; call initConnection first."
);
define_purchase_error_type!(
    InitConnectionFailed,
    ErrorCode::InitConnection,
    "Failed to initialize the billing connection."
);
define_purchase_error_type!(
    ServiceDisconnected,
    ErrorCode::ServiceDisconnected,
    "Billing connection was closed."
);
define_purchase_error_type!(
    EmptySkuList,
    ErrorCode::EmptySkuList,
    "At least one SKU is required."
);
define_purchase_error_type!(
    SkuNotFound,
    ErrorCode::SkuNotFound,
    "Product was not fetched before purchase."
);
define_purchase_error_type!(
    SkuOfferMismatch,
    ErrorCode::SkuOfferMismatch,
    "Subscription offers do not match the requested SKUs."
);
define_purchase_error_type!(
    DeveloperError,
    ErrorCode::DeveloperError,
    "Invalid request."
);
define_purchase_error_type!(
    FeatureNotSupported,
    ErrorCode::FeatureNotSupported,
    "Operation is not supported on this platform."
);
define_purchase_error_type!(
    ItemNotOwned,
    ErrorCode::ItemNotOwned,
    "No transaction found for the product."
);
define_purchase_error_type!(
    MalformedNativePurchase,
    ErrorCode::PurchaseError,
    "Native purchase record could not be read."
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_constructors_set_code_and_text() {
        let e = EmptySkuList::new("");
        assert_eq!(e.code(), ErrorCode::EmptySkuList);
        assert_eq!(e.message(), "At least one SKU is required.");

        let e = DeveloperError::with_debug("missing sku", &("ios", 1));
        assert_eq!(e.code(), ErrorCode::DeveloperError);
        assert_eq!(e.message(), "Invalid request. missing sku");
        assert_eq!(e.debug_message(), Some("(\"ios\", 1)"));
    }

    #[test]
    fn native_integer_codes_are_kept_as_response_code() {
        let e = PurchaseError::from_native(&NativeErrorCode::Int(1), Platform::Android, "cancel");
        assert_eq!(e.code(), ErrorCode::UserCancelled);
        assert_eq!(e.response_code(), Some(1));
        assert_eq!(e.platform(), Some(Platform::Android));
    }

    #[test]
    fn serializes_without_absent_fields() {
        let e = NotPrepared::new("").with_product_id("p1");
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["code"], "NotPrepared");
        assert_eq!(json["productId"], "p1");
        assert!(json.get("responseCode").is_none());
    }
}
