use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Standardized error codes surfaced to callers, regardless of which native
/// billing SDK raised the underlying failure.
///
/// Serialized as the PascalCase variant name (for example `"UserCancelled"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    Unknown,
    UserCancelled,
    UserError,
    ItemUnavailable,
    RemoteError,
    NetworkError,
    ServiceError,
    ReceiptFailed,
    ReceiptFinished,
    ReceiptFinishedFailed,
    NotPrepared,
    NotEnded,
    AlreadyOwned,
    DeveloperError,
    BillingResponseJsonParseError,
    DeferredPayment,
    Interrupted,
    IapNotAvailable,
    PurchaseError,
    SyncError,
    TransactionValidationFailed,
    ActivityUnavailable,
    AlreadyPrepared,
    Pending,
    ConnectionClosed,
    InitConnection,
    ServiceDisconnected,
    QueryProduct,
    SkuNotFound,
    SkuOfferMismatch,
    ItemNotOwned,
    BillingUnavailable,
    FeatureNotSupported,
    EmptySkuList,
    PurchaseVerificationFailed,
    PurchaseVerificationFinished,
    PurchaseVerificationFinishFailed,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 37] = [
        ErrorCode::Unknown,
        ErrorCode::UserCancelled,
        ErrorCode::UserError,
        ErrorCode::ItemUnavailable,
        ErrorCode::RemoteError,
        ErrorCode::NetworkError,
        ErrorCode::ServiceError,
        ErrorCode::ReceiptFailed,
        ErrorCode::ReceiptFinished,
        ErrorCode::ReceiptFinishedFailed,
        ErrorCode::NotPrepared,
        ErrorCode::NotEnded,
        ErrorCode::AlreadyOwned,
        ErrorCode::DeveloperError,
        ErrorCode::BillingResponseJsonParseError,
        ErrorCode::DeferredPayment,
        ErrorCode::Interrupted,
        ErrorCode::IapNotAvailable,
        ErrorCode::PurchaseError,
        ErrorCode::SyncError,
        ErrorCode::TransactionValidationFailed,
        ErrorCode::ActivityUnavailable,
        ErrorCode::AlreadyPrepared,
        ErrorCode::Pending,
        ErrorCode::ConnectionClosed,
        ErrorCode::InitConnection,
        ErrorCode::ServiceDisconnected,
        ErrorCode::QueryProduct,
        ErrorCode::SkuNotFound,
        ErrorCode::SkuOfferMismatch,
        ErrorCode::ItemNotOwned,
        ErrorCode::BillingUnavailable,
        ErrorCode::FeatureNotSupported,
        ErrorCode::EmptySkuList,
        ErrorCode::PurchaseVerificationFailed,
        ErrorCode::PurchaseVerificationFinished,
        ErrorCode::PurchaseVerificationFinishFailed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Unknown => "Unknown",
            ErrorCode::UserCancelled => "UserCancelled",
            ErrorCode::UserError => "UserError",
            ErrorCode::ItemUnavailable => "ItemUnavailable",
            ErrorCode::RemoteError => "RemoteError",
            ErrorCode::NetworkError => "NetworkError",
            ErrorCode::ServiceError => "ServiceError",
            ErrorCode::ReceiptFailed => "ReceiptFailed",
            ErrorCode::ReceiptFinished => "ReceiptFinished",
            ErrorCode::ReceiptFinishedFailed => "ReceiptFinishedFailed",
            ErrorCode::NotPrepared => "NotPrepared",
            ErrorCode::NotEnded => "NotEnded",
            ErrorCode::AlreadyOwned => "AlreadyOwned",
            ErrorCode::DeveloperError => "DeveloperError",
            ErrorCode::BillingResponseJsonParseError => "BillingResponseJsonParseError",
            ErrorCode::DeferredPayment => "DeferredPayment",
            ErrorCode::Interrupted => "Interrupted",
            ErrorCode::IapNotAvailable => "IapNotAvailable",
            ErrorCode::PurchaseError => "PurchaseError",
            ErrorCode::SyncError => "SyncError",
            ErrorCode::TransactionValidationFailed => "TransactionValidationFailed",
            ErrorCode::ActivityUnavailable => "ActivityUnavailable",
            ErrorCode::AlreadyPrepared => "AlreadyPrepared",
            ErrorCode::Pending => "Pending",
            ErrorCode::ConnectionClosed => "ConnectionClosed",
            ErrorCode::InitConnection => "InitConnection",
            ErrorCode::ServiceDisconnected => "ServiceDisconnected",
            ErrorCode::QueryProduct => "QueryProduct",
            ErrorCode::SkuNotFound => "SkuNotFound",
            ErrorCode::SkuOfferMismatch => "SkuOfferMismatch",
            ErrorCode::ItemNotOwned => "ItemNotOwned",
            ErrorCode::BillingUnavailable => "BillingUnavailable",
            ErrorCode::FeatureNotSupported => "FeatureNotSupported",
            ErrorCode::EmptySkuList => "EmptySkuList",
            ErrorCode::PurchaseVerificationFailed => "PurchaseVerificationFailed",
            ErrorCode::PurchaseVerificationFinished => "PurchaseVerificationFinished",
            ErrorCode::PurchaseVerificationFinishFailed => "PurchaseVerificationFinishFailed",
        }
    }

    /// The `E_SCREAMING_SNAKE` spelling used by the previous generation of
    /// the bridge (`UserCancelled` -> `E_USER_CANCELLED`).
    ///
    /// Only read, never emitted.
    pub fn legacy_name(&self) -> String {
        let mut out = String::from("E_");
        for (i, c) in self.as_str().chars().enumerate() {
            if c.is_ascii_uppercase() && i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_uppercase());
        }
        out
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the canonical code names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnrecognizedErrorCode(pub String);

impl FromStr for ErrorCode {
    type Err = UnrecognizedErrorCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorCode::ALL
            .iter()
            .find(|code| code.as_str() == s)
            .copied()
            .ok_or_else(|| UnrecognizedErrorCode(s.to_string()))
    }
}

/// Error code as reported by a native billing SDK.
///
/// StoreKit reports `SKError` integers or StoreKit 2 error case names, Play
/// Billing reports `BillingResponseCode` integers. Hosts may also forward
/// canonical or legacy names as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NativeErrorCode {
    Int(i64),
    Str(String),
}

impl From<i64> for NativeErrorCode {
    fn from(value: i64) -> Self {
        NativeErrorCode::Int(value)
    }
}

impl From<i32> for NativeErrorCode {
    fn from(value: i32) -> Self {
        NativeErrorCode::Int(value as i64)
    }
}

impl From<&str> for NativeErrorCode {
    fn from(value: &str) -> Self {
        NativeErrorCode::Str(value.to_string())
    }
}

impl From<String> for NativeErrorCode {
    fn from(value: String) -> Self {
        NativeErrorCode::Str(value)
    }
}

impl fmt::Display for NativeErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeErrorCode::Int(i) => write!(f, "{i}"),
            NativeErrorCode::Str(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_names_are_screaming_snake() {
        assert_eq!(ErrorCode::UserCancelled.legacy_name(), "E_USER_CANCELLED");
        assert_eq!(ErrorCode::IapNotAvailable.legacy_name(), "E_IAP_NOT_AVAILABLE");
        assert_eq!(ErrorCode::Unknown.legacy_name(), "E_UNKNOWN");
    }

    #[test]
    fn from_str_accepts_only_canonical_names() {
        assert_eq!("SkuNotFound".parse::<ErrorCode>(), Ok(ErrorCode::SkuNotFound));
        assert!("skuNotFound".parse::<ErrorCode>().is_err());
        assert!("E_SKU_NOT_FOUND".parse::<ErrorCode>().is_err());
    }

    #[test]
    fn serializes_as_variant_name() {
        let json = serde_json::to_string(&ErrorCode::EmptySkuList).unwrap();
        assert_eq!(json, "\"EmptySkuList\"");
    }
}
