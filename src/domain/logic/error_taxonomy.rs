//! Mapping between native billing error codes and [`ErrorCode`].
//!
//! Each platform contributes a table of integer codes and a table of named
//! codes. The tables are merged with the shared canonical/legacy name map once,
//! on first use. Every lookup is total: anything unrecognized maps to
//! [`ErrorCode::Unknown`].

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::{
    data::models::{
        play_billing::billing_result_model::billing_response_code as gp,
        store_kit::store_kit_error_model::sk_error_code as sk,
    },
    domain::entities::{
        error_code::{ErrorCode, NativeErrorCode},
        platform::Platform,
    },
};

/// `SKError.Code` values, followed by StoreKit 2 error case names.
const STORE_KIT_INT_CODES: &[(i64, ErrorCode)] = &[
    (sk::UNKNOWN, ErrorCode::Unknown),
    (sk::CLIENT_INVALID, ErrorCode::ServiceError),
    (sk::PAYMENT_CANCELLED, ErrorCode::UserCancelled),
    (sk::PAYMENT_INVALID, ErrorCode::UserError),
    (sk::PAYMENT_NOT_ALLOWED, ErrorCode::UserError),
    (sk::STORE_PRODUCT_NOT_AVAILABLE, ErrorCode::ItemUnavailable),
    (sk::CLOUD_SERVICE_PERMISSION_DENIED, ErrorCode::ServiceError),
    (sk::CLOUD_SERVICE_NETWORK_CONNECTION_FAILED, ErrorCode::NetworkError),
    (sk::CLOUD_SERVICE_REVOKED, ErrorCode::ServiceError),
    (sk::PRIVACY_ACKNOWLEDGEMENT_REQUIRED, ErrorCode::UserError),
    (sk::UNAUTHORIZED_REQUEST_DATA, ErrorCode::DeveloperError),
    (sk::INVALID_OFFER_IDENTIFIER, ErrorCode::DeveloperError),
    (sk::INVALID_SIGNATURE, ErrorCode::DeveloperError),
    (sk::MISSING_OFFER_PARAMS, ErrorCode::DeveloperError),
    (sk::INVALID_OFFER_PRICE, ErrorCode::DeveloperError),
    (sk::OVERLAY_CANCELLED, ErrorCode::UserCancelled),
    (sk::OVERLAY_INVALID_CONFIGURATION, ErrorCode::DeveloperError),
    (sk::OVERLAY_TIMEOUT, ErrorCode::NetworkError),
    (sk::INELIGIBLE_FOR_OFFER, ErrorCode::ItemUnavailable),
    (sk::UNSUPPORTED_PLATFORM, ErrorCode::FeatureNotSupported),
    (sk::OVERLAY_PRESENTED_IN_BACKGROUND_SCENE, ErrorCode::UserError),
];

const STORE_KIT_NAMED_CODES: &[(&str, ErrorCode)] = &[
    ("unknown", ErrorCode::Unknown),
    ("userCancelled", ErrorCode::UserCancelled),
    ("pending", ErrorCode::DeferredPayment),
    ("networkError", ErrorCode::NetworkError),
    ("systemError", ErrorCode::ServiceError),
    ("notAvailableInStorefront", ErrorCode::ItemUnavailable),
    ("productUnavailable", ErrorCode::ItemUnavailable),
    ("notEntitled", ErrorCode::ItemNotOwned),
    ("unsupported", ErrorCode::FeatureNotSupported),
    ("purchaseNotAllowed", ErrorCode::UserError),
    ("invalidQuantity", ErrorCode::DeveloperError),
    ("ineligibleForOffer", ErrorCode::ItemUnavailable),
    ("invalidOfferIdentifier", ErrorCode::DeveloperError),
    ("invalidOfferPrice", ErrorCode::DeveloperError),
    ("invalidOfferSignature", ErrorCode::DeveloperError),
    ("missingOfferParameters", ErrorCode::DeveloperError),
    ("failedVerification", ErrorCode::TransactionValidationFailed),
    ("interrupted", ErrorCode::Interrupted),
];

/// `BillingClient.BillingResponseCode` values. `SERVICE_UNAVAILABLE` precedes
/// the deprecated `SERVICE_TIMEOUT` so it wins the reverse lookup.
const PLAY_BILLING_INT_CODES: &[(i64, ErrorCode)] = &[
    (gp::ERROR, ErrorCode::Unknown),
    (gp::USER_CANCELED, ErrorCode::UserCancelled),
    (gp::SERVICE_UNAVAILABLE, ErrorCode::ServiceError),
    (gp::BILLING_UNAVAILABLE, ErrorCode::BillingUnavailable),
    (gp::ITEM_UNAVAILABLE, ErrorCode::ItemUnavailable),
    (gp::DEVELOPER_ERROR, ErrorCode::DeveloperError),
    (gp::ITEM_ALREADY_OWNED, ErrorCode::AlreadyOwned),
    (gp::ITEM_NOT_OWNED, ErrorCode::ItemNotOwned),
    (gp::NETWORK_ERROR, ErrorCode::NetworkError),
    (gp::SERVICE_DISCONNECTED, ErrorCode::ServiceDisconnected),
    (gp::FEATURE_NOT_SUPPORTED, ErrorCode::FeatureNotSupported),
    (gp::SERVICE_TIMEOUT, ErrorCode::ServiceError),
];

const PLAY_BILLING_NAMED_CODES: &[(&str, ErrorCode)] = &[
    ("ERROR", ErrorCode::Unknown),
    ("USER_CANCELED", ErrorCode::UserCancelled),
    ("SERVICE_UNAVAILABLE", ErrorCode::ServiceError),
    ("BILLING_UNAVAILABLE", ErrorCode::BillingUnavailable),
    ("ITEM_UNAVAILABLE", ErrorCode::ItemUnavailable),
    ("DEVELOPER_ERROR", ErrorCode::DeveloperError),
    ("ITEM_ALREADY_OWNED", ErrorCode::AlreadyOwned),
    ("ITEM_NOT_OWNED", ErrorCode::ItemNotOwned),
    ("NETWORK_ERROR", ErrorCode::NetworkError),
    ("SERVICE_DISCONNECTED", ErrorCode::ServiceDisconnected),
    ("FEATURE_NOT_SUPPORTED", ErrorCode::FeatureNotSupported),
    ("SERVICE_TIMEOUT", ErrorCode::ServiceError),
];

/// Codes raised by the bridge itself rather than a native SDK; valid on both
/// platforms.
const BRIDGE_CODES: &[ErrorCode] = &[
    ErrorCode::Unknown,
    ErrorCode::NotPrepared,
    ErrorCode::NotEnded,
    ErrorCode::AlreadyPrepared,
    ErrorCode::InitConnection,
    ErrorCode::ConnectionClosed,
    ErrorCode::ServiceDisconnected,
    ErrorCode::EmptySkuList,
    ErrorCode::SkuNotFound,
    ErrorCode::QueryProduct,
    ErrorCode::PurchaseError,
    ErrorCode::DeveloperError,
    ErrorCode::FeatureNotSupported,
];

const STORE_KIT_EXTRA_CODES: &[ErrorCode] = &[
    ErrorCode::ReceiptFailed,
    ErrorCode::ReceiptFinished,
    ErrorCode::ReceiptFinishedFailed,
    ErrorCode::SyncError,
    ErrorCode::IapNotAvailable,
];

const PLAY_BILLING_EXTRA_CODES: &[ErrorCode] = &[
    ErrorCode::SkuOfferMismatch,
    ErrorCode::BillingResponseJsonParseError,
    ErrorCode::ActivityUnavailable,
    ErrorCode::Pending,
    ErrorCode::PurchaseVerificationFailed,
    ErrorCode::PurchaseVerificationFinished,
    ErrorCode::PurchaseVerificationFinishFailed,
];

struct PlatformTable {
    by_int: HashMap<i64, ErrorCode>,
    by_name: HashMap<&'static str, ErrorCode>,
    reverse: HashMap<ErrorCode, NativeErrorCode>,
    unknown_sentinel: NativeErrorCode,
    extra: &'static [ErrorCode],
}

impl PlatformTable {
    fn build(
        ints: &'static [(i64, ErrorCode)],
        names: &'static [(&'static str, ErrorCode)],
        unknown_sentinel: i64,
        extra: &'static [ErrorCode],
    ) -> Self {
        let mut reverse = HashMap::new();
        for (raw, code) in ints {
            reverse.entry(*code).or_insert(NativeErrorCode::Int(*raw));
        }
        for (name, code) in names {
            reverse
                .entry(*code)
                .or_insert_with(|| NativeErrorCode::Str(name.to_string()));
        }
        Self {
            by_int: ints.iter().copied().collect(),
            by_name: names.iter().copied().collect(),
            reverse,
            unknown_sentinel: NativeErrorCode::Int(unknown_sentinel),
            extra,
        }
    }
}

static STORE_KIT_TABLE: Lazy<PlatformTable> = Lazy::new(|| {
    PlatformTable::build(
        STORE_KIT_INT_CODES,
        STORE_KIT_NAMED_CODES,
        sk::UNKNOWN,
        STORE_KIT_EXTRA_CODES,
    )
});

static PLAY_BILLING_TABLE: Lazy<PlatformTable> = Lazy::new(|| {
    PlatformTable::build(
        PLAY_BILLING_INT_CODES,
        PLAY_BILLING_NAMED_CODES,
        gp::ERROR,
        PLAY_BILLING_EXTRA_CODES,
    )
});

static CANONICAL_NAMES: Lazy<HashMap<&'static str, ErrorCode>> =
    Lazy::new(|| ErrorCode::ALL.iter().map(|c| (c.as_str(), *c)).collect());

static LEGACY_NAMES: Lazy<HashMap<String, ErrorCode>> =
    Lazy::new(|| ErrorCode::ALL.iter().map(|c| (c.legacy_name(), *c)).collect());

fn table(platform: Platform) -> &'static PlatformTable {
    match platform {
        Platform::Ios => &STORE_KIT_TABLE,
        Platform::Android => &PLAY_BILLING_TABLE,
    }
}

/// Maps a native code onto the canonical taxonomy. Never fails.
///
/// Strings are matched against the canonical names first, then the
/// platform's named codes, then (deprecated) legacy `E_*` names. Numeric
/// strings are treated as integer codes.
pub fn from_platform_code(code: &NativeErrorCode, platform: Platform) -> ErrorCode {
    let table = table(platform);
    let mapped = match code {
        NativeErrorCode::Int(raw) => table.by_int.get(raw).copied(),
        NativeErrorCode::Str(name) => CANONICAL_NAMES
            .get(name.as_str())
            .or_else(|| table.by_name.get(name.as_str()))
            .copied()
            .or_else(|| {
                LEGACY_NAMES.get(name).copied().inspect(|c| {
                    tracing::debug!(legacy = %name, canonical = %c, "deprecated error code name");
                })
            })
            .or_else(|| {
                name.trim()
                    .parse::<i64>()
                    .ok()
                    .and_then(|raw| table.by_int.get(&raw).copied())
            }),
    };
    mapped.unwrap_or_else(|| {
        tracing::warn!(%code, %platform, "unrecognized native error code");
        ErrorCode::Unknown
    })
}

/// Maps a canonical code back to the platform's preferred native code, or the
/// platform's generic error code when there is no native counterpart.
pub fn to_platform_code(code: ErrorCode, platform: Platform) -> NativeErrorCode {
    let table = table(platform);
    table
        .reverse
        .get(&code)
        .cloned()
        .unwrap_or_else(|| table.unknown_sentinel.clone())
}

pub fn is_valid_for_platform(code: ErrorCode, platform: Platform) -> bool {
    let table = table(platform);
    BRIDGE_CODES.contains(&code) || table.extra.contains(&code) || table.reverse.contains_key(&code)
}
