use serde::Deserialize;

use super::common::{Environment, OfferDiscountType, OfferType, TransactionReason};

type TimestampType = i64;

/// Subset of the decoded payload of a JWSTransaction that is used to fill
/// fields missing from the host's transaction model.
///
/// https://developer.apple.com/documentation/appstoreserverapi/jwstransactiondecodedpayload
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JwsTransactionPayloadModel {
    /// A UUID that associates the transaction with a customer on your own
    /// service. Empty when the app did not provide one.
    pub(crate) app_account_token: Option<String>,
    pub(crate) environment: Option<Environment>,
    /// The UNIX time, in milliseconds, that the subscription expires or renews.
    pub(crate) expires_date: Option<TimestampType>,
    pub(crate) offer_discount_type: Option<OfferDiscountType>,
    pub(crate) offer_identifier: Option<String>,
    pub(crate) offer_type: Option<OfferType>,
    /// The three-letter code of the App Store storefront country or region.
    pub(crate) storefront: Option<String>,
    pub(crate) transaction_reason: Option<TransactionReason>,
}
