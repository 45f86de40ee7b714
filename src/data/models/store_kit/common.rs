use serde::Deserialize;
use serde_repr::Deserialize_repr;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum Environment {
    /// Indicates that the data applies to testing in the sandbox environment.
    Sandbox,
    /// Indicates that the data applies to the production environment.
    Production,
    /// Indicates that the data applies to StoreKit Testing in Xcode.
    Xcode,

    #[serde(untagged)]
    Unknown(String),
}

impl Environment {
    pub(crate) fn as_str(&self) -> &str {
        match self {
            Environment::Sandbox => "Sandbox",
            Environment::Production => "Production",
            Environment::Xcode => "Xcode",
            Environment::Unknown(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferDiscountType {
    /// A payment mode of a product discount that indicates a free trial.
    FreeTrial,
    /// A payment mode of a product discount that customers pay over a single or
    /// multiple billing periods.
    PayAsYouGo,
    /// A payment mode of a product discount that customers pay up front.
    PayUpFront,

    #[serde(untagged)]
    Unknown(String),
}

impl OfferDiscountType {
    pub(crate) fn as_str(&self) -> &str {
        match self {
            OfferDiscountType::FreeTrial => "FREE_TRIAL",
            OfferDiscountType::PayAsYouGo => "PAY_AS_YOU_GO",
            OfferDiscountType::PayUpFront => "PAY_UP_FRONT",
            OfferDiscountType::Unknown(s) => s,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize_repr)]
#[repr(u8)]
pub enum OfferType {
    /// An introductory offer.
    Introductory = 1,
    /// A promotional offer.
    Promotional = 2,
    /// An offer with a subscription offer code.
    OfferCode = 3,
    /// A win-back offer.
    WinBack = 4,
}

impl OfferType {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            OfferType::Introductory => "introductory",
            OfferType::Promotional => "promotional",
            OfferType::OfferCode => "code",
            OfferType::WinBack => "win-back",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OwnershipType {
    /// The transaction belongs to a family member who benefits from service.
    FamilyShared,
    /// The transaction belongs to the purchaser.
    Purchased,

    #[serde(untagged)]
    Unknown(String),
}

impl OwnershipType {
    pub(crate) fn as_str(&self) -> &str {
        match self {
            OwnershipType::FamilyShared => "FAMILY_SHARED",
            OwnershipType::Purchased => "PURCHASED",
            OwnershipType::Unknown(s) => s,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize_repr)]
#[repr(u8)]
pub enum RevocationReason {
    /// The App Store refunded the transaction on behalf of the customer for
    /// other reasons, for example, an accidental purchase.
    Other = 0,
    /// The App Store refunded the transaction on behalf of the customer due to
    /// an actual or perceived issue within your app.
    Issue = 1,
}

impl RevocationReason {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            RevocationReason::Other => "other",
            RevocationReason::Issue => "developer-issue",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionReason {
    /// The customer initiated the purchase.
    Purchase,
    /// The App Store initiated the purchase transaction to renew an
    /// auto-renewable subscription.
    Renewal,

    #[serde(untagged)]
    Unknown(String),
}

impl TransactionReason {
    pub(crate) fn as_str(&self) -> &str {
        match self {
            TransactionReason::Purchase => "PURCHASE",
            TransactionReason::Renewal => "RENEWAL",
            TransactionReason::Unknown(s) => s,
        }
    }
}
