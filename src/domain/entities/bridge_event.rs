use serde::Serialize;
use tokio::sync::mpsc;

use crate::errors::PurchaseError;

use super::purchase::Purchase;

/// Event delivered on the caller-visible stream.
///
/// Serializes as `{"event": "purchase-updated", "payload": {..}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum BridgeEvent {
    PurchaseUpdated(Purchase),
    PurchaseError(PurchaseError),
    PromotedProductIos {
        #[serde(rename = "productId")]
        product_id: String,
    },
}

impl BridgeEvent {
    pub const PURCHASE_UPDATED: &'static str = "purchase-updated";
    pub const PURCHASE_ERROR: &'static str = "purchase-error";
    pub const PROMOTED_PRODUCT_IOS: &'static str = "promoted-product-ios";

    pub fn name(&self) -> &'static str {
        match self {
            BridgeEvent::PurchaseUpdated(_) => Self::PURCHASE_UPDATED,
            BridgeEvent::PurchaseError(_) => Self::PURCHASE_ERROR,
            BridgeEvent::PromotedProductIos { .. } => Self::PROMOTED_PRODUCT_IOS,
        }
    }
}

/// Event raised by a native listener, already translated into canonical
/// entities by the repository.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeEvent {
    /// One native callback's worth of purchases (a single transaction on
    /// iOS, possibly several on Play Billing).
    PurchasesUpdated(Vec<Purchase>),
    PurchaseFailed(PurchaseError),
    PromotedProduct(String),
}

pub type NativeEventSender = mpsc::UnboundedSender<NativeEvent>;

pub type BridgeEventReceiver = mpsc::UnboundedReceiver<BridgeEvent>;
