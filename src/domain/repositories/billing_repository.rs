use async_trait::async_trait;

use crate::{
    domain::entities::{
        active_subscription::ActiveSubscription,
        bridge_event::NativeEventSender,
        connection_config::InitConnectionConfig,
        platform::Platform,
        product::{Product, ProductQueryType},
        purchase::Purchase,
        purchase_request::{PlatformPurchaseRequest, PurchaseOptions},
    },
    errors::PurchaseError,
};

/// Unified native billing capability. One implementation per store; every
/// error returned has already been translated into the canonical taxonomy.
#[async_trait]
pub trait BillingRepository: Send + Sync + 'static {
    fn platform(&self) -> Platform;

    /// Routes native purchase callbacks into `sender` from now on.
    fn attach_listeners(&self, sender: NativeEventSender);

    fn detach_listeners(&self);

    async fn init_connection(&self, config: &InitConnectionConfig) -> Result<bool, PurchaseError>;

    async fn end_connection(&self) -> Result<(), PurchaseError>;

    async fn fetch_products(
        &self,
        skus: &[String],
        query_type: ProductQueryType,
    ) -> Result<Vec<Product>, PurchaseError>;

    /// Store-specific checks on a validated request, run before it is
    /// registered. A failure goes straight back to the caller and is never
    /// published as a `purchase-error` event.
    fn check_purchase_request(
        &self,
        _request: &PlatformPurchaseRequest,
    ) -> Result<(), PurchaseError> {
        Ok(())
    }

    /// Launches the native purchase flow. The outcome arrives later through
    /// the attached listeners; an `Err` here means the flow never started.
    async fn request_purchase(&self, request: &PlatformPurchaseRequest)
        -> Result<(), PurchaseError>;

    async fn finish_transaction(
        &self,
        purchase: &Purchase,
        is_consumable: bool,
    ) -> Result<(), PurchaseError>;

    async fn get_available_purchases(
        &self,
        options: &PurchaseOptions,
    ) -> Result<Vec<Purchase>, PurchaseError>;

    /// Empty `subscription_ids` means all subscriptions.
    async fn get_active_subscriptions(
        &self,
        subscription_ids: &[String],
    ) -> Result<Vec<ActiveSubscription>, PurchaseError>;

    /// ISO 3166-1 country code of the current storefront.
    async fn get_storefront(&self) -> Result<String, PurchaseError>;

    fn ios(&self) -> Option<&dyn IosBillingExtensions> {
        None
    }

    fn android(&self) -> Option<&dyn AndroidBillingExtensions> {
        None
    }
}

/// StoreKit-only operations.
#[async_trait]
pub trait IosBillingExtensions: Send + Sync {
    /// Base64 app receipt.
    async fn get_receipt_data(&self) -> Result<String, PurchaseError>;

    /// `AppStore.sync()`.
    async fn sync(&self) -> Result<(), PurchaseError>;

    /// Presents the manage-subscriptions sheet; returns the subscriptions whose
    /// status changed while it was shown.
    async fn show_manage_subscriptions(&self) -> Result<Vec<Purchase>, PurchaseError>;

    /// Returns the refund request status (`success` or `userCancelled`).
    async fn begin_refund_request(&self, sku: &str) -> Result<Option<String>, PurchaseError>;

    async fn get_promoted_product(&self) -> Result<Option<Product>, PurchaseError>;

    async fn request_purchase_on_promoted_product(&self) -> Result<(), PurchaseError>;

    async fn is_eligible_for_intro_offer(&self, group_id: &str) -> Result<bool, PurchaseError>;

    async fn present_code_redemption_sheet(&self) -> Result<bool, PurchaseError>;

    /// Finishes every unfinished transaction.
    async fn clear_transactions(&self) -> Result<(), PurchaseError>;
}

/// Play Billing-only operations.
#[async_trait]
pub trait AndroidBillingExtensions: Send + Sync {
    async fn acknowledge_purchase(&self, purchase_token: &str) -> Result<(), PurchaseError>;

    async fn consume_purchase(&self, purchase_token: &str) -> Result<(), PurchaseError>;

    async fn deep_link_to_subscriptions(
        &self,
        sku: Option<&str>,
        package_name: &str,
    ) -> Result<(), PurchaseError>;

    async fn check_alternative_billing_availability(&self) -> Result<bool, PurchaseError>;

    async fn show_alternative_billing_dialog(&self) -> Result<bool, PurchaseError>;

    /// Reporting token for an alternative billing transaction.
    async fn create_alternative_billing_token(&self) -> Result<Option<String>, PurchaseError>;
}
