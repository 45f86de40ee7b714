use async_trait::async_trait;

use crate::{
    data::models::store_kit::{
        product_model::StoreKitProductModel, purchase_params_model::StoreKitPurchaseParamsModel,
        store_kit_error_model::StoreKitErrorModel,
        subscription_status_model::StoreKitSubscriptionStatusModel,
        transaction_model::StoreKitTransactionModel,
    },
    domain::entities::{
        bridge_event::{NativeEvent, NativeEventSender},
        platform::Platform,
        purchase::Purchase,
    },
    errors::{MalformedNativePurchase, PurchaseError},
};

/// StoreKit 2 surface implemented by the iOS host.
///
/// Every call maps to one StoreKit API; failures are reported as
/// [`StoreKitErrorModel`] and translated by the repository.
#[async_trait]
pub trait StoreKitDatasource: Send + Sync + 'static {
    /// Starts (`Some`) or stops (`None`) forwarding `Transaction.updates`,
    /// purchase failures and promoted-product intents.
    fn set_event_sink(&self, sink: Option<StoreKitEventSink>);

    /// `AppStore.canMakePayments`.
    async fn can_make_payments(&self) -> Result<bool, StoreKitErrorModel>;

    /// `Product.products(for:)`. Unknown identifiers are omitted.
    async fn products(
        &self,
        product_ids: &[String],
    ) -> Result<Vec<StoreKitProductModel>, StoreKitErrorModel>;

    /// `Product.purchase(options:)`. Resolves once the sheet has been shown;
    /// the resulting transaction or failure arrives through the event sink.
    async fn purchase(&self, params: &StoreKitPurchaseParamsModel)
        -> Result<(), StoreKitErrorModel>;

    /// `Transaction.finish()` for the given transaction id.
    async fn finish(&self, transaction_id: &str) -> Result<(), StoreKitErrorModel>;

    /// `Transaction.currentEntitlements`.
    async fn current_entitlements(&self)
        -> Result<Vec<StoreKitTransactionModel>, StoreKitErrorModel>;

    /// `Transaction.all`.
    async fn all_transactions(&self) -> Result<Vec<StoreKitTransactionModel>, StoreKitErrorModel>;

    /// `Transaction.unfinished`.
    async fn unfinished_transactions(
        &self,
    ) -> Result<Vec<StoreKitTransactionModel>, StoreKitErrorModel>;

    /// `Product.SubscriptionInfo.status` of the product's subscription group.
    async fn subscription_statuses(
        &self,
        product_id: &str,
    ) -> Result<Vec<StoreKitSubscriptionStatusModel>, StoreKitErrorModel>;

    /// `Storefront.current?.countryCode`.
    async fn storefront_country_code(&self) -> Result<String, StoreKitErrorModel>;

    /// Base64 of `Bundle.main.appStoreReceiptURL`.
    async fn app_receipt(&self) -> Result<String, StoreKitErrorModel>;

    /// `AppStore.sync()`.
    async fn sync(&self) -> Result<(), StoreKitErrorModel>;

    /// `AppStore.showManageSubscriptions(in:)`; returns the latest
    /// transactions of the subscriptions whose status changed.
    async fn show_manage_subscriptions(
        &self,
    ) -> Result<Vec<StoreKitTransactionModel>, StoreKitErrorModel>;

    /// `Transaction.beginRefundRequest(in:)`.
    async fn begin_refund_request(
        &self,
        transaction_id: &str,
    ) -> Result<Option<String>, StoreKitErrorModel>;

    async fn promoted_product(&self) -> Result<Option<StoreKitProductModel>, StoreKitErrorModel>;

    /// Continues the purchase the App Store deferred for a promoted product.
    async fn purchase_promoted_product(&self) -> Result<(), StoreKitErrorModel>;

    /// `Product.SubscriptionInfo.isEligibleForIntroOffer(for:)`.
    async fn is_eligible_for_intro_offer(&self, group_id: &str)
        -> Result<bool, StoreKitErrorModel>;

    /// `AppStore.presentOfferCodeRedeemSheet(in:)`.
    async fn present_code_redemption_sheet(&self) -> Result<(), StoreKitErrorModel>;
}

/// Handle the host uses to report StoreKit callbacks. Cheap to clone and
/// safe to call from any thread.
#[derive(Debug, Clone)]
pub struct StoreKitEventSink {
    sender: NativeEventSender,
}

impl StoreKitEventSink {
    pub(crate) fn new(sender: NativeEventSender) -> Self {
        Self { sender }
    }

    /// A verified transaction from `Transaction.updates` or a completed
    /// purchase.
    pub fn on_transaction_updated(&self, transaction: StoreKitTransactionModel) {
        self.send(NativeEvent::PurchasesUpdated(vec![
            Purchase::from_store_kit_transaction(transaction),
        ]));
    }

    /// Same as [`Self::on_transaction_updated`], for hosts that hand over the
    /// transaction as JSON. Undecodable payloads surface as a purchase error.
    pub fn on_transaction_json(&self, json: &str) {
        match serde_json::from_str::<StoreKitTransactionModel>(json) {
            Ok(transaction) => self.on_transaction_updated(transaction),
            Err(e) => self.send(NativeEvent::PurchaseFailed(
                MalformedNativePurchase::with_debug("", &e).with_platform(Platform::Ios),
            )),
        }
    }

    pub fn on_transaction_error(&self, error: StoreKitErrorModel) {
        self.send(NativeEvent::PurchaseFailed(PurchaseError::from_store_kit(error)));
    }

    /// `SKPaymentTransactionObserver.paymentQueue(_:shouldAddStorePayment:for:)`.
    pub fn on_promoted_product(&self, product_id: impl Into<String>) {
        self.send(NativeEvent::PromotedProduct(product_id.into()));
    }

    fn send(&self, event: NativeEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!("StoreKit event dropped, listeners are detached");
        }
    }
}
