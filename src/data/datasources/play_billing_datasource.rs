use async_trait::async_trait;

use crate::{
    data::models::play_billing::{
        billing_flow_params_model::BillingFlowParamsModel,
        billing_result_model::BillingResultModel, product_details_model::PlayProductDetailsModel,
        purchase_model::PlayBillingPurchaseModel,
    },
    domain::entities::{
        bridge_event::{NativeEvent, NativeEventSender},
        connection_config::AlternativeBillingModeAndroid,
        purchase::Purchase,
    },
    errors::PurchaseError,
};

/// Play Billing Library surface implemented by the Android host.
///
/// Product types are passed as the library's `ProductType` strings, `inapp`
/// or `subs`.
#[async_trait]
pub trait PlayBillingDatasource: Send + Sync + 'static {
    /// Installs (`Some`) or removes (`None`) the `PurchasesUpdatedListener`.
    fn set_event_sink(&self, sink: Option<PlayBillingEventSink>);

    /// `BillingClient.startConnection`, resolved from `onBillingSetupFinished`.
    async fn start_connection(
        &self,
        alternative_billing_mode: Option<AlternativeBillingModeAndroid>,
    ) -> Result<(), BillingResultModel>;

    /// `BillingClient.endConnection`.
    async fn end_connection(&self) -> Result<(), BillingResultModel>;

    /// `BillingClient.queryProductDetailsAsync`.
    async fn query_product_details(
        &self,
        product_ids: &[String],
        product_type: &str,
    ) -> Result<Vec<PlayProductDetailsModel>, BillingResultModel>;

    /// `BillingClient.launchBillingFlow`. The outcome arrives through the
    /// event sink.
    async fn launch_billing_flow(
        &self,
        params: &BillingFlowParamsModel,
    ) -> Result<(), BillingResultModel>;

    /// `BillingClient.queryPurchasesAsync`.
    async fn query_purchases(
        &self,
        product_type: &str,
    ) -> Result<Vec<PlayBillingPurchaseModel>, BillingResultModel>;

    async fn acknowledge_purchase(&self, purchase_token: &str) -> Result<(), BillingResultModel>;

    async fn consume_purchase(&self, purchase_token: &str) -> Result<(), BillingResultModel>;

    /// `BillingClient.getBillingConfigAsync`, the config's country code.
    async fn billing_country_code(&self) -> Result<String, BillingResultModel>;

    /// Opens a Play Store URL with an `ACTION_VIEW` intent.
    async fn open_url(&self, url: &str) -> Result<(), BillingResultModel>;

    async fn is_alternative_billing_available(&self) -> Result<bool, BillingResultModel>;

    /// Returns whether the user accepted the alternative billing dialog.
    async fn show_alternative_billing_dialog(&self) -> Result<bool, BillingResultModel>;

    async fn create_alternative_billing_token(&self)
        -> Result<Option<String>, BillingResultModel>;
}

/// Handle the host uses to report `PurchasesUpdatedListener` callbacks.
#[derive(Debug, Clone)]
pub struct PlayBillingEventSink {
    sender: NativeEventSender,
}

impl PlayBillingEventSink {
    pub(crate) fn new(sender: NativeEventSender) -> Self {
        Self { sender }
    }

    /// `PurchasesUpdatedListener.onPurchasesUpdated`.
    pub fn on_purchases_updated(
        &self,
        result: BillingResultModel,
        purchases: Vec<PlayBillingPurchaseModel>,
    ) {
        if !result.is_ok() {
            self.send(NativeEvent::PurchaseFailed(PurchaseError::from_billing_result(
                result,
            )));
            return;
        }
        if purchases.is_empty() {
            tracing::debug!("onPurchasesUpdated reported OK without purchases");
            return;
        }
        let mut mapped = Vec::with_capacity(purchases.len());
        for m in purchases {
            match Purchase::from_play_billing_purchase(m) {
                Ok(purchase) => mapped.push(purchase),
                Err(e) => self.send(NativeEvent::PurchaseFailed(e)),
            }
        }
        if !mapped.is_empty() {
            self.send(NativeEvent::PurchasesUpdated(mapped));
        }
    }

    fn send(&self, event: NativeEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!("Play Billing event dropped, listeners are detached");
        }
    }
}
