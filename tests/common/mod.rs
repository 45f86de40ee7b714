//! Mock native layers for integration tests.
//!
//! Each mock is a cheap handle around shared state, so a test can keep one
//! clone for inspection and driving events while the bridge owns another.

#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::DateTime;
use fractic_iap_bridge::{
    data::models::{
        play_billing::{
            billing_flow_params_model::BillingFlowParamsModel,
            billing_result_model::BillingResultModel,
            product_details_model::PlayProductDetailsModel,
            purchase_model::{PlayBillingPurchaseModel, PurchaseStateModel},
        },
        store_kit::{
            product_model::StoreKitProductModel, purchase_params_model::StoreKitPurchaseParamsModel,
            store_kit_error_model::StoreKitErrorModel,
            subscription_status_model::StoreKitSubscriptionStatusModel,
            transaction_model::StoreKitTransactionModel,
        },
    },
    domain::entities::connection_config::AlternativeBillingModeAndroid,
    BridgeEvent, PlayBillingDatasource, PlayBillingEventSink, StoreKitDatasource,
    StoreKitEventSink,
};
use tokio::sync::{mpsc::UnboundedReceiver, Notify};

/// Blocks a native call (init, or a purchase) until [`InitGate::open`] is
/// called.
#[derive(Default)]
pub struct InitGate {
    notify: Notify,
}

impl InitGate {
    pub fn open(&self) {
        self.notify.notify_one();
    }

    async fn wait(&self) {
        self.notify.notified().await;
    }
}

pub fn transaction(id: &str, product_id: &str, date_ms: i64) -> StoreKitTransactionModel {
    StoreKitTransactionModel {
        id: id.to_string(),
        product_id: product_id.to_string(),
        purchase_date: DateTime::from_timestamp_millis(date_ms).unwrap(),
        purchased_quantity: 1,
        ..Default::default()
    }
}

pub fn play_purchase(
    order_id: &str,
    token: &str,
    product_id: &str,
    date_ms: i64,
) -> PlayBillingPurchaseModel {
    PlayBillingPurchaseModel {
        order_id: Some(order_id.to_string()),
        purchase_token: token.to_string(),
        products: vec![product_id.to_string()],
        purchase_time: DateTime::from_timestamp_millis(date_ms).unwrap(),
        purchase_state: PurchaseStateModel::Purchased,
        quantity: 1,
        ..Default::default()
    }
}

pub fn play_product(product_id: &str, product_type: &str) -> PlayProductDetailsModel {
    serde_json::from_value(serde_json::json!({
        "productId": product_id,
        "productType": product_type,
        "title": product_id,
        "name": product_id,
        "description": "",
        "oneTimePurchaseOfferDetails": {
            "formattedPrice": "$0.99",
            "priceAmountMicros": 990000,
            "priceCurrencyCode": "USD"
        }
    }))
    .unwrap()
}

/// Polls until `condition` holds, failing the test after one second.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

pub async fn next_event(rx: &mut UnboundedReceiver<BridgeEvent>) -> BridgeEvent {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("no event in time")
        .expect("event stream closed")
}

// StoreKit.

#[derive(Default)]
pub struct StoreKitState {
    pub sink: Mutex<Option<StoreKitEventSink>>,
    pub sink_attachments: AtomicUsize,
    pub init_calls: AtomicUsize,
    pub init_gate: Mutex<Option<Arc<InitGate>>>,
    pub init_results: Mutex<VecDeque<Result<bool, StoreKitErrorModel>>>,
    pub native_calls: AtomicUsize,
    pub products: Mutex<Vec<StoreKitProductModel>>,
    pub purchases: Mutex<Vec<StoreKitPurchaseParamsModel>>,
    /// Holds `purchase` after it is recorded, until opened.
    pub purchase_gate: Mutex<Option<Arc<InitGate>>>,
    pub purchase_error: Mutex<Option<StoreKitErrorModel>>,
    /// Reported through the sink as soon as `purchase` is called.
    pub purchase_response: Mutex<Option<Result<StoreKitTransactionModel, StoreKitErrorModel>>>,
    pub finished: Mutex<Vec<String>>,
    pub entitlements: Mutex<Vec<StoreKitTransactionModel>>,
    pub history: Mutex<Vec<StoreKitTransactionModel>>,
    pub statuses: Mutex<Vec<StoreKitSubscriptionStatusModel>>,
}

#[derive(Clone, Default)]
pub struct MockStoreKit {
    pub state: Arc<StoreKitState>,
}

impl MockStoreKit {
    pub fn gated() -> (Self, Arc<InitGate>) {
        let mock = Self::default();
        let gate = Arc::new(InitGate::default());
        *mock.state.init_gate.lock().unwrap() = Some(Arc::clone(&gate));
        (mock, gate)
    }

    pub fn sink(&self) -> StoreKitEventSink {
        self.state
            .sink
            .lock()
            .unwrap()
            .clone()
            .expect("listeners are not attached")
    }

    pub fn has_sink(&self) -> bool {
        self.state.sink.lock().unwrap().is_some()
    }

    fn count(&self) {
        self.state.native_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StoreKitDatasource for MockStoreKit {
    fn set_event_sink(&self, sink: Option<StoreKitEventSink>) {
        if sink.is_some() {
            self.state.sink_attachments.fetch_add(1, Ordering::SeqCst);
        }
        *self.state.sink.lock().unwrap() = sink;
    }

    async fn can_make_payments(&self) -> Result<bool, StoreKitErrorModel> {
        self.state.init_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.state.init_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.wait().await;
        }
        let result = self.state.init_results.lock().unwrap().pop_front();
        result.unwrap_or(Ok(true))
    }

    async fn products(
        &self,
        product_ids: &[String],
    ) -> Result<Vec<StoreKitProductModel>, StoreKitErrorModel> {
        self.count();
        Ok(self
            .state
            .products
            .lock()
            .unwrap()
            .iter()
            .filter(|p| product_ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn purchase(
        &self,
        params: &StoreKitPurchaseParamsModel,
    ) -> Result<(), StoreKitErrorModel> {
        self.count();
        self.state.purchases.lock().unwrap().push(params.clone());
        let gate = self.state.purchase_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.wait().await;
        }
        if let Some(e) = self.state.purchase_error.lock().unwrap().clone() {
            return Err(e);
        }
        let response = self.state.purchase_response.lock().unwrap().take();
        match response {
            Some(Ok(t)) => self.sink().on_transaction_updated(t),
            Some(Err(e)) => self.sink().on_transaction_error(e),
            None => {}
        }
        Ok(())
    }

    async fn finish(&self, transaction_id: &str) -> Result<(), StoreKitErrorModel> {
        self.count();
        self.state
            .finished
            .lock()
            .unwrap()
            .push(transaction_id.to_string());
        Ok(())
    }

    async fn current_entitlements(
        &self,
    ) -> Result<Vec<StoreKitTransactionModel>, StoreKitErrorModel> {
        self.count();
        Ok(self.state.entitlements.lock().unwrap().clone())
    }

    async fn all_transactions(&self) -> Result<Vec<StoreKitTransactionModel>, StoreKitErrorModel> {
        self.count();
        Ok(self.state.history.lock().unwrap().clone())
    }

    async fn unfinished_transactions(
        &self,
    ) -> Result<Vec<StoreKitTransactionModel>, StoreKitErrorModel> {
        self.count();
        Ok(self.state.history.lock().unwrap().clone())
    }

    async fn subscription_statuses(
        &self,
        _product_id: &str,
    ) -> Result<Vec<StoreKitSubscriptionStatusModel>, StoreKitErrorModel> {
        self.count();
        Ok(self.state.statuses.lock().unwrap().clone())
    }

    async fn storefront_country_code(&self) -> Result<String, StoreKitErrorModel> {
        self.count();
        Ok("USA".to_string())
    }

    async fn app_receipt(&self) -> Result<String, StoreKitErrorModel> {
        self.count();
        Ok("cmVjZWlwdA==".to_string())
    }

    async fn sync(&self) -> Result<(), StoreKitErrorModel> {
        self.count();
        Ok(())
    }

    async fn show_manage_subscriptions(
        &self,
    ) -> Result<Vec<StoreKitTransactionModel>, StoreKitErrorModel> {
        self.count();
        Ok(vec![])
    }

    async fn begin_refund_request(
        &self,
        _transaction_id: &str,
    ) -> Result<Option<String>, StoreKitErrorModel> {
        self.count();
        Ok(Some("success".to_string()))
    }

    async fn promoted_product(&self) -> Result<Option<StoreKitProductModel>, StoreKitErrorModel> {
        self.count();
        Ok(None)
    }

    async fn purchase_promoted_product(&self) -> Result<(), StoreKitErrorModel> {
        self.count();
        Ok(())
    }

    async fn is_eligible_for_intro_offer(
        &self,
        _group_id: &str,
    ) -> Result<bool, StoreKitErrorModel> {
        self.count();
        Ok(true)
    }

    async fn present_code_redemption_sheet(&self) -> Result<(), StoreKitErrorModel> {
        self.count();
        Ok(())
    }
}

// Play Billing.

#[derive(Default)]
pub struct PlayBillingState {
    pub sink: Mutex<Option<PlayBillingEventSink>>,
    pub sink_attachments: AtomicUsize,
    pub init_calls: AtomicUsize,
    pub init_gate: Mutex<Option<Arc<InitGate>>>,
    pub init_results: Mutex<VecDeque<Result<(), BillingResultModel>>>,
    pub end_calls: AtomicUsize,
    pub end_error: Mutex<Option<BillingResultModel>>,
    pub native_calls: AtomicUsize,
    pub product_details: Mutex<Vec<PlayProductDetailsModel>>,
    pub launched: Mutex<Vec<BillingFlowParamsModel>>,
    pub launch_error: Mutex<Option<BillingResultModel>>,
    /// Reported through the sink as soon as `launch_billing_flow` is called.
    pub launch_response: Mutex<Option<(BillingResultModel, Vec<PlayBillingPurchaseModel>)>>,
    pub owned_inapp: Mutex<Vec<PlayBillingPurchaseModel>>,
    pub owned_subs: Mutex<Vec<PlayBillingPurchaseModel>>,
    pub acknowledged: Mutex<Vec<String>>,
    pub consumed: Mutex<Vec<String>>,
    pub opened_urls: Mutex<Vec<String>>,
}

#[derive(Clone, Default)]
pub struct MockPlayBilling {
    pub state: Arc<PlayBillingState>,
}

impl MockPlayBilling {
    pub fn gated() -> (Self, Arc<InitGate>) {
        let mock = Self::default();
        let gate = Arc::new(InitGate::default());
        *mock.state.init_gate.lock().unwrap() = Some(Arc::clone(&gate));
        (mock, gate)
    }

    pub fn sink(&self) -> PlayBillingEventSink {
        self.state
            .sink
            .lock()
            .unwrap()
            .clone()
            .expect("listeners are not attached")
    }

    pub fn has_sink(&self) -> bool {
        self.state.sink.lock().unwrap().is_some()
    }

    pub fn launched_count(&self) -> usize {
        self.state.launched.lock().unwrap().len()
    }

    fn count(&self) {
        self.state.native_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PlayBillingDatasource for MockPlayBilling {
    fn set_event_sink(&self, sink: Option<PlayBillingEventSink>) {
        if sink.is_some() {
            self.state.sink_attachments.fetch_add(1, Ordering::SeqCst);
        }
        *self.state.sink.lock().unwrap() = sink;
    }

    async fn start_connection(
        &self,
        _alternative_billing_mode: Option<AlternativeBillingModeAndroid>,
    ) -> Result<(), BillingResultModel> {
        self.state.init_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.state.init_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.wait().await;
        }
        let result = self.state.init_results.lock().unwrap().pop_front();
        result.unwrap_or(Ok(()))
    }

    async fn end_connection(&self) -> Result<(), BillingResultModel> {
        self.state.end_calls.fetch_add(1, Ordering::SeqCst);
        match self.state.end_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn query_product_details(
        &self,
        product_ids: &[String],
        product_type: &str,
    ) -> Result<Vec<PlayProductDetailsModel>, BillingResultModel> {
        self.count();
        Ok(self
            .state
            .product_details
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.product_type == product_type && product_ids.contains(&p.product_id))
            .cloned()
            .collect())
    }

    async fn launch_billing_flow(
        &self,
        params: &BillingFlowParamsModel,
    ) -> Result<(), BillingResultModel> {
        self.count();
        self.state.launched.lock().unwrap().push(params.clone());
        if let Some(e) = self.state.launch_error.lock().unwrap().clone() {
            return Err(e);
        }
        let response = self.state.launch_response.lock().unwrap().take();
        if let Some((result, purchases)) = response {
            self.sink().on_purchases_updated(result, purchases);
        }
        Ok(())
    }

    async fn query_purchases(
        &self,
        product_type: &str,
    ) -> Result<Vec<PlayBillingPurchaseModel>, BillingResultModel> {
        self.count();
        let owned = match product_type {
            "subs" => &self.state.owned_subs,
            _ => &self.state.owned_inapp,
        };
        Ok(owned.lock().unwrap().clone())
    }

    async fn acknowledge_purchase(&self, purchase_token: &str) -> Result<(), BillingResultModel> {
        self.count();
        self.state
            .acknowledged
            .lock()
            .unwrap()
            .push(purchase_token.to_string());
        Ok(())
    }

    async fn consume_purchase(&self, purchase_token: &str) -> Result<(), BillingResultModel> {
        self.count();
        self.state
            .consumed
            .lock()
            .unwrap()
            .push(purchase_token.to_string());
        Ok(())
    }

    async fn billing_country_code(&self) -> Result<String, BillingResultModel> {
        self.count();
        Ok("US".to_string())
    }

    async fn open_url(&self, url: &str) -> Result<(), BillingResultModel> {
        self.count();
        self.state.opened_urls.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn is_alternative_billing_available(&self) -> Result<bool, BillingResultModel> {
        self.count();
        Ok(false)
    }

    async fn show_alternative_billing_dialog(&self) -> Result<bool, BillingResultModel> {
        self.count();
        Ok(false)
    }

    async fn create_alternative_billing_token(
        &self,
    ) -> Result<Option<String>, BillingResultModel> {
        self.count();
        Ok(None)
    }
}
