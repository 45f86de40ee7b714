//! Validates purchase requests, dispatches them to the native layer and
//! settles the caller's future when the matching native event arrives.

use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use tokio::sync::oneshot;

use crate::{
    bridge::event_buffer::EventBuffer,
    domain::{
        entities::{
            bridge_event::{BridgeEvent, NativeEvent},
            platform::Platform,
            product::ProductType,
            purchase::Purchase,
            purchase_request::{PlatformPurchaseRequest, PurchaseResult, RequestPurchaseProps},
        },
        logic::purchase_normalizer::normalize_purchase_list,
        repositories::billing_repository::BillingRepository,
    },
    errors::{
        DeveloperError, EmptySkuList, NotPrepared, PurchaseError, ServiceDisconnected,
        SkuOfferMismatch,
    },
};

/// Matches a native purchase outcome to the requests waiting for it. One key
/// per requested SKU.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationKey(String);

impl CorrelationKey {
    pub fn for_sku(sku: &str) -> Self {
        Self(sku.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buy:{}", self.0)
    }
}

type Outcome = Result<Vec<Purchase>, PurchaseError>;

struct PendingRequest {
    id: u64,
    responder: Option<oneshot::Sender<Outcome>>,
}

impl PendingRequest {
    fn settle(&mut self, key: &CorrelationKey, outcome: Outcome) {
        match self.responder.take() {
            Some(tx) => {
                // The caller may have stopped waiting; nothing to do then.
                let _ = tx.send(outcome);
            }
            None => {
                tracing::warn!(%key, request = self.id, "purchase request already settled");
            }
        }
    }
}

#[derive(Default)]
struct Registry {
    /// Set while the connection is live. Requests are only accepted when
    /// set, and clearing it rejects everything still waiting.
    open: bool,
    requests: HashMap<CorrelationKey, Vec<PendingRequest>>,
}

impl Registry {
    fn take(&mut self, key: &CorrelationKey, id: u64) -> Option<PendingRequest> {
        let requests = self.requests.get_mut(key)?;
        let index = requests.iter().position(|r| r.id == id)?;
        let request = requests.remove(index);
        if requests.is_empty() {
            self.requests.remove(key);
        }
        Some(request)
    }
}

pub struct PurchaseRequestRouter {
    events: Arc<EventBuffer>,
    registry: Mutex<Registry>,
    next_id: AtomicU64,
}

impl PurchaseRequestRouter {
    pub fn new(events: Arc<EventBuffer>) -> Self {
        Self {
            events,
            registry: Mutex::new(Registry::default()),
            next_id: AtomicU64::new(1),
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn pending_count(&self) -> usize {
        self.registry().requests.values().map(Vec::len).sum()
    }

    fn register(
        &self,
        key: CorrelationKey,
    ) -> Result<(u64, oneshot::Receiver<Outcome>), PurchaseError> {
        let mut registry = self.registry();
        if !registry.open {
            return Err(NotPrepared::new(""));
        }
        let (tx, rx) = oneshot::channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(%key, request = id, "registered purchase request");
        registry.requests.entry(key).or_default().push(PendingRequest {
            id,
            responder: Some(tx),
        });
        Ok((id, rx))
    }

    /// Starts accepting requests. Called once the connection is ready.
    pub(crate) fn open(&self) {
        self.registry().open = true;
    }

    /// Stops accepting requests and rejects everything still waiting,
    /// without emitting an event.
    pub(crate) fn close(&self, error: PurchaseError) {
        let drained: Vec<(CorrelationKey, Vec<PendingRequest>)> = {
            let mut registry = self.registry();
            registry.open = false;
            registry.requests.drain().collect()
        };
        if !drained.is_empty() {
            tracing::debug!(keys = drained.len(), code = %error.code(), "rejecting pending purchase requests");
        }
        for (key, requests) in drained {
            for mut request in requests {
                request.settle(&key, Err(error.clone()));
            }
        }
    }

    pub async fn request_purchase<R: BillingRepository + ?Sized>(
        &self,
        repository: &R,
        props: &RequestPurchaseProps,
    ) -> Result<PurchaseResult, PurchaseError> {
        let platform = repository.platform();
        let request = validate_request(props, platform)?;
        repository.check_purchase_request(&request)?;
        let sku = request.primary_sku().to_string();
        if request.is_subscription_replacement() {
            tracing::debug!(%sku, "routing as subscription replacement");
        }
        let key = CorrelationKey::for_sku(&sku);
        let (id, rx) = self
            .register(key.clone())
            .map_err(|e| e.with_platform(platform))?;

        if let Err(error) = repository.request_purchase(&request).await {
            let error = if error.product_id().is_none() {
                error.with_product_id(&sku)
            } else {
                error
            };
            self.fail_dispatch(&key, id, error);
        }

        let mut purchases = rx
            .await
            .map_err(|_| ServiceDisconnected::new("The purchase request was abandoned."))??;
        Ok(match platform {
            Platform::Ios if purchases.len() == 1 => PurchaseResult::Single(purchases.remove(0)),
            _ => PurchaseResult::Multiple(purchases),
        })
    }

    /// The native flow never started. Publishes and rejects only while the
    /// request is still waiting; once it has been settled elsewhere (for
    /// instance by `close`) the failure is dropped.
    fn fail_dispatch(&self, key: &CorrelationKey, id: u64, error: PurchaseError) {
        let own = {
            let mut registry = self.registry();
            let own = registry.take(key, id);
            if own.is_some() {
                self.events
                    .emit_or_buffer(BridgeEvent::PurchaseError(error.clone()));
            }
            own
        };
        match own {
            Some(mut request) => {
                request.settle(key, Err(error.clone()));
                self.reject(error);
            }
            None => {
                tracing::debug!(%key, request = id, error = %error, "dispatch failed after the request was settled");
            }
        }
    }

    /// Entry point for everything the native listeners raise. Emits the
    /// caller-visible event first, then settles matching requests.
    pub(crate) fn handle_native_event(&self, event: NativeEvent) {
        match event {
            NativeEvent::PurchasesUpdated(purchases) => {
                let purchases = normalize_purchase_list(Some(purchases));
                for purchase in &purchases {
                    self.events
                        .emit_or_buffer(BridgeEvent::PurchaseUpdated(purchase.clone()));
                }
                self.resolve(purchases);
            }
            NativeEvent::PurchaseFailed(error) => {
                self.events
                    .emit_or_buffer(BridgeEvent::PurchaseError(error.clone()));
                self.reject(error);
            }
            NativeEvent::PromotedProduct(product_id) => {
                self.events
                    .emit_or_buffer(BridgeEvent::PromotedProductIos { product_id });
            }
        }
    }

    fn resolve(&self, purchases: Vec<Purchase>) {
        let mut settled: Vec<(CorrelationKey, Vec<PendingRequest>, Vec<Purchase>)> = Vec::new();
        {
            let mut registry = self.registry();
            let keys: Vec<CorrelationKey> = registry.requests.keys().cloned().collect();
            for key in keys {
                let matching: Vec<Purchase> = purchases
                    .iter()
                    .filter(|p| p.product_ids().contains(&key.as_str()))
                    .cloned()
                    .collect();
                if matching.is_empty() {
                    continue;
                }
                if let Some(requests) = registry.requests.remove(&key) {
                    settled.push((key, requests, matching));
                }
            }
        }
        for (key, requests, matching) in settled {
            for mut request in requests {
                request.settle(&key, Ok(matching.clone()));
            }
        }
    }

    /// Rejects the requests for the error's product, or every pending request
    /// when the error is not tied to a product.
    fn reject(&self, error: PurchaseError) {
        let drained: Vec<(CorrelationKey, Vec<PendingRequest>)> = {
            let mut registry = self.registry();
            match error.product_id() {
                Some(product_id) => {
                    let key = CorrelationKey::for_sku(product_id);
                    registry
                        .requests
                        .remove(&key)
                        .map(|requests| vec![(key, requests)])
                        .unwrap_or_default()
                }
                None => registry.requests.drain().collect(),
            }
        };
        for (key, requests) in drained {
            for mut request in requests {
                request.settle(&key, Err(error.clone()));
            }
        }
    }
}

/// Structural checks that run before anything reaches the native layer.
pub fn validate_request(
    props: &RequestPurchaseProps,
    platform: Platform,
) -> Result<PlatformPurchaseRequest, PurchaseError> {
    match platform {
        Platform::Ios => {
            let ios = props
                .request
                .ios
                .as_ref()
                .ok_or_else(|| DeveloperError::new("request.ios is required on iOS."))?;
            if ios.sku.trim().is_empty() {
                return Err(EmptySkuList::new(""));
            }
            if matches!(ios.quantity, Some(q) if q <= 0) {
                return Err(DeveloperError::new("quantity must be positive.").with_product_id(&ios.sku));
            }
            Ok(PlatformPurchaseRequest::Ios(ios.clone()))
        }
        Platform::Android => {
            let android = props
                .request
                .android
                .as_ref()
                .ok_or_else(|| DeveloperError::new("request.android is required on Android."))?;
            if android.skus.is_empty() || android.skus.iter().any(|s| s.trim().is_empty()) {
                return Err(EmptySkuList::new(""));
            }
            let primary = &android.skus[0];
            if android.replacement_mode_android.is_some() && android.purchase_token_android.is_none() {
                return Err(DeveloperError::new(
                    "replacementModeAndroid requires purchaseTokenAndroid.",
                )
                .with_product_id(primary));
            }
            if props.product_type == ProductType::Subs {
                let offers = android
                    .subscription_offers
                    .as_deref()
                    .filter(|offers| !offers.is_empty())
                    .ok_or_else(|| {
                        DeveloperError::new("subscriptionOffers are required for subscriptions.")
                            .with_product_id(primary)
                    })?;
                if let Some(stray) = offers.iter().find(|o| !android.skus.contains(&o.sku)) {
                    return Err(SkuOfferMismatch::new(&format!(
                        "Offer given for {} which is not in skus.",
                        stray.sku
                    ))
                    .with_product_id(&stray.sku));
                }
                if let Some(missing) = android
                    .skus
                    .iter()
                    .find(|sku| !offers.iter().any(|o| &o.sku == *sku))
                {
                    return Err(
                        SkuOfferMismatch::new(&format!("No offer given for {missing}."))
                            .with_product_id(missing),
                    );
                }
                if offers.iter().any(|o| o.offer_token.trim().is_empty()) {
                    return Err(DeveloperError::new("offerToken must not be empty.")
                        .with_product_id(primary));
                }
            } else if android.purchase_token_android.is_some() {
                return Err(DeveloperError::new(
                    "purchaseTokenAndroid is only valid for subscription replacement.",
                )
                .with_product_id(primary));
            }
            Ok(PlatformPurchaseRequest::Android {
                props: android.clone(),
                product_type: props.product_type,
            })
        }
    }
}
