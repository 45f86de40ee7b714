use std::sync::Arc;

use crate::{
    bridge::{
        connection_lifecycle::ConnectionLifecycle, event_buffer::EventBuffer,
        purchase_request_router::PurchaseRequestRouter,
    },
    config::BridgeConfig,
    data::{
        datasources::{
            play_billing_datasource::PlayBillingDatasource, store_kit_datasource::StoreKitDatasource,
        },
        repositories::{
            app_store_billing_repository_impl::AppStoreBillingRepositoryImpl,
            play_billing_repository_impl::PlayBillingRepositoryImpl,
        },
    },
    domain::{
        entities::{
            active_subscription::ActiveSubscription,
            bridge_event::{BridgeEvent, BridgeEventReceiver},
            connection_config::InitConnectionConfig,
            platform::Platform,
            product::Product,
            purchase::Purchase,
            purchase_request::{
                FetchProductsRequest, FinishTransactionProps, PurchaseOptions, PurchaseResult,
                RequestPurchaseProps,
            },
        },
        logic::purchase_normalizer::{deduplicate_by_product, normalize_purchase_list},
        repositories::billing_repository::{
            AndroidBillingExtensions, BillingRepository, IosBillingExtensions,
        },
    },
    errors::{EmptySkuList, FeatureNotSupported, PurchaseError},
};

/// Entry point of the bridge. One instance per app process; every method is
/// safe to call concurrently.
pub struct IapUtil<R: BillingRepository> {
    repository: Arc<R>,
    events: Arc<EventBuffer>,
    router: Arc<PurchaseRequestRouter>,
    lifecycle: ConnectionLifecycle<R>,
}

impl<R: BillingRepository> IapUtil<R> {
    pub fn new(repository: R, config: BridgeConfig) -> Result<Self, PurchaseError> {
        config.validate()?;
        let repository = Arc::new(repository);
        let events = Arc::new(EventBuffer::new(config.event_buffer.clone()));
        let router = Arc::new(PurchaseRequestRouter::new(Arc::clone(&events)));
        let lifecycle = ConnectionLifecycle::new(
            Arc::clone(&repository),
            Arc::clone(&events),
            Arc::clone(&router),
            config.init_timeout(),
        );
        Ok(Self {
            repository,
            events,
            router,
            lifecycle,
        })
    }

    pub fn platform(&self) -> Platform {
        self.repository.platform()
    }

    /// Caller-visible event stream. Events raised before the connection is
    /// ready are delivered once it is.
    pub fn subscribe(&self) -> BridgeEventReceiver {
        self.events.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.lifecycle.is_connected()
    }

    #[tracing::instrument(skip_all, fields(platform = %self.platform()))]
    pub async fn init_connection(
        &self,
        config: Option<InitConnectionConfig>,
    ) -> Result<bool, PurchaseError> {
        self.lifecycle
            .init_connection(&config.unwrap_or_default())
            .await
    }

    /// Always resolves `true`.
    #[tracing::instrument(skip_all, fields(platform = %self.platform()))]
    pub async fn end_connection(&self) -> bool {
        self.lifecycle.end_connection().await
    }

    #[tracing::instrument(skip_all, fields(skus = request.skus.len()))]
    pub async fn fetch_products(
        &self,
        request: FetchProductsRequest,
    ) -> Result<Vec<Product>, PurchaseError> {
        self.lifecycle.ensure_connection()?;
        if request.skus.is_empty() || request.skus.iter().any(|s| s.trim().is_empty()) {
            return Err(EmptySkuList::new("").with_platform(self.platform()));
        }
        self.repository
            .fetch_products(&request.skus, request.query_type)
            .await
    }

    /// Resolves with the purchase(s) of the first matching native
    /// `purchase-updated` event, or rejects with the first matching error.
    /// The same outcome is also emitted on the event stream.
    #[tracing::instrument(skip_all, fields(platform = %self.platform()))]
    pub async fn request_purchase(
        &self,
        props: RequestPurchaseProps,
    ) -> Result<PurchaseResult, PurchaseError> {
        self.lifecycle.ensure_connection()?;
        self.router
            .request_purchase(self.repository.as_ref(), &props)
            .await
    }

    #[tracing::instrument(skip_all, fields(product_id = props.purchase.product_id()))]
    pub async fn finish_transaction(
        &self,
        props: FinishTransactionProps,
    ) -> Result<bool, PurchaseError> {
        self.lifecycle.ensure_connection()?;
        self.repository
            .finish_transaction(&props.purchase, props.is_consumable)
            .await?;
        Ok(true)
    }

    /// Owned purchases, normalized and reduced to the latest one per product.
    pub async fn get_available_purchases(
        &self,
        options: Option<PurchaseOptions>,
    ) -> Result<Vec<Purchase>, PurchaseError> {
        self.lifecycle.ensure_connection()?;
        let options = options.unwrap_or_default();
        let purchases = self.repository.get_available_purchases(&options).await?;
        let purchases = deduplicate_by_product(normalize_purchase_list(Some(purchases)));
        if options.also_publish_to_event_listener_ios {
            for purchase in &purchases {
                self.events
                    .emit_or_buffer(BridgeEvent::PurchaseUpdated(purchase.clone()));
            }
        }
        Ok(purchases)
    }

    /// `None` or an empty list means every subscription.
    pub async fn get_active_subscriptions(
        &self,
        subscription_ids: Option<Vec<String>>,
    ) -> Result<Vec<ActiveSubscription>, PurchaseError> {
        self.lifecycle.ensure_connection()?;
        self.repository
            .get_active_subscriptions(&subscription_ids.unwrap_or_default())
            .await
    }

    pub async fn has_active_subscriptions(
        &self,
        subscription_ids: Option<Vec<String>>,
    ) -> Result<bool, PurchaseError> {
        Ok(self
            .get_active_subscriptions(subscription_ids)
            .await?
            .iter()
            .any(|s| s.is_active))
    }

    pub async fn get_storefront(&self) -> Result<String, PurchaseError> {
        self.lifecycle.ensure_connection()?;
        self.repository.get_storefront().await
    }

    fn ios(&self) -> Result<&dyn IosBillingExtensions, PurchaseError> {
        self.lifecycle.ensure_connection()?;
        self.repository.ios().ok_or_else(|| {
            FeatureNotSupported::new("iOS only.").with_platform(self.platform())
        })
    }

    fn android(&self) -> Result<&dyn AndroidBillingExtensions, PurchaseError> {
        self.lifecycle.ensure_connection()?;
        self.repository.android().ok_or_else(|| {
            FeatureNotSupported::new("Android only.").with_platform(self.platform())
        })
    }

    pub async fn get_receipt_data_ios(&self) -> Result<String, PurchaseError> {
        self.ios()?.get_receipt_data().await
    }

    pub async fn sync_ios(&self) -> Result<bool, PurchaseError> {
        self.ios()?.sync().await?;
        Ok(true)
    }

    pub async fn show_manage_subscriptions_ios(&self) -> Result<Vec<Purchase>, PurchaseError> {
        let changed = self.ios()?.show_manage_subscriptions().await?;
        Ok(normalize_purchase_list(Some(changed)))
    }

    pub async fn begin_refund_request_ios(
        &self,
        sku: &str,
    ) -> Result<Option<String>, PurchaseError> {
        self.ios()?.begin_refund_request(sku).await
    }

    pub async fn get_promoted_product_ios(&self) -> Result<Option<Product>, PurchaseError> {
        self.ios()?.get_promoted_product().await
    }

    /// The resulting transaction arrives as a `purchase-updated` event.
    pub async fn request_purchase_on_promoted_product_ios(&self) -> Result<bool, PurchaseError> {
        self.ios()?.request_purchase_on_promoted_product().await?;
        Ok(true)
    }

    pub async fn is_eligible_for_intro_offer_ios(
        &self,
        group_id: &str,
    ) -> Result<bool, PurchaseError> {
        self.ios()?.is_eligible_for_intro_offer(group_id).await
    }

    pub async fn present_code_redemption_sheet_ios(&self) -> Result<bool, PurchaseError> {
        self.ios()?.present_code_redemption_sheet().await
    }

    pub async fn clear_transaction_ios(&self) -> Result<bool, PurchaseError> {
        self.ios()?.clear_transactions().await?;
        Ok(true)
    }

    pub async fn acknowledge_purchase_android(
        &self,
        purchase_token: &str,
    ) -> Result<bool, PurchaseError> {
        self.android()?.acknowledge_purchase(purchase_token).await?;
        Ok(true)
    }

    pub async fn consume_purchase_android(
        &self,
        purchase_token: &str,
    ) -> Result<bool, PurchaseError> {
        self.android()?.consume_purchase(purchase_token).await?;
        Ok(true)
    }

    pub async fn deep_link_to_subscriptions_android(
        &self,
        sku: Option<&str>,
        package_name: &str,
    ) -> Result<(), PurchaseError> {
        self.android()?
            .deep_link_to_subscriptions(sku, package_name)
            .await
    }

    pub async fn check_alternative_billing_availability_android(
        &self,
    ) -> Result<bool, PurchaseError> {
        self.android()?
            .check_alternative_billing_availability()
            .await
    }

    pub async fn show_alternative_billing_dialog_android(&self) -> Result<bool, PurchaseError> {
        self.android()?.show_alternative_billing_dialog().await
    }

    pub async fn create_alternative_billing_token_android(
        &self,
    ) -> Result<Option<String>, PurchaseError> {
        self.android()?.create_alternative_billing_token().await
    }
}

impl<D: StoreKitDatasource> IapUtil<AppStoreBillingRepositoryImpl<D>> {
    pub fn app_store(datasource: D, config: BridgeConfig) -> Result<Self, PurchaseError> {
        Self::new(AppStoreBillingRepositoryImpl::new(datasource), config)
    }
}

impl<D: PlayBillingDatasource> IapUtil<PlayBillingRepositoryImpl<D>> {
    pub fn play_billing(datasource: D, config: BridgeConfig) -> Result<Self, PurchaseError> {
        Self::new(PlayBillingRepositoryImpl::new(datasource), config)
    }
}
