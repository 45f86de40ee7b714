use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;

use crate::{
    data::{
        datasources::play_billing_datasource::{PlayBillingDatasource, PlayBillingEventSink},
        models::play_billing::{
            billing_flow_params_model::{
                BillingFlowParamsModel, ProductDetailsParamsModel, SubscriptionUpdateParamsModel,
            },
            billing_result_model::BillingResultModel,
            product_details_model::PlayProductDetailsModel,
            purchase_model::{PlayBillingPurchaseModel, PurchaseStateModel},
        },
    },
    domain::{
        entities::{
            active_subscription::ActiveSubscription,
            bridge_event::NativeEventSender,
            connection_config::InitConnectionConfig,
            platform::Platform,
            product::{
                PricingPhaseAndroid, Product, ProductAndroid, ProductQueryType, ProductType,
                SubscriptionOfferAndroid,
            },
            purchase::{Purchase, PurchaseAndroid, PurchaseState},
            purchase_request::{PlatformPurchaseRequest, PurchaseOptions},
        },
        repositories::billing_repository::{AndroidBillingExtensions, BillingRepository},
    },
    errors::{DeveloperError, MalformedNativePurchase, PurchaseError, SkuNotFound},
};

const PRODUCT_TYPE_INAPP: &str = "inapp";
const PRODUCT_TYPE_SUBS: &str = "subs";
const SUBSCRIPTION_CENTER_URL: &str = "https://play.google.com/store/account/subscriptions";

pub struct PlayBillingRepositoryImpl<D: PlayBillingDatasource> {
    datasource: D,
    /// Product details from `fetch_products`, required to launch a flow.
    product_cache: Mutex<HashMap<String, PlayProductDetailsModel>>,
}

impl<D: PlayBillingDatasource> PlayBillingRepositoryImpl<D> {
    pub(crate) fn new(datasource: D) -> Self {
        Self {
            datasource,
            product_cache: Mutex::new(HashMap::new()),
        }
    }

    fn product_cache(&self) -> MutexGuard<'_, HashMap<String, PlayProductDetailsModel>> {
        self.product_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn query_purchases(&self, product_type: &str) -> Result<Vec<Purchase>, PurchaseError> {
        let models = self
            .datasource
            .query_purchases(product_type)
            .await
            .map_err(PurchaseError::from_billing_result)?;
        let mut purchases = Vec::with_capacity(models.len());
        for m in models {
            match Purchase::from_play_billing_purchase(m) {
                Ok(p) => purchases.push(p),
                Err(e) => tracing::warn!(error = %e, product_type, "skipping unreadable purchase"),
            }
        }
        Ok(purchases)
    }

    /// Play Billing can only launch flows for products it returned earlier.
    fn ensure_fetched(&self, skus: &[String]) -> Result<(), PurchaseError> {
        let cache = self.product_cache();
        match skus.iter().find(|sku| !cache.contains_key(*sku)) {
            Some(unknown) => Err(SkuNotFound::new("Call fetchProducts first.")
                .with_product_id(unknown)
                .with_platform(Platform::Android)),
            None => Ok(()),
        }
    }

    fn build_flow_params(
        &self,
        request: &PlatformPurchaseRequest,
    ) -> Result<BillingFlowParamsModel, PurchaseError> {
        let PlatformPurchaseRequest::Android {
            props,
            product_type,
        } = request
        else {
            return Err(DeveloperError::new("expected an Android purchase request."));
        };
        self.ensure_fetched(&props.skus)?;
        let offers = props.subscription_offers.as_deref().unwrap_or_default();
        Ok(BillingFlowParamsModel {
            product_type: match product_type {
                ProductType::InApp => PRODUCT_TYPE_INAPP,
                ProductType::Subs => PRODUCT_TYPE_SUBS,
            }
            .to_string(),
            product_details_params: props
                .skus
                .iter()
                .map(|sku| ProductDetailsParamsModel {
                    product_id: sku.clone(),
                    offer_token: offers
                        .iter()
                        .find(|o| &o.sku == sku)
                        .map(|o| o.offer_token.clone()),
                })
                .collect(),
            obfuscated_account_id: props.obfuscated_account_id_android.clone(),
            obfuscated_profile_id: props.obfuscated_profile_id_android.clone(),
            is_offer_personalized: props.is_offer_personalized.unwrap_or(false),
            subscription_update: props.purchase_token_android.as_ref().map(|token| {
                SubscriptionUpdateParamsModel {
                    old_purchase_token: token.clone(),
                    replacement_mode: props
                        .replacement_mode_android
                        .map(|m| m.raw_value())
                        .unwrap_or_default(),
                }
            }),
        })
    }
}

#[async_trait]
impl<D: PlayBillingDatasource> BillingRepository for PlayBillingRepositoryImpl<D> {
    fn platform(&self) -> Platform {
        Platform::Android
    }

    fn attach_listeners(&self, sender: NativeEventSender) {
        self.datasource
            .set_event_sink(Some(PlayBillingEventSink::new(sender)));
    }

    fn detach_listeners(&self) {
        self.datasource.set_event_sink(None);
    }

    async fn init_connection(&self, config: &InitConnectionConfig) -> Result<bool, PurchaseError> {
        self.datasource
            .start_connection(config.alternative_billing_mode_android)
            .await
            .map_err(PurchaseError::from_billing_result)?;
        Ok(true)
    }

    async fn end_connection(&self) -> Result<(), PurchaseError> {
        self.datasource
            .end_connection()
            .await
            .map_err(PurchaseError::from_billing_result)
    }

    async fn fetch_products(
        &self,
        skus: &[String],
        query_type: ProductQueryType,
    ) -> Result<Vec<Product>, PurchaseError> {
        let product_types: &[&str] = match query_type {
            ProductQueryType::InApp => &[PRODUCT_TYPE_INAPP],
            ProductQueryType::Subs => &[PRODUCT_TYPE_SUBS],
            ProductQueryType::All => &[PRODUCT_TYPE_INAPP, PRODUCT_TYPE_SUBS],
        };
        let mut products = Vec::new();
        for product_type in product_types {
            let details = self
                .datasource
                .query_product_details(skus, product_type)
                .await
                .map_err(PurchaseError::from_billing_result)?;
            let mut cache = self.product_cache();
            for m in details {
                cache.insert(m.product_id.clone(), m.clone());
                products.push(Product::from_play_product_details(m));
            }
        }
        Ok(products)
    }

    fn check_purchase_request(
        &self,
        request: &PlatformPurchaseRequest,
    ) -> Result<(), PurchaseError> {
        match request {
            PlatformPurchaseRequest::Android { props, .. } => self.ensure_fetched(&props.skus),
            PlatformPurchaseRequest::Ios(_) => Err(DeveloperError::new(
                "expected an Android purchase request.",
            )),
        }
    }

    async fn request_purchase(
        &self,
        request: &PlatformPurchaseRequest,
    ) -> Result<(), PurchaseError> {
        let params = self.build_flow_params(request)?;
        self.datasource
            .launch_billing_flow(&params)
            .await
            .map_err(|e| {
                PurchaseError::from_billing_result(e).with_product_id(request.primary_sku())
            })
    }

    async fn finish_transaction(
        &self,
        purchase: &Purchase,
        is_consumable: bool,
    ) -> Result<(), PurchaseError> {
        let Purchase::Android(p) = purchase else {
            return Err(DeveloperError::new("expected an Android purchase."));
        };
        let token = p.purchase_token.as_deref().filter(|t| !t.is_empty()).ok_or_else(|| {
            DeveloperError::new("purchaseToken is required to finish an Android purchase.")
                .with_product_id(&p.product_id)
        })?;
        let result = if is_consumable {
            self.datasource.consume_purchase(token).await
        } else if p.is_acknowledged_android != Some(true) {
            self.datasource.acknowledge_purchase(token).await
        } else {
            tracing::debug!(product_id = p.product_id.as_str(), "purchase already acknowledged");
            Ok(())
        };
        result.map_err(|e| PurchaseError::from_billing_result(e).with_product_id(&p.product_id))
    }

    async fn get_available_purchases(
        &self,
        _options: &PurchaseOptions,
    ) -> Result<Vec<Purchase>, PurchaseError> {
        let mut purchases = self.query_purchases(PRODUCT_TYPE_INAPP).await?;
        purchases.extend(self.query_purchases(PRODUCT_TYPE_SUBS).await?);
        Ok(purchases)
    }

    async fn get_active_subscriptions(
        &self,
        subscription_ids: &[String],
    ) -> Result<Vec<ActiveSubscription>, PurchaseError> {
        let purchases = self.query_purchases(PRODUCT_TYPE_SUBS).await?;
        let mut subscriptions = Vec::new();
        for purchase in purchases {
            let Purchase::Android(p) = purchase else {
                continue;
            };
            if p.purchase_state != PurchaseState::Purchased {
                continue;
            }
            let product_ids = p.ids.clone().unwrap_or_else(|| vec![p.product_id.clone()]);
            for product_id in product_ids {
                if !subscription_ids.is_empty() && !subscription_ids.contains(&product_id) {
                    continue;
                }
                subscriptions.push(ActiveSubscription {
                    product_id,
                    is_active: true,
                    transaction_id: p.transaction_id.clone().unwrap_or_else(|| p.id.clone()),
                    purchase_token: p.purchase_token.clone(),
                    transaction_date: p.transaction_date,
                    platform: Platform::Android,
                    will_expire_soon: None,
                    expiration_date_ios: None,
                    days_until_expiration_ios: None,
                    environment_ios: None,
                    renewal_info_ios: None,
                    auto_renewing_android: Some(p.is_auto_renewing),
                });
            }
        }
        Ok(subscriptions)
    }

    async fn get_storefront(&self) -> Result<String, PurchaseError> {
        self.datasource
            .billing_country_code()
            .await
            .map_err(PurchaseError::from_billing_result)
    }

    fn android(&self) -> Option<&dyn AndroidBillingExtensions> {
        Some(self)
    }
}

#[async_trait]
impl<D: PlayBillingDatasource> AndroidBillingExtensions for PlayBillingRepositoryImpl<D> {
    async fn acknowledge_purchase(&self, purchase_token: &str) -> Result<(), PurchaseError> {
        self.datasource
            .acknowledge_purchase(purchase_token)
            .await
            .map_err(PurchaseError::from_billing_result)
    }

    async fn consume_purchase(&self, purchase_token: &str) -> Result<(), PurchaseError> {
        self.datasource
            .consume_purchase(purchase_token)
            .await
            .map_err(PurchaseError::from_billing_result)
    }

    async fn deep_link_to_subscriptions(
        &self,
        sku: Option<&str>,
        package_name: &str,
    ) -> Result<(), PurchaseError> {
        let url = match sku {
            Some(sku) => format!("{SUBSCRIPTION_CENTER_URL}?sku={sku}&package={package_name}"),
            None => SUBSCRIPTION_CENTER_URL.to_string(),
        };
        self.datasource
            .open_url(&url)
            .await
            .map_err(PurchaseError::from_billing_result)
    }

    async fn check_alternative_billing_availability(&self) -> Result<bool, PurchaseError> {
        self.datasource
            .is_alternative_billing_available()
            .await
            .map_err(PurchaseError::from_billing_result)
    }

    async fn show_alternative_billing_dialog(&self) -> Result<bool, PurchaseError> {
        self.datasource
            .show_alternative_billing_dialog()
            .await
            .map_err(PurchaseError::from_billing_result)
    }

    async fn create_alternative_billing_token(&self) -> Result<Option<String>, PurchaseError> {
        self.datasource
            .create_alternative_billing_token()
            .await
            .map_err(PurchaseError::from_billing_result)
    }
}

impl PurchaseError {
    pub(crate) fn from_billing_result(m: BillingResultModel) -> Self {
        let mut error =
            PurchaseError::from_native(&m.native_code(), Platform::Android, m.debug_message.clone());
        if !m.debug_message.is_empty() {
            error = error.with_debug_message(m.debug_message);
        }
        if let Some(product_id) = m.product_id {
            error = error.with_product_id(product_id);
        }
        error
    }
}

impl Purchase {
    /// One canonical purchase per Play purchase; multi-line purchases list
    /// every product in `ids`, the first one being `productId`.
    pub(crate) fn from_play_billing_purchase(
        m: PlayBillingPurchaseModel,
    ) -> Result<Self, PurchaseError> {
        let Some(product_id) = m.products.first().cloned() else {
            return Err(MalformedNativePurchase::new("purchase lists no products.")
                .with_platform(Platform::Android));
        };
        let order_id = m.order_id.filter(|o| !o.is_empty());
        Ok(Purchase::Android(PurchaseAndroid {
            id: order_id.clone().unwrap_or_else(|| m.purchase_token.clone()),
            ids: (m.products.len() > 1).then_some(m.products),
            product_id,
            transaction_id: order_id,
            transaction_date: m.purchase_time,
            purchase_token: Some(m.purchase_token),
            purchase_state: match m.purchase_state {
                PurchaseStateModel::Purchased => PurchaseState::Purchased,
                PurchaseStateModel::Pending => PurchaseState::Pending,
                PurchaseStateModel::Unspecified => PurchaseState::Unknown,
            },
            quantity: m.quantity,
            is_auto_renewing: m.is_auto_renewing,
            data_android: m.original_json,
            signature_android: m.signature,
            auto_renewing_android: Some(m.is_auto_renewing),
            is_acknowledged_android: Some(m.is_acknowledged),
            package_name_android: m.package_name,
            obfuscated_account_id_android: m.obfuscated_account_id,
            obfuscated_profile_id_android: m.obfuscated_profile_id,
            developer_payload_android: m.developer_payload,
        }))
    }
}

impl Product {
    pub(crate) fn from_play_product_details(m: PlayProductDetailsModel) -> Self {
        let product_type = if m.product_type == PRODUCT_TYPE_SUBS {
            ProductType::Subs
        } else {
            ProductType::InApp
        };
        // Subscriptions are priced by the first phase of their first offer.
        let (display_price, micros, currency) = match (
            &m.one_time_purchase_offer_details,
            m.subscription_offer_details
                .as_ref()
                .and_then(|offers| offers.first())
                .and_then(|offer| offer.pricing_phases.first()),
        ) {
            (Some(o), _) => (
                o.formatted_price.clone(),
                Some(o.price_amount_micros),
                Some(o.price_currency_code.clone()),
            ),
            (None, Some(phase)) => (
                phase.formatted_price.clone(),
                Some(phase.price_amount_micros),
                Some(phase.price_currency_code.clone()),
            ),
            (None, None) => (String::new(), None, None),
        };
        Product::Android(ProductAndroid {
            id: m.product_id,
            title: m.title,
            description: m.description,
            product_type,
            display_price,
            currency,
            price: micros.map(|micros| micros as f64 / 1_000_000.0),
            name_android: m.name,
            subscription_offer_details_android: m.subscription_offer_details.map(|offers| {
                offers
                    .into_iter()
                    .map(|o| SubscriptionOfferAndroid {
                        base_plan_id: o.base_plan_id,
                        offer_id: o.offer_id,
                        offer_token: o.offer_token,
                        offer_tags: o.offer_tags,
                        pricing_phases: o
                            .pricing_phases
                            .into_iter()
                            .map(|p| PricingPhaseAndroid {
                                formatted_price: p.formatted_price,
                                price_amount_micros: p.price_amount_micros,
                                price_currency_code: p.price_currency_code,
                                billing_period: p.billing_period,
                                billing_cycle_count: p.billing_cycle_count,
                                recurrence_mode: p.recurrence_mode,
                            })
                            .collect(),
                    })
                    .collect()
            }),
        })
    }
}
