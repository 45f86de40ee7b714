use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::{
    data::{
        datasources::{
            store_kit_datasource::{StoreKitDatasource, StoreKitEventSink},
            utils::decode_jws_payload,
        },
        models::store_kit::{
            jws_transaction_payload_model::JwsTransactionPayloadModel,
            product_model::{StoreKitProductModel, StoreKitProductType},
            purchase_params_model::{StoreKitPromotionalOfferModel, StoreKitPurchaseParamsModel},
            store_kit_error_model::StoreKitErrorModel,
            subscription_status_model::StoreKitSubscriptionStatusModel,
            transaction_model::StoreKitTransactionModel,
        },
    },
    domain::{
        entities::{
            active_subscription::{ActiveSubscription, RenewalInfoIos},
            bridge_event::NativeEventSender,
            connection_config::InitConnectionConfig,
            platform::Platform,
            product::{Product, ProductIos, ProductQueryType, ProductType, SubscriptionInfoIos},
            purchase::{Purchase, PurchaseIos, PurchaseOfferIos, PurchaseState},
            purchase_request::{PlatformPurchaseRequest, PurchaseOptions},
        },
        repositories::billing_repository::{BillingRepository, IosBillingExtensions},
    },
    errors::{DeveloperError, ItemNotOwned, PurchaseError},
};

/// Subscriptions expiring within this window are flagged `willExpireSoon`.
const EXPIRING_SOON_DAYS: i64 = 7;

pub struct AppStoreBillingRepositoryImpl<D: StoreKitDatasource> {
    datasource: D,
}

impl<D: StoreKitDatasource> AppStoreBillingRepositoryImpl<D> {
    pub(crate) fn new(datasource: D) -> Self {
        Self { datasource }
    }

    async fn latest_status(
        &self,
        product_id: &str,
    ) -> Result<Option<StoreKitSubscriptionStatusModel>, PurchaseError> {
        let statuses = self
            .datasource
            .subscription_statuses(product_id)
            .await
            .map_err(PurchaseError::from_store_kit)?;
        Ok(statuses
            .into_iter()
            .filter(|s| s.transaction.product_id == product_id)
            .max_by_key(|s| s.transaction.purchase_date))
    }
}

#[async_trait]
impl<D: StoreKitDatasource> BillingRepository for AppStoreBillingRepositoryImpl<D> {
    fn platform(&self) -> Platform {
        Platform::Ios
    }

    fn attach_listeners(&self, sender: NativeEventSender) {
        self.datasource
            .set_event_sink(Some(StoreKitEventSink::new(sender)));
    }

    fn detach_listeners(&self) {
        self.datasource.set_event_sink(None);
    }

    async fn init_connection(&self, _config: &InitConnectionConfig) -> Result<bool, PurchaseError> {
        self.datasource
            .can_make_payments()
            .await
            .map_err(PurchaseError::from_store_kit)
    }

    async fn end_connection(&self) -> Result<(), PurchaseError> {
        // StoreKit has no connection to close; the observer is detached by
        // the caller.
        Ok(())
    }

    async fn fetch_products(
        &self,
        skus: &[String],
        query_type: ProductQueryType,
    ) -> Result<Vec<Product>, PurchaseError> {
        let products = self
            .datasource
            .products(skus)
            .await
            .map_err(PurchaseError::from_store_kit)?;
        Ok(products
            .into_iter()
            .map(Product::from_store_kit_product)
            .filter(|p| query_type.includes(p.product_type()))
            .collect())
    }

    async fn request_purchase(
        &self,
        request: &PlatformPurchaseRequest,
    ) -> Result<(), PurchaseError> {
        let PlatformPurchaseRequest::Ios(props) = request else {
            return Err(DeveloperError::new("expected an iOS purchase request."));
        };
        let params = StoreKitPurchaseParamsModel {
            product_id: props.sku.clone(),
            quantity: props.quantity.unwrap_or(1),
            app_account_token: props.app_account_token.clone(),
            promotional_offer: props.with_offer.as_ref().map(|o| StoreKitPromotionalOfferModel {
                offer_id: o.identifier.clone(),
                key_id: o.key_identifier.clone(),
                nonce: o.nonce.clone(),
                signature: o.signature.clone(),
                timestamp: o.timestamp,
            }),
            finish_automatically: props
                .and_dangerously_finish_transaction_automatically
                .unwrap_or(false),
        };
        self.datasource
            .purchase(&params)
            .await
            .map_err(|e| PurchaseError::from_store_kit(e).with_product_id(&props.sku))
    }

    async fn finish_transaction(
        &self,
        purchase: &Purchase,
        _is_consumable: bool,
    ) -> Result<(), PurchaseError> {
        let Purchase::Ios(p) = purchase else {
            return Err(DeveloperError::new("expected an iOS purchase."));
        };
        self.datasource
            .finish(&p.id)
            .await
            .map_err(|e| PurchaseError::from_store_kit(e).with_product_id(&p.product_id))
    }

    async fn get_available_purchases(
        &self,
        options: &PurchaseOptions,
    ) -> Result<Vec<Purchase>, PurchaseError> {
        let transactions = if options.only_include_active_items_ios {
            self.datasource.current_entitlements().await
        } else {
            self.datasource.all_transactions().await
        }
        .map_err(PurchaseError::from_store_kit)?;
        Ok(transactions
            .into_iter()
            .map(Purchase::from_store_kit_transaction)
            .collect())
    }

    async fn get_active_subscriptions(
        &self,
        subscription_ids: &[String],
    ) -> Result<Vec<ActiveSubscription>, PurchaseError> {
        let entitlements = self
            .datasource
            .current_entitlements()
            .await
            .map_err(PurchaseError::from_store_kit)?;
        let now = Utc::now();
        let mut subscriptions = Vec::new();
        for transaction in entitlements {
            let is_subscription =
                transaction.subscription_group_id.is_some() || transaction.expiration_date.is_some();
            if !is_subscription {
                continue;
            }
            if !subscription_ids.is_empty() && !subscription_ids.contains(&transaction.product_id) {
                continue;
            }
            let status = match self.latest_status(&transaction.product_id).await {
                Ok(status) => status,
                Err(e) => {
                    tracing::warn!(
                        product_id = transaction.product_id.as_str(),
                        error = %e,
                        "subscription status unavailable, using entitlement only"
                    );
                    None
                }
            };
            subscriptions.push(ActiveSubscription::from_store_kit(transaction, status, now));
        }
        Ok(subscriptions)
    }

    async fn get_storefront(&self) -> Result<String, PurchaseError> {
        self.datasource
            .storefront_country_code()
            .await
            .map_err(PurchaseError::from_store_kit)
    }

    fn ios(&self) -> Option<&dyn IosBillingExtensions> {
        Some(self)
    }
}

#[async_trait]
impl<D: StoreKitDatasource> IosBillingExtensions for AppStoreBillingRepositoryImpl<D> {
    async fn get_receipt_data(&self) -> Result<String, PurchaseError> {
        self.datasource
            .app_receipt()
            .await
            .map_err(PurchaseError::from_store_kit)
    }

    async fn sync(&self) -> Result<(), PurchaseError> {
        self.datasource
            .sync()
            .await
            .map_err(PurchaseError::from_store_kit)
    }

    async fn show_manage_subscriptions(&self) -> Result<Vec<Purchase>, PurchaseError> {
        let changed = self
            .datasource
            .show_manage_subscriptions()
            .await
            .map_err(PurchaseError::from_store_kit)?;
        Ok(changed
            .into_iter()
            .map(Purchase::from_store_kit_transaction)
            .collect())
    }

    async fn begin_refund_request(&self, sku: &str) -> Result<Option<String>, PurchaseError> {
        let latest = self
            .datasource
            .current_entitlements()
            .await
            .map_err(PurchaseError::from_store_kit)?
            .into_iter()
            .filter(|t| t.product_id == sku)
            .max_by_key(|t| t.purchase_date)
            .ok_or_else(|| {
                ItemNotOwned::new("")
                    .with_product_id(sku)
                    .with_platform(Platform::Ios)
            })?;
        self.datasource
            .begin_refund_request(&latest.id)
            .await
            .map_err(|e| PurchaseError::from_store_kit(e).with_product_id(sku))
    }

    async fn get_promoted_product(&self) -> Result<Option<Product>, PurchaseError> {
        Ok(self
            .datasource
            .promoted_product()
            .await
            .map_err(PurchaseError::from_store_kit)?
            .map(Product::from_store_kit_product))
    }

    async fn request_purchase_on_promoted_product(&self) -> Result<(), PurchaseError> {
        self.datasource
            .purchase_promoted_product()
            .await
            .map_err(PurchaseError::from_store_kit)
    }

    async fn is_eligible_for_intro_offer(&self, group_id: &str) -> Result<bool, PurchaseError> {
        self.datasource
            .is_eligible_for_intro_offer(group_id)
            .await
            .map_err(PurchaseError::from_store_kit)
    }

    async fn present_code_redemption_sheet(&self) -> Result<bool, PurchaseError> {
        self.datasource
            .present_code_redemption_sheet()
            .await
            .map_err(PurchaseError::from_store_kit)?;
        Ok(true)
    }

    async fn clear_transactions(&self) -> Result<(), PurchaseError> {
        let unfinished = self
            .datasource
            .unfinished_transactions()
            .await
            .map_err(PurchaseError::from_store_kit)?;
        tracing::debug!(count = unfinished.len(), "finishing unfinished transactions");
        for transaction in unfinished {
            self.datasource
                .finish(&transaction.id)
                .await
                .map_err(|e| PurchaseError::from_store_kit(e).with_product_id(transaction.product_id))?;
        }
        Ok(())
    }
}

impl PurchaseError {
    pub(crate) fn from_store_kit(m: StoreKitErrorModel) -> Self {
        let mut error = PurchaseError::from_native(&m.code, Platform::Ios, m.message);
        if let Some(product_id) = m.product_id {
            error = error.with_product_id(product_id);
        }
        if let Some(description) = m.underlying_description {
            error = error.with_debug_message(description);
        }
        error
    }
}

impl Purchase {
    /// Maps a StoreKit transaction, filling fields the host left out from the
    /// transaction's JWS payload when one is attached.
    pub(crate) fn from_store_kit_transaction(m: StoreKitTransactionModel) -> Self {
        let jws = m
            .jws_representation
            .as_deref()
            .and_then(|jws| {
                decode_jws_payload::<JwsTransactionPayloadModel>(jws)
                    .map_err(|e| tracing::debug!(error = %e, "JWS enrichment skipped"))
                    .ok()
            })
            .unwrap_or_default();

        let expiration_date = m.expiration_date.or_else(|| {
            jws.expires_date
                .and_then(DateTime::<Utc>::from_timestamp_millis)
        });
        let offer = match m.offer {
            Some(o) => Some(PurchaseOfferIos {
                id: o.id,
                offer_type: o.offer_type.as_str().to_string(),
                payment_mode: o.payment_mode.map(|p| p.as_str().to_string()),
            }),
            None => jws.offer_type.map(|t| PurchaseOfferIos {
                id: jws.offer_identifier,
                offer_type: t.as_str().to_string(),
                payment_mode: jws.offer_discount_type.map(|p| p.as_str().to_string()),
            }),
        };
        let is_subscription = m.subscription_group_id.is_some() || expiration_date.is_some();

        Purchase::Ios(PurchaseIos {
            transaction_id: Some(m.transaction_id.unwrap_or_else(|| m.id.clone())),
            id: m.id,
            ids: None,
            product_id: m.product_id,
            transaction_date: m.purchase_date,
            purchase_token: m.jws_representation,
            purchase_state: PurchaseState::Purchased,
            quantity: m.purchased_quantity,
            is_auto_renewing: is_subscription && m.revocation_date.is_none(),
            original_transaction_identifier_ios: m.original_id,
            original_transaction_date_ios: m.original_purchase_date,
            expiration_date_ios: expiration_date,
            revocation_date_ios: m.revocation_date,
            revocation_reason_ios: m.revocation_reason.map(|r| r.as_str().to_string()),
            app_account_token_ios: m
                .app_account_token
                .or(jws.app_account_token)
                .filter(|t| !t.is_empty()),
            environment_ios: m
                .environment
                .or(jws.environment)
                .map(|e| e.as_str().to_string()),
            ownership_type_ios: m.ownership_type.map(|o| o.as_str().to_string()),
            subscription_group_id_ios: m.subscription_group_id,
            web_order_line_item_id_ios: m.web_order_line_item_id,
            is_upgraded_ios: Some(m.is_upgraded),
            reason_ios: m
                .reason
                .or(jws.transaction_reason)
                .map(|r| r.as_str().to_string()),
            storefront_country_code_ios: m.storefront_country_code.or(jws.storefront),
            offer_ios: offer,
        })
    }
}

impl Product {
    pub(crate) fn from_store_kit_product(m: StoreKitProductModel) -> Self {
        let (product_type, type_ios) = match m.product_type {
            StoreKitProductType::Consumable => (ProductType::InApp, "consumable"),
            StoreKitProductType::NonConsumable => (ProductType::InApp, "non-consumable"),
            StoreKitProductType::AutoRenewable => (ProductType::Subs, "auto-renewable"),
            StoreKitProductType::NonRenewable => (ProductType::InApp, "non-renewing"),
        };
        Product::Ios(ProductIos {
            title: m.display_name.clone(),
            display_name_ios: m.display_name,
            id: m.id,
            description: m.description,
            product_type,
            display_price: m.display_price,
            currency: m.currency_code,
            price: Some(m.price),
            is_family_shareable_ios: m.is_family_shareable,
            type_ios: type_ios.to_string(),
            subscription_info_ios: m.subscription.map(|s| SubscriptionInfoIos {
                subscription_group_id: s.subscription_group_id,
                subscription_period_unit: s.period_unit,
                subscription_period_value: s.period_value,
                introductory_offer_display_price: s.introductory_offer_display_price,
            }),
            json_representation_ios: m.json_representation,
        })
    }
}

impl ActiveSubscription {
    fn from_store_kit(
        transaction: StoreKitTransactionModel,
        status: Option<StoreKitSubscriptionStatusModel>,
        now: DateTime<Utc>,
    ) -> Self {
        let expiration = transaction.expiration_date;
        let is_active = match &status {
            Some(s) => s.state.grants_access(),
            None => transaction.revocation_date.is_none() && expiration.map_or(true, |e| e > now),
        };
        let renewal_info_ios = status.and_then(|s| s.renewal_info).map(|r| RenewalInfoIos {
            will_auto_renew: r.will_auto_renew,
            auto_renew_preference: r.auto_renew_preference,
            expiration_reason: r.expiration_reason,
            renewal_date: r.renewal_date,
            grace_period_expiration_date: r.grace_period_expiration_date,
            is_in_billing_retry: r.is_in_billing_retry,
            jws_representation: r.jws_representation,
        });
        Self {
            product_id: transaction.product_id,
            is_active,
            transaction_id: transaction.id,
            purchase_token: transaction.jws_representation,
            transaction_date: transaction.purchase_date,
            platform: Platform::Ios,
            will_expire_soon: expiration
                .map(|e| e > now && e - now < Duration::days(EXPIRING_SOON_DAYS)),
            expiration_date_ios: expiration,
            days_until_expiration_ios: expiration.map(|e| (e - now).num_days()),
            environment_ios: transaction.environment.map(|e| e.as_str().to_string()),
            renewal_info_ios,
            auto_renewing_android: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::{
            datasources::utils::encode_test_jws,
            models::store_kit::{
                common::{Environment, OfferType},
                subscription_status_model::{RenewalState, StoreKitRenewalInfoModel},
                transaction_model::StoreKitOfferModel,
            },
        },
        domain::entities::error_code::ErrorCode,
    };

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    fn transaction(id: &str, product_id: &str) -> StoreKitTransactionModel {
        StoreKitTransactionModel {
            id: id.to_string(),
            product_id: product_id.to_string(),
            purchase_date: at(1_700_000_000_000),
            purchased_quantity: 1,
            ..Default::default()
        }
    }

    fn ios(purchase: Purchase) -> PurchaseIos {
        match purchase {
            Purchase::Ios(p) => p,
            Purchase::Android(_) => panic!("expected iOS purchase"),
        }
    }

    #[test]
    fn maps_core_fields() {
        let mut m = transaction("2000000001", "premium");
        m.original_id = Some("1000000001".to_string());
        m.environment = Some(Environment::Sandbox);
        m.jws_representation = Some("header.e30.sig".to_string());
        let p = ios(Purchase::from_store_kit_transaction(m));
        assert_eq!(p.id, "2000000001");
        assert_eq!(p.transaction_id.as_deref(), Some("2000000001"));
        assert_eq!(p.product_id, "premium");
        assert_eq!(p.purchase_token.as_deref(), Some("header.e30.sig"));
        assert_eq!(p.original_transaction_identifier_ios.as_deref(), Some("1000000001"));
        assert_eq!(p.environment_ios.as_deref(), Some("Sandbox"));
        assert!(!p.is_auto_renewing);
    }

    #[test]
    fn keeps_legacy_transaction_id() {
        let mut m = transaction("2000000001", "premium");
        m.transaction_id = Some("legacy-1".to_string());
        let p = Purchase::from_store_kit_transaction(m);
        assert_eq!(p.transaction_id(), Some("legacy-1"));
    }

    #[test]
    fn fills_missing_fields_from_jws() {
        let mut m = transaction("1", "monthly");
        m.subscription_group_id = Some("group".to_string());
        m.jws_representation = Some(encode_test_jws(&serde_json::json!({
            "environment": "Production",
            "storefront": "USA",
            "appAccountToken": "token-uuid",
            "offerType": 1,
            "offerDiscountType": "FREE_TRIAL",
            "expiresDate": 1_800_000_000_000i64,
        })));
        let p = ios(Purchase::from_store_kit_transaction(m));
        assert_eq!(p.environment_ios.as_deref(), Some("Production"));
        assert_eq!(p.storefront_country_code_ios.as_deref(), Some("USA"));
        assert_eq!(p.app_account_token_ios.as_deref(), Some("token-uuid"));
        assert_eq!(p.expiration_date_ios, Some(at(1_800_000_000_000)));
        let offer = p.offer_ios.unwrap();
        assert_eq!(offer.offer_type, "introductory");
        assert_eq!(offer.payment_mode.as_deref(), Some("FREE_TRIAL"));
        assert!(p.is_auto_renewing);
    }

    #[test]
    fn host_fields_win_over_jws() {
        let mut m = transaction("1", "monthly");
        m.storefront_country_code = Some("CAN".to_string());
        m.offer = Some(StoreKitOfferModel {
            id: Some("promo".to_string()),
            offer_type: OfferType::Promotional,
            payment_mode: None,
        });
        m.jws_representation = Some(encode_test_jws(&serde_json::json!({
            "storefront": "USA",
            "offerType": 1,
        })));
        let p = ios(Purchase::from_store_kit_transaction(m));
        assert_eq!(p.storefront_country_code_ios.as_deref(), Some("CAN"));
        assert_eq!(p.offer_ios.unwrap().offer_type, "promotional");
    }

    #[test]
    fn unreadable_jws_is_ignored() {
        let mut m = transaction("1", "premium");
        m.jws_representation = Some("not-a-jws".to_string());
        let p = ios(Purchase::from_store_kit_transaction(m));
        assert_eq!(p.purchase_token.as_deref(), Some("not-a-jws"));
        assert!(p.environment_ios.is_none());
    }

    #[test]
    fn store_kit_errors_are_translated() {
        let e = PurchaseError::from_store_kit(
            StoreKitErrorModel::new("userCancelled", "cancelled").for_product("premium"),
        );
        assert_eq!(e.code(), ErrorCode::UserCancelled);
        assert_eq!(e.product_id(), Some("premium"));
        assert_eq!(e.platform(), Some(Platform::Ios));

        let e = PurchaseError::from_store_kit(StoreKitErrorModel::new(2, "cancelled"));
        assert_eq!(e.code(), ErrorCode::UserCancelled);
        assert_eq!(e.response_code(), Some(2));
    }

    #[test]
    fn active_subscription_uses_status_when_available() {
        let now = at(1_700_000_000_000);
        let mut m = transaction("1", "monthly");
        m.subscription_group_id = Some("group".to_string());
        m.expiration_date = Some(now + Duration::days(3));
        let status = StoreKitSubscriptionStatusModel {
            state: RenewalState::InBillingRetryPeriod,
            transaction: m.clone(),
            renewal_info: Some(StoreKitRenewalInfoModel {
                is_in_billing_retry: true,
                ..Default::default()
            }),
        };
        let s = ActiveSubscription::from_store_kit(m.clone(), Some(status), now);
        assert!(!s.is_active);
        assert_eq!(s.will_expire_soon, Some(true));
        assert_eq!(s.days_until_expiration_ios, Some(3));
        assert!(s.renewal_info_ios.unwrap().is_in_billing_retry);

        let s = ActiveSubscription::from_store_kit(m, None, now);
        assert!(s.is_active);
    }

    #[test]
    fn expired_subscription_is_not_expiring_soon() {
        let now = at(1_700_000_000_000);
        let mut m = transaction("1", "monthly");
        m.subscription_group_id = Some("group".to_string());
        m.expiration_date = Some(now - Duration::days(1));

        let s = ActiveSubscription::from_store_kit(m.clone(), None, now);
        assert!(!s.is_active);
        assert_eq!(s.will_expire_soon, Some(false));
        assert_eq!(s.days_until_expiration_ios, Some(-1));

        m.expiration_date = Some(now + Duration::days(10));
        let s = ActiveSubscription::from_store_kit(m, None, now);
        assert_eq!(s.will_expire_soon, Some(false));
    }
}
