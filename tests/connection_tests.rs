mod common;

use std::sync::{atomic::Ordering, Arc};

use common::{
    next_event, play_product, transaction, wait_until, InitGate, MockPlayBilling, MockStoreKit,
};
use fractic_iap_bridge::{
    data::models::{
        play_billing::billing_result_model::BillingResultModel,
        store_kit::store_kit_error_model::StoreKitErrorModel,
    },
    domain::entities::{
        product::ProductType,
        purchase_request::{
            AndroidSubscriptionOfferInput, FetchProductsRequest, RequestPurchaseAndroidProps,
            RequestPurchaseIosProps, RequestPurchaseProps, RequestPurchasePropsByPlatforms,
        },
    },
    BridgeConfig, BridgeEvent, ErrorCode, EventBufferPolicy, IapUtil,
};
use tokio::task::JoinSet;

fn ios_request(sku: &str) -> RequestPurchaseProps {
    RequestPurchaseProps {
        request: RequestPurchasePropsByPlatforms {
            ios: Some(RequestPurchaseIosProps {
                sku: sku.to_string(),
                ..Default::default()
            }),
            android: None,
        },
        product_type: ProductType::InApp,
    }
}

fn android_request(sku: &str) -> RequestPurchaseProps {
    RequestPurchaseProps {
        request: RequestPurchasePropsByPlatforms {
            ios: None,
            android: Some(RequestPurchaseAndroidProps {
                skus: vec![sku.to_string()],
                ..Default::default()
            }),
        },
        product_type: ProductType::InApp,
    }
}

#[tokio::test]
async fn events_raised_during_init_are_delivered_after_it_resolves() {
    let (mock, gate) = MockStoreKit::gated();
    let iap = Arc::new(IapUtil::app_store(mock.clone(), BridgeConfig::default()).unwrap());
    let mut events = iap.subscribe();

    let init = tokio::spawn({
        let iap = Arc::clone(&iap);
        async move { iap.init_connection(None).await }
    });
    wait_until(|| mock.has_sink()).await;

    let sink = mock.sink();
    for (i, id) in ["t1", "t2", "t3"].iter().enumerate() {
        sink.on_transaction_updated(transaction(id, "p1", 100 + i as i64));
    }
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(events.try_recv().is_err(), "delivered before init resolved");
    assert!(!iap.is_connected());

    gate.open();
    assert!(init.await.unwrap().unwrap());

    let mut ids = Vec::new();
    for _ in 0..3 {
        match next_event(&mut events).await {
            BridgeEvent::PurchaseUpdated(p) => ids.push(p.id().to_string()),
            other => panic!("unexpected event {other:?}"),
        }
    }
    assert_eq!(ids, vec!["t1", "t2", "t3"]);

    sink.on_transaction_updated(transaction("t4", "p1", 200));
    match next_event(&mut events).await {
        BridgeEvent::PurchaseUpdated(p) => assert_eq!(p.id(), "t4"),
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn concurrent_init_attaches_listeners_once() {
    let (mock, gate) = MockPlayBilling::gated();
    let iap = Arc::new(IapUtil::play_billing(mock.clone(), BridgeConfig::default()).unwrap());

    let mut tasks = JoinSet::new();
    for _ in 0..10 {
        let iap = Arc::clone(&iap);
        tasks.spawn(async move { iap.init_connection(None).await });
    }
    wait_until(|| mock.state.init_calls.load(Ordering::SeqCst) == 1).await;
    gate.open();

    let mut successes = 0;
    while let Some(result) = tasks.join_next().await {
        assert!(result.unwrap().unwrap());
        successes += 1;
    }
    assert_eq!(successes, 10);
    assert!(iap.init_connection(None).await.unwrap());

    assert_eq!(mock.state.init_calls.load(Ordering::SeqCst), 1);
    assert_eq!(mock.state.sink_attachments.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn operations_before_init_fail_without_native_calls() {
    let mock = MockStoreKit::default();
    let iap = IapUtil::app_store(mock.clone(), BridgeConfig::default()).unwrap();

    let request = FetchProductsRequest {
        skus: vec!["p1".to_string()],
        ..Default::default()
    };
    let errors = [
        iap.fetch_products(request).await.unwrap_err(),
        iap.request_purchase(ios_request("p1")).await.unwrap_err(),
        iap.get_available_purchases(None).await.unwrap_err(),
        iap.get_active_subscriptions(None).await.unwrap_err(),
        iap.get_storefront().await.unwrap_err(),
        iap.get_receipt_data_ios().await.unwrap_err(),
        iap.acknowledge_purchase_android("tok").await.unwrap_err(),
    ];
    for e in errors {
        assert_eq!(e.code(), ErrorCode::NotPrepared, "{e}");
    }
    assert_eq!(mock.state.native_calls.load(Ordering::SeqCst), 0);
    assert!(mock.state.purchases.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_init_can_be_retried_without_reattaching() {
    let mock = MockPlayBilling::default();
    mock.state
        .init_results
        .lock()
        .unwrap()
        .push_back(Err(BillingResultModel::new(3, "billing unavailable")));
    let iap = IapUtil::play_billing(mock.clone(), BridgeConfig::default()).unwrap();

    let e = iap.init_connection(None).await.unwrap_err();
    assert_eq!(e.code(), ErrorCode::InitConnection);
    assert_eq!(e.response_code(), Some(3));
    assert!(!iap.is_connected());

    assert!(iap.init_connection(None).await.unwrap());
    assert!(iap.is_connected());
    assert_eq!(mock.state.init_calls.load(Ordering::SeqCst), 2);
    assert_eq!(mock.state.sink_attachments.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unavailable_store_fails_init() {
    let mock = MockStoreKit::default();
    mock.state.init_results.lock().unwrap().push_back(Ok(false));
    let iap = IapUtil::app_store(mock, BridgeConfig::default()).unwrap();

    let e = iap.init_connection(None).await.unwrap_err();
    assert_eq!(e.code(), ErrorCode::InitConnection);
    assert!(!iap.is_connected());
}

#[tokio::test]
async fn events_buffered_by_a_failed_init_are_discarded() {
    let (mock, gate) = MockStoreKit::gated();
    mock.state
        .init_results
        .lock()
        .unwrap()
        .push_back(Ok(false));
    let iap = Arc::new(IapUtil::app_store(mock.clone(), BridgeConfig::default()).unwrap());
    let mut events = iap.subscribe();

    let init = tokio::spawn({
        let iap = Arc::clone(&iap);
        async move { iap.init_connection(None).await }
    });
    wait_until(|| mock.has_sink()).await;
    mock.sink()
        .on_transaction_updated(transaction("stale", "p1", 1));
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    gate.open();
    assert!(init.await.unwrap().is_err());

    gate.open();
    assert!(iap.init_connection(None).await.unwrap());
    mock.sink().on_transaction_updated(transaction("fresh", "p1", 2));
    match next_event(&mut events).await {
        BridgeEvent::PurchaseUpdated(p) => assert_eq!(p.id(), "fresh"),
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn init_times_out_when_configured() {
    let (mock, _gate) = MockStoreKit::gated();
    let config = BridgeConfig {
        event_buffer: EventBufferPolicy::Unbounded,
        init_timeout_ms: Some(500),
    };
    let iap = IapUtil::app_store(mock, config).unwrap();

    let e = iap.init_connection(None).await.unwrap_err();
    assert_eq!(e.code(), ErrorCode::InitConnection);
    assert!(e.message().contains("Timed out"));
}

#[test]
fn unbounded_buffer_requires_timeout() {
    let config = BridgeConfig {
        event_buffer: EventBufferPolicy::Unbounded,
        init_timeout_ms: None,
    };
    let e = IapUtil::app_store(MockStoreKit::default(), config)
        .err()
        .unwrap();
    assert_eq!(e.code(), ErrorCode::DeveloperError);
}

#[tokio::test]
async fn end_connection_rejects_pending_purchases() {
    let mock = MockPlayBilling::default();
    mock.state
        .product_details
        .lock()
        .unwrap()
        .push(play_product("coins", "inapp"));
    let iap = Arc::new(IapUtil::play_billing(mock.clone(), BridgeConfig::default()).unwrap());
    iap.init_connection(None).await.unwrap();
    iap.fetch_products(FetchProductsRequest {
        skus: vec!["coins".to_string()],
        ..Default::default()
    })
    .await
    .unwrap();

    let pending = tokio::spawn({
        let iap = Arc::clone(&iap);
        async move { iap.request_purchase(android_request("coins")).await }
    });
    wait_until(|| mock.launched_count() == 1).await;

    assert!(iap.end_connection().await);
    let e = pending.await.unwrap().unwrap_err();
    assert_eq!(e.code(), ErrorCode::ServiceDisconnected);

    let e = iap
        .fetch_products(FetchProductsRequest {
            skus: vec!["coins".to_string()],
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(e.code(), ErrorCode::NotPrepared);
}

#[tokio::test]
async fn end_connection_waits_for_init_in_flight() {
    let (mock, gate) = MockPlayBilling::gated();
    let iap = Arc::new(IapUtil::play_billing(mock.clone(), BridgeConfig::default()).unwrap());

    let init = tokio::spawn({
        let iap = Arc::clone(&iap);
        async move { iap.init_connection(None).await }
    });
    wait_until(|| mock.state.init_calls.load(Ordering::SeqCst) == 1).await;

    let end = tokio::spawn({
        let iap = Arc::clone(&iap);
        async move { iap.end_connection().await }
    });
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(!end.is_finished());
    assert_eq!(mock.state.end_calls.load(Ordering::SeqCst), 0);
    assert!(mock.has_sink());

    gate.open();
    assert!(init.await.unwrap().unwrap());
    assert!(end.await.unwrap());

    assert!(!iap.is_connected());
    assert!(!mock.has_sink());
    assert_eq!(mock.state.init_calls.load(Ordering::SeqCst), 1);
    assert_eq!(mock.state.end_calls.load(Ordering::SeqCst), 1);
    assert_eq!(mock.state.sink_attachments.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dispatch_failing_after_end_is_not_published() {
    let mock = MockStoreKit::default();
    let purchase_gate = Arc::new(InitGate::default());
    *mock.state.purchase_gate.lock().unwrap() = Some(Arc::clone(&purchase_gate));
    *mock.state.purchase_error.lock().unwrap() =
        Some(StoreKitErrorModel::new("networkError", "offline"));
    let iap = Arc::new(IapUtil::app_store(mock.clone(), BridgeConfig::default()).unwrap());
    let mut events = iap.subscribe();
    iap.init_connection(None).await.unwrap();

    let pending = tokio::spawn({
        let iap = Arc::clone(&iap);
        async move { iap.request_purchase(ios_request("p1")).await }
    });
    wait_until(|| mock.state.purchases.lock().unwrap().len() == 1).await;

    assert!(iap.end_connection().await);
    purchase_gate.open();
    let e = pending.await.unwrap().unwrap_err();
    assert_eq!(e.code(), ErrorCode::ServiceDisconnected);

    iap.init_connection(None).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(events.try_recv().is_err(), "stale failure was published");
}

#[tokio::test]
async fn end_connection_swallows_native_failures() {
    let mock = MockPlayBilling::default();
    *mock.state.end_error.lock().unwrap() = Some(BillingResultModel::new(-1, "disconnected"));
    let iap = IapUtil::play_billing(mock.clone(), BridgeConfig::default()).unwrap();
    iap.init_connection(None).await.unwrap();

    assert!(iap.end_connection().await);
    assert!(!iap.is_connected());
    assert!(!mock.has_sink());
    assert_eq!(mock.state.end_calls.load(Ordering::SeqCst), 1);

    // Safe to call again.
    assert!(iap.end_connection().await);
}

#[tokio::test]
async fn reconnecting_reattaches_listeners() {
    let mock = MockStoreKit::default();
    let iap = IapUtil::app_store(mock.clone(), BridgeConfig::default()).unwrap();
    let mut events = iap.subscribe();

    iap.init_connection(None).await.unwrap();
    iap.end_connection().await;
    iap.init_connection(None).await.unwrap();
    assert_eq!(mock.state.sink_attachments.load(Ordering::SeqCst), 2);

    mock.sink().on_promoted_product("promo");
    assert_eq!(
        next_event(&mut events).await,
        BridgeEvent::PromotedProductIos {
            product_id: "promo".to_string()
        }
    );
}

#[tokio::test]
async fn subscription_offers_are_checked_before_dispatch() {
    let mock = MockPlayBilling::default();
    mock.state
        .product_details
        .lock()
        .unwrap()
        .push(play_product("monthly", "subs"));
    let iap = IapUtil::play_billing(mock.clone(), BridgeConfig::default()).unwrap();
    iap.init_connection(None).await.unwrap();

    let mut props = android_request("monthly");
    props.product_type = ProductType::Subs;
    let e = iap.request_purchase(props.clone()).await.unwrap_err();
    assert_eq!(e.code(), ErrorCode::DeveloperError);

    props.request.android.as_mut().unwrap().subscription_offers =
        Some(vec![AndroidSubscriptionOfferInput {
            sku: "yearly".to_string(),
            offer_token: "tok".to_string(),
        }]);
    let e = iap.request_purchase(props).await.unwrap_err();
    assert_eq!(e.code(), ErrorCode::SkuOfferMismatch);
    assert_eq!(mock.launched_count(), 0);
}
