pub mod data {
    pub mod datasources {
        pub mod play_billing_datasource;
        pub mod store_kit_datasource;
        pub(crate) mod utils;
    }
    pub mod models {
        pub mod play_billing {
            pub mod billing_flow_params_model;
            pub mod billing_result_model;
            pub mod product_details_model;
            pub mod purchase_model;
        }
        pub mod store_kit {
            pub mod common;
            pub(crate) mod jws_transaction_payload_model;
            pub mod product_model;
            pub mod purchase_params_model;
            pub mod store_kit_error_model;
            pub mod subscription_status_model;
            pub mod transaction_model;
        }
    }
    pub mod repositories {
        pub mod app_store_billing_repository_impl;
        pub mod play_billing_repository_impl;
    }
}

pub mod domain {
    pub mod entities {
        pub mod active_subscription;
        pub mod bridge_event;
        pub mod connection_config;
        pub mod error_code;
        pub mod platform;
        pub mod product;
        pub mod purchase;
        pub mod purchase_request;
    }
    pub mod logic {
        pub mod error_taxonomy;
        pub mod purchase_normalizer;
    }
    pub mod repositories {
        pub mod billing_repository;
    }
}

pub mod bridge {
    pub mod connection_lifecycle;
    pub mod event_buffer;
    pub mod purchase_request_router;
}

pub mod config;
pub mod errors;
pub mod util;

pub use config::{BridgeConfig, EventBufferPolicy};
pub use data::datasources::{
    play_billing_datasource::{PlayBillingDatasource, PlayBillingEventSink},
    store_kit_datasource::{StoreKitDatasource, StoreKitEventSink},
};
pub use domain::entities::{
    bridge_event::BridgeEvent, error_code::ErrorCode, platform::Platform, purchase::Purchase,
};
pub use errors::PurchaseError;
pub use util::IapUtil;
