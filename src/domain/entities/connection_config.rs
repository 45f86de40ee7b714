use serde::{Deserialize, Serialize};

/// Options for a single `initConnection` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitConnectionConfig {
    /// Play Billing only; ignored on iOS.
    pub alternative_billing_mode_android: Option<AlternativeBillingModeAndroid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlternativeBillingModeAndroid {
    None,
    UserChoice,
    AlternativeOnly,
}
