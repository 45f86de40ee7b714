use std::collections::HashMap;

use crate::domain::entities::purchase::Purchase;

/// Makes `id` agree with the transaction identity: when a `transactionId` is
/// present and differs from `id`, `id` takes its value. Idempotent.
pub fn normalize_purchase_id(mut purchase: Purchase) -> Purchase {
    let replacement = match purchase.transaction_id() {
        Some(transaction_id) if !transaction_id.is_empty() && transaction_id != purchase.id() => {
            Some(transaction_id.to_string())
        }
        _ => None,
    };
    if let Some(id) = replacement {
        purchase.set_id(id);
    }
    purchase
}

pub fn normalize_purchase_list(purchases: Option<Vec<Purchase>>) -> Vec<Purchase> {
    purchases
        .unwrap_or_default()
        .into_iter()
        .map(normalize_purchase_id)
        .collect()
}

/// Keeps one purchase per `productId`, the one with the latest
/// `transactionDate` (on ties, the one seen last). Output follows the order
/// in which each product was first seen.
///
/// For history-style listings only; live purchase events are never
/// deduplicated.
pub fn deduplicate_by_product(purchases: Vec<Purchase>) -> Vec<Purchase> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<Purchase> = Vec::with_capacity(purchases.len());
    for purchase in purchases {
        match slots.get(purchase.product_id()) {
            Some(&i) => {
                if purchase.transaction_date() >= kept[i].transaction_date() {
                    kept[i] = purchase;
                }
            }
            None => {
                slots.insert(purchase.product_id().to_string(), kept.len());
                kept.push(purchase);
            }
        }
    }
    kept
}
