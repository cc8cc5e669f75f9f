// Data models for the in-session wallet
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::currency::{Currency, Denomination, Form};

/// Fields needed to create a wallet item; id and timestamp are assigned by the ledger
#[derive(Debug, Clone, PartialEq)]
pub struct WalletEntry {
    pub denomination: String,
    pub value: f64,
    pub currency: Currency,
    pub form: Form,
    pub confidence: f32,
}

impl WalletEntry {
    pub fn from_denomination(denomination: &Denomination, confidence: f32) -> Self {
        WalletEntry {
            denomination: denomination.label.to_string(),
            value: denomination.value,
            currency: denomination.currency,
            form: denomination.form,
            confidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletItem {
    pub id: Uuid,
    pub denomination: String,

    /// Face value in the item's own currency
    pub value: f64,
    pub currency: Currency,
    pub form: Form,
    pub confidence: f32,
    pub created_at: DateTime<Utc>,

    /// Insertion counter, breaks ties between equal timestamps
    pub sequence: u64,
}

impl WalletItem {
    /// Value in the wallet's base currency
    pub fn base_value(&self, exchange_rate: f64) -> f64 {
        if self.currency.is_foreign() {
            self.value * exchange_rate
        } else {
            self.value
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletStats {
    /// Sum of all items in the base currency
    pub total: f64,
    pub item_count: usize,
    pub bill_count: usize,
    pub coin_count: usize,
    pub by_denomination: BTreeMap<String, usize>,
}
