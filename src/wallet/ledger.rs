// Wallet ledger
// In-memory collection of confirmed detections; lives for the process only

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::models::{WalletEntry, WalletItem, WalletStats};
use crate::currency::Form;

/// Ordered set of wallet items, newest first
#[derive(Debug, Default)]
pub struct WalletLedger {
    items: Vec<WalletItem>,
    next_sequence: u64,
    last_timestamp: Option<DateTime<Utc>>,
}

impl WalletLedger {
    pub fn new() -> Self {
        WalletLedger::default()
    }

    /// Create an item with a fresh id and timestamp and prepend it
    pub fn insert(&mut self, entry: WalletEntry) -> WalletItem {
        // Wall clock may step backwards; creation times must not
        let now = Utc::now();
        let created_at = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_timestamp = Some(created_at);

        let item = WalletItem {
            id: Uuid::new_v4(),
            denomination: entry.denomination,
            value: entry.value,
            currency: entry.currency,
            form: entry.form,
            confidence: entry.confidence,
            created_at,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;

        self.items.insert(0, item.clone());
        item
    }

    /// Remove an item by id; returns whether anything was removed
    pub fn remove(&mut self, id: &Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != *id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn get(&self, id: &Uuid) -> Option<&WalletItem> {
        self.items.iter().find(|item| item.id == *id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items ordered for display, newest first
    pub fn display_order(&self) -> Vec<WalletItem> {
        let mut items = self.items.clone();
        items.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.sequence.cmp(&a.sequence))
        });
        items
    }

    /// Aggregate statistics; foreign items are converted with `exchange_rate`
    pub fn stats(&self, exchange_rate: f64) -> WalletStats {
        let mut stats = WalletStats::default();

        for item in &self.items {
            stats.total += item.base_value(exchange_rate);
            stats.item_count += 1;
            match item.form {
                Form::Bill => stats.bill_count += 1,
                Form::Coin => stats.coin_count += 1,
            }
            *stats
                .by_denomination
                .entry(item.denomination.clone())
                .or_insert(0) += 1;
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::{lookup, Currency};

    fn entry(label: &str, value: f64, currency: Currency, form: Form) -> WalletEntry {
        WalletEntry {
            denomination: label.to_string(),
            value,
            currency,
            form,
            confidence: 0.99,
        }
    }

    #[test]
    fn test_stats_convert_foreign_items() {
        let mut ledger = WalletLedger::new();
        ledger.insert(entry("100 PESO", 100.0, Currency::Php, Form::Bill));
        ledger.insert(entry("5 DOLLARS", 5.0, Currency::Usd, Form::Bill));

        let stats = ledger.stats(58.0);
        assert!((stats.total - 390.0).abs() < 1e-9);
        assert_eq!(stats.item_count, 2);
        assert_eq!(stats.bill_count, 2);
        assert_eq!(stats.coin_count, 0);
    }

    #[test]
    fn test_counts_by_kind() {
        let mut ledger = WalletLedger::new();
        for label in ["5 PESO COIN", "5 PESO COIN", "25 CENTS NEW", "50 PESO"] {
            let d = lookup(label).unwrap();
            ledger.insert(WalletEntry::from_denomination(d, 0.99));
        }

        let stats = ledger.stats(58.0);
        assert_eq!(stats.coin_count, 3);
        assert_eq!(stats.bill_count, 1);
        assert_eq!(stats.by_denomination.get("5 PESO COIN"), Some(&2));
        assert!((stats.total - 60.25).abs() < 1e-9);
    }

    #[test]
    fn test_remove_missing_id_is_noop() {
        let mut ledger = WalletLedger::new();
        ledger.insert(entry("20 PESO", 20.0, Currency::Php, Form::Bill));

        assert!(!ledger.remove(&Uuid::new_v4()));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut ledger = WalletLedger::new();
        let first = ledger.insert(entry("20 PESO", 20.0, Currency::Php, Form::Bill));
        ledger.insert(entry("50 PESO", 50.0, Currency::Php, Form::Bill));

        assert!(ledger.remove(&first.id));
        assert!(ledger.get(&first.id).is_none());
        assert_eq!(ledger.len(), 1);

        ledger.clear();
        assert!(ledger.is_empty());
        assert_eq!(ledger.stats(58.0), WalletStats::default());
    }

    #[test]
    fn test_ids_are_unique() {
        let mut ledger = WalletLedger::new();
        let ids: std::collections::HashSet<Uuid> = (0..50)
            .map(|_| ledger.insert(entry("1 PESO COIN", 1.0, Currency::Php, Form::Coin)).id)
            .collect();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn test_display_order_newest_first() {
        let mut ledger = WalletLedger::new();
        let a = ledger.insert(entry("20 PESO", 20.0, Currency::Php, Form::Bill));
        let b = ledger.insert(entry("50 PESO", 50.0, Currency::Php, Form::Bill));
        let c = ledger.insert(entry("100 PESO", 100.0, Currency::Php, Form::Bill));

        let order: Vec<Uuid> = ledger.display_order().iter().map(|i| i.id).collect();
        assert_eq!(order, vec![c.id, b.id, a.id]);
        assert!(c.created_at >= a.created_at);
    }
}
