// Wallet module
// Session-lifetime ledger of confirmed detections

pub mod ledger;
pub mod models;

pub use ledger::WalletLedger;
pub use models::{WalletEntry, WalletItem, WalletStats};
