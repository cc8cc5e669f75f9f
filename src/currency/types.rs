// Currency types
// Detection modes, currencies and the denomination record shared by every stage

use serde::{Deserialize, Serialize};

/// Classifier configuration currently driving detection
/// Exactly one mode is active at a time; each mode has its own model and label table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// Philippine coins, old and new series
    Coins,

    /// Old-series peso bills
    OldPeso,

    /// New-series peso bills
    NewPeso,

    /// US dollar bills
    Usd,
}

impl DetectionMode {
    /// Every mode in toggle order
    pub const ALL: [DetectionMode; 4] = [
        DetectionMode::Coins,
        DetectionMode::OldPeso,
        DetectionMode::NewPeso,
        DetectionMode::Usd,
    ];

    /// Next mode in toggle order, wrapping around
    pub fn next(self) -> Self {
        match self {
            DetectionMode::Coins => DetectionMode::OldPeso,
            DetectionMode::OldPeso => DetectionMode::NewPeso,
            DetectionMode::NewPeso => DetectionMode::Usd,
            DetectionMode::Usd => DetectionMode::Coins,
        }
    }

    /// Short identifier, also used in banners and traces
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionMode::Coins => "coins",
            DetectionMode::OldPeso => "old",
            DetectionMode::NewPeso => "new",
            DetectionMode::Usd => "usd",
        }
    }

    /// Accepts both the short identifier and the snake_case name
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "coins" => Some(DetectionMode::Coins),
            "old" | "old_peso" => Some(DetectionMode::OldPeso),
            "new" | "new_peso" => Some(DetectionMode::NewPeso),
            "usd" => Some(DetectionMode::Usd),
            _ => None,
        }
    }

    /// Camera zoom the preview should use; coins are small and need a closer frame
    pub fn camera_zoom(&self) -> f32 {
        match self {
            DetectionMode::Coins => 0.5,
            _ => 0.2,
        }
    }
}

/// Currency a denomination belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    /// Philippine peso, the wallet's base unit
    Php,

    /// US dollar, converted to pesos for wallet totals
    Usd,
}

impl Currency {
    /// Base currency of the wallet
    pub const BASE: Currency = Currency::Php;

    pub fn is_foreign(&self) -> bool {
        *self != Currency::BASE
    }
}

/// Physical form of a denomination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Form {
    Coin,
    Bill,
}

/// A recognizable currency unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Denomination {
    /// Label emitted by the classifier (e.g., "100 PESO")
    pub label: &'static str,

    /// Human-readable name for UI display
    pub display_name: &'static str,

    /// Face value in the denomination's own currency
    pub value: f64,

    pub currency: Currency,

    pub form: Form,

    /// Announcement clip, relative to the configured audio asset directory
    pub cue: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_cycle_visits_every_mode() {
        let mut mode = DetectionMode::Coins;
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(mode);
            mode = mode.next();
        }
        assert_eq!(mode, DetectionMode::Coins);
        assert_eq!(seen, DetectionMode::ALL.to_vec());
    }

    #[test]
    fn test_mode_from_string() {
        assert_eq!(DetectionMode::from_string("USD"), Some(DetectionMode::Usd));
        assert_eq!(DetectionMode::from_string("old_peso"), Some(DetectionMode::OldPeso));
        assert_eq!(DetectionMode::from_string("new"), Some(DetectionMode::NewPeso));
        assert_eq!(DetectionMode::from_string("euro"), None);
    }

    #[test]
    fn test_foreign_currency() {
        assert!(!Currency::Php.is_foreign());
        assert!(Currency::Usd.is_foreign());
    }

    #[test]
    fn test_camera_zoom() {
        assert_eq!(DetectionMode::Coins.camera_zoom(), 0.5);
        assert_eq!(DetectionMode::Usd.camera_zoom(), 0.2);
    }
}
