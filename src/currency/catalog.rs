// Denomination catalog
// Per-mode model label tables and the value/cue record for every recognizable unit

use super::types::{Currency, Denomination, DetectionMode, Form};

/// Label every model emits for "no recognizable object"
pub const NO_OBJECT_LABEL: &str = "NO BILLS";

const COIN_LABELS: [&str; 10] = [
    "1 PESO COIN",
    "5 PESO COIN",
    "10 PESO COIN",
    "20 PESO COIN",
    "1 PESO NEW",
    "5 PESO NEW",
    "10 PESO NEW",
    "25 CENTS NEW",
    "25 CENTS OLD",
    NO_OBJECT_LABEL,
];

const OLD_PESO_LABELS: [&str; 7] = [
    "20 PESO",
    "50 PESO",
    "100 PESO",
    "200 PESO",
    "500 PESO",
    "1000 PESO",
    NO_OBJECT_LABEL,
];

const NEW_PESO_LABELS: [&str; 5] = [
    "50NEW PHP PESO",
    "100NEW PHP PESO",
    "500NEW PHP PESO",
    "1000NEW PHP PESO",
    NO_OBJECT_LABEL,
];

const USD_LABELS: [&str; 7] = [
    "1 DOLLARS",
    "5 DOLLARS",
    "10 DOLLARS",
    "20 DOLLARS",
    "50 DOLLARS",
    "100 DOLLARS",
    NO_OBJECT_LABEL,
];

const fn coin(
    label: &'static str,
    display_name: &'static str,
    value: f64,
    cue: &'static str,
) -> Denomination {
    Denomination {
        label,
        display_name,
        value,
        currency: Currency::Php,
        form: Form::Coin,
        cue,
    }
}

const fn bill(
    label: &'static str,
    display_name: &'static str,
    value: f64,
    currency: Currency,
    cue: &'static str,
) -> Denomination {
    Denomination {
        label,
        display_name,
        value,
        currency,
        form: Form::Bill,
        cue,
    }
}

static DENOMINATIONS: [Denomination; 25] = [
    // Coins
    coin("1 PESO COIN", "Old One Peso", 1.0, "phpcoins/piso.mp3"),
    coin("5 PESO COIN", "Old Five Peso", 5.0, "phpcoins/5.mp3"),
    coin("10 PESO COIN", "Old Ten Peso", 10.0, "phpcoins/10.mp3"),
    coin("20 PESO COIN", "New Twenty Peso Coin", 20.0, "phpcoins/20coin.mp3"),
    coin("1 PESO NEW", "New One Peso", 1.0, "phpcoins/pisonew.mp3"),
    coin("5 PESO NEW", "New Five Peso", 5.0, "phpcoins/5new.mp3"),
    coin("10 PESO NEW", "New Ten Peso", 10.0, "phpcoins/10new.mp3"),
    coin("25 CENTS NEW", "New Twenty-Five Cents", 0.25, "phpcoins/25centsnew.mp3"),
    coin("25 CENTS OLD", "Old Twenty-Five Cents", 0.25, "phpcoins/25cents.mp3"),
    // Old peso bills
    bill("20 PESO", "Old Twenty Pesos", 20.0, Currency::Php, "oldphp/20pesos.mp3"),
    bill("50 PESO", "Old Fifty Pesos", 50.0, Currency::Php, "oldphp/50pesos.mp3"),
    bill("100 PESO", "Old One Hundred Pesos", 100.0, Currency::Php, "oldphp/100pesos.mp3"),
    bill("200 PESO", "Old Two Hundred Pesos", 200.0, Currency::Php, "oldphp/200pesos.mp3"),
    bill("500 PESO", "Old Five Hundred Pesos", 500.0, Currency::Php, "oldphp/500pesos.mp3"),
    bill("1000 PESO", "Old One Thousand Pesos", 1000.0, Currency::Php, "oldphp/1000pesos.mp3"),
    // New peso bills
    bill("50NEW PHP PESO", "New Fifty Pesos", 50.0, Currency::Php, "newphp/50new.mp3"),
    bill("100NEW PHP PESO", "New One Hundred Pesos", 100.0, Currency::Php, "newphp/100new.mp3"),
    bill("500NEW PHP PESO", "New Five Hundred Pesos", 500.0, Currency::Php, "newphp/500new.mp3"),
    bill("1000NEW PHP PESO", "New One Thousand Pesos", 1000.0, Currency::Php, "newphp/1000new.mp3"),
    // US dollar bills
    bill("1 DOLLARS", "One Dollar", 1.0, Currency::Usd, "usd/1dollars.mp3"),
    bill("5 DOLLARS", "Five Dollars", 5.0, Currency::Usd, "usd/5dollars.mp3"),
    bill("10 DOLLARS", "Ten Dollars", 10.0, Currency::Usd, "usd/10dollars.mp3"),
    bill("20 DOLLARS", "Twenty Dollars", 20.0, Currency::Usd, "usd/20dollars.mp3"),
    bill("50 DOLLARS", "Fifty Dollars", 50.0, Currency::Usd, "usd/50dollars.mp3"),
    bill("100 DOLLARS", "One Hundred Dollars", 100.0, Currency::Usd, "usd/100dollars.mp3"),
];

/// Index-to-label table of the model serving `mode`
/// The last index is always the no-object sentinel
pub fn labels(mode: DetectionMode) -> &'static [&'static str] {
    match mode {
        DetectionMode::Coins => &COIN_LABELS,
        DetectionMode::OldPeso => &OLD_PESO_LABELS,
        DetectionMode::NewPeso => &NEW_PESO_LABELS,
        DetectionMode::Usd => &USD_LABELS,
    }
}

/// Get a denomination by classifier label
pub fn lookup(label: &str) -> Option<&'static Denomination> {
    DENOMINATIONS.iter().find(|d| d.label == label)
}

/// All known denominations
pub fn all() -> &'static [Denomination] {
    &DENOMINATIONS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_label_has_a_denomination() {
        for mode in DetectionMode::ALL {
            for label in labels(mode) {
                if *label == NO_OBJECT_LABEL {
                    continue;
                }
                assert!(lookup(label).is_some(), "missing denomination for {}", label);
            }
        }
    }

    #[test]
    fn test_sentinel_is_last_index() {
        for mode in DetectionMode::ALL {
            assert_eq!(labels(mode).last(), Some(&NO_OBJECT_LABEL));
        }
    }

    #[test]
    fn test_lookup() {
        let d = lookup("25 CENTS NEW").unwrap();
        assert_eq!(d.value, 0.25);
        assert_eq!(d.form, Form::Coin);

        let usd = lookup("20 DOLLARS").unwrap();
        assert_eq!(usd.currency, Currency::Usd);
        assert_eq!(usd.form, Form::Bill);

        assert!(lookup(NO_OBJECT_LABEL).is_none());
        assert!(lookup("3 PESO").is_none());
    }

    #[test]
    fn test_labels_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for d in all() {
            assert!(seen.insert(d.label), "duplicate label {}", d.label);
        }
    }
}
