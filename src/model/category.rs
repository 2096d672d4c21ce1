//! Enumerated field values and the labels the store uses for them.
//!
//! The dashboard sends short codes like `gasto` or `monthly`, while the store keeps labels like
//! `Gasto` or `Mensual` (Airtable single-select options, or plain sheet text). Mapping is
//! pass-through on a miss: an unknown code is sent to the store unchanged.

use serde::{Deserialize, Serialize};

/// A closed set of codes, each with the label used by the store.
pub trait CategoryMap: Sized + Copy + 'static {
    /// Every member of the set.
    const ALL: &'static [Self];

    /// The code sent by the dashboard, e.g. `gasto`.
    fn code(&self) -> &'static str;

    /// The label kept in the store, e.g. `Gasto`.
    fn label(&self) -> &'static str;

    fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }

    fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.label() == label)
    }

    /// Recognizes either a code or a label.
    fn recognize(s: &str) -> Option<Self> {
        Self::from_code(s).or_else(|| Self::from_label(s))
    }

    /// Returns the store label for `code`, or `code` unchanged when it is not a known code.
    fn map_code(code: &str) -> String {
        match Self::from_code(code) {
            Some(c) => c.label().to_string(),
            None => code.to_string(),
        }
    }
}

/// The direction of a transaction.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    #[serde(rename = "ingreso")]
    Income,
    #[serde(rename = "gasto")]
    Expense,
}

serde_plain::derive_display_from_serialize!(TransactionType);
serde_plain::derive_fromstr_from_deserialize!(TransactionType);

impl CategoryMap for TransactionType {
    const ALL: &'static [Self] = &[TransactionType::Income, TransactionType::Expense];

    fn code(&self) -> &'static str {
        match self {
            TransactionType::Income => "ingreso",
            TransactionType::Expense => "gasto",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            TransactionType::Income => "Ingreso",
            TransactionType::Expense => "Gasto",
        }
    }
}

/// How often a transaction recurs.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    None,
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Yearly,
}

serde_plain::derive_display_from_serialize!(Frequency);
serde_plain::derive_fromstr_from_deserialize!(Frequency);

impl CategoryMap for Frequency {
    const ALL: &'static [Self] = &[
        Frequency::None,
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Biweekly,
        Frequency::Monthly,
        Frequency::Yearly,
    ];

    fn code(&self) -> &'static str {
        match self {
            Frequency::None => "none",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Biweekly => "biweekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Frequency::None => "Sin periodicidad",
            Frequency::Daily => "Diario",
            Frequency::Weekly => "Semanal",
            Frequency::Biweekly => "Quincenal",
            Frequency::Monthly => "Mensual",
            Frequency::Yearly => "Anual",
        }
    }
}

/// Names a `CategoryMap` so that a schema column can say which map applies to it.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum CategoryKind {
    TransactionType,
    Frequency,
}

impl CategoryKind {
    /// Maps `code` to its store label using the map this kind names.
    pub fn map_code(&self, code: &str) -> String {
        match self {
            CategoryKind::TransactionType => TransactionType::map_code(code),
            CategoryKind::Frequency => Frequency::map_code(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_codes_map_to_labels() {
        assert_eq!(TransactionType::map_code("ingreso"), "Ingreso");
        assert_eq!(TransactionType::map_code("gasto"), "Gasto");
    }

    #[test]
    fn test_unknown_code_passes_through() {
        assert_eq!(TransactionType::map_code("transfer"), "transfer");
        assert_eq!(Frequency::map_code("Mensual"), "Mensual");
        assert_eq!(Frequency::map_code(""), "");
    }

    #[test]
    fn test_frequency_codes() {
        let mapped: Vec<String> = Frequency::ALL
            .iter()
            .map(|f| Frequency::map_code(f.code()))
            .collect();
        assert_eq!(
            mapped,
            vec![
                "Sin periodicidad",
                "Diario",
                "Semanal",
                "Quincenal",
                "Mensual",
                "Anual"
            ]
        );
    }

    #[test]
    fn test_recognize_code_or_label() {
        assert_eq!(
            TransactionType::recognize("gasto"),
            Some(TransactionType::Expense)
        );
        assert_eq!(
            TransactionType::recognize("Gasto"),
            Some(TransactionType::Expense)
        );
        assert_eq!(TransactionType::recognize("GASTO"), None);
        assert_eq!(Frequency::from_label("Quincenal"), Some(Frequency::Biweekly));
    }

    #[test]
    fn test_display_and_from_str_use_codes() {
        assert_eq!(TransactionType::Expense.to_string(), "gasto");
        assert_eq!(
            "ingreso".parse::<TransactionType>().unwrap(),
            TransactionType::Income
        );
        assert_eq!(Frequency::Biweekly.to_string(), "biweekly");
        assert!("fortnightly".parse::<Frequency>().is_err());
    }

    #[test]
    fn test_category_kind_dispatch() {
        assert_eq!(CategoryKind::TransactionType.map_code("gasto"), "Gasto");
        assert_eq!(CategoryKind::Frequency.map_code("yearly"), "Anual");
        assert_eq!(CategoryKind::Frequency.map_code("gasto"), "gasto");
    }
}
