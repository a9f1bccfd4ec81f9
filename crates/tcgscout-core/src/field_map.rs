//! Declarative mapping from provider JSON to [`PriceResult`].
//!
//! Each adapter owns one [`FieldMap`]: for every common field an ordered list
//! of JSON pointers into the provider record. The first pointer that resolves
//! to a usable value wins. Gaps left after the table is applied are filled
//! from the recognized card by [`PriceResult::fill_from_card`].
//!
//! | Value kind | Accepted JSON |
//! |------------|---------------|
//! | text | non-empty string, number, array of strings (joined with `, `) |
//! | amount | number, or a string that parses as one |

use serde_json::Value;

use crate::domain::{PricePoint, PriceResult};

/// Ordered pointers for each price column of one variant.
#[derive(Debug, Clone, Copy)]
pub struct PricePointMap {
    pub market: &'static [&'static str],
    pub low: &'static [&'static str],
    pub mid: &'static [&'static str],
    pub high: &'static [&'static str],
}

impl PricePointMap {
    pub fn extract(&self, record: &Value) -> PricePoint {
        PricePoint {
            market: first_amount(record, self.market),
            low: first_amount(record, self.low),
            mid: first_amount(record, self.mid),
            high: first_amount(record, self.high),
        }
    }
}

/// Mapping table for one provider record shape.
#[derive(Debug, Clone, Copy)]
pub struct FieldMap {
    pub name: &'static [&'static str],
    pub set: &'static [&'static str],
    pub number: &'static [&'static str],
    pub rarity: &'static [&'static str],
    pub image: &'static [&'static str],
    /// Fixed variants; providers with dynamic variants map rows themselves.
    pub prices: &'static [(&'static str, PricePointMap)],
    /// `(label, pointer)` pairs copied into [`PriceResult::details`].
    pub details: &'static [(&'static str, &'static str)],
}

impl FieldMap {
    /// Builds a found result labelled `source` from one provider record.
    ///
    /// Variants whose columns are all missing are left out of the table.
    pub fn apply(&self, record: &Value, source: &str) -> PriceResult {
        let mut result = PriceResult::found(source);
        result.name = first_text(record, self.name);
        result.set = first_text(record, self.set);
        result.number = first_text(record, self.number);
        result.rarity = first_text(record, self.rarity);
        result.image = first_text(record, self.image);

        if let Some(prices) = result.prices.as_mut() {
            for (label, columns) in self.prices {
                let point = columns.extract(record);
                if !point.is_empty() {
                    prices.insert((*label).to_owned(), point);
                }
            }
        }

        for (label, pointer) in self.details {
            if let Some(value) = record.pointer(pointer).and_then(as_text) {
                result.details.insert((*label).to_owned(), value);
            }
        }

        result
    }
}

pub fn first_text(record: &Value, pointers: &[&str]) -> Option<String> {
    pointers
        .iter()
        .find_map(|pointer| record.pointer(pointer).and_then(as_text))
}

pub fn first_amount(record: &Value, pointers: &[&str]) -> Option<f64> {
    pointers
        .iter()
        .find_map(|pointer| record.pointer(pointer).and_then(as_amount))
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_owned())
        }
        Value::Number(number) => Some(number.to_string()),
        Value::Array(items) => {
            let joined = items
                .iter()
                .filter_map(|item| item.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            (!joined.is_empty()).then_some(joined)
        }
        _ => None,
    }
}

fn as_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|amount| amount.is_finite())
}
