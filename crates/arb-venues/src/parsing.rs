//! Shared response-shape parsing helpers used by every venue adapter.

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Parse a JSON number-or-string into a [`Decimal`], the shape every venue
/// uses somewhere in its responses.
pub fn decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => Decimal::from_str(s).ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
}

pub fn decimal_field(value: &Value, key: &str) -> Option<Decimal> {
    value.get(key).and_then(decimal)
}

/// Normalize one side of a raw order book payload into `(price, size)`
/// pairs. Handles the two shapes venues return: list-of-lists
/// (`[["p","s"], ...]`) and list-of-objects with varying key names
/// (`p`/`price`, `s`/`size`/`volume`/`quantity`) (spec.md §4.2 Orderbook
/// normalization).
pub fn parse_book_side(raw: &Value) -> Vec<(Decimal, Decimal)> {
    let Some(levels) = raw.as_array() else {
        return Vec::new();
    };

    levels
        .iter()
        .filter_map(|level| match level {
            Value::Array(pair) => {
                let price = pair.first().and_then(decimal)?;
                let size = pair.get(1).and_then(decimal)?;
                Some((price, size))
            }
            Value::Object(_) => {
                let price = decimal_field(level, "p").or_else(|| decimal_field(level, "price"))?;
                let size = decimal_field(level, "s")
                    .or_else(|| decimal_field(level, "size"))
                    .or_else(|| decimal_field(level, "volume"))
                    .or_else(|| decimal_field(level, "quantity"))?;
                Some((price, size))
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn parse_book_side_handles_list_of_lists() {
        let raw = json!([["100.5", "2"], ["100.6", "3"]]);
        let side = parse_book_side(&raw);
        assert_eq!(side, vec![(dec!(100.5), dec!(2)), (dec!(100.6), dec!(3))]);
    }

    #[test]
    fn parse_book_side_handles_list_of_objects_with_p_s() {
        let raw = json!([{"p": "100.5", "s": "2"}]);
        let side = parse_book_side(&raw);
        assert_eq!(side, vec![(dec!(100.5), dec!(2))]);
    }

    #[test]
    fn parse_book_side_handles_volume_and_quantity_aliases() {
        let raw = json!([{"price": "10", "volume": "5"}, {"price": "11", "quantity": "6"}]);
        let side = parse_book_side(&raw);
        assert_eq!(side, vec![(dec!(10), dec!(5)), (dec!(11), dec!(6))]);
    }
}
