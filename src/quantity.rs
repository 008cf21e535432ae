use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuantityUnit {
    Grams,
    Kilograms,
    Pieces,
    Cups,
    Slices,
    Tablespoons,
    Teaspoons,
}

/// Amount parsed out of a quantity annotation such as `"2 pcs"` or `"120g"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ParsedQuantity {
    pub grams: Option<f32>,
    pub pieces: Option<u32>,
}

// First match wins. "1kg" never hits the grams pattern since the `k`
// sits between the digits and the `g`.
const PATTERNS: &[(&str, QuantityUnit)] = &[
    (r"(\d+(?:\.\d+)?)\s*g", QuantityUnit::Grams),
    (r"(\d+(?:\.\d+)?)\s*kg", QuantityUnit::Kilograms),
    (r"(\d+)\s*pcs?", QuantityUnit::Pieces),
    (r"(\d+)\s*cups?", QuantityUnit::Cups),
    (r"(\d+)\s*slices?", QuantityUnit::Slices),
    (r"(\d+)\s*tbsp", QuantityUnit::Tablespoons),
    (r"(\d+)\s*tsp", QuantityUnit::Teaspoons),
];

fn compiled_patterns() -> &'static [(Regex, QuantityUnit)] {
    static COMPILED: OnceLock<Vec<(Regex, QuantityUnit)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        PATTERNS
            .iter()
            .filter_map(|(pattern, unit)| Regex::new(pattern).ok().map(|re| (re, *unit)))
            .collect()
    })
}

/// Parses a quantity annotation into grams and/or a piece count.
///
/// Piece and slice counts get a gram estimate for a few common foods
/// (egg, roti/bread, banana); cups are estimated by what is measured.
pub fn parse_quantity(quantity_text: &str) -> ParsedQuantity {
    let text = quantity_text.trim().to_lowercase();
    let mut parsed = ParsedQuantity::default();

    for (re, unit) in compiled_patterns() {
        let Some(value) = re
            .captures(&text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f32>().ok())
        else {
            continue;
        };

        match unit {
            QuantityUnit::Grams => parsed.grams = Some(value),
            QuantityUnit::Kilograms => parsed.grams = Some(value * 1000.0),
            QuantityUnit::Pieces | QuantityUnit::Slices => {
                parsed.pieces = Some(value as u32);
                parsed.grams = if text.contains("egg") {
                    Some(value * 50.0)
                } else if text.contains("roti") || text.contains("bread") {
                    Some(value * 40.0)
                } else if text.contains("banana") {
                    Some(value * 120.0)
                } else {
                    None
                };
            }
            QuantityUnit::Cups => {
                parsed.grams = if text.contains("rice") {
                    Some(value * 185.0)
                } else if text.contains("tea") || text.contains("coffee") {
                    Some(value * 240.0)
                } else {
                    Some(value * 200.0)
                };
            }
            QuantityUnit::Tablespoons => parsed.grams = Some(value * 15.0),
            QuantityUnit::Teaspoons => parsed.grams = Some(value * 5.0),
        }
        break;
    }

    parsed
}
