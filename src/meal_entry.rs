use serde_json::{Map, Value};

use crate::replacement::{find_safe_replacement, ReplacementMap, DEFAULT_MAX_DEPTH};
use crate::restrictions::RestrictionSet;

const NAME_FIELD: &str = "name";

/// One food item inside a meal slot.
#[derive(Debug, Clone, PartialEq)]
pub enum MealEntry {
    /// Free text such as `"Grilled fish: 120g"`.
    Text(String),
    /// A record whose `name` field is a string. Other fields are kept as-is.
    Structured(Map<String, Value>),
    /// Anything else; never rewritten.
    Other(Value),
}

impl From<Value> for MealEntry {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => MealEntry::Text(text),
            Value::Object(fields) if fields.get(NAME_FIELD).is_some_and(Value::is_string) => {
                MealEntry::Structured(fields)
            }
            other => MealEntry::Other(other),
        }
    }
}

impl From<MealEntry> for Value {
    fn from(entry: MealEntry) -> Self {
        match entry {
            MealEntry::Text(text) => Value::String(text),
            MealEntry::Structured(fields) => Value::Object(fields),
            MealEntry::Other(value) => value,
        }
    }
}

impl MealEntry {
    /// The food-name portion: the text before the first `:` for text
    /// entries, the `name` field for structured ones.
    pub fn food_name(&self) -> Option<&str> {
        match self {
            MealEntry::Text(text) => Some(split_food_text(text).0.trim()),
            MealEntry::Structured(fields) => fields.get(NAME_FIELD).and_then(Value::as_str),
            MealEntry::Other(_) => None,
        }
    }

    /// Quantity annotation, if any (`"120g"` in `"Grilled fish: 120g"`).
    pub fn quantity_text(&self) -> Option<&str> {
        match self {
            MealEntry::Text(text) => split_food_text(text)
                .1
                .strip_prefix(':')
                .map(str::trim)
                .filter(|q| !q.is_empty()),
            MealEntry::Structured(fields) => fields
                .get("quantity")
                .or_else(|| fields.get("quantity_text"))
                .and_then(Value::as_str),
            MealEntry::Other(_) => None,
        }
    }
}

/// Splits a text entry into its food-name part and the remainder, which
/// starts at the first `:` (or is empty when there is none).
pub fn split_food_text(text: &str) -> (&str, &str) {
    match text.find(':') {
        Some(pos) => text.split_at(pos),
        None => (text, ""),
    }
}

/// Rewrites meal entries for one restriction set.
///
/// Substitutes are resolved once per keyword when the rewriter is built,
/// so rewriting a full plan costs one resolution per restriction.
#[derive(Debug, Clone)]
pub struct MealRewriter {
    substitutes: Vec<(String, String)>,
}

impl MealRewriter {
    pub fn new(restrictions: &RestrictionSet, map: &ReplacementMap, max_depth: usize) -> Self {
        let substitutes = restrictions
            .iter()
            .map(|kw| {
                let substitute = find_safe_replacement(kw, restrictions, map, max_depth);
                (kw.to_string(), substitute)
            })
            .collect();
        Self { substitutes }
    }

    pub fn with_default_depth(restrictions: &RestrictionSet, map: &ReplacementMap) -> Self {
        Self::new(restrictions, map, DEFAULT_MAX_DEPTH)
    }

    pub fn is_noop(&self) -> bool {
        self.substitutes.is_empty()
    }

    /// Returns the rewritten entry (same shape) and whether anything changed.
    pub fn rewrite_entry(&self, entry: &MealEntry) -> (MealEntry, bool) {
        match entry {
            MealEntry::Text(text) => {
                let (name, rest) = split_food_text(text);
                match self.rewrite_text(name) {
                    Some(new_name) => (MealEntry::Text(new_name + rest), true),
                    None => (entry.clone(), false),
                }
            }
            MealEntry::Structured(fields) => {
                let new_name = fields
                    .get(NAME_FIELD)
                    .and_then(Value::as_str)
                    .and_then(|name| self.rewrite_text(name));
                match new_name {
                    Some(new_name) => {
                        let mut fields = fields.clone();
                        fields.insert(NAME_FIELD.to_string(), Value::String(new_name));
                        (MealEntry::Structured(fields), true)
                    }
                    None => (entry.clone(), false),
                }
            }
            MealEntry::Other(_) => (entry.clone(), false),
        }
    }

    /// Replaces every restricted keyword in `text` in a single left-to-right
    /// pass. Inserted substitutes are not rescanned. `None` when nothing
    /// matched.
    pub fn rewrite_text(&self, text: &str) -> Option<String> {
        if self.is_noop() {
            return None;
        }
        let mut out = String::with_capacity(text.len());
        let mut changed = false;
        let mut pos = 0;
        while pos < text.len() {
            let rest = &text[pos..];
            let hit = self.substitutes.iter().find_map(|(kw, substitute)| {
                match_prefix_ignore_case(rest, kw).map(|len| (len, substitute))
            });
            match hit {
                Some((len, substitute)) => {
                    let matched = &rest[..len];
                    out.push_str(&match_case(matched, substitute));
                    tracing::debug!(
                        matched,
                        substitute = substitute.as_str(),
                        "restricted term replaced"
                    );
                    pos += len;
                    changed = true;
                }
                None => {
                    let Some(ch) = rest.chars().next() else { break };
                    out.push(ch);
                    pos += ch.len_utf8();
                }
            }
        }
        changed.then_some(out)
    }
}

/// Byte length of the prefix of `haystack` equal to `needle` (already
/// lower-case) ignoring case.
fn match_prefix_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let mut expected = needle.chars().peekable();
    for (idx, ch) in haystack.char_indices() {
        if expected.peek().is_none() {
            return Some(idx);
        }
        for lower in ch.to_lowercase() {
            if expected.next() != Some(lower) {
                return None;
            }
        }
    }
    expected.peek().is_none().then_some(haystack.len())
}

/// Carries the casing convention of `matched` over to `substitute`.
fn match_case(matched: &str, substitute: &str) -> String {
    let mut letters = matched.chars().filter(|c| c.is_alphabetic()).peekable();
    let Some(first) = letters.peek().copied() else {
        return substitute.to_string();
    };
    let letter_count = matched.chars().filter(|c| c.is_alphabetic()).count();
    if letter_count > 1 && letters.all(char::is_uppercase) {
        return substitute.to_uppercase();
    }
    if first.is_uppercase() {
        let mut chars = substitute.chars();
        return match chars.next() {
            Some(head) => head.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
    }
    substitute.to_string()
}
