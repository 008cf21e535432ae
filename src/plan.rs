use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::meal_entry::{MealEntry, MealRewriter};
use crate::replacement::ReplacementMap;
use crate::restrictions::RestrictionSet;

const LEGACY_DAYS_KEY: &str = "days";
const LEGACY_MEALS_KEY: &str = "meals";

/// Canonical meal slots, in traversal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
    Snacks,
    Suhoor,
    Iftar,
}

impl MealSlot {
    pub const ALL: [MealSlot; 6] = [
        MealSlot::Breakfast,
        MealSlot::Lunch,
        MealSlot::Dinner,
        MealSlot::Snacks,
        MealSlot::Suhoor,
        MealSlot::Iftar,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MealSlot::Breakfast => "Breakfast",
            MealSlot::Lunch => "Lunch",
            MealSlot::Dinner => "Dinner",
            MealSlot::Snacks => "Snacks",
            MealSlot::Suhoor => "Suhoor",
            MealSlot::Iftar => "Iftar",
        }
    }

    /// Case-insensitive; `Snack` is accepted for `Snacks`.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("snack") {
            return Some(MealSlot::Snacks);
        }
        Self::ALL
            .into_iter()
            .find(|slot| slot.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MealSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown meal slot: {}", s))
    }
}

/// Day number from a `"Day <n>"` key (n >= 1). Case-insensitive on `Day`.
pub fn parse_day_key(key: &str) -> Option<u32> {
    let mut parts = key.split_whitespace();
    let (Some(prefix), Some(number), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };
    if !prefix.eq_ignore_ascii_case("day") {
        return None;
    }
    number.parse::<u32>().ok().filter(|n| *n >= 1)
}

pub fn day_key(day: u32) -> String {
    format!("Day {}", day)
}

/// Traversal rank of a slot label: canonical slots first, unknown labels
/// after them in lexicographic order.
fn slot_rank(label: &str) -> (usize, String) {
    match MealSlot::parse(label) {
        Some(slot) => (slot as usize, String::new()),
        None => (MealSlot::ALL.len(), label.to_string()),
    }
}

fn ordered_slot_keys(slots: &Map<String, Value>) -> Vec<String> {
    let mut keys: Vec<String> = slots.keys().cloned().collect();
    keys.sort_by_cached_key(|k| slot_rank(k));
    keys
}

/// What a plan rewrite did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RewriteReport {
    pub entries_visited: usize,
    pub entries_changed: usize,
    /// Paths of nodes passed through untouched because they were malformed.
    pub skipped: Vec<String>,
    /// Day numbers missing from an otherwise `1..=max` sequence.
    pub day_gaps: Vec<u32>,
}

impl RewriteReport {
    fn skip(&mut self, path: String, reason: &str) {
        tracing::warn!(node = %path, reason, "skipping malformed plan node");
        self.skipped.push(path);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RewriteOutcome {
    pub plan: Value,
    pub report: RewriteReport,
}

/// Walks a generated plan and rewrites every meal entry.
///
/// The output always has the input's shape: same keys, same slot lists,
/// same entry counts. Anything that does not look like a plan node is
/// copied through.
#[derive(Debug, Clone)]
pub struct PlanWalker {
    rewriter: MealRewriter,
}

impl PlanWalker {
    pub fn new(restrictions: &RestrictionSet, map: &ReplacementMap, max_depth: usize) -> Self {
        Self {
            rewriter: MealRewriter::new(restrictions, map, max_depth),
        }
    }

    pub fn rewrite(&self, plan: &Value) -> RewriteOutcome {
        let mut report = RewriteReport::default();
        let legacy = plan.as_object().is_some_and(is_legacy_layout);
        let mut plan = plan.clone();

        match &mut plan {
            Value::Object(days) if legacy => {
                if let Some(Value::Array(list)) = days.get_mut(LEGACY_DAYS_KEY) {
                    self.rewrite_day_list(list, &mut report);
                }
            }
            Value::Object(days) => self.rewrite_day_map(days, &mut report),
            _ => {
                tracing::warn!("plan is not a mapping, leaving it unchanged");
            }
        }

        tracing::debug!(
            visited = report.entries_visited,
            changed = report.entries_changed,
            skipped = report.skipped.len(),
            "plan rewrite finished"
        );
        RewriteOutcome { plan, report }
    }

    fn rewrite_day_map(&self, days: &mut Map<String, Value>, report: &mut RewriteReport) {
        let mut numbered: Vec<(u32, String)> = Vec::with_capacity(days.len());
        for key in days.keys() {
            match parse_day_key(key) {
                Some(n) => numbered.push((n, key.clone())),
                None => report.skip(key.clone(), "key is not of the form 'Day <n>'"),
            }
        }
        numbered.sort();

        for (_, key) in &numbered {
            let Some(day) = days.get_mut(key) else { continue };
            match day {
                Value::Object(slots) => self.rewrite_slots(key, slots, report),
                _ => report.skip(key.clone(), "day is not a mapping"),
            }
        }

        report.day_gaps = day_gaps(numbered.iter().map(|(n, _)| *n));
        if !report.day_gaps.is_empty() {
            tracing::warn!(gaps = ?report.day_gaps, "plan day numbering is not contiguous");
        }
    }

    fn rewrite_slots(&self, day: &str, slots: &mut Map<String, Value>, report: &mut RewriteReport) {
        for label in ordered_slot_keys(slots) {
            let path = format!("{}/{}", day, label);
            match slots.get_mut(&label) {
                Some(Value::Array(entries)) => self.rewrite_entries(entries, report),
                _ => report.skip(path, "meal slot is not a list"),
            }
        }
    }

    fn rewrite_day_list(&self, list: &mut [Value], report: &mut RewriteReport) {
        for (idx, day) in list.iter_mut().enumerate() {
            let path = format!("{}[{}]", LEGACY_DAYS_KEY, idx);
            match day.get_mut(LEGACY_MEALS_KEY) {
                Some(Value::Array(entries)) => self.rewrite_entries(entries, report),
                _ => report.skip(path, "day has no meal list"),
            }
        }
    }

    fn rewrite_entries(&self, entries: &mut [Value], report: &mut RewriteReport) {
        for value in entries.iter_mut() {
            report.entries_visited += 1;
            let entry = MealEntry::from(value.clone());
            let (rewritten, changed) = self.rewriter.rewrite_entry(&entry);
            if changed {
                *value = rewritten.into();
                report.entries_changed += 1;
            }
        }
    }
}

/// Rewrites `plan` for `restrictions`. See [`PlanWalker`].
pub fn rewrite_plan(
    plan: &Value,
    restrictions: &RestrictionSet,
    map: &ReplacementMap,
    max_depth: usize,
) -> RewriteOutcome {
    PlanWalker::new(restrictions, map, max_depth).rewrite(plan)
}

/// `{"days": [...]}` with no `Day <n>` keys.
fn is_legacy_layout(days: &Map<String, Value>) -> bool {
    matches!(days.get(LEGACY_DAYS_KEY), Some(Value::Array(_)))
        && !days.keys().any(|k| parse_day_key(k).is_some())
}

fn day_gaps(days: impl Iterator<Item = u32>) -> Vec<u32> {
    let mut present: Vec<u32> = days.collect();
    present.sort_unstable();
    present.dedup();
    let Some(&max) = present.last() else {
        return Vec::new();
    };
    (1..=max).filter(|d| present.binary_search(d).is_err()).collect()
}

/// Entries of one day, by slot in traversal order. Slots that are not lists
/// are left out.
pub fn day_entries(plan: &Value, day: u32) -> Vec<(String, Vec<MealEntry>)> {
    let Some(days) = plan.as_object() else {
        return Vec::new();
    };
    let Some(slots) = days
        .iter()
        .find(|(key, _)| parse_day_key(key) == Some(day))
        .and_then(|(_, value)| value.as_object())
    else {
        return Vec::new();
    };

    ordered_slot_keys(slots)
        .into_iter()
        .filter_map(|label| {
            let entries = slots.get(&label)?.as_array()?;
            let entries = entries.iter().cloned().map(MealEntry::from).collect();
            Some((label, entries))
        })
        .collect()
}
