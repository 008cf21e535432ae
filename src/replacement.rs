use csv::ReaderBuilder;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use crate::error::{GuardError, Result};
use crate::restrictions::{fold_case, RestrictionSet};

pub const DEFAULT_FALLBACK: &str = "vegetables";
pub const DEFAULT_MAX_DEPTH: usize = 3;

const RESTRICTED_COL: &str = "restricted";
const SUBSTITUTE_COL: &str = "substitute";

const BUILTIN_TABLE: &[(&str, &str)] = &[
    ("beef", "chicken"),
    ("pork", "chicken"),
    ("lamb", "chicken"),
    ("shrimp", "tofu"),
    ("fish", "chicken"),
    ("eggplant", "zucchini"),
    ("peanut", "sunflower seeds"),
    ("milk", "soy milk"),
    ("egg", "tofu scramble"),
    ("cheese", "vegan cheese"),
    ("butter", "olive oil"),
    ("cream", "coconut milk"),
];

/// Keyword → default substitute table, plus the fallback used on a lookup
/// miss. Keys are lower-case; substitutes are never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementMap {
    entries: BTreeMap<String, String>,
    fallback: String,
}

impl Default for ReplacementMap {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ReplacementMap {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
            fallback: DEFAULT_FALLBACK.to_string(),
        }
    }

    /// The reference table shipped with the crate.
    pub fn builtin() -> Self {
        let mut map = Self::empty();
        for (keyword, substitute) in BUILTIN_TABLE {
            map.entries
                .insert((*keyword).to_string(), (*substitute).to_string());
        }
        map
    }

    /// Adds or overrides one entry. Fails if `substitute` is blank.
    pub fn insert(&mut self, keyword: &str, substitute: &str) -> Result<()> {
        let keyword = fold_case(keyword.trim());
        let substitute = substitute.trim();
        if substitute.is_empty() {
            return Err(GuardError::EmptySubstitute(keyword));
        }
        self.entries.insert(keyword, substitute.to_string());
        Ok(())
    }

    pub fn with_entry(mut self, keyword: &str, substitute: &str) -> Result<Self> {
        self.insert(keyword, substitute)?;
        Ok(self)
    }

    /// Replaces the fallback substitute. A blank value keeps the current one.
    pub fn with_fallback(mut self, fallback: &str) -> Self {
        let fallback = fallback.trim();
        if !fallback.is_empty() {
            self.fallback = fallback.to_string();
        }
        self
    }

    pub fn get(&self, keyword: &str) -> Option<&str> {
        self.entries.get(keyword).map(String::as_str)
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Loads a table from a CSV file with `restricted,substitute` headers.
    pub fn from_csv_path(csv_path: &Path) -> Result<Self> {
        let file = std::fs::File::open(csv_path)?;
        Self::from_csv_reader(file).map_err(|e| match e {
            GuardError::ReplacementTable { source, .. } => GuardError::ReplacementTable {
                path: csv_path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let table_err = |source| GuardError::ReplacementTable {
            path: Default::default(),
            source,
        };
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers().map_err(table_err)?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| GuardError::MissingColumn(name.to_string()))
        };
        let restricted_idx = column(RESTRICTED_COL)?;
        let substitute_idx = column(SUBSTITUTE_COL)?;

        let mut map = Self::empty();
        for record in rdr.records() {
            let record = record.map_err(table_err)?;
            let keyword = record.get(restricted_idx).unwrap_or_default();
            if keyword.is_empty() {
                continue;
            }
            map.insert(keyword, record.get(substitute_idx).unwrap_or_default())?;
        }
        Ok(map)
    }
}

/// Picks a substitute for `keyword` that contains none of `restrictions`.
///
/// Each step looks the current keyword up in `map` (falling back to the
/// map's fallback on a miss). If the candidate contains a restricted
/// keyword, that keyword becomes the next lookup. After `max_depth` steps
/// without a clean candidate the fallback is returned unchecked. A keyword
/// that comes up a second time means the chain is a cycle and can only end
/// at the depth bound, so the fallback is returned straight away.
pub fn find_safe_replacement(
    keyword: &str,
    restrictions: &RestrictionSet,
    map: &ReplacementMap,
    max_depth: usize,
) -> String {
    let mut current = keyword;
    let mut visited = vec![keyword];
    let mut remaining = max_depth;
    while remaining > 0 {
        let candidate = map.get(current).unwrap_or(map.fallback());
        match restrictions.first_contained_in(candidate) {
            None => return candidate.to_string(),
            Some(next) => {
                tracing::trace!(keyword = current, candidate, next, "substitute is restricted");
                if visited.contains(&next) {
                    break;
                }
                visited.push(next);
                current = next;
                remaining -= 1;
            }
        }
    }
    map.fallback().to_string()
}
