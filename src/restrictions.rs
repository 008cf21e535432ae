use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeSet;

/// The restriction-bearing part of a user profile.
///
/// Every field is optional: a profile that lacks a field resolves exactly
/// like one where the field is an empty string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub allergies: Option<String>,
    #[serde(alias = "medical_conditions")]
    pub dietary_restrictions: Option<String>,
    pub disliked_foods: Option<String>,
}

impl UserProfile {
    pub fn new(
        allergies: impl Into<String>,
        dietary_restrictions: impl Into<String>,
        disliked_foods: impl Into<String>,
    ) -> Self {
        Self {
            allergies: Some(allergies.into()),
            dietary_restrictions: Some(dietary_restrictions.into()),
            disliked_foods: Some(disliked_foods.into()),
        }
    }
}

/// Normalized set of forbidden keywords for one user.
///
/// Keywords are trimmed, lower-cased and never empty. Iteration through
/// [`RestrictionSet::iter`] is in match order: longest keyword first, ties
/// broken lexicographically, so that `eggplant` is tried before `egg`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestrictionSet {
    terms: BTreeSet<String>,
    ordered: Vec<String>,
}

impl RestrictionSet {
    /// Union of the three comma-separated profile fields.
    pub fn from_profile(profile: &UserProfile) -> Self {
        let fields = [
            profile.allergies.as_deref(),
            profile.dietary_restrictions.as_deref(),
            profile.disliked_foods.as_deref(),
        ];
        Self::from_terms(fields.into_iter().flatten().flat_map(split_field))
    }

    pub fn from_fields(allergies: &str, dietary_restrictions: &str, disliked_foods: &str) -> Self {
        Self::from_profile(&UserProfile::new(
            allergies,
            dietary_restrictions,
            disliked_foods,
        ))
    }

    /// Builds a set from already-split terms, applying the same
    /// normalization as profile fields.
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms: BTreeSet<String> = terms
            .into_iter()
            .filter_map(|t| normalize_token(t.as_ref()))
            .collect();
        let mut ordered: Vec<String> = terms.iter().cloned().collect();
        ordered.sort_by(|a, b| (Reverse(a.len()), a).cmp(&(Reverse(b.len()), b)));
        Self { terms, ordered }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.terms.contains(keyword)
    }

    /// Keywords in match order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ordered.iter().map(String::as_str)
    }

    /// First keyword (in match order) that occurs in `text`, compared
    /// case-insensitively.
    pub fn first_contained_in(&self, text: &str) -> Option<&str> {
        let folded = fold_case(text);
        self.iter().find(|kw| folded.contains(kw))
    }
}

/// Lower-cases one char at a time. Unlike `str::to_lowercase` this has no
/// context-dependent mappings (word-final `Σ` folds to `σ`, not `ς`), so it
/// agrees with the char-wise matching done by the meal rewriter.
pub fn fold_case(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

fn split_field(field: &str) -> impl Iterator<Item = &str> {
    let field = if is_none_marker(field) { "" } else { field };
    field.split(',')
}

fn normalize_token(token: &str) -> Option<String> {
    let token = token.trim();
    if token.is_empty() || is_none_marker(token) {
        return None;
    }
    Some(fold_case(token))
}

fn is_none_marker(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case("none")
}
