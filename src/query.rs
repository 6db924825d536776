//! Filtering and sorting over the character index.

use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::character::{CharacterIndex, ResolvedCharacter, SeriesLookup};

/// Sentinel accepted by every facet to mean "no restriction".
pub const ALL: &str = "all";

// ── Facets ─────────────────────────────────────────────────────────

/// An exact-match filter on one attribute, or `all`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Facet {
    #[default]
    All,
    Only(String),
}

impl Facet {
    pub fn only(value: impl Into<String>) -> Self {
        Facet::Only(value.into())
    }

    pub fn admits(&self, value: &str) -> bool {
        match self {
            Facet::All => true,
            Facet::Only(v) => v == value,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Facet::All => ALL,
            Facet::Only(v) => v.as_str(),
        }
    }
}

impl FromStr for Facet {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s == ALL {
            Facet::All
        } else {
            Facet::Only(s.to_string())
        })
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Sort keys ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    /// Name ascending.
    Name,
    /// Rating descending.
    Rating,
    /// Universe ascending, then name ascending.
    Universe,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown sort key `{0}` (expected name, rating or universe)")]
pub struct UnknownSortKey(pub String);

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SortKey::Name),
            "rating" => Ok(SortKey::Rating),
            "universe" => Ok(SortKey::Universe),
            other => Err(UnknownSortKey(other.to_string())),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortKey::Name => "name",
            SortKey::Rating => "rating",
            SortKey::Universe => "universe",
        })
    }
}

// ── Query ──────────────────────────────────────────────────────────

/// Current search box text, facet selections and sort order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterQuery {
    pub search_term: String,
    pub universe: Facet,
    pub series: Facet,
    pub sort_by: Option<SortKey>,
}

impl CharacterQuery {
    pub fn matches(&self, character: &ResolvedCharacter) -> bool {
        let needle = self.search_term.to_lowercase();
        self.matches_with(character, &needle)
    }

    fn matches_with(&self, character: &ResolvedCharacter, needle: &str) -> bool {
        character.matches_text(needle)
            && self.universe.admits(&character.universe)
            && match &self.series {
                Facet::All => true,
                Facet::Only(name) => character.appears_in_series_named(name),
            }
    }
}

/// Filter then sort. Without a sort key the index order is kept.
pub fn query<'a>(index: &'a CharacterIndex, q: &CharacterQuery) -> Vec<&'a ResolvedCharacter> {
    let needle = q.search_term.to_lowercase();
    let mut out: Vec<&ResolvedCharacter> =
        index.iter().filter(|c| q.matches_with(c, &needle)).collect();
    if let Some(key) = q.sort_by {
        sort_characters(&mut out, key);
    }
    out
}

/// Stable sort, so equal keys keep their relative order.
pub fn sort_characters(list: &mut [&ResolvedCharacter], key: SortKey) {
    match key {
        SortKey::Name => list.sort_by(|a, b| compare_text(&a.name, &b.name)),
        SortKey::Rating => list.sort_by(|a, b| b.rating_value().total_cmp(&a.rating_value())),
        SortKey::Universe => list.sort_by(|a, b| {
            compare_text(&a.universe, &b.universe).then_with(|| compare_text(&a.name, &b.name))
        }),
    }
}

/// Case-insensitive first, raw bytes as tie-break.
fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

// ── Facet options and labels ───────────────────────────────────────

/// Universe filter choices: `all` followed by each universe in index order.
pub fn universe_options(index: &CharacterIndex) -> Vec<String> {
    std::iter::once(ALL)
        .chain(index.universes())
        .map(str::to_string)
        .collect()
}

/// Series filter choices: `all` followed by each distinct series name.
pub fn series_options(series: &SeriesLookup) -> Vec<String> {
    std::iter::once(ALL)
        .chain(series.distinct_names())
        .map(str::to_string)
        .collect()
}

pub fn results_label(count: usize) -> String {
    if count == 1 {
        "1 character found".to_string()
    } else {
        format!("{count} characters found")
    }
}
