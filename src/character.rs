//! The normalized view of the catalog: one record per character id.

use catalog_types::{Ability, Appearance, ArmorPiece};
use indexmap::IndexMap;
use serde::Serialize;

use crate::rating::{StarRating, parse_rating};

/// Label used for a series id that has no entry in the lookup.
pub const UNKNOWN_SERIES: &str = "Unknown";

// ── Resolved character ─────────────────────────────────────────────

/// A deduplicated character with every derived field filled in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedCharacter {
    pub id: String,
    pub name: String,
    /// World of the first primary definition seen for this id.
    pub universe: String,
    #[serde(rename = "originalSeries")]
    pub original_series: String,
    #[serde(rename = "seriesId")]
    pub series_id: String,
    /// Series ids, first-seen order, no duplicates.
    #[serde(rename = "appearsIn")]
    pub appears_in: Vec<String>,
    /// `appears_in` mapped through the series lookup.
    #[serde(rename = "seriesNames")]
    pub series_names: Vec<String>,
    pub rating: String,
    pub logo: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alias: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub title: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appearance: Option<Appearance>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub armor_costume: Vec<ArmorPiece>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub abilities: Vec<Ability>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub gallery: Vec<String>,
}

impl ResolvedCharacter {
    pub fn rating_value(&self) -> f64 {
        parse_rating(&self.rating)
    }

    pub fn stars(&self) -> StarRating {
        StarRating::from_rating(self.rating_value())
    }

    /// Short line under the name on a card: first alias, else first title.
    pub fn subtitle(&self) -> &str {
        self.alias
            .first()
            .or_else(|| self.title.first())
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn primary_series(&self) -> &str {
        if !self.original_series.is_empty() {
            self.original_series.as_str()
        } else {
            self.series_names
                .first()
                .map(String::as_str)
                .unwrap_or(UNKNOWN_SERIES)
        }
    }

    /// Case-insensitive substring match over name, aliases, titles and
    /// ability names/short descriptions. `needle` must already be lowercase.
    pub fn matches_text(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        let hit = |s: &str| s.to_lowercase().contains(needle);

        hit(self.name.as_str())
            || self.alias.iter().any(|a| hit(a.as_str()))
            || self.title.iter().any(|t| hit(t.as_str()))
            || self.abilities.iter().any(|ab| {
                hit(ab.name.as_str()) || ab.short_description.as_deref().is_some_and(hit)
            })
    }

    pub fn appears_in_series_named(&self, series_name: &str) -> bool {
        self.series_names.iter().any(|s| s == series_name)
    }

    pub fn shares_series_with(&self, other: &ResolvedCharacter) -> bool {
        self.series_names
            .iter()
            .any(|s| other.appears_in_series_named(s))
    }
}

// ── Character index ────────────────────────────────────────────────

/// Characters keyed by id, iterated in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharacterIndex {
    by_id: IndexMap<String, ResolvedCharacter>,
}

impl CharacterIndex {
    pub fn get(&self, id: &str) -> Option<&ResolvedCharacter> {
        self.by_id.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedCharacter> {
        self.by_id.values()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Distinct universes in first-seen order.
    pub fn universes(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for c in self.iter() {
            if !seen.contains(&c.universe.as_str()) {
                seen.push(c.universe.as_str());
            }
        }
        seen
    }
}

impl FromIterator<ResolvedCharacter> for CharacterIndex {
    /// Later records with an id already present are ignored.
    fn from_iter<I: IntoIterator<Item = ResolvedCharacter>>(iter: I) -> Self {
        let mut by_id = IndexMap::new();
        for c in iter {
            by_id.entry(c.id.clone()).or_insert(c);
        }
        CharacterIndex { by_id }
    }
}

impl<'a> IntoIterator for &'a CharacterIndex {
    type Item = &'a ResolvedCharacter;
    type IntoIter = indexmap::map::Values<'a, String, ResolvedCharacter>;

    fn into_iter(self) -> Self::IntoIter {
        self.by_id.values()
    }
}

// ── Series lookup ──────────────────────────────────────────────────

/// Series id → series name, in the order series were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SeriesLookup {
    names: IndexMap<String, String>,
}

impl SeriesLookup {
    /// Record a series. A repeated id takes the later name.
    pub fn insert(&mut self, id: &str, name: &str) {
        self.names.insert(id.to_string(), name.to_string());
    }

    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// Display label for a series id, `"Unknown"` when unmapped.
    pub fn label(&self, id: &str) -> &str {
        self.name_of(id).unwrap_or(UNKNOWN_SERIES)
    }

    /// Distinct series names in lookup order.
    pub fn distinct_names(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for name in self.names.values() {
            if !out.contains(&name.as_str()) {
                out.push(name.as_str());
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
