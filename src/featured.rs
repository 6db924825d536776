//! Featured characters: one top-rated pick per configured priority series,
//! topped up with the best remaining characters.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::character::{CharacterIndex, ResolvedCharacter};
use crate::query::{SortKey, sort_characters};

/// Priority series for one universe, in pick order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityUniverse {
    pub name: String,
    pub series: Vec<String>,
}

impl PriorityUniverse {
    pub fn new(name: &str, series: &[&str]) -> Self {
        PriorityUniverse {
            name: name.to_string(),
            series: series.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturedConfig {
    pub target_count: usize,
    /// Universes in pick order.
    pub universes: Vec<PriorityUniverse>,
}

impl Default for FeaturedConfig {
    fn default() -> Self {
        FeaturedConfig {
            target_count: 6,
            universes: vec![
                PriorityUniverse::new(
                    "DC",
                    &["Batman Series", "Superman Series", "Justice League Series"],
                ),
                PriorityUniverse::new("Marvel", &["Avengers Series"]),
                PriorityUniverse::new(
                    "Anime",
                    &["Naruto Series", "One Piece Series", "Demon Slayer Series"],
                ),
            ],
        }
    }
}

/// Pick up to `target_count` distinct characters.
///
/// Each (universe, series) pair contributes its highest-rated unused
/// character; the first one seen wins a tie. Remaining slots go to unused
/// characters by rating.
pub fn select_featured<'a>(
    index: &'a CharacterIndex,
    config: &FeaturedConfig,
) -> Vec<&'a ResolvedCharacter> {
    let mut featured: Vec<&ResolvedCharacter> = Vec::new();
    let mut used: HashSet<&str> = HashSet::new();

    for universe in &config.universes {
        for series_name in &universe.series {
            let mut best: Option<&ResolvedCharacter> = None;
            for c in index.iter() {
                if c.universe != universe.name
                    || !c.appears_in_series_named(series_name)
                    || used.contains(c.id.as_str())
                {
                    continue;
                }
                if best.is_none_or(|b| c.rating_value() > b.rating_value()) {
                    best = Some(c);
                }
            }
            if let Some(pick) = best {
                used.insert(&pick.id);
                featured.push(pick);
            }
        }
    }

    if featured.len() < config.target_count {
        let mut rest: Vec<&ResolvedCharacter> = index
            .iter()
            .filter(|c| !used.contains(c.id.as_str()))
            .collect();
        sort_characters(&mut rest, SortKey::Rating);
        let missing = config.target_count - featured.len();
        featured.extend(rest.into_iter().take(missing));
    }

    featured.truncate(config.target_count);
    featured
}
