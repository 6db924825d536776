//! Flattening the nested source document into the character index.
//!
//! Three stages, each consuming the previous stage's output:
//!
//!   1. [`collect_definitions`]: one draft per primary id, plus the series
//!      lookup. Duplicate definitions only add a series appearance.
//!   2. [`resolve_references`]: reference entries add series appearances to
//!      existing drafts. Dangling references are counted and dropped.
//!   3. [`finalize`]: rating/logo backfill and series names.
//!
//! All stages walk World → Series → entry in source order.

use catalog_types::{CharacterDefinition, CharacterEntry, Document};
use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::assets::{AssetLookup, LogoSubject};
use crate::character::{CharacterIndex, ResolvedCharacter, SeriesLookup};
use crate::rating::default_rating;

/// Normalizer output: held read-only for the rest of the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub index: CharacterIndex,
    pub series: SeriesLookup,
    /// References whose target id has no primary definition.
    pub dropped_references: usize,
}

/// A character between stage 1 and stage 3.
#[derive(Debug, Clone, PartialEq)]
struct Draft {
    definition: CharacterDefinition,
    universe: String,
    original_series: String,
    series_id: String,
    appears_in: IndexSet<String>,
}

/// Stage 1 output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Definitions {
    drafts: IndexMap<String, Draft>,
    series: SeriesLookup,
}

/// Stage 2 output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Appearances {
    drafts: IndexMap<String, Draft>,
    series: SeriesLookup,
    dropped_references: usize,
}

/// Stage 1: index every primary definition by id and record series names.
pub fn collect_definitions(document: &Document) -> Definitions {
    let mut out = Definitions::default();

    for world in &document.worlds {
        for series in &world.series {
            out.series.insert(&series.id, &series.name);

            for entry in &series.characters {
                let CharacterEntry::Definition(def) = entry else {
                    continue;
                };
                match out.drafts.get_mut(&def.id) {
                    Some(existing) => {
                        // First definition keeps universe, series and attributes.
                        existing.appears_in.insert(series.id.clone());
                    }
                    None => {
                        out.drafts.insert(
                            def.id.clone(),
                            Draft {
                                definition: def.clone(),
                                universe: world.name.clone(),
                                original_series: series.name.clone(),
                                series_id: series.id.clone(),
                                appears_in: IndexSet::from([series.id.clone()]),
                            },
                        );
                    }
                }
            }
        }
    }

    out
}

/// Stage 2: fold reference entries into the drafts from stage 1.
pub fn resolve_references(document: &Document, definitions: Definitions) -> Appearances {
    let Definitions { mut drafts, series } = definitions;
    let mut dropped_references = 0;

    for world in &document.worlds {
        for s in &world.series {
            for entry in &s.characters {
                let CharacterEntry::Reference(reference) = entry else {
                    continue;
                };
                match drafts.get_mut(&reference.character_id) {
                    Some(draft) => {
                        draft.appears_in.insert(s.id.clone());
                    }
                    None => {
                        debug!(
                            character_id = %reference.character_id,
                            series_id = %s.id,
                            "dropping reference to undefined character"
                        );
                        dropped_references += 1;
                    }
                }
            }
        }
    }

    Appearances {
        drafts,
        series,
        dropped_references,
    }
}

/// Stage 3: fill in defaults and derived fields.
pub fn finalize(appearances: Appearances, assets: &impl AssetLookup) -> Catalog {
    let Appearances {
        drafts,
        series,
        dropped_references,
    } = appearances;

    let index: CharacterIndex = drafts
        .into_values()
        .map(|draft| resolve_draft(draft, &series, assets))
        .collect();

    Catalog {
        index,
        series,
        dropped_references,
    }
}

fn resolve_draft(
    draft: Draft,
    series: &SeriesLookup,
    assets: &impl AssetLookup,
) -> ResolvedCharacter {
    let Draft {
        definition,
        universe,
        original_series,
        series_id,
        appears_in,
    } = draft;

    let rating = definition
        .rating
        .unwrap_or_else(|| default_rating(&definition.id));
    let logo = match definition.logo {
        Some(logo) => logo,
        None => assets.logo(&LogoSubject {
            id: &definition.id,
            name: &definition.name,
            universe: &universe,
            logo: None,
        }),
    };
    let appears_in: Vec<String> = appears_in.into_iter().collect();
    let series_names = appears_in
        .iter()
        .map(|id| series.label(id).to_string())
        .collect();

    ResolvedCharacter {
        id: definition.id,
        name: definition.name,
        universe,
        original_series,
        series_id,
        appears_in,
        series_names,
        rating,
        logo,
        alias: definition.alias,
        title: definition.title,
        appearance: definition.appearance,
        armor_costume: definition.armor_costume,
        abilities: definition.abilities,
        gallery: definition.gallery,
    }
}

/// Run all three stages over a parsed document.
pub fn normalize(document: &Document, assets: &impl AssetLookup) -> Catalog {
    let definitions = collect_definitions(document);
    let appearances = resolve_references(document, definitions);
    let catalog = finalize(appearances, assets);

    debug!(
        characters = catalog.index.len(),
        series = catalog.series.len(),
        dropped_references = catalog.dropped_references,
        "normalized character document"
    );
    catalog
}
