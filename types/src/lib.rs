//! Shapes of the catalog source documents as they arrive on disk.
//!
//! Everything here is a data contract: `data.json` (worlds → series →
//! character entries) and `videos.json`. No normalization happens in this
//! crate beyond classifying each character entry as a primary definition or
//! a reference while it is deserialized.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

// ── Character document ──────────────────────────────────────────────────

/// Root of `data.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Document {
    #[serde(rename = "Worlds")]
    pub worlds: Vec<World>,
}

/// A universe grouping such as "Marvel", "DC" or "Anime".
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct World {
    pub name: String,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Series {
    pub id: String,
    pub name: String,
    pub characters: Vec<CharacterEntry>,
}

/// One entry in a series' character list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawEntry")]
pub enum CharacterEntry {
    /// Full attribute set for a character.
    Definition(CharacterDefinition),
    /// `{ "reference": true, "character_id": "..." }`: the character also
    /// appears in this series, defined elsewhere.
    Reference(CharacterReference),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterReference {
    pub character_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterDefinition {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alias: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub title: Vec<String>,
    /// Numeric string such as "9.4". Empty strings are treated as absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appearance: Option<Appearance>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub armor_costume: Vec<ArmorPiece>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub abilities: Vec<Ability>,
    /// Image filenames, resolved to paths at display time.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gallery: Vec<String>,
}

/// Free-form descriptive attributes, grouped by body region.
/// Key order is kept as written in the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appearance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<IndexMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<IndexMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_body: Option<IndexMap<String, String>>,
}

impl Appearance {
    /// All (region, attribute, value) triples in display order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &str, &str)> {
        [
            ("head", self.head.as_ref()),
            ("body", self.body.as_ref()),
            ("lower_body", self.lower_body.as_ref()),
        ]
        .into_iter()
        .filter_map(|(region, part)| part.map(|p| (region, p)))
        .flat_map(|(region, part)| {
            part.iter()
                .map(move |(k, v)| (region, k.as_str(), v.as_str()))
        })
    }
}

/// A single-key object in `armor_costume`, e.g. `{ "helmet": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "IndexMap<String, String>", into = "IndexMap<String, String>")]
pub struct ArmorPiece {
    pub label: String,
    pub description: String,
}

impl TryFrom<IndexMap<String, String>> for ArmorPiece {
    type Error = String;

    fn try_from(map: IndexMap<String, String>) -> Result<Self, Self::Error> {
        // Extra keys are ignored; the first one names the piece.
        let (label, description) = map
            .into_iter()
            .next()
            .ok_or_else(|| "armor_costume entry has no key".to_string())?;
        Ok(ArmorPiece { label, description })
    }
}

impl From<ArmorPiece> for IndexMap<String, String> {
    fn from(piece: ArmorPiece) -> Self {
        IndexMap::from([(piece.label, piece.description)])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ability {
    pub name: String,
    /// e.g. "physical", "energy"
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_description: Option<String>,
}

// ── Raw entry classification ────────────────────────────────────────────

/// Every field an entry may carry, before deciding which kind it is.
#[derive(Deserialize)]
struct RawEntry {
    #[serde(default)]
    reference: bool,
    #[serde(default)]
    character_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    alias: Option<Vec<String>>,
    #[serde(default)]
    title: Option<Vec<String>>,
    #[serde(default, deserialize_with = "deserialize_rating")]
    rating: Option<String>,
    #[serde(default)]
    logo: Option<String>,
    #[serde(default)]
    appearance: Option<Appearance>,
    #[serde(default)]
    armor_costume: Option<Vec<ArmorPiece>>,
    #[serde(default)]
    abilities: Option<Vec<Ability>>,
    #[serde(default)]
    gallery: Option<Vec<String>>,
}

impl TryFrom<RawEntry> for CharacterEntry {
    type Error = String;

    fn try_from(raw: RawEntry) -> Result<Self, Self::Error> {
        if raw.reference {
            let character_id = raw
                .character_id
                .ok_or_else(|| "reference entry is missing `character_id`".to_string())?;
            return Ok(CharacterEntry::Reference(CharacterReference { character_id }));
        }

        let id = raw
            .id
            .ok_or_else(|| "character definition is missing `id`".to_string())?;
        let name = raw
            .name
            .ok_or_else(|| format!("character definition `{id}` is missing `name`"))?;

        Ok(CharacterEntry::Definition(CharacterDefinition {
            id,
            name,
            alias: raw.alias.unwrap_or_default(),
            title: raw.title.unwrap_or_default(),
            rating: raw.rating,
            logo: raw.logo.filter(|l| !l.is_empty()),
            appearance: raw.appearance,
            armor_costume: raw.armor_costume.unwrap_or_default(),
            abilities: raw.abilities.unwrap_or_default(),
            gallery: raw.gallery.unwrap_or_default(),
        }))
    }
}

/// Scalars that some producers write as numbers and others as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(f64),
}

impl TextOrNumber {
    fn into_text(self) -> String {
        match self {
            TextOrNumber::Text(s) => s.trim().to_string(),
            TextOrNumber::Number(n) => n.to_string(),
        }
    }

    /// Ratings keep at least one decimal, so `9` reads as `9.0`.
    fn into_rating_text(self) -> String {
        match self {
            TextOrNumber::Number(n) if n.fract() == 0.0 => format!("{n:.1}"),
            other => other.into_text(),
        }
    }
}

fn deserialize_rating<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Option::<TextOrNumber>::deserialize(d)?;
    Ok(value
        .map(TextOrNumber::into_rating_text)
        .filter(|s| !s.is_empty()))
}

fn deserialize_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let value = Option::<TextOrNumber>::deserialize(d)?;
    Ok(value.map(TextOrNumber::into_text).unwrap_or_default())
}

// ── Video document ──────────────────────────────────────────────────────

/// Root of `videos.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoDocument {
    pub videos: Vec<Video>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub character_id: String,
    /// Dedup key within a recommendation set.
    pub youtube_id: String,
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub duration: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub views: String,
}
