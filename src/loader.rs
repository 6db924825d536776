//! Reading the character and video documents from the data directory.

use std::path::Path;

use catalog_types::{Document, Video, VideoDocument};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::assets::AssetLookup;
use crate::config::{DATA_FILE, VIDEOS_FILE};
use crate::error::{CatalogError, DocumentKind, Result};
use crate::normalize::{Catalog, normalize};

pub fn parse_document(json: &str) -> Result<Document> {
    parse(json, DocumentKind::Characters)
}

pub fn parse_videos(json: &str) -> Result<Vec<Video>> {
    let doc: VideoDocument = parse(json, DocumentKind::Videos)?;
    Ok(doc.videos)
}

/// Load and normalize `data.json`. Any structural problem fails the whole
/// load; nothing is indexed.
pub fn load_catalog(data_dir: &Path, assets: &impl AssetLookup) -> Result<Catalog> {
    let document = parse_document(&read(&data_dir.join(DATA_FILE))?)?;
    let catalog = normalize(&document, assets);
    info!(
        characters = catalog.index.len(),
        series = catalog.series.len(),
        worlds = document.worlds.len(),
        "loaded catalog"
    );
    Ok(catalog)
}

/// Load `videos.json`. Callers treat a failure here as "videos unavailable".
pub fn load_videos(data_dir: &Path) -> Result<Vec<Video>> {
    let videos = parse_videos(&read(&data_dir.join(VIDEOS_FILE))?)?;
    info!(videos = videos.len(), "loaded videos");
    Ok(videos)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse<T: DeserializeOwned>(json: &str, kind: DocumentKind) -> Result<T> {
    serde_json::from_str(json).map_err(|e| CatalogError::structural(kind, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document_structural_errors() {
        let with_entry = |entry: &str| {
            format!(
                r#"{{"Worlds": [{{"name": "DC", "series": [
                    {{"id": "s1", "name": "B", "characters": [{entry}]}}
                ]}}]}}"#
            )
        };
        for bad in [
            String::new(),
            "{}".to_string(),
            r#"{"Worlds": [{"name": "DC"}]}"#.to_string(),
            with_entry(r#"{"name": "No Id"}"#),
            with_entry(r#"{"reference": true}"#),
        ] {
            let err = parse_document(&bad).unwrap_err();
            assert!(err.is_structural(), "{bad}");
        }
    }

    #[test]
    fn test_parse_videos() {
        let videos = parse_videos(
            r#"{"videos": [{
                "character_id": "bruce", "youtube_id": "abc",
                "title": "T", "duration": "1:00", "views": "5K"
            }]}"#,
        )
        .unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].youtube_id, "abc");

        let err = parse_videos(r#"{"videos": [{"character_id": "bruce"}]}"#).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Structural {
                kind: DocumentKind::Videos,
                ..
            }
        ));
    }
}
