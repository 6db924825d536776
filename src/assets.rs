//! Logo and gallery path resolution.
//!
//! Resolution never fails. Each lookup builds an ordered candidate list and
//! picks one path. Without an inventory the first candidate wins. With an
//! inventory (the asset tree walked once at startup) the first candidate
//! present on disk wins, falling back to a placeholder image URL.

use std::collections::HashSet;
use std::path::Path;

use regex::Regex;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::character::ResolvedCharacter;

const LOGO_DIR: &str = "assets/images/logos";
const PLACEHOLDER_HOST: &str = "https://via.placeholder.com";

/// What the logo lookup knows about a character.
#[derive(Debug, Clone, Copy)]
pub struct LogoSubject<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub universe: &'a str,
    pub logo: Option<&'a str>,
}

impl<'a> LogoSubject<'a> {
    pub fn of(character: &'a ResolvedCharacter) -> Self {
        LogoSubject {
            id: &character.id,
            name: &character.name,
            universe: &character.universe,
            logo: Some(character.logo.as_str()).filter(|l| !l.is_empty()),
        }
    }
}

/// Image lookup consumed by the normalizer and by detail views.
pub trait AssetLookup {
    fn logo(&self, subject: &LogoSubject<'_>) -> String;
    fn gallery_image(&self, filename: &str, character_id: &str) -> String;
}

/// Candidate-list resolver, optionally backed by an on-disk inventory.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    /// Relative paths like `assets/images/logos/x_logo.jpeg`.
    inventory: Option<HashSet<String>>,
    whitespace: Regex,
}

impl Default for AssetResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetResolver {
    /// Resolver without an inventory: always answers the first candidate.
    pub fn new() -> Self {
        AssetResolver {
            inventory: None,
            whitespace: Regex::new(r"\s+").expect("whitespace regex"),
        }
    }

    pub fn with_inventory<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AssetResolver {
            inventory: Some(paths.into_iter().map(Into::into).collect()),
            ..Self::new()
        }
    }

    /// Walk `root` (the directory the `assets/...` paths are relative to)
    /// and record every file found under it.
    ///
    /// Unreadable entries are skipped; a missing root yields an empty
    /// inventory, so every lookup ends at its placeholder.
    pub fn scan(root: &Path) -> Self {
        if !root.is_dir() {
            warn!(root = %root.display(), "asset root is not a directory");
        }
        let mut paths = HashSet::new();
        for entry in WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(root) else {
                continue;
            };
            let rel: Vec<String> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            paths.insert(rel.join("/"));
        }
        debug!(root = %root.display(), files = paths.len(), "asset inventory built");
        Self::with_inventory(paths)
    }

    pub fn inventory_len(&self) -> Option<usize> {
        self.inventory.as_ref().map(HashSet::len)
    }

    /// Ordered logo candidates, without the placeholder.
    pub fn logo_candidates(&self, subject: &LogoSubject<'_>) -> Vec<String> {
        let slug = if subject.name.is_empty() {
            "default".to_string()
        } else {
            self.whitespace
                .replace_all(&subject.name.to_lowercase(), "_")
                .into_owned()
        };
        let universe_logo = match subject.universe {
            "Marvel" => "marvel_logo.jpeg",
            "DC" => "dc_logo.jpeg",
            _ => "anime_logo.jpeg",
        };

        vec![
            format!("{LOGO_DIR}/{slug}_logo.jpeg"),
            format!("{LOGO_DIR}/{}_logo.jpeg", subject.id.replacen('-', "_", 1)),
            format!("{LOGO_DIR}/{}_logo.jpeg", subject.id),
            format!("{LOGO_DIR}/{universe_logo}"),
        ]
    }

    pub fn gallery_candidates(&self, filename: &str) -> Vec<String> {
        vec![
            format!("assets/images/characters/{filename}"),
            format!("assets/images/gallery/{filename}"),
            filename.to_string(),
        ]
    }

    fn pick(&self, candidates: Vec<String>, placeholder: impl FnOnce() -> String) -> String {
        match &self.inventory {
            None => candidates.into_iter().next().unwrap_or_else(placeholder),
            Some(known) => candidates
                .into_iter()
                .find(|c| known.contains(c))
                .unwrap_or_else(placeholder),
        }
    }
}

impl AssetLookup for AssetResolver {
    fn logo(&self, subject: &LogoSubject<'_>) -> String {
        if let Some(logo) = subject.logo
            && logo.contains('/')
        {
            return logo.to_string();
        }
        self.pick(self.logo_candidates(subject), || {
            logo_placeholder(subject.name)
        })
    }

    fn gallery_image(&self, filename: &str, _character_id: &str) -> String {
        if filename.contains('/') {
            return filename.to_string();
        }
        self.pick(self.gallery_candidates(filename), || {
            gallery_placeholder(filename)
        })
    }
}

/// `300x400` card placeholder showing the first letter of the name.
pub fn logo_placeholder(name: &str) -> String {
    let initial: String = name.chars().take(1).collect();
    format!(
        "{PLACEHOLDER_HOST}/300x400/1a1a2e/ffffff?text={}",
        urlencoding::encode(&initial)
    )
}

/// `600x800` gallery placeholder labelled with the file stem.
pub fn gallery_placeholder(filename: &str) -> String {
    let stem = filename.split('.').next().unwrap_or(filename);
    format!(
        "{PLACEHOLDER_HOST}/600x800/1a1a2e/ffffff?text={}",
        urlencoding::encode(stem)
    )
}

/// Main image of a detail view: the first gallery image, else the logo.
pub fn hero_image(assets: &impl AssetLookup, character: &ResolvedCharacter) -> String {
    match character.gallery.first() {
        Some(first) => assets.gallery_image(first, &character.id),
        None => assets.logo(&LogoSubject::of(character)),
    }
}

/// Every gallery entry resolved to a path, in source order.
pub fn gallery_paths(assets: &impl AssetLookup, character: &ResolvedCharacter) -> Vec<String> {
    character
        .gallery
        .iter()
        .map(|file| assets.gallery_image(file, &character.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::tests::character;

    fn subject<'a>(id: &'a str, name: &'a str, universe: &'a str) -> LogoSubject<'a> {
        LogoSubject {
            id,
            name,
            universe,
            logo: None,
        }
    }

    #[test]
    fn test_logo_without_inventory_takes_first_candidate() {
        let r = AssetResolver::new();
        assert_eq!(
            r.logo(&subject("peter-parker", "Peter  Parker", "Marvel")),
            "assets/images/logos/peter_parker_logo.jpeg"
        );
    }

    #[test]
    fn test_logo_with_slash_is_kept() {
        let r = AssetResolver::with_inventory(Vec::<String>::new());
        let s = LogoSubject {
            logo: Some("cdn/x.png"),
            ..subject("x", "X", "DC")
        };
        assert_eq!(r.logo(&s), "cdn/x.png");
    }

    #[test]
    fn test_logo_candidates_order() {
        let r = AssetResolver::new();
        let c = r.logo_candidates(&subject("spider-man-2", "Spider Man", "Marvel"));
        assert_eq!(
            c,
            vec![
                "assets/images/logos/spider_man_logo.jpeg",
                "assets/images/logos/spider_man-2_logo.jpeg",
                "assets/images/logos/spider-man-2_logo.jpeg",
                "assets/images/logos/marvel_logo.jpeg",
            ]
        );
        let c = r.logo_candidates(&subject("goku", "Goku", "Dragon Ball"));
        assert_eq!(c[3], "assets/images/logos/anime_logo.jpeg");
    }

    #[test]
    fn test_logo_with_inventory_falls_through() {
        let r = AssetResolver::with_inventory(["assets/images/logos/dc_logo.jpeg"]);
        assert_eq!(
            r.logo(&subject("bruce", "Bruce Wayne", "DC")),
            "assets/images/logos/dc_logo.jpeg"
        );
        assert_eq!(
            r.logo(&subject("goku", "Son Goku", "Anime")),
            "https://via.placeholder.com/300x400/1a1a2e/ffffff?text=S"
        );
    }

    #[test]
    fn test_placeholders_are_encoded() {
        assert_eq!(
            logo_placeholder("Édith"),
            "https://via.placeholder.com/300x400/1a1a2e/ffffff?text=%C3%89"
        );
        assert_eq!(
            logo_placeholder(""),
            "https://via.placeholder.com/300x400/1a1a2e/ffffff?text="
        );
        assert_eq!(
            gallery_placeholder("bat cave.final.png"),
            "https://via.placeholder.com/600x800/1a1a2e/ffffff?text=bat%20cave"
        );
    }

    #[test]
    fn test_gallery_resolution() {
        let r = AssetResolver::new();
        assert_eq!(
            r.gallery_image("b1.jpg", "bruce"),
            "assets/images/characters/b1.jpg"
        );
        assert_eq!(r.gallery_image("x/b1.jpg", "bruce"), "x/b1.jpg");

        let r = AssetResolver::with_inventory(["assets/images/gallery/b1.jpg"]);
        assert_eq!(r.gallery_image("b1.jpg", "bruce"), "assets/images/gallery/b1.jpg");
        assert_eq!(
            r.gallery_image("b2.jpg", "bruce"),
            "https://via.placeholder.com/600x800/1a1a2e/ffffff?text=b2"
        );
    }

    #[test]
    fn test_hero_image() {
        let r = AssetResolver::new();
        let mut c = character("bruce", "Bruce Wayne", "DC", &["Batman Series"], "9.0");
        assert_eq!(hero_image(&r, &c), "assets/images/logos/bruce_logo.jpeg");
        c.gallery = vec!["b1.jpg".into(), "b2.jpg".into()];
        assert_eq!(hero_image(&r, &c), "assets/images/characters/b1.jpg");
        assert_eq!(gallery_paths(&r, &c).len(), 2);
    }

    #[test]
    fn test_scan_builds_relative_inventory() {
        let dir = tempfile::tempdir().unwrap();
        let logos = dir.path().join("assets/images/logos");
        std::fs::create_dir_all(&logos).unwrap();
        std::fs::write(logos.join("bruce_logo.jpeg"), b"jpeg").unwrap();

        let r = AssetResolver::scan(dir.path());
        assert_eq!(r.inventory_len(), Some(1));
        assert_eq!(
            r.logo(&subject("bruce", "Batman", "DC")),
            "assets/images/logos/bruce_logo.jpeg"
        );
    }
}
