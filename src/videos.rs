//! Related-video recommendations with a series/universe fallback cascade.

use std::collections::{HashMap, HashSet};

use catalog_types::Video;
use serde::Serialize;

use crate::character::{CharacterIndex, ResolvedCharacter};

pub const DEFAULT_VIDEO_LIMIT: usize = 3;

/// Where a recommendation set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Videos tagged with the character itself.
    Direct,
    /// Videos of related characters.
    Fallback,
    /// Nothing found.
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation<'a> {
    pub provenance: Provenance,
    pub videos: Vec<&'a Video>,
}

impl Recommendation<'_> {
    fn empty() -> Self {
        Recommendation {
            provenance: Provenance::None,
            videos: Vec::new(),
        }
    }
}

/// Collects distinct videos up to a limit.
struct Picker<'a> {
    limit: usize,
    seen: HashSet<&'a str>,
    picked: Vec<&'a Video>,
}

impl<'a> Picker<'a> {
    fn new(limit: usize) -> Self {
        Picker {
            limit,
            seen: HashSet::new(),
            picked: Vec::new(),
        }
    }

    fn is_full(&self) -> bool {
        self.picked.len() >= self.limit
    }

    fn offer_all(&mut self, videos: &[&'a Video]) {
        for &v in videos {
            if self.is_full() {
                return;
            }
            if self.seen.insert(v.youtube_id.as_str()) {
                self.picked.push(v);
            }
        }
    }
}

/// Recommend up to `limit` videos for `character_id`.
///
/// Direct matches win outright. Only when there are none does the cascade
/// run: first characters sharing a series, then characters sharing the
/// universe, each in index order with their videos in source order.
pub fn recommend_videos<'a>(
    character_id: &str,
    index: &CharacterIndex,
    videos: &'a [Video],
    limit: usize,
) -> Recommendation<'a> {
    let by_character = group_by_character(videos);

    let mut picker = Picker::new(limit);
    if let Some(direct) = by_character.get(character_id) {
        picker.offer_all(direct);
        return Recommendation {
            provenance: Provenance::Direct,
            videos: picker.picked,
        };
    }

    let Some(target) = index.get(character_id) else {
        return Recommendation::empty();
    };

    let mut visited: HashSet<&str> = HashSet::from([target.id.as_str()]);
    let tiers: [&dyn Fn(&ResolvedCharacter) -> bool; 2] = [
        &|c: &ResolvedCharacter| c.shares_series_with(target),
        &|c: &ResolvedCharacter| c.universe == target.universe,
    ];

    for related in tiers {
        for c in index.iter() {
            if picker.is_full() {
                break;
            }
            if visited.contains(c.id.as_str()) || !related(c) {
                continue;
            }
            visited.insert(&c.id);
            if let Some(list) = by_character.get(c.id.as_str()) {
                picker.offer_all(list);
            }
        }
    }

    if picker.picked.is_empty() {
        Recommendation::empty()
    } else {
        Recommendation {
            provenance: Provenance::Fallback,
            videos: picker.picked,
        }
    }
}

fn group_by_character(videos: &[Video]) -> HashMap<&str, Vec<&Video>> {
    let mut out: HashMap<&str, Vec<&Video>> = HashMap::new();
    for v in videos {
        out.entry(v.character_id.as_str()).or_default().push(v);
    }
    out
}

// ── Video subsection state ─────────────────────────────────────────

/// What the video part of a detail view shows. Failures stay inside it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VideoPanel<'a> {
    /// The video document could not be loaded.
    Unavailable,
    /// Loaded, but nothing matched even after the fallback cascade.
    Empty,
    Videos(Recommendation<'a>),
}

impl<'a> VideoPanel<'a> {
    pub fn build(
        character_id: &str,
        index: &CharacterIndex,
        videos: Option<&'a [Video]>,
        limit: usize,
    ) -> Self {
        let Some(videos) = videos else {
            return VideoPanel::Unavailable;
        };
        let rec = recommend_videos(character_id, index, videos, limit);
        if rec.videos.is_empty() {
            VideoPanel::Empty
        } else {
            VideoPanel::Videos(rec)
        }
    }

    pub fn message(&self) -> Option<&'static str> {
        match self {
            VideoPanel::Unavailable => Some("Unable to load videos at this time."),
            VideoPanel::Empty => Some("No videos available for this character."),
            VideoPanel::Videos(_) => None,
        }
    }
}

pub fn watch_url(video: &Video) -> String {
    format!("https://www.youtube.com/watch?v={}", video.youtube_id)
}

pub fn thumbnail_url(video: &Video) -> String {
    format!("https://img.youtube.com/vi/{}/hqdefault.jpg", video.youtube_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::tests::character;

    fn video(character_id: &str, youtube_id: &str) -> Video {
        Video {
            character_id: character_id.into(),
            youtube_id: youtube_id.into(),
            title: format!("{character_id} {youtube_id}"),
            duration: "10:00".into(),
            views: "1M".into(),
        }
    }

    fn yt(rec: &Recommendation<'_>) -> Vec<String> {
        rec.videos.iter().map(|v| v.youtube_id.clone()).collect()
    }

    fn index() -> CharacterIndex {
        vec![
            character("tanjiro", "Tanjiro", "Anime", &["Demon Slayer Series"], "9.0"),
            character("nezuko", "Nezuko", "Anime", &["Demon Slayer Series"], "9.1"),
            character("zenitsu", "Zenitsu", "Anime", &["Demon Slayer Series"], "8.5"),
            character("naruto", "Naruto", "Anime", &["Naruto Series"], "9.2"),
            character("bruce", "Bruce", "DC", &["Batman Series"], "9.8"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_direct_videos_skip_cascade() {
        let videos = vec![
            video("nezuko", "n1"),
            video("tanjiro", "t1"),
            video("tanjiro", "t1"),
            video("tanjiro", "t2"),
        ];
        let rec = recommend_videos("tanjiro", &index(), &videos, 3);
        assert_eq!(rec.provenance, Provenance::Direct);
        assert_eq!(yt(&rec), vec!["t1", "t2"]);
    }

    #[test]
    fn test_direct_capped_at_limit() {
        let videos: Vec<Video> = (0..5).map(|i| video("bruce", &format!("b{i}"))).collect();
        let rec = recommend_videos("bruce", &index(), &videos, 3);
        assert_eq!(yt(&rec), vec!["b0", "b1", "b2"]);
    }

    #[test]
    fn test_series_pool_fills_limit() {
        // Two series-mates with four videos between them, one shared id.
        let videos = vec![
            video("nezuko", "n1"),
            video("zenitsu", "z1"),
            video("nezuko", "n2"),
            video("zenitsu", "n1"),
            video("naruto", "x1"),
        ];
        let rec = recommend_videos("tanjiro", &index(), &videos, 3);
        assert_eq!(rec.provenance, Provenance::Fallback);
        // Nezuko comes first in index order, then Zenitsu's new video.
        assert_eq!(yt(&rec), vec!["n1", "n2", "z1"]);
    }

    #[test]
    fn test_universe_tier_after_series_tier() {
        let videos = vec![
            video("naruto", "x1"),
            video("nezuko", "n1"),
            video("bruce", "b1"),
        ];
        let rec = recommend_videos("tanjiro", &index(), &videos, 3);
        assert_eq!(yt(&rec), vec!["n1", "x1"]);
    }

    #[test]
    fn test_unknown_character_is_empty() {
        let videos = vec![video("nezuko", "n1")];
        let rec = recommend_videos("ghost", &index(), &videos, 3);
        assert_eq!(rec.provenance, Provenance::None);
        assert!(rec.videos.is_empty());
    }

    #[test]
    fn test_no_related_videos() {
        let videos = vec![video("naruto", "x1")];
        let rec = recommend_videos("bruce", &index(), &videos, 3);
        assert_eq!(rec, Recommendation::empty());
    }

    #[test]
    fn test_panel_states() {
        let idx = index();
        assert_eq!(
            VideoPanel::build("bruce", &idx, None, 3),
            VideoPanel::Unavailable
        );
        let videos = vec![video("bruce", "b1")];
        assert_eq!(VideoPanel::build("naruto", &idx, Some(&videos), 3), VideoPanel::Empty);
        assert_eq!(
            VideoPanel::build("naruto", &idx, Some(&videos), 3).message(),
            Some("No videos available for this character.")
        );
        assert!(matches!(
            VideoPanel::build("bruce", &idx, Some(&videos), 3),
            VideoPanel::Videos(_)
        ));
    }

    #[test]
    fn test_links() {
        let v = video("bruce", "abc123");
        assert_eq!(watch_url(&v), "https://www.youtube.com/watch?v=abc123");
        assert_eq!(thumbnail_url(&v), "https://img.youtube.com/vi/abc123/hqdefault.jpg");
    }
}
