//! Character ratings: parsing, synthetic defaults and star display.

use serde::Serialize;

/// Lowest synthetic rating. Defaults fall in [8.0, 10.0) in 0.1 steps.
pub const MIN_DEFAULT_RATING: f64 = 8.0;
const DEFAULT_RATING_STEPS: u64 = 20;

/// Numeric value of a rating string. Anything unparsable counts as 0.
pub fn parse_rating(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Rating assigned to a character whose source entry has none.
///
/// Derived from a hash of the id, so the same document always normalizes to
/// the same ratings.
pub fn default_rating(id: &str) -> String {
    let digest = blake3::hash(id.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.as_bytes()[..8]);
    let step = u64::from_le_bytes(head) % DEFAULT_RATING_STEPS;
    format!("{:.1}", MIN_DEFAULT_RATING + step as f64 / 10.0)
}

/// A ten-point rating drawn on a five-star scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StarRating {
    pub full: u8,
    pub half: bool,
    pub empty: u8,
}

impl StarRating {
    pub fn from_rating(rating: f64) -> Self {
        let stars = rating.clamp(0.0, 10.0) / 2.0;
        let full = stars.floor() as u8;
        let half = stars - stars.floor() >= 0.5;
        let empty = 5 - full - u8::from(half);
        StarRating { full, half, empty }
    }

    /// `★★★★½` style rendering for terminal output.
    pub fn render(&self) -> String {
        let mut out = "★".repeat(self.full as usize);
        if self.half {
            out.push('½');
        }
        out.push_str(&"☆".repeat(self.empty as usize));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rating() {
        assert_eq!(parse_rating("9.4"), 9.4);
        assert_eq!(parse_rating(" 8 "), 8.0);
        assert_eq!(parse_rating("n/a"), 0.0);
        assert_eq!(parse_rating(""), 0.0);
        assert_eq!(parse_rating("NaN"), 0.0);
    }

    #[test]
    fn test_default_rating_stable_and_in_range() {
        for id in ["bruce", "clark", "naruto", "", "spider-man"] {
            let a = default_rating(id);
            assert_eq!(a, default_rating(id));
            let v = parse_rating(&a);
            assert!((8.0..10.0).contains(&v), "{id} → {a}");
            assert_eq!(a.split('.').nth(1).map(str::len), Some(1));
        }
    }

    #[test]
    fn test_star_rating() {
        assert_eq!(
            StarRating::from_rating(9.5),
            StarRating { full: 4, half: true, empty: 0 }
        );
        assert_eq!(
            StarRating::from_rating(8.0),
            StarRating { full: 4, half: false, empty: 1 }
        );
        assert_eq!(
            StarRating::from_rating(10.0),
            StarRating { full: 5, half: false, empty: 0 }
        );
        assert_eq!(
            StarRating::from_rating(0.0),
            StarRating { full: 0, half: false, empty: 5 }
        );
        assert_eq!(StarRating::from_rating(7.0).render(), "★★★½☆");
    }
}
