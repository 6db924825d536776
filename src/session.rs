//! Browsing session: filters, the current result list and the detail cursor,
//! advanced one intent at a time.

use std::str::FromStr;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use crate::character::{CharacterIndex, ResolvedCharacter};
use crate::debounce::Debouncer;
use crate::navigation::{DetailCursor, Step};
use crate::query::{CharacterQuery, Facet, SortKey, query, results_label};

/// Something the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    SetSearch(String),
    SetUniverse(Facet),
    SetSeries(Facet),
    SetSort(Option<SortKey>),
    ClearSearch,
    /// Open the detail view at a position in the current results.
    OpenDetail(usize),
    /// Open the detail view for a character id, if it is in the current results.
    OpenDeepLink(String),
    Next,
    Previous,
    /// Move the detail view by a signed number of positions, stopping at
    /// either end of the results.
    Step(i64),
    CloseDetail,
}

/// Immutable snapshot of a browsing session. Every transition produces a new
/// state through [`SessionState::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    query: CharacterQuery,
    results: Vec<String>,
    detail: DetailCursor,
}

impl SessionState {
    /// Unfiltered, unsorted, no detail view.
    pub fn initial(index: &CharacterIndex) -> Self {
        let query = CharacterQuery::default();
        let results = run(index, &query);
        SessionState {
            query,
            results,
            detail: DetailCursor::default(),
        }
    }

    pub fn query(&self) -> &CharacterQuery {
        &self.query
    }

    /// Ids of the current results, in display order.
    pub fn results(&self) -> &[String] {
        &self.results
    }

    pub fn detail(&self) -> &DetailCursor {
        &self.detail
    }

    pub fn results_label(&self) -> String {
        results_label(self.results.len())
    }

    /// The characters behind [`Self::results`].
    pub fn result_characters<'a>(&self, index: &'a CharacterIndex) -> Vec<&'a ResolvedCharacter> {
        self.results.iter().filter_map(|id| index.get(id)).collect()
    }

    /// The character the detail view is showing.
    pub fn current<'a>(&self, index: &'a CharacterIndex) -> Option<&'a ResolvedCharacter> {
        self.detail.current().and_then(|id| index.get(id))
    }

    pub fn dispatch(self, index: &CharacterIndex, intent: Intent) -> Self {
        debug!(?intent, "dispatch");
        let SessionState {
            mut query,
            results,
            mut detail,
        } = self;

        match intent {
            Intent::SetSearch(term) => query.search_term = term,
            Intent::ClearSearch => query.search_term.clear(),
            Intent::SetUniverse(facet) => query.universe = facet,
            Intent::SetSeries(facet) => query.series = facet,
            Intent::SetSort(key) => query.sort_by = key,
            navigation => {
                detail = navigate(detail, &results, navigation);
                return SessionState {
                    query,
                    results,
                    detail,
                };
            }
        }

        let fresh = run(index, &query);
        if fresh != results {
            detail.close();
        }
        SessionState {
            query,
            results: fresh,
            detail,
        }
    }
}

/// Apply a detail-view intent. Filter intents leave the cursor alone.
fn navigate(mut detail: DetailCursor, results: &[String], intent: Intent) -> DetailCursor {
    match intent {
        Intent::OpenDetail(position) => DetailCursor::open(results.to_vec(), position),
        Intent::OpenDeepLink(id) => {
            let opened = DetailCursor::open_at_id(results.to_vec(), &id);
            if !opened.is_open() {
                debug!(%id, "deep link not in current results");
            }
            opened
        }
        Intent::Next => {
            detail.advance(Step::Next);
            detail
        }
        Intent::Previous => {
            detail.advance(Step::Previous);
            detail
        }
        Intent::Step(delta) => {
            detail.jump(delta);
            detail
        }
        Intent::CloseDetail => {
            detail.close();
            detail
        }
        _ => detail,
    }
}

fn run(index: &CharacterIndex, q: &CharacterQuery) -> Vec<String> {
    query(index, q).into_iter().map(|c| c.id.clone()).collect()
}

// ── Intent parsing ─────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntentParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("invalid position `{0}`")]
    InvalidPosition(String),
    #[error("invalid step `{0}`")]
    InvalidStep(String),
    #[error(transparent)]
    Sort(#[from] crate::query::UnknownSortKey),
}

impl FromStr for Intent {
    type Err = IntentParseError;

    /// One command per line: `search TEXT`, `clear`, `universe U`, `series S`,
    /// `sort KEY|none`, `open N`, `link ID`, `next`, `prev`, `step N`, `close`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, arg) = match line.split_once(char::is_whitespace) {
            Some((v, a)) => (v, a.trim()),
            None => (line, ""),
        };
        let required = |name: &'static str| {
            if arg.is_empty() {
                Err(IntentParseError::MissingArgument(name))
            } else {
                Ok(arg)
            }
        };

        Ok(match verb {
            "" => return Err(IntentParseError::Empty),
            "search" => Intent::SetSearch(arg.to_string()),
            "clear" => Intent::ClearSearch,
            "universe" => Intent::SetUniverse(facet(required("universe")?)),
            "series" => Intent::SetSeries(facet(required("series")?)),
            "sort" => match required("sort")? {
                "none" => Intent::SetSort(None),
                key => Intent::SetSort(Some(key.parse()?)),
            },
            "open" => {
                let n = required("open")?;
                Intent::OpenDetail(
                    n.parse()
                        .map_err(|_| IntentParseError::InvalidPosition(n.to_string()))?,
                )
            }
            "link" => Intent::OpenDeepLink(required("link")?.to_string()),
            "next" => Intent::Next,
            "prev" | "previous" => Intent::Previous,
            "step" => {
                let n = required("step")?;
                Intent::Step(
                    n.parse()
                        .map_err(|_| IntentParseError::InvalidStep(n.to_string()))?,
                )
            }
            "close" => Intent::CloseDetail,
            other => return Err(IntentParseError::UnknownCommand(other.to_string())),
        })
    }
}

fn facet(s: &str) -> Facet {
    s.parse().unwrap_or_default()
}

// ── Search box ─────────────────────────────────────────────────────

/// Debounced search input. Keystrokes go in, at most one `SetSearch` per
/// quiet period comes out.
#[derive(Debug, Clone)]
pub struct SearchBox {
    text: String,
    debouncer: Debouncer<String>,
}

impl SearchBox {
    pub fn new(quiet: Duration) -> Self {
        SearchBox {
            text: String::new(),
            debouncer: Debouncer::new(quiet),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the box contents.
    pub fn input(&mut self, text: &str, now: Instant) {
        self.text = text.to_string();
        self.debouncer.push(self.text.clone(), now);
    }

    pub fn tick(&mut self, now: Instant) -> Option<Intent> {
        self.debouncer.poll(now).map(Intent::SetSearch)
    }

    /// Emit whatever is pending without waiting.
    pub fn submit(&mut self) -> Option<Intent> {
        self.debouncer.flush().map(Intent::SetSearch)
    }
}

// ── Command stream ─────────────────────────────────────────────────

/// Drive a session from command lines, calling `emit` with the initial state
/// and after every change. Returns the final state.
///
/// Search lines go through a [`SearchBox`] timed by `clock`, so a burst of
/// them runs one query. Any other command first applies the pending search.
/// Lines that do not parse are logged and skipped. A read error ends the
/// session.
pub fn browse<L, S, E>(
    index: &CharacterIndex,
    quiet: Duration,
    lines: L,
    mut clock: impl FnMut() -> Instant,
    mut emit: impl FnMut(&SessionState) -> Result<(), E>,
) -> Result<SessionState, E>
where
    L: IntoIterator<Item = Result<S, E>>,
    S: AsRef<str>,
{
    let mut state = SessionState::initial(index);
    let mut search_box = SearchBox::new(quiet);
    emit(&state)?;

    for line in lines {
        let raw = line?;
        let line = raw.as_ref().trim();
        if line.is_empty() {
            continue;
        }
        let intent: Intent = match line.parse() {
            Ok(intent) => intent,
            Err(e) => {
                warn!(error = %e, line, "ignoring command");
                continue;
            }
        };

        let now = clock();
        if let Some(due) = search_box.tick(now) {
            state = state.dispatch(index, due);
            emit(&state)?;
        }
        match intent {
            Intent::SetSearch(text) => search_box.input(&text, now),
            other => {
                if let Some(pending) = search_box.submit() {
                    state = state.dispatch(index, pending);
                }
                state = state.dispatch(index, other);
                emit(&state)?;
            }
        }
    }

    if let Some(pending) = search_box.submit() {
        state = state.dispatch(index, pending);
        emit(&state)?;
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;
    use crate::character::tests::character;

    fn index() -> CharacterIndex {
        vec![
            character("bruce", "Bruce Wayne", "DC", &["Batman Series"], "9.8"),
            character("tony", "Tony Stark", "Marvel", &["Avengers Series"], "9.5"),
            character("clark", "Clark Kent", "DC", &["Superman Series"], "9.6"),
            character("wanda", "Wanda Maximoff", "Marvel", &["Avengers Series"], "9.3"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_initial_state() {
        let idx = index();
        let s = SessionState::initial(&idx);
        assert_eq!(s.results(), ["bruce", "tony", "clark", "wanda"]);
        assert!(!s.detail().is_open());
        assert_eq!(s.results_label(), "4 characters found");
    }

    #[test]
    fn test_filters_requery() {
        let idx = index();
        let s = SessionState::initial(&idx)
            .dispatch(&idx, Intent::SetUniverse(Facet::only("DC")))
            .dispatch(&idx, Intent::SetSort(Some(SortKey::Rating)));
        assert_eq!(s.results(), ["bruce", "clark"]);

        let s = s.dispatch(&idx, Intent::SetSearch("kent".into()));
        assert_eq!(s.results(), ["clark"]);
        let s = s.dispatch(&idx, Intent::ClearSearch);
        assert_eq!(s.results().len(), 2);
        assert_eq!(s.query().universe, Facet::only("DC"));
    }

    #[test]
    fn test_detail_navigation() {
        let idx = index();
        let s = SessionState::initial(&idx).dispatch(&idx, Intent::OpenDetail(2));
        assert_eq!(s.current(&idx).map(|c| c.id.as_str()), Some("clark"));

        let s = s
            .dispatch(&idx, Intent::Next)
            .dispatch(&idx, Intent::Next);
        assert_eq!(s.detail().current(), Some("wanda"));

        let s = s.dispatch(&idx, Intent::Previous);
        assert_eq!(s.detail().current(), Some("clark"));

        let s = s.dispatch(&idx, Intent::CloseDetail);
        assert!(s.current(&idx).is_none());
    }

    #[test]
    fn test_deep_link_uses_filtered_list() {
        let idx = index();
        let s = SessionState::initial(&idx)
            .dispatch(&idx, Intent::SetUniverse(Facet::only("Marvel")))
            .dispatch(&idx, Intent::OpenDeepLink("wanda".into()));
        assert_eq!(s.detail().position(), Some(1));

        let s = s.dispatch(&idx, Intent::OpenDeepLink("bruce".into()));
        assert!(!s.detail().is_open());
    }

    #[test]
    fn test_list_change_closes_detail() {
        let idx = index();
        let s = SessionState::initial(&idx).dispatch(&idx, Intent::OpenDetail(0));
        // Same results, detail stays open.
        let s = s.dispatch(&idx, Intent::SetSeries(Facet::All));
        assert!(s.detail().is_open());

        let s = s.dispatch(&idx, Intent::SetSort(Some(SortKey::Name)));
        assert!(!s.detail().is_open());
    }

    #[test]
    fn test_parse_intents() {
        assert_eq!(
            "search  dark knight ".parse::<Intent>(),
            Ok(Intent::SetSearch("dark knight".into()))
        );
        assert_eq!("search".parse::<Intent>(), Ok(Intent::SetSearch(String::new())));
        assert_eq!("universe all".parse::<Intent>(), Ok(Intent::SetUniverse(Facet::All)));
        assert_eq!(
            "series Batman Series".parse::<Intent>(),
            Ok(Intent::SetSeries(Facet::only("Batman Series")))
        );
        assert_eq!("sort none".parse::<Intent>(), Ok(Intent::SetSort(None)));
        assert_eq!("sort rating".parse::<Intent>(), Ok(Intent::SetSort(Some(SortKey::Rating))));
        assert_eq!("open 3".parse::<Intent>(), Ok(Intent::OpenDetail(3)));
        assert_eq!("link bruce".parse::<Intent>(), Ok(Intent::OpenDeepLink("bruce".into())));
        assert_eq!("prev".parse::<Intent>(), Ok(Intent::Previous));
        assert_eq!("step -3".parse::<Intent>(), Ok(Intent::Step(-3)));
        assert_eq!("step x".parse::<Intent>(), Err(IntentParseError::InvalidStep("x".into())));

        assert_eq!("".parse::<Intent>(), Err(IntentParseError::Empty));
        assert_eq!("open x".parse::<Intent>(), Err(IntentParseError::InvalidPosition("x".into())));
        assert_eq!("link".parse::<Intent>(), Err(IntentParseError::MissingArgument("link")));
        assert!(matches!("sort power".parse::<Intent>(), Err(IntentParseError::Sort(_))));
        assert_eq!(
            "jump".parse::<Intent>(),
            Err(IntentParseError::UnknownCommand("jump".into()))
        );
    }

    #[test]
    fn test_step_clamps_to_results() {
        let idx = index();
        let s = SessionState::initial(&idx)
            .dispatch(&idx, Intent::OpenDetail(1))
            .dispatch(&idx, Intent::Step(i64::MAX));
        assert_eq!(s.detail().current(), Some("wanda"));
        assert!(!s.detail().can_go_next());

        let s = s.dispatch(&idx, Intent::Step(-2));
        assert_eq!(s.detail().current(), Some("tony"));
        let s = s.dispatch(&idx, Intent::Step(i64::MIN));
        assert_eq!(s.detail().current(), Some("bruce"));

        let s = s
            .dispatch(&idx, Intent::CloseDetail)
            .dispatch(&idx, Intent::Step(1));
        assert!(!s.detail().is_open());
    }

    /// Run `browse` over `lines`, advancing the clock `gap_ms` per command.
    fn browse_lines(
        idx: &CharacterIndex,
        lines: &[&str],
        gap_ms: u64,
    ) -> (SessionState, Vec<SessionState>) {
        let t0 = Instant::now();
        let mut ticks = 0;
        let clock = move || {
            ticks += 1;
            t0 + Duration::from_millis(ticks * gap_ms)
        };
        let mut emitted = Vec::new();
        let last = browse(
            idx,
            Duration::from_millis(300),
            lines.iter().map(|l| Ok::<_, Infallible>(*l)),
            clock,
            |s| {
                emitted.push(s.clone());
                Ok(())
            },
        )
        .unwrap();
        (last, emitted)
    }

    #[test]
    fn test_browse_search_burst_runs_once() {
        let idx = index();
        let (last, emitted) = browse_lines(&idx, &["search w", "search wa", "search wan"], 20);
        assert_eq!(emitted.len(), 2);
        assert_eq!(emitted[0], SessionState::initial(&idx));
        assert_eq!(last.query().search_term, "wan");
        assert_eq!(last.results(), ["wanda"]);
        assert_eq!(emitted[1], last);
    }

    #[test]
    fn test_browse_open_sees_latest_search() {
        let idx = index();
        let (last, emitted) = browse_lines(&idx, &["search tony", "search wanda", "open 0"], 20);
        assert_eq!(emitted.len(), 2);
        assert_eq!(last.query().search_term, "wanda");
        assert_eq!(last.detail().current(), Some("wanda"));
    }

    #[test]
    fn test_browse_skips_bad_lines() {
        let idx = index();
        let (last, emitted) = browse_lines(&idx, &["jump", "", "open x", "   ", "open 1"], 20);
        assert_eq!(emitted.len(), 2);
        assert_eq!(last.detail().current(), Some("tony"));
    }

    #[test]
    fn test_browse_step_past_either_end() {
        let idx = index();
        let (last, emitted) = browse_lines(&idx, &["open 1", "step 100"], 20);
        assert_eq!(last.detail().current(), Some("wanda"));
        assert_eq!(emitted.len(), 3);

        let (last, _) = browse_lines(&idx, &["open 2", "step -100", "prev"], 20);
        assert_eq!(last.detail().current(), Some("bruce"));
    }

    #[test]
    fn test_browse_quiet_gap_applies_search() {
        let idx = index();
        let (last, emitted) = browse_lines(&idx, &["search kent", "next"], 400);
        assert_eq!(emitted.len(), 3);
        assert_eq!(emitted[1].results(), ["clark"]);
        assert_eq!(last.results(), ["clark"]);
        assert!(!last.detail().is_open());
    }

    #[test]
    fn test_search_box_debounces() {
        let t0 = Instant::now();
        let mut sb = SearchBox::new(Duration::from_millis(300));
        sb.input("w", t0);
        sb.input("wa", t0 + Duration::from_millis(120));
        assert_eq!(sb.tick(t0 + Duration::from_millis(300)), None);
        assert_eq!(
            sb.tick(t0 + Duration::from_millis(420)),
            Some(Intent::SetSearch("wa".into()))
        );
        assert_eq!(sb.tick(t0 + Duration::from_millis(900)), None);
        assert_eq!(sb.text(), "wa");

        sb.input("wan", t0 + Duration::from_millis(1000));
        assert_eq!(sb.submit(), Some(Intent::SetSearch("wan".into())));
    }
}
