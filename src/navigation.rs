//! Prev/next cursor for the detail view.

/// Direction of a single detail-view step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Previous,
    Next,
}

/// A position inside a snapshot of the result list the detail view was
/// opened from. Unset until a detail view is opened.
///
/// Invariant: when set, `position < ids.len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailCursor {
    ids: Vec<String>,
    position: Option<usize>,
}

impl DetailCursor {
    /// Open at `index`. An out-of-range index leaves the cursor unset.
    pub fn open(ids: Vec<String>, index: usize) -> Self {
        let position = (index < ids.len()).then_some(index);
        DetailCursor { ids, position }
    }

    /// Open at the position `id` currently holds in `ids`, if any.
    pub fn open_at_id(ids: Vec<String>, id: &str) -> Self {
        match position_of(&ids, id) {
            Some(index) => Self::open(ids, index),
            None => DetailCursor::default(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.position.is_some()
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Id of the character being shown.
    pub fn current(&self) -> Option<&str> {
        self.position.map(|i| self.ids[i].as_str())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn can_go_previous(&self) -> bool {
        self.position.is_some_and(|i| i > 0)
    }

    pub fn can_go_next(&self) -> bool {
        self.position.is_some_and(|i| i + 1 < self.ids.len())
    }

    /// Move one step. Returns false (and stays put) at either end or when
    /// the cursor is unset.
    pub fn advance(&mut self, step: Step) -> bool {
        match step {
            Step::Previous => self.jump(-1),
            Step::Next => self.jump(1),
        }
    }

    /// Move `delta` positions at once, stopping at the first or last item.
    /// Returns whether the position changed.
    pub fn jump(&mut self, delta: i64) -> bool {
        let Some(i) = self.position else {
            return false;
        };
        let last = self.ids.len() - 1;
        let distance = usize::try_from(delta.unsigned_abs()).unwrap_or(usize::MAX);
        let target = if delta < 0 {
            i.saturating_sub(distance)
        } else {
            i.saturating_add(distance).min(last)
        };
        self.position = Some(target);
        target != i
    }

    pub fn close(&mut self) {
        self.ids.clear();
        self.position = None;
    }
}

/// Where a deep-linked id sits in the given list.
pub fn position_of(ids: &[String], id: &str) -> Option<usize> {
    ids.iter().position(|x| x == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unset_by_default() {
        let mut c = DetailCursor::default();
        assert!(!c.is_open());
        assert_eq!(c.current(), None);
        assert!(!c.can_go_previous());
        assert!(!c.can_go_next());
        assert!(!c.advance(Step::Next));
    }

    #[test]
    fn test_step_without_wrapping() {
        let mut c = DetailCursor::open(list(&["a", "b", "c"]), 0);
        assert_eq!(c.current(), Some("a"));
        assert!(!c.can_go_previous());
        assert!(!c.advance(Step::Previous));
        assert_eq!(c.current(), Some("a"));

        assert!(c.advance(Step::Next));
        assert!(c.advance(Step::Next));
        assert_eq!(c.current(), Some("c"));
        assert!(!c.can_go_next());
        assert!(!c.advance(Step::Next));
        assert_eq!(c.position(), Some(2));

        assert!(c.advance(Step::Previous));
        assert_eq!(c.current(), Some("b"));
    }

    #[test]
    fn test_jump_clamps_to_ends() {
        let mut c = DetailCursor::open(list(&["a", "b", "c", "d"]), 1);
        assert!(c.jump(2));
        assert_eq!(c.current(), Some("d"));
        assert!(c.jump(-2));
        assert_eq!(c.current(), Some("b"));
        assert!(!c.jump(0));

        assert!(c.jump(i64::MAX));
        assert_eq!(c.position(), Some(3));
        assert!(!c.jump(i64::MAX));
        assert!(c.jump(i64::MIN));
        assert_eq!(c.position(), Some(0));
        assert!(!c.jump(-1));

        let mut closed = DetailCursor::default();
        assert!(!closed.jump(5));
        assert!(!closed.is_open());
    }

    #[test]
    fn test_open_out_of_range() {
        let c = DetailCursor::open(list(&["a"]), 1);
        assert!(!c.is_open());
        let c = DetailCursor::open(Vec::new(), 0);
        assert!(!c.is_open());
    }

    #[test]
    fn test_open_at_id() {
        let c = DetailCursor::open_at_id(list(&["a", "b", "c"]), "b");
        assert_eq!(c.position(), Some(1));
        assert!(c.can_go_previous() && c.can_go_next());

        let c = DetailCursor::open_at_id(list(&["a", "c"]), "b");
        assert!(!c.is_open());
    }

    #[test]
    fn test_single_item_list() {
        let mut c = DetailCursor::open(list(&["only"]), 0);
        assert!(!c.can_go_previous());
        assert!(!c.can_go_next());
        assert!(!c.advance(Step::Next));
        c.close();
        assert!(!c.is_open());
        assert!(c.is_empty());
    }
}
