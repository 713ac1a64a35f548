use ratatui::widgets::ListState;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// A remotely fetched list shown on one page (Explore or History).
///
/// Every fetch gets a sequence number; only the response to the most recent
/// fetch is applied, so an older refresh finishing late cannot overwrite a
/// newer one.
#[derive(Debug)]
pub struct RemoteList<T> {
    pub items: Vec<T>,
    pub state: FetchState,
    pub list_state: ListState,
    latest_request: u64,
    failure_message: &'static str,
}

impl<T> RemoteList<T> {
    pub fn new(failure_message: &'static str) -> Self {
        Self {
            items: Vec::new(),
            state: FetchState::Idle,
            list_state: ListState::default(),
            latest_request: 0,
            failure_message,
        }
    }

    /// Mark a fetch as started and return its sequence number.
    pub fn begin_fetch(&mut self) -> u64 {
        self.latest_request += 1;
        self.state = FetchState::Loading;
        self.latest_request
    }

    /// Apply a fetch response. Returns false if the response was stale.
    pub fn apply(&mut self, seq: u64, result: Result<Vec<T>, String>) -> bool {
        if seq != self.latest_request {
            tracing::debug!(seq, latest = self.latest_request, "Discarding stale list response");
            return false;
        }
        match result {
            Ok(items) => {
                self.items = items;
                self.state = FetchState::Loaded;
                self.list_state.select(match self.items.is_empty() {
                    true => None,
                    false => Some(0),
                });
            }
            Err(cause) => {
                tracing::warn!(%cause, "List fetch failed");
                self.state = FetchState::Failed(self.failure_message.to_string());
            }
        }
        true
    }

    pub fn is_loading(&self) -> bool {
        self.state == FetchState::Loading
    }

    /// Loaded successfully but nothing to show.
    pub fn is_empty_loaded(&self) -> bool {
        self.state == FetchState::Loaded && self.items.is_empty()
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            FetchState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn selected(&self) -> Option<&T> {
        self.list_state.selected().and_then(|i| self.items.get(i))
    }

    pub fn select_next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(n) if n >= self.items.len() - 1 => 0,
            Some(n) => n + 1,
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_prev(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => self.items.len() - 1,
            Some(n) => n - 1,
        };
        self.list_state.select(Some(i));
    }

    /// Remove the first item matching `pred`, keeping the selection in range.
    pub fn remove_first(&mut self, pred: impl Fn(&T) -> bool) -> Option<T> {
        let index = self.items.iter().position(pred)?;
        let removed = self.items.remove(index);
        let selected = match (self.items.len(), self.list_state.selected()) {
            (0, _) => None,
            (len, Some(s)) if s >= len => Some(len - 1),
            (_, s) => s,
        };
        self.list_state.select(selected);
        Some(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MSG: &str = "Failed to load things. Please try again.";

    #[test]
    fn fetch_lifecycle() {
        let mut list: RemoteList<u32> = RemoteList::new(MSG);
        assert_eq!(list.state, FetchState::Idle);

        let seq = list.begin_fetch();
        assert!(list.is_loading());
        assert!(list.apply(seq, Ok(vec![1, 2, 3])));
        assert_eq!(list.state, FetchState::Loaded);
        assert_eq!(list.selected(), Some(&1));
    }

    #[test]
    fn failure_uses_generic_message() {
        let mut list: RemoteList<u32> = RemoteList::new(MSG);
        let seq = list.begin_fetch();
        list.apply(seq, Err("HTTP 500".to_string()));
        assert_eq!(list.error_message(), Some(MSG));
    }

    #[test]
    fn retry_after_failure_recovers() {
        let mut list: RemoteList<u32> = RemoteList::new(MSG);
        let first = list.begin_fetch();
        list.apply(first, Err("timeout".to_string()));
        let retry = list.begin_fetch();
        assert!(list.is_loading());
        list.apply(retry, Ok(vec![7]));
        assert_eq!(list.error_message(), None);
        assert_eq!(list.items, vec![7]);
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut list: RemoteList<u32> = RemoteList::new(MSG);
        let older = list.begin_fetch();
        let newer = list.begin_fetch();

        assert!(list.apply(newer, Ok(vec![2])));
        assert!(!list.apply(older, Ok(vec![1])));
        assert_eq!(list.items, vec![2]);
    }

    #[test]
    fn empty_result_is_distinct_from_loading() {
        let mut list: RemoteList<u32> = RemoteList::new(MSG);
        let seq = list.begin_fetch();
        assert!(!list.is_empty_loaded());
        list.apply(seq, Ok(vec![]));
        assert!(list.is_empty_loaded());
        assert_eq!(list.selected(), None);
    }

    #[test]
    fn navigation_wraps() {
        let mut list: RemoteList<u32> = RemoteList::new(MSG);
        let seq = list.begin_fetch();
        list.apply(seq, Ok(vec![1, 2]));
        list.select_next();
        assert_eq!(list.selected(), Some(&2));
        list.select_next();
        assert_eq!(list.selected(), Some(&1));
        list.select_prev();
        assert_eq!(list.selected(), Some(&2));
    }

    #[test]
    fn removing_last_item_clamps_selection() {
        let mut list: RemoteList<u32> = RemoteList::new(MSG);
        let seq = list.begin_fetch();
        list.apply(seq, Ok(vec![1, 2, 3]));
        list.list_state.select(Some(2));

        assert_eq!(list.remove_first(|v| *v == 3), Some(3));
        assert_eq!(list.selected(), Some(&2));
        assert_eq!(list.remove_first(|v| *v == 99), None);

        list.remove_first(|v| *v == 1);
        list.remove_first(|v| *v == 2);
        assert_eq!(list.selected(), None);
        assert!(list.is_empty_loaded());
    }
}
