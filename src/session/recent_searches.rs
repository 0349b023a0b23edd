use std::collections::VecDeque;

const MAX_RECENT_SEARCHES: usize = 5;

/// Most-recent-first list of distinct search terms.
#[derive(Debug, Clone, Default)]
pub struct RecentSearches {
    terms: VecDeque<String>
}

impl RecentSearches {
    pub fn new() -> Self {
        Self { terms: VecDeque::with_capacity(MAX_RECENT_SEARCHES) }
    }

    pub fn record(&mut self, term: &str) {
        if term.trim().is_empty() {
            return;
        }

        self.terms.retain(|existing| existing != term);
        self.terms.push_front(term.to_string());
        self.terms.truncate(MAX_RECENT_SEARCHES);
    }

    pub fn terms(&self) -> Vec<String> {
        self.terms.iter().cloned().collect()
    }
}
