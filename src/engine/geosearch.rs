use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::models::location::Location;
use crate::models::place::GeoSearchResult;
use crate::state::AppState;

pub const MIN_QUERY_CHARS: usize = 2;

/// Debounced place lookup. Each call to [`search`](Self::search) supersedes the previous
/// one: its pending timer or in-flight request is aborted, and a result is only applied
/// while its generation is still the latest.
pub struct GeosearchResolver {
    state: Arc<AppState>,
    debounce: Duration,
    limit: usize,
    generation: Arc<AtomicU64>,
    pending: Option<JoinHandle<()>>,
}

impl GeosearchResolver {
    pub fn new(state: Arc<AppState>, debounce: Duration, limit: usize) -> Self {
        Self {
            state,
            debounce,
            limit,
            generation: Arc::new(AtomicU64::new(0)),
            pending: None,
        }
    }

    pub fn search(&mut self, term: &str) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(previous) = self.pending.take() {
            if !previous.is_finished() {
                previous.abort();
                self.state.metrics.searches_superseded_total.inc();
            }
        }

        let term = term.trim().to_string();
        if term.chars().count() < MIN_QUERY_CHARS {
            self.state.search_results.send_replace(Arc::new(Vec::new()));
            return;
        }

        let state = Arc::clone(&self.state);
        let current = Arc::clone(&self.generation);
        let debounce = self.debounce;
        let limit = self.limit;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;

            let result = state.service.search_places(&term, limit).await;
            if current.load(Ordering::SeqCst) != generation {
                debug!(query = %term, "discarding superseded search result");
                return;
            }

            match result {
                Ok(mut results) => {
                    results.truncate(limit);
                    debug!(query = %term, count = results.len(), "search results applied");
                    state.search_results.send_replace(Arc::new(results));
                }
                Err(err) => {
                    debug!(query = %term, error = %err, "search failed; keeping previous results");
                }
            }
        }));
    }

    pub fn results(&self) -> Arc<Vec<GeoSearchResult>> {
        self.state.search_results.borrow().clone()
    }

    /// Location of the `index`-th displayed result.
    pub fn select(&self, index: usize) -> Option<Location> {
        self.state
            .search_results
            .borrow()
            .get(index)
            .map(GeoSearchResult::location)
    }
}

impl Drop for GeosearchResolver {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::GeosearchResolver;
    use crate::engine::test_support::fixture;

    const DEBOUNCE: Duration = Duration::from_millis(250);

    #[tokio::test(start_paused = true)]
    async fn single_character_issues_no_request() {
        let (state, service) = fixture();
        let mut resolver = GeosearchResolver::new(state, DEBOUNCE, 6);

        resolver.search("a");
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(service.calls().is_empty());
        assert!(resolver.results().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn keystrokes_within_window_issue_one_request() {
        let (state, service) = fixture();
        service.add_search("bangalore road", Duration::ZERO, &["Bangalore Road"]);
        let mut resolver = GeosearchResolver::new(state, DEBOUNCE, 6);

        resolver.search("bangalore");
        tokio::time::sleep(Duration::from_millis(100)).await;
        resolver.search("bangalore road");
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(service.calls(), vec!["search:bangalore road", "search_done:bangalore road"]);
        assert_eq!(resolver.results()[0].display_name, "Bangalore Road");
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_search_is_aborted_by_newer_query() {
        let (state, service) = fixture();
        service.add_search("bangalore", Duration::from_secs(2), &["Bangalore City"]);
        service.add_search(
            "bangalore road",
            Duration::from_millis(50),
            &["Bangalore Road", "Old Bangalore Road"],
        );
        let mut resolver = GeosearchResolver::new(state.clone(), DEBOUNCE, 6);

        resolver.search("bangalore");
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(service.calls(), vec!["search:bangalore"]);

        resolver.search("bangalore road");
        tokio::time::sleep(Duration::from_secs(5)).await;

        let calls = service.calls();
        assert!(!calls.contains(&"search_done:bangalore".to_string()));
        let names: Vec<String> = resolver
            .results()
            .iter()
            .map(|r| r.display_name.clone())
            .collect();
        assert_eq!(names, vec!["Bangalore Road", "Old Bangalore Road"]);
        assert_eq!(state.metrics.searches_superseded_total.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_keeps_previous_results() {
        let (state, service) = fixture();
        service.add_search("mg road", Duration::ZERO, &["MG Road"]);
        let mut resolver = GeosearchResolver::new(state, DEBOUNCE, 6);

        resolver.search("mg road");
        tokio::time::sleep(Duration::from_millis(300)).await;
        resolver.search("nowhere at all");
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(resolver.results().len(), 1);
        assert!(resolver.select(0).is_some());
        assert!(resolver.select(1).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn results_are_bounded() {
        let (state, service) = fixture();
        service.add_search("koramangala", Duration::ZERO, &["a", "b", "c", "d"]);
        let mut resolver = GeosearchResolver::new(state, DEBOUNCE, 2);

        resolver.search("koramangala");
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(resolver.results().len(), 2);
    }
}
