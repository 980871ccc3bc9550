//! Live city suggestions: debounced searches, staleness control, and the
//! filter / de-duplicate / rank pipeline applied to every response.

use std::{collections::HashSet, sync::Arc};
use tokio::{sync::mpsc, task::JoinHandle, time::Instant};

use crate::{
    config::AutocompleteSettings, error::WeatherError, model::PlaceCandidate,
    provider::WeatherProvider,
};

/// Completions the engine schedules for itself. They are fed back through
/// [`SuggestionEngine::handle`] on the owning thread.
#[derive(Debug)]
pub enum SuggestionEvent {
    DebounceElapsed {
        generation: u64,
    },
    Fetched {
        generation: u64,
        query: String,
        result: Result<Vec<PlaceCandidate>, WeatherError>,
    },
}

/// Digits never appear in city names.
pub fn contains_digit(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
}

/// Turn a raw search response into the list shown to the user.
///
/// In order: prefix match on the name (case-insensitive), population at or
/// above the threshold (unknown population is dropped), first occurrence per
/// `(name, country)`, population descending, truncation.
pub fn refine_candidates(
    query: &str,
    raw: Vec<PlaceCandidate>,
    settings: &AutocompleteSettings,
) -> Vec<PlaceCandidate> {
    let needle = query.trim().to_lowercase();
    let mut seen = HashSet::new();

    let mut kept: Vec<PlaceCandidate> = raw
        .into_iter()
        .filter(|place| place.name.to_lowercase().starts_with(&needle))
        .filter(|place| {
            place
                .population
                .is_some_and(|population| population >= settings.min_population)
        })
        .filter(|place| seen.insert(place.display_key()))
        .collect();

    // stable: equal populations keep upstream order
    kept.sort_by(|a, b| b.population.cmp(&a.population));
    kept.truncate(settings.max_suggestions);
    kept
}

/// Owns the suggestion list and everything that may replace it.
///
/// Every edit bumps `generation`; a timer or fetch tagged with an older
/// generation is stale and its completion is dropped without touching state.
#[derive(Debug)]
pub struct SuggestionEngine {
    provider: Arc<dyn WeatherProvider>,
    settings: AutocompleteSettings,
    events: mpsc::UnboundedSender<SuggestionEvent>,

    suggestions: Vec<PlaceCandidate>,
    visible: bool,
    loading: bool,
    no_results: bool,
    suppressed: bool,

    generation: u64,
    query: String,
    timer: Option<JoinHandle<()>>,
    in_flight: bool,
}

impl SuggestionEngine {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        settings: AutocompleteSettings,
    ) -> (Self, mpsc::UnboundedReceiver<SuggestionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();

        let engine = Self {
            provider,
            settings,
            events,
            suggestions: Vec::new(),
            visible: false,
            loading: false,
            no_results: false,
            suppressed: false,
            generation: 0,
            query: String::new(),
            timer: None,
            in_flight: false,
        };

        (engine, rx)
    }

    pub fn suggestions(&self) -> &[PlaceCandidate] {
        &self.suggestions
    }

    /// The dropdown is open: shown and non-empty.
    pub fn is_open(&self) -> bool {
        self.visible && !self.suggestions.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn no_results(&self) -> bool {
        self.no_results
    }

    /// A debounce timer is armed or a search for the current query is outstanding.
    pub fn is_pending(&self) -> bool {
        self.timer.is_some() || self.in_flight
    }

    /// Whether `raw` is long enough, once trimmed, to be worth searching for.
    pub fn meets_min_length(&self, raw: &str) -> bool {
        raw.trim().chars().count() >= self.settings.min_query_length
    }

    /// Called on every edit of the query text.
    pub fn update_query(&mut self, raw: &str) {
        self.invalidate();
        self.suggestions.clear();
        self.visible = false;

        if self.suppressed {
            return;
        }

        let query = raw.trim();
        if !self.meets_min_length(query) || contains_digit(query) {
            self.no_results = false;
            return;
        }

        self.query = query.to_string();
        self.schedule(self.generation);
    }

    /// Suppress or re-allow suggestions. Suppressing clears the list and
    /// cancels anything pending. Returns whether the flag changed.
    pub fn set_suppressed(&mut self, suppressed: bool) -> bool {
        if self.suppressed == suppressed {
            return false;
        }

        self.suppressed = suppressed;
        if suppressed {
            self.invalidate();
            self.suggestions.clear();
            self.visible = false;
        }
        true
    }

    /// Drop the list and anything pending, e.g. once a suggestion is picked.
    pub fn reset(&mut self) {
        self.invalidate();
        self.suggestions.clear();
        self.visible = false;
    }

    /// Hide the dropdown without discarding the list.
    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Apply a completion. Returns `true` when the list was replaced.
    pub fn handle(&mut self, event: SuggestionEvent) -> bool {
        match event {
            SuggestionEvent::DebounceElapsed { generation } => {
                if generation != self.generation {
                    tracing::debug!("Dropping stale debounce timer (generation {})", generation);
                    return false;
                }
                self.timer = None;
                self.start_fetch(generation);
                false
            }
            SuggestionEvent::Fetched {
                generation,
                query,
                result,
            } => {
                if generation != self.generation || query != self.query || self.suppressed {
                    tracing::debug!("Dropping stale suggestions for '{}'", query);
                    return false;
                }
                self.in_flight = false;
                self.loading = false;
                self.apply_result(&query, result);
                true
            }
        }
    }

    fn apply_result(&mut self, query: &str, result: Result<Vec<PlaceCandidate>, WeatherError>) {
        match result {
            Ok(raw) => {
                let raw_count = raw.len();
                self.suggestions = refine_candidates(query, raw, &self.settings);
                self.visible = !self.suggestions.is_empty();
                self.no_results = self.suggestions.is_empty();
                tracing::debug!(
                    "Suggestions for '{}': {} of {} raw matches kept",
                    query,
                    self.suggestions.len(),
                    raw_count
                );
            }
            Err(e) => {
                // suggestions degrade silently; nothing reaches the user
                tracing::debug!("Suggestion search for '{}' failed: {}", query, e);
                self.suggestions.clear();
                self.visible = false;
                self.no_results = false;
            }
        }
    }

    /// Cancel the timer and orphan any in-flight search.
    fn invalidate(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.generation += 1;
        self.in_flight = false;
        self.loading = false;
    }

    fn schedule(&mut self, generation: u64) {
        let events = self.events.clone();
        let delay = self.settings.debounce();
        let deadline = Instant::now() + delay;

        tracing::debug!("Debouncing suggestions for '{}' ({:?})", self.query, delay);
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let _ = events.send(SuggestionEvent::DebounceElapsed { generation });
        }));
    }

    fn start_fetch(&mut self, generation: u64) {
        self.loading = true;
        self.in_flight = true;

        let events = self.events.clone();
        let provider = Arc::clone(&self.provider);
        let query = self.query.clone();
        let count = self.settings.fetch_count;

        tokio::spawn(async move {
            let result = provider.search_places(&query, count).await;
            let _ = events.send(SuggestionEvent::Fetched {
                generation,
                query,
                result,
            });
        });
    }
}

impl Drop for SuggestionEngine {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
