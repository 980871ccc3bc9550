use crate::{
    error::WeatherError,
    model::PlaceCandidate,
    suggest::{SuggestionEngine, SuggestionEvent, contains_digit},
};

/// Keys the search box reacts to while suggestions are open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
}

/// Owns the typed query, validation state and the suggestion cursor, and
/// decides when a search term is committed.
///
/// Every operation that commits returns the term; the caller starts the
/// lookup.
#[derive(Debug)]
pub struct SearchController {
    query: String,
    validation_error: Option<WeatherError>,
    highlighted: Option<usize>,
    engine: SuggestionEngine,
}

impl SearchController {
    pub fn new(engine: SuggestionEngine) -> Self {
        Self {
            query: String::new(),
            validation_error: None,
            highlighted: None,
            engine,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn validation_error(&self) -> Option<&WeatherError> {
        self.validation_error.as_ref()
    }

    pub fn engine(&self) -> &SuggestionEngine {
        &self.engine
    }

    pub fn suggestions(&self) -> &[PlaceCandidate] {
        self.engine.suggestions()
    }

    pub fn suggestions_open(&self) -> bool {
        self.engine.is_open()
    }

    /// Always `None` or a valid index into the current suggestions.
    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted.filter(|&i| i < self.engine.suggestions().len())
    }

    /// The "loading suggestions" notice is worth showing.
    pub fn shows_loading_notice(&self) -> bool {
        self.engine.is_loading() && self.engine.meets_min_length(&self.query)
    }

    /// The "no suggestions" notice is worth showing.
    pub fn shows_no_results_notice(&self) -> bool {
        self.engine.no_results()
            && !self.engine.is_loading()
            && self.engine.meets_min_length(&self.query)
            && !contains_digit(&self.query)
    }

    pub fn on_text_change(&mut self, value: impl Into<String>) {
        self.query = value.into();
        self.validation_error = None;
        self.highlighted = None;
        self.engine.update_query(&self.query);
    }

    /// Re-run the suggestion pipeline for the current text.
    pub fn refresh_suggestions(&mut self) {
        self.highlighted = None;
        self.engine.update_query(&self.query);
    }

    /// Returns whether suppression changed.
    pub fn set_suppressed(&mut self, suppressed: bool) -> bool {
        let changed = self.engine.set_suppressed(suppressed);
        if changed && suppressed {
            self.highlighted = None;
        }
        changed
    }

    /// Form submission. Returns the committed term, if any.
    pub fn submit(&mut self) -> Option<String> {
        let trimmed = self.query.trim();
        if trimmed.is_empty() {
            return None;
        }

        if contains_digit(trimmed) {
            tracing::debug!("Rejecting city name with digits: '{}'", trimmed);
            self.validation_error = Some(WeatherError::Validation(trimmed.to_string()));
            return None;
        }

        let city = trimmed.to_string();
        self.validation_error = None;
        self.close_suggestions();
        Some(city)
    }

    /// Commit a picked suggestion, exactly as if its name had been submitted.
    pub fn select_suggestion(&mut self, candidate: &PlaceCandidate) -> String {
        self.engine.reset();
        self.highlighted = None;
        self.query = candidate.name.clone();
        self.validation_error = None;
        candidate.name.clone()
    }

    /// Pick a row of the open dropdown. A hidden list cannot be picked from.
    pub fn select_index(&mut self, index: usize) -> Option<String> {
        if !self.engine.is_open() {
            return None;
        }
        let candidate = self.engine.suggestions().get(index)?.clone();
        Some(self.select_suggestion(&candidate))
    }

    /// Keyboard handling. With the dropdown closed only Enter does anything,
    /// and it submits.
    pub fn on_key(&mut self, key: Key) -> Option<String> {
        let len = self.engine.suggestions().len();
        if !self.engine.is_open() || len == 0 {
            return match key {
                Key::Enter => self.submit(),
                _ => None,
            };
        }

        match key {
            Key::ArrowDown => {
                self.highlighted = Some(match self.highlighted() {
                    Some(i) if i + 1 < len => i + 1,
                    _ => 0,
                });
                None
            }
            Key::ArrowUp => {
                self.highlighted = Some(match self.highlighted() {
                    Some(i) if i > 0 => i - 1,
                    _ => len - 1,
                });
                None
            }
            Key::Enter => match self.highlighted() {
                Some(i) => self.select_index(i),
                None => self.submit(),
            },
            Key::Escape => {
                self.engine.hide();
                self.highlighted = None;
                None
            }
        }
    }

    /// Mouse over a suggestion row moves the same cursor the arrow keys do.
    pub fn hover(&mut self, index: usize) {
        if self.engine.is_open() && index < self.engine.suggestions().len() {
            self.highlighted = Some(index);
        }
    }

    /// Click outside the search region: hide the dropdown, keep everything else.
    pub fn close_suggestions(&mut self) {
        self.engine.hide();
    }

    pub fn handle_suggestion_event(&mut self, event: SuggestionEvent) {
        if self.engine.handle(event) {
            self.highlighted = None;
        }
    }
}
