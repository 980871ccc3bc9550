//! One search context: the controller, the suggestion engine and the fetch
//! orchestrator, all mutated from a single task.
//!
//! Network calls and timers run as spawned tasks that only report back over
//! channels; every state change happens in [`Session::apply`] or while
//! handling one of those reports, and each is followed by a fresh
//! [`SessionView`] on the watch channel.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use crate::{
    config::AutocompleteSettings,
    controller::{Key, SearchController},
    error::WeatherError,
    model::PlaceCandidate,
    orchestrator::{FetchEvent, FetchOrchestrator, Screen},
    provider::WeatherProvider,
    suggest::{SuggestionEngine, SuggestionEvent},
};

/// Everything the presentation layer can ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    TextChanged(String),
    Submit,
    Key(Key),
    SelectSuggestion(usize),
    HoverSuggestion(usize),
    ClickOutside,
}

/// Snapshot of everything the presentation layer renders.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub query: String,
    pub validation_error: Option<WeatherError>,
    pub suggestions: Vec<PlaceCandidate>,
    pub suggestions_open: bool,
    pub highlighted: Option<usize>,
    pub suggestions_loading: bool,
    pub show_no_results: bool,
    /// A suggestion timer or search is still outstanding.
    pub suggestions_pending: bool,
    pub committed_city: Option<String>,
    pub screen: Screen,
}

impl Default for SessionView {
    fn default() -> Self {
        Self {
            query: String::new(),
            validation_error: None,
            suggestions: Vec::new(),
            suggestions_open: false,
            highlighted: None,
            suggestions_loading: false,
            show_no_results: false,
            suggestions_pending: false,
            committed_city: None,
            screen: Screen::Empty,
        }
    }
}

#[derive(Debug)]
pub struct Session {
    controller: SearchController,
    orchestrator: FetchOrchestrator,
    suggestion_events: mpsc::UnboundedReceiver<SuggestionEvent>,
    fetch_events: mpsc::UnboundedReceiver<FetchEvent>,
    view: watch::Sender<SessionView>,
}

impl Session {
    pub fn new(provider: Arc<dyn WeatherProvider>, settings: AutocompleteSettings) -> Self {
        let (engine, suggestion_events) = SuggestionEngine::new(Arc::clone(&provider), settings);
        let (orchestrator, fetch_events) = FetchOrchestrator::new(provider);
        let (view, _) = watch::channel(SessionView::default());

        Self {
            controller: SearchController::new(engine),
            orchestrator,
            suggestion_events,
            fetch_events,
            view,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.subscribe()
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            query: self.controller.query().to_string(),
            validation_error: self.controller.validation_error().cloned(),
            suggestions: self.controller.suggestions().to_vec(),
            suggestions_open: self.controller.suggestions_open(),
            highlighted: self.controller.highlighted(),
            suggestions_loading: self.controller.shows_loading_notice(),
            show_no_results: self.controller.shows_no_results_notice(),
            suggestions_pending: self.controller.engine().is_pending(),
            committed_city: self.orchestrator.committed_city().map(str::to_string),
            screen: self.orchestrator.screen(),
        }
    }

    pub fn apply(&mut self, intent: Intent) {
        match intent {
            Intent::TextChanged(value) => {
                // editing clears a finished result before suggestions are re-evaluated
                self.orchestrator.invalidate();
                self.sync_suppression(false);
                self.controller.on_text_change(value);
            }
            Intent::Submit => {
                if let Some(city) = self.controller.submit() {
                    self.commit(city);
                }
            }
            Intent::Key(key) => {
                if let Some(city) = self.controller.on_key(key) {
                    self.commit(city);
                }
            }
            Intent::SelectSuggestion(index) => {
                if let Some(city) = self.controller.select_index(index) {
                    self.commit(city);
                }
            }
            Intent::HoverSuggestion(index) => self.controller.hover(index),
            Intent::ClickOutside => self.controller.close_suggestions(),
        }
        self.publish();
    }

    /// Wait for one timer or network completion and apply it.
    pub async fn next_event(&mut self) {
        tokio::select! {
            Some(event) = self.suggestion_events.recv() => {
                self.controller.handle_suggestion_event(event);
            }
            Some(event) = self.fetch_events.recv() => {
                if self.orchestrator.handle(event) {
                    self.sync_suppression(true);
                }
            }
            else => return,
        }
        self.publish();
    }

    /// Serve intents until the sending side goes away.
    pub async fn run(mut self, mut intents: mpsc::UnboundedReceiver<Intent>) {
        self.publish();
        loop {
            tokio::select! {
                intent = intents.recv() => match intent {
                    Some(intent) => self.apply(intent),
                    None => break,
                },
                () = self.next_event() => {}
            }
        }
        tracing::debug!("Session closed");
    }

    fn commit(&mut self, city: String) {
        self.orchestrator.commit(city);
        self.sync_suppression(true);
    }

    /// Mirror the lookup status into the suggestion engine. When suggestions
    /// become allowed again and `reevaluate` is set, the current text is run
    /// through the pipeline as if it had just been typed.
    fn sync_suppression(&mut self, reevaluate: bool) {
        let suppressed = self.orchestrator.suppresses_suggestions();
        if self.controller.set_suppressed(suppressed) && !suppressed && reevaluate {
            self.controller.refresh_suggestions();
        }
    }

    fn publish(&self) {
        self.view.send_replace(self.view());
    }
}
