//! Interactive search: an `inquire` prompt whose autocompletion is fed by
//! the session's suggestion engine.

use anyhow::{Context, Result};
use inquire::{
    CustomUserError, InquireError, Text,
    autocompletion::{Autocomplete, Replacement},
};
use parking_lot::Mutex;
use std::{sync::Arc, time::Duration};
use tokio::{
    runtime::Handle,
    sync::{mpsc, watch},
};
use weather_core::{
    Config, Intent, PlaceCandidate, Screen, Session, SessionView, provider_from_config, text,
};

use crate::render;

pub async fn run(config: Config) -> Result<()> {
    let provider = provider_from_config(&config)?;
    let session = Session::new(provider, config.autocomplete.clone());
    let views = session.subscribe();

    let (intents, rx) = mpsc::unbounded_channel();
    let session_task = tokio::spawn(session.run(rx));

    // how long one keystroke may wait for its suggestions
    let settle = config.autocomplete.debounce() + config.request_timeout();
    let runtime = Handle::current();

    let outcome = tokio::task::spawn_blocking(move || prompt_loop(runtime, intents, views, settle))
        .await
        .context("Interactive prompt stopped unexpectedly")?;

    // the prompt loop owned the last intent sender, so the session winds down
    session_task.await.context("Search session stopped unexpectedly")?;
    outcome
}

fn prompt_loop(
    runtime: Handle,
    intents: mpsc::UnboundedSender<Intent>,
    mut views: watch::Receiver<SessionView>,
    settle: Duration,
) -> Result<()> {
    println!("{}\n{}\n", text::APP_TITLE, text::APP_SUBTITLE);
    println!("{}", text::SEARCH_INSTRUCTION);

    let suggester = SessionSuggester {
        runtime: runtime.clone(),
        intents: intents.clone(),
        views: views.clone(),
        shown: Arc::new(Mutex::new(Vec::new())),
        settle,
    };

    loop {
        let answer = Text::new("City:")
            .with_placeholder(text::SEARCH_PLACEHOLDER)
            .with_help_message("↑↓ to move, tab to complete, enter to search, esc to quit")
            .with_autocomplete(suggester.clone())
            .prompt_skippable();

        let answer = match answer {
            Ok(Some(answer)) => answer,
            Ok(None) | Err(InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e).context("Failed to read city"),
        };

        let city = suggester.name_for(&answer).unwrap_or(answer);
        if city.trim().is_empty() || is_notice(&city) {
            continue;
        }

        views.borrow_and_update();
        intents.send(Intent::TextChanged(city))?;
        intents.send(Intent::Submit)?;

        let view = runtime.block_on(outcome(&mut views))?;
        if let Some(err) = &view.validation_error {
            println!("{}\n", err.user_message());
            continue;
        }
        match &view.screen {
            Screen::Result { place, weather } => {
                println!("\n{}\n", render::weather_card(place, weather));
            }
            Screen::Error(err) => println!("{}\n", err.user_message()),
            Screen::Empty | Screen::Loading => {}
        }
    }

    Ok(())
}

/// Wait for the first view after a submit that settles it: a validation
/// error, a result, or a lookup error.
async fn outcome(views: &mut watch::Receiver<SessionView>) -> Result<SessionView> {
    loop {
        views.changed().await.context("Search session closed")?;
        let view = views.borrow_and_update();
        let settled = view.validation_error.is_some()
            || matches!(view.screen, Screen::Result { .. } | Screen::Error(_));
        if settled {
            return Ok(view.clone());
        }
    }
}

/// Rows for the dropdown: the suggestion labels when the list is open,
/// otherwise the loading or no-results notice on its own. Also returns the
/// places the rows stand for; a notice stands for none.
fn dropdown(view: &SessionView) -> (Vec<PlaceCandidate>, Vec<String>) {
    if view.suggestions_open {
        let labels = view.suggestions.iter().map(PlaceCandidate::label).collect();
        return (view.suggestions.clone(), labels);
    }
    let rows = render::suggestion_notice(view)
        .map(|notice| vec![notice.to_string()])
        .unwrap_or_default();
    (Vec::new(), rows)
}

fn is_notice(answer: &str) -> bool {
    answer == text::LOADING_SUGGESTIONS || answer == text::NO_SUGGESTIONS_FOUND
}

/// Bridges `inquire`'s synchronous autocompletion onto the session.
#[derive(Clone)]
struct SessionSuggester {
    runtime: Handle,
    intents: mpsc::UnboundedSender<Intent>,
    views: watch::Receiver<SessionView>,
    shown: Arc<Mutex<Vec<PlaceCandidate>>>,
    settle: Duration,
}

impl SessionSuggester {
    /// Map a suggestion label back to the city name it stands for.
    fn name_for(&self, label: &str) -> Option<String> {
        self.shown
            .lock()
            .iter()
            .find(|place| place.label() == label)
            .map(|place| place.name.clone())
    }

    fn settled_view(&mut self, input: &str) -> SessionView {
        let settle = self.settle;
        let views = &mut self.views;

        self.runtime.block_on(async {
            let settled = tokio::time::timeout(
                settle,
                views.wait_for(|v| v.query == input && !v.suggestions_pending),
            )
            .await
            .ok()
            .and_then(Result::ok)
            .map(|view| view.clone());

            // timed out: show whatever is there rather than stall the prompt
            settled.unwrap_or_else(|| views.borrow().clone())
        })
    }
}

impl Autocomplete for SessionSuggester {
    fn get_suggestions(&mut self, input: &str) -> Result<Vec<String>, CustomUserError> {
        self.intents.send(Intent::TextChanged(input.to_string()))?;

        let (shown, rows) = dropdown(&self.settled_view(input));
        *self.shown.lock() = shown;
        Ok(rows)
    }

    fn get_completion(
        &mut self,
        _input: &str,
        highlighted_suggestion: Option<String>,
    ) -> Result<Replacement, CustomUserError> {
        Ok(highlighted_suggestion.and_then(|label| self.name_for(&label)))
    }
}
