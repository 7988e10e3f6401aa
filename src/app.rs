//! Application state management for skycast
//!
//! This module contains the terminal application state: which screen is
//! showing, the search box, and the session that tracks lookups. Lookups run
//! in the background through the dispatcher and are applied in `poll_results`.

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent};

use crate::data::{LocationSpec, Units, ViewModel};
use crate::dispatch::{QueryDispatcher, QueryMessage};
use crate::session::{Presenter, QueryOutcome, QueryTarget, Session};

/// Application state enum representing what the main area shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    /// A lookup is in flight
    Loading,
    /// The session's view model is on screen
    Ready,
    /// The last lookup failed with this message
    Error(String),
}

impl Presenter for AppState {
    fn present(&mut self, _view: &ViewModel) {
        *self = AppState::Ready;
    }

    fn on_error(&mut self, message: &str) {
        *self = AppState::Error(message.to_string());
    }
}

/// Where key presses go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// Typing into the search box
    Search,
}

/// Main application struct managing state and lookups
pub struct App {
    /// Current application state/view
    pub state: AppState,
    pub input_mode: InputMode,
    /// Contents of the search box
    pub search_input: String,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Timestamp of the last displayed lookup
    pub last_refresh: Option<DateTime<Local>>,
    session: Session,
    dispatcher: QueryDispatcher,
}

impl App {
    pub fn new(session: Session, dispatcher: QueryDispatcher) -> Self {
        Self {
            state: AppState::Loading,
            input_mode: InputMode::Normal,
            search_input: String::new(),
            should_quit: false,
            show_help: false,
            last_refresh: None,
            session,
            dispatcher,
        }
    }

    /// The last successfully loaded view model
    pub fn view(&self) -> Option<&ViewModel> {
        self.session.view()
    }

    /// Units of the displayed view
    pub fn units(&self) -> Units {
        self.session.units()
    }

    /// Starts a lookup in the background
    pub fn start(&mut self, target: QueryTarget) {
        let ticket = self.session.begin(target);
        self.state = AppState::Loading;
        self.dispatcher.spawn(ticket);
    }

    /// Switches units, re-fetching the displayed location when there is one
    pub fn change_units(&mut self, units: Units) {
        if let Some(ticket) = self.session.change_units(units) {
            self.state = AppState::Loading;
            self.dispatcher.spawn(ticket);
        }
    }

    /// Re-fetches the displayed location
    pub fn reload(&mut self) {
        if let Some(ticket) = self.session.reload() {
            self.state = AppState::Loading;
            self.dispatcher.spawn(ticket);
        }
    }

    /// Applies every finished lookup without blocking
    pub fn poll_results(&mut self) {
        while let Some(message) = self.dispatcher.try_recv() {
            self.apply(message);
        }
    }

    fn apply(&mut self, message: QueryMessage) -> QueryOutcome {
        let outcome = self
            .session
            .complete(&message.ticket, message.result, &mut self.state);
        if outcome == QueryOutcome::Displayed {
            self.search_input.clear();
            self.last_refresh = Some(Local::now());
        }
        outcome
    }

    /// Waits for the next finished lookup and applies it
    #[cfg(test)]
    async fn next_result(&mut self) -> Option<QueryOutcome> {
        let message = self.dispatcher.recv().await?;
        Some(self.apply(message))
    }

    /// Handles a key press
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        // Help overlay intercepts all keys when shown
        if self.show_help {
            if matches!(
                key_event.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')
            ) {
                self.show_help = false;
            }
            return;
        }

        match self.input_mode {
            InputMode::Search => self.handle_search_key(key_event),
            InputMode::Normal => self.handle_normal_key(key_event),
        }
    }

    fn handle_search_key(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Enter => {
                let city = self.search_input.trim().to_string();
                if !city.is_empty() {
                    self.input_mode = InputMode::Normal;
                    self.start(QueryTarget::Location(LocationSpec::ByName(city)));
                }
            }
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Backspace => {
                self.search_input.pop();
            }
            KeyCode::Char(c) => {
                self.search_input.push(c);
            }
            _ => {}
        }
    }

    fn handle_normal_key(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('/') | KeyCode::Char('s') => {
                self.input_mode = InputMode::Search;
            }
            KeyCode::Char('l') => {
                self.start(QueryTarget::DevicePosition);
            }
            KeyCode::Char('c') => self.change_units(Units::Metric),
            KeyCode::Char('f') => self.change_units(Units::Imperial),
            KeyCode::Char('u') => self.change_units(self.session.requested_units().toggled()),
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            _ => {}
        }
    }
}
