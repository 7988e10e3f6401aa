//! UI rendering module for skycast
//!
//! This module contains all the rendering logic for the terminal user interface,
//! using the ratatui library for TUI components.

pub mod help_overlay;
pub mod weather;
pub mod widgets;

use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, AppState, InputMode};

pub use help_overlay::render as render_help_overlay;

/// Renders the whole screen for the current application state
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_search_bar(frame, chunks[0], app);
    render_status(frame, chunks[1], &app.state);

    match app.view() {
        Some(view) => weather::render(frame, chunks[2], view, &Local),
        None => render_placeholder(frame, chunks[2], &app.state),
    }

    render_footer(frame, chunks[3]);

    if app.show_help {
        render_help_overlay(frame);
    }
}

fn render_search_bar(frame: &mut Frame, area: Rect, app: &App) {
    let editing = app.input_mode == InputMode::Search;
    let (text, style) = if editing {
        (
            format!("{}_", app.search_input),
            Style::default().fg(Color::Yellow),
        )
    } else if app.search_input.is_empty() {
        (
            "Press / to search for a city".to_string(),
            Style::default().fg(Color::DarkGray),
        )
    } else {
        (app.search_input.clone(), Style::default().fg(Color::Gray))
    };

    let border = if editing { Color::Yellow } else { Color::DarkGray };
    let block = Block::default()
        .title(" Search ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

    frame.render_widget(Paragraph::new(text).style(style).block(block), area);
}

fn render_status(frame: &mut Frame, area: Rect, state: &AppState) {
    let line = match state {
        AppState::Loading => Line::from(Span::styled(
            "Loading weather data...",
            Style::default().fg(Color::Cyan),
        )),
        AppState::Ready => Line::from(""),
        AppState::Error(message) => Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
    };
    frame.render_widget(Paragraph::new(line), area);
}

/// Shown before any lookup has succeeded
fn render_placeholder(frame: &mut Frame, area: Rect, state: &AppState) {
    let text = match state {
        AppState::Error(_) => "No weather data to show. Press / to search or l to locate.",
        _ => "Fetching weather...",
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(3),
            Constraint::Percentage(45),
        ])
        .split(area);

    frame.render_widget(
        Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        chunks[1],
    );
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let hints = Line::from(vec![
        Span::styled("/", Style::default().fg(Color::Yellow)),
        Span::raw(" search  "),
        Span::styled("l", Style::default().fg(Color::Yellow)),
        Span::raw(" locate  "),
        Span::styled("u", Style::default().fg(Color::Yellow)),
        Span::raw(" units  "),
        Span::styled("r", Style::default().fg(Color::Yellow)),
        Span::raw(" reload  "),
        Span::styled("?", Style::default().fg(Color::Yellow)),
        Span::raw(" help  "),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(" quit"),
    ]);
    frame.render_widget(Paragraph::new(hints), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DisabledGeolocator, LocationSpec, Units};
    use crate::dispatch::QueryDispatcher;
    use crate::forecast::ForecastLimits;
    use crate::session::test_support::FakeSource;
    use crate::session::{QueryTarget, Session, WeatherService};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    fn app() -> App {
        let service = WeatherService::new(
            Arc::new(FakeSource::working()),
            Arc::new(DisabledGeolocator),
            ForecastLimits::default(),
        );
        App::new(
            Session::new(Units::Metric),
            QueryDispatcher::new(Arc::new(service)),
        )
    }

    fn render_to_string(app: &App) -> String {
        let backend = TestBackend::new(100, 40);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[tokio::test]
    async fn test_loading_screen() {
        let app = app();
        let content = render_to_string(&app);

        assert!(content.contains("Loading weather data..."));
        assert!(content.contains("Press / to search"));
    }

    #[tokio::test]
    async fn test_error_screen_without_view() {
        let mut app = app();
        app.state = AppState::Error("Geolocation is not supported on this system".to_string());
        let content = render_to_string(&app);

        assert!(content.contains("Geolocation is not supported on this system"));
        assert!(content.contains("No weather data to show"));
    }

    #[tokio::test]
    async fn test_search_mode_shows_cursor() {
        let mut app = app();
        app.handle_key(KeyEvent::new(KeyCode::Char('/'), KeyModifiers::NONE));
        app.handle_key(KeyEvent::new(KeyCode::Char('R'), KeyModifiers::NONE));
        let content = render_to_string(&app);

        assert!(content.contains("R_"));
    }

    #[tokio::test]
    async fn test_ready_screen_shows_weather() {
        let mut app = app();
        app.start(QueryTarget::Location(LocationSpec::ByName("Madrid".to_string())));
        while app.view().is_none() {
            tokio::task::yield_now().await;
            app.poll_results();
        }
        let content = render_to_string(&app);

        assert_eq!(app.state, AppState::Ready);
        assert!(content.contains("Madrid, GB"));
        assert!(content.contains("Last updated"));
    }

    #[tokio::test]
    async fn test_help_overlay_drawn_on_top() {
        let mut app = app();
        app.show_help = true;
        let content = render_to_string(&app);
        assert!(content.contains("Keyboard Shortcuts"));
    }
}
