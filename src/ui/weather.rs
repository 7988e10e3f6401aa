//! Weather screen UI
//!
//! Renders a `ViewModel`: location header, current conditions, the hourly
//! row with its sparkline, and the daily summaries. Values arrive unrounded
//! in the units they were fetched in; rounding happens here.

use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::data::{DailySummary, HourlyEntry, Units, ViewModel};
use crate::ui::widgets::TemperatureSparkline;

/// Width of one hourly column in cells
const HOURLY_COLUMN: u16 = 8;

mod colors {
    use ratatui::style::Color;

    /// Section headers
    pub const HEADER: Color = Color::Cyan;
    /// Primary text
    pub const PRIMARY: Color = Color::White;
    /// Secondary/dimmed text
    pub const SECONDARY: Color = Color::Gray;
    pub const UNKNOWN: Color = Color::DarkGray;
}

/// Rounds half-way values up, so 2.5 becomes 3 and -2.5 becomes -2
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Formats a temperature as a rounded whole number with its unit symbol
pub fn format_temp(value: f64, units: Units) -> String {
    format!("{}{}", round_half_up(value), units.temperature_symbol())
}

/// Maps an OpenWeatherMap icon token (e.g. `04d`) to a glyph
pub fn icon_glyph(icon: &str) -> &'static str {
    let night = icon.ends_with('n');
    match icon.get(..2) {
        Some("01") if night => "\u{1F319}",
        Some("01") => "\u{2600}",
        Some("02") => "\u{26C5}",
        Some("03") | Some("04") => "\u{2601}",
        Some("09") => "\u{1F327}",
        Some("10") => "\u{1F326}",
        Some("11") => "\u{26C8}",
        Some("13") => "\u{2744}",
        Some("50") => "\u{1F32B}",
        _ => "?",
    }
}

/// Color for a temperature, judged in Celsius whatever the display units
fn temperature_color(value: f64, units: Units) -> Color {
    let celsius = match units {
        Units::Metric => value,
        Units::Imperial => (value - 32.0) * 5.0 / 9.0,
    };
    if celsius >= 30.0 {
        Color::Red
    } else if celsius >= 25.0 {
        Color::LightRed
    } else if celsius >= 20.0 {
        Color::Yellow
    } else if celsius >= 15.0 {
        Color::Green
    } else if celsius >= 10.0 {
        Color::Cyan
    } else {
        Color::Blue
    }
}

fn clock_time<Tz: TimeZone>(instant: Option<DateTime<Utc>>, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    match instant {
        Some(instant) => instant.with_timezone(tz).format("%H:%M").to_string(),
        None => "n/a".to_string(),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn header_style() -> Style {
    Style::default()
        .fg(colors::HEADER)
        .add_modifier(Modifier::BOLD)
}

fn labelled(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<16}", label), Style::default().fg(colors::SECONDARY)),
        Span::styled(value, Style::default().fg(colors::PRIMARY)),
    ])
}

/// Renders the full weather screen into `area`
pub fn render<Tz: TimeZone>(frame: &mut Frame, area: Rect, view: &ViewModel, tz: &Tz)
where
    Tz::Offset: Display,
{
    let daily_height = view.forecast.daily.len() as u16 + 1;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(7),
            Constraint::Length(5),
            Constraint::Length(daily_height + 2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    frame.render_widget(Paragraph::new(build_header_lines(view)), chunks[0]);

    let current = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    frame.render_widget(
        Paragraph::new(build_current_lines(view))
            .block(Block::default().title(" Now ").borders(Borders::ALL)),
        current[0],
    );
    frame.render_widget(
        Paragraph::new(build_detail_lines(view, tz))
            .block(Block::default().title(" Details ").borders(Borders::ALL)),
        current[1],
    );

    render_hourly(frame, chunks[2], view);

    frame.render_widget(
        Paragraph::new(build_daily_lines(view))
            .block(Block::default().title(" Next days ").borders(Borders::ALL)),
        chunks[3],
    );

    frame.render_widget(Paragraph::new(build_updated_line(view, tz)), chunks[5]);
}

fn build_header_lines(view: &ViewModel) -> Vec<Line<'static>> {
    let location = &view.location;
    let title = if location.country.is_empty() {
        location.name.clone()
    } else {
        format!("{}, {}", location.name, location.country)
    };

    vec![
        Line::from(vec![
            Span::styled(title, header_style()),
            Span::styled(
                format!("  ({:.2}, {:.2})", location.lat, location.lon),
                Style::default().fg(colors::UNKNOWN),
            ),
        ]),
        Line::from(Span::styled(
            format!("Units: {}", view.units.as_query()),
            Style::default().fg(colors::SECONDARY),
        )),
    ]
}

fn build_current_lines(view: &ViewModel) -> Vec<Line<'static>> {
    let current = &view.current;
    let units = view.units;

    let visibility = match current.visibility_km {
        Some(km) => format!("{:.1} km", km),
        None => "n/a".to_string(),
    };

    vec![
        Line::from(vec![
            Span::raw(format!("{}  ", icon_glyph(&current.icon))),
            Span::styled(
                format_temp(current.temp, units),
                Style::default()
                    .fg(temperature_color(current.temp, units))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" (feels like {})", format_temp(current.feels_like, units)),
                Style::default().fg(colors::SECONDARY),
            ),
        ]),
        Line::from(capitalize(&current.description)),
        labelled(
            "Wind",
            format!("{:.1} {}", current.wind_speed, units.speed_unit()),
        ),
        labelled("Humidity", format!("{}%", current.humidity)),
        labelled("Visibility", visibility),
    ]
}

fn build_detail_lines<Tz: TimeZone>(view: &ViewModel, tz: &Tz) -> Vec<Line<'static>>
where
    Tz::Offset: Display,
{
    let current = &view.current;
    vec![
        labelled("Pressure", format!("{} hPa", round_half_up(current.pressure))),
        labelled("Sunrise", clock_time(current.sunrise, tz)),
        labelled("Sunset", clock_time(current.sunset, tz)),
        labelled(
            "Wind direction",
            format!("{} ({}°)", current.wind_direction, round_half_up(current.wind_deg)),
        ),
    ]
}

fn render_hourly(frame: &mut Frame, area: Rect, view: &ViewModel) {
    let block = Block::default().title(" Hourly ").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let hourly = &view.forecast.hourly;
    if hourly.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "No hourly forecast available",
                Style::default().fg(colors::UNKNOWN),
            )),
            inner,
        );
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    frame.render_widget(Paragraph::new(build_hourly_lines(hourly, view.units)), rows[0]);

    let temps: Vec<f64> = hourly.iter().map(|entry| entry.temp).collect();
    frame.render_widget(
        TemperatureSparkline::new(&temps).column_width(HOURLY_COLUMN),
        rows[1],
    );
}

fn build_hourly_lines(hourly: &[HourlyEntry], units: Units) -> Vec<Line<'static>> {
    let width = HOURLY_COLUMN as usize;

    let labels = hourly
        .iter()
        .map(|entry| {
            Span::styled(
                format!("{:<width$}", entry.label),
                Style::default().fg(colors::SECONDARY),
            )
        })
        .collect::<Vec<_>>();

    let temps = hourly
        .iter()
        .map(|entry| {
            Span::styled(
                format!("{:<width$}", format_temp(entry.temp, units)),
                Style::default().fg(temperature_color(entry.temp, units)),
            )
        })
        .collect::<Vec<_>>();

    vec![Line::from(labels), Line::from(temps)]
}

fn build_daily_lines(view: &ViewModel) -> Vec<Line<'static>> {
    if view.forecast.daily.is_empty() {
        return vec![Line::from(Span::styled(
            "No daily forecast available",
            Style::default().fg(colors::UNKNOWN),
        ))];
    }

    view.forecast
        .daily
        .iter()
        .map(|day| build_daily_line(day, view.units))
        .collect()
}

fn build_daily_line(day: &DailySummary, units: Units) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<5}", day.weekday), header_style()),
        Span::styled(
            format!("{:<8}", day.month_day),
            Style::default().fg(colors::SECONDARY),
        ),
        Span::raw(format!("{}  ", icon_glyph(&day.icon))),
        Span::styled(
            format_temp(day.max_temp, units),
            Style::default().fg(temperature_color(day.max_temp, units)),
        ),
        Span::raw(" / "),
        Span::styled(
            format_temp(day.min_temp, units),
            Style::default().fg(temperature_color(day.min_temp, units)),
        ),
        Span::styled(
            format!("  {}", day.condition),
            Style::default().fg(colors::SECONDARY),
        ),
    ])
}

fn build_updated_line<Tz: TimeZone>(view: &ViewModel, tz: &Tz) -> Line<'static>
where
    Tz::Offset: Display,
{
    Line::from(Span::styled(
        format!(
            "Last updated: {}",
            view.fetched_at.with_timezone(tz).format("%H:%M:%S")
        ),
        Style::default().fg(colors::UNKNOWN),
    ))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::data::test_support::{london_current, three_hourly};
    use crate::data::{CurrentConditionsView, Location};
    use crate::forecast::{self, ForecastLimits};

    /// A London view model aggregated in UTC
    pub fn london_view(units: Units) -> ViewModel {
        let raw = london_current();
        let samples = three_hourly(1_721_001_600, 40);
        ViewModel {
            location: Location::from_raw(&raw),
            current: CurrentConditionsView::from_raw(&raw),
            forecast: forecast::aggregate(&samples, ForecastLimits::default(), &Utc)
                .expect("fixture aggregates"),
            units,
            fetched_at: DateTime::from_timestamp(1_721_044_800, 0).expect("valid timestamp"),
        }
    }
}
