//! skycast library
//!
//! Weather lookup client for the OpenWeatherMap API: fetches current
//! conditions and a forecast, aggregates the forecast into hourly and daily
//! views, and presents the result in a terminal UI or as JSON.

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod dispatch;
pub mod forecast;
pub mod logging;
pub mod session;
pub mod ui;
