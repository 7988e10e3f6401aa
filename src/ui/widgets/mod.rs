//! Custom ratatui widgets

pub mod sparkline;

pub use sparkline::TemperatureSparkline;
