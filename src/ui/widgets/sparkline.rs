//! Temperature sparkline widget for the hourly row

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// Block characters for different temperatures (8 levels)
const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// A one-line sparkline of temperatures scaled between their own min and max
pub struct TemperatureSparkline<'a> {
    temps: &'a [f64],
    min: f64,
    max: f64,
    /// Cells per data point, so blocks line up with tabular columns
    column_width: u16,
    style: Style,
}

impl<'a> TemperatureSparkline<'a> {
    pub fn new(temps: &'a [f64]) -> Self {
        let min = temps.iter().copied().fold(f64::INFINITY, f64::min);
        let max = temps.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self {
            temps,
            min,
            max,
            column_width: 1,
            style: Style::default().fg(Color::Yellow),
        }
    }

    pub fn column_width(mut self, width: u16) -> Self {
        self.column_width = width.max(1);
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    fn temp_to_block(&self, temp: f64) -> char {
        let range = self.max - self.min;
        if !range.is_finite() || range <= f64::EPSILON {
            // Flat series
            return BLOCKS[3];
        }
        let normalized = ((temp - self.min) / range).clamp(0.0, 1.0);
        let index = ((normalized * 7.0).round() as usize).min(7);
        BLOCKS[index]
    }
}

impl<'a> Widget for TemperatureSparkline<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let columns = (area.width / self.column_width) as usize;

        for (i, temp) in self.temps.iter().take(columns).enumerate() {
            let block = self.temp_to_block(*temp);
            let x = area.x + i as u16 * self.column_width;

            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(block).set_style(self.style);
            }
        }
    }
}
