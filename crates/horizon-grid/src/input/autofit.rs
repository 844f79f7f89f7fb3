//! Column auto-fit measurement.

use crate::config::AutoFitConfig;
use crate::model::{MIN_COLUMN_WIDTH, clamp_column_width};

/// Measures rendered text width.
pub trait TextMeasurer: Send + Sync {
    /// Width of `text` drawn with a CSS-style `font` (e.g. `"600 13px sans-serif"`).
    fn measure(&self, text: &str, font: &str) -> f32;
}

/// Fixed-advance approximation: every character is a fraction of the font
/// size wide.
#[derive(Debug, Clone, Copy)]
pub struct ApproxTextMeasurer {
    /// Advance per character as a fraction of the pixel size.
    pub advance_ratio: f32,
    /// Pixel size used when the font has none.
    pub fallback_size: f32,
}

impl Default for ApproxTextMeasurer {
    fn default() -> Self {
        Self {
            advance_ratio: 0.6,
            fallback_size: 13.0,
        }
    }
}

impl ApproxTextMeasurer {
    fn font_size(&self, font: &str) -> f32 {
        font.split_whitespace()
            .find_map(|part| part.strip_suffix("px")?.parse::<f32>().ok())
            .unwrap_or(self.fallback_size)
    }
}

impl TextMeasurer for ApproxTextMeasurer {
    fn measure(&self, text: &str, font: &str) -> f32 {
        text.chars().count() as f32 * self.font_size(font) * self.advance_ratio
    }
}

/// Width that fits a header label and a sample of formatted cells.
///
/// At most `config.sample_rows` cells are measured. The result is within
/// `[MIN_COLUMN_WIDTH, config.max_width]`.
pub fn auto_fit_width(
    measurer: &dyn TextMeasurer,
    config: &AutoFitConfig,
    header: (&str, &str),
    cells: impl IntoIterator<Item = String>,
    cell_font: &str,
) -> f32 {
    let (title, header_font) = header;
    let header_width = measurer.measure(title, header_font) + config.header_padding;
    let widest_cell = cells
        .into_iter()
        .take(config.sample_rows)
        .map(|text| measurer.measure(&text, cell_font))
        .fold(0.0_f32, f32::max);
    let width = header_width.max(widest_cell + config.cell_padding);
    clamp_column_width(width.clamp(MIN_COLUMN_WIDTH, config.max_width.max(MIN_COLUMN_WIDTH)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_size_parsing() {
        let measurer = ApproxTextMeasurer::default();
        assert_eq!(measurer.measure("abcd", "10px sans-serif"), 24.0);
        assert_eq!(measurer.measure("abcd", "600 20px Inter"), 48.0);
        assert!((measurer.measure("ab", "bold serif") - 15.6).abs() < 1e-4);
    }

    #[test]
    fn test_header_or_cells_win() {
        let measurer = ApproxTextMeasurer::default();
        let config = AutoFitConfig::default();
        // Header: 10 chars * 6 + 40 = 100.
        let width = auto_fit_width(
            &measurer,
            &config,
            ("Region ABC", "10px sans"),
            vec!["x".to_string()],
            "10px sans",
        );
        assert_eq!(width, 100.0);

        // Widest cell: 30 chars * 6 + 16 = 196.
        let width = auto_fit_width(
            &measurer,
            &config,
            ("Id", "10px sans"),
            vec!["a".repeat(30), "b".repeat(3)],
            "10px sans",
        );
        assert_eq!(width, 196.0);
    }

    #[test]
    fn test_clamped_and_sampled() {
        let measurer = ApproxTextMeasurer::default();
        let config = AutoFitConfig {
            sample_rows: 1,
            ..AutoFitConfig::default()
        };
        let width = auto_fit_width(
            &measurer,
            &config,
            ("", "10px sans"),
            vec!["a".to_string(), "z".repeat(500)],
            "10px sans",
        );
        assert_eq!(width, MIN_COLUMN_WIDTH);

        let width = auto_fit_width(
            &measurer,
            &AutoFitConfig::default(),
            ("", "10px sans"),
            vec!["z".repeat(500)],
            "10px sans",
        );
        assert_eq!(width, 600.0);
    }
}
