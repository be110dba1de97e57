use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self { font_size: 11.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub line_count: usize,
}

pub trait TextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics;
}

/// Font-free estimate: display columns × font size × a per-column factor.
#[derive(Debug, Clone, Default)]
pub struct DeterministicTextMeasurer {
    pub char_width_factor: f64,
    pub line_height_factor: f64,
}

impl DeterministicTextMeasurer {
    pub fn with_char_width_factor(char_width_factor: f64) -> Self {
        Self {
            char_width_factor,
            line_height_factor: 0.0,
        }
    }
}

impl TextMeasurer for DeterministicTextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics {
        let char_width_factor = if self.char_width_factor == 0.0 {
            0.6
        } else {
            self.char_width_factor
        };
        let line_height_factor = if self.line_height_factor == 0.0 {
            1.2
        } else {
            self.line_height_factor
        };

        let font_size = style.font_size.max(1.0);
        let mut max_columns = 0usize;
        let mut line_count = 0usize;
        for line in text.split('\n') {
            line_count += 1;
            max_columns = max_columns.max(UnicodeWidthStr::width(line));
        }

        TextMetrics {
            width: max_columns as f64 * font_size * char_width_factor,
            height: line_count as f64 * font_size * line_height_factor,
            line_count,
        }
    }
}
