//! Text measurement, headline sizing and word wrapping.

/// Upper bound on wrapped lines for any block.
pub const MAX_LINES: usize = 5;
/// Lower bound on the height-derived line cap.
pub const MIN_LINE_CAP: usize = 3;
pub const LINE_SPACING: f32 = 1.3;
pub const SHRINK_FACTOR: f32 = 0.8;
pub const MIN_FONT_SIZE: u32 = 24;

/// Character-count thresholds and the size used up to (and including) each.
const HEADLINE_STEPS: [(usize, u32); 4] = [(20, 72), (50, 56), (100, 44), (200, 36)];
const HEADLINE_FLOOR: u32 = 28;

/// Glyph-measured extents of a string at a given pixel size.
pub trait TextMeasure {
    fn text_width(&self, text: &str, size: f32) -> f32;
    fn text_height(&self, text: &str, size: f32) -> f32;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LayoutResult {
    pub lines: Vec<String>,
    pub font_size: u32,
    pub line_height: u32,
    pub total_height: u32,
}

impl LayoutResult {
    pub fn new(lines: Vec<String>, font_size: u32, line_height: u32) -> Self {
        let total_height = lines.len() as u32 * line_height;
        Self {
            lines,
            font_size,
            line_height,
            total_height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

pub fn headline_font_size(text: &str) -> u32 {
    let len = text.chars().count();
    HEADLINE_STEPS
        .iter()
        .find(|(limit, _)| len <= *limit)
        .map(|(_, size)| *size)
        .unwrap_or(HEADLINE_FLOOR)
}

pub fn line_height_for(size: u32) -> u32 {
    (size as f32 * LINE_SPACING) as u32
}

/// Greedy wrap: a word joins the current line while the measured width of
/// `line + " " + word` fits. A single word wider than `max_width` gets a
/// line of its own and is never broken.
pub fn wrap_words<M: TextMeasure + ?Sized>(
    measure: &M,
    text: &str,
    size: f32,
    max_width: f32,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if measure.text_width(&candidate, size) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Wrap at a fixed size and line height, keeping at most [`MAX_LINES`].
pub fn wrap_block<M: TextMeasure + ?Sized>(
    measure: &M,
    text: &str,
    size: u32,
    line_height: u32,
    max_width: f32,
) -> LayoutResult {
    let mut lines = wrap_words(measure, text, size as f32, max_width);
    lines.truncate(MAX_LINES);
    LayoutResult::new(lines, size, line_height)
}

/// Wrap into a region `available_height` tall.
///
/// Lines are capped at [`MAX_LINES`], then at `available_height / line
/// height` (never below [`MIN_LINE_CAP`]). If the result still has more
/// lines than the height allows, the font shrinks once by
/// [`SHRINK_FACTOR`]; lines are not re-wrapped and anything past the cap
/// is dropped.
pub fn fit_block<M: TextMeasure + ?Sized>(
    measure: &M,
    text: &str,
    size: u32,
    max_width: f32,
    available_height: u32,
) -> LayoutResult {
    let mut lines = wrap_words(measure, text, size as f32, max_width);
    lines.truncate(MAX_LINES);

    let height_cap = (available_height as f32 / (size as f32 * LINE_SPACING)) as usize;
    lines.truncate(height_cap.max(MIN_LINE_CAP));

    let mut size = size;
    if lines.len() > height_cap {
        size = MIN_FONT_SIZE.max((size as f32 * SHRINK_FACTOR) as u32);
    }
    LayoutResult::new(lines, size, line_height_for(size))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Every character advances `ratio × size`; ink height is `0.7 × size`.
    pub struct FixedAdvance(pub f32);

    impl TextMeasure for FixedAdvance {
        fn text_width(&self, text: &str, size: f32) -> f32 {
            text.chars().count() as f32 * self.0 * size
        }

        fn text_height(&self, text: &str, size: f32) -> f32 {
            if text.is_empty() { 0.0 } else { 0.7 * size }
        }
    }

    #[test]
    fn headline_sizes_follow_table() {
        assert_eq!(headline_font_size(""), 72);
        assert_eq!(headline_font_size(&"x".repeat(20)), 72);
        assert_eq!(headline_font_size(&"x".repeat(21)), 56);
        assert_eq!(headline_font_size(&"x".repeat(50)), 56);
        assert_eq!(headline_font_size(&"x".repeat(100)), 44);
        assert_eq!(headline_font_size(&"x".repeat(200)), 36);
        assert_eq!(headline_font_size(&"x".repeat(201)), 28);
    }

    #[test]
    fn headline_size_never_grows_with_length() {
        let mut last = u32::MAX;
        for len in 0..260 {
            let size = headline_font_size(&"a".repeat(len));
            assert!(size <= last, "size grew at {len}");
            last = size;
        }
    }

    #[test]
    fn short_text_is_one_trimmed_line() {
        let lines = wrap_words(&FixedAdvance(0.5), "  hello there  ", 10.0, 1000.0);
        assert_eq!(lines, vec!["hello there".to_string()]);
    }

    #[test]
    fn wrapped_lines_fit_unless_single_long_word() {
        let m = FixedAdvance(1.0);
        let text = "a bb ccc dddd eeeeeeeeeeeeeeeeee ff g hh iii";
        let max = 8.0;
        let lines = wrap_words(&m, text, 1.0, max);
        for line in &lines {
            let fits = m.text_width(line, 1.0) <= max;
            let lone_word = !line.contains(' ');
            assert!(fits || lone_word, "line '{line}' overflows");
        }
        assert!(lines.contains(&"eeeeeeeeeeeeeeeeee".to_string()));
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn wrap_uses_measured_width() {
        // "ab cd" is 10px at 2px per char, 5px at 1px per char.
        let lines = wrap_words(&FixedAdvance(2.0), "ab cd ef", 1.0, 9.0);
        assert_eq!(lines, vec!["ab", "cd", "ef"]);
        let lines = wrap_words(&FixedAdvance(1.0), "ab cd ef", 1.0, 6.0);
        assert_eq!(lines, vec!["ab cd", "ef"]);
    }

    #[test]
    fn block_caps_at_five_lines() {
        let text = "w ".repeat(40);
        let block = wrap_block(&FixedAdvance(1.0), &text, 42, 64, 1.0);
        assert_eq!(block.lines.len(), MAX_LINES);
        assert_eq!(block.total_height, 5 * 64);
    }

    #[test]
    fn fit_shrinks_once_when_height_is_tight() {
        let text = "w ".repeat(40);
        // 72px font in a 186px region: height cap 1, floor keeps 3 lines.
        let block = fit_block(&FixedAdvance(1.0), &text, 72, 1.0, 186);
        assert_eq!(block.lines.len(), MIN_LINE_CAP);
        assert_eq!(block.font_size, 57);
        assert_eq!(block.line_height, 74);
        assert_eq!(block.total_height, 3 * 74);
    }

    #[test]
    fn fit_keeps_size_when_everything_fits() {
        let block = fit_block(&FixedAdvance(0.5), "short caption", 72, 1020.0, 576);
        assert_eq!(block.lines, vec!["short caption"]);
        assert_eq!(block.font_size, 72);
        assert_eq!(block.line_height, 93);
    }

    #[test]
    fn fit_shrink_has_a_floor() {
        let text = "w ".repeat(40);
        let block = fit_block(&FixedAdvance(1.0), &text, 28, 1.0, 40);
        assert_eq!(block.font_size, MIN_FONT_SIZE);
    }

    #[test]
    fn empty_text_has_no_lines() {
        let block = fit_block(&FixedAdvance(1.0), "", 72, 100.0, 576);
        assert!(block.is_empty());
        assert_eq!(block.total_height, 0);
    }
}
