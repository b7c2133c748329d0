use unicode_segmentation::UnicodeSegmentation;

/// Wrapped rendering of the input box plus the `(line, col)` of every
/// grapheme boundary, so a cursor counted in graphemes can be placed.
#[derive(Debug, Clone)]
pub struct WrappedText {
    pub rendered: String,
    pub positions: Vec<(u16, u16)>,
    pub line_count: u16,
}

pub fn grapheme_count(text: &str) -> usize {
    text.graphemes(true).count()
}

/// Byte offset of the grapheme boundary `grapheme_idx`, clamped to the end.
pub fn grapheme_to_byte_idx(text: &str, grapheme_idx: usize) -> usize {
    text.grapheme_indices(true)
        .nth(grapheme_idx)
        .map(|(byte_idx, _)| byte_idx)
        .unwrap_or(text.len())
}

pub fn wrap_word_with_positions(text: &str, width: u16) -> WrappedText {
    let width = width.max(1);
    let graphemes: Vec<&str> = text.graphemes(true).collect();
    let mut rendered = String::with_capacity(text.len());
    let mut positions = Vec::with_capacity(graphemes.len() + 1);
    let mut line = 0u16;
    let mut col = 0u16;

    positions.push((line, col));

    for (idx, g) in graphemes.iter().copied().enumerate() {
        if is_line_break(g) {
            rendered.push('\n');
            line = line.saturating_add(1);
            col = 0;
            positions.push((line, col));
            continue;
        }

        if col > 0 && (col >= width || starts_overflowing_word(&graphemes, idx, col, width)) {
            rendered.push('\n');
            line = line.saturating_add(1);
            col = 0;
        }

        rendered.push_str(g);
        col = col.saturating_add(1);
        positions.push((line, col));
    }

    let line_count = positions
        .iter()
        .map(|(l, _)| *l)
        .max()
        .unwrap_or(0)
        .saturating_add(1);

    WrappedText {
        rendered,
        positions,
        line_count,
    }
}

fn is_line_break(g: &str) -> bool {
    g == "\n" || g == "\r\n"
}

fn is_blank(g: &str) -> bool {
    g.chars().all(char::is_whitespace)
}

fn starts_overflowing_word(graphemes: &[&str], idx: usize, col: u16, width: u16) -> bool {
    if is_blank(graphemes[idx]) {
        return false;
    }
    if idx > 0 && !is_blank(graphemes[idx - 1]) {
        return false;
    }

    let word_len = graphemes[idx..]
        .iter()
        .take_while(|g| !is_blank(g))
        .count() as u16;

    word_len <= width && col.saturating_add(word_len) > width
}
