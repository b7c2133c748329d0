//! Entity name normalisation shared by prompts and folders.
//!
//! Names typed by the user, pasted from a prompt body or read from an import
//! file all pass through [`prepare_entity_name`] before they are stored.

use unicode_segmentation::UnicodeSegmentation;

/// Maximum name length, counted in grapheme clusters.
pub const MAX_ENTITY_LENGTH: usize = 160;

/// Printable characters that may not appear in an entity name. Control
/// characters (tabs and line breaks included) are rejected as well.
pub const NOT_ALLOWED_SYMBOLS: &str = ":;,=/\\{}%&?*<>|\"";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrepareNameOptions {
    /// The name comes from an explicit rename rather than being derived
    /// from free text.
    pub for_renaming: bool,
    /// When renaming, replace disallowed characters with a space instead of
    /// dropping them.
    pub replace_with_spaces: bool,
    /// When renaming, also strip trailing dots.
    pub trim_end_dots_required: bool,
}

impl PrepareNameOptions {
    pub fn renaming() -> Self {
        Self {
            for_renaming: true,
            ..Self::default()
        }
    }
}

pub fn is_not_allowed_symbol(ch: char) -> bool {
    ch.is_control() || NOT_ALLOWED_SYMBOLS.contains(ch)
}

pub fn prepare_entity_name(name: &str, options: PrepareNameOptions) -> String {
    let clear_name = if options.for_renaming {
        let replacement = if options.replace_with_spaces { " " } else { "" };
        replace_not_allowed(name, replacement).trim().to_string()
    } else {
        first_non_empty_line(name)
    };

    let result = truncate_graphemes(&clear_name, MAX_ENTITY_LENGTH);

    if !options.for_renaming || options.trim_end_dots_required {
        trim_end_dots(&result).to_string()
    } else {
        result.trim().to_string()
    }
}

/// True when the name, ignoring surrounding whitespace, ends with a dot.
pub fn does_have_dots_in_the_end(name: &str) -> bool {
    name.trim().ends_with('.')
}

fn first_non_empty_line(name: &str) -> String {
    name.replace("\r\n", "\n")
        .replace('\r', "\n")
        .split('\n')
        .map(|line| replace_not_allowed(line, " ").trim().to_string())
        .find(|line| !line.is_empty())
        .unwrap_or_default()
}

fn replace_not_allowed(text: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if is_not_allowed_symbol(ch) {
            out.push_str(replacement);
        } else {
            out.push(ch);
        }
    }
    out
}

fn truncate_graphemes(text: &str, max: usize) -> String {
    match text.grapheme_indices(true).nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

fn trim_end_dots(text: &str) -> &str {
    text.trim_end_matches(|ch: char| ch == '.' || ch.is_whitespace())
}
