use std::sync::LazyLock;

use regex::Regex;

use crate::config::ConversationSettings;
use crate::entity::Prompt;
use crate::text_layout::{grapheme_count, grapheme_to_byte_idx, wrap_word_with_positions};
use crate::variables::{bind_positional, has_variables, substitute, unique_variables};

/// A trailing `/query` opens the prompt picker. Query characters are ASCII
/// word characters only.
static PROMPT_QUERY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/[A-Za-z0-9_]*$").expect("prompt query pattern is valid"));

pub const EMPTY_MESSAGE_ALERT: &str = "Please enter a message";
pub const UNFILLED_VARIABLES_ALERT: &str = "Please fill out all variables";

#[derive(Debug, Clone, PartialEq, Eq)]
struct PromptPickerState {
    query: String,
    active: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableModalState {
    pub prompt_name: String,
    pub description: Option<String>,
    pub variables: Vec<String>,
    pub values: Vec<String>,
    pub selected: usize,
}

#[derive(Debug)]
pub struct App {
    pub running: bool,
    pub ticks: u64,
    settings: ConversationSettings,
    max_message_length: usize,
    prompts: Vec<Prompt>,
    chat_messages: Vec<String>,
    chat_scroll: u16,
    chat_input: String,
    chat_cursor: usize,
    chat_cursor_goal_col: Option<u16>,
    prompt_picker: Option<PromptPickerState>,
    variable_modal: Option<VariableModalState>,
    alert: Option<String>,
}

impl Default for App {
    fn default() -> Self {
        Self::new(ConversationSettings::default(), 0, Vec::new())
    }
}

impl App {
    pub fn new(
        settings: ConversationSettings,
        max_message_length: usize,
        prompts: Vec<Prompt>,
    ) -> Self {
        let mut chat_messages = Vec::new();
        if !settings.system_prompt.trim().is_empty() {
            chat_messages.push(format!("System: {}", settings.system_prompt.trim()));
        }
        Self {
            running: true,
            ticks: 0,
            settings,
            max_message_length,
            prompts,
            chat_messages,
            chat_scroll: 0,
            chat_input: String::new(),
            chat_cursor: 0,
            chat_cursor_goal_col: None,
            prompt_picker: None,
            variable_modal: None,
            alert: None,
        }
    }

    pub fn on_tick(&mut self) {
        self.ticks = self.ticks.saturating_add(1);
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn settings(&self) -> &ConversationSettings {
        &self.settings
    }

    pub fn chat_input(&self) -> &str {
        &self.chat_input
    }

    pub fn chat_lines(&self) -> &[String] {
        &self.chat_messages
    }

    pub fn chat_scroll(&self) -> u16 {
        self.chat_scroll
    }

    pub fn scroll_chat_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_chat_down(&mut self, max_scroll: u16) {
        self.chat_scroll = (self.chat_scroll + 1).min(max_scroll);
    }

    pub fn scroll_chat_to_bottom(&mut self, max_scroll: u16) {
        self.chat_scroll = max_scroll;
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    fn raise_alert(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(%message, "alert raised");
        self.alert = Some(message);
    }

    pub fn input_char(&mut self, c: char) {
        let byte_idx = grapheme_to_byte_idx(&self.chat_input, self.chat_cursor);
        let mut candidate = self.chat_input.clone();
        candidate.insert(byte_idx, c);
        if !self.accept_input_length(&candidate) {
            return;
        }
        self.chat_cursor = grapheme_count(&candidate[..byte_idx + c.len_utf8()]);
        self.chat_input = candidate;
        self.chat_cursor_goal_col = None;
        self.refresh_prompt_picker();
    }

    pub fn insert_newline(&mut self) {
        self.input_char('\n');
    }

    pub fn backspace_input(&mut self) {
        if self.chat_cursor == 0 {
            return;
        }

        let start = grapheme_to_byte_idx(&self.chat_input, self.chat_cursor - 1);
        let end = grapheme_to_byte_idx(&self.chat_input, self.chat_cursor);
        self.chat_input.drain(start..end);
        self.chat_cursor -= 1;
        self.chat_cursor_goal_col = None;
        self.refresh_prompt_picker();
    }

    pub fn move_cursor_left(&mut self) {
        self.chat_cursor = self.chat_cursor.saturating_sub(1);
        self.chat_cursor_goal_col = None;
    }

    pub fn move_cursor_right(&mut self) {
        let len = grapheme_count(&self.chat_input);
        self.chat_cursor = (self.chat_cursor + 1).min(len);
        self.chat_cursor_goal_col = None;
    }

    pub fn move_cursor_up(&mut self, width: u16) {
        let positions = wrap_word_with_positions(&self.chat_input, width.max(1)).positions;
        let (line, col) = positions[self.chat_cursor];
        if line == 0 {
            return;
        }
        let goal_col = self.chat_cursor_goal_col.unwrap_or(col);
        self.chat_cursor = nearest_index_for_line_col(&positions, line - 1, goal_col);
        self.chat_cursor_goal_col = Some(goal_col);
    }

    pub fn move_cursor_down(&mut self, width: u16) {
        let positions = wrap_word_with_positions(&self.chat_input, width.max(1)).positions;
        let (line, col) = positions[self.chat_cursor];
        let max_line = positions.iter().map(|(l, _)| *l).max().unwrap_or(0);
        if line >= max_line {
            return;
        }
        let goal_col = self.chat_cursor_goal_col.unwrap_or(col);
        self.chat_cursor = nearest_index_for_line_col(&positions, line + 1, goal_col);
        self.chat_cursor_goal_col = Some(goal_col);
    }

    pub fn chat_cursor_line_col(&self, width: u16) -> (u16, u16) {
        let positions = wrap_word_with_positions(&self.chat_input, width.max(1)).positions;
        positions[self.chat_cursor]
    }

    /// Sends the current input. Blank input raises an alert instead.
    pub fn submit_chat_message(&mut self) -> Option<String> {
        let message = self.chat_input.trim().to_string();
        if message.is_empty() {
            self.raise_alert(EMPTY_MESSAGE_ALERT);
            return None;
        }

        self.chat_messages.push(format!("You: {message}"));
        self.set_input(String::new());
        Some(message)
    }

    pub fn push_system_message(&mut self, message: impl Into<String>) {
        self.chat_messages.push(format!("System: {}", message.into()));
    }

    /// Whether picker keys are captured. Stays true while the query matches
    /// nothing, so Enter hides the list instead of sending `/query`.
    pub fn is_prompt_picker_active(&self) -> bool {
        self.variable_modal.is_none() && self.prompt_picker.is_some()
    }

    /// Whether the picker list is drawn.
    pub fn is_prompt_picker_open(&self) -> bool {
        self.is_prompt_picker_active() && !self.filtered_prompts().is_empty()
    }

    pub fn filtered_prompts(&self) -> Vec<&Prompt> {
        let Some(picker) = self.prompt_picker.as_ref() else {
            return Vec::new();
        };
        let query = picker.query.to_lowercase();
        self.prompts
            .iter()
            .filter(|prompt| prompt.name.to_lowercase().contains(&query))
            .collect()
    }

    pub fn active_prompt_index(&self) -> usize {
        self.prompt_picker
            .as_ref()
            .map(|picker| picker.active)
            .unwrap_or(0)
    }

    pub fn prompt_picker_move_down(&mut self) {
        let len = self.filtered_prompts().len();
        let Some(picker) = self.prompt_picker.as_mut() else {
            return;
        };
        if picker.active + 1 < len {
            picker.active += 1;
        }
    }

    pub fn prompt_picker_move_up(&mut self) {
        if let Some(picker) = self.prompt_picker.as_mut() {
            picker.active = picker.active.saturating_sub(1);
        }
    }

    pub fn prompt_picker_cycle(&mut self) {
        let len = self.filtered_prompts().len();
        let Some(picker) = self.prompt_picker.as_mut() else {
            return;
        };
        picker.active = if picker.active + 1 < len {
            picker.active + 1
        } else {
            0
        };
    }

    pub fn prompt_picker_reset_active(&mut self) {
        if let Some(picker) = self.prompt_picker.as_mut() {
            picker.active = 0;
        }
    }

    pub fn close_prompt_picker(&mut self) {
        self.prompt_picker = None;
    }

    /// Replaces the trailing `/query` with the highlighted prompt. Prompts
    /// with variables open the variable modal instead of finishing here.
    pub fn select_active_prompt(&mut self) {
        let selected = self
            .filtered_prompts()
            .get(self.active_prompt_index())
            .map(|prompt| (*prompt).clone());
        self.prompt_picker = None;

        let Some(prompt) = selected else {
            return;
        };
        let Some(content) = prompt.content.as_deref().filter(|c| !c.is_empty()) else {
            return;
        };

        let replaced = PROMPT_QUERY
            .replace(&self.chat_input, regex::NoExpand(content))
            .into_owned();
        if self.accept_input_length(&replaced) {
            self.set_input(replaced);
        } else {
            return;
        }

        if !has_variables(content) {
            tracing::debug!(prompt = %prompt.name, "prompt inserted");
            return;
        }
        let variables = unique_variables(content);
        tracing::debug!(prompt = %prompt.name, variables = variables.len(), "collecting variables");
        self.variable_modal = Some(VariableModalState {
            prompt_name: prompt.name,
            description: prompt.description,
            values: vec![String::new(); variables.len()],
            variables,
            selected: 0,
        });
    }

    pub fn variable_modal(&self) -> Option<&VariableModalState> {
        self.variable_modal.as_ref()
    }

    pub fn is_variable_modal_open(&self) -> bool {
        self.variable_modal.is_some()
    }

    pub fn variable_modal_input_char(&mut self, c: char) {
        if let Some(modal) = self.variable_modal.as_mut() {
            modal.values[modal.selected].push(c);
        }
    }

    pub fn variable_modal_backspace(&mut self) {
        if let Some(modal) = self.variable_modal.as_mut() {
            modal.values[modal.selected].pop();
        }
    }

    pub fn variable_modal_next_field(&mut self) {
        if let Some(modal) = self.variable_modal.as_mut() {
            modal.selected = (modal.selected + 1) % modal.variables.len();
        }
    }

    pub fn variable_modal_prev_field(&mut self) {
        if let Some(modal) = self.variable_modal.as_mut() {
            let len = modal.variables.len();
            modal.selected = (modal.selected + len - 1) % len;
        }
    }

    pub fn close_variable_modal(&mut self) {
        self.variable_modal = None;
    }

    /// Substitutes the collected values into the input. Every field must be
    /// filled; the modal stays open otherwise.
    pub fn submit_variable_modal(&mut self) {
        let Some(modal) = self.variable_modal.as_ref() else {
            return;
        };
        if modal.values.iter().any(|value| value.trim().is_empty()) {
            self.raise_alert(UNFILLED_VARIABLES_ALERT);
            return;
        }

        let result = bind_positional(&modal.variables, &modal.values)
            .and_then(|bindings| substitute(&self.chat_input, &bindings));
        self.variable_modal = None;
        match result {
            Ok(content) => {
                if self.accept_input_length(&content) {
                    self.set_input(content);
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "variable substitution failed");
                self.raise_alert(err.to_string());
            }
        }
    }

    fn accept_input_length(&mut self, candidate: &str) -> bool {
        let length = candidate.chars().count();
        if self.max_message_length > 0 && length > self.max_message_length {
            self.raise_alert(format!(
                "Message limit is {} characters. You have entered {} characters.",
                self.max_message_length, length
            ));
            return false;
        }
        true
    }

    fn set_input(&mut self, text: String) {
        self.chat_cursor = grapheme_count(&text);
        self.chat_input = text;
        self.chat_cursor_goal_col = None;
        self.refresh_prompt_picker();
    }

    fn refresh_prompt_picker(&mut self) {
        match PROMPT_QUERY.find(&self.chat_input) {
            Some(found) => {
                let query = found.as_str()[1..].to_string();
                match self.prompt_picker.as_mut() {
                    Some(picker) => picker.query = query,
                    None => {
                        self.prompt_picker = Some(PromptPickerState { query, active: 0 });
                    }
                }
                let len = self.filtered_prompts().len();
                if let Some(picker) = self.prompt_picker.as_mut() {
                    picker.active = picker.active.min(len.saturating_sub(1));
                }
            }
            None => self.prompt_picker = None,
        }
    }
}

fn nearest_index_for_line_col(positions: &[(u16, u16)], target_line: u16, goal_col: u16) -> usize {
    let mut best: Option<(usize, u16)> = None;
    let mut fallback: Option<usize> = None;

    for (idx, (line, col)) in positions.iter().copied().enumerate() {
        if line != target_line {
            continue;
        }
        if fallback.is_none() {
            fallback = Some(idx);
        }
        if col <= goal_col {
            best = match best {
                Some((_, best_col)) if best_col >= col => best,
                _ => Some((idx, col)),
            };
        }
    }

    best.map(|(idx, _)| idx)
        .or(fallback)
        .unwrap_or(positions.len().saturating_sub(1))
}

#[cfg(test)]
#[path = "../tests/unit/app_tests.rs"]
mod tests;
