use ratatui::prelude::*;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Clear, Padding, Paragraph, Wrap};

use crate::app::{App, VariableModalState};
use crate::entity::Prompt;
use crate::text_layout::wrap_word_with_positions;
use crate::theme::Theme;

const MAX_INPUT_TEXT_LINES: u16 = 5;
const MAX_PICKER_ROWS: u16 = 8;
const TEXT_PADDING: u16 = 1;
const STATUS_HEIGHT: u16 = 3;
const TITLE_BAR_HEIGHT: u16 = 3;
const APP_TITLE: &str = "promptdesk";
const STATUS_HELP_TEXT: &str =
    "Enter send | Shift+Enter newline | / insert prompt | PgUp/PgDn scroll | Ctrl+C quit";
const PICKER_HELP_TEXT: &str = "Up/Down or Tab select | Enter insert | Esc close";
const MODAL_HELP_TEXT: &str = "Tab/Shift+Tab field | Enter submit | Esc cancel";

fn screen_areas(screen: Rect) -> [Rect; 3] {
    Layout::vertical([
        Constraint::Length(TITLE_BAR_HEIGHT),
        Constraint::Min(0),
        Constraint::Length(STATUS_HEIGHT),
    ])
    .areas(screen)
}

pub fn chat_input_text_width(screen: Rect) -> u16 {
    let [_title, content, _status] = screen_areas(screen);
    content.width.saturating_sub(TEXT_PADDING * 2).max(1)
}

pub fn chat_max_scroll(screen: Rect, app: &App) -> u16 {
    let [_title, content, _status] = screen_areas(screen);
    if content.width < 1 || content.height < 2 {
        return 0;
    }

    let input_text_width = content.width.saturating_sub(TEXT_PADDING * 2).max(1);
    let input_text_lines = wrap_word_with_positions(app.chat_input(), input_text_width).line_count;
    let max_input_height = content.height.saturating_sub(1).max(1);
    let (input_height, _) = input_box_metrics(input_text_lines, 0, max_input_height);
    let [messages_area, _input_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(input_height)]).areas(content);

    let visible_message_lines = messages_area.height.saturating_sub(TEXT_PADDING * 2);
    let total_message_lines = chat_display_lines(
        app.chat_lines(),
        messages_area.width.saturating_sub(TEXT_PADDING * 2).max(1),
    )
    .len() as u16;
    total_message_lines.saturating_sub(visible_message_lines)
}

pub fn render(frame: &mut Frame, app: &App, theme: &Theme) {
    let [title, content, status] = screen_areas(frame.area());

    render_title_bar(frame, title, app, theme);
    render_chat(frame, content, app, theme);

    frame.render_widget(
        Paragraph::new(status_line_text(app))
            .style(Style::default().bg(theme.status_bg).fg(theme.muted_fg))
            .block(
                Block::default()
                    .style(Style::default().bg(theme.status_bg))
                    .padding(Padding::uniform(TEXT_PADDING)),
            ),
        status,
    );

    if let Some(modal) = app.variable_modal() {
        render_variable_modal(frame, modal, theme);
    }
    if let Some(message) = app.alert() {
        render_alert(frame, message, theme);
    }
}

fn render_title_bar(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let line = Line::from(vec![
        Span::styled(
            APP_TITLE,
            Style::default()
                .fg(theme.active_fg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(app.settings().summary(), Style::default().fg(theme.muted_fg)),
    ]);
    frame.render_widget(
        Paragraph::new(line)
            .style(Style::default().bg(theme.title_bg))
            .block(
                Block::default()
                    .style(Style::default().bg(theme.title_bg))
                    .padding(Padding::uniform(TEXT_PADDING)),
            ),
        area,
    );
}

fn status_line_text(app: &App) -> &'static str {
    if app.is_variable_modal_open() {
        MODAL_HELP_TEXT
    } else if app.is_prompt_picker_open() {
        PICKER_HELP_TEXT
    } else {
        STATUS_HELP_TEXT
    }
}

fn render_chat(frame: &mut Frame, content: Rect, app: &App, theme: &Theme) {
    frame.render_widget(
        Block::default().style(Style::default().bg(theme.chat_bg)),
        content,
    );
    if content.width < 1 || content.height < 2 {
        return;
    }

    let input_text_width = content.width.saturating_sub(TEXT_PADDING * 2).max(1);
    let wrapped_input = wrap_word_with_positions(app.chat_input(), input_text_width);
    let (cursor_line, cursor_col) = app.chat_cursor_line_col(input_text_width);
    let max_input_height = content.height.saturating_sub(1).max(1);
    let (input_height, input_scroll) =
        input_box_metrics(wrapped_input.line_count, cursor_line, max_input_height);

    let [messages_area, input_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(input_height)]).areas(content);

    let message_lines = chat_display_lines(
        app.chat_lines(),
        messages_area.width.saturating_sub(TEXT_PADDING * 2).max(1),
    );
    frame.render_widget(
        Paragraph::new(chat_text(&message_lines, theme))
            .scroll((app.chat_scroll().min(chat_max_scroll(frame.area(), app)), 0))
            .style(Style::default().bg(theme.chat_bg).fg(theme.text_fg))
            .block(
                Block::default()
                    .style(Style::default().bg(theme.chat_bg))
                    .padding(Padding::uniform(TEXT_PADDING)),
            ),
        messages_area,
    );

    frame.render_widget(
        Paragraph::new(wrapped_input.rendered)
            .block(
                Block::default()
                    .style(Style::default().bg(theme.input_bg))
                    .padding(Padding::uniform(TEXT_PADDING)),
            )
            .style(Style::default().bg(theme.input_bg).fg(theme.text_fg))
            .scroll((input_scroll, 0)),
        input_area,
    );

    if app.is_prompt_picker_open() {
        render_prompt_picker(
            frame,
            &app.filtered_prompts(),
            app.active_prompt_index(),
            messages_area,
            input_area,
            theme,
        );
    }

    if app.is_variable_modal_open() || app.alert().is_some() {
        return;
    }
    let input_inner = input_area.inner(Margin {
        horizontal: TEXT_PADDING,
        vertical: TEXT_PADDING,
    });
    if input_inner.width > 0 && input_inner.height > 0 {
        let visible_cursor_line = cursor_line.saturating_sub(input_scroll);
        if visible_cursor_line < input_inner.height {
            frame.set_cursor_position((
                input_inner
                    .x
                    .saturating_add(cursor_col.min(input_inner.width.saturating_sub(1))),
                input_inner.y.saturating_add(visible_cursor_line),
            ));
        }
    }
}

/// Lists matching prompts directly above the input box, scrolled so the
/// active row stays visible.
fn render_prompt_picker(
    frame: &mut Frame,
    prompts: &[&Prompt],
    active: usize,
    messages_area: Rect,
    input_area: Rect,
    theme: &Theme,
) {
    if prompts.is_empty() || messages_area.height == 0 || input_area.width == 0 {
        return;
    }
    let max_rows = messages_area
        .height
        .saturating_sub(TEXT_PADDING * 2)
        .clamp(1, MAX_PICKER_ROWS) as usize;
    let shown_count = prompts.len().min(max_rows);
    let start = active.saturating_sub(shown_count.saturating_sub(1));
    let overlay_height = (shown_count as u16)
        .saturating_add(TEXT_PADDING * 2)
        .min(messages_area.height.max(1));
    let y = input_area
        .y
        .saturating_sub(overlay_height)
        .max(messages_area.y);
    let overlay = Rect::new(input_area.x, y, input_area.width, overlay_height);

    let lines = prompts
        .iter()
        .enumerate()
        .skip(start)
        .take(shown_count)
        .map(|(idx, prompt)| {
            let selected = idx == active;
            let name_style = if selected {
                Style::default()
                    .fg(theme.active_fg)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.text_fg)
            };
            let mut spans = vec![
                Span::styled(
                    if selected { "> " } else { "  " },
                    Style::default().fg(theme.muted_fg),
                ),
                Span::styled(prompt.name.clone(), name_style),
            ];
            if let Some(description) = prompt.description.as_deref().filter(|d| !d.is_empty()) {
                spans.push(Span::raw(" "));
                spans.push(Span::styled(
                    description.to_string(),
                    Style::default().fg(theme.muted_fg),
                ));
            }
            Line::from(spans)
        })
        .collect::<Vec<_>>();

    frame.render_widget(Clear, overlay);
    frame.render_widget(
        Paragraph::new(lines)
            .style(Style::default().bg(theme.popup_bg))
            .block(
                Block::default()
                    .style(Style::default().bg(theme.popup_bg))
                    .padding(Padding::uniform(TEXT_PADDING)),
            ),
        overlay,
    );
}

fn render_variable_modal(frame: &mut Frame, modal: &VariableModalState, theme: &Theme) {
    let mut lines = vec![Line::from(Span::styled(
        modal.prompt_name.clone(),
        Style::default()
            .fg(theme.active_fg)
            .add_modifier(Modifier::BOLD),
    ))];
    if let Some(description) = modal.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(Line::from(Span::styled(
            description.to_string(),
            Style::default().fg(theme.muted_fg),
        )));
    }
    lines.push(Line::default());
    for (idx, (name, value)) in modal.variables.iter().zip(&modal.values).enumerate() {
        let selected = idx == modal.selected;
        let label_style = if selected {
            Style::default()
                .fg(theme.active_fg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.muted_fg)
        };
        let value_text = if value.is_empty() && !selected {
            format!("Enter a value for {name}...")
        } else if selected {
            format!("{value}_")
        } else {
            value.clone()
        };
        let value_style = if value.is_empty() && !selected {
            Style::default().fg(theme.muted_fg).add_modifier(Modifier::DIM)
        } else {
            Style::default().fg(theme.text_fg)
        };
        lines.push(Line::from(vec![
            Span::styled(if selected { "> " } else { "  " }, label_style),
            Span::styled(format!("{name}: "), label_style),
            Span::styled(value_text, value_style),
        ]));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        MODAL_HELP_TEXT,
        Style::default().fg(theme.muted_fg),
    )));

    let height = (lines.len() as u16).saturating_add(TEXT_PADDING * 2);
    let overlay = centered_rect(frame.area(), 70, height);
    frame.render_widget(Clear, overlay);
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .style(Style::default().bg(theme.popup_bg))
            .block(
                Block::default()
                    .style(Style::default().bg(theme.popup_bg))
                    .padding(Padding::uniform(TEXT_PADDING)),
            ),
        overlay,
    );
}

fn render_alert(frame: &mut Frame, message: &str, theme: &Theme) {
    let lines = vec![
        Line::from(Span::styled(
            message.to_string(),
            Style::default()
                .fg(theme.alert_fg)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Enter or Esc to dismiss",
            Style::default().fg(theme.muted_fg),
        )),
    ];
    let width = (message.chars().count() as u16)
        .saturating_add(TEXT_PADDING * 2 + 2)
        .max(32);
    let overlay = centered_rect(frame.area(), width, 4);
    frame.render_widget(Clear, overlay);
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .style(Style::default().bg(theme.popup_bg))
                    .padding(Padding::horizontal(TEXT_PADDING)),
            )
            .style(Style::default().bg(theme.popup_bg)),
        overlay,
    );
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChatPrefix {
    You,
    System,
}

impl ChatPrefix {
    fn label(self) -> &'static str {
        match self {
            Self::You => "You:",
            Self::System => "System:",
        }
    }
}

#[derive(Debug, Clone)]
struct ChatDisplayLine {
    prefix: Option<ChatPrefix>,
    body: String,
    show_label: bool,
    is_separator: bool,
}

fn chat_display_lines(messages: &[String], width: u16) -> Vec<ChatDisplayLine> {
    let width = width.max(1);
    let mut out = Vec::new();
    for (idx, message) in messages.iter().enumerate() {
        let (prefix, body) = parse_chat_prefix_and_body(message);
        let body_width = match prefix {
            Some(prefix) => (width as usize)
                .saturating_sub(prefix.label().chars().count() + 1)
                .max(1) as u16,
            None => width,
        };
        for (line_idx, line) in wrap_text_lines(body, body_width).into_iter().enumerate() {
            out.push(ChatDisplayLine {
                prefix,
                body: line,
                show_label: line_idx == 0,
                is_separator: false,
            });
        }

        if idx + 1 < messages.len() {
            out.push(ChatDisplayLine {
                prefix: None,
                body: "─".repeat(width as usize),
                show_label: false,
                is_separator: true,
            });
        }
    }
    out
}

fn chat_text(lines: &[ChatDisplayLine], theme: &Theme) -> Text<'static> {
    let mut out_lines = Vec::with_capacity(lines.len());
    for line in lines {
        if line.is_separator {
            out_lines.push(Line::from(Span::styled(
                line.body.clone(),
                Style::default().fg(chat_separator_color(theme)),
            )));
            continue;
        }
        let Some(prefix) = line.prefix else {
            out_lines.push(Line::from(Span::raw(line.body.clone())));
            continue;
        };
        let (label_style, body_style) = match prefix {
            ChatPrefix::You => (
                Style::default().fg(Color::Rgb(80, 190, 100)),
                Style::default(),
            ),
            ChatPrefix::System => {
                let style = Style::default()
                    .fg(theme.muted_fg)
                    .add_modifier(Modifier::DIM);
                (style, style)
            }
        };
        let label = if line.show_label {
            Span::styled(format!("{} ", prefix.label()), label_style)
        } else {
            Span::raw(" ".repeat(prefix.label().chars().count() + 1))
        };
        out_lines.push(Line::from(vec![
            label,
            Span::styled(line.body.clone(), body_style),
        ]));
    }
    Text::from(out_lines)
}

fn chat_separator_color(theme: &Theme) -> Color {
    match theme.chat_bg {
        Color::Rgb(r, g, b) => Color::Rgb(
            r.saturating_add(12),
            g.saturating_add(12),
            b.saturating_add(12),
        ),
        _ => theme.muted_fg,
    }
}

fn parse_chat_prefix_and_body(message: &str) -> (Option<ChatPrefix>, &str) {
    if let Some(rest) = message.strip_prefix("You:") {
        return (Some(ChatPrefix::You), rest.trim_start());
    }
    if let Some(rest) = message.strip_prefix("System:") {
        return (Some(ChatPrefix::System), rest.trim_start());
    }
    (None, message)
}

fn wrap_text_lines(text: &str, width: u16) -> Vec<String> {
    let rendered = wrap_word_with_positions(text, width.max(1)).rendered;
    let mut lines = rendered
        .split('\n')
        .map(|s| s.to_string())
        .collect::<Vec<_>>();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn input_box_metrics(input_text_lines: u16, cursor_line: u16, max_input_height: u16) -> (u16, u16) {
    let capped_text_lines = input_text_lines.clamp(1, MAX_INPUT_TEXT_LINES);
    let desired_height = capped_text_lines.saturating_add(TEXT_PADDING * 2);
    let input_height = desired_height.clamp(1, max_input_height.max(1));
    let visible_text_lines = input_height.saturating_sub(TEXT_PADDING * 2).max(1);
    let max_scroll = input_text_lines.saturating_sub(visible_text_lines);
    let middle_line = visible_text_lines / 2;
    let input_scroll = cursor_line.saturating_sub(middle_line).min(max_scroll);
    (input_height, input_scroll)
}

#[cfg(test)]
#[path = "../tests/unit/ui_tests.rs"]
mod tests;
