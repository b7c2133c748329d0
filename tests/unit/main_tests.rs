use super::*;
use crate::config::ConversationSettings;
use crate::entity::Prompt;

const SCREEN: Rect = Rect {
    x: 0,
    y: 0,
    width: 80,
    height: 24,
};

fn prompt(name: &str, content: &str) -> Prompt {
    Prompt {
        id: name.to_lowercase(),
        name: name.to_string(),
        description: None,
        content: Some(content.to_string()),
        folder_id: None,
    }
}

fn app() -> App {
    App::new(
        ConversationSettings::default(),
        0,
        vec![
            prompt("Alpha", "alpha body"),
            prompt("Beta", "beta body"),
            prompt("Math", "what is {{A}}"),
        ],
    )
}

fn send(app: &mut App, events: &[AppEvent]) {
    for event in events {
        handle_app_event(app, *event, SCREEN);
    }
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        handle_app_event(app, AppEvent::InputChar(c), SCREEN);
    }
}

#[test]
fn ticks_and_quits() {
    let mut app = app();
    send(&mut app, &[AppEvent::Tick, AppEvent::Quit]);
    assert_eq!(app.ticks, 1);
    assert!(!app.running);
}

#[test]
fn enter_sends_typed_message() {
    let mut app = app();
    type_text(&mut app, "hi");
    send(&mut app, &[AppEvent::Newline, AppEvent::InputChar('x'), AppEvent::Submit]);
    assert_eq!(app.chat_lines(), ["You: hi\nx".to_string()]);
    assert!(app.chat_input().is_empty());
}

#[test]
fn alert_swallows_keys_until_dismissed() {
    let mut app = app();
    send(&mut app, &[AppEvent::Submit]);
    assert!(app.alert().is_some());

    type_text(&mut app, "ignored");
    assert!(app.chat_input().is_empty());

    send(&mut app, &[AppEvent::Escape]);
    assert!(app.alert().is_none());
}

#[test]
fn picker_keys_navigate_and_select() {
    let mut app = app();
    type_text(&mut app, "/");
    send(
        &mut app,
        &[AppEvent::MoveDown, AppEvent::MoveDown, AppEvent::MoveDown],
    );
    assert_eq!(app.active_prompt_index(), 2);

    send(&mut app, &[AppEvent::NextItem]);
    assert_eq!(app.active_prompt_index(), 0);

    send(&mut app, &[AppEvent::MoveDown, AppEvent::Submit]);
    assert_eq!(app.chat_input(), "beta body");
    assert!(!app.is_prompt_picker_open());
}

#[test]
fn typing_in_picker_resets_active_row() {
    let mut app = app();
    type_text(&mut app, "/");
    send(&mut app, &[AppEvent::MoveDown]);
    assert_eq!(app.active_prompt_index(), 1);

    type_text(&mut app, "a");
    assert_eq!(app.active_prompt_index(), 0);
}

#[test]
fn escape_hides_picker_without_touching_input() {
    let mut app = app();
    type_text(&mut app, "/al");
    send(&mut app, &[AppEvent::Escape]);
    assert!(!app.is_prompt_picker_open());
    assert_eq!(app.chat_input(), "/al");

    send(&mut app, &[AppEvent::Submit]);
    assert_eq!(app.chat_lines(), ["You: /al".to_string()]);
}

#[test]
fn modal_collects_values_and_fills_template() {
    let mut app = app();
    type_text(&mut app, "/math");
    send(&mut app, &[AppEvent::Submit]);
    assert!(app.is_variable_modal_open());

    type_text(&mut app, "21");
    send(&mut app, &[AppEvent::Backspace, AppEvent::InputChar('0')]);
    send(&mut app, &[AppEvent::Submit]);
    assert!(!app.is_variable_modal_open());
    assert_eq!(app.chat_input(), "what is 20");
}

#[test]
fn modal_submit_with_empty_field_alerts() {
    let mut app = app();
    type_text(&mut app, "/math");
    send(&mut app, &[AppEvent::Submit, AppEvent::Submit]);
    assert_eq!(app.alert(), Some(app::UNFILLED_VARIABLES_ALERT));
    assert!(app.is_variable_modal_open());

    send(&mut app, &[AppEvent::Submit, AppEvent::Escape]);
    assert!(app.alert().is_none());
    assert!(!app.is_variable_modal_open());
    assert_eq!(app.chat_input(), "what is {{A}}");
}

#[test]
fn arrows_move_cursor_when_picker_closed() {
    let mut app = app();
    type_text(&mut app, "ab");
    send(&mut app, &[AppEvent::CursorLeft, AppEvent::InputChar('x')]);
    assert_eq!(app.chat_input(), "axb");
}

#[test]
fn enter_on_unmatched_query_hides_picker_instead_of_sending() {
    let mut app = app();
    type_text(&mut app, "/zzz");
    send(&mut app, &[AppEvent::Submit]);
    assert!(app.chat_lines().is_empty());
    assert_eq!(app.chat_input(), "/zzz");
    assert!(!app.is_prompt_picker_active());

    send(&mut app, &[AppEvent::Submit]);
    assert_eq!(app.chat_lines(), ["You: /zzz".to_string()]);
}
