use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use crossterm::cursor::SetCursorStyle;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::*;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod app;
mod cli;
mod config;
mod entity;
mod error;
mod events;
mod naming;
mod store;
mod text_layout;
mod theme;
mod ui;
mod variables;

use app::App;
use cli::{Cli, Commands};
use error::CliError;
use events::AppEvent;
use theme::Theme;

const LOG_FILE_NAME: &str = "promptdesk.log";
const THEME_FILE_NAME: &str = "theme.toml";
const EMPTY_LIBRARY_HINT: &str =
    "No saved prompts yet. Add one with `promptdesk add NAME --content TEXT`.";

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        None | Some(Commands::Chat) => run_chat(),
        Some(command) => {
            init_stderr_logging();
            cli::run_command(command, &mut io::stdout().lock())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

fn init_stderr_logging() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(env_filter("warn"))
        .try_init();
}

/// The chat owns the terminal, so its log goes to a file under the data root.
fn init_file_logging(root: &Path) -> io::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(root.join(LOG_FILE_NAME))?;
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .with(env_filter("info"))
        .try_init();
    Ok(())
}

fn run_chat() -> Result<(), CliError> {
    let config = config::load_config()?;
    let store = cli::open_store_from(&config)?;
    init_file_logging(store.root_dir()).map_err(|source| CliError::File {
        path: store.root_dir().join(LOG_FILE_NAME).display().to_string(),
        source,
    })?;

    let prompts = store.read_prompts()?;
    let library_empty = prompts.is_empty() && store.read_folders()?.is_empty();
    let theme = Theme::load_or_default(config::config_dir()?.join(THEME_FILE_NAME));
    tracing::info!(
        prompts = prompts.len(),
        model = %config.conversation.model,
        "starting chat"
    );
    let mut app = App::new(
        config.conversation.clone(),
        config.chat.max_message_length,
        prompts,
    );
    if library_empty {
        app.push_system_message(EMPTY_LIBRARY_HINT);
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        SetCursorStyle::SteadyBar
    )?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    let result = run_app(&mut terminal, app, &theme);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        SetCursorStyle::DefaultUserShape,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    tracing::info!("chat closed");
    Ok(result?)
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
    theme: &Theme,
) -> io::Result<()> {
    while app.running {
        terminal.draw(|frame| ui::render(frame, &app, theme))?;
        let event = events::next_event()?;
        let size = terminal.size()?;
        handle_app_event(&mut app, event, Rect::new(0, 0, size.width, size.height));
    }
    Ok(())
}

/// Routes one event to whichever layer has focus: an open alert, then the
/// variable modal, then the prompt picker, then the input itself.
fn handle_app_event(app: &mut App, event: AppEvent, screen: Rect) {
    match event {
        AppEvent::Tick => {
            app.on_tick();
            return;
        }
        AppEvent::Quit => {
            app.quit();
            return;
        }
        _ => {}
    }

    if app.alert().is_some() {
        if matches!(event, AppEvent::Submit | AppEvent::Escape) {
            app.dismiss_alert();
        }
        return;
    }

    if app.is_variable_modal_open() {
        match event {
            AppEvent::InputChar(c) => app.variable_modal_input_char(c),
            AppEvent::Backspace => app.variable_modal_backspace(),
            AppEvent::NextItem | AppEvent::MoveDown => app.variable_modal_next_field(),
            AppEvent::PrevItem | AppEvent::MoveUp => app.variable_modal_prev_field(),
            AppEvent::Submit => app.submit_variable_modal(),
            AppEvent::Escape => app.close_variable_modal(),
            _ => {}
        }
        return;
    }

    if app.is_prompt_picker_active() {
        match event {
            AppEvent::MoveDown => return app.prompt_picker_move_down(),
            AppEvent::MoveUp => return app.prompt_picker_move_up(),
            AppEvent::NextItem => return app.prompt_picker_cycle(),
            AppEvent::Submit => return app.select_active_prompt(),
            AppEvent::Escape => return app.close_prompt_picker(),
            _ => app.prompt_picker_reset_active(),
        }
    }

    let width = ui::chat_input_text_width(screen);
    match event {
        AppEvent::MoveUp => app.move_cursor_up(width),
        AppEvent::MoveDown => app.move_cursor_down(width),
        AppEvent::CursorLeft => app.move_cursor_left(),
        AppEvent::CursorRight => app.move_cursor_right(),
        AppEvent::ScrollChatUp | AppEvent::MouseScrollUp => app.scroll_chat_up(),
        AppEvent::ScrollChatDown | AppEvent::MouseScrollDown => {
            let max_scroll = ui::chat_max_scroll(screen, app);
            app.scroll_chat_down(max_scroll);
        }
        AppEvent::InputChar(c) => app.input_char(c),
        AppEvent::Newline => app.insert_newline(),
        AppEvent::Backspace => app.backspace_input(),
        AppEvent::Submit => {
            if let Some(message) = app.submit_chat_message() {
                tracing::info!(chars = message.chars().count(), "message sent");
                let max_scroll = ui::chat_max_scroll(screen, app);
                app.scroll_chat_to_bottom(max_scroll);
            }
        }
        AppEvent::Escape
        | AppEvent::NextItem
        | AppEvent::PrevItem
        | AppEvent::Tick
        | AppEvent::Quit => {}
    }
}

#[cfg(test)]
#[path = "../tests/unit/main_tests.rs"]
mod tests;
