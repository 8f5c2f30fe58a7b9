use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, HomeField, InputMode, Screen};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global quit, any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.screen == Screen::Splash {
        // Any key skips the splash
        app.dismiss_splash();
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match app.screen {
        Screen::Chat => handle_chat_normal(app, key),
        Screen::Home => handle_home_normal(app, key),
        Screen::Splash => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match app.screen {
        Screen::Chat => handle_chat_editing(app, key),
        Screen::Home => handle_home_editing(app, key),
        Screen::Splash => {}
    }
}

fn handle_chat_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('i') | KeyCode::Char('/') => {
            app.input_mode = InputMode::Editing;
        }

        KeyCode::Char('r') => app.chat.toggle_recording(),

        // Chat log scrolling
        KeyCode::Char('j') | KeyCode::Down => app.chat_scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.chat_scroll_up(),
        KeyCode::Char('g') => app.chat_scroll = 0,
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),

        KeyCode::Tab => {
            app.screen = Screen::Home;
            app.fix_todo_selection();
        }

        _ => {}
    }
}

fn handle_chat_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            // The send affordance is disabled while a reply is pending; the
            // controller itself would accept the re-submission.
            if !app.chat.is_awaiting_response() {
                let draft = app.chat.draft_input().to_string();
                if app.chat.submit_message(&draft) {
                    app.input_cursor = 0;
                    app.scroll_chat_to_bottom();
                }
            }
        }
        KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.chat.toggle_recording();
        }
        KeyCode::Tab => {
            // Screen switching works from either input mode.
            app.input_mode = InputMode::Normal;
            app.screen = Screen::Home;
            app.fix_todo_selection();
        }
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let idx = app.input_cursor;
                remove_draft_char(app, idx);
            }
        }
        KeyCode::Delete => {
            let char_count = app.chat.draft_input().chars().count();
            if app.input_cursor < char_count {
                let idx = app.input_cursor;
                remove_draft_char(app, idx);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.chat.draft_input().chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.chat.draft_input().chars().count();
        }
        KeyCode::Char(c) => {
            insert_draft_char(app, c);
        }
        _ => {}
    }
}

fn insert_draft_char(app: &mut App, c: char) {
    let mut draft = app.chat.draft_input().to_string();
    let byte_pos = char_to_byte_index(&draft, app.input_cursor);
    draft.insert(byte_pos, c);
    app.chat.set_draft_input(draft);
    // The controller clamps to the character budget; never leave the cursor
    // past the end.
    let char_count = app.chat.draft_input().chars().count();
    app.input_cursor = (app.input_cursor + 1).min(char_count);
}

fn remove_draft_char(app: &mut App, char_idx: usize) {
    let mut draft = app.chat.draft_input().to_string();
    let byte_pos = char_to_byte_index(&draft, char_idx);
    if byte_pos < draft.len() {
        draft.remove(byte_pos);
        app.chat.set_draft_input(draft);
    }
}

fn handle_home_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Tab => app.screen = Screen::Chat,

        // Counter
        KeyCode::Char('+') | KeyCode::Char('=') => app.home.increment(),
        KeyCode::Char('-') => app.home.decrement(),
        KeyCode::Char('0') => app.home.reset_count(),

        // Text fields
        KeyCode::Char('n') => {
            app.home_field = HomeField::Name;
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Char('a') => {
            app.home_field = HomeField::Todo;
            app.input_mode = InputMode::Editing;
        }

        // Todo list
        KeyCode::Char('j') | KeyCode::Down => app.todo_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.todo_nav_up(),
        KeyCode::Char(' ') | KeyCode::Enter => {
            if let Some(id) = app.selected_todo_id() {
                app.home.toggle_todo(id);
            }
        }
        KeyCode::Char('d') => {
            if let Some(id) = app.selected_todo_id() {
                app.home.delete_todo(id);
                app.fix_todo_selection();
            }
        }

        _ => {}
    }
}

fn handle_home_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Tab => {
            app.input_mode = InputMode::Normal;
            app.screen = Screen::Chat;
        }
        KeyCode::Enter => match app.home_field {
            HomeField::Name => {
                app.input_mode = InputMode::Normal;
            }
            HomeField::Todo => {
                // Commit and keep editing, so several todos can be entered
                // in a row.
                if app.home.add_todo() {
                    app.fix_todo_selection();
                }
            }
        },
        KeyCode::Backspace => {
            match app.home_field {
                HomeField::Name => app.home.name.pop(),
                HomeField::Todo => app.home.new_todo.pop(),
            };
        }
        KeyCode::Char(c) => match app.home_field {
            HomeField::Name => app.home.name.push(c),
            HomeField::Todo => app.home.new_todo.push(c),
        },
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => match app.screen {
            Screen::Chat => {
                app.chat_scroll_down();
                app.chat_scroll_down();
                app.chat_scroll_down();
            }
            Screen::Home => app.todo_nav_down(),
            Screen::Splash => {}
        },
        MouseEventKind::ScrollUp => match app.screen {
            Screen::Chat => {
                app.chat_scroll_up();
                app.chat_scroll_up();
                app.chat_scroll_up();
            }
            Screen::Home => app.todo_nav_up(),
            Screen::Splash => {}
        },
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn chat_app() -> App {
        let mut app = App::new(Config::default(), Some(3));
        app.dismiss_splash();
        app
    }

    #[tokio::test(start_paused = true)]
    async fn typing_edits_the_draft_through_the_controller() {
        let mut app = chat_app();
        for c in "beans".chars() {
            handle_key(&mut app, key(KeyCode::Char(c)));
        }
        assert_eq!(app.chat.draft_input(), "beans");
        assert_eq!(app.input_cursor, 5);

        handle_key(&mut app, key(KeyCode::Left));
        handle_key(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.chat.draft_input(), "beas");
        assert_eq!(app.input_cursor, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn enter_submits_once_and_is_gated_while_awaiting() {
        let mut app = chat_app();
        for c in "what about millet?".chars() {
            handle_key(&mut app, key(KeyCode::Char(c)));
        }
        handle_key(&mut app, key(KeyCode::Enter));
        assert_eq!(app.chat.messages().len(), 1);
        assert_eq!(app.chat.draft_input(), "");

        // Send is disabled while the reply is pending.
        for c in "again".chars() {
            handle_key(&mut app, key(KeyCode::Char(c)));
        }
        handle_key(&mut app, key(KeyCode::Enter));
        assert_eq!(app.chat.messages().len(), 1);
        assert_eq!(app.chat.draft_input(), "again");
    }

    #[tokio::test(start_paused = true)]
    async fn cursor_stops_at_the_character_budget() {
        let config = Config {
            max_input_length: 3,
            ..Config::default()
        };
        let mut app = App::new(config, Some(3));
        app.dismiss_splash();

        for c in "abcdef".chars() {
            handle_key(&mut app, key(KeyCode::Char(c)));
        }
        assert_eq!(app.chat.draft_input(), "abc");
        assert_eq!(app.input_cursor, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn home_keys_drive_counter_and_todos() {
        let mut app = chat_app();
        handle_key(&mut app, key(KeyCode::Tab));
        assert_eq!(app.screen, Screen::Home);

        handle_key(&mut app, key(KeyCode::Char('+')));
        handle_key(&mut app, key(KeyCode::Char('+')));
        handle_key(&mut app, key(KeyCode::Char('-')));
        assert_eq!(app.home.count, 1);

        handle_key(&mut app, key(KeyCode::Char('a')));
        for c in "mulch".chars() {
            handle_key(&mut app, key(KeyCode::Char(c)));
        }
        handle_key(&mut app, key(KeyCode::Enter));
        handle_key(&mut app, key(KeyCode::Esc));
        assert_eq!(app.home.todos().len(), 1);
        assert_eq!(app.home.todos()[0].text, "mulch");

        handle_key(&mut app, key(KeyCode::Char(' ')));
        assert!(app.home.todos()[0].completed);
        handle_key(&mut app, key(KeyCode::Char('d')));
        assert!(app.home.todos().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn tab_switches_screens_even_while_editing() {
        let mut app = chat_app();
        // The chat opens in editing mode after the splash.
        assert_eq!(app.input_mode, InputMode::Editing);

        handle_key(&mut app, key(KeyCode::Tab));
        assert_eq!(app.screen, Screen::Home);
        assert_eq!(app.input_mode, InputMode::Normal);

        // And back, even from a home text field.
        handle_key(&mut app, key(KeyCode::Char('a')));
        assert_eq!(app.input_mode, InputMode::Editing);
        handle_key(&mut app, key(KeyCode::Tab));
        assert_eq!(app.screen, Screen::Chat);
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[tokio::test(start_paused = true)]
    async fn any_key_skips_the_splash() {
        let mut app = App::new(Config::default(), None);
        assert_eq!(app.screen, Screen::Splash);
        handle_key(&mut app, key(KeyCode::Char('x')));
        assert_eq!(app.screen, Screen::Chat);
    }
}
