use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::widgets::ListState;

use crate::chat::{ChatUpdate, Conversation};
use crate::config::Config;
use crate::home::Home;

/// Ticks (300ms each) the splash screen stays up before the chat opens.
pub const SPLASH_TICKS: u8 = 8;

/// Ticks a footer notice stays visible.
const NOTICE_TICKS: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Splash,
    Chat,
    Home,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Which text field editing targets on the home screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeField {
    Name,
    Todo,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,

    // Chat screen
    pub chat: Conversation,
    pub input_cursor: usize, // cursor position in the draft, in chars
    pub chat_scroll: u16,
    pub chat_height: u16, // inner chat area, for scroll calculations
    pub chat_width: u16,  // inner chat area, for wrap calculations

    // Home screen
    pub home: Home,
    pub todo_state: ListState,
    pub home_field: HomeField,

    // Splash countdown
    splash_ticks: u8,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Transient footer notice
    pub notice: Option<String>,
    notice_ticks: u8,
}

impl App {
    pub fn new(config: Config, seed: Option<u64>) -> Self {
        let chat = match seed {
            Some(seed) => Conversation::with_rng(config, StdRng::seed_from_u64(seed)),
            None => Conversation::new(config),
        };

        Self {
            should_quit: false,
            screen: Screen::Splash,
            input_mode: InputMode::Normal,

            chat,
            input_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            home: Home::new(),
            todo_state: ListState::default(),
            home_field: HomeField::Todo,

            splash_ticks: SPLASH_TICKS,

            animation_frame: 0,

            notice: None,
            notice_ticks: 0,
        }
    }

    /// Called on every timer tick: advances the splash countdown and the
    /// spinner, expires notices, and drains the controller's finished timers.
    pub fn tick(&mut self) {
        if self.screen == Screen::Splash {
            self.animation_frame = (self.animation_frame + 1) % 3;
            self.splash_ticks = self.splash_ticks.saturating_sub(1);
            if self.splash_ticks == 0 {
                self.dismiss_splash();
            }
        } else if self.chat.is_awaiting_response() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }

        if self.notice_ticks > 0 {
            self.notice_ticks -= 1;
            if self.notice_ticks == 0 {
                self.notice = None;
            }
        }

        for update in self.chat.poll() {
            match update {
                ChatUpdate::ReplyDelivered => {
                    self.scroll_chat_to_bottom();
                }
                ChatUpdate::TranscriptReady => {
                    // The auto-stop overwrote the draft; park the cursor at
                    // the end of the transcript.
                    self.input_cursor = self.chat.draft_input().chars().count();
                    self.set_notice("Voice note transcribed into the input box");
                }
            }
        }
    }

    pub fn dismiss_splash(&mut self) {
        if self.screen == Screen::Splash {
            self.screen = Screen::Chat;
            self.input_mode = InputMode::Editing;
        }
    }

    pub fn set_notice(&mut self, text: &str) {
        self.notice = Some(text.to_string());
        self.notice_ticks = NOTICE_TICKS;
    }

    // Chat log scrolling
    pub fn chat_scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn chat_scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    /// Scroll the chat log so the newest message (and the typing indicator,
    /// if showing) is visible.
    pub fn scroll_chat_to_bottom(&mut self) {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in self.chat.messages() {
            total_lines += 1; // Sender line ("You:" or "Agronomist:")
            for line in msg.text.lines() {
                // Character count, not byte length, for UTF-8 text
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1;
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // Blank line after message
        }

        if self.chat.is_awaiting_response() {
            total_lines += 2; // Sender line + "Thinking..."
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        } else {
            self.chat_scroll = 0;
        }
    }

    // Todo list navigation
    pub fn todo_nav_down(&mut self) {
        let len = self.home.todos().len();
        if len > 0 {
            let i = self.todo_state.selected().unwrap_or(0);
            self.todo_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn todo_nav_up(&mut self) {
        let i = self.todo_state.selected().unwrap_or(0);
        self.todo_state.select(Some(i.saturating_sub(1)));
    }

    pub fn selected_todo_id(&self) -> Option<u64> {
        self.todo_state
            .selected()
            .and_then(|i| self.home.todos().get(i))
            .map(|t| t.id)
    }

    /// Keep the todo selection valid after a deletion.
    pub fn fix_todo_selection(&mut self) {
        let len = self.home.todos().len();
        match self.todo_state.selected() {
            Some(_) if len == 0 => self.todo_state.select(None),
            Some(i) if i >= len => self.todo_state.select(Some(len - 1)),
            None if len > 0 => self.todo_state.select(Some(0)),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_app() -> App {
        let config = Config {
            response_corpus: vec!["Try maize.".to_string()],
            ..Config::default()
        };
        App::new(config, Some(1))
    }

    #[tokio::test(start_paused = true)]
    async fn splash_advances_to_chat_after_countdown() {
        let mut app = test_app();
        assert_eq!(app.screen, Screen::Splash);

        for _ in 0..SPLASH_TICKS {
            app.tick();
        }
        assert_eq!(app.screen, Screen::Chat);
        assert_eq!(app.input_mode, InputMode::Editing);
    }

    #[tokio::test(start_paused = true)]
    async fn tick_delivers_finished_replies() {
        let mut app = test_app();
        app.dismiss_splash();
        app.chat.submit_message("clay soil");
        assert!(app.chat.is_awaiting_response());

        tokio::time::sleep(Duration::from_millis(2100)).await;
        app.tick();

        assert!(!app.chat.is_awaiting_response());
        assert_eq!(app.chat.messages().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn transcript_moves_cursor_and_raises_notice() {
        let mut app = test_app();
        app.dismiss_splash();
        app.chat.toggle_recording();

        tokio::time::sleep(Duration::from_millis(3100)).await;
        app.tick();

        assert!(!app.chat.is_recording());
        assert_eq!(app.input_cursor, app.chat.draft_input().chars().count());
        assert!(app.notice.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn scroll_lands_on_the_newest_message() {
        let mut app = test_app();
        app.dismiss_splash();
        app.chat_height = 4;
        app.chat_width = 40;

        for i in 0..5 {
            app.chat.submit_message(&format!("question {i}"));
        }
        app.scroll_chat_to_bottom();
        assert!(app.chat_scroll > 0);

        // Few messages and a tall viewport: no scrolling needed.
        app.chat_height = 100;
        app.scroll_chat_to_bottom();
        assert_eq!(app.chat_scroll, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn todo_selection_survives_deletion() {
        let mut app = test_app();
        for text in ["a", "b"] {
            app.home.new_todo = text.to_string();
            app.home.add_todo();
        }
        app.fix_todo_selection();
        app.todo_nav_down();
        assert_eq!(app.todo_state.selected(), Some(1));

        let id = app.selected_todo_id().unwrap();
        app.home.delete_todo(id);
        app.fix_todo_selection();
        assert_eq!(app.todo_state.selected(), Some(0));

        let id = app.selected_todo_id().unwrap();
        app.home.delete_todo(id);
        app.fix_todo_selection();
        assert_eq!(app.todo_state.selected(), None);
    }
}
