use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

use crate::app::{App, HomeField, InputMode, Screen};
use crate::chat::Sender;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    if app.screen == Screen::Splash {
        render_splash(app, frame, area);
        return;
    }

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen {
        Screen::Chat => render_chat_screen(app, frame, body_area),
        Screen::Home => render_home_screen(app, frame, body_area),
        Screen::Splash => {}
    }

    render_footer(app, frame, footer_area);
}

fn render_splash(app: &App, frame: &mut Frame, area: Rect) {
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage(35),
        Constraint::Length(6),
        Constraint::Percentage(35),
    ])
    .areas(area);

    let dots = ".".repeat((app.animation_frame as usize) + 1);
    let lines = vec![
        Line::from(Span::styled(
            "CropChat",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::styled(
            "Crop recommendations for your field",
            Style::default().fg(Color::DarkGray),
        )),
        Line::default(),
        Line::from(Span::styled(
            format!("Loading{dots}"),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
    ];

    let splash = Paragraph::new(Text::from(lines)).centered();
    frame.render_widget(splash, middle);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let recording_indicator = if app.chat.is_recording() {
        Span::styled(" ● REC ", Style::default().fg(Color::Red).bold())
    } else {
        Span::raw("")
    };

    let title = Line::from(vec![
        Span::styled(" CropChat ", Style::default().fg(Color::Green).bold()),
        recording_indicator,
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // A transient notice takes the whole footer while it lasts.
    if let Some(notice) = &app.notice {
        let line = Line::from(Span::styled(
            format!(" {notice} "),
            Style::default().bg(Color::Green).fg(Color::Black),
        ));
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.screen {
        Screen::Chat => " CHAT ",
        Screen::Home => " HOME ",
        Screen::Splash => "",
    };

    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints: Vec<Span> = match (app.screen, app.input_mode) {
        (Screen::Chat, InputMode::Normal) => vec![
            Span::styled(" i ", key_style),
            Span::styled(" type ", label_style),
            Span::styled(" r ", key_style),
            Span::styled(" voice ", label_style),
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" home ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
        (Screen::Chat, InputMode::Editing) => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" ^R ", key_style),
            Span::styled(" voice ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" done ", label_style),
        ],
        (Screen::Home, InputMode::Normal) => vec![
            Span::styled(" +/- ", key_style),
            Span::styled(" count ", label_style),
            Span::styled(" n ", key_style),
            Span::styled(" name ", label_style),
            Span::styled(" a ", key_style),
            Span::styled(" todo ", label_style),
            Span::styled(" Space ", key_style),
            Span::styled(" toggle ", label_style),
            Span::styled(" d ", key_style),
            Span::styled(" delete ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" chat ", label_style),
        ],
        (Screen::Home, InputMode::Editing) => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" commit ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" done ", label_style),
        ],
        (Screen::Splash, _) => Vec::new(),
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    spans.extend(hints);
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Inner size minus borders, for wrap and scroll calculations
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Ask about your field ");

    let chat_text = if app.chat.messages().is_empty() && !app.chat.is_awaiting_response() {
        Text::from(Span::styled(
            "Describe your soil, rainfall and season to get a crop suggestion...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in app.chat.messages() {
            match msg.sender {
                Sender::User => {
                    lines.push(Line::from(Span::styled(
                        "You:",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )));
                }
                Sender::Assistant => {
                    lines.push(Line::from(Span::styled(
                        "Agronomist:",
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    )));
                }
            }
            for line in msg.text.lines() {
                lines.push(Line::from(line.to_string()));
            }
            lines.push(Line::default());
        }

        if app.chat.is_awaiting_response() {
            lines.push(Line::from(Span::styled(
                "Agronomist:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{dots}"),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, chat_area);

    render_chat_input(app, frame, input_area);
}

fn render_chat_input(app: &App, frame: &mut Frame, input_area: Rect) {
    let (border_color, title) = if app.chat.is_recording() {
        (Color::Red, " Recording... (r to stop) ".to_string())
    } else {
        let used = app.chat.draft_input().chars().count();
        let budget = app.chat.max_input_length();
        (
            if app.input_mode == InputMode::Editing {
                Color::Yellow
            } else {
                Color::DarkGray
            },
            format!(" Message ({used}/{budget}) "),
        )
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scroll keeps the cursor visible in a one-line input
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .chat
        .draft_input()
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, input_area);

    if app.input_mode == InputMode::Editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }
}

fn render_home_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [greeting_area, counter_area, todo_input_area, todo_area] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(area);

    // Greeting
    let editing_name = app.input_mode == InputMode::Editing && app.home_field == HomeField::Name;
    let greeting_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing_name { Color::Yellow } else { Color::DarkGray }))
        .title(" Welcome (n to edit name) ");

    let greeting_line = if app.home.name.is_empty() {
        Line::from(Span::styled(
            "Enter your name",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(format!("Hello, {}!", app.home.name))
    };
    let greeting = Paragraph::new(Text::from(vec![
        Line::from(app.home.name.as_str()),
        greeting_line,
    ]))
    .block(greeting_block);
    frame.render_widget(greeting, greeting_area);

    // Counter
    let counter_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Counter (+/-/0) ");
    let counter = Paragraph::new(Line::from(Span::styled(
        app.home.count.to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    )))
    .block(counter_block)
    .centered();
    frame.render_widget(counter, counter_area);

    // Todo input
    let editing_todo = app.input_mode == InputMode::Editing && app.home_field == HomeField::Todo;
    let todo_input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing_todo { Color::Yellow } else { Color::DarkGray }))
        .title(" Add a todo (a) ");
    let todo_input = Paragraph::new(app.home.new_todo.as_str())
        .style(Style::default().fg(Color::Cyan))
        .block(todo_input_block);
    frame.render_widget(todo_input, todo_input_area);

    if editing_name {
        let cursor_x = app.home.name.chars().count() as u16;
        frame.set_cursor_position((greeting_area.x + cursor_x + 1, greeting_area.y + 1));
    } else if editing_todo {
        let cursor_x = app.home.new_todo.chars().count() as u16;
        frame.set_cursor_position((todo_input_area.x + cursor_x + 1, todo_input_area.y + 1));
    }

    // Todo list
    let todo_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Todos ");

    if app.home.todos().is_empty() {
        let empty = Paragraph::new(Span::styled(
            "No todos yet. Add one above!",
            Style::default().fg(Color::DarkGray),
        ))
        .block(todo_block);
        frame.render_widget(empty, todo_area);
        return;
    }

    let items: Vec<ListItem> = app
        .home
        .todos()
        .iter()
        .map(|todo| {
            let marker = if todo.completed { "✓ " } else { "○ " };
            let style = if todo.completed {
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default()
            };
            ListItem::new(Span::styled(format!("{marker}{}", todo.text), style))
        })
        .collect();

    let list = List::new(items)
        .block(todo_block)
        .highlight_style(
            Style::default()
                .bg(Color::Green)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, todo_area, &mut app.todo_state);
}
