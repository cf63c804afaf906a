use crate::commands::help_text;
use crate::logic::{Logic, LogicError};
use crate::model::{JobApplication, Status};
use crate::storage::ApplicationStorage;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::ListState;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

const HISTORY_LIMIT: usize = 100;

pub fn run<S: ApplicationStorage>(logic: Logic<S>, warning: Option<String>) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(logic, warning);
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

struct App<S: ApplicationStorage> {
    logic: Logic<S>,
    input: FieldValue,
    history: Vec<String>,
    history_cursor: Option<usize>,
    selected: usize,
    scroll_offset: usize,
    last_save: Option<Instant>,
    feedback: Feedback,
    mode: Mode,
}

enum Mode {
    Normal,
    Help,
}

#[derive(Clone, PartialEq, Eq)]
enum Feedback {
    Info(String),
    Error(String),
}

#[derive(Clone, Default)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl FieldValue {
    fn set(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor = self.value.len();
    }

    fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.value)
    }

    fn move_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor = prev_grapheme(self.cursor, &self.value);
    }

    fn move_right(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        self.cursor = next_grapheme(self.cursor, &self.value);
    }

    fn move_home(&mut self) {
        self.cursor = 0;
    }

    fn move_end(&mut self) {
        self.cursor = self.value.len();
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_grapheme(self.cursor, &self.value);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn insert_str(&mut self, text: &str) {
        self.value.insert_str(self.cursor, text);
        self.cursor += text.len();
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }
}

impl<S: ApplicationStorage> App<S> {
    fn new(logic: Logic<S>, warning: Option<String>) -> Self {
        let feedback = match warning {
            Some(message) => Feedback::Error(message),
            None => Feedback::Info(format!(
                "Loaded {} applications from {}. Type 'help' for commands.",
                logic.book().len(),
                logic.storage().path().display()
            )),
        };
        App {
            logic,
            input: FieldValue::default(),
            history: Vec::new(),
            history_cursor: None,
            selected: 0,
            scroll_offset: 0,
            last_save: None,
            feedback,
            mode: Mode::Normal,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }
        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Help => {
                if matches!(
                    key.code,
                    KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')
                ) {
                    self.mode = Mode::Normal;
                }
                false
            }
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Enter => return self.submit(),
            KeyCode::Esc => {
                self.input.take();
                self.history_cursor = None;
            }
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Left => self.input.move_left(),
            KeyCode::Right => self.input.move_right(),
            KeyCode::Home => self.input.move_home(),
            KeyCode::End => self.input.move_end(),
            KeyCode::Up => self.recall_previous(),
            KeyCode::Down => self.recall_next(),
            KeyCode::PageUp => self.select_previous(),
            KeyCode::PageDown => self.select_next(),
            KeyCode::Tab => {
                if self.logic.book().view_len() > 0 {
                    self.input.insert_str(&(self.selected + 1).to_string());
                }
            }
            KeyCode::Char(ch) => self.input.insert_char(ch),
            _ => {}
        }
        false
    }

    fn submit(&mut self) -> bool {
        let line = self.input.take();
        self.history_cursor = None;
        if line.trim().is_empty() {
            return false;
        }
        push_history(&mut self.history, &line);

        let mut should_exit = false;
        match self.logic.execute(&line) {
            Ok(result) => {
                if result.should_persist {
                    self.last_save = Some(Instant::now());
                }
                if result.should_show_help {
                    self.mode = Mode::Help;
                }
                should_exit = result.should_exit;
                self.feedback = Feedback::Info(result.message);
            }
            Err(err) => {
                let mut message = err.to_string();
                if matches!(&err, LogicError::Persist { result, .. } if result.should_exit) {
                    message.push_str("\nPress Ctrl+C to quit without saving.");
                }
                self.feedback = Feedback::Error(message);
            }
        }
        self.clamp_selection();
        should_exit
    }

    fn recall_previous(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let idx = match self.history_cursor {
            None => self.history.len() - 1,
            Some(idx) => idx.saturating_sub(1),
        };
        self.history_cursor = Some(idx);
        self.input.set(&self.history[idx]);
    }

    fn recall_next(&mut self) {
        match self.history_cursor {
            Some(idx) if idx + 1 < self.history.len() => {
                self.history_cursor = Some(idx + 1);
                self.input.set(&self.history[idx + 1]);
            }
            Some(_) => {
                self.history_cursor = None;
                self.input.take();
            }
            None => {}
        }
    }

    fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn select_next(&mut self) {
        let len = self.logic.book().view_len();
        if self.selected + 1 < len {
            self.selected += 1;
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.logic.book().view_len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(5),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);
        self.draw_applications(f, layout[1]);
        self.draw_feedback(f, layout[2]);
        self.draw_command_box(f, layout[3]);
        self.draw_footer(f, layout[4]);

        if let Mode::Help = self.mode {
            self.draw_help(f);
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let book = self.logic.book();
        let saved = self
            .last_save
            .map(|at| format!("saved {}", format_elapsed(at)))
            .unwrap_or_else(|| "not saved this session".to_string());
        let title = Line::from(vec![
            Span::styled(
                "hustlehub ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("{}", self.logic.storage().path().display()),
                Style::default().fg(Color::DarkGray),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("{} / {} shown", book.view_len(), book.len()),
                Style::default().fg(Color::Green),
            ),
            Span::raw("  •  "),
            Span::styled(
                if book.filter().is_show_all() {
                    "no filter".to_string()
                } else {
                    format!("filter {}", book.filter())
                },
                Style::default().fg(Color::Magenta),
            ),
            Span::raw("  •  "),
            Span::styled(saved, Style::default().fg(Color::Gray)),
        ]);

        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(title)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_applications(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let view = self.logic.view();
        let block = Block::default()
            .title(Span::styled(
                "Applications",
                Style::default()
                    .fg(Color::LightCyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::LightCyan))
            .style(Style::default().bg(Color::Rgb(16, 18, 24)));

        if view.is_empty() {
            let message = if self.logic.book().is_empty() {
                "No applications yet. Try: add n/Google r/SWE s/APPLIED d/2025-12-31"
            } else {
                "No applications match the current filter. Use 'filter none' to show all."
            };
            let empty = Paragraph::new(message)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Gray))
                .block(block);
            f.render_widget(empty, area);
            return;
        }

        let width = area.width.saturating_sub(2) as usize;
        let items = view
            .iter()
            .enumerate()
            .map(|(idx, application)| application_item(idx + 1, application, width))
            .collect::<Vec<_>>();
        let viewport = area.height.saturating_sub(2) as usize;
        self.scroll_offset = adjust_offset(
            self.selected,
            self.scroll_offset,
            viewport,
            1,
            items.len(),
        );
        let mut state = ListState::default();
        state.select(Some(self.selected));
        *state.offset_mut() = self.scroll_offset;

        let list = List::new(items).block(block).highlight_style(
            Style::default()
                .bg(Color::Rgb(252, 214, 112))
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        );
        f.render_stateful_widget(list, area, &mut state);
    }

    fn draw_feedback(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let (text, color, title) = match &self.feedback {
            Feedback::Info(text) => (text.as_str(), Color::White, "Result"),
            Feedback::Error(text) => (text.as_str(), Color::LightRed, "Error"),
        };
        let lines = text.lines().map(|l| Line::from(l.to_string())).collect::<Vec<_>>();
        let paragraph = Paragraph::new(lines)
            .style(Style::default().fg(color))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .title(title),
            );
        f.render_widget(paragraph, area);
    }

    fn draw_command_box(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let input = Paragraph::new(Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::LightCyan)),
            Span::raw(self.input.with_caret()),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title("Command"),
        );
        f.render_widget(input, area);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let key = Style::default().fg(Color::LightCyan);
        let line = Line::from(vec![
            Span::styled("Enter", key),
            Span::raw(" run  "),
            Span::styled("↑↓", key),
            Span::raw(" history  "),
            Span::styled("PgUp/PgDn", key),
            Span::raw(" select  "),
            Span::styled("Tab", key),
            Span::raw(" insert index  "),
            Span::styled("Esc", key),
            Span::raw(" clear  "),
            Span::styled("Ctrl+C", key),
            Span::raw(" quit"),
        ]);
        f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
    }

    fn draw_help(&self, f: &mut ratatui::Frame<'_>) {
        let area = centered_rect(80, 80, f.size());
        let mut lines = help_text()
            .lines()
            .map(|l| {
                if l.starts_with(|c: char| c.is_ascii_lowercase()) && l.contains(':') {
                    Line::from(Span::styled(
                        l.to_string(),
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(l.to_string())
                }
            })
            .collect::<Vec<_>>();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Esc / Enter / q to close",
            Style::default().fg(Color::Gray),
        )));
        let dialog = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(Span::styled(
                        "Help",
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .wrap(Wrap { trim: false });

        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

/// Appends to the history, skipping an immediate repeat and dropping the oldest
/// entry past the limit.
fn push_history(history: &mut Vec<String>, line: &str) {
    if history.last().map(String::as_str) == Some(line) {
        return;
    }
    history.push(line.to_string());
    if history.len() > HISTORY_LIMIT {
        history.remove(0);
    }
}

fn adjust_offset(
    selected: usize,
    current_offset: usize,
    viewport: usize,
    scrolloff: usize,
    len: usize,
) -> usize {
    if viewport == 0 || len == 0 {
        return 0;
    }
    let max_offset = len.saturating_sub(viewport);
    let margin = scrolloff.min(viewport.saturating_sub(1));
    let mut offset = current_offset.min(max_offset);
    if selected < offset.saturating_add(margin) {
        offset = selected.saturating_sub(margin);
    } else {
        let upper = offset
            .saturating_add(viewport.saturating_sub(1))
            .saturating_sub(margin);
        if selected > upper {
            offset = selected.saturating_add(margin + 1).saturating_sub(viewport);
        }
    }
    offset.min(max_offset)
}

fn prev_grapheme(cursor: usize, text: &str) -> usize {
    if cursor == 0 {
        return 0;
    }
    let mut prev = 0;
    for (idx, _) in text.char_indices() {
        if idx >= cursor {
            break;
        }
        prev = idx;
    }
    prev
}

fn next_grapheme(cursor: usize, text: &str) -> usize {
    for (idx, ch) in text.char_indices() {
        if idx > cursor {
            return idx;
        }
        if idx == cursor {
            return cursor + ch.len_utf8();
        }
    }
    text.len()
}

fn truncate_text(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out.chars().take(max).collect()
}

fn status_color(status: Status) -> Color {
    match status {
        Status::Applied => Color::LightCyan,
        Status::InProgress => Color::Yellow,
        Status::Rejected => Color::LightRed,
    }
}

fn application_item(number: usize, application: &JobApplication, width: usize) -> ListItem<'static> {
    let name_width = (width / 3).max(10);
    let mut spans = vec![
        Span::styled(format!("{:>3}. ", number), Style::default().fg(Color::DarkGray)),
        Span::styled(
            truncate_text(application.company_name(), name_width),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            truncate_text(application.role(), name_width),
            Style::default().fg(Color::Gray),
        ),
        Span::raw("  "),
        Span::styled(
            application.status().name(),
            Style::default().fg(status_color(application.status())),
        ),
        Span::raw("  "),
        Span::styled(
            format!("due {}", application.format_deadline()),
            Style::default().fg(Color::LightRed),
        ),
    ];
    if !application.tags().is_empty() {
        let tags = application
            .tags()
            .iter()
            .map(|tag| tag.to_string())
            .collect::<String>();
        spans.push(Span::raw("  "));
        spans.push(Span::styled(tags, Style::default().fg(Color::LightMagenta)));
    }
    ListItem::new(Line::from(spans))
}

fn format_elapsed(last: Instant) -> String {
    let secs = last.elapsed().as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}
