//! Kanban board interface.
//!
//! Tasks are laid out in one column per configured status (archived is
//! hidden). Cards move between columns through the board engine, so WIP
//! limits and claims apply exactly as on the command line; a refused move
//! is reported in the status bar. The board reloads itself whenever the
//! watcher reports a change on disk.

use std::io;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::board::{self, MoveOptions};
use crate::config::Config;
use crate::date::{format_age, format_instant, now_utc};
use crate::store;
use crate::task::Task;
use crate::tui::colors::{age_color, ACCENT, BLOCKED, CARD_BG, OVER_LIMIT};
use crate::watcher::{BoardWatcher, DEBOUNCE};

/// Main board application state
pub struct BoardApp {
    cfg: Config,
    tasks: Vec<Task>,
    read_warnings: usize,
    statuses: Vec<String>,   // Visible columns, in board order
    columns: Vec<Vec<usize>>, // Indices into `tasks`
    selected_column: usize,
    selected_card: usize,
    column_scroll_offsets: Vec<usize>,
    status_message: String,
    show_task_detail: bool,
    filter_active: bool,
    filter_text: String,
    reload_rx: Option<Receiver<()>>,
    _watcher: Option<BoardWatcher>,
}

impl BoardApp {
    /// Create the app for `cfg`, optionally watching the board for changes.
    pub fn new(cfg: Config, watch: bool) -> Self {
        let mut app = BoardApp {
            cfg,
            tasks: Vec::new(),
            read_warnings: 0,
            statuses: Vec::new(),
            columns: Vec::new(),
            selected_column: 0,
            selected_card: 0,
            column_scroll_offsets: Vec::new(),
            status_message: String::new(),
            show_task_detail: false,
            filter_active: false,
            filter_text: String::new(),
            reload_rx: None,
            _watcher: None,
        };

        if watch {
            let (tx, rx) = mpsc::channel();
            let paths = [app.cfg.tasks_path(), app.cfg.config_path()];
            match BoardWatcher::start(&paths, DEBOUNCE, move || {
                let _ = tx.send(());
            }) {
                Ok(watcher) => {
                    app._watcher = Some(watcher);
                    app.reload_rx = Some(rx);
                }
                Err(e) => app.set_status_message(format!("Live refresh unavailable: {e}")),
            }
        }

        app.reload();
        app
    }

    /// Re-read config and tasks, keeping the selected task selected.
    fn reload(&mut self) {
        let selected = self.selected_task().map(|t| t.id);

        match Config::load(self.cfg.dir()) {
            Ok(cfg) => self.cfg = cfg,
            Err(e) => self.set_status_message(format!("Error reloading config: {e}")),
        }
        match store::read_all_lenient(&self.cfg) {
            Ok((tasks, warnings)) => {
                self.tasks = tasks;
                self.read_warnings = warnings.len();
            }
            Err(e) => self.set_status_message(format!("Error reading tasks: {e}")),
        }

        self.statuses = self
            .cfg
            .statuses
            .iter()
            .filter(|s| !self.cfg.is_archived(&s.name))
            .map(|s| s.name.clone())
            .collect();
        self.update_columns();
        if let Some(id) = selected {
            self.select_task(id);
        }
    }

    /// Rebuild the columns from the task list and the current filter.
    fn update_columns(&mut self) {
        let filter = self.filter_text.to_lowercase();
        let mut columns: Vec<Vec<usize>> = vec![Vec::new(); self.statuses.len()];

        for (i, task) in self.tasks.iter().enumerate() {
            let Some(col) = self.statuses.iter().position(|s| *s == task.status) else {
                continue;
            };
            if !filter.is_empty() && !matches_filter(task, &filter) {
                continue;
            }
            columns[col].push(i);
        }
        for column in &mut columns {
            column.sort_by(|&a, &b| {
                let (a, b) = (&self.tasks[a], &self.tasks[b]);
                // Most urgent first.
                self.cfg
                    .priority_index(&b.priority)
                    .cmp(&self.cfg.priority_index(&a.priority))
                    .then(a.id.cmp(&b.id))
            });
        }

        self.column_scroll_offsets = vec![0; columns.len()];
        self.columns = columns;
        self.clamp_selection();
    }

    /// Ensure selected column and card indices are valid
    fn clamp_selection(&mut self) {
        if self.selected_column >= self.columns.len() {
            self.selected_column = 0;
        }
        let column_len = self.columns.get(self.selected_column).map_or(0, Vec::len);
        if column_len == 0 {
            self.selected_card = 0;
        } else if self.selected_card >= column_len {
            self.selected_card = column_len - 1;
        }
    }

    fn selected_task(&self) -> Option<&Task> {
        let index = *self.columns.get(self.selected_column)?.get(self.selected_card)?;
        self.tasks.get(index)
    }

    fn select_task(&mut self, id: u32) {
        for (col, cards) in self.columns.iter().enumerate() {
            if let Some(pos) = cards.iter().position(|&i| self.tasks[i].id == id) {
                self.selected_column = col;
                self.selected_card = pos;
                return;
            }
        }
        self.clamp_selection();
    }

    fn set_status_message(&mut self, msg: String) {
        self.status_message = msg;
    }

    fn clear_status_message(&mut self) {
        self.status_message.clear();
    }

    /// Move the selected card one column left or right.
    fn move_card(&mut self, forward: bool) {
        let Some(task) = self.selected_task() else {
            return;
        };
        let id = task.id;
        let target = if forward {
            self.selected_column + 1
        } else {
            match self.selected_column.checked_sub(1) {
                Some(col) => col,
                None => return,
            }
        };
        let Some(target) = self.statuses.get(target).cloned() else {
            return;
        };

        match board::move_task(&self.cfg, id, &MoveOptions::to(target), now_utc()) {
            Ok(outcome) => {
                let mut msg = format!("Moved #{id}: {} -> {}", outcome.from, outcome.task.status);
                if !outcome.warnings.is_empty() {
                    msg.push_str(&format!(" ({} warning(s))", outcome.warnings.len()));
                }
                self.reload();
                self.select_task(id);
                self.set_status_message(msg);
            }
            Err(e) => self.set_status_message(format!("Error [{}]: {e}", e.code())),
        }
    }

    /// Apply one key press. Returns true when the app should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.filter_active {
            match key.code {
                KeyCode::Esc => {
                    self.filter_active = false;
                    self.filter_text.clear();
                    self.update_columns();
                    self.clear_status_message();
                }
                KeyCode::Enter => {
                    self.filter_active = false;
                    if self.filter_text.is_empty() {
                        self.set_status_message("Filter cleared".to_string());
                    } else {
                        let shown: usize = self.columns.iter().map(Vec::len).sum();
                        self.set_status_message(format!("Filter: '{}' ({} tasks shown)", self.filter_text, shown));
                    }
                }
                KeyCode::Backspace => {
                    if self.filter_text.pop().is_some() {
                        self.update_columns();
                    }
                }
                KeyCode::Char(c) => {
                    self.filter_text.push(c);
                    self.update_columns();
                }
                _ => {}
            }
            return false;
        }

        if self.show_task_detail {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q')) {
                self.show_task_detail = false;
            }
            return false;
        }

        self.clear_status_message();
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Char('q') | KeyCode::Esc => return true,

            KeyCode::Enter => {
                self.show_task_detail = self.selected_task().is_some();
            }

            // Card movement between columns (check first, before regular navigation)
            KeyCode::Left if key.modifiers.contains(KeyModifiers::CONTROL) => self.move_card(false),
            KeyCode::Right if key.modifiers.contains(KeyModifiers::CONTROL) => self.move_card(true),
            KeyCode::Char('H') => self.move_card(false),
            KeyCode::Char('L') => self.move_card(true),

            KeyCode::Left | KeyCode::Char('h') => {
                if self.selected_column > 0 {
                    self.selected_column -= 1;
                    self.clamp_selection();
                }
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if self.selected_column + 1 < self.columns.len() {
                    self.selected_column += 1;
                    self.clamp_selection();
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_card = self.selected_card.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let column_len = self.columns.get(self.selected_column).map_or(0, Vec::len);
                if self.selected_card + 1 < column_len {
                    self.selected_card += 1;
                }
            }

            KeyCode::Char('/') => {
                self.filter_active = true;
            }
            KeyCode::Char('r') => {
                self.reload();
                self.set_status_message("Reloaded".to_string());
            }
            KeyCode::Char('?') => {
                self.set_status_message(
                    "Enter: Details | Ctrl+←/→ or H/L: Move card | /: Filter | r: Reload | q: Quit".to_string(),
                );
            }
            _ => {}
        }
        false
    }

    /// Handle keyboard input
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.handle_key(key));
                }
            }
        }
        Ok(false)
    }

    /// Drain pending watcher notifications, reloading once if any arrived.
    fn poll_reload(&mut self) {
        let Some(rx) = &self.reload_rx else {
            return;
        };
        let mut changed = false;
        while rx.try_recv().is_ok() {
            changed = true;
        }
        if changed {
            tracing::debug!("reloading board after change");
            self.reload();
        }
    }

    /// Main event loop
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            self.poll_reload();
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Board
                Constraint::Length(1), // Status bar
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_board(f, chunks[1]);
        self.render_status_bar(f, chunks[2]);

        if self.show_task_detail {
            self.render_task_detail_popup(f);
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let mut spans = vec![Span::styled(
            self.cfg.board.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )];
        if !self.cfg.board.description.is_empty() {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                self.cfg.board.description.clone(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ));
        }
        let header = Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header, area);
    }

    fn render_board(&mut self, f: &mut Frame, area: Rect) {
        let column_count = self.columns.len().max(1);
        let constraints: Vec<Constraint> = (0..column_count)
            .map(|_| Constraint::Ratio(1, column_count as u32))
            .collect();
        let columns_layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(area);

        let now = now_utc();
        for (i, &column_area) in columns_layout.iter().enumerate().take(self.columns.len()) {
            self.render_column(f, column_area, i, now);
        }
    }

    fn card_height(&self) -> usize {
        // Borders, id line, title lines, owner line.
        usize::from(self.cfg.tui.title_lines.clamp(1, 3)) + 4
    }

    fn render_column(&mut self, f: &mut Frame, area: Rect, column_index: usize, now: DateTime<Utc>) {
        let is_selected = column_index == self.selected_column;
        let status = &self.statuses[column_index];
        let count = self.columns[column_index].len();
        let limit = self.cfg.wip_limit(status);

        let title = if limit > 0 {
            format!(" {status} ({count}/{limit}) ")
        } else {
            format!(" {status} ({count}) ")
        };
        let mut border_style = if is_selected {
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        if limit > 0 && count >= limit as usize {
            border_style = border_style.fg(OVER_LIMIT);
        }

        let block = Block::default().borders(Borders::ALL).title(title).border_style(border_style);
        let inner = block.inner(area);
        f.render_widget(block, area);

        if count == 0 {
            return;
        }

        let card_height = self.card_height();
        let available_height = inner.height as usize;
        let visible_cards = (available_height / card_height).max(1);

        // Keep the selected card visible.
        let mut scroll_offset = self.column_scroll_offsets[column_index];
        if is_selected {
            if self.selected_card < scroll_offset {
                scroll_offset = self.selected_card;
            } else if self.selected_card >= scroll_offset + visible_cards {
                scroll_offset = self.selected_card + 1 - visible_cards;
            }
            self.column_scroll_offsets[column_index] = scroll_offset;
        }

        let mut current_y = 0;
        let mut rendered_cards = 0;
        for (card_index, &task_index) in self.columns[column_index].iter().enumerate().skip(scroll_offset) {
            if current_y + card_height > available_height {
                break;
            }
            let card_area = Rect {
                x: inner.x,
                y: inner.y + current_y as u16,
                width: inner.width,
                height: card_height as u16,
            };
            let selected = is_selected && card_index == self.selected_card;
            self.render_card(f, card_area, &self.tasks[task_index], selected, now);
            current_y += card_height;
            rendered_cards += 1;
        }

        if scroll_offset > 0 {
            let indicator = Paragraph::new(format!("▲ +{scroll_offset} above")).style(Style::default().fg(Color::Cyan));
            f.render_widget(indicator, Rect { height: 1, ..inner });
        }
        let remaining = count.saturating_sub(scroll_offset + rendered_cards);
        if remaining > 0 && inner.height > 0 {
            let indicator = Paragraph::new(format!("▼ +{remaining} below")).style(Style::default().fg(Color::Cyan));
            f.render_widget(
                indicator,
                Rect {
                    y: inner.y + inner.height - 1,
                    height: 1,
                    ..inner
                },
            );
        }
    }

    fn render_card(&self, f: &mut Frame, area: Rect, task: &Task, is_selected: bool, now: DateTime<Utc>) {
        let style = if is_selected {
            Style::default().bg(ACCENT).fg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            Style::default().bg(CARD_BG)
        };

        let mut first = vec![Span::raw(format!("#{} {}", task.id, task.priority))];
        if self.cfg.shows_duration(&task.status) {
            let age = now - task.updated;
            let age_style = age_color(&self.cfg.tui.age_thresholds, age)
                .map_or_else(Style::default, |c| Style::default().fg(c));
            first.push(Span::raw(" "));
            first.push(Span::styled(format_age(age), age_style));
        }
        if task.blocked {
            first.push(Span::styled(" BLOCKED", Style::default().fg(BLOCKED)));
        }

        let mut lines = vec![Line::from(first)];
        let width = area.width.saturating_sub(2) as usize;
        for line in wrap_title(&task.title, width, usize::from(self.cfg.tui.title_lines.clamp(1, 3))) {
            lines.push(Line::from(line));
        }
        let owner = if !task.claimed_by.is_empty() {
            format!("@{}", task.claimed_by)
        } else if !task.assignee.is_empty() {
            task.assignee.clone()
        } else {
            String::new()
        };
        lines.push(Line::from(owner));

        let card = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL))
            .style(style);
        f.render_widget(card, area);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let status_text = if self.filter_active {
            format!("Filter: {} | Type to search, Enter to apply, Esc to cancel", self.filter_text)
        } else if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            let shown: usize = self.columns.iter().map(Vec::len).sum();
            let filter = if self.filter_text.is_empty() {
                String::new()
            } else {
                format!(" [Filter: {}]", self.filter_text)
            };
            let warnings = if self.read_warnings > 0 {
                format!(" [{} unreadable file(s)]", self.read_warnings)
            } else {
                String::new()
            };
            format!("Tasks: {shown}{filter}{warnings} | Ctrl+←/→: Move | Enter: Details | /: Filter | ?: Help | q: Quit")
        };

        let status = Paragraph::new(status_text)
            .style(Style::default().bg(ACCENT).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    fn render_task_detail_popup(&self, f: &mut Frame) {
        let Some(task) = self.selected_task() else {
            return;
        };

        let popup_area = {
            let area = f.area();
            let popup_width = (area.width * 80) / 100;
            let popup_height = (area.height * 80) / 100;
            let x = area.x + (area.width - popup_width) / 2;
            let y = area.y + (area.height - popup_height) / 2;
            Rect::new(x, y, popup_width, popup_height)
        };
        f.render_widget(Clear, popup_area);

        let dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };
        let mut detail_lines = vec![
            Line::from(vec![Span::styled(
                format!("Task #{}: {}", task.id, task.title),
                Style::default().add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            Line::from(format!("Status:      {}", task.status)),
            Line::from(format!("Priority:    {}", task.priority)),
            Line::from(format!("Class:       {}", dash(&task.class))),
            Line::from(format!("Assignee:    {}", dash(&task.assignee))),
            Line::from(format!("Claimed by:  {}", dash(&task.claimed_by))),
            Line::from(format!("Tags:        {}", dash(&task.tags.join(", ")))),
            Line::from(format!(
                "Due:         {}",
                task.due.map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string())
            )),
            Line::from(format!("Created:     {}", format_instant(&task.created))),
            Line::from(format!("Updated:     {}", format_instant(&task.updated))),
        ];
        if task.blocked {
            detail_lines.push(Line::from(Span::styled(
                format!("Blocked:     {}", dash(&task.block_reason)),
                Style::default().fg(BLOCKED),
            )));
        }
        if !task.depends_on.is_empty() {
            let deps: Vec<String> = task.depends_on.iter().map(|d| format!("#{d}")).collect();
            detail_lines.push(Line::from(format!("Depends on:  {}", deps.join(", "))));
        }
        if !task.body.trim().is_empty() {
            detail_lines.push(Line::from(""));
            detail_lines.extend(task.body.lines().map(|l| Line::from(l.to_string())));
        }

        let popup_block = Block::default()
            .borders(Borders::ALL)
            .title("Task Details (Press Enter to close)")
            .title_alignment(Alignment::Center)
            .border_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD));
        let popup = Paragraph::new(detail_lines)
            .block(popup_block)
            .wrap(Wrap { trim: false })
            .style(Style::default().bg(Color::Black));
        f.render_widget(popup, popup_area);
    }
}

fn matches_filter(task: &Task, filter: &str) -> bool {
    task.title.to_lowercase().contains(filter)
        || task.tags.iter().any(|t| t.to_lowercase().contains(filter))
        || task.assignee.to_lowercase().contains(filter)
        || task.claimed_by.to_lowercase().contains(filter)
        || task.id.to_string() == filter.trim_start_matches('#')
}

/// Word-wrap `title` into at most `max_lines` lines of `width` characters.
/// Overflow is marked with an ellipsis on the last line.
fn wrap_title(title: &str, width: usize, max_lines: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in title.split_whitespace() {
        let word_len = word.chars().count();
        if current.is_empty() {
            current = word.chars().take(width).collect();
        } else if current.chars().count() + 1 + word_len <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.chars().take(width).collect();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            let keep = width.saturating_sub(1);
            *last = last.chars().take(keep).collect();
            last.push('…');
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{create_task, CreateOptions};
    use crate::config::{init, DEFAULT_DIR};
    use ratatui::backend::TestBackend;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::CONTROL)
    }

    fn setup() -> (TempDir, Config) {
        let temp = TempDir::new().unwrap();
        let mut cfg = init(&temp.path().join(DEFAULT_DIR), "Demo").unwrap();
        for (title, status) in [("Write docs", "todo"), ("Fix login", "todo"), ("Ship it", "archived")] {
            let opts = CreateOptions {
                title: title.into(),
                status: Some(status.into()),
                ..Default::default()
            };
            create_task(&mut cfg, &opts, now_utc()).unwrap();
        }
        (temp, cfg)
    }

    #[test]
    fn test_archived_column_hidden() {
        let (_temp, cfg) = setup();
        let app = BoardApp::new(cfg, false);
        assert!(!app.statuses.iter().any(|s| s == "archived"));
        let shown: usize = app.columns.iter().map(Vec::len).sum();
        assert_eq!(shown, 2);
    }

    #[test]
    fn test_filter_narrows_columns() {
        let (_temp, cfg) = setup();
        let mut app = BoardApp::new(cfg, false);
        app.handle_key(key(KeyCode::Char('/')));
        for c in "login".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Enter));
        let shown: usize = app.columns.iter().map(Vec::len).sum();
        assert_eq!(shown, 1);
        assert!(app.status_message.contains("1 tasks shown"));
    }

    #[test]
    fn test_move_card_right_goes_through_engine() {
        let (_temp, cfg) = setup();
        let mut app = BoardApp::new(cfg.clone(), false);
        let todo = app.statuses.iter().position(|s| s == "todo").unwrap();
        app.selected_column = todo;
        app.selected_card = 0;
        let id = app.selected_task().unwrap().id;

        app.handle_key(ctrl(KeyCode::Right));
        assert_eq!(store::load(&cfg, id).unwrap().status, "in-progress");
        assert_eq!(app.selected_task().unwrap().id, id);
        assert!(app.status_message.starts_with("Moved"));
    }

    #[test]
    fn test_refused_move_reported_in_status_bar() {
        let (_temp, mut cfg) = setup();
        cfg.wip_limits.insert("in-progress".into(), 1);
        cfg.save().unwrap();
        let opts = CreateOptions {
            title: "Busy".into(),
            status: Some("in-progress".into()),
            ..Default::default()
        };
        create_task(&mut cfg, &opts, now_utc()).unwrap();

        let mut app = BoardApp::new(cfg.clone(), false);
        app.selected_column = app.statuses.iter().position(|s| s == "todo").unwrap();
        app.selected_card = 0;
        let id = app.selected_task().unwrap().id;
        app.handle_key(ctrl(KeyCode::Right));
        assert!(app.status_message.contains("WIP_LIMIT_EXCEEDED"));
        assert_eq!(store::load(&cfg, id).unwrap().status, "todo");
    }

    #[test]
    fn test_quit_keys() {
        let (_temp, cfg) = setup();
        let mut app = BoardApp::new(cfg, false);
        assert!(app.handle_key(key(KeyCode::Char('q'))));
        assert!(app.handle_key(ctrl(KeyCode::Char('c'))));
    }

    #[test]
    fn test_renders_board() {
        let (_temp, cfg) = setup();
        let mut app = BoardApp::new(cfg, false);
        let mut terminal = Terminal::new(TestBackend::new(160, 40)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        let buffer = terminal.backend().buffer();
        let text: String = buffer.content.iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Demo"));
        assert!(text.contains("todo (2)"));
        assert!(!text.contains("archived"));
    }

    #[test]
    fn test_wrap_title() {
        assert_eq!(wrap_title("Fix login", 20, 2), vec!["Fix login"]);
        assert_eq!(wrap_title("one two three", 7, 2), vec!["one two", "three"]);
        let clamped = wrap_title("alpha beta gamma delta", 5, 2);
        assert_eq!(clamped.len(), 2);
        assert!(clamped[1].ends_with('…'));
    }
}
