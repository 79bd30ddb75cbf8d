use std::{cmp, io, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use gridbag_core::{GameData, GameDataLoader, InventoryStore, Item, KeyValueStorage};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::{spawn, sync::mpsc};
use tracing::{error, info};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_QUANTITY_DIGITS: usize = 9;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    warning: Color,
    danger: Color,
    empty_cell: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            warning: Color::Yellow,
            danger: Color::Red,
            empty_cell: Color::Black,
        }
    }
}

fn item_color(item: &Item) -> Color {
    item.rgb()
        .map(|(r, g, b)| Color::Rgb(r, g, b))
        .unwrap_or(Color::Gray)
}

fn contrast_color(color: &Color, fallback: Color) -> Color {
    match color {
        Color::Rgb(r, g, b) => {
            let luminance = 0.2126 * (*r as f32) + 0.7152 * (*g as f32) + 0.0722 * (*b as f32);
            if luminance > 140.0 {
                Color::Black
            } else {
                Color::White
            }
        }
        _ => fallback,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Carrying { id: u64 },
    Modal,
}

enum AppEvent {
    Input(Event),
    Tick,
    GameDataLoaded(GameData),
}

/// Terminal front-end driving an [`InventoryStore`].
pub struct GridbagApp<S> {
    store: InventoryStore<S>,
    loader: GameDataLoader,
    columns: i32,
    rows: i32,
    cursor: (i32, i32),
    mode: Mode,
    quantity_input: String,
    status: String,
    status_is_error: bool,
    should_quit: bool,
    theme: Theme,
}

impl<S: KeyValueStorage> GridbagApp<S> {
    pub fn new(store: InventoryStore<S>, loader: GameDataLoader, columns: u16, rows: u16) -> Self {
        Self {
            store,
            loader,
            columns: i32::from(columns.max(1)),
            rows: i32::from(rows.max(1)),
            cursor: (0, 0),
            mode: Mode::Browse,
            quantity_input: String::new(),
            status: "Ready".to_string(),
            status_is_error: false,
            should_quit: false,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.set_status(format!("Loaded {} items", self.store.items().len()));

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        spawn_game_data_fetch(self.loader.clone(), event_tx);

        let result = loop {
            if let Err(err) = terminal.draw(|frame| self.draw(frame)) {
                break Err(err.into());
            }
            if self.should_quit {
                break Ok(());
            }
            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) || self.should_quit {
                break Ok(());
            }
        };

        restore_terminal(&mut terminal)?;
        result
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(Event::Key(key))) => {
                if key.kind != KeyEventKind::Release {
                    if let Err(err) = self.handle_key(key) {
                        error!(?err, "store operation failed");
                        self.set_error(format!("Error: {err}"));
                    }
                }
                true
            }
            Some(AppEvent::Input(_)) | Some(AppEvent::Tick) => true,
            Some(AppEvent::GameDataLoaded(data)) => {
                info!(name = %data.name, "game data received");
                self.store.set_game_data(data);
                self.set_status("Game data loaded".to_string());
                true
            }
            None => false,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Ok(());
        }
        match self.mode {
            Mode::Modal => self.handle_modal_key(key),
            Mode::Browse | Mode::Carrying { .. } => self.handle_grid_key(key),
        }
    }

    fn handle_grid_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.move_cursor(-1, 0),
            KeyCode::Right | KeyCode::Char('l') => self.move_cursor(1, 0),
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(0, -1),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(0, 1),
            KeyCode::Enter => self.activate_cell()?,
            KeyCode::Char('m') => self.pick_up(),
            KeyCode::Char('d') => self.delete_at_cursor()?,
            KeyCode::Char('r') => {
                self.store.reset_to_default()?;
                self.mode = Mode::Browse;
                self.set_status("Inventory reset to defaults".to_string());
            }
            KeyCode::Esc => {
                if let Mode::Carrying { .. } = self.mode {
                    self.mode = Mode::Browse;
                    self.set_status("Move cancelled".to_string());
                }
            }
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
        Ok(())
    }

    fn handle_modal_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char(ch) if ch.is_ascii_digit() => {
                if self.quantity_input.len() < MAX_QUANTITY_DIGITS {
                    self.quantity_input.push(ch);
                }
            }
            KeyCode::Backspace => {
                self.quantity_input.pop();
            }
            KeyCode::Enter => self.apply_quantity_removal()?,
            KeyCode::Esc => self.close_modal(),
            _ => {}
        }
        Ok(())
    }

    fn move_cursor(&mut self, dx: i32, dy: i32) {
        let (x, y) = self.cursor;
        self.cursor = (
            (x + dx).clamp(0, self.columns - 1),
            (y + dy).clamp(0, self.rows - 1),
        );
    }

    fn cursor_item(&self) -> Option<&Item> {
        let (x, y) = self.cursor;
        self.store.item_at(x, y)
    }

    fn activate_cell(&mut self) -> Result<()> {
        let (x, y) = self.cursor;
        if let Mode::Carrying { id } = self.mode {
            self.mode = Mode::Browse;
            if self.store.move_item(id, x, y)? {
                self.set_status(format!("Moved item {id} to ({x}, {y})"));
            } else {
                self.set_status(format!("Cell ({x}, {y}) is occupied"));
            }
            return Ok(());
        }
        if let Some(id) = self.cursor_item().map(|item| item.id) {
            self.store.select_item(id);
            self.quantity_input.clear();
            self.mode = Mode::Modal;
        }
        Ok(())
    }

    fn pick_up(&mut self) {
        if let Some((id, name)) = self.cursor_item().map(|item| (item.id, item.name.clone())) {
            self.mode = Mode::Carrying { id };
            self.set_status(format!("Carrying {name}; Enter drops, Esc cancels"));
        }
    }

    fn delete_at_cursor(&mut self) -> Result<()> {
        if let Some((id, name)) = self.cursor_item().map(|item| (item.id, item.name.clone())) {
            if self.store.delete_item(id)? {
                if self.mode == (Mode::Carrying { id }) {
                    self.mode = Mode::Browse;
                }
                self.set_status(format!("Deleted {name}"));
            }
        }
        Ok(())
    }

    fn apply_quantity_removal(&mut self) -> Result<()> {
        let Some(id) = self.store.selected_item_id() else {
            self.close_modal();
            return Ok(());
        };
        let quantity = match self.quantity_input.parse::<i64>() {
            Ok(value) if value > 0 => value,
            _ => {
                self.set_status("Enter a quantity above zero".to_string());
                return Ok(());
            }
        };
        self.quantity_input.clear();
        self.store.remove_item_quantity(id, quantity)?;
        match self.store.item(id) {
            Some(item) => {
                let message = format!("Removed {quantity}; {} left", item.count);
                self.set_status(message);
            }
            None => {
                self.mode = Mode::Browse;
                self.set_status(format!("Removed item {id} from inventory"));
            }
        }
        Ok(())
    }

    fn close_modal(&mut self) {
        self.store.clear_selection();
        self.quantity_input.clear();
        self.mode = Mode::Browse;
    }

    fn set_status(&mut self, message: String) {
        self.status = format!("[{}] {message}", Local::now().format("%H:%M:%S"));
        self.status_is_error = false;
    }

    fn set_error(&mut self, message: String) {
        self.set_status(message);
        self.status_is_error = true;
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(4),
            ])
            .split(area);

        self.render_title(frame, layout[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(layout[1]);
        self.render_grid(frame, body[0]);
        self.render_details(frame, body[1]);
        self.render_status(frame, layout[2]);

        if self.mode == Mode::Modal {
            if let Some(item) = self.store.selected_item() {
                self.render_item_modal(frame, item);
            }
        }
    }

    fn render_title(&self, frame: &mut Frame, area: Rect) {
        let title = match self.store.game_data() {
            Some(data) => data.name.clone(),
            None => "Inventory".to_string(),
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(
            title,
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD),
        )))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
    }

    fn render_grid(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Grid");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let cell_width = inner.width / self.columns as u16;
        let cell_height = inner.height / self.rows as u16;
        if cell_width < 3 || cell_height < 3 {
            let warning = Paragraph::new("Terminal too small for the grid")
                .style(Style::default().fg(self.theme.warning));
            frame.render_widget(warning, inner);
            return;
        }

        let carrying = match self.mode {
            Mode::Carrying { id } => Some(id),
            _ => None,
        };

        for y in 0..self.rows {
            for x in 0..self.columns {
                let rect = Rect::new(
                    inner.x + x as u16 * cell_width,
                    inner.y + y as u16 * cell_height,
                    cell_width,
                    cell_height,
                );
                let item = self.store.item_at(x, y);
                let is_cursor = self.cursor == (x, y);

                let border_style = if is_cursor {
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD)
                } else if item.is_some() && item.map(|item| item.id) == carrying {
                    Style::default().fg(self.theme.warning)
                } else {
                    Style::default().fg(self.theme.muted)
                };

                let (background, content) = match item {
                    Some(item) => {
                        let color = item_color(item);
                        let label = item.name.chars().next().map(String::from).unwrap_or_default();
                        (color, vec![Line::from(label), Line::from(item.count.to_string())])
                    }
                    None => (self.theme.empty_cell, Vec::new()),
                };

                let cell = Paragraph::new(content)
                    .alignment(Alignment::Center)
                    .style(
                        Style::default()
                            .bg(background)
                            .fg(contrast_color(&background, self.theme.primary_fg)),
                    )
                    .block(Block::default().borders(Borders::ALL).border_style(border_style));
                frame.render_widget(cell, rect);
            }
        }
    }

    fn render_details(&self, frame: &mut Frame, area: Rect) {
        let mut lines = Vec::new();
        match self.cursor_item() {
            Some(item) => {
                lines.push(Line::from(Span::styled(
                    item.name.clone(),
                    Style::default()
                        .fg(item_color(item))
                        .add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(format!("Count: {}", item.count)));
                lines.push(Line::from(item.description.clone()));
            }
            None => lines.push(Line::from(Span::styled(
                "Empty cell",
                Style::default().fg(self.theme.muted),
            ))),
        }

        let hidden = self
            .store
            .items()
            .iter()
            .filter(|item| !(0..self.columns).contains(&item.x) || !(0..self.rows).contains(&item.y))
            .count();
        if hidden > 0 {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("{hidden} item(s) outside the visible grid"),
                Style::default().fg(self.theme.warning),
            )));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Game",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        match self.store.game_data() {
            Some(data) => {
                lines.push(Line::from(data.name.clone()));
                lines.push(Line::from(data.description.clone()));
                lines.push(Line::from(Span::styled(
                    data.image.clone(),
                    Style::default().fg(self.theme.muted),
                )));
            }
            None => lines.push(Line::from(Span::styled(
                "loading…",
                Style::default().fg(self.theme.muted),
            ))),
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Details"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_item_modal(&self, frame: &mut Frame, item: &Item) {
        let frame_area = frame.size();
        let mut width = cmp::min(50_u16, frame_area.width.saturating_sub(4));
        width = cmp::max(width, 24_u16);
        let height = 9_u16.min(frame_area.height.saturating_sub(2)).max(5_u16);
        let x = frame_area.x + (frame_area.width.saturating_sub(width)) / 2;
        let y = frame_area.y + (frame_area.height.saturating_sub(height)) / 2;
        let area = Rect::new(x, y, width, height);

        frame.render_widget(Clear, area);

        let input_line = Line::from(vec![
            Span::styled("Remove > ", Style::default().fg(self.theme.accent)),
            Span::raw(self.quantity_input.clone()),
        ]);
        let helper = Line::from(vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" remove  "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" close"),
        ]);

        let paragraph = Paragraph::new(vec![
            Line::from(item.description.clone()),
            Line::from(format!("Count: {}", item.count)),
            Line::from(""),
            input_line,
            Line::from(""),
            helper,
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(item_color(item)))
                .title(item.name.clone()),
        )
        .wrap(Wrap { trim: true });

        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let hint = match self.mode {
            Mode::Browse => "arrows move  Enter open  m move  d delete  r reset  q quit",
            Mode::Carrying { .. } => "arrows choose cell  Enter drop  Esc cancel",
            Mode::Modal => "digits quantity  Enter remove  Esc close",
        };
        let status_style = if self.status_is_error {
            Style::default().fg(self.theme.danger)
        } else {
            Style::default()
        };
        let paragraph = Paragraph::new(vec![
            Line::from(Span::styled(self.status.clone(), status_style)),
            Line::from(Span::styled(hint, Style::default().fg(self.theme.muted))),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

fn spawn_game_data_fetch(loader: GameDataLoader, sender: mpsc::Sender<AppEvent>) {
    spawn(async move {
        let data = loader.fetch().await;
        let _ = sender.send(AppEvent::GameDataLoaded(data)).await;
    });
}
