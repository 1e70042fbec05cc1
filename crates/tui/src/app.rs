use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use rand::Rng;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame, Terminal,
};
use tracing::{info, warn};
use tui21_core::{
    chart::DEFAULT_CHART,
    config::AppConfig,
    models::{Card, Rank, Suit, TrainingMode},
    onboarding::{self, OnboardingStep, OnboardingTracker},
    session::{Phase, SessionSnapshot, SessionSummary, TrainingEngine},
    store::SessionStore,
};

const TICK_RATE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Home,
    Table,
    Summary,
}

pub struct TrainerApp {
    config: AppConfig,
    engine: TrainingEngine,
    onboarding: OnboardingTracker,
    store: SessionStore,
    view: View,
    mode_index: usize,
    status: String,
    should_quit: bool,
    recovery: Option<SessionSnapshot>,
    table_cards: Vec<Card>,
    history: Vec<SessionSummary>,
}

impl TrainerApp {
    pub fn new(
        config: AppConfig,
        engine: TrainingEngine,
        onboarding: OnboardingTracker,
        store: SessionStore,
    ) -> Self {
        Self {
            config,
            engine,
            onboarding,
            store,
            view: View::Home,
            mode_index: TrainingMode::ALL.len() - 1,
            status: String::new(),
            should_quit: false,
            recovery: None,
            table_cards: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        self.refresh_history();
        self.recovery = self.engine.recovery_candidate();
        if self.recovery.is_some() {
            self.status = "Interrupted session found. [r]estore or [x] discard.".to_string();
        } else if onboarding::is_new_user(&self.onboarding.progress(), &self.history) {
            self.status =
                "Welcome! Work through the checklist, starting with Deck Countdown.".to_string();
        } else {
            self.status = "Pick a mode and press Enter to start.".to_string();
        }

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }

            if event::poll(TICK_RATE).context("failed to poll input")? {
                if let Event::Key(key) = event::read().context("failed to read input")? {
                    self.handle_key(key);
                }
            }
        }

        restore_terminal(&mut terminal)
    }

    fn refresh_history(&mut self) {
        match self.store.load_history() {
            Ok(records) => self.history = records,
            Err(err) => {
                warn!("failed to load session history: {err:#}");
                self.history.clear();
            }
        }
    }

    fn selected_mode(&self) -> TrainingMode {
        TrainingMode::ALL[self.mode_index]
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        match self.view {
            View::Home => self.handle_home_key(key),
            View::Table => self.handle_table_key(key),
            View::Summary => self.handle_summary_key(key),
        }
    }

    fn handle_home_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => {
                self.mode_index = self.mode_index.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.mode_index + 1 < TrainingMode::ALL.len() {
                    self.mode_index += 1;
                }
            }
            KeyCode::Char('r') => self.restore_recovery(),
            KeyCode::Char('x') => self.discard_recovery(),
            KeyCode::Enter => self.start_session(),
            _ => {}
        }
    }

    fn handle_table_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('d') => self.deal_card(),
            KeyCode::Char(' ') => self.advance_phase(),
            KeyCode::Char('c') => self.answer_count_check(),
            KeyCode::Char('p') => self.toggle_pause(),
            KeyCode::Char('e') => self.end_session(),
            _ => {}
        }
    }

    fn handle_summary_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Enter | KeyCode::Char('n') => {
                if let Err(err) = self.engine.reset_to_idle() {
                    self.status = format!("Cannot reset yet: {err}");
                    return;
                }
                self.refresh_history();
                self.table_cards.clear();
                self.view = View::Home;
                self.status = "Pick a mode and press Enter to start.".to_string();
            }
            _ => {}
        }
    }

    fn start_session(&mut self) {
        let rules = match self.config.table_rules() {
            Ok(rules) => rules,
            Err(err) => {
                self.status = format!("Bad configuration: {err}");
                return;
            }
        };
        let mode = self.selected_mode();
        match self.engine.start_session(mode, rules) {
            Ok(_) => {
                info!(?mode, "session started from home view");
                self.recovery = None;
                self.table_cards.clear();
                self.view = View::Table;
                self.status = "Press [space] to begin dealing.".to_string();
            }
            Err(err) => self.status = format!("Cannot start: {err}"),
        }
    }

    fn restore_recovery(&mut self) {
        let Some(snapshot) = self.recovery.take() else {
            self.status = "No interrupted session to restore.".to_string();
            return;
        };
        match self.engine.restore_session(snapshot) {
            Ok(()) => {
                self.view = View::Table;
                self.status = format!(
                    "Restored session: {} hands played.",
                    self.engine.hands_played()
                );
            }
            Err(err) => self.status = format!("Restore failed: {err}"),
        }
    }

    fn discard_recovery(&mut self) {
        if self.recovery.take().is_some() {
            self.engine.discard_recovery();
            self.status = "Saved session discarded.".to_string();
        }
    }

    fn deal_card(&mut self) {
        let card = random_card();
        match self.engine.card_dealt(card) {
            Ok(_) => {
                self.table_cards.push(card);
            }
            Err(err) => self.status = format!("{err}"),
        }
    }

    /// Walk the hand through its phases in table order.
    fn advance_phase(&mut self) {
        let result = match self.engine.phase() {
            Phase::Ready => self.engine.begin_deal(),
            Phase::Dealing => self.engine.player_turn(),
            Phase::AwaitingPlayerAction => self.engine.player_done(),
            Phase::DealerTurn => self.engine.dealer_done(),
            Phase::HandResolved => {
                self.table_cards.clear();
                self.engine.resolve_hand()
            }
            other => {
                self.status = format!("Nothing to advance in {other:?}.");
                return;
            }
        };
        match result {
            Ok(Phase::Completed) => self.finish_session(),
            Ok(Phase::CountPromptOpen) => {
                self.status = "Count check! Press [c] once you have verified your count.".to_string();
            }
            Ok(_) => self.status.clear(),
            Err(err) => self.status = format!("{err}"),
        }
    }

    fn answer_count_check(&mut self) {
        match self.engine.count_checked() {
            Ok(_) => {
                self.status = format!(
                    "Count verified ({} so far). Back to dealing.",
                    self.engine.count_checks()
                );
            }
            Err(err) => self.status = format!("{err}"),
        }
    }

    fn toggle_pause(&mut self) {
        let result = if self.engine.phase() == Phase::Paused {
            self.engine.resume()
        } else {
            self.engine.pause()
        };
        match result {
            Ok(Phase::Paused) => self.status = "Paused. Press [p] to resume.".to_string(),
            Ok(_) => self.status.clear(),
            Err(err) => self.status = format!("{err}"),
        }
    }

    fn end_session(&mut self) {
        match self.engine.end_session() {
            Ok(_) => self.finish_session(),
            Err(err) => self.status = format!("{err}"),
        }
    }

    fn finish_session(&mut self) {
        let mode = self.engine.state().mode;
        if let Err(err) = self.onboarding.complete_step(step_for_mode(mode)) {
            warn!("failed to record onboarding progress: {err:#}");
        }
        self.refresh_history();
        self.view = View::Summary;
        self.status = "Session complete. [Enter] for a new session, [q] to quit.".to_string();
    }

    fn draw(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(6), Constraint::Length(3)])
            .split(frame.size());

        match self.view {
            View::Home => self.draw_home(frame, chunks[0]),
            View::Table => self.draw_table(frame, chunks[0]),
            View::Summary => self.draw_summary(frame, chunks[0]),
        }
        self.draw_status(frame, chunks[1]);

        if self.view == View::Home && self.recovery.is_some() {
            self.draw_recovery_prompt(frame);
        }
    }

    fn draw_home(&self, frame: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let items: Vec<ListItem> = TrainingMode::ALL
            .iter()
            .enumerate()
            .map(|(index, mode)| {
                let marker = if index == self.mode_index { "> " } else { "  " };
                let style = if index == self.mode_index {
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(format!("{marker}{}", mode.label())).style(style)
            })
            .collect();
        let modes = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Training Modes "),
        );
        frame.render_widget(modes, columns[0]);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(7), Constraint::Min(3)])
            .split(columns[1]);

        let progress = self.onboarding.progress();
        let checklist: Vec<ListItem> = OnboardingStep::ORDER
            .iter()
            .map(|step| {
                let done = progress.is_completed(*step);
                let mark = if done { "[x]" } else { "[ ]" };
                let style = if done {
                    Style::default().fg(Color::Green)
                } else if progress.current_step() == Some(*step) {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                ListItem::new(format!("{mark} {}", step.label())).style(style)
            })
            .collect();
        let onboarding_list = List::new(checklist).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Getting Started "),
        );
        frame.render_widget(onboarding_list, right[0]);

        let history: Vec<ListItem> = self
            .history
            .iter()
            .rev()
            .take(8)
            .map(|record| {
                ListItem::new(format!(
                    "{}  {}  {} hands, {} checks",
                    record.completed_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                    record.mode.label(),
                    record.hands_played,
                    record.count_checks,
                ))
            })
            .collect();
        let history_list = List::new(history).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Past Sessions "),
        );
        frame.render_widget(history_list, right[1]);
    }

    fn draw_table(&self, frame: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(4)])
            .split(area);

        let state = self.engine.state();
        let header = Paragraph::new(vec![
            Line::from(vec![
                Span::raw("Mode: "),
                Span::styled(state.mode.label(), Style::default().fg(Color::Cyan)),
                Span::raw("   Phase: "),
                Span::styled(
                    format!("{:?}", state.phase),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(format!(
                "Hands: {}   Checks: {}   Cards left: {}",
                state.hands_played, state.count_checks, state.cards_remaining
            )),
            Line::from(self.count_line()),
        ])
        .block(Block::default().borders(Borders::ALL).title(" Session "));
        frame.render_widget(header, rows[0]);

        let cards = if self.table_cards.is_empty() {
            "--".to_string()
        } else {
            self.table_cards
                .iter()
                .map(Card::to_string)
                .collect::<Vec<_>>()
                .join("  ")
        };
        let mut lines = vec![Line::from(cards)];
        if state.phase == Phase::AwaitingPlayerAction {
            lines.push(Line::from(""));
            lines.push(Line::from(self.insurance_line()));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "[d] deal card   [space] advance   [c] count check   [p] pause   [e] end session",
            Style::default().fg(Color::DarkGray),
        )));
        let table = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(" Table "));
        frame.render_widget(table, rows[1]);
    }

    /// The running count is the drill; only show it during a count check so
    /// the trainee keeps their own count the rest of the time.
    fn count_line(&self) -> String {
        if self.engine.phase() == Phase::CountPromptOpen {
            format!(
                "Running count: {:+}   True count: {:+}",
                self.engine.running_count(),
                self.engine.true_count()
            )
        } else {
            "Running count: ??   True count: ??".to_string()
        }
    }

    fn insurance_line(&self) -> Span<'static> {
        let take = DEFAULT_CHART.insurance.evaluate(self.engine.true_count());
        if take {
            Span::styled(
                "Chart says: take insurance",
                Style::default().fg(Color::Green),
            )
        } else {
            Span::styled(
                "Chart says: decline insurance",
                Style::default().fg(Color::Red),
            )
        }
    }

    fn draw_summary(&self, frame: &mut Frame, area: Rect) {
        let state = self.engine.state();
        let summary = Paragraph::new(vec![
            Line::from(Span::styled(
                "Session complete",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!("Mode:         {}", state.mode.label())),
            Line::from(format!("Hands played: {}", state.hands_played)),
            Line::from(format!("Count checks: {}", state.count_checks)),
            Line::from(""),
            Line::from("[Enter] new session   [q] quit"),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" Summary "));
        frame.render_widget(summary, area);
    }

    fn draw_recovery_prompt(&self, frame: &mut Frame) {
        let Some(snapshot) = self.recovery.as_ref() else {
            return;
        };
        let area = centered_rect(50, 7, frame.size());
        frame.render_widget(Clear, area);
        let prompt = Paragraph::new(vec![
            Line::from("An interrupted session was found."),
            Line::from(format!(
                "{} — {} hands played, {} cards left.",
                snapshot.mode.label(),
                snapshot.hands_played,
                snapshot.cards_remaining
            )),
            Line::from(""),
            Line::from("[r] restore   [x] discard"),
        ])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Resume session? "),
        );
        frame.render_widget(prompt, area);
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let status = Paragraph::new(self.status.as_str())
            .block(Block::default().borders(Borders::ALL).title(" Status "));
        frame.render_widget(status, area);
    }
}

/// Map a finished training mode to its onboarding step.
fn step_for_mode(mode: TrainingMode) -> OnboardingStep {
    match mode {
        TrainingMode::DeckCountdown => OnboardingStep::DeckCountdown,
        TrainingMode::CountingDrill => OnboardingStep::CountingDrill,
        TrainingMode::TrueCount => OnboardingStep::TrueCount,
        TrainingMode::PlayAndCount => OnboardingStep::PlayAndCount,
    }
}

/// Draw a card uniformly at random. The trainer does not model a depleting
/// deck; the shoe depth lives in the session state.
fn random_card() -> Card {
    let mut rng = rand::thread_rng();
    let rank = Rank::ALL[rng.gen_range(0..Rank::ALL.len())];
    let suit = Suit::ALL[rng.gen_range(0..Suit::ALL.len())];
    Card::new(rank, suit)
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to leave raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to restore cursor")?;
    Ok(())
}
