use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use log::warn;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use polipone::config::AppConfig;
use polipone::export::format_points;
use polipone::league::{challenge_available, wildcard_available};
use polipone::scoring::MovementKind;
use polipone::state::{AppState, Screen};
use polipone::store;

struct App {
    state: AppState,
    config: AppConfig,
    should_quit: bool,
}

impl App {
    fn new(config: AppConfig) -> Result<Self> {
        let conn = store::open_db(&config.db_path)?;
        let data = store::load_snapshot(&conn)?;
        Ok(Self {
            state: AppState::new(config.title.clone(), data),
            config,
            should_quit: false,
        })
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.state.set_screen(Screen::Leaderboard),
            KeyCode::Char('2') => self.state.set_screen(Screen::Board),
            KeyCode::Char('3') => self.state.set_screen(Screen::Matches),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('l') | KeyCode::Right => self.state.next_round(),
            KeyCode::Char('h') | KeyCode::Left => self.state.prev_round(),
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn reload(&mut self) {
        let loaded = store::open_db(&self.config.db_path).and_then(|conn| store::load_snapshot(&conn));
        match loaded {
            Ok(data) => self.state.reload(data),
            Err(err) => {
                warn!("reload failed: {err:#}");
                self.state.push_log(format!("[WARN] reload failed: {err}"));
            }
        }
    }
}

fn main() -> Result<()> {
    let config = AppConfig::from_env()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let mut app = App::new(config)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Leaderboard => render_leaderboard(frame, chunks[1], &app.state),
        Screen::Board => render_board(frame, chunks[1], &app.state),
        Screen::Matches => render_matches(frame, chunks[1], &app.state),
    }

    let footer = Paragraph::new(footer_text(&app.state))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let screen = match state.screen {
        Screen::Leaderboard => "Classifica".to_string(),
        Screen::Board => format!("Pronostici | {}", round_label(state)),
        Screen::Matches => format!("Partite | {}", round_label(state)),
    };
    format!("{} | {screen}", state.title)
}

fn round_label(state: &AppState) -> String {
    let Some(round) = state.current_round() else {
        return "no rounds".to_string();
    };
    let mut label = format!("Giornata {round}");
    if wildcard_available(round) {
        label.push_str(" [jolly]");
    }
    if challenge_available(round) {
        label.push_str(" [sfida]");
    }
    label
}

fn footer_text(state: &AppState) -> String {
    let keys = match state.screen {
        Screen::Leaderboard => "1/2/3 Screens | j/k Move | r Reload | ? Help | q Quit",
        Screen::Board | Screen::Matches => {
            "1/2/3 Screens | h/l Round | j/k Move | r Reload | ? Help | q Quit"
        }
    };
    let last = state.logs.back().map(String::as_str).unwrap_or_default();
    format!("{keys} | {last}")
}

fn render_leaderboard(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let rows = state.leaderboard();
    if rows.is_empty() {
        let empty = Paragraph::new("No users yet").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, cols[0]);
        return;
    }

    let visible = cols[0].height.saturating_sub(2) as usize;
    let (start, end) = visible_range(state.selected, rows.len(), visible);
    let mut lines = Vec::new();
    for idx in start..end {
        let user = &rows[idx];
        let text = format!(
            "{:>3}. {:<18} {:>8}  J:{} S:{}",
            idx + 1,
            user.id,
            format_points(user.points),
            user.wildcards_used,
            user.challenge_tokens
        );
        let style = if idx == state.selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        lines.push(Line::styled(text, style));
    }
    let table = Paragraph::new(lines).block(Block::default().title("Classifica").borders(Borders::ALL));
    frame.render_widget(table, cols[0]);

    let detail = Paragraph::new(movements_text(state))
        .block(Block::default().title("Dettaglio").borders(Borders::ALL));
    frame.render_widget(detail, cols[1]);
}

fn movements_text(state: &AppState) -> String {
    let movements = state.selected_movements();
    if movements.is_empty() {
        return "No scored predictions".to_string();
    }
    movements
        .iter()
        .map(|m| {
            let what = match m.kind {
                MovementKind::Pick { correct, wildcard } => {
                    let mark = if correct { "ok" } else { "ko" };
                    if wildcard {
                        format!("{mark} jolly")
                    } else {
                        mark.to_string()
                    }
                }
                MovementKind::ChallengePenalty { .. } => "sfida persa".to_string(),
            };
            format!("G{:<3} {:<24} {:<12} {:+.2}", m.round, m.match_id, what, m.points)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_board(frame: &mut Frame, area: Rect, state: &AppState) {
    let board = state.round_board();
    if board.is_empty() {
        let empty =
            Paragraph::new("No matches in this round").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    let mut lines = Vec::new();
    for (idx, m) in board.iter().enumerate() {
        let result = m.result.map(|r| r.code()).unwrap_or("-");
        let style = if idx == state.selected {
            Style::default().add_modifier(Modifier::BOLD).fg(Color::Yellow)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        lines.push(Line::styled(
            format!("{} - {}   risultato: {result}", m.home, m.away),
            style,
        ));
        let picks = m
            .picks
            .iter()
            .map(|p| format!("{}: {}", p.user, p.badge()))
            .collect::<Vec<_>>()
            .join("  |  ");
        lines.push(Line::raw(format!("   {picks}")));
    }
    let widget = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    frame.render_widget(widget, area);
}

fn render_matches(frame: &mut Frame, area: Rect, state: &AppState) {
    let matches = state.round_matches();
    if matches.is_empty() {
        let empty =
            Paragraph::new("No matches in this round").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    let mut lines = vec![Line::styled(
        format!("{:<30} {:>6} {:>6} {:>6}  {}", "Partita", "1", "X", "2", "Ris."),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    for (idx, m) in matches.iter().enumerate() {
        let text = format!(
            "{:<30} {:>6} {:>6} {:>6}  {}",
            format!("{} - {}", m.home, m.away),
            odds_cell(m.odds_home),
            odds_cell(m.odds_draw),
            odds_cell(m.odds_away),
            m.result.map(|r| r.code()).unwrap_or("-")
        );
        let style = if idx == state.selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        lines.push(Line::styled(text, style));
    }
    let widget = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    frame.render_widget(widget, area);
}

fn odds_cell(odds: Option<f64>) -> String {
    odds.map(|v| format!("{v:.2}")).unwrap_or_else(|| "?".to_string())
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Polipone - Help",
        "",
        "Screens:",
        "  1            Classifica",
        "  2            Pronostici della giornata",
        "  3            Partite e quote",
        "",
        "Navigation:",
        "  j/k or ↑/↓   Move",
        "  h/l or ←/→   Previous/next round",
        "  r            Reload from database",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Badges: J jolly, S sfida",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
