use std::io::{self, IsTerminal};
use std::time::{Duration, Instant};

use acl_risk_terminal::athlete::AthleteProfile;
use acl_risk_terminal::config::AppConfig;
use acl_risk_terminal::inference::{Advice, CONNECT_LABEL, RiskPipeline};
use acl_risk_terminal::state::{AppState, FORM_FIELDS, Outcome, advice_tag};
use acl_risk_terminal::{artifacts, logging};
use anyhow::Context;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

struct App {
    state: AppState,
    pipeline: RiskPipeline,
    should_quit: bool,
}

impl App {
    fn new(pipeline: RiskPipeline) -> Self {
        let mut state = AppState::new();
        state.push_log(format!(
            "[INFO] Model ready ({}, {} features)",
            pipeline.model().kind_label(),
            pipeline.schema().len()
        ));
        state.recompute(&pipeline);
        Self {
            state,
            pipeline,
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        let before: AthleteProfile = self.state.profile.clone();
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => {
                if self.state.help_overlay {
                    self.state.help_overlay = false;
                } else if !self.state.cancel_entry() {
                    self.should_quit = true;
                }
            }
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Char('j') | KeyCode::Down | KeyCode::Tab => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up | KeyCode::BackTab => self.state.select_prev(),
            KeyCode::Char('h') | KeyCode::Left | KeyCode::Char('-') => self.state.step(-1),
            KeyCode::Char('l') | KeyCode::Right | KeyCode::Char('+') | KeyCode::Char('=') => {
                self.state.step(1)
            }
            KeyCode::Char(c) if c.is_ascii_digit() => self.state.type_digit(c),
            KeyCode::Backspace => self.state.backspace(),
            KeyCode::Enter => self.state.commit_entry(),
            KeyCode::Char('r') => {
                self.state.randomize(&mut rand::thread_rng());
                self.state.push_log("[INFO] Random profile");
            }
            KeyCode::Char('c') => {
                self.state.reset();
                self.state.push_log("[INFO] Form reset");
            }
            _ => {}
        }
        if self.state.profile != before {
            self.state.recompute(&self.pipeline);
        }
    }
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let cfg = AppConfig::from_env();
    let _guard = logging::init(&cfg.log, io::stdout().is_terminal(), "info")?;

    let pipeline = artifacts::load_pipeline(&cfg.artifacts).context("load risk model")?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(pipeline);
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "terminal loop failed");
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
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
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
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    render_form(frame, body[0], &app.state);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(7), Constraint::Length(8)])
        .split(body[1]);
    render_result(frame, right[0], &app.state);

    let console = Paragraph::new(console_text(&app.state, right[1].height.saturating_sub(2)))
        .block(Block::default().title("Log").borders(Borders::ALL))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(console, right[1]);

    let footer = Paragraph::new(footer_text())
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let status = match state.advice() {
        Some(advice) => advice_tag(advice),
        None => "--",
    };
    let line1 = format!("  /\\   ACL RISK | Status: {status}");
    let line2 = " /  \\  Athlete profile".to_string();
    format!("{line1}\n{line2}")
}

fn footer_text() -> String {
    "j/k/↑/↓ Move | ←/→ Adjust | 0-9 Type | r Random | c Reset | ? Help | q Quit".to_string()
}

fn render_form(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Profile").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 {
        return;
    }

    let (start, end) = visible_range(state.selected, FORM_FIELDS.len(), inner.height as usize);
    let lines: Vec<Line> = (start..end)
        .map(|idx| {
            let field = FORM_FIELDS[idx];
            let selected = idx == state.selected;
            let row_style = if selected {
                Style::default().fg(Color::White).bg(Color::DarkGray)
            } else {
                Style::default()
            };
            let mut value = state.field_value(idx);
            if selected && state.entry.is_some() {
                value.push('_');
            }
            Line::from(vec![
                Span::styled(format!("{:<26}", field.label()), row_style),
                Span::styled(
                    format!("{value:>10}"),
                    row_style.add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  {}", field.hint()),
                    row_style.fg(Color::DarkGray),
                ),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_result(frame: &mut Frame, area: Rect, state: &AppState) {
    let (lines, color) = match &state.outcome {
        Outcome::Pending => (vec![Line::from("Scoring...")], Color::DarkGray),
        Outcome::Failed(reason) => (
            vec![
                Line::from(Span::styled(
                    "Unable to score this profile",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(reason.clone()),
            ],
            Color::Yellow,
        ),
        Outcome::Scored(assessment) => {
            let advice = assessment.advice();
            let color = match advice {
                Advice::SeekProfessional => Color::Red,
                Advice::GoodToGo => Color::Green,
            };
            (
                vec![
                    Line::from(Span::styled(
                        format!("Predicted ACL Risk Score: {}", assessment.score),
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Line::from(""),
                    Line::from(advice.message()),
                    Line::from(""),
                    Line::from(vec![
                        Span::styled(
                            format!("{CONNECT_LABEL}: "),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(
                            advice.link(),
                            Style::default().add_modifier(Modifier::UNDERLINED),
                        ),
                    ]),
                ],
                color,
            )
        }
    };

    let (title, style) = if state.is_stale() {
        (
            "Result (stale, Enter to apply)",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM),
        )
    } else {
        ("Result", Style::default().fg(color))
    };
    let result = Paragraph::new(lines)
        .block(Block::default().title(title).borders(Borders::ALL))
        .style(style)
        .wrap(Wrap { trim: true });
    frame.render_widget(result, area);
}

fn console_text(state: &AppState, rows: u16) -> String {
    if state.logs.is_empty() {
        return "No events yet".to_string();
    }
    let skip = state.logs.len().saturating_sub(rows as usize);
    state
        .logs
        .iter()
        .skip(skip)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
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
        "ACL Risk - Help",
        "",
        "Form:",
        "  j/k or ↑/↓   Move between fields (Tab too)",
        "  ←/→ or -/+   Adjust value or cycle option",
        "  0-9          Type a number, Enter to apply",
        "  Backspace    Delete typed digit",
        "  Esc          Cancel typing",
        "",
        "Profile:",
        "  r            Random profile",
        "  c            Reset to defaults",
        "",
        "  ?            Toggle help",
        "  q            Quit",
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
