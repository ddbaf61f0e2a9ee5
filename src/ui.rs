//! Layout and drawing: playfield, sidebar, game-over overlay.

use crate::game::Snapshot;
use crate::grid::{Grid, Rgba};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Terminal columns per grid cell; two columns make a roughly square block.
const CELL_WIDTH: u16 = 2;
const CELL_HEIGHT: u16 = 1;
const SIDEBAR_WIDTH: u16 = 24;
/// Height of the stats and controls boxes together.
const SIDEBAR_HEIGHT: u16 = 15;

/// How long the board takes to dim after game over.
const GAME_OVER_FADE_MS: u32 = 600;

#[inline]
pub fn color(c: Rgba) -> Color {
    Color::Rgb(c.r(), c.g(), c.b())
}

/// Board size in terminal cells including the border.
pub fn playfield_size(rows: usize, cols: usize) -> (u16, u16) {
    (
        (cols as u16).saturating_mul(CELL_WIDTH).saturating_add(2),
        (rows as u16).saturating_mul(CELL_HEIGHT).saturating_add(2),
    )
}

/// Terminal size needed to show the board and sidebar.
pub fn required_terminal_size(rows: usize, cols: usize) -> (u16, u16) {
    let (pw, ph) = playfield_size(rows, cols);
    (pw + SIDEBAR_WIDTH, ph.max(SIDEBAR_HEIGHT))
}

/// Game-over fade, created on the first game-over frame.
#[derive(Default)]
pub struct FadeState {
    effect: Option<Effect>,
    last_frame: Option<Instant>,
}

impl FadeState {
    pub fn is_done(&self) -> bool {
        self.effect.as_ref().is_some_and(Effect::done)
    }
}

/// Draw one frame of the session.
pub fn draw(
    frame: &mut Frame,
    snapshot: &Snapshot<'_>,
    theme: &Theme,
    fade: &mut FadeState,
    now: Instant,
    no_animation: bool,
) {
    let area = frame.area();
    let (board, sidebar) = game_layout(area, snapshot.grid);
    draw_playfield(frame, snapshot.grid, theme, board);
    draw_sidebar(frame, snapshot, theme, sidebar);
    if snapshot.game_over {
        if !no_animation {
            apply_game_over_fade(frame, theme, board, fade, now);
        }
        draw_game_over(frame, snapshot, theme, board);
    }
}

/// Board and sidebar rects, centred in `area`.
fn game_layout(area: Rect, grid: &Grid) -> (Rect, Rect) {
    let (pw, ph) = playfield_size(grid.rows(), grid.cols());
    let total_w = pw + SIDEBAR_WIDTH;
    let total_h = ph.max(SIDEBAR_HEIGHT);

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_h),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    let board = Rect {
        height: ph.min(inner[0].height),
        ..inner[0]
    };
    (board, inner[1])
}

fn border_style(theme: &Theme) -> Style {
    Style::default()
        .fg(color(theme.div_line))
        .bg(color(theme.palette.background))
}

fn draw_playfield(frame: &mut Frame, grid: &Grid, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(theme))
        .title(Span::styled(" formfall ", Style::default().fg(color(theme.title))));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let buf = frame.buffer_mut();
    for (r, row) in grid.iter_rows().enumerate() {
        let y = inner.y + r as u16 * CELL_HEIGHT;
        if y >= inner.y + inner.height {
            break;
        }
        for (c, cell) in row.iter().enumerate() {
            let x0 = inner.x + c as u16 * CELL_WIDTH;
            let rgb = color(cell.color);
            for x in x0..(x0 + CELL_WIDTH).min(inner.x + inner.width) {
                buf[(x, y)]
                    .set_symbol("█")
                    .set_style(Style::default().fg(rgb).bg(rgb));
            }
        }
    }
}

fn draw_sidebar(frame: &mut Frame, snapshot: &Snapshot<'_>, theme: &Theme, area: Rect) {
    let title_style = Style::default().fg(color(theme.title));
    let fg_style = Style::default().fg(color(theme.main_fg));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Stats (border + score, speed, rows)
            Constraint::Length(1), // gap
            Constraint::Length(9), // Controls
        ])
        .split(area);

    let stats_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(theme));
    let stats_inner = stats_block.inner(chunks[0]);
    stats_block.render(chunks[0], frame.buffer_mut());
    let stats = vec![
        Line::from(vec![
            Span::styled("Score: ", title_style),
            Span::styled(snapshot.score.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Speed: ", title_style),
            Span::styled(format!("{} ms", snapshot.interval_ms), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Rows: ", title_style),
            Span::styled(snapshot.rows_cleared.to_string(), fg_style),
        ]),
    ];
    Paragraph::new(stats).render(stats_inner, frame.buffer_mut());

    let controls_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(theme))
        .title(Span::styled(" Keys ", title_style));
    let controls_inner = controls_block.inner(chunks[2]);
    controls_block.render(chunks[2], frame.buffer_mut());
    let controls: Vec<Line> = [
        ("←/→ h/l", "move"),
        ("↓ j", "drop"),
        ("e ↑ k", "rotate cw"),
        ("q u", "rotate ccw"),
        ("Esc", "quit"),
    ]
    .into_iter()
    .map(|(keys, what)| {
        Line::from(vec![
            Span::styled(format!("{keys:<9}"), title_style),
            Span::styled(what, fg_style),
        ])
    })
    .collect();
    Paragraph::new(controls).render(controls_inner, frame.buffer_mut());
}

/// Dim the board once the game is over (TachyonFX fade over the board rect).
fn apply_game_over_fade(
    frame: &mut Frame,
    theme: &Theme,
    board: Rect,
    fade: &mut FadeState,
    now: Instant,
) {
    let delta = fade
        .last_frame
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or_default();
    let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
    fade.last_frame = Some(now);

    let effect = fade.effect.get_or_insert_with(|| {
        let dim = color(theme.div_line);
        let bg = color(theme.palette.background);
        fx::fade_to(dim, bg, (GAME_OVER_FADE_MS, Interpolation::Linear)).with_area(board)
    });
    frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));
}

fn draw_game_over(frame: &mut Frame, snapshot: &Snapshot<'_>, theme: &Theme, board: Rect) {
    let popup_w = 20u16.min(board.width);
    let popup_h = 7u16.min(board.height);
    let popup = Rect {
        x: board.x + board.width.saturating_sub(popup_w) / 2,
        y: board.y + board.height.saturating_sub(popup_h) / 2,
        width: popup_w,
        height: popup_h,
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default()
                .fg(Color::White)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Score: {} ", snapshot.score),
            Style::default().fg(color(theme.main_fg)),
        )),
        Line::from(Span::styled(
            " Esc: quit ",
            Style::default().fg(color(theme.main_fg)),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(border_style(theme)))
        .style(Style::default().bg(color(theme.palette.background)))
        .render(popup, frame.buffer_mut());
}
