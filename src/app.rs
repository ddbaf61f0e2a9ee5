//! App: terminal init, the cooperative poll loop, and the terminal presenter.

use crate::game::{Clock, GameSession, MonotonicClock, Presenter, Snapshot, Status, StepOutcome};
use crate::input::key_to_command;
use crate::theme::Theme;
use crate::{Args, GameConfig};
use anyhow::{Context, Result, bail};
use crossterm::event::{self, Event};
use ratatui::DefaultTerminal;
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Renders session snapshots to the terminal.
pub struct TerminalPresenter {
    terminal: DefaultTerminal,
    theme: Theme,
    fade: crate::ui::FadeState,
    no_animation: bool,
}

impl Presenter for TerminalPresenter {
    fn present(&mut self, snapshot: &Snapshot<'_>) -> io::Result<()> {
        let now = Instant::now();
        let Self {
            terminal,
            theme,
            fade,
            no_animation,
        } = self;
        terminal.draw(|f| crate::ui::draw(f, snapshot, theme, fade, now, *no_animation))?;
        Ok(())
    }
}

pub struct App {
    config: GameConfig,
    session: GameSession,
    clock: MonotonicClock,
    refresh: Duration,
    no_animation: bool,
    theme: Theme,
    game_over: bool,
}

impl App {
    pub fn new(args: &Args, config: GameConfig, theme: Theme) -> Self {
        let session = GameSession::new(&config, theme.palette);
        Self {
            refresh: Duration::from_millis(config.refresh_ms),
            config,
            session,
            clock: MonotonicClock::new(),
            no_animation: args.no_animation,
            theme,
            game_over: false,
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// True once a blocked spawn has ended the game, even after the player quit.
    pub fn game_over(&self) -> bool {
        self.game_over
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode, size,
            },
        };

        let (need_w, need_h) =
            crate::ui::required_terminal_size(self.config.rows, self.config.cols);
        let (term_cols, term_rows) = size().context("failed to query terminal size")?;
        if term_cols < need_w || term_rows < need_h {
            bail!(
                "terminal is {term_cols}x{term_rows}, \
                 a {}x{} grid needs at least {need_w}x{need_h}",
                self.config.rows,
                self.config.cols
            );
        }

        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let result = ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))
            .map_err(anyhow::Error::from)
            .and_then(|terminal| {
                let mut presenter = TerminalPresenter {
                    terminal,
                    theme: self.theme.clone(),
                    fade: crate::ui::FadeState::default(),
                    no_animation: self.no_animation,
                };
                self.run_loop(&mut presenter)
            });

        // Restore
        execute!(io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    /// One iteration: drain input, then at most one gravity step, then sleep
    /// until the next poll. Row-clear delays block inside the step, so input
    /// arriving during a clear is read on the next iteration.
    fn run_loop(&mut self, presenter: &mut TerminalPresenter) -> Result<()> {
        self.session.start(&self.clock, presenter)?;
        info!(
            rows = self.config.rows,
            cols = self.config.cols,
            block_size = self.config.block_size,
            interval_ms = self.session.interval_ms(),
            "session started"
        );

        loop {
            if event::poll(self.refresh)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        let Some(command) = key_to_command(key) else {
                            continue;
                        };
                        let outcome = self.session.apply_command(command, presenter)?;
                        debug!(?command, ?outcome, "command applied");
                        self.game_over |= outcome == StepOutcome::GameOver;
                    }
                }
            }

            match self.session.status() {
                Status::Quit => return Ok(()),
                Status::GameOver => {
                    // Keep presenting so the fade runs; no further game ticks.
                    if !self.no_animation && !presenter.fade.is_done() {
                        presenter.present(&self.session.snapshot())?;
                    }
                }
                Status::Running => {
                    if let Some(outcome) = self.session.tick(&self.clock, presenter)? {
                        debug!(?outcome, now_ms = self.clock.now_ms(), "gravity");
                        self.game_over |= outcome == StepOutcome::GameOver;
                    }
                }
            }
        }
    }
}
