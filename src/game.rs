//! Game session: owns the grid, the active form, and the score/speed state, and
//! applies player commands and gravity ticks to them.

use crate::GameConfig;
use crate::form::{Form, Rotation};
use crate::grid::{Grid, Palette};
use crate::lifecycle::{self, attempt_move, attempt_rotate};
use crate::rows::{self, Progression};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Discrete player commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    RotateCw,
    RotateCcw,
    MoveLeft,
    MoveRight,
    SoftDrop,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    /// Spawn was blocked. Only `Quit` is accepted from here.
    GameOver,
    Quit,
}

/// What a command or tick did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Session is not running; nothing happened.
    Ignored,
    /// Move or rotation refused by the bounds/collision checks.
    Rejected,
    Moved,
    /// The form locked; `rows_cleared` rows were removed and a new form spawned.
    Landed { rows_cleared: u32 },
    /// The form locked and the next spawn was blocked.
    GameOver,
    Quit,
}

/// Read-only view handed to the renderer.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub grid: &'a Grid,
    pub score: u64,
    pub interval_ms: u64,
    pub rows_cleared: u32,
    pub game_over: bool,
}

impl<'a> Snapshot<'a> {
    pub fn playing(grid: &'a Grid, progression: &Progression) -> Self {
        Self {
            grid,
            score: progression.score,
            interval_ms: progression.interval_ms,
            rows_cleared: progression.rows_cleared,
            game_over: false,
        }
    }
}

/// Renderer collaborator. `present` is called after every grid change;
/// `hold` blocks between row-clear phases.
pub trait Presenter {
    fn present(&mut self, snapshot: &Snapshot<'_>) -> io::Result<()>;

    fn hold(&mut self, delay: Duration) {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

/// Monotonic millisecond source.
pub trait Clock {
    fn now_ms(&self) -> u64;

    fn elapsed_since(&self, since_ms: u64) -> u64 {
        self.now_ms().saturating_sub(since_ms)
    }
}

/// Milliseconds since construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
    }
}

#[derive(Debug)]
pub struct GameSession {
    grid: Grid,
    form: Option<Form>,
    progression: Progression,
    last_tick_ms: u64,
    status: Status,
    rng: StdRng,
    clear_delay: Duration,
}

impl GameSession {
    pub fn new(config: &GameConfig, palette: Palette) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, palette, rng)
    }

    /// Builds the grid and spawns the first form.
    pub fn with_rng(config: &GameConfig, palette: Palette, rng: StdRng) -> Self {
        let mut session = Self {
            grid: Grid::new(config.rows, config.cols, palette),
            form: None,
            progression: Progression::new(config.initial_interval_ms),
            last_tick_ms: 0,
            status: Status::Running,
            rng,
            clear_delay: Duration::from_millis(config.clear_row_delay_ms),
        };
        session.spawn_next();
        session
    }

    /// Starts the gravity timer and presents the first frame.
    pub fn start<C, P>(&mut self, clock: &C, presenter: &mut P) -> io::Result<()>
    where
        C: Clock + ?Sized,
        P: Presenter + ?Sized,
    {
        self.last_tick_ms = clock.now_ms();
        presenter.present(&self.snapshot())
    }

    #[cfg(test)]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[cfg(test)]
    pub fn form(&self) -> Option<&Form> {
        self.form.as_ref()
    }

    pub fn score(&self) -> u64 {
        self.progression.score
    }

    pub fn interval_ms(&self) -> u64 {
        self.progression.interval_ms
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            game_over: self.status == Status::GameOver,
            ..Snapshot::playing(&self.grid, &self.progression)
        }
    }

    /// Applies one command. After game over only `Quit` does anything.
    pub fn apply_command<P>(
        &mut self,
        command: Command,
        presenter: &mut P,
    ) -> io::Result<StepOutcome>
    where
        P: Presenter + ?Sized,
    {
        if command == Command::Quit {
            self.status = Status::Quit;
            return Ok(StepOutcome::Quit);
        }
        if !self.is_running() {
            return Ok(StepOutcome::Ignored);
        }
        match command {
            Command::MoveLeft => self.shift(-1, presenter),
            Command::MoveRight => self.shift(1, presenter),
            Command::SoftDrop => self.step_down(presenter),
            Command::RotateCw => self.rotate(Rotation::Clockwise, presenter),
            Command::RotateCcw => self.rotate(Rotation::CounterClockwise, presenter),
            Command::Quit => Ok(StepOutcome::Quit),
        }
    }

    /// Performs one gravity step if the interval has elapsed since the last one.
    pub fn tick<C, P>(&mut self, clock: &C, presenter: &mut P) -> io::Result<Option<StepOutcome>>
    where
        C: Clock + ?Sized,
        P: Presenter + ?Sized,
    {
        if !self.is_running()
            || clock.elapsed_since(self.last_tick_ms) < self.progression.interval_ms
        {
            return Ok(None);
        }
        self.last_tick_ms = clock.now_ms();
        self.step_down(presenter).map(Some)
    }

    fn shift<P>(&mut self, d_col: i32, presenter: &mut P) -> io::Result<StepOutcome>
    where
        P: Presenter + ?Sized,
    {
        let Some(form) = self.form.as_mut() else {
            return Ok(StepOutcome::Ignored);
        };
        if !attempt_move(&mut self.grid, form, 0, d_col) {
            return Ok(StepOutcome::Rejected);
        }
        presenter.present(&self.snapshot())?;
        Ok(StepOutcome::Moved)
    }

    fn rotate<P>(&mut self, rotation: Rotation, presenter: &mut P) -> io::Result<StepOutcome>
    where
        P: Presenter + ?Sized,
    {
        let Some(form) = self.form.as_mut() else {
            return Ok(StepOutcome::Ignored);
        };
        if !attempt_rotate(&mut self.grid, form, rotation) {
            return Ok(StepOutcome::Rejected);
        }
        presenter.present(&self.snapshot())?;
        Ok(StepOutcome::Moved)
    }

    fn step_down<P: Presenter + ?Sized>(&mut self, presenter: &mut P) -> io::Result<StepOutcome> {
        let Some(form) = self.form.as_mut() else {
            return Ok(StepOutcome::Ignored);
        };
        if attempt_move(&mut self.grid, form, 1, 0) {
            presenter.present(&self.snapshot())?;
            return Ok(StepOutcome::Moved);
        }
        self.handle_landing(presenter)
    }

    /// Locks the form, clears completed rows and spawns the next form.
    fn handle_landing<P>(&mut self, presenter: &mut P) -> io::Result<StepOutcome>
    where
        P: Presenter + ?Sized,
    {
        self.grid.lock_active_to_filled();
        if let Some(form) = self.form.take() {
            debug!(shape = ?form.shape, row = form.row, col = form.col, "form locked");
        }
        let rows_cleared = rows::clear_completed_rows(
            &mut self.grid,
            &mut self.progression,
            self.clear_delay,
            presenter,
        )?;
        let spawned = self.spawn_next();
        presenter.present(&self.snapshot())?;
        Ok(if spawned {
            StepOutcome::Landed { rows_cleared }
        } else {
            StepOutcome::GameOver
        })
    }

    fn spawn_next(&mut self) -> bool {
        match lifecycle::spawn(&self.grid, &mut self.rng) {
            Ok(form) => {
                self.grid.paint_active_projection(&form);
                self.form = Some(form);
                true
            }
            Err(blocked) => {
                self.form = None;
                self.status = Status::GameOver;
                info!(score = self.progression.score, %blocked, "game over");
                false
            }
        }
    }
}
