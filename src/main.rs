//! Formfall: falling 3x3 forms in the terminal. Move, rotate, lock, clear full rows.

mod app;
mod collision;
mod form;
mod game;
mod grid;
mod input;
mod lifecycle;
mod rows;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use rows::MIN_INTERVAL_MS;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Smallest grid the 3x3 form box fits in with the spawn row at 1.
const MIN_COLS: usize = 3;
const MIN_ROWS: usize = 4;

/// Session parameters derived from the CLI. Grid dimensions come from the
/// playfield pixel size divided by the block size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    pub block_size: u32,
    pub initial_interval_ms: u64,
    pub clear_row_delay_ms: u64,
    pub refresh_ms: u64,
    pub seed: Option<u64>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("block size must be positive")]
    ZeroBlockSize,
    #[error("gravity interval {0} ms is below the {MIN_INTERVAL_MS} ms floor")]
    IntervalBelowFloor(u64),
    #[error(
        "{width}x{height} px with {block}px blocks gives {cols}x{rows} cells; \
         need at least {MIN_COLS}x{MIN_ROWS}"
    )]
    GridTooSmall {
        width: u32,
        height: u32,
        block: u32,
        cols: usize,
        rows: usize,
    },
}

impl GameConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        if args.block_size == 0 {
            return Err(ConfigError::ZeroBlockSize);
        }
        if args.gravity_ms < MIN_INTERVAL_MS {
            return Err(ConfigError::IntervalBelowFloor(args.gravity_ms));
        }
        let cols = (args.width / args.block_size) as usize;
        let rows = (args.height / args.block_size) as usize;
        if cols < MIN_COLS || rows < MIN_ROWS {
            return Err(ConfigError::GridTooSmall {
                width: args.width,
                height: args.height,
                block: args.block_size,
                cols,
                rows,
            });
        }
        Ok(Self {
            rows,
            cols,
            block_size: args.block_size,
            initial_interval_ms: args.gravity_ms,
            clear_row_delay_ms: args.clear_delay_ms,
            refresh_ms: args.refresh_ms,
            seed: args.seed,
        })
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette)
        .with_context(|| format!("failed to load theme {:?}", args.theme))?;
    let config = GameConfig::from_args(&args).context("invalid playfield configuration")?;
    tracing::info!(?config, "configuration");

    let mut app = App::new(&args, config, theme);
    app.run()?;

    let score = app.session().score();
    if app.game_over() {
        tracing::info!(score, "game over");
        println!("Game Over\nScore: {score}");
    } else {
        println!("Score: {score}");
    }
    Ok(())
}

/// Structured logs go to `--log-file` only; stdout belongs to the terminal UI.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

/// Falling-form puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "formfall",
    version,
    about = "Falling-form puzzle in the terminal. Steer 3x3 forms, fill rows to clear them; \
        every clear speeds the game up.",
    long_about = "Formfall drops random 3x3 forms onto a grid. A form locks when it cannot fall \
        further; full rows flash, vanish and the rows above drop down. Each cleared row scores \
        1000 / (current gravity interval in ms) and shortens the interval by 10 ms, down to 50 ms. \
        The game ends when a new form cannot spawn.\n\n\
        CONTROLS:\n\
        \x20 Left/Right h/l  Move        Down j   Soft drop\n\
        \x20 E Up k          Rotate CW   Q u      Rotate CCW\n\
        \x20 Esc / Ctrl-C    Quit"
)]
pub struct Args {
    /// Playfield width in pixels; columns = width / block size.
    #[arg(long, default_value = "420", value_name = "PX")]
    pub width: u32,

    /// Playfield height in pixels; rows = height / block size.
    #[arg(long, default_value = "600", value_name = "PX")]
    pub height: u32,

    /// Block size in pixels.
    #[arg(long, default_value = "30", value_name = "PX")]
    pub block_size: u32,

    /// Initial gravity interval in ms (time between automatic drops), at least 50.
    #[arg(long, default_value = "500", value_name = "MS")]
    pub gravity_ms: u64,

    /// Delay of each row-clear animation phase in ms.
    #[arg(long, default_value = "50", value_name = "MS")]
    pub clear_delay_ms: u64,

    /// Input poll period of the main loop in ms.
    #[arg(long, default_value = "10", value_name = "MS")]
    pub refresh_ms: u64,

    /// Seed for the form generator (reproducible games).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]=\"value\").
    /// Classic red/green/blue if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Form colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: PaletteChoice,

    /// Write structured logs to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Disable the game-over fade.
    #[arg(long)]
    pub no_animation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PaletteChoice {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("formfall").chain(extra.iter().copied())).unwrap()
    }

    #[test]
    fn test_default_grid_is_twenty_by_fourteen() {
        let config = GameConfig::from_args(&args(&[])).unwrap();
        assert_eq!((config.rows, config.cols), (20, 14));
        assert_eq!(config.initial_interval_ms, 500);
        assert_eq!(config.clear_row_delay_ms, 50);
        assert_eq!(config.refresh_ms, 10);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_dimensions_round_down() {
        let config = GameConfig::from_args(&args(&[
            "--width", "100", "--height", "200", "--block-size", "20",
        ]))
        .unwrap();
        assert_eq!((config.rows, config.cols), (10, 5));
    }

    #[test]
    fn test_too_small_grid_is_rejected() {
        let err =
            GameConfig::from_args(&args(&["--width", "60", "--block-size", "30"])).unwrap_err();
        assert!(matches!(err, ConfigError::GridTooSmall { cols: 2, .. }));
    }

    #[test]
    fn test_zero_values_are_rejected() {
        assert_eq!(
            GameConfig::from_args(&args(&["--block-size", "0"])),
            Err(ConfigError::ZeroBlockSize)
        );
        assert_eq!(
            GameConfig::from_args(&args(&["--gravity-ms", "0"])),
            Err(ConfigError::IntervalBelowFloor(0))
        );
    }

    #[test]
    fn test_gravity_below_floor_is_rejected() {
        assert_eq!(
            GameConfig::from_args(&args(&["--gravity-ms", "20"])),
            Err(ConfigError::IntervalBelowFloor(20))
        );
        assert_eq!(
            GameConfig::from_args(&args(&["--gravity-ms", "49"])),
            Err(ConfigError::IntervalBelowFloor(49))
        );
        let config = GameConfig::from_args(&args(&["--gravity-ms", "50"])).unwrap();
        let mut progression = rows::Progression::new(config.initial_interval_ms);
        assert_eq!(progression.record_clear(), 20);
        assert_eq!(progression.interval_ms, MIN_INTERVAL_MS);
    }

    #[test]
    fn test_palette_aliases() {
        assert_eq!(args(&["--palette", "contrast"]).palette, PaletteChoice::HighContrast);
        assert_eq!(args(&["--palette", "colourblind"]).palette, PaletteChoice::Colorblind);
    }

    #[test]
    fn test_seed_is_passed_through() {
        let config = GameConfig::from_args(&args(&["--seed", "7"])).unwrap();
        assert_eq!(config.seed, Some(7));
    }
}
