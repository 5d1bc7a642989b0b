use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use log::LevelFilter;
use thiserror::Error;

/// Snake on a fixed grid, played in the terminal.
#[derive(Parser, Debug, Clone)]
#[command(name = "snake-loop", version, about)]
pub struct Config {
    /// Surface width, in the same units as the cell size
    #[arg(long, default_value_t = 400)]
    pub width: i32,

    /// Surface height, in the same units as the cell size
    #[arg(long, default_value_t = 400)]
    pub height: i32,

    /// Size of one grid cell
    #[arg(long, default_value_t = 20)]
    pub cell_size: i32,

    /// Tick interval at the start of a game, in milliseconds
    #[arg(long, default_value_t = 100)]
    pub interval_ms: u64,

    /// How much the interval shrinks at every milestone, in milliseconds
    #[arg(long, default_value_t = 10)]
    pub speedup_ms: u64,

    /// The interval never shrinks below this, in milliseconds
    #[arg(long, default_value_t = 1)]
    pub min_interval_ms: u64,

    /// Every multiple of this score speeds the game up
    #[arg(long, default_value_t = 5)]
    pub milestone: u32,

    /// Seed for food placement
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, default_value = "snake.log")]
    pub log_file: PathBuf,

    /// off, error, warn, info, debug or trace
    #[arg(long, default_value = "info", value_parser = parse_level)]
    pub log_level: LevelFilter,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("cell size must be positive, got {0}")]
    CellSize(i32),
    #[error("{axis} of {value} is not a positive multiple of the cell size {cell}")]
    Surface { axis: &'static str, value: i32, cell: i32 },
    #[error("tick interval must be at least 1ms")]
    ZeroInterval,
    #[error("minimum interval {min}ms exceeds the base interval {base}ms")]
    MinInterval { min: u64, base: u64 },
    #[error("milestone must be at least 1")]
    ZeroMilestone,
}

fn parse_level(s: &str) -> Result<LevelFilter, String> {
    s.parse().map_err(|_| format!("unknown log level `{}`", s))
}

impl Default for Config {
    fn default() -> Self {
        Config {
            width: 400,
            height: 400,
            cell_size: 20,
            interval_ms: 100,
            speedup_ms: 10,
            min_interval_ms: 1,
            milestone: 5,
            seed: None,
            log_file: PathBuf::from("snake.log"),
            log_level: LevelFilter::Info,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cell_size <= 0 {
            return Err(ConfigError::CellSize(self.cell_size));
        }

        for (axis, value) in [("width", self.width), ("height", self.height)] {
            if value <= 0 || value % self.cell_size != 0 {
                return Err(ConfigError::Surface { axis, value, cell: self.cell_size });
            }
        }

        if self.interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.min_interval_ms > self.interval_ms {
            return Err(ConfigError::MinInterval { min: self.min_interval_ms, base: self.interval_ms });
        }
        if self.milestone == 0 {
            return Err(ConfigError::ZeroMilestone);
        }

        Ok(())
    }

    pub fn columns(&self) -> i32 {
        self.width / self.cell_size
    }

    pub fn rows(&self) -> i32 {
        self.height / self.cell_size
    }

    pub fn base_interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn speedup(&self) -> Duration {
        Duration::from_millis(self.speedup_ms)
    }

    pub fn min_interval(&self) -> Duration {
        // Never zero, a zero period would spin the loop.
        Duration::from_millis(self.min_interval_ms.max(1))
    }
}
