mod config;
mod game;
mod input;
mod scene;
mod snake;
mod term;
mod ticker;

use std::fs::File;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use crossterm::event::Event;
use log::{debug, info};
use simplelog::WriteLogger;

use config::Config;
use game::{GameController, TickOutcome};
use input::Command;
use term::{TermManager, TermRenderer};

pub type TermInt = u16;
/// A position on the playing surface, in multiples of the cell size.
pub type Coords = (i32, i32);

/// How long to wait for input when no game is ticking.
const IDLE_POLL: Duration = Duration::from_millis(250);

fn main() -> Result<()> {
    let config = Config::parse();
    config.validate()?;

    let log_file = File::create(&config.log_file)
        .with_context(|| format!("creating log file {}", config.log_file.display()))?;
    WriteLogger::init(config.log_level, simplelog::Config::default(), log_file)
        .map_err(|e| anyhow!("initialising logger: {}", e))?;
    info!("starting with {:?}", config);

    let mut term = TermManager::new()?;
    term.setup()?;

    let mut game = GameController::new(config, TermRenderer::new(term));
    let result = run(&mut game);

    info!("exiting, last score {}", game.score());
    // Always try to restore the terminal, even if the loop failed.
    let restored = game.into_renderer().restore();
    result.and(restored)
}

fn run(game: &mut GameController<TermRenderer>) -> Result<()> {
    game.redraw()?;

    loop {
        let timeout = game.time_until_tick(Instant::now()).unwrap_or(IDLE_POLL);

        match term::next_event(timeout)? {
            Some(Event::Key(key)) => match input::command_for(&key) {
                Some(Command::Quit) => return Ok(()),
                Some(Command::Turn(dir)) => {
                    game.request_direction(dir);
                }
                Some(Command::Start) => game.start(Instant::now())?,
                Some(Command::Restart) => game.restart(Instant::now())?,
                None => {}
            },
            Some(Event::Resize(width, height)) => game.resize(width, height)?,
            _ => {}
        }

        match game.poll(Instant::now())? {
            Some(TickOutcome::Moved { ate: true }) => debug!("score now {}", game.score()),
            Some(TickOutcome::Crashed(cause)) => debug!("stopped ticking after {:?} collision", cause),
            _ => {}
        }
    }
}
