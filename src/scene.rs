use std::collections::VecDeque;

use crate::{Coords, TermInt};
use crate::game::GameState;

pub const MENU_TITLE: &str = "Snake Game";
pub const GAME_OVER_TITLE: &str = "Game Over";

/// Which parts of the screen are shown. Derived from the game state alone.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Panels {
    pub menu: bool,
    pub board: bool,
    pub score: bool,
    pub start: bool,
    pub restart: bool,
}

impl Panels {
    pub fn for_state(state: GameState) -> Self {
        match state {
            GameState::Menu => Panels { menu: true, board: false, score: false, start: true, restart: false },
            GameState::Running => Panels { menu: false, board: true, score: true, start: false, restart: false },
            GameState::GameOver => Panels { menu: true, board: false, score: true, start: false, restart: true },
        }
    }
}

/// Read-only view of everything a renderer needs for one frame.
pub struct Scene<'a> {
    pub panels: Panels,
    pub title: &'static str,
    pub score: u32,
    pub columns: i32,
    pub rows: i32,
    pub cell_size: i32,
    pub food: Coords,
    pub body: &'a VecDeque<Coords>,
    pub head_char: char,
}

impl Scene<'_> {
    pub fn score_text(&self) -> String {
        format!("Score: {}", self.score)
    }

    /// Converts a surface position to its (column, row) on the grid.
    pub fn cell_of(&self, pos: Coords) -> (i32, i32) {
        (pos.0 / self.cell_size, pos.1 / self.cell_size)
    }
}

pub trait Renderer {
    fn render(&mut self, scene: &Scene) -> anyhow::Result<()>;

    /// The output surface changed size; the next render must repaint it all.
    fn resize(&mut self, _width: TermInt, _height: TermInt) {}
}
