use std::collections::VecDeque;

use crate::Coords;
use Direction::*;
use MoveResult::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Collision {
    Wall,
    Body,
}

#[derive(Debug, PartialEq, Eq)]
pub enum MoveResult {
    Moved { new_head: Coords, old_tail: Option<Coords> },
    Crashed(Collision),
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Up => Down,
            Down => Up,
            Left => Right,
            Right => Left,
        }
    }

    /// Unit step in this direction, scaled by the cell size.
    pub fn step(self, cell: i32) -> Coords {
        match self {
            Up => (0, -cell),
            Down => (0, cell),
            Left => (-cell, 0),
            Right => (cell, 0),
        }
    }
}

/// The moving body. Segments are stored head-first.
pub struct Snake {
    body: VecDeque<Coords>,
    direction: Direction,
}

impl Snake {
    pub fn new(head: Coords, direction: Direction) -> Self {
        let mut body = VecDeque::new();
        body.push_back(head);
        Snake { body, direction }
    }

    #[cfg(test)]
    pub fn from_segments(segments: &[Coords], direction: Direction) -> Self {
        Snake { body: segments.iter().copied().collect(), direction }
    }

    pub fn body(&self) -> &VecDeque<Coords> {
        &self.body
    }

    pub fn head(&self) -> Coords {
        // The body is never empty: it starts with one segment and a move
        // always pushes before it pops.
        self.body[0]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn next_head(&self, cell: i32) -> Coords {
        let (x, y) = self.head();
        let (dx, dy) = self.direction.step(cell);
        (x + dx, y + dy)
    }

    /// Moves one cell forward inside a `width` x `height` surface. The tail
    /// stays in place when `grow` returns true for the new head position.
    pub fn move_step<F>(&mut self, cell: i32, width: i32, height: i32, grow: F) -> MoveResult
    where
        F: FnOnce(Coords) -> bool,
    {
        let new_head = self.next_head(cell);

        if new_head.0 < 0 || new_head.1 < 0 || new_head.0 >= width || new_head.1 >= height {
            return Crashed(Collision::Wall);
        }

        // Every current segment counts, the tail included.
        if self.body.contains(&new_head) {
            return Crashed(Collision::Body);
        }

        let old_tail = if grow(new_head) { None } else { self.body.pop_back() };
        self.body.push_front(new_head);

        Moved { new_head, old_tail }
    }

    /// Changes direction unless `new_direction` reverses the current one.
    /// Returns whether the change was accepted.
    pub fn set_direction(&mut self, new_direction: Direction) -> bool {
        match (&new_direction, &self.direction) {
            (Up, Down) | (Down, Up) | (Right, Left) | (Left, Right) => false,
            _ => {
                self.direction = new_direction;
                true
            }
        }
    }

    pub fn get_direction(&self) -> Direction {
        self.direction
    }

    pub fn head_char(&self) -> char {
        match self.direction {
            Up => '^',
            Down => 'v',
            Left => '<',
            Right => '>',
        }
    }
}
