use crate::{Coords, TermInt};
use crate::scene::{Panels, Renderer, Scene};
use std::{io::{Stdout, Write, stdout}, time::Duration};

use anyhow::{bail, Result};
use crossterm::{cursor, execute, queue, style, terminal};
use crossterm::style::Color;
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::event::{Event, read, poll};

pub type ScreenPos = (TermInt, TermInt);

/// Terminal columns used to draw one grid cell, so cells look square.
const COLS_PER_CELL: TermInt = 2;

const SNAKE_BODY_CHAR: char = '█';
const FOOD_CHAR: char = '●';

const SNAKE_COLOR: Color = Color::Green;
const HEAD_COLOR: Color = Color::DarkGreen;
const FOOD_COLOR: Color = Color::Red;

const HELP_LINES: [&str; 3] = ["Arrow keys or WASD to move", "Enter to start, R to restart", "Q or CTRL+C to quit"];

#[derive(Copy, Clone, PartialEq)]
struct Cell {
    ch: char,
    color: Color,
}

const BLANK: Cell = Cell { ch: ' ', color: Color::Reset };

pub struct TermManager {
    width: TermInt,
    height: TermInt,
    stdout: Stdout,
    screen: Vec<Cell>,
    current_msg: Option<Message>,
}

struct Message {
    top_left: ScreenPos,
    width: TermInt,
    height: TermInt,
}

/// Waits up to `timeout` for a terminal event.
pub fn next_event(timeout: Duration) -> Result<Option<Event>> {
    if poll(timeout)? {
        Ok(Some(read()?))
    } else {
        Ok(None)
    }
}

impl TermManager {
    pub fn new() -> Result<Self> {
        let (width, height) = terminal::size()?;
        let stdout = stdout();
        let screen = vec![BLANK; width as usize * height as usize];
        Ok(TermManager { width, height, stdout, screen, current_msg: None })
    }

    pub fn setup(&mut self) -> Result<()> {
        execute!(self.stdout, EnterAlternateScreen)?;
        terminal::enable_raw_mode()?;
        execute!(self.stdout, cursor::Hide, cursor::DisableBlinking)?;
        Ok(())
    }

    pub fn restore(&mut self) -> Result<()> {
        terminal::disable_raw_mode()?;
        execute!(self.stdout, cursor::Show, cursor::EnableBlinking, LeaveAlternateScreen)?;
        Ok(())
    }

    pub fn get_terminal_size(&self) -> ScreenPos {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: TermInt, height: TermInt) {
        self.width = width;
        self.height = height;
        self.current_msg = None;
        self.screen = vec![BLANK; width as usize * height as usize];
    }

    /// Draws a frame whose outer corners are `top_left` and
    /// `top_left + size - 1`.
    pub fn draw_borders(&mut self, top_left: ScreenPos, size: ScreenPos) -> Result<()> {
        let (x0, y0) = top_left;
        let (width, height) = size;
        let end_x = x0 + width - 1;
        let end_y = y0 + height - 1;

        for x in x0..=end_x {
            let ch = if x == x0 || x == end_x {'+'} else {'-'};
            self.print_at((x, y0), ch, Color::Reset)?;
            self.print_at((x, end_y), ch, Color::Reset)?;
        }

        for y in y0 + 1..end_y {
            self.print_at((x0, y), '|', Color::Reset)?;
            self.print_at((end_x, y), '|', Color::Reset)?;
        }

        Ok(())
    }

    pub fn print_text(&mut self, pos: ScreenPos, text: &str) -> Result<()> {
        for (i, ch) in text.chars().enumerate() {
            self.print_at((pos.0 + i as TermInt, pos.1), ch, Color::Reset)?;
        }
        Ok(())
    }

    pub fn show_message(&mut self, lines: &[&str]) -> Result<()> {
        if self.has_message() {
            self.hide_message()?;
        }

        let msg_height = (lines.len() + 2) as TermInt;
        let msg_width = (lines.iter().map(|x| x.chars().count()).max().unwrap_or(0) + 2) as TermInt;
        let center = (self.width / 2, self.height / 2);
        let top_left = (center.0.saturating_sub(msg_width / 2), center.1.saturating_sub(msg_height / 2));

        // Print the top and bottom empty lines
        for y in [top_left.1, top_left.1 + msg_height - 1].iter() {
            for x_diff in 0..msg_width {
                self.print_at_no_save((top_left.0 + x_diff, *y), ' ')?;
            }
        }

        // Print the message lines
        for (i, line) in lines.iter().enumerate() {
            let padded_line = format!("{line: ^width$}", line = line, width = msg_width as usize);
            let y = top_left.1 + i as TermInt + 1;
            for (x_diff, ch) in padded_line.chars().enumerate() {
                self.print_at_no_save((top_left.0 + x_diff as TermInt, y), ch)?;
            }
        }

        self.current_msg = Some(Message::new(msg_width, msg_height, top_left));
        self.flush()
    }

    pub fn hide_message(&mut self) -> Result<()> {
        let msg = match self.current_msg.take() {
            Some(msg) => msg,
            None => return Ok(()),
        };
        let top_left = msg.top_left();

        // Restore the content from the screen buffer
        for y_diff in 0..msg.height() {
            for x_diff in 0..msg.width() {
                let (x, y) = (top_left.0 + x_diff, top_left.1 + y_diff);
                if let Some(cell) = self.cell(x, y) {
                    queue!(
                        self.stdout,
                        cursor::MoveTo(x, y),
                        style::SetForegroundColor(cell.color),
                        style::Print(cell.ch),
                        style::ResetColor
                    )?;
                }
            }
        }

        self.flush()
    }

    /// Prints into the back buffer as well, so messages can be hidden again.
    /// Positions outside the terminal are skipped.
    pub fn print_at(&mut self, pos: ScreenPos, ch: char, color: Color) -> Result<()> {
        let idx = match self.index(pos.0, pos.1) {
            Some(idx) => idx,
            None => return Ok(()),
        };

        queue!(
            self.stdout,
            cursor::MoveTo(pos.0, pos.1),
            style::SetForegroundColor(color),
            style::Print(ch),
            style::ResetColor
        )?;
        self.screen[idx] = Cell { ch, color };
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.current_msg = None;
        execute!(self.stdout, terminal::Clear(ClearType::All))?;
        self.screen = vec![BLANK; self.width as usize * self.height as usize];
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.stdout.flush()?;
        Ok(())
    }

    pub fn has_message(&self) -> bool {
        self.current_msg.is_some()
    }

    ///////////////////////////////////////////////////////////////////////////

    fn index(&self, x: TermInt, y: TermInt) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(self.width as usize * y as usize + x as usize)
        } else {
            None
        }
    }

    fn cell(&self, x: TermInt, y: TermInt) -> Option<Cell> {
        self.index(x, y).map(|idx| self.screen[idx])
    }

    fn print_at_no_save(&mut self, pos: ScreenPos, ch: char) -> Result<()> {
        // To be used for printing messages, where we don't wanna overwrite our
        // local buffer to restore it when the message is hidden
        if self.index(pos.0, pos.1).is_some() {
            queue!(self.stdout, cursor::MoveTo(pos.0, pos.1), style::Print(ch))?;
        }
        Ok(())
    }
}

impl Message {
    pub fn new(width: TermInt, height: TermInt, top_left: ScreenPos) -> Self {
        Message { width, height, top_left }
    }

    pub fn width(&self) -> TermInt {
        self.width
    }

    pub fn height(&self) -> TermInt {
        self.height
    }

    pub fn top_left(&self) -> ScreenPos {
        self.top_left
    }
}

/// Where the board sits on screen: the border's top-left corner and the
/// border's outer size.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Layout {
    origin: ScreenPos,
    size: ScreenPos,
}

impl Layout {
    /// Centres a board of `columns` x `rows` cells plus one status line
    /// below it. If the terminal is too small, returns the size it needs.
    fn fit(columns: i32, rows: i32, term: ScreenPos) -> std::result::Result<Layout, (u32, u32)> {
        let width = columns as u32 * COLS_PER_CELL as u32 + 2;
        let height = rows as u32 + 2;
        if width > term.0 as u32 || height + 1 > term.1 as u32 {
            return Err((width, height + 1));
        }

        let origin = ((term.0 as u32 - width) / 2, (term.1 as u32 - height - 1) / 2);
        Ok(Layout {
            origin: (origin.0 as TermInt, origin.1 as TermInt),
            size: (width as TermInt, height as TermInt),
        })
    }

    /// Terminal position of a grid cell's first column.
    fn cell_pos(&self, column: i32, row: i32) -> ScreenPos {
        (
            self.origin.0 + 1 + column as TermInt * COLS_PER_CELL,
            self.origin.1 + 1 + row as TermInt,
        )
    }

    fn status_pos(&self) -> ScreenPos {
        (self.origin.0, self.origin.1 + self.size.1)
    }
}

/// Paints scenes onto the terminal. The board is fully redrawn on every
/// call; borders and the menu box only when the visible panels change.
pub struct TermRenderer {
    term: TermManager,
    shown: Option<Panels>,
}

impl TermRenderer {
    pub fn new(term: TermManager) -> Self {
        TermRenderer { term, shown: None }
    }

    pub fn restore(mut self) -> Result<()> {
        self.term.restore()
    }

    fn paint_cell(&mut self, layout: &Layout, scene: &Scene, pos: Coords, ch: char, color: Color) -> Result<()> {
        let (column, row) = scene.cell_of(pos);
        if column < 0 || row < 0 || column >= scene.columns || row >= scene.rows {
            return Ok(());
        }

        let at = layout.cell_pos(column, row);
        for dx in 0..COLS_PER_CELL {
            self.term.print_at((at.0 + dx, at.1), ch, color)?;
        }
        Ok(())
    }

    fn paint_board(&mut self, layout: &Layout, scene: &Scene) -> Result<()> {
        for row in 0..scene.rows {
            let at = layout.cell_pos(0, row);
            for dx in 0..scene.columns as TermInt * COLS_PER_CELL {
                self.term.print_at((at.0 + dx, at.1), ' ', Color::Reset)?;
            }
        }

        self.paint_cell(layout, scene, scene.food, FOOD_CHAR, FOOD_COLOR)?;

        for (i, pos) in scene.body.iter().enumerate().rev() {
            if i == 0 {
                self.paint_cell(layout, scene, *pos, scene.head_char, HEAD_COLOR)?;
            } else {
                self.paint_cell(layout, scene, *pos, SNAKE_BODY_CHAR, SNAKE_COLOR)?;
            }
        }

        Ok(())
    }
}

impl Renderer for TermRenderer {
    fn render(&mut self, scene: &Scene) -> Result<()> {
        let size = self.term.get_terminal_size();
        let layout = match Layout::fit(scene.columns, scene.rows, size) {
            Ok(layout) => layout,
            Err((need_w, need_h)) => bail!("terminal is {}x{}, the board needs {}x{}", size.0, size.1, need_w, need_h),
        };

        let panels = scene.panels;
        if self.shown != Some(panels) {
            self.term.clear()?;
            if panels.board {
                self.term.draw_borders(layout.origin, layout.size)?;
            }
            self.shown = Some(panels);
        }

        if panels.board {
            self.paint_board(&layout, scene)?;
        }

        if panels.score {
            self.term.print_text(layout.status_pos(), &scene.score_text())?;
        }

        if panels.menu {
            let score = scene.score_text();
            let mut lines = vec![scene.title, ""];
            if panels.score {
                lines.push(score.as_str());
                lines.push("");
            }
            lines.extend_from_slice(&HELP_LINES);
            lines.push("");
            if panels.start {
                lines.push("Press Enter to start");
            }
            if panels.restart {
                lines.push("Press R to restart");
            }
            // show_message flushes
            return self.term.show_message(&lines);
        }

        self.term.flush()
    }

    fn resize(&mut self, width: TermInt, height: TermInt) {
        self.term.resize(width, height);
        self.shown = None;
    }
}
