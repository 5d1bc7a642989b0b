use std::time::{Duration, Instant};

use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{Coords, TermInt};
use crate::config::Config;
use crate::scene::{Panels, Renderer, Scene, GAME_OVER_TITLE, MENU_TITLE};
use crate::snake::{Collision, Direction::{self, *}, MoveResult, Snake};
use crate::ticker::Ticker;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GameState {
    Menu,
    Running,
    GameOver,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing happened because no game is running.
    Idle,
    Moved { ate: bool },
    Crashed(Collision),
}

/// Owns every piece of game state. Ticks, key presses and menu commands all
/// go through here, and every change of what is on screen is pushed to the
/// renderer.
pub struct GameController<R: Renderer> {
    config: Config,
    renderer: R,
    rng: StdRng,
    ticker: Ticker,

    state: GameState,
    snake: Snake,
    pending: Option<Direction>,
    food: Coords,
    score: u32,
    interval: Duration,
}

impl<R: Renderer> GameController<R> {
    pub fn new(config: Config, renderer: R) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let snake = Snake::new(center(&config), Up);
        let interval = config.base_interval();

        let mut game = GameController {
            config,
            renderer,
            rng,
            ticker: Ticker::new(),
            state: GameState::Menu,
            snake,
            pending: None,
            food: (0, 0),
            score: 0,
            interval,
        };
        game.food = game.spawn_food();
        game
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    #[cfg(test)]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[cfg(test)]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// How long until the next tick is due, or `None` when not ticking.
    pub fn time_until_tick(&self, now: Instant) -> Option<Duration> {
        self.ticker.time_until_due(now)
    }

    pub fn resize(&mut self, width: TermInt, height: TermInt) -> anyhow::Result<()> {
        self.renderer.resize(width, height);
        self.redraw()
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    pub fn redraw(&mut self) -> anyhow::Result<()> {
        let scene = scene_of(&self.config, self.state, &self.snake, self.food, self.score);
        self.renderer.render(&scene)
    }

    /// Menu -> Running. Ignored in any other state.
    pub fn start(&mut self, now: Instant) -> anyhow::Result<()> {
        if self.state != GameState::Menu {
            debug!("start ignored in {:?}", self.state);
            return Ok(());
        }
        self.begin(now)
    }

    /// Menu or GameOver -> Running with a fresh game. Ignored while running.
    pub fn restart(&mut self, now: Instant) -> anyhow::Result<()> {
        if self.state == GameState::Running {
            debug!("restart ignored while running");
            return Ok(());
        }
        self.begin(now)
    }

    /// Records a turn for the next tick. A reversal of the current heading
    /// is dropped; otherwise the request replaces any earlier pending one.
    pub fn request_direction(&mut self, dir: Direction) -> bool {
        if dir == self.snake.get_direction().opposite() {
            debug!("ignoring reversal to {:?}", dir);
            return false;
        }
        self.pending = Some(dir);
        true
    }

    /// Runs a tick if the timer says one is due.
    pub fn poll(&mut self, now: Instant) -> anyhow::Result<Option<TickOutcome>> {
        if self.ticker.poll_due(now) {
            self.tick(now).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Advances the game by one step and renders the result.
    pub fn tick(&mut self, now: Instant) -> anyhow::Result<TickOutcome> {
        if self.state != GameState::Running {
            return Ok(TickOutcome::Idle);
        }

        if let Some(dir) = self.pending.take() {
            self.snake.set_direction(dir);
        }

        let food = self.food;
        let (cell, width, height) = (self.config.cell_size, self.config.width, self.config.height);
        let outcome = match self.snake.move_step(cell, width, height, |head| head == food) {
            MoveResult::Crashed(cause) => {
                self.game_over(cause);
                TickOutcome::Crashed(cause)
            }
            MoveResult::Moved { new_head, old_tail } => {
                trace!("head at {:?}", new_head);
                let ate = old_tail.is_none();
                if ate {
                    self.eat(now);
                }
                TickOutcome::Moved { ate }
            }
        };

        self.redraw()?;
        Ok(outcome)
    }

    ///////////////////////////////////////////////////////////////////////////

    fn begin(&mut self, now: Instant) -> anyhow::Result<()> {
        self.snake = Snake::new(center(&self.config), Up);
        self.pending = None;
        self.food = self.spawn_food();
        self.score = 0;
        self.interval = self.config.base_interval();
        self.state = GameState::Running;
        self.ticker.start(self.interval, now);

        info!("game started, food at {:?}", self.food);
        self.redraw()
    }

    fn eat(&mut self, now: Instant) {
        self.score += 1;

        if self.score % self.config.milestone == 0 {
            let faster = self.interval.checked_sub(self.config.speedup()).unwrap_or_default();
            self.interval = faster.max(self.config.min_interval());
            self.ticker.start(self.interval, now);
            debug!("score {} reached, interval now {:?}", self.score, self.ticker.interval());
        }

        self.food = self.spawn_food();
    }

    fn game_over(&mut self, cause: Collision) {
        self.ticker.cancel();
        self.state = GameState::GameOver;
        info!("game over ({:?}) with score {}, length {}", cause, self.score, self.snake.len());
    }

    /// Any cell on the grid, occupied or not.
    fn spawn_food(&mut self) -> Coords {
        let cell = self.config.cell_size;
        let x = self.rng.gen_range(0..self.config.columns()) * cell;
        let y = self.rng.gen_range(0..self.config.rows()) * cell;
        debug!("food at {:?}", (x, y));
        (x, y)
    }
}

fn scene_of<'a>(config: &Config, state: GameState, snake: &'a Snake, food: Coords, score: u32) -> Scene<'a> {
    Scene {
        panels: Panels::for_state(state),
        title: if state == GameState::GameOver { GAME_OVER_TITLE } else { MENU_TITLE },
        score,
        columns: config.columns(),
        rows: config.rows(),
        cell_size: config.cell_size,
        food,
        body: snake.body(),
        head_char: snake.head_char(),
    }
}

fn center(config: &Config) -> Coords {
    (config.columns() / 2 * config.cell_size, config.rows() / 2 * config.cell_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::testing::Recorder;

    fn game() -> GameController<Recorder> {
        let config = Config { seed: Some(42), ..Config::default() };
        GameController::new(config, Recorder::default())
    }

    fn running() -> (GameController<Recorder>, Instant) {
        let mut game = game();
        let now = Instant::now();
        game.start(now).unwrap();
        (game, now)
    }

    fn body(game: &GameController<Recorder>) -> Vec<Coords> {
        game.snake.body().iter().copied().collect()
    }

    fn on_grid(pos: Coords) -> bool {
        pos.0 >= 0 && pos.1 >= 0 && pos.0 < 400 && pos.1 < 400 && pos.0 % 20 == 0 && pos.1 % 20 == 0
    }

    #[test]
    fn starts_in_menu_without_ticking() {
        let mut game = game();
        let now = Instant::now();

        assert_eq!(game.state(), GameState::Menu);
        assert_eq!(game.time_until_tick(now), None);
        assert_eq!(game.tick(now).unwrap(), TickOutcome::Idle);
        assert!(game.renderer().frames.is_empty());
    }

    #[test]
    fn start_resets_and_begins_ticking() {
        let (game, now) = running();

        assert_eq!(game.state(), GameState::Running);
        assert_eq!(body(&game), vec![(200, 200)]);
        assert_eq!(game.snake.get_direction(), Up);
        assert_eq!(game.score(), 0);
        assert_eq!(game.interval(), Duration::from_millis(100));
        assert_eq!(game.time_until_tick(now), Some(Duration::from_millis(100)));
        assert!(on_grid(game.food));

        let frame = game.renderer().last();
        assert!(frame.panels.board && frame.panels.score && !frame.panels.menu);
        assert_eq!(frame.score_text, "Score: 0");
    }

    #[test]
    fn eating_grows_scores_and_moves_food() {
        let (mut game, now) = running();
        game.snake = Snake::from_segments(&[(100, 120)], Up);
        game.food = (100, 100);
        // The same draws the game is about to make for the next food cell.
        let mut rng = game.rng.clone();
        let next_food = (rng.gen_range(0..20) * 20, rng.gen_range(0..20) * 20);

        assert_eq!(game.tick(now).unwrap(), TickOutcome::Moved { ate: true });
        assert_eq!(game.score(), 1);
        assert_eq!(body(&game), vec![(100, 100), (100, 120)]);
        assert_eq!(game.food, next_food);
        assert!(on_grid(game.food));
        assert_eq!(game.renderer().last().score_text, "Score: 1");
    }

    #[test]
    fn plain_move_drops_the_tail() {
        let (mut game, now) = running();
        game.snake = Snake::from_segments(&[(40, 40), (40, 60), (40, 80)], Up);
        game.food = (300, 300);

        assert_eq!(game.tick(now).unwrap(), TickOutcome::Moved { ate: false });
        assert_eq!(body(&game), vec![(40, 20), (40, 40), (40, 60)]);
        assert_eq!(game.score(), 0);
        assert_eq!(game.renderer().last().body, vec![(40, 20), (40, 40), (40, 60)]);
    }

    #[test]
    fn hitting_the_left_wall_ends_the_game() {
        let (mut game, now) = running();
        game.snake = Snake::from_segments(&[(0, 100)], Left);
        game.food = (300, 300);

        assert_eq!(game.tick(now).unwrap(), TickOutcome::Crashed(Collision::Wall));
        assert_eq!(game.state(), GameState::GameOver);
        assert_eq!(game.time_until_tick(now), None);
        assert_eq!(body(&game), vec![(0, 100)]);

        let frame = game.renderer().last();
        assert_eq!(frame.title, "Game Over");
        assert!(frame.panels.menu && frame.panels.restart && frame.panels.score);
        assert!(!frame.panels.board && !frame.panels.start);

        assert_eq!(game.tick(now).unwrap(), TickOutcome::Idle);
    }

    #[test]
    fn biting_itself_ends_the_game() {
        let (mut game, now) = running();
        game.snake = Snake::from_segments(&[(20, 20), (40, 20), (40, 40), (20, 40), (0, 40)], Right);
        game.food = (300, 300);
        game.request_direction(Down);

        assert_eq!(game.tick(now).unwrap(), TickOutcome::Crashed(Collision::Body));
        assert_eq!(game.state(), GameState::GameOver);
    }

    #[test]
    fn reversal_requests_are_ignored() {
        let (mut game, now) = running();
        game.snake = Snake::from_segments(&[(100, 100), (100, 120)], Up);
        game.food = (300, 300);

        assert!(!game.request_direction(Down));
        game.tick(now).unwrap();
        assert_eq!(game.snake.get_direction(), Up);
        assert_eq!(game.snake.head(), (100, 80));
    }

    #[test]
    fn only_the_latest_request_applies_and_only_on_tick() {
        let (mut game, now) = running();
        game.snake = Snake::from_segments(&[(100, 100)], Up);
        game.food = (300, 300);

        assert!(game.request_direction(Left));
        assert!(game.request_direction(Right));
        assert_eq!(game.snake.get_direction(), Up);

        game.tick(now).unwrap();
        assert_eq!(game.snake.head(), (120, 100));
    }

    #[test]
    fn quick_turns_cannot_fold_back_between_ticks() {
        let (mut game, now) = running();
        game.snake = Snake::from_segments(&[(100, 100), (100, 120)], Up);
        game.food = (300, 300);

        assert!(game.request_direction(Left));
        // Checked against the heading the snake has now, not the pending one.
        assert!(!game.request_direction(Down));

        game.tick(now).unwrap();
        assert_eq!(game.snake.head(), (80, 100));
        assert_eq!(game.state(), GameState::Running);
    }

    #[test]
    fn milestones_speed_up_the_timer() {
        let (mut game, now) = running();
        let mut last = game.interval();

        for milestone in 1..=10 {
            game.score = milestone * 5 - 1;
            game.snake = Snake::from_segments(&[(100, 120)], Up);
            game.food = (100, 100);
            let t = now + Duration::from_secs(milestone as u64);

            game.tick(t).unwrap();

            assert_eq!(game.score(), milestone * 5);
            assert!(game.interval() < last);
            assert_eq!(game.time_until_tick(t), Some(game.interval()));
            last = game.interval();
        }
        assert_eq!(last, Duration::from_millis(1));
    }

    #[test]
    fn scores_off_milestone_keep_the_interval() {
        let (mut game, now) = running();
        game.score = 2;
        game.snake = Snake::from_segments(&[(100, 120)], Up);
        game.food = (100, 100);

        game.tick(now).unwrap();
        assert_eq!(game.score(), 3);
        assert_eq!(game.interval(), Duration::from_millis(100));
    }

    #[test]
    fn interval_stops_at_the_floor() {
        let (mut game, now) = running();
        game.interval = Duration::from_millis(5);

        for score in [49, 54].iter() {
            game.score = *score;
            game.snake = Snake::from_segments(&[(100, 120)], Up);
            game.food = (100, 100);

            game.tick(now).unwrap();
            assert_eq!(game.interval(), Duration::from_millis(1));
        }
    }

    #[test]
    fn restart_after_game_over_resets_everything() {
        let (mut game, now) = running();
        game.score = 17;
        game.interval = Duration::from_millis(70);
        game.snake = Snake::from_segments(&[(0, 40), (0, 60), (0, 80)], Left);

        game.tick(now).unwrap();
        assert_eq!(game.state(), GameState::GameOver);

        // The start control is hidden after a game over.
        game.start(now).unwrap();
        assert_eq!(game.state(), GameState::GameOver);

        game.restart(now).unwrap();
        assert_eq!(game.state(), GameState::Running);
        assert_eq!(game.score(), 0);
        assert_eq!(game.snake.len(), 1);
        assert_eq!(game.interval(), Duration::from_millis(100));
        assert_eq!(game.time_until_tick(now), Some(Duration::from_millis(100)));
        assert_eq!(game.renderer().last().title, "Snake Game");
    }

    #[test]
    fn commands_are_ignored_while_running() {
        let (mut game, now) = running();
        game.score = 3;

        game.start(now).unwrap();
        game.restart(now).unwrap();
        assert_eq!(game.score(), 3);
    }

    #[test]
    fn restart_works_from_the_menu() {
        let mut game = game();
        game.restart(Instant::now()).unwrap();
        assert_eq!(game.state(), GameState::Running);
    }

    #[test]
    fn poll_ticks_only_when_due() {
        let (mut game, now) = running();
        game.snake = Snake::from_segments(&[(100, 100)], Up);
        game.food = (300, 300);

        assert_eq!(game.poll(now + Duration::from_millis(50)).unwrap(), None);
        assert_eq!(
            game.poll(now + Duration::from_millis(100)).unwrap(),
            Some(TickOutcome::Moved { ate: false })
        );
        assert_eq!(game.snake.head(), (100, 80));
    }

    // Food placement ignores occupancy; overlap is allowed.
    #[test]
    fn food_can_land_on_the_body() {
        let (mut game, _) = running();
        let row: Vec<Coords> = (0..20).map(|i| (i * 20, 200)).collect();
        game.snake = Snake::from_segments(&row, Up);

        let mut landed_on_body = false;
        for _ in 0..500 {
            let food = game.spawn_food();
            assert!(on_grid(food));
            landed_on_body |= row.contains(&food);
        }
        assert!(landed_on_body);
    }

    #[test]
    fn food_under_the_body_is_a_collision_first() {
        let (mut game, now) = running();
        game.snake = Snake::from_segments(&[(20, 20), (40, 20), (40, 40), (20, 40), (0, 40)], Down);
        game.food = (20, 40);

        assert_eq!(game.tick(now).unwrap(), TickOutcome::Crashed(Collision::Body));
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn seeded_games_place_food_identically() {
        let a = game();
        let b = game();
        assert_eq!(a.food, b.food);
    }
}
