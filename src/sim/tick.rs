//! Fixed timestep simulation
//!
//! The `Game` context owns the whole mutable world: game state, paddle,
//! playfield bounds, input flags, the fixed-step accumulator, the sim clock
//! and the seeded RNG. A driver calls the input methods from its event
//! handlers and `step` once per animation frame; a test harness calls `step`
//! with synthetic deltas.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::collision::{
    center_rect_hits_brick, center_rects_overlap, resolve_brick_collision,
    resolve_paddle_collision, resolve_wall_collision,
};
use super::state::{
    Ball, Brick, BrickStatus, GameMode, GameState, Overlay, Paddle, Playfield, PowerUp,
    PowerUpKind, Rocket, Shield,
};
use crate::consts::*;

/// Neon primary/secondary pairs cycled across the brick grid
const BRICK_PALETTES: [[&str; 2]; 6] = [
    ["#00f7ff", "#1593ff"],
    ["#9a4dff", "#542dff"],
    ["#ff6bf6", "#f92672"],
    ["#ffe66d", "#ff9f1c"],
    ["#6bf7c2", "#4cc9f0"],
    ["#ff85a1", "#d83f87"],
];

/// Held-key and pointer-drag flags, set by the driver between frames
#[derive(Debug, Clone, Copy, Default)]
struct InputState {
    left: bool,
    right: bool,
    pointer_active: bool,
}

/// The simulation context. One instance per running game.
pub struct Game {
    pub state: GameState,
    pub paddle: Paddle,
    pub field: Playfield,
    input: InputState,
    accumulator: f32,
    clock: f64,
    rng: Pcg32,
}

impl Game {
    /// Create a fresh game sized to the canvas, with a generated brick
    /// field and one ball parked on the paddle.
    pub fn new(canvas_width: f32, canvas_height: f32, seed: u64) -> Self {
        let field = Playfield::new(canvas_width, canvas_height);
        let paddle = Paddle::new(&field);
        let mut rng = Pcg32::seed_from_u64(seed);

        let mut state = GameState::new();
        state.bricks = create_bricks(state.level, &field, &mut rng);
        state.overlay = Some(Overlay::new(
            "Launch Sequence Ready",
            "Press Space or tap Launch to begin your mission.",
        ));

        let mut game = Self {
            state,
            paddle,
            field,
            input: InputState::default(),
            accumulator: 0.0,
            clock: 0.0,
            rng,
        };
        game.reset_balls();
        log::info!("game initialized with seed {seed}");
        game
    }

    /// Simulation clock in seconds (sum of clamped frame deltas). The
    /// shield expiry and renderer animations key off this.
    #[inline]
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Base ball speed for the current level
    #[inline]
    pub fn base_ball_speed(&self) -> f32 {
        BALL_BASE_SPEED + (self.state.level - 1) as f32 * BALL_LEVEL_SPEED
    }

    // --- Input -----------------------------------------------------------

    pub fn set_moving_left(&mut self, held: bool) {
        self.input.left = held;
    }

    pub fn set_moving_right(&mut self, held: bool) {
        self.input.right = held;
    }

    /// Pointer pressed at a canvas x coordinate: start dragging the paddle.
    pub fn pointer_down(&mut self, x: f32) {
        self.input.pointer_active = true;
        self.paddle.set_x(x, &self.field);
    }

    /// Pointer moved; only tracks while a drag is active.
    pub fn pointer_move(&mut self, x: f32) {
        if self.input.pointer_active {
            self.paddle.set_x(x, &self.field);
        }
    }

    pub fn pointer_up(&mut self) {
        self.input.pointer_active = false;
    }

    /// Launch/restart action. From `Ready` this starts the round; from
    /// `GameOver` it resets score, lives and level first. No-op while
    /// running.
    pub fn launch(&mut self) {
        if self.state.mode == GameMode::Running {
            return;
        }
        if self.state.mode == GameMode::GameOver {
            self.state.score = 0;
            self.state.lives = 3;
            self.state.level = 1;
            self.state.shield = None;
            self.state.bricks = create_bricks(self.state.level, &self.field, &mut self.rng);
            self.reset_balls();
        }
        if self.state.bricks.is_empty() {
            self.state.bricks = create_bricks(self.state.level, &self.field, &mut self.rng);
        }
        if self.state.balls.is_empty() {
            self.reset_balls();
        }
        self.state.bricks_since_drop = 0;
        self.state.mode = GameMode::Running;
        self.state.overlay = None;
        self.accumulator = 0.0;
        log::info!("launched at level {}", self.state.level);
    }

    /// Recompute playfield bounds for a new canvas size and re-clamp the
    /// paddle. Safe at any point; the next frame reads fresh values.
    pub fn resize(&mut self, canvas_width: f32, canvas_height: f32) {
        self.field = Playfield::new(canvas_width, canvas_height);
        let x = self.paddle.x();
        self.paddle.set_x(x, &self.field);
    }

    // --- Frame update ----------------------------------------------------

    /// Advance the simulation by one frame. The delta is clamped, fed into
    /// the fixed-step accumulator, and the frame-rate timers (power-ups,
    /// rocket, shield) run on the clamped delta afterwards.
    pub fn step(&mut self, delta_seconds: f32) {
        let dt = delta_seconds.min(MAX_FRAME_DELTA);
        self.clock += dt as f64;

        self.apply_movement_input(dt);
        self.position_ready_balls();

        self.accumulator += dt;
        while self.accumulator >= PHYSICS_STEP {
            self.physics_step(PHYSICS_STEP);
            self.accumulator -= PHYSICS_STEP;
        }

        self.update_power_ups(dt);
        self.update_rocket(dt);
        self.update_shield();
    }

    fn apply_movement_input(&mut self, dt: f32) {
        let movement = self.paddle.speed * dt;
        if self.input.left {
            let x = self.paddle.x() - movement;
            self.paddle.set_x(x, &self.field);
        }
        if self.input.right {
            let x = self.paddle.x() + movement;
            self.paddle.set_x(x, &self.field);
        }
    }

    /// Parked balls ride the paddle until launch
    fn position_ready_balls(&mut self) {
        if self.state.mode != GameMode::Ready {
            return;
        }
        let x = self.paddle.x();
        let y = self.paddle.y(&self.field) - self.paddle.height / 2.0;
        for ball in &mut self.state.balls {
            ball.pos.x = x;
            ball.pos.y = y - ball.radius - 2.0;
        }
    }

    // --- Fixed-step physics ----------------------------------------------

    fn physics_step(&mut self, dt: f32) {
        if self.state.mode != GameMode::Running {
            return;
        }

        let balls = std::mem::take(&mut self.state.balls);
        let mut survivors = Vec::with_capacity(balls.len());

        for mut ball in balls {
            self.integrate_ball(&mut ball, dt);

            if self.state.mode != GameMode::Running {
                // A brick hit cleared the level mid-step; the round reset
                // already rebuilt the ball set.
                return;
            }

            if ball.pos.y + ball.radius >= self.field.bottom {
                let saved = self
                    .state
                    .shield
                    .is_some_and(|shield| shield.active(self.clock));
                if saved {
                    ball.pos.y = self.field.bottom - ball.radius - 1.0;
                    ball.vel.y = -ball.vel.y.abs();
                    self.state.shield = None;
                    survivors.push(ball);
                }
                continue;
            }

            survivors.push(ball);
        }

        if survivors.is_empty() {
            self.state.lives = self.state.lives.saturating_sub(1);
            if self.state.lives > 0 {
                self.reset_round(Some(
                    "Shields absorbed the hit. Press Space to relaunch.",
                ));
            } else {
                self.game_over();
            }
        } else {
            if survivors.len() > MAX_ACTIVE_BALLS {
                let excess = survivors.len() - MAX_ACTIVE_BALLS;
                survivors.drain(..excess);
            }
            self.state.balls = survivors;
        }
    }

    /// Sub-stepped integration: bound per-substep travel so a fast ball
    /// cannot tunnel through a thin brick, resolving walls, bricks and the
    /// paddle in that order, then applying the spin drift.
    fn integrate_ball(&mut self, ball: &mut Ball, dt: f32) {
        let substeps = (dt / MAX_BALL_SUBSTEP).ceil().max(1.0) as u32;
        let step = dt / substeps as f32;

        for _ in 0..substeps {
            ball.pos += ball.vel * step;

            resolve_wall_collision(ball, &self.field);
            if let Some(index) = resolve_brick_collision(ball, &self.state.bricks)
                && self.destroy_brick(index)
            {
                self.check_level_cleared();
            }
            let base_speed = self.base_ball_speed();
            resolve_paddle_collision(ball, &self.paddle, &self.field, base_speed, &mut self.rng);

            ball.pos.x += ball.spin * SPIN_DRIFT * step;

            if self.state.mode != GameMode::Running {
                break;
            }
        }
    }

    // --- Brick destruction & scoring -------------------------------------

    /// Flip a brick to destroyed and apply scoring and the power-up drop
    /// check. Returns false if the brick was already destroyed; the
    /// alive-to-destroyed transition happens at most once per brick life.
    fn destroy_brick(&mut self, index: usize) -> bool {
        let brick = &mut self.state.bricks[index];
        if !brick.alive() {
            return false;
        }
        brick.status = BrickStatus::Destroyed;
        let center = brick.center();
        self.state.score += BRICK_SCORE * self.state.level as u64;
        self.maybe_drop_power_up(center);
        true
    }

    /// Drop a power-up when the guarantee counter fills or the chance draw
    /// fires; the random draw is skipped on a guaranteed drop.
    fn maybe_drop_power_up(&mut self, center: Vec2) {
        self.state.bricks_since_drop += 1;
        let guaranteed = self.state.bricks_since_drop >= POWER_UP_GUARANTEE_INTERVAL;
        if !guaranteed && self.rng.random::<f32>() >= POWER_UP_CHANCE {
            return;
        }
        self.state.bricks_since_drop = 0;
        let kind = PowerUpKind::ALL[self.rng.random_range(0..PowerUpKind::ALL.len())];
        self.state.power_ups.push(PowerUp::at(kind, center));
    }

    fn check_level_cleared(&mut self) {
        if self.state.mode == GameMode::Running && self.state.alive_bricks() == 0 {
            self.advance_level();
        }
    }

    fn advance_level(&mut self) {
        self.state.level += 1;
        self.state.bricks = create_bricks(self.state.level, &self.field, &mut self.rng);
        self.reset_round(Some(
            "Sector cleared. Press Space or launch to enter the next anomaly.",
        ));
        log::info!("advanced to level {}", self.state.level);
    }

    // --- Round transitions ------------------------------------------------

    fn reset_balls(&mut self) {
        let speed = self.base_ball_speed();
        self.state.balls = vec![Ball::spawn(&self.paddle, &self.field, speed, &mut self.rng)];
    }

    /// Back to `Ready` with transient entities cleared; the shield, if any,
    /// keeps ticking across the reset.
    fn reset_round(&mut self, message: Option<&str>) {
        self.state.mode = GameMode::Ready;
        self.reset_balls();
        self.state.power_ups.clear();
        self.state.rocket = None;
        self.state.bricks_since_drop = 0;
        self.accumulator = 0.0;
        self.state.overlay = Some(match message {
            Some(text) => Overlay::new("Mission Update", text),
            None => Overlay::new(
                "Launch Sequence Ready",
                "Press Space or tap Launch to continue.",
            ),
        });
    }

    fn game_over(&mut self) {
        self.state.mode = GameMode::GameOver;
        self.state.balls.clear();
        self.state.power_ups.clear();
        self.state.rocket = None;
        self.state.shield = None;
        self.state.bricks_since_drop = 0;
        self.accumulator = 0.0;
        self.state.overlay = Some(Overlay::with_button(
            "Mission Failed",
            &format!(
                "Final score: {}. Press Space or launch to restart.",
                self.state.score
            ),
            "Restart",
        ));
        log::info!("game over with score {}", self.state.score);
    }

    // --- Power-up lifecycle ----------------------------------------------

    fn update_power_ups(&mut self, dt: f32) {
        if self.state.mode != GameMode::Running {
            return;
        }

        let paddle_pos = Vec2::new(self.paddle.x(), self.paddle.y(&self.field));
        let paddle_size = Vec2::new(self.paddle.width, self.paddle.height);
        let bottom = self.field.bottom;

        let mut collected: Vec<PowerUpKind> = Vec::new();
        self.state.power_ups.retain_mut(|power_up| {
            power_up.pos.y += power_up.fall_speed * dt;

            if power_up.pos.y - power_up.height / 2.0 > bottom + power_up.height {
                return false;
            }

            let size = Vec2::new(power_up.width, power_up.height);
            if center_rects_overlap(power_up.pos, size, paddle_pos, paddle_size) {
                collected.push(power_up.kind);
                return false;
            }

            true
        });

        for kind in collected {
            self.apply_power_up(kind);
        }
    }

    fn apply_power_up(&mut self, kind: PowerUpKind) {
        match kind {
            PowerUpKind::MultiBall => self.activate_multi_ball(),
            PowerUpKind::Shield => {
                // Replaces any existing shield, extending the window
                self.state.shield = Some(Shield::new(self.clock));
            }
            PowerUpKind::Rocket => {
                // Re-arming replaces a rocket already in flight
                self.state.rocket = Some(Rocket::armed(&self.paddle, &self.field));
            }
        }
    }

    /// Clone every active ball into two more at ±0.4 rad off its heading.
    /// Past the cap the oldest balls are dropped.
    fn activate_multi_ball(&mut self) {
        if self.state.balls.is_empty() {
            self.reset_balls();
            return;
        }

        let base_speed = self.base_ball_speed();
        let mut clones = Vec::new();
        for source in self.state.balls.iter().take(MAX_ACTIVE_BALLS) {
            let speed = source.vel.length().max(base_speed);
            let heading = source.vel.y.atan2(source.vel.x);
            for offset in [-0.4f32, 0.4] {
                clones.push(Ball::split(source, heading + offset, speed, offset));
            }
        }

        self.state.balls.extend(clones);
        let len = self.state.balls.len();
        if len > MAX_ACTIVE_BALLS {
            self.state.balls.drain(..len - MAX_ACTIVE_BALLS);
        }
    }

    // --- Rocket lifecycle ------------------------------------------------

    fn update_rocket(&mut self, dt: f32) {
        let Some(mut rocket) = self.state.rocket else {
            return;
        };

        if self.state.mode != GameMode::Running {
            // Armed but not launched: ride the paddle
            self.state.rocket = Some(Rocket::armed(&self.paddle, &self.field));
            return;
        }

        rocket.pos.y -= rocket.speed * dt;
        let nose = rocket.pos.y - rocket.height / 2.0;

        let struck = self
            .state
            .bricks
            .iter()
            .any(|brick| {
                brick.alive()
                    && center_rect_hits_brick(rocket.pos, rocket.width, rocket.height, brick)
            });

        if struck {
            self.state.rocket = None;
            self.explode_rocket(Vec2::new(rocket.pos.x, nose));
        } else if nose <= self.field.top {
            self.state.rocket = None;
            self.explode_rocket(Vec2::new(rocket.pos.x, self.field.top));
        } else {
            self.state.rocket = Some(rocket);
        }
    }

    /// Destroy every alive brick whose center is within the blast radius,
    /// each with full scoring and drop bookkeeping, then evaluate
    /// level-clear once for the whole blast.
    fn explode_rocket(&mut self, at: Vec2) {
        let radius_sq = ROCKET_BLAST_RADIUS * ROCKET_BLAST_RADIUS;
        let victims: Vec<usize> = self
            .state
            .bricks
            .iter()
            .enumerate()
            .filter(|(_, brick)| {
                brick.alive() && brick.center().distance_squared(at) <= radius_sq
            })
            .map(|(index, _)| index)
            .collect();

        for index in victims {
            self.destroy_brick(index);
        }
        self.check_level_cleared();
    }

    // --- Shield lifecycle ------------------------------------------------

    /// Shields expire on the sim clock regardless of mode or whether a
    /// fall-save ever consumed them.
    fn update_shield(&mut self) {
        if let Some(shield) = self.state.shield
            && !shield.active(self.clock)
        {
            self.state.shield = None;
        }
    }
}

/// Generate the brick grid for a level. Columns and rows grow with the
/// level up to fixed caps, and levels past the first omit ~10% of cells at
/// random to vary the field.
pub fn create_bricks(level: u32, field: &Playfield, rng: &mut impl Rng) -> Vec<Brick> {
    let columns = (8 + (level as f32 * 0.8) as u32).min(16);
    let rows = (4 + (level as f32 * 0.7) as u32).min(10);
    let padding_x = 12.0;
    let padding_y = 10.0;
    let brick_height = 24.0;
    let usable_width = field.width();
    let total_padding = padding_x * (columns - 1) as f32;
    let brick_width = (usable_width - total_padding) / columns as f32;
    let origin_x = field.left;
    let origin_y = field.top + 24.0;

    let mut bricks = Vec::with_capacity((columns * rows) as usize);
    for row in 0..rows {
        for col in 0..columns {
            if level > 1 && rng.random::<f32>() > 0.9 {
                continue;
            }
            let palette = BRICK_PALETTES[((row + col + level) % BRICK_PALETTES.len() as u32) as usize];
            bricks.push(Brick {
                x: origin_x + col as f32 * (brick_width + padding_x),
                y: origin_y + row as f32 * (brick_height + padding_y),
                width: brick_width,
                height: brick_height,
                depth: 32.0,
                row,
                status: BrickStatus::Alive,
                color: crate::hex_rgb(palette[0]),
                color_secondary: crate::hex_rgb(palette[1]),
            });
        }
    }
    bricks
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const W: f32 = 800.0;
    const H: f32 = 600.0;

    fn make_game() -> Game {
        Game::new(W, H, 12345)
    }

    fn free_ball(game: &Game, vx: f32, vy: f32) -> Ball {
        Ball {
            pos: Vec2::new(game.field.center_x(), game.field.center_y()),
            vel: Vec2::new(vx, vy),
            radius: BALL_RADIUS,
            spin: 0.0,
        }
    }

    fn lost_ball(game: &Game) -> Ball {
        Ball {
            pos: Vec2::new(game.field.center_x(), game.field.bottom + 1.0),
            vel: Vec2::new(0.0, 200.0),
            radius: BALL_RADIUS,
            spin: 0.0,
        }
    }

    #[test]
    fn test_new_game_is_ready_with_field_and_ball() {
        let game = make_game();
        assert_eq!(game.state.mode, GameMode::Ready);
        assert_eq!(game.state.lives, 3);
        assert_eq!(game.state.level, 1);
        assert_eq!(game.state.balls.len(), 1);
        assert!(game.state.alive_bricks() > 0);
        assert!(game.state.overlay.is_some());
    }

    #[test]
    fn test_launch_transitions_to_running() {
        let mut game = make_game();
        game.launch();
        assert_eq!(game.state.mode, GameMode::Running);
        assert!(game.state.overlay.is_none());

        // Launch while running is a no-op
        let score = game.state.score;
        game.launch();
        assert_eq!(game.state.mode, GameMode::Running);
        assert_eq!(game.state.score, score);
    }

    #[test]
    fn test_accumulator_executes_floor_of_banked_time() {
        let mut game = make_game();
        game.launch();
        // One ball crossing open space at 240 px/s: each physics step
        // moves it exactly one pixel, so travel counts executed steps.
        game.state.bricks.clear();
        let start_x = game.field.center_x();
        game.state.balls = vec![free_ball(&game, 240.0, 0.0)];

        // floor(0.016 / (1/240)) = 3 steps, residual 0.016 - 3/240
        game.step(0.016);
        let travelled = game.state.balls[0].pos.x - start_x;
        assert!((travelled - 3.0).abs() < 1e-3, "travelled {travelled}");
        assert!((game.accumulator - (0.016 - 3.0 * PHYSICS_STEP)).abs() < 1e-5);

        // Next frame banks the residue: floor((residual + 0.016) / step) = 4
        game.step(0.016);
        let travelled = game.state.balls[0].pos.x - start_x;
        assert!((travelled - 7.0).abs() < 1e-3, "travelled {travelled}");
    }

    #[test]
    fn test_oversized_delta_is_clamped() {
        let mut game = make_game();
        game.launch();
        game.state.bricks.clear();
        let start_x = game.field.center_x();
        game.state.balls = vec![free_ball(&game, 240.0, 0.0)];

        // A 2-second stall must not burst past the clamp:
        // floor(MAX_FRAME_DELTA / PHYSICS_STEP) = 10 steps at most
        game.step(2.0);
        let travelled = game.state.balls[0].pos.x - start_x;
        assert!(travelled <= 10.0 + 1e-3, "travelled {travelled}");
        assert!(game.accumulator >= 0.0 && game.accumulator < PHYSICS_STEP);
    }

    #[test]
    fn test_ball_lost_decrements_lives_and_resets_round() {
        let mut game = make_game();
        game.launch();
        game.state.balls = vec![lost_ball(&game)];

        game.physics_step(PHYSICS_STEP);

        assert_eq!(game.state.lives, 2);
        assert_eq!(game.state.mode, GameMode::Ready);
        assert_eq!(game.state.balls.len(), 1);
        assert!(game.state.overlay.is_some());
    }

    #[test]
    fn test_last_ball_lost_is_game_over() {
        let mut game = make_game();
        game.launch();
        game.state.lives = 1;
        game.state.shield = None;
        game.state.rocket = Some(Rocket::armed(&game.paddle, &game.field));
        game.state.power_ups.push(PowerUp::at(
            PowerUpKind::Shield,
            Vec2::new(400.0, 100.0),
        ));
        game.state.balls = vec![lost_ball(&game)];

        game.physics_step(PHYSICS_STEP);

        assert_eq!(game.state.mode, GameMode::GameOver);
        assert_eq!(game.state.lives, 0);
        assert!(game.state.balls.is_empty());
        assert!(game.state.power_ups.is_empty());
        assert!(game.state.rocket.is_none());
        assert!(game.state.shield.is_none());
    }

    #[test]
    fn test_active_shield_saves_and_is_consumed() {
        let mut game = make_game();
        game.launch();
        game.state.shield = Some(Shield::new(game.clock));
        game.state.balls = vec![lost_ball(&game)];

        game.physics_step(PHYSICS_STEP);

        assert_eq!(game.state.mode, GameMode::Running);
        assert_eq!(game.state.lives, 3);
        assert_eq!(game.state.balls.len(), 1);
        assert!(game.state.balls[0].vel.y < 0.0);
        assert!(game.state.balls[0].pos.y < game.field.bottom);
        assert!(game.state.shield.is_none(), "shield is single-use");
    }

    #[test]
    fn test_expired_shield_does_not_save() {
        let mut game = make_game();
        game.launch();
        game.clock = 100.0;
        game.state.shield = Some(Shield::new(100.0 - SHIELD_DURATION - 1.0));
        game.state.balls = vec![lost_ball(&game)];

        game.physics_step(PHYSICS_STEP);

        assert_eq!(game.state.lives, 2);
        assert_eq!(game.state.mode, GameMode::Ready);
    }

    #[test]
    fn test_shield_expires_on_clock() {
        let mut game = make_game();
        game.launch();
        game.state.shield = Some(Shield::new(game.clock));
        game.step(0.016);
        assert!(game.state.shield.is_some());

        game.clock += SHIELD_DURATION;
        game.step(0.016);
        assert!(game.state.shield.is_none());
    }

    #[test]
    fn test_brick_destruction_scores_once() {
        let mut game = make_game();
        game.launch();
        let level = game.state.level as u64;

        assert!(game.destroy_brick(0));
        assert_eq!(game.state.score, BRICK_SCORE * level);
        assert_eq!(game.state.bricks[0].status, BrickStatus::Destroyed);

        // Destroying an already-destroyed brick has no effect
        assert!(!game.destroy_brick(0));
        assert_eq!(game.state.score, BRICK_SCORE * level);
    }

    #[test]
    fn test_power_up_drop_is_guaranteed_on_interval() {
        let mut game = make_game();
        game.launch();
        game.state.power_ups.clear();
        game.state.bricks_since_drop = POWER_UP_GUARANTEE_INTERVAL - 1;

        game.destroy_brick(0);

        assert_eq!(game.state.power_ups.len(), 1);
        assert_eq!(game.state.bricks_since_drop, 0);
        let spawn = game.state.power_ups[0].pos;
        assert_eq!(spawn, game.state.bricks[0].center());
    }

    #[test]
    fn test_level_clear_advances_exactly_once() {
        let mut game = make_game();
        game.launch();
        for brick in game.state.bricks.iter_mut().skip(1) {
            brick.status = BrickStatus::Destroyed;
        }

        game.destroy_brick(0);
        game.check_level_cleared();

        assert_eq!(game.state.level, 2);
        assert_eq!(game.state.mode, GameMode::Ready);
        assert!(game.state.alive_bricks() > 0, "field regenerated");
        assert!(game.state.overlay.is_some());

        // Further frames in the regenerated round must not re-advance
        game.step(0.016);
        game.step(0.016);
        assert_eq!(game.state.level, 2);
    }

    #[test]
    fn test_multi_ball_splits_one_into_three() {
        let mut game = make_game();
        game.launch();
        game.state.balls = vec![free_ball(&game, 300.0, -300.0)];
        let heading = (-300.0f32).atan2(300.0);

        game.apply_power_up(PowerUpKind::MultiBall);

        assert_eq!(game.state.balls.len(), 3);
        for (clone, offset) in game.state.balls[1..].iter().zip([-0.4f32, 0.4]) {
            let clone_heading = clone.vel.y.atan2(clone.vel.x);
            assert!((clone_heading - (heading + offset)).abs() < 1e-3);
        }
    }

    #[test]
    fn test_multi_ball_respects_cap() {
        let mut game = make_game();
        game.launch();
        game.state.balls = (0..MAX_ACTIVE_BALLS)
            .map(|_| free_ball(&game, 200.0, -200.0))
            .collect();

        game.apply_power_up(PowerUpKind::MultiBall);

        assert_eq!(game.state.balls.len(), MAX_ACTIVE_BALLS);
    }

    #[test]
    fn test_power_up_collection_applies_effect() {
        let mut game = make_game();
        game.launch();
        let paddle_pos = Vec2::new(game.paddle.x(), game.paddle.y(&game.field));
        game.state.power_ups = vec![PowerUp::at(PowerUpKind::Shield, paddle_pos)];

        game.update_power_ups(0.001);

        assert!(game.state.power_ups.is_empty());
        assert!(game.state.shield.is_some());
    }

    #[test]
    fn test_power_up_past_bottom_is_discarded() {
        let mut game = make_game();
        game.launch();
        game.state.power_ups = vec![PowerUp::at(
            PowerUpKind::Rocket,
            Vec2::new(100.0, game.field.bottom + 200.0),
        )];

        game.update_power_ups(0.016);

        assert!(game.state.power_ups.is_empty());
        assert!(game.state.rocket.is_none(), "no effect on a missed drop");
    }

    #[test]
    fn test_rocket_rides_paddle_until_launch() {
        let mut game = make_game();
        game.state.rocket = Some(Rocket::armed(&game.paddle, &game.field));

        game.pointer_down(200.0);
        game.update_rocket(0.016);

        let rocket = game.state.rocket.expect("rocket stays armed");
        assert_eq!(rocket.pos.x, game.paddle.x());
    }

    #[test]
    fn test_rocket_blast_destroys_bricks_in_radius() {
        let mut game = make_game();
        game.launch();
        game.state.bricks_since_drop = 0;
        let target = game.state.bricks[0].center();
        // Rocket one frame of travel below the target brick
        game.state.rocket = Some(Rocket {
            pos: Vec2::new(target.x, target.y + ROCKET_HEIGHT / 2.0 + 5.0),
            width: ROCKET_WIDTH,
            height: ROCKET_HEIGHT,
            speed: ROCKET_SPEED,
        });

        let level = game.state.level as u64;
        // Nose position after one frame of travel
        let impact = Vec2::new(target.x, target.y + 5.0 - ROCKET_SPEED * 0.016);
        let expected: Vec<usize> = game
            .state
            .bricks
            .iter()
            .enumerate()
            .filter(|(_, b)| {
                b.alive()
                    && b.center().distance_squared(impact) <= ROCKET_BLAST_RADIUS.powi(2)
            })
            .map(|(i, _)| i)
            .collect();
        assert!(!expected.is_empty());

        game.update_rocket(0.016);

        assert!(game.state.rocket.is_none());
        for index in &expected {
            assert_eq!(game.state.bricks[*index].status, BrickStatus::Destroyed);
        }
        assert_eq!(
            game.state.score,
            BRICK_SCORE * level * expected.len() as u64
        );
    }

    #[test]
    fn test_restart_after_game_over_resets_run() {
        let mut game = make_game();
        game.launch();
        game.state.score = 900;
        game.state.level = 4;
        game.game_over();
        assert_eq!(game.state.mode, GameMode::GameOver);

        game.launch();

        assert_eq!(game.state.mode, GameMode::Running);
        assert_eq!(game.state.score, 0);
        assert_eq!(game.state.lives, 3);
        assert_eq!(game.state.level, 1);
        assert_eq!(game.state.balls.len(), 1);
        assert!(game.state.alive_bricks() > 0);
    }

    #[test]
    fn test_create_bricks_grid_scales_with_level() {
        let field = Playfield::new(W, H);
        let mut rng = Pcg32::seed_from_u64(1);

        // Level 1: full 8x4 grid, no omission
        let bricks = create_bricks(1, &field, &mut rng);
        assert_eq!(bricks.len(), 32);

        // High level: capped at 16x10 minus ~10% random omission
        let bricks = create_bricks(20, &field, &mut rng);
        assert!(bricks.len() <= 160);
        assert!(bricks.len() >= 120);
        for brick in &bricks {
            assert!(brick.x >= field.left - 0.5);
            assert!(brick.x + brick.width <= field.right + 0.5);
        }
    }

    proptest! {
        #[test]
        fn prop_paddle_never_leaves_field(
            moves in proptest::collection::vec((0u8..3, -4000.0f32..4000.0), 1..64)
        ) {
            let mut game = make_game();
            for (kind, value) in moves {
                match kind {
                    0 => {
                        game.set_moving_left(true);
                        game.set_moving_right(false);
                    }
                    1 => {
                        game.set_moving_left(false);
                        game.set_moving_right(true);
                    }
                    _ => game.pointer_down(value),
                }
                game.step(0.02);

                let half = game.paddle.width / 2.0;
                prop_assert!(game.paddle.x() >= game.field.left + half);
                prop_assert!(game.paddle.x() <= game.field.right - half);
            }
        }

        #[test]
        fn prop_accumulator_residual_stays_below_step(
            deltas in proptest::collection::vec(0.0f32..0.05, 1..48)
        ) {
            let mut game = make_game();
            for delta in deltas {
                game.step(delta);
                prop_assert!(game.accumulator >= 0.0);
                prop_assert!(game.accumulator < PHYSICS_STEP);
            }
        }
    }
}
