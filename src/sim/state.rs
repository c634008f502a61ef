//! Game state and entity types
//!
//! Everything the renderer and HUD read lives here. Mutation happens only
//! inside `sim::tick`; the render path takes these types by shared reference.

use glam::Vec2;
use rand::Rng;

use crate::consts::*;

/// Current mode of the game state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    /// Balls parked on the paddle, waiting for launch input
    Ready,
    /// Physics active
    Running,
    /// Terminal until restart input
    GameOver,
}

/// Playfield bounds: canvas size minus a fixed margin, recomputed on resize.
/// All entity clamping and collision tests reference this rectangle.
#[derive(Debug, Clone, Copy)]
pub struct Playfield {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Playfield {
    pub fn new(canvas_width: f32, canvas_height: f32) -> Self {
        Self {
            left: FIELD_MARGIN,
            top: FIELD_MARGIN,
            right: canvas_width - FIELD_MARGIN,
            bottom: canvas_height - FIELD_MARGIN,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    #[inline]
    pub fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }
}

/// The player's paddle. Exactly one instance, owned by the simulation.
///
/// The horizontal position is private: every mutation goes through
/// [`Paddle::set_x`], which clamps the center into the playfield.
#[derive(Debug, Clone)]
pub struct Paddle {
    x: f32,
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    pub speed: f32,
}

impl Paddle {
    pub fn new(field: &Playfield) -> Self {
        let mut paddle = Self {
            x: 0.0,
            width: PADDLE_WIDTH,
            height: PADDLE_HEIGHT,
            depth: PADDLE_DEPTH,
            speed: PADDLE_SPEED,
        };
        paddle.set_x(field.center_x(), field);
        paddle
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.x
    }

    /// Resting height; the paddle never moves vertically.
    #[inline]
    pub fn y(&self, field: &Playfield) -> f32 {
        field.bottom - PADDLE_RAISE
    }

    /// Move the paddle center, clamped so the full width stays in bounds.
    pub fn set_x(&mut self, value: f32, field: &Playfield) {
        let min_x = field.left + self.width / 2.0;
        let max_x = field.right - self.width / 2.0;
        self.x = value.clamp(min_x, max_x);
    }
}

/// A ball in flight (or parked on the paddle while the mode is `Ready`)
#[derive(Debug, Clone)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Lateral drift factor; models the curve a paddle edge hit imparts
    pub spin: f32,
}

impl Ball {
    /// Spawn a ball resting on the paddle with a randomized launch heading.
    pub fn spawn(paddle: &Paddle, field: &Playfield, speed: f32, rng: &mut impl Rng) -> Self {
        let angle = std::f32::consts::FRAC_PI_4;
        let direction = if rng.random::<f32>() > 0.5 { 1.0 } else { -1.0 };
        Self {
            pos: Vec2::new(
                paddle.x(),
                paddle.y(field) - paddle.height / 2.0 - BALL_RADIUS - 2.0,
            ),
            vel: Vec2::new(
                angle.cos() * speed * direction,
                -(angle.sin() * speed).abs(),
            ),
            radius: BALL_RADIUS,
            spin: (rng.random::<f32>() - 0.5) * BALL_SPIN_VARIANCE,
        }
    }

    /// Clone used by the multi-ball power-up: same position, rotated heading.
    pub fn split(source: &Ball, heading: f32, speed: f32, offset: f32) -> Self {
        Self {
            pos: source.pos,
            vel: Vec2::new(heading.cos() * speed, heading.sin() * speed),
            radius: BALL_RADIUS,
            spin: source.spin + offset * 0.5,
        }
    }
}

/// Brick lifecycle: alive until hit, then destroyed until the field regenerates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrickStatus {
    Alive,
    Destroyed,
}

/// One brick cell. Destroyed bricks stay in the collection (status only)
/// until the level regenerates the whole field.
#[derive(Debug, Clone)]
pub struct Brick {
    /// Top-left corner in playfield coordinates
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    pub row: u32,
    pub status: BrickStatus,
    pub color: [f32; 3],
    pub color_secondary: [f32; 3],
}

impl Brick {
    #[inline]
    pub fn alive(&self) -> bool {
        self.status == BrickStatus::Alive
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUpKind {
    MultiBall,
    Shield,
    Rocket,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [
        PowerUpKind::MultiBall,
        PowerUpKind::Shield,
        PowerUpKind::Rocket,
    ];

    /// Capsule tint used by the renderer
    pub fn color(&self) -> [f32; 3] {
        match self {
            PowerUpKind::MultiBall => crate::hex_rgb("#6bf7c2"),
            PowerUpKind::Shield => crate::hex_rgb("#00f7ff"),
            PowerUpKind::Rocket => crate::hex_rgb("#ff6bf6"),
        }
    }
}

/// A falling power-up capsule
#[derive(Debug, Clone)]
pub struct PowerUp {
    pub kind: PowerUpKind,
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    pub fall_speed: f32,
}

impl PowerUp {
    /// Spawn at a destroyed brick's center
    pub fn at(kind: PowerUpKind, center: Vec2) -> Self {
        Self {
            kind,
            pos: center,
            width: POWER_UP_WIDTH,
            height: POWER_UP_HEIGHT,
            fall_speed: POWER_UP_FALL_SPEED,
        }
    }
}

/// The homing-upward rocket projectile; at most one live instance
#[derive(Debug, Clone, Copy)]
pub struct Rocket {
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    pub speed: f32,
}

impl Rocket {
    /// Arm a rocket sitting on the paddle's nose
    pub fn armed(paddle: &Paddle, field: &Playfield) -> Self {
        Self {
            pos: Vec2::new(
                paddle.x(),
                paddle.y(field) - paddle.height / 2.0 - ROCKET_HEIGHT / 2.0,
            ),
            width: ROCKET_WIDTH,
            height: ROCKET_HEIGHT,
            speed: ROCKET_SPEED,
        }
    }
}

/// Timed one-shot bottom-bound save
#[derive(Debug, Clone, Copy)]
pub struct Shield {
    pub activated_at: f64,
    pub expires_at: f64,
}

impl Shield {
    pub fn new(now: f64) -> Self {
        Self {
            activated_at: now,
            expires_at: now + SHIELD_DURATION,
        }
    }

    #[inline]
    pub fn active(&self, now: f64) -> bool {
        self.expires_at > now
    }
}

/// Overlay copy the HUD shows while the game is not running
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    pub title: String,
    pub message: String,
    pub button_label: &'static str,
}

impl Overlay {
    pub fn new(title: &str, message: &str) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
            button_label: "Launch",
        }
    }

    pub fn with_button(title: &str, message: &str, button_label: &'static str) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
            button_label,
        }
    }
}

/// Complete readable game state. Mutated exclusively by the simulation;
/// the renderer and HUD only ever observe it.
#[derive(Debug, Clone)]
pub struct GameState {
    pub mode: GameMode,
    pub score: u64,
    pub lives: u32,
    pub level: u32,
    pub bricks: Vec<Brick>,
    pub balls: Vec<Ball>,
    pub power_ups: Vec<PowerUp>,
    pub rocket: Option<Rocket>,
    pub shield: Option<Shield>,
    /// Destroyed bricks since the last power-up drop (guarantee counter)
    pub bricks_since_drop: u32,
    /// HUD overlay; `Some` whenever the mode is not `Running`
    pub overlay: Option<Overlay>,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            mode: GameMode::Ready,
            score: 0,
            lives: 3,
            level: 1,
            bricks: Vec::new(),
            balls: Vec::new(),
            power_ups: Vec::new(),
            rocket: None,
            shield: None,
            bricks_since_drop: 0,
            overlay: None,
        }
    }

    /// Count of bricks still standing
    pub fn alive_bricks(&self) -> usize {
        self.bricks.iter().filter(|b| b.alive()).count()
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_paddle_set_x_clamps_to_field() {
        let field = Playfield::new(800.0, 600.0);
        let mut paddle = Paddle::new(&field);

        paddle.set_x(-1000.0, &field);
        assert_eq!(paddle.x(), field.left + paddle.width / 2.0);

        paddle.set_x(10_000.0, &field);
        assert_eq!(paddle.x(), field.right - paddle.width / 2.0);

        paddle.set_x(field.center_x(), &field);
        assert_eq!(paddle.x(), field.center_x());
    }

    #[test]
    fn test_ball_spawn_rests_on_paddle_moving_up() {
        let field = Playfield::new(800.0, 600.0);
        let paddle = Paddle::new(&field);
        let mut rng = Pcg32::seed_from_u64(7);

        let ball = Ball::spawn(&paddle, &field, 440.0, &mut rng);
        assert_eq!(ball.pos.x, paddle.x());
        assert!(ball.pos.y < paddle.y(&field));
        assert!(ball.vel.y < 0.0);
        assert!((ball.vel.length() - 440.0).abs() < 0.5);
        assert!(ball.spin.abs() <= BALL_SPIN_VARIANCE / 2.0);
    }

    #[test]
    fn test_shield_expiry_window() {
        let shield = Shield::new(10.0);
        assert!(shield.expires_at > shield.activated_at);
        assert!(shield.active(10.0));
        assert!(shield.active(10.0 + SHIELD_DURATION - 0.01));
        assert!(!shield.active(10.0 + SHIELD_DURATION));
    }
}
