//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure and testable:
//! - Fixed timestep only
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod collision;
pub mod state;
pub mod tick;

pub use state::{
    Ball, Brick, BrickStatus, GameMode, GameState, Overlay, Paddle, Playfield, PowerUp,
    PowerUpKind, Rocket, Shield,
};
pub use tick::{Game, create_bricks};
