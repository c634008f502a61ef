//! Board-to-world projection
//!
//! Maps a 2D playfield coordinate plus a depth offset into 3D world space:
//! x is centered and stretched by a fixed anisotropic factor, y flips
//! (playfield y grows downward, world y grows upward), and z recedes with
//! board height so rows near the top sit deeper than the paddle.

use glam::Vec3;

use crate::sim::Playfield;

/// Anisotropic board-to-world scale, shared with entity sizing
pub const SCALE_X: f32 = 1.06;
pub const SCALE_Y: f32 = 0.92;
const DEPTH_SCALE: f32 = 0.55;
const BASE_DEPTH: f32 = 260.0;

/// Projection anchored at the playfield center; rebuilt per frame so a
/// resize never needs explicit invalidation.
#[derive(Debug, Clone, Copy)]
pub struct BoardProjection {
    center_x: f32,
    center_y: f32,
}

impl BoardProjection {
    pub fn new(field: &Playfield) -> Self {
        Self {
            center_x: field.center_x(),
            center_y: field.center_y(),
        }
    }

    /// Project a playfield point at the given depth offset into world space.
    pub fn to_world(&self, x: f32, y: f32, depth_offset: f32) -> Vec3 {
        let offset_x = (x - self.center_x) * SCALE_X;
        let offset_y = self.center_y - y;
        Vec3::new(
            offset_x,
            offset_y * SCALE_Y,
            -BASE_DEPTH - offset_y * DEPTH_SCALE + depth_offset,
        )
    }
}
