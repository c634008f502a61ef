//! Axis-aligned collision resolution
//!
//! Walls and bricks reflect with overshoot correction so a penetrating ball
//! is mirrored back across the surface instead of sinking into it. The brick
//! bounce axis is chosen by the smallest of the four directional overlaps.

use glam::Vec2;
use rand::Rng;

use super::state::{Ball, Brick, Paddle, Playfield};
use crate::consts::*;

/// Reflect the ball off the side and top walls, mirroring any overshoot
/// back inside the playfield. Returns whether a wall was hit.
pub fn resolve_wall_collision(ball: &mut Ball, field: &Playfield) -> bool {
    let mut collided = false;
    let min_x = field.left + ball.radius;
    let max_x = field.right - ball.radius;
    let min_y = field.top + ball.radius;

    if ball.pos.x < min_x {
        let overshoot = min_x - ball.pos.x;
        ball.pos.x = min_x + overshoot;
        ball.vel.x = ball.vel.x.abs();
        collided = true;
    } else if ball.pos.x > max_x {
        let overshoot = ball.pos.x - max_x;
        ball.pos.x = max_x - overshoot;
        ball.vel.x = -ball.vel.x.abs();
        collided = true;
    }

    if ball.pos.y < min_y {
        let overshoot = min_y - ball.pos.y;
        ball.pos.y = min_y + overshoot;
        ball.vel.y = ball.vel.y.abs();
        collided = true;
    }

    collided
}

/// Resolve the ball against the first alive brick it overlaps, in field
/// order. The bounce axis is the minimum-penetration direction; ties break
/// toward the earlier test (left, right, top, bottom). Returns the index of
/// the struck brick so the caller can apply destruction bookkeeping; at most
/// one brick resolves per sub-step, the rest re-evaluate next sub-step.
pub fn resolve_brick_collision(ball: &mut Ball, bricks: &[Brick]) -> Option<usize> {
    for (index, brick) in bricks.iter().enumerate() {
        if !brick.alive() {
            continue;
        }

        if ball.pos.x + ball.radius >= brick.x
            && ball.pos.x - ball.radius <= brick.x + brick.width
            && ball.pos.y + ball.radius >= brick.y
            && ball.pos.y - ball.radius <= brick.y + brick.height
        {
            let overlap_left = ball.pos.x + ball.radius - brick.x;
            let overlap_right = brick.x + brick.width - (ball.pos.x - ball.radius);
            let overlap_top = ball.pos.y + ball.radius - brick.y;
            let overlap_bottom = brick.y + brick.height - (ball.pos.y - ball.radius);
            let min_overlap = overlap_left
                .min(overlap_right)
                .min(overlap_top)
                .min(overlap_bottom);

            if min_overlap == overlap_left {
                ball.pos.x = brick.x - ball.radius;
                ball.vel.x = -ball.vel.x.abs();
            } else if min_overlap == overlap_right {
                ball.pos.x = brick.x + brick.width + ball.radius;
                ball.vel.x = ball.vel.x.abs();
            } else if min_overlap == overlap_top {
                ball.pos.y = brick.y - ball.radius;
                ball.vel.y = -ball.vel.y.abs();
            } else {
                ball.pos.y = brick.y + brick.height + ball.radius;
                ball.vel.y = ball.vel.y.abs();
            }

            return Some(index);
        }
    }

    None
}

/// Bounce the ball off the paddle. Only fires while the ball moves downward
/// within the paddle span. The exit angle scales with where the ball struck
/// (center = straight up, edges = ±60°); speed grows 2% per bounce but never
/// drops below the level's base speed, and the ball is reseated exactly on
/// the paddle surface.
pub fn resolve_paddle_collision(
    ball: &mut Ball,
    paddle: &Paddle,
    field: &Playfield,
    base_speed: f32,
    rng: &mut impl Rng,
) -> bool {
    let paddle_y = paddle.y(field);
    let top = paddle_y - paddle.height / 2.0;
    let bottom = paddle_y + paddle.height / 2.0;
    let left = paddle.x() - paddle.width / 2.0;
    let right = paddle.x() + paddle.width / 2.0;

    if ball.pos.y + ball.radius >= top
        && ball.pos.y - ball.radius <= bottom
        && ball.pos.x >= left
        && ball.pos.x <= right
        && ball.vel.y > 0.0
    {
        let relative = (ball.pos.x - paddle.x()) / (paddle.width / 2.0);
        let bounce_angle = relative * std::f32::consts::FRAC_PI_3;
        let speed = (ball.vel.length() * 1.02).max(base_speed);
        ball.vel.x = bounce_angle.sin() * speed;
        ball.vel.y = -(bounce_angle.cos() * speed).abs();
        ball.pos.y = top - ball.radius - 1.0;
        ball.spin = (relative + (rng.random::<f32>() - 0.5) * 0.4) * BALL_SPIN_VARIANCE;
        return true;
    }

    false
}

/// Closed-interval intersection between two center/extent rectangles
/// (touching edges count as contact).
pub fn center_rects_overlap(a_pos: Vec2, a_size: Vec2, b_pos: Vec2, b_size: Vec2) -> bool {
    a_pos.x + a_size.x / 2.0 >= b_pos.x - b_size.x / 2.0
        && a_pos.x - a_size.x / 2.0 <= b_pos.x + b_size.x / 2.0
        && a_pos.y + a_size.y / 2.0 >= b_pos.y - b_size.y / 2.0
        && a_pos.y - a_size.y / 2.0 <= b_pos.y + b_size.y / 2.0
}

/// Closed-interval intersection between a center/extent rectangle and a
/// brick (bricks store their top-left corner).
pub fn center_rect_hits_brick(pos: Vec2, width: f32, height: f32, brick: &Brick) -> bool {
    pos.x + width / 2.0 >= brick.x
        && pos.x - width / 2.0 <= brick.x + brick.width
        && pos.y + height / 2.0 >= brick.y
        && pos.y - height / 2.0 <= brick.y + brick.height
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::BrickStatus;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn ball_at(x: f32, y: f32, vx: f32, vy: f32) -> Ball {
        Ball {
            pos: Vec2::new(x, y),
            vel: Vec2::new(vx, vy),
            radius: BALL_RADIUS,
            spin: 0.0,
        }
    }

    fn brick_at(x: f32, y: f32) -> Brick {
        Brick {
            x,
            y,
            width: 60.0,
            height: 24.0,
            depth: 32.0,
            row: 0,
            status: BrickStatus::Alive,
            color: [1.0; 3],
            color_secondary: [1.0; 3],
        }
    }

    #[test]
    fn test_wall_reflects_and_mirrors_overshoot() {
        let field = Playfield::new(800.0, 600.0);

        // 3px past the left bound: reflected 3px back inside
        let mut ball = ball_at(field.left + BALL_RADIUS - 3.0, 300.0, -100.0, 50.0);
        assert!(resolve_wall_collision(&mut ball, &field));
        assert_eq!(ball.pos.x, field.left + BALL_RADIUS + 3.0);
        assert!(ball.vel.x > 0.0);

        // Top bound flips the vertical velocity
        let mut ball = ball_at(400.0, field.top + BALL_RADIUS - 2.0, 10.0, -100.0);
        assert!(resolve_wall_collision(&mut ball, &field));
        assert_eq!(ball.pos.y, field.top + BALL_RADIUS + 2.0);
        assert!(ball.vel.y > 0.0);

        // Ball well inside touches nothing
        let mut ball = ball_at(400.0, 300.0, 100.0, 100.0);
        assert!(!resolve_wall_collision(&mut ball, &field));
    }

    #[test]
    fn test_brick_bounce_axis_from_side() {
        // Ball entering from the left edge: horizontal overlap is smallest
        let bricks = vec![brick_at(100.0, 100.0)];
        let mut ball = ball_at(100.0 - BALL_RADIUS + 2.0, 112.0, 200.0, 0.0);

        let hit = resolve_brick_collision(&mut ball, &bricks);
        assert_eq!(hit, Some(0));
        assert_eq!(ball.pos.x, 100.0 - BALL_RADIUS);
        assert!(ball.vel.x < 0.0);
    }

    #[test]
    fn test_brick_bounce_axis_from_above() {
        let bricks = vec![brick_at(100.0, 100.0)];
        let mut ball = ball_at(130.0, 100.0 - BALL_RADIUS + 2.0, 0.0, 200.0);

        let hit = resolve_brick_collision(&mut ball, &bricks);
        assert_eq!(hit, Some(0));
        assert_eq!(ball.pos.y, 100.0 - BALL_RADIUS);
        assert!(ball.vel.y < 0.0);
    }

    #[test]
    fn test_first_alive_brick_in_field_order_wins() {
        let mut first = brick_at(100.0, 100.0);
        first.status = BrickStatus::Destroyed;
        // Second brick occupies the same cell; only it can be hit
        let bricks = vec![first, brick_at(100.0, 100.0)];
        let mut ball = ball_at(130.0, 100.0 - BALL_RADIUS + 2.0, 0.0, 200.0);

        assert_eq!(resolve_brick_collision(&mut ball, &bricks), Some(1));
    }

    #[test]
    fn test_paddle_bounce_angle_follows_hit_offset() {
        let field = Playfield::new(800.0, 600.0);
        let paddle = Paddle::new(&field);
        let mut rng = Pcg32::seed_from_u64(3);
        let paddle_top = paddle.y(&field) - paddle.height / 2.0;

        // Strike the right half: ball exits rightward and upward
        let mut ball = ball_at(paddle.x() + 40.0, paddle_top, 0.0, 300.0);
        assert!(resolve_paddle_collision(
            &mut ball, &paddle, &field, 440.0, &mut rng
        ));
        assert!(ball.vel.x > 0.0);
        assert!(ball.vel.y < 0.0);
        assert_eq!(ball.pos.y, paddle_top - ball.radius - 1.0);
        // Slow incoming ball is floored at the base speed
        assert!(ball.vel.length() >= 440.0 - 0.5);
    }

    #[test]
    fn test_paddle_ignores_upward_ball() {
        let field = Playfield::new(800.0, 600.0);
        let paddle = Paddle::new(&field);
        let mut rng = Pcg32::seed_from_u64(3);
        let paddle_top = paddle.y(&field) - paddle.height / 2.0;

        let mut ball = ball_at(paddle.x(), paddle_top, 0.0, -300.0);
        assert!(!resolve_paddle_collision(
            &mut ball, &paddle, &field, 440.0, &mut rng
        ));
    }

    #[test]
    fn test_center_rects_overlap_touching_edges() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        // 10 apart with half-extents 5 + 5: exactly touching
        assert!(center_rects_overlap(
            a,
            Vec2::splat(10.0),
            b,
            Vec2::splat(10.0)
        ));
        assert!(!center_rects_overlap(
            a,
            Vec2::splat(9.0),
            b,
            Vec2::splat(9.0)
        ));
    }
}
