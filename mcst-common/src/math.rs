//! Small numeric helpers shared by the placement engine and the entity model.

use crate::block_storage::Position;

/// Seed derived from a block position. Repeated placements at the same spot draw from the same
/// random stream without having to remember which variant was picked.
pub fn position_seed(pos: Position) -> i64 {
    // The X product wraps in 32 bits before widening, the Z product in 64.
    let x = pos.x.wrapping_mul(3129871) as i64;
    let y = pos.y as i64;
    let z = pos.z as i64;
    let mut i = x ^ z.wrapping_mul(116129781) ^ y;
    i = i
        .wrapping_mul(i)
        .wrapping_mul(42317861)
        .wrapping_add(i.wrapping_mul(11));
    i >> 16
}

/// Wrap an angle in degrees into `[-180, 180)`
pub fn wrap_degrees(degrees: f32) -> f32 {
    let mut f = degrees % 360.0;
    if f >= 180.0 {
        f -= 360.0;
    }
    if f < -180.0 {
        f += 360.0;
    }
    f
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn seed_is_stable_and_position_dependent() {
        assert_eq!(position_seed(Position::ZERO), 0);
        let a = position_seed(Position::new(10, 64, -3));
        assert_eq!(a, position_seed(Position::new(10, 64, -3)));
        assert_ne!(a, position_seed(Position::new(-3, 64, 10)));
    }

    #[test]
    fn wraps_degrees() {
        assert_relative_eq!(wrap_degrees(190.0), -170.0);
        assert_relative_eq!(wrap_degrees(-190.0), 170.0);
        assert_relative_eq!(wrap_degrees(540.0), -180.0);
        assert_relative_eq!(wrap_degrees(45.0), 45.0);
    }
}
