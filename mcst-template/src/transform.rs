//! Quarter-turn transforms of block and entity positions about a pivot.
//!
//! Mirroring always happens first, about the origin, then the rotation about the pivot. The four
//! rotation cases are spelled out so integer positions stay exact.

use crate::settings::PlacementSettings;
use mcst_common::block_storage::{BoundingBox, Mirror, Position, Rotation};
use mcst_common::entity::Vec3d;

/// Mirror a block position about the origin
#[inline]
pub fn mirror_position(pos: Position, mirror: Mirror) -> Position {
    match mirror {
        Mirror::None => pos,
        Mirror::LeftRight => Position::new(pos.x, pos.y, -pos.z),
        Mirror::FrontBack => Position::new(-pos.x, pos.y, pos.z),
    }
}

pub fn transform(pos: Position, mirror: Mirror, rotation: Rotation, pivot: Position) -> Position {
    let Position { x, y, z } = mirror_position(pos, mirror);
    let px = pivot.x;
    let pz = pivot.z;
    match rotation {
        Rotation::None => Position::new(x, y, z),
        Rotation::Clockwise90 => Position::new(px + pz - z, y, pz - px + x),
        Rotation::Clockwise180 => Position::new(px + px - x, y, pz + pz - z),
        Rotation::CounterClockwise90 => Position::new(px - pz + z, y, px + pz - x),
    }
}

/// Undo [transform] with the same parameters
pub fn inverse_transform(
    pos: Position,
    mirror: Mirror,
    rotation: Rotation,
    pivot: Position,
) -> Position {
    let unrotated = transform(pos, Mirror::None, rotation.inverse(), pivot);
    mirror_position(unrotated, mirror)
}

/// Entity flavor of [transform]. Coordinates are relative to the structure, with the fractional
/// part being the position inside a block, so mirroring reflects about the block center.
pub fn transform_vec3(pos: Vec3d, mirror: Mirror, rotation: Rotation, pivot: Position) -> Vec3d {
    let (mut x, y, mut z) = (pos.x, pos.y, pos.z);
    match mirror {
        Mirror::None => {}
        Mirror::LeftRight => z = 1.0 - z,
        Mirror::FrontBack => x = 1.0 - x,
    }
    let px = pivot.x as f64;
    let pz = pivot.z as f64;
    match rotation {
        Rotation::None => Vec3d::new(x, y, z),
        Rotation::Clockwise90 => Vec3d::new(px + pz + 1.0 - z, y, pz - px + x),
        Rotation::Clockwise180 => Vec3d::new(px + px + 1.0 - x, y, pz + pz + 1.0 - z),
        Rotation::CounterClockwise90 => Vec3d::new(px - pz + z, y, px + pz + 1.0 - x),
    }
}

/// Where a structure-relative position ends up relative to the placement origin
#[inline]
pub fn calculate_relative_position(settings: &PlacementSettings, pos: Position) -> Position {
    transform(pos, settings.mirror, settings.rotation, settings.pivot)
}

/// World-space box covered by a structure of `size` placed at `origin`. Only the two extreme
/// corners get transformed, which is enough since every transform here permutes axes.
pub fn transformed_bounding_box(
    origin: Position,
    rotation: Rotation,
    pivot: Position,
    mirror: Mirror,
    size: Position,
) -> BoundingBox {
    let far = size - Position::new(1, 1, 1);
    let a = transform(Position::ZERO, mirror, rotation, pivot);
    let b = transform(far, mirror, rotation, pivot);
    BoundingBox::from_corners(a, b).moved(origin)
}

/// Origin to place at so that the transformed structure's minimum corner lands on `pos`, for a
/// pivot at the origin.
pub fn zero_position_with_transform(
    pos: Position,
    mirror: Mirror,
    rotation: Rotation,
    size_x: i32,
    size_z: i32,
) -> Position {
    let sx = size_x - 1;
    let sz = size_z - 1;
    let i = if mirror == Mirror::FrontBack { sx } else { 0 };
    let j = if mirror == Mirror::LeftRight { sz } else { 0 };
    let offset = match rotation {
        Rotation::CounterClockwise90 => Position::new(j, 0, sx - i),
        Rotation::Clockwise90 => Position::new(sz - j, 0, i),
        Rotation::Clockwise180 => Position::new(sx - i, 0, sz - j),
        Rotation::None => Position::new(i, 0, j),
    };
    pos + offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mcst_common::block_storage::{ALL_MIRRORS, ALL_ROTATIONS};
    use proptest::prelude::*;

    #[test]
    fn clockwise_quarter_turn_about_pivot() {
        let p = transform(
            Position::new(2, 0, 0),
            Mirror::None,
            Rotation::Clockwise90,
            Position::new(1, 0, 1),
        );
        assert_eq!(p, Position::new(2, 0, 2));

        let p = transform(
            Position::new(1, 5, 0),
            Mirror::None,
            Rotation::Clockwise90,
            Position::ZERO,
        );
        assert_eq!(p, Position::new(0, 5, 1));
    }

    #[test]
    fn mirror_happens_before_rotation() {
        let p = transform(
            Position::new(1, 0, 2),
            Mirror::LeftRight,
            Rotation::Clockwise180,
            Position::ZERO,
        );
        // (1, 0, 2) -> mirrored (1, 0, -2) -> rotated (-1, 0, 2)
        assert_eq!(p, Position::new(-1, 0, 2));
    }

    #[test]
    fn entity_positions_rotate_about_block_centers() {
        let v = transform_vec3(
            Vec3d::new(0.5, 1.0, 0.5),
            Mirror::None,
            Rotation::Clockwise90,
            Position::ZERO,
        );
        assert_relative_eq!(v.x, 0.5);
        assert_relative_eq!(v.z, 0.5);

        let v = transform_vec3(
            Vec3d::new(2.25, 0.0, 0.75),
            Mirror::FrontBack,
            Rotation::None,
            Position::ZERO,
        );
        assert_relative_eq!(v.x, -1.25);
        assert_relative_eq!(v.z, 0.75);

        // The entity lands in the same block a block-position transform would pick
        let block = transform(
            Position::new(2, 0, 0),
            Mirror::None,
            Rotation::CounterClockwise90,
            Position::new(1, 0, 1),
        );
        let v = transform_vec3(
            Vec3d::new(2.5, 0.5, 0.5),
            Mirror::None,
            Rotation::CounterClockwise90,
            Position::new(1, 0, 1),
        );
        assert_eq!(v.block_pos(), block);
    }

    #[test]
    fn zero_position_lands_min_corner() {
        for rotation in ALL_ROTATIONS {
            for mirror in ALL_MIRRORS {
                let size = Position::new(3, 2, 5);
                let origin =
                    zero_position_with_transform(Position::new(10, 0, 10), mirror, rotation, 3, 5);
                let bb = transformed_bounding_box(origin, rotation, Position::ZERO, mirror, size);
                assert_eq!(bb.min.x, 10, "{} {}", rotation, mirror);
                assert_eq!(bb.min.z, 10, "{} {}", rotation, mirror);
            }
        }
    }

    proptest! {
        #[test]
        fn inverse_undoes_transform(
            x in -64i32..64, y in -64i32..64, z in -64i32..64,
            px in -16i32..16, pz in -16i32..16,
            r in 0usize..4, m in 0usize..3,
        ) {
            let pos = Position::new(x, y, z);
            let pivot = Position::new(px, 0, pz);
            let (rotation, mirror) = (ALL_ROTATIONS[r], ALL_MIRRORS[m]);
            let there = transform(pos, mirror, rotation, pivot);
            prop_assert_eq!(inverse_transform(there, mirror, rotation, pivot), pos);
        }

        #[test]
        fn bounding_box_keeps_volume(
            sx in 1i32..24, sy in 1i32..24, sz in 1i32..24,
            px in -8i32..8, pz in -8i32..8,
            r in 0usize..4, m in 0usize..3,
        ) {
            let size = Position::new(sx, sy, sz);
            let (rotation, mirror) = (ALL_ROTATIONS[r], ALL_MIRRORS[m]);
            let bb = transformed_bounding_box(
                Position::new(100, 64, -100),
                rotation,
                Position::new(px, 0, pz),
                mirror,
                size,
            );
            let span = bb.span();
            prop_assert_eq!(bb.volume(), sx as i64 * sy as i64 * sz as i64);
            prop_assert_eq!(span.y, sy);
            if rotation.swaps_axes() {
                prop_assert_eq!((span.x, span.z), (sz, sx));
            } else {
                prop_assert_eq!((span.x, span.z), (sx, sz));
            }
        }
    }
}
