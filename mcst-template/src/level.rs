//! The world a template is captured from and placed into.

use mcst_common::block_storage::{BlockState, BlockStorage, Direction, FluidState, Position, UpdateFlags};
use mcst_common::entity::{Aabb, Entity};
use quartz_nbt::NbtCompound;

/// Everything the placement and capture engines need from a world. Object safe so processors can
/// look at the world through `&dyn Level`.
pub trait Level {
    fn block_state(&self, pos: Position) -> BlockState;

    /// Returns false if the world refused the write or nothing changed
    fn set_block(&mut self, pos: Position, state: BlockState, flags: UpdateFlags) -> bool;

    fn fluid_state(&self, pos: Position) -> FluidState {
        self.block_state(pos).fluid_state()
    }

    fn block_entity(&self, pos: Position) -> Option<&NbtCompound>;

    /// Replace the payload of an existing block entity. Returns false if there is none.
    fn load_block_entity(&mut self, pos: Position, tag: NbtCompound) -> bool;

    fn clear_block_entity(&mut self, pos: Position);

    fn update_neighbors_at(&mut self, pos: Position, block: &str);

    /// Y just above the topmost non-air block of a column
    fn surface_height(&self, x: i32, z: i32) -> i32;

    fn entities_in(&self, area: &Aabb) -> Vec<Entity>;

    fn add_fresh_entity_with_passengers(&mut self, entity: Entity) -> bool;

    /// Hook for mobs spawned by a placement, run before they are added
    fn finalize_spawn(&mut self, entity: &mut Entity) {
        let _ = entity;
    }
}

/// Order neighbor shapes are folded in when a block re-reads its surroundings
const SHAPE_UPDATE_ORDER: [Direction; 6] = [
    Direction::West,
    Direction::East,
    Direction::North,
    Direction::South,
    Direction::Down,
    Direction::Up,
];

/// `state` as it would look after taking all six neighbors at `pos` into account
pub fn update_from_neighbour_shapes<L: Level + ?Sized>(
    level: &L,
    pos: Position,
    state: BlockState,
) -> BlockState {
    SHAPE_UPDATE_ORDER.iter().fold(state, |s, d| {
        s.update_shape(*d, &level.block_state(pos.offset(*d)))
    })
}

impl Level for BlockStorage {
    fn block_state(&self, pos: Position) -> BlockState {
        BlockStorage::block_state(self, pos).clone()
    }

    fn set_block(&mut self, pos: Position, state: BlockState, flags: UpdateFlags) -> bool {
        self.set_block_state(pos, state, flags)
    }

    fn block_entity(&self, pos: Position) -> Option<&NbtCompound> {
        BlockStorage::block_entity(self, pos)
    }

    fn load_block_entity(&mut self, pos: Position, tag: NbtCompound) -> bool {
        BlockStorage::load_block_entity(self, pos, tag)
    }

    fn clear_block_entity(&mut self, pos: Position) {
        BlockStorage::clear_block_entity(self, pos)
    }

    fn update_neighbors_at(&mut self, pos: Position, block: &str) {
        self.record_neighbor_update(pos, block)
    }

    fn surface_height(&self, x: i32, z: i32) -> i32 {
        BlockStorage::surface_height(self, x, z)
    }

    fn entities_in(&self, area: &Aabb) -> Vec<Entity> {
        BlockStorage::entities_in(self, area).cloned().collect()
    }

    fn add_fresh_entity_with_passengers(&mut self, entity: Entity) -> bool {
        self.add_entity(entity);
        true
    }

    fn finalize_spawn(&mut self, entity: &mut Entity) {
        // Mobs that came with a structure never despawn
        entity.tag.insert("PersistenceRequired", 1i8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences_pick_up_neighbors() {
        let mut world = BlockStorage::new(3, 1, 3).unwrap();
        let fence = BlockState::new("minecraft:oak_fence")
            .with_property("north", "false")
            .with_property("east", "false")
            .with_property("south", "false")
            .with_property("west", "false")
            .with_property("waterlogged", "false");
        let center = Position::new(1, 0, 1);
        world.set_block(center, fence.clone(), UpdateFlags::empty());
        world.set_block(
            Position::new(2, 0, 1),
            BlockState::new("minecraft:stone"),
            UpdateFlags::empty(),
        );
        world.set_block(Position::new(1, 0, 0), fence.clone(), UpdateFlags::empty());

        let updated = update_from_neighbour_shapes(&world, center, fence);
        assert_eq!(updated.property("east"), Some("true"));
        assert_eq!(updated.property("north"), Some("true"));
        assert_eq!(updated.property("south"), Some("false"));
        assert_eq!(updated.property("west"), Some("false"));
    }

    #[test]
    fn reads_waterlogged_fluid() {
        let mut world = BlockStorage::new(1, 1, 1).unwrap();
        world.set_block(
            Position::ZERO,
            BlockState::new("minecraft:oak_slab").with_property("waterlogged", "true"),
            UpdateFlags::empty(),
        );
        assert!(world.fluid_state(Position::ZERO).is_source());
    }
}
