//! Types for storing minecraft-format blocks. This is in mcst-common so the placement engine, the
//! tool and the tests can all share one world representation.

mod block;
pub mod iter;
mod orientation;
mod serialization;

pub use block::{BlockState, Fluid, FluidState};
pub use orientation::{Mirror, Rotation, ALL_MIRRORS, ALL_ROTATIONS};

use crate::entity::{Aabb, Entity};
use anyhow::{anyhow, Result};
use quartz_nbt::NbtCompound;
use std::collections::HashMap;
use std::fmt::Display;
use std::ops::{Add, Sub};
use std::vec::Vec;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl Position {
    pub const ZERO: Position = Position { x: 0, y: 0, z: 0 };

    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn offset(&self, d: Direction) -> Self {
        match d {
            Direction::North => Position::new(self.x, self.y, self.z - 1),
            Direction::South => Position::new(self.x, self.y, self.z + 1),
            Direction::East => Position::new(self.x + 1, self.y, self.z),
            Direction::West => Position::new(self.x - 1, self.y, self.z),
            Direction::Up => Position::new(self.x, self.y + 1, self.z),
            Direction::Down => Position::new(self.x, self.y - 1, self.z),
        }
    }

    /// Per-axis minimum
    pub fn component_min(&self, other: &Self) -> Self {
        Position::new(
            self.x.min(other.x),
            self.y.min(other.y),
            self.z.min(other.z),
        )
    }

    pub fn component_max(&self, other: &Self) -> Self {
        Position::new(
            self.x.max(other.x),
            self.y.max(other.y),
            self.z.max(other.z),
        )
    }

    /// Every position in the closed box spanned by `a` and `b`, X varying fastest, then Y, then Z.
    pub fn between_closed(a: Position, b: Position) -> impl Iterator<Item = Position> {
        let min = a.component_min(&b);
        let max = a.component_max(&b);
        (min.z..=max.z).flat_map(move |z| {
            (min.y..=max.y).flat_map(move |y| (min.x..=max.x).map(move |x| Position::new(x, y, z)))
        })
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Self) -> Self::Output {
        Position::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Self) -> Self::Output {
        Position::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl From<[i32; 3]> for Position {
    fn from(v: [i32; 3]) -> Self {
        Position::new(v[0], v[1], v[2])
    }
}

impl From<Position> for [i32; 3] {
    fn from(p: Position) -> Self {
        [p.x, p.y, p.z]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Z-
    North,
    /// Z+,
    South,
    /// X+
    East,
    /// X-
    West,
    /// +Y
    Up,
    /// -Y
    Down,
}

impl Direction {
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    #[inline]
    pub fn is_horizontal(self) -> bool {
        !matches!(self, Direction::Up | Direction::Down)
    }

    /// Clockwise around the Y axis when looking down. Vertical directions are left alone.
    #[inline]
    pub fn clockwise(self) -> Self {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
            d => d,
        }
    }

    #[inline]
    pub fn counter_clockwise(self) -> Self {
        match self {
            Direction::North => Direction::West,
            Direction::West => Direction::South,
            Direction::South => Direction::East,
            Direction::East => Direction::North,
            d => d,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "north" => Some(Direction::North),
            "south" => Some(Direction::South),
            "east" => Some(Direction::East),
            "west" => Some(Direction::West),
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            _ => None,
        }
    }

    /// The 3D data value used by hanging entities (down, up, north, south, west, east)
    pub fn data_3d(self) -> i8 {
        match self {
            Direction::Down => 0,
            Direction::Up => 1,
            Direction::North => 2,
            Direction::South => 3,
            Direction::West => 4,
            Direction::East => 5,
        }
    }

    pub fn from_data_3d(v: i8) -> Option<Self> {
        match v {
            0 => Some(Direction::Down),
            1 => Some(Direction::Up),
            2 => Some(Direction::North),
            3 => Some(Direction::South),
            4 => Some(Direction::West),
            5 => Some(Direction::East),
            _ => None,
        }
    }

    /// The 2D data value used by paintings (south, west, north, east)
    pub fn data_2d(self) -> Option<i8> {
        match self {
            Direction::South => Some(0),
            Direction::West => Some(1),
            Direction::North => Some(2),
            Direction::East => Some(3),
            _ => None,
        }
    }

    pub fn from_data_2d(v: i8) -> Option<Self> {
        match v.rem_euclid(4) {
            0 => Some(Direction::South),
            1 => Some(Direction::West),
            2 => Some(Direction::North),
            3 => Some(Direction::East),
            _ => None,
        }
    }
}

pub const PLANAR_DIRECTIONS: [Direction; 4] = [
    Direction::North,
    Direction::South,
    Direction::East,
    Direction::West,
];

pub const ALL_DIRECTIONS: [Direction; 6] = [
    Direction::North,
    Direction::South,
    Direction::East,
    Direction::West,
    Direction::Up,
    Direction::Down,
];

/// Inclusive integer box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub min: Position,
    pub max: Position,
}

impl BoundingBox {
    pub fn from_corners(a: Position, b: Position) -> Self {
        Self {
            min: a.component_min(&b),
            max: a.component_max(&b),
        }
    }

    pub fn is_inside(&self, p: Position) -> bool {
        self.min.x <= p.x
            && p.x <= self.max.x
            && self.min.y <= p.y
            && p.y <= self.max.y
            && self.min.z <= p.z
            && p.z <= self.max.z
    }

    pub fn moved(&self, by: Position) -> Self {
        Self {
            min: self.min + by,
            max: self.max + by,
        }
    }

    pub fn encapsulate(&mut self, p: Position) {
        self.min = self.min.component_min(&p);
        self.max = self.max.component_max(&p);
    }

    pub fn span(&self) -> Position {
        self.max - self.min + Position::new(1, 1, 1)
    }

    pub fn volume(&self) -> i64 {
        let s = self.span();
        s.x as i64 * s.y as i64 * s.z as i64
    }
}

impl Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} -> {}]", self.min, self.max)
    }
}

bitflags::bitflags! {
    /// Flags accepted by block writes, mirroring the bits the game uses for `setBlock`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct UpdateFlags: u32 {
        const NEIGHBORS = 0b0000_0001;
        const CLIENTS = 0b0000_0010;
        const INVISIBLE = 0b0000_0100;
        const IMMEDIATE = 0b0000_1000;
        const KNOWN_SHAPE = 0b0001_0000;
        const SUPPRESS_DROPS = 0b0010_0000;
        const MOVE_BY_PISTON = 0b0100_0000;

        const DEFAULT = Self::NEIGHBORS.bits() | Self::CLIENTS.bits();
    }
}

impl Default for UpdateFlags {
    fn default() -> Self {
        UpdateFlags::DEFAULT
    }
}

pub struct BlockStorage {
    /// 3D extents. The strides and the block vector are sized from this, so it never changes
    /// after construction.
    pub(self) extents: [u32; 3],
    /// Scale to use for Z coordinates when computing indicies
    pub(self) zsi: u32,
    /// Scale to use for Y coordinates when computing indicies
    pub(self) ysi: u32,

    /// Entry 0 is always air, which doubles as the answer for out-of-bounds reads.
    pub(self) palette: Vec<BlockState>,

    /// Indexes into the palette, stored in x - z - y order
    pub(self) blocks: Vec<u32>,

    /// Block entity overlay, only populated for states that carry a block entity
    pub(self) block_entities: HashMap<Position, NbtCompound>,

    pub(self) entities: Vec<Entity>,

    /// Every position a neighbor notification was sent from, in order
    pub(self) neighbor_updates: Vec<Position>,
}

impl BlockStorage {
    /// An all-air storage of the given extents. Fails if the cell count doesn't fit the `u32`
    /// indices the storage uses.
    pub fn new(sx: u32, sy: u32, sz: u32) -> Result<Self> {
        let total_size = sx
            .checked_mul(sz)
            .and_then(|layer| layer.checked_mul(sy))
            .ok_or_else(|| anyhow!("Block storage of {}x{}x{} is too large", sx, sy, sz))?;

        let zsi = sx;
        let ysi = sx * sz;

        Ok(Self {
            extents: [sx, sy, sz],
            zsi,
            ysi,
            palette: vec![BlockState::air()],
            blocks: vec![0; total_size as usize],
            block_entities: Default::default(),
            entities: Vec::new(),
            neighbor_updates: Vec::new(),
        })
    }

    pub fn blocks(&self) -> iter::Blocks<'_> {
        iter::Blocks::new(self)
    }

    /// Palette index of `b`, adding it if it's new
    fn add_new_block_type(&mut self, b: BlockState) -> u32 {
        // Linear scan. Worlds used for placement previews rarely hold more than a few dozen
        // distinct states, revisit if it shows up in a profile.
        if let Some(i) = self.palette.iter().position(|known| known == &b) {
            return i as u32;
        }
        self.palette.push(b);
        (self.palette.len() - 1) as u32
    }

    /// Flat index for an in-bounds position
    #[inline]
    fn index_of(&self, pos: Position) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 || pos.z < 0 {
            return None;
        }
        let (x, y, z) = (pos.x as u32, pos.y as u32, pos.z as u32);
        if x >= self.extents[0] || y >= self.extents[1] || z >= self.extents[2] {
            return None;
        }
        debug_assert!(
            self.blocks.len() as u32 == self.extents[0] * self.extents[1] * self.extents[2]
        );
        Some((x + z * self.zsi + y * self.ysi) as usize)
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.index_of(pos).is_some()
    }

    /// The block state at `pos`, air when out of bounds
    pub fn block_state(&self, pos: Position) -> &BlockState {
        match self.index_of(pos) {
            Some(i) => &self.palette[self.blocks[i] as usize],
            None => &self.palette[0],
        }
    }

    /// Write a block state. Returns false when `pos` is outside the storage or the state is
    /// unchanged, in which case nothing happens.
    pub fn set_block_state(&mut self, pos: Position, state: BlockState, flags: UpdateFlags) -> bool {
        let Some(i) = self.index_of(pos) else {
            log::trace!("Dropping write of {} outside storage at {}", state, pos);
            return false;
        };
        if self.palette[self.blocks[i] as usize] == state {
            return false;
        }

        if state.has_block_entity() {
            self.block_entities.entry(pos).or_default();
        } else {
            self.block_entities.remove(&pos);
        }

        let notify = flags.contains(UpdateFlags::NEIGHBORS);
        let name = state.name.clone();
        let idx = self.add_new_block_type(state);
        self.blocks[i] = idx;

        if notify {
            self.record_neighbor_update(pos, &name);
        }
        true
    }

    pub fn block_entity(&self, pos: Position) -> Option<&NbtCompound> {
        self.block_entities.get(&pos)
    }

    /// Replace the payload of the block entity at `pos`. Does nothing if the block there has no
    /// block entity.
    pub fn load_block_entity(&mut self, pos: Position, tag: NbtCompound) -> bool {
        match self.block_entities.get_mut(&pos) {
            Some(be) => {
                *be = tag;
                true
            }
            None => false,
        }
    }

    /// Empty out the block entity at `pos`, if there is one
    pub fn clear_block_entity(&mut self, pos: Position) {
        if let Some(be) = self.block_entities.get_mut(&pos) {
            *be = NbtCompound::new();
        }
    }

    pub fn record_neighbor_update(&mut self, pos: Position, block: &str) {
        log::trace!("Neighbor update from {} at {}", block, pos);
        self.neighbor_updates.push(pos);
    }

    pub fn neighbor_updates(&self) -> &[Position] {
        &self.neighbor_updates
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn add_entity(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    pub fn entities_in<'a>(&'a self, area: &'a Aabb) -> impl Iterator<Item = &'a Entity> + 'a {
        self.entities
            .iter()
            .filter(move |e| e.bounding_box().intersects(area))
    }

    /// Y of the first air block above the highest non-air block in the column, 0 for an empty
    /// column.
    pub fn surface_height(&self, x: i32, z: i32) -> i32 {
        for y in (0..self.extents[1] as i32).rev() {
            if !self.block_state(Position::new(x, y, z)).is_air() {
                return y + 1;
            }
        }
        0
    }

    pub fn non_air_count(&self) -> usize {
        self.blocks().filter(|(_, state)| !state.is_air()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_track_block_entities() -> Result<()> {
        let mut storage = BlockStorage::new(4, 4, 4)?;
        let pos = Position::new(1, 2, 3);

        assert!(storage.set_block_state(pos, BlockState::new("minecraft:chest"), UpdateFlags::DEFAULT));
        assert!(storage.block_entity(pos).is_some());
        assert_eq!(storage.neighbor_updates(), &[pos]);

        // Same state again is a no-op
        assert!(!storage.set_block_state(
            pos,
            BlockState::new("minecraft:chest"),
            UpdateFlags::DEFAULT
        ));

        assert!(storage.set_block_state(pos, BlockState::new("minecraft:stone"), UpdateFlags::empty()));
        assert!(storage.block_entity(pos).is_none());
        assert_eq!(storage.neighbor_updates().len(), 1);
        Ok(())
    }

    #[test]
    fn out_of_bounds_reads_air_and_rejects_writes() -> Result<()> {
        let mut storage = BlockStorage::new(2, 2, 2)?;
        let pos = Position::new(-1, 0, 0);
        assert!(storage.block_state(pos).is_air());
        assert!(!storage.set_block_state(pos, BlockState::new("minecraft:stone"), UpdateFlags::DEFAULT));
        assert!(!storage.contains(Position::new(2, 0, 0)));
        Ok(())
    }

    #[test]
    fn oversized_storage_is_rejected() {
        assert!(BlockStorage::new(70000, 70000, 1).is_err());
        assert!(BlockStorage::new(u32::MAX, 2, 1).is_err());
    }

    #[test]
    fn coordinates_round_trip_through_iteration() -> Result<()> {
        let mut storage = BlockStorage::new(3, 2, 4)?;
        let pos = Position::new(2, 1, 3);
        storage.set_block_state(pos, BlockState::new("minecraft:stone"), UpdateFlags::empty());

        let found: Vec<_> = storage
            .blocks()
            .filter(|(_, state)| !state.is_air())
            .map(|(p, _)| p)
            .collect();
        assert_eq!(found, vec![pos]);
        assert_eq!(storage.surface_height(2, 3), 2);
        assert_eq!(storage.non_air_count(), 1);
        Ok(())
    }

    #[test]
    fn between_closed_covers_the_box() {
        let all: Vec<_> =
            Position::between_closed(Position::new(1, 1, 1), Position::new(0, 0, 0)).collect();
        assert_eq!(all.len(), 8);
        assert_eq!(all[0], Position::new(0, 0, 0));
        assert_eq!(all[1], Position::new(1, 0, 0));
        assert_eq!(all[7], Position::new(1, 1, 1));
    }

    #[test]
    fn bounding_boxes_take_per_axis_extremes() {
        let mut bb = BoundingBox::from_corners(Position::new(3, 0, -2), Position::new(-1, 4, 5));
        assert_eq!(bb.min, Position::new(-1, 0, -2));
        assert_eq!(bb.max, Position::new(3, 4, 5));

        bb.encapsulate(Position::new(0, -3, 9));
        assert_eq!(bb.min, Position::new(-1, -3, -2));
        assert_eq!(bb.max, Position::new(3, 4, 9));
        assert_eq!(
            Position::new(1, 8, -4).component_min(&Position::new(2, 0, -5)),
            Position::new(1, 0, -5)
        );
    }
}
