use mcst_common::block_storage::{BlockState, Position};
use mcst_common::entity::Vec3d;
use quartz_nbt::NbtCompound;
use std::fmt::Display;

/// One block of a template. Positions are relative to the template's corner until the placement
/// engine moves them into world space.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockInfo {
    pub pos: Position,
    pub state: BlockState,
    /// Block entity payload
    pub nbt: Option<NbtCompound>,
}

impl BlockInfo {
    pub fn new(pos: Position, state: BlockState, nbt: Option<NbtCompound>) -> Self {
        Self { pos, state, nbt }
    }

    /// Same block somewhere else
    pub fn moved_to(&self, pos: Position) -> Self {
        Self {
            pos,
            state: self.state.clone(),
            nbt: self.nbt.clone(),
        }
    }
}

impl Display for BlockInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.nbt {
            Some(nbt) => write!(f, "<{}, {}, {}>", self.pos, self.state, nbt),
            None => write!(f, "<{}, {}>", self.pos, self.state),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EntityInfo {
    /// Exact position, fractional part is the offset inside the block
    pub pos: Vec3d,
    /// Block the entity belongs to. For hanging entities this is the block they hang on, which
    /// is not always the block containing `pos`.
    pub block_pos: Position,
    pub nbt: NbtCompound,
}

impl EntityInfo {
    pub fn new(pos: Vec3d, block_pos: Position, nbt: NbtCompound) -> Self {
        Self {
            pos,
            block_pos,
            nbt,
        }
    }

    pub fn id(&self) -> Option<&str> {
        use mcst_common::NbtExt;
        self.nbt.get_string("id").ok()
    }
}

impl Display for EntityInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<{} at {} in {}>",
            self.id().unwrap_or("?"),
            self.pos,
            self.block_pos
        )
    }
}
