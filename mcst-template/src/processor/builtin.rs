use super::{ProcessContext, StructureProcessor};
use crate::info::BlockInfo;
use crate::jigsaw::JIGSAW;
use mcst_common::block_storage::{BlockState, Position};
use mcst_common::NbtExt;
use rand::Rng;

/// Drops blocks of the listed types
#[derive(Clone, Debug, PartialEq)]
pub struct BlockIgnoreProcessor {
    pub blocks: Vec<String>,
}

impl BlockIgnoreProcessor {
    pub fn new<S: Into<String>>(blocks: impl IntoIterator<Item = S>) -> Self {
        Self {
            blocks: blocks.into_iter().map(Into::into).collect(),
        }
    }

    pub fn structure_block() -> Self {
        Self::new(["minecraft:structure_block"])
    }

    pub fn air() -> Self {
        Self::new(["minecraft:air"])
    }

    pub fn structure_and_air() -> Self {
        Self::new(["minecraft:air", "minecraft:structure_block"])
    }
}

impl StructureProcessor for BlockIgnoreProcessor {
    fn process_block(
        &self,
        _ctx: &ProcessContext,
        _original: &BlockInfo,
        current: BlockInfo,
    ) -> Option<BlockInfo> {
        if self.blocks.iter().any(|b| current.state.is(b)) {
            None
        } else {
            Some(current)
        }
    }
}

/// Lets each block through with probability `integrity`, for ruins
#[derive(Clone, Debug, PartialEq)]
pub struct BlockRotProcessor {
    pub integrity: f32,
    /// Only these blocks can rot. Everything can when unset.
    pub rottable: Option<Vec<String>>,
}

impl BlockRotProcessor {
    pub fn new(integrity: f32) -> Self {
        Self {
            integrity,
            rottable: None,
        }
    }

    pub fn only<S: Into<String>>(mut self, blocks: impl IntoIterator<Item = S>) -> Self {
        self.rottable = Some(blocks.into_iter().map(Into::into).collect());
        self
    }
}

impl StructureProcessor for BlockRotProcessor {
    fn process_block(
        &self,
        ctx: &ProcessContext,
        _original: &BlockInfo,
        current: BlockInfo,
    ) -> Option<BlockInfo> {
        if let Some(rottable) = &self.rottable {
            if !rottable.iter().any(|b| current.state.is(b)) {
                return Some(current);
            }
        }
        if self.integrity >= 1.0 {
            return Some(current);
        }
        let roll = ctx.settings.random_for(current.pos).random::<f32>();
        if roll <= self.integrity {
            Some(current)
        } else {
            None
        }
    }
}

/// Swaps every block of one type for a fixed state, with a per-position chance
#[derive(Clone, Debug, PartialEq)]
pub struct BlockReplaceProcessor {
    pub target: String,
    pub replacement: BlockState,
    pub probability: f32,
}

impl BlockReplaceProcessor {
    pub fn new(target: impl Into<String>, replacement: BlockState) -> Self {
        Self {
            target: target.into(),
            replacement,
            probability: 1.0,
        }
    }

    pub fn with_probability(mut self, probability: f32) -> Self {
        self.probability = probability;
        self
    }
}

impl StructureProcessor for BlockReplaceProcessor {
    fn process_block(
        &self,
        ctx: &ProcessContext,
        _original: &BlockInfo,
        current: BlockInfo,
    ) -> Option<BlockInfo> {
        if !current.state.is(&self.target) {
            return Some(current);
        }
        if self.probability < 1.0 {
            let roll = ctx.settings.random_for(current.pos).random::<f32>();
            if roll >= self.probability {
                return Some(current);
            }
        }
        Some(BlockInfo::new(current.pos, self.replacement.clone(), None))
    }
}

/// Drapes the template over the terrain: each block's height becomes the surface height of its
/// column plus its height inside the template.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GravityProcessor {
    pub offset: i32,
}

impl GravityProcessor {
    pub fn new(offset: i32) -> Self {
        Self { offset }
    }
}

impl StructureProcessor for GravityProcessor {
    fn process_block(
        &self,
        ctx: &ProcessContext,
        original: &BlockInfo,
        current: BlockInfo,
    ) -> Option<BlockInfo> {
        let surface = ctx.level.surface_height(current.pos.x, current.pos.z) + self.offset;
        let pos = Position::new(current.pos.x, surface + original.pos.y, current.pos.z);
        Some(BlockInfo { pos, ..current })
    }
}

/// Turns jigsaw blocks into their `final_state`. A final state of structure void removes the
/// block.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct JigsawReplacementProcessor;

impl StructureProcessor for JigsawReplacementProcessor {
    fn process_block(
        &self,
        _ctx: &ProcessContext,
        _original: &BlockInfo,
        current: BlockInfo,
    ) -> Option<BlockInfo> {
        if !current.state.is(JIGSAW) {
            return Some(current);
        }
        let final_state = current
            .nbt
            .as_ref()
            .and_then(|n| n.get_string("final_state").ok())
            .unwrap_or("minecraft:air");
        let state = final_state.parse::<BlockState>().unwrap_or_else(|e| {
            log::warn!(
                "Bad final_state {:?} on jigsaw at {}: {}",
                final_state,
                current.pos,
                e
            );
            BlockState::air()
        });
        if state.is_structure_void() {
            None
        } else {
            Some(BlockInfo::new(current.pos, state, None))
        }
    }
}

/// Refuses to overwrite the listed blocks where they already exist in the world
#[derive(Clone, Debug, PartialEq)]
pub struct ProtectedBlocksProcessor {
    pub protected: Vec<String>,
}

impl ProtectedBlocksProcessor {
    pub fn new<S: Into<String>>(blocks: impl IntoIterator<Item = S>) -> Self {
        Self {
            protected: blocks.into_iter().map(Into::into).collect(),
        }
    }
}

impl StructureProcessor for ProtectedBlocksProcessor {
    fn process_block(
        &self,
        ctx: &ProcessContext,
        _original: &BlockInfo,
        current: BlockInfo,
    ) -> Option<BlockInfo> {
        let existing = ctx.level.block_state(current.pos);
        if self.protected.iter().any(|b| existing.is(b)) {
            None
        } else {
            Some(current)
        }
    }
}
