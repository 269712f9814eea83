//! Processors rewrite or veto blocks and entities on their way from a template into the world.
//!
//! Every block runs through the configured processors in order. A processor returning `None`
//! drops the block and later processors never see it. Once all blocks are through, each processor
//! gets one look at the whole surviving list, feeding the next one.

mod builtin;
#[cfg(test)]
mod tests;

pub use builtin::{
    BlockIgnoreProcessor, BlockReplaceProcessor, BlockRotProcessor, GravityProcessor,
    JigsawReplacementProcessor, ProtectedBlocksProcessor,
};

use crate::info::{BlockInfo, EntityInfo};
use crate::level::Level;
use crate::settings::PlacementSettings;
use crate::template::StructureTemplate;
use crate::transform::{calculate_relative_position, transform_vec3};
use mcst_common::block_storage::Position;
use mcst_common::entity::Vec3d;
use std::fmt::Debug;

/// What a processor gets to look at besides the block itself
#[derive(Clone, Copy)]
pub struct ProcessContext<'a> {
    pub level: &'a dyn Level,
    /// World position the template is being placed at
    pub origin: Position,
    pub pivot: Position,
    pub settings: &'a PlacementSettings,
    pub template: Option<&'a StructureTemplate>,
}

pub trait StructureProcessor: Debug + Send + Sync {
    /// `original` is the block as stored in the template, `current` the block as the previous
    /// processor left it, already in world space.
    fn process_block(
        &self,
        ctx: &ProcessContext,
        original: &BlockInfo,
        current: BlockInfo,
    ) -> Option<BlockInfo>;

    /// Runs once all blocks made it through `process_block`. `originals` and `processed` are
    /// index aligned on the way in.
    fn finalize_processing(
        &self,
        ctx: &ProcessContext,
        originals: &[BlockInfo],
        processed: Vec<BlockInfo>,
    ) -> Vec<BlockInfo> {
        let _ = (ctx, originals);
        processed
    }

    fn process_entity(
        &self,
        ctx: &ProcessContext,
        original: &EntityInfo,
        current: EntityInfo,
    ) -> Option<EntityInfo> {
        let _ = (ctx, original);
        Some(current)
    }
}

/// Move `blocks` into world space and run them through the processors
pub fn process_block_infos(ctx: &ProcessContext, blocks: &[BlockInfo]) -> Vec<BlockInfo> {
    let _span = tracing::info_span!("process_blocks", count = blocks.len()).entered();
    let settings = ctx.settings;

    let mut processed = Vec::with_capacity(blocks.len());
    let mut originals = Vec::with_capacity(blocks.len());
    for original in blocks {
        let pos = calculate_relative_position(settings, original.pos) + ctx.origin;
        let moved = original.moved_to(pos);
        let survivor = settings
            .processors
            .iter()
            .try_fold(moved, |current, p| p.process_block(ctx, original, current));
        match survivor {
            Some(info) => {
                processed.push(info);
                originals.push(original.clone());
            }
            None => log::trace!("Processor vetoed {}", original),
        }
    }

    for p in &settings.processors {
        processed = p.finalize_processing(ctx, &originals, processed);
    }
    processed
}

/// Entity counterpart of [process_block_infos]. There is no finalize step for entities.
pub fn process_entity_infos(ctx: &ProcessContext, entities: &[EntityInfo]) -> Vec<EntityInfo> {
    let settings = ctx.settings;
    entities
        .iter()
        .filter_map(|original| {
            let pos = transform_vec3(original.pos, settings.mirror, settings.rotation, settings.pivot)
                + Vec3d::at_lower_corner_of(ctx.origin);
            let block_pos = calculate_relative_position(settings, original.block_pos) + ctx.origin;
            let moved = EntityInfo::new(pos, block_pos, original.nbt.clone());
            settings
                .processors
                .iter()
                .try_fold(moved, |current, p| p.process_entity(ctx, original, current))
        })
        .collect()
}
