use super::*;
use crate::info::EntityInfo;
use crate::jigsaw::JIGSAW;
use anyhow::Result;
use mcst_common::block_storage::{BlockState, BlockStorage, UpdateFlags};
use quartz_nbt::NbtCompound;
use std::sync::{Arc, Mutex};

fn init(sx: u32, sy: u32, sz: u32) -> BlockStorage {
    let _ = tracing_subscriber::fmt::try_init();
    BlockStorage::new(sx, sy, sz).unwrap()
}

fn stone_at(x: i32, y: i32, z: i32) -> BlockInfo {
    BlockInfo::new(Position::new(x, y, z), BlockState::new("minecraft:stone"), None)
}

fn template(size: Position, blocks: Vec<BlockInfo>) -> Result<StructureTemplate> {
    StructureTemplate::from_parts(size, vec![blocks], vec![])
}

/// Drops every block whose template position has the given X
#[derive(Debug)]
struct VetoColumn(i32);

impl StructureProcessor for VetoColumn {
    fn process_block(
        &self,
        _ctx: &ProcessContext,
        original: &BlockInfo,
        current: BlockInfo,
    ) -> Option<BlockInfo> {
        (original.pos.x != self.0).then_some(current)
    }
}

/// Remembers everything it was shown
#[derive(Debug, Default)]
struct Recorder {
    seen: Mutex<Vec<Position>>,
    finalized: Mutex<Vec<Position>>,
}

impl StructureProcessor for Recorder {
    fn process_block(
        &self,
        _ctx: &ProcessContext,
        original: &BlockInfo,
        current: BlockInfo,
    ) -> Option<BlockInfo> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(original.pos);
        }
        Some(current)
    }

    fn finalize_processing(
        &self,
        _ctx: &ProcessContext,
        originals: &[BlockInfo],
        processed: Vec<BlockInfo>,
    ) -> Vec<BlockInfo> {
        if let Ok(mut f) = self.finalized.lock() {
            f.extend(originals.iter().map(|b| b.pos));
        }
        processed
    }
}

/// Makes sure at least one gold block comes out of the pipeline
#[derive(Debug)]
struct AtLeastOneGold;

impl StructureProcessor for AtLeastOneGold {
    fn process_block(
        &self,
        _ctx: &ProcessContext,
        _original: &BlockInfo,
        current: BlockInfo,
    ) -> Option<BlockInfo> {
        Some(current)
    }

    fn finalize_processing(
        &self,
        _ctx: &ProcessContext,
        _originals: &[BlockInfo],
        mut processed: Vec<BlockInfo>,
    ) -> Vec<BlockInfo> {
        if !processed.iter().any(|b| b.state.is("minecraft:gold_block")) {
            if let Some(first) = processed.first_mut() {
                first.state = BlockState::new("minecraft:gold_block");
            }
        }
        processed
    }
}

#[test]
fn veto_skips_block_but_placement_succeeds() -> Result<()> {
    let mut world = init(6, 3, 6);
    let t = template(
        Position::new(2, 1, 1),
        vec![stone_at(0, 0, 0), stone_at(1, 0, 0)],
    )?;
    let settings = PlacementSettings::default().with_processor(VetoColumn(1));
    let origin = Position::new(2, 0, 2);

    assert!(t.place_in_world(&mut world, origin, origin, &settings));
    assert!(world.block_state(Position::new(2, 0, 2)).is("minecraft:stone"));
    assert!(world.block_state(Position::new(3, 0, 2)).is_air());
    Ok(())
}

#[test]
fn vetoed_blocks_never_reach_later_processors() -> Result<()> {
    let world = init(4, 4, 4);
    let recorder = Arc::new(Recorder::default());
    let mut settings = PlacementSettings::default().with_processor(VetoColumn(1));
    settings.processors.push(recorder.clone());

    let blocks = vec![stone_at(0, 0, 0), stone_at(1, 0, 0), stone_at(2, 0, 0)];
    let ctx = ProcessContext {
        level: &world,
        origin: Position::ZERO,
        pivot: Position::ZERO,
        settings: &settings,
        template: None,
    };
    let out = process_block_infos(&ctx, &blocks);

    let expected = vec![Position::new(0, 0, 0), Position::new(2, 0, 0)];
    assert_eq!(out.iter().map(|b| b.pos).collect::<Vec<_>>(), expected);
    assert_eq!(*recorder.seen.lock().unwrap(), expected);
    assert_eq!(*recorder.finalized.lock().unwrap(), expected);
    Ok(())
}

#[test]
fn finalize_passes_chain() -> Result<()> {
    let world = init(4, 4, 4);
    let recorder = Arc::new(Recorder::default());
    let mut settings = PlacementSettings::default().with_processor(AtLeastOneGold);
    settings.processors.push(recorder.clone());

    let blocks = vec![stone_at(0, 0, 0), stone_at(0, 1, 0)];
    let ctx = ProcessContext {
        level: &world,
        origin: Position::new(1, 0, 1),
        pivot: Position::ZERO,
        settings: &settings,
        template: None,
    };
    let out = process_block_infos(&ctx, &blocks);

    assert_eq!(out.len(), 2);
    assert!(out[0].state.is("minecraft:gold_block"));
    assert_eq!(out[0].pos, Position::new(1, 0, 1));
    assert!(out[1].state.is("minecraft:stone"));
    Ok(())
}

#[test]
fn processors_see_world_space_positions() -> Result<()> {
    let world = init(4, 4, 4);
    let settings = PlacementSettings::default()
        .with_rotation(mcst_common::block_storage::Rotation::Clockwise90)
        .with_pivot(Position::new(1, 0, 1));
    let ctx = ProcessContext {
        level: &world,
        origin: Position::new(10, 5, 10),
        pivot: Position::ZERO,
        settings: &settings,
        template: None,
    };
    let out = process_block_infos(&ctx, &[stone_at(2, 0, 0)]);
    assert_eq!(out[0].pos, Position::new(12, 5, 12));
    Ok(())
}

#[test]
fn ignore_processor_drops_listed_types() -> Result<()> {
    let world = init(2, 2, 2);
    let settings = PlacementSettings::default().with_processor(BlockIgnoreProcessor::structure_and_air());
    let blocks = vec![
        stone_at(0, 0, 0),
        BlockInfo::new(Position::new(1, 0, 0), BlockState::air(), None),
        BlockInfo::new(
            Position::new(0, 1, 0),
            BlockState::new("minecraft:structure_block"),
            Some(NbtCompound::new()),
        ),
    ];
    let ctx = ProcessContext {
        level: &world,
        origin: Position::ZERO,
        pivot: Position::ZERO,
        settings: &settings,
        template: None,
    };
    let out = process_block_infos(&ctx, &blocks);
    assert_eq!(out.len(), 1);
    assert!(out[0].state.is("minecraft:stone"));
    Ok(())
}

#[test]
fn rot_follows_integrity() -> Result<()> {
    let world = init(8, 1, 8);
    let blocks: Vec<_> = (0..8)
        .flat_map(|x| (0..8).map(move |z| stone_at(x, 0, z)))
        .collect();

    let run = |integrity: f32| {
        let settings = PlacementSettings::default().with_processor(BlockRotProcessor::new(integrity));
        let ctx = ProcessContext {
            level: &world,
            origin: Position::ZERO,
            pivot: Position::ZERO,
            settings: &settings,
            template: None,
        };
        process_block_infos(&ctx, &blocks)
    };

    assert_eq!(run(1.0).len(), 64);
    assert_eq!(run(0.0).len(), 0);
    let half = run(0.5);
    assert!(!half.is_empty() && half.len() < 64);
    assert_eq!(half, run(0.5));

    // Blocks outside the rottable set are never touched
    let settings = PlacementSettings::default()
        .with_processor(BlockRotProcessor::new(0.0).only(["minecraft:mossy_cobblestone"]));
    let ctx = ProcessContext {
        level: &world,
        origin: Position::ZERO,
        pivot: Position::ZERO,
        settings: &settings,
        template: None,
    };
    assert_eq!(process_block_infos(&ctx, &blocks).len(), 64);
    Ok(())
}

#[test]
fn replace_swaps_target_type() -> Result<()> {
    let world = init(2, 1, 1);
    let planks = BlockState::new("minecraft:oak_planks");
    let settings = PlacementSettings::default().with_processor(BlockReplaceProcessor::new(
        "minecraft:stone",
        planks.clone(),
    ));
    let blocks = vec![
        stone_at(0, 0, 0),
        BlockInfo::new(Position::new(1, 0, 0), BlockState::new("minecraft:dirt"), None),
    ];
    let ctx = ProcessContext {
        level: &world,
        origin: Position::ZERO,
        pivot: Position::ZERO,
        settings: &settings,
        template: None,
    };
    let out = process_block_infos(&ctx, &blocks);
    assert_eq!(out[0].state, planks);
    assert!(out[1].state.is("minecraft:dirt"));
    Ok(())
}

#[test]
fn gravity_drapes_over_terrain() -> Result<()> {
    let mut world = init(4, 8, 4);
    for y in 0..3 {
        world.set_block_state(
            Position::new(1, y, 1),
            BlockState::new("minecraft:dirt"),
            UpdateFlags::empty(),
        );
    }
    let t = template(
        Position::new(1, 2, 1),
        vec![stone_at(0, 0, 0), stone_at(0, 1, 0)],
    )?;
    let settings = PlacementSettings::default().with_processor(GravityProcessor::new(0));

    assert!(t.place_in_world(&mut world, Position::new(1, 0, 1), Position::ZERO, &settings));
    assert!(world.block_state(Position::new(1, 3, 1)).is("minecraft:stone"));
    assert!(world.block_state(Position::new(1, 4, 1)).is("minecraft:stone"));
    assert!(world.block_state(Position::new(1, 0, 1)).is("minecraft:dirt"));
    Ok(())
}

#[test]
fn jigsaws_become_final_state() -> Result<()> {
    let world = init(2, 1, 1);
    let jigsaw = |x: i32, final_state: &str| {
        let mut nbt = NbtCompound::new();
        nbt.insert("final_state", final_state);
        BlockInfo::new(
            Position::new(x, 0, 0),
            BlockState::new(JIGSAW).with_property("orientation", "north_up"),
            Some(nbt),
        )
    };
    let settings = PlacementSettings::default().with_processor(JigsawReplacementProcessor);
    let blocks = vec![
        jigsaw(0, "minecraft:oak_stairs[facing=east]"),
        jigsaw(1, "minecraft:structure_void"),
    ];
    let ctx = ProcessContext {
        level: &world,
        origin: Position::ZERO,
        pivot: Position::ZERO,
        settings: &settings,
        template: None,
    };
    let out = process_block_infos(&ctx, &blocks);
    assert_eq!(out.len(), 1);
    assert_eq!(
        out[0].state,
        BlockState::new("minecraft:oak_stairs").with_property("facing", "east")
    );
    assert!(out[0].nbt.is_none());
    Ok(())
}

#[test]
fn protected_blocks_stay() -> Result<()> {
    let mut world = init(2, 1, 1);
    world.set_block_state(
        Position::ZERO,
        BlockState::new("minecraft:bedrock"),
        UpdateFlags::empty(),
    );
    let t = template(
        Position::new(2, 1, 1),
        vec![stone_at(0, 0, 0), stone_at(1, 0, 0)],
    )?;
    let settings = PlacementSettings::default()
        .with_processor(ProtectedBlocksProcessor::new(["minecraft:bedrock"]));

    assert!(t.place_in_world(&mut world, Position::ZERO, Position::ZERO, &settings));
    assert!(world.block_state(Position::ZERO).is("minecraft:bedrock"));
    assert!(world.block_state(Position::new(1, 0, 0)).is("minecraft:stone"));
    Ok(())
}

#[derive(Debug)]
struct NoCows;

impl StructureProcessor for NoCows {
    fn process_block(
        &self,
        _ctx: &ProcessContext,
        _original: &BlockInfo,
        current: BlockInfo,
    ) -> Option<BlockInfo> {
        Some(current)
    }

    fn process_entity(
        &self,
        _ctx: &ProcessContext,
        _original: &EntityInfo,
        current: EntityInfo,
    ) -> Option<EntityInfo> {
        (current.id() != Some("minecraft:cow")).then_some(current)
    }
}

#[test]
fn entity_pipeline_vetoes_and_moves() -> Result<()> {
    let world = init(1, 1, 1);
    let entity = |id: &str| {
        let mut nbt = NbtCompound::new();
        nbt.insert("id", id);
        EntityInfo::new(Vec3d::new(0.5, 0.0, 0.5), Position::ZERO, nbt)
    };
    let settings = PlacementSettings::default().with_processor(NoCows);
    let ctx = ProcessContext {
        level: &world,
        origin: Position::new(4, 1, 4),
        pivot: Position::ZERO,
        settings: &settings,
        template: None,
    };
    let out = process_entity_infos(&ctx, &[entity("minecraft:cow"), entity("minecraft:pig")]);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id(), Some("minecraft:pig"));
    assert_eq!(out[0].block_pos, Position::new(4, 1, 4));
    assert_eq!(out[0].pos, Vec3d::new(4.5, 1.0, 4.5));
    Ok(())
}
