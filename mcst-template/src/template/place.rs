use super::StructureTemplate;
use crate::level::{update_from_neighbour_shapes, Level};
use crate::processor::{process_block_infos, process_entity_infos, ProcessContext};
use crate::settings::PlacementSettings;
use bit_vec::BitVec;
use mcst_common::block_storage::{
    BlockState, BoundingBox, Direction, Position, UpdateFlags, ALL_DIRECTIONS,
};
use mcst_common::entity::Entity;
use quartz_nbt::{NbtCompound, NbtList, NbtTag};
use rand::Rng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::collections::HashSet;
use tracing::info_span;

/// Neighbors a dry waterloggable block can pull a source from. Never from below.
const FLUID_PULL_DIRECTIONS: [Direction; 5] = [
    Direction::Up,
    Direction::North,
    Direction::East,
    Direction::South,
    Direction::West,
];

impl StructureTemplate {
    /// Stamp this template into `level` at `origin`. `pivot` is handed to processors; the
    /// geometry uses `settings.pivot`.
    ///
    /// Returns false without touching the world if the template is empty or degenerate. Once
    /// writing starts it is best effort: blocks the world refuses and entities that fail to load
    /// are skipped and the placement still counts as a success.
    pub fn place_in_world<L: Level>(
        &self,
        level: &mut L,
        origin: Position,
        pivot: Position,
        settings: &PlacementSettings,
    ) -> bool {
        let _span = info_span!("place", %origin, rotation = %settings.rotation, mirror = %settings.mirror)
            .entered();

        let Some(palette) = settings.select_palette(&self.palettes, origin) else {
            log::debug!("Refusing to place a template with no palettes");
            return false;
        };
        let blocks = palette.blocks();
        let nothing_to_place =
            blocks.is_empty() && (settings.ignore_entities || self.entities.is_empty());
        if nothing_to_place || self.size.x < 1 || self.size.y < 1 || self.size.z < 1 {
            log::debug!("Refusing to place empty template of size {}", self.size);
            return false;
        }

        let mut rng = settings.random_for(origin);

        let processed = {
            let ctx = ProcessContext {
                level: &*level,
                origin,
                pivot,
                settings,
                template: Some(self),
            };
            process_block_infos(&ctx, blocks)
        };

        let mut bounds: Option<BoundingBox> = None;
        let mut placed: Vec<(Position, Option<NbtCompound>)> = Vec::with_capacity(processed.len());
        let mut pending_fluid: Vec<Position> = Vec::new();
        let mut placed_sources: HashSet<Position> = HashSet::new();

        {
            let _span = info_span!("write_blocks", count = processed.len()).entered();
            for info in processed {
                let pos = info.pos;
                if let Some(bb) = &settings.bounding_box {
                    if !bb.is_inside(pos) {
                        continue;
                    }
                }

                let prior_fluid = settings.keep_liquids.then(|| level.fluid_state(pos));
                let state = info.state.mirror(settings.mirror).rotate(settings.rotation);

                if info.nbt.is_some() {
                    // Placeholder so nothing reads a half-built block entity
                    level.clear_block_entity(pos);
                    level.set_block(
                        pos,
                        BlockState::barrier(),
                        UpdateFlags::INVISIBLE | UpdateFlags::KNOWN_SHAPE,
                    );
                }

                if !level.set_block(pos, state.clone(), settings.update_flags) {
                    log::trace!("World refused {} at {}", state, pos);
                    continue;
                }

                match &mut bounds {
                    Some(b) => b.encapsulate(pos),
                    None => bounds = Some(BoundingBox::from_corners(pos, pos)),
                }

                let nbt = info.nbt.map(|mut nbt| {
                    nbt.insert("x", pos.x);
                    nbt.insert("y", pos.y);
                    nbt.insert("z", pos.z);
                    load_payload(level, pos, &mut nbt, &mut rng);
                    nbt
                });

                if let Some(fluid) = prior_fluid {
                    if state.fluid_state().is_source() {
                        placed_sources.insert(pos);
                    } else if state.is_fluid_container() {
                        if let Some(filled) = state.place_liquid(fluid) {
                            level.set_block(pos, filled, UpdateFlags::DEFAULT);
                        }
                        if !fluid.is_source() {
                            pending_fluid.push(pos);
                        }
                    }
                }

                placed.push((pos, nbt));
            }
        }

        promote_fluids(level, pending_fluid, &placed_sources);

        if let Some(bounds) = bounds {
            if !settings.known_shape {
                let _span = info_span!("shape_pass", %bounds).entered();
                let grid = OccupancyGrid::new(bounds, placed.iter().map(|(p, _)| *p));
                update_shape_at_edge(level, settings.update_flags, &grid);
            }

            let relaxed =
                settings.update_flags.difference(UpdateFlags::NEIGHBORS) | UpdateFlags::KNOWN_SHAPE;
            for (pos, nbt) in placed {
                if !settings.known_shape {
                    let current = level.block_state(pos);
                    let updated = update_from_neighbour_shapes(&*level, pos, current.clone());
                    let name = updated.name.clone();
                    if updated != current {
                        level.set_block(pos, updated, relaxed);
                    }
                    level.update_neighbors_at(pos, &name);
                }
                if let Some(mut nbt) = nbt {
                    load_payload(level, pos, &mut nbt, &mut rng);
                }
            }
        }

        if !settings.ignore_entities {
            self.place_entities(level, origin, pivot, settings);
        }
        true
    }

    fn place_entities<L: Level>(
        &self,
        level: &mut L,
        origin: Position,
        pivot: Position,
        settings: &PlacementSettings,
    ) {
        let _span = info_span!("place_entities", count = self.entities.len()).entered();

        let infos = {
            let ctx = ProcessContext {
                level: &*level,
                origin,
                pivot,
                settings,
                template: Some(self),
            };
            process_entity_infos(&ctx, &self.entities)
        };

        for info in infos {
            if let Some(bb) = &settings.bounding_box {
                if !bb.is_inside(info.block_pos) {
                    continue;
                }
            }

            let mut tag = info.nbt.clone();
            tag.insert(
                "Pos",
                NbtList::from(vec![
                    NbtTag::Double(info.pos.x),
                    NbtTag::Double(info.pos.y),
                    NbtTag::Double(info.pos.z),
                ]),
            );
            tag.inner_mut().remove("UUID");

            let mut entity = match Entity::from_nbt(&tag) {
                Ok(e) => e,
                Err(e) => {
                    log::warn!("Skipping entity at {}: {:#}", info.pos, e);
                    continue;
                }
            };

            let mut yaw = entity.rotate(settings.rotation);
            yaw += entity.mirror(settings.mirror) - entity.yaw;
            let pitch = entity.pitch;
            entity.move_to(info.pos, yaw, pitch);

            if settings.finalize_entities && entity.is_mob() {
                level.finalize_spawn(&mut entity);
            }
            let id = entity.id.clone();
            if !level.add_fresh_entity_with_passengers(entity) {
                log::debug!("World refused {} at {}", id, info.pos);
            }
        }
    }
}

/// Hand `nbt` to the block entity at `pos`, if one exists. Containers get a fresh loot seed.
fn load_payload<L: Level>(
    level: &mut L,
    pos: Position,
    nbt: &mut NbtCompound,
    rng: &mut Xoshiro256PlusPlus,
) {
    if level.block_entity(pos).is_none() {
        return;
    }
    if level.block_state(pos).is_container() {
        nbt.insert("LootTableSeed", rng.random::<i64>());
    }
    level.load_block_entity(pos, nbt.clone());
}

/// Dry waterloggable blocks placed over flowing fluid take water from a neighboring source, over
/// and over until nothing changes. Sources placed by the template itself don't count.
fn promote_fluids<L: Level>(
    level: &mut L,
    mut pending: Vec<Position>,
    placed_sources: &HashSet<Position>,
) {
    let _span = info_span!("fluid_pass", pending = pending.len()).entered();
    let mut changed = true;
    while changed && !pending.is_empty() {
        changed = false;
        pending.retain(|&pos| {
            let mut fluid = level.fluid_state(pos);
            for d in FLUID_PULL_DIRECTIONS {
                if fluid.is_source() {
                    break;
                }
                let neighbor = pos.offset(d);
                let neighbor_fluid = level.fluid_state(neighbor);
                if neighbor_fluid.is_source() && !placed_sources.contains(&neighbor) {
                    fluid = neighbor_fluid;
                }
            }
            if !fluid.is_source() {
                return true;
            }
            let state = level.block_state(pos);
            if !state.is_fluid_container() {
                return true;
            }
            if let Some(filled) = state.place_liquid(fluid) {
                level.set_block(pos, filled, UpdateFlags::DEFAULT);
            }
            changed = true;
            false
        });
    }
}

/// Which cells of a box were written by the placement
struct OccupancyGrid {
    bounds: BoundingBox,
    span: Position,
    bits: BitVec,
}

impl OccupancyGrid {
    fn new(bounds: BoundingBox, filled: impl Iterator<Item = Position>) -> Self {
        let span = bounds.span();
        let mut grid = Self {
            bounds,
            span,
            bits: BitVec::from_elem(bounds.volume() as usize, false),
        };
        for p in filled {
            if let Some(i) = grid.index(p) {
                grid.bits.set(i, true);
            }
        }
        grid
    }

    fn index(&self, p: Position) -> Option<usize> {
        if !self.bounds.is_inside(p) {
            return None;
        }
        let r = p - self.bounds.min;
        Some((r.x + r.z * self.span.x + r.y * self.span.x * self.span.z) as usize)
    }

    fn is_filled(&self, p: Position) -> bool {
        self.index(p)
            .and_then(|i| self.bits.get(i))
            .unwrap_or(false)
    }

    fn filled(&self) -> impl Iterator<Item = Position> + '_ {
        Position::between_closed(self.bounds.min, self.bounds.max).filter(|p| self.is_filled(*p))
    }
}

/// Fix up shapes across every face between a placed block and one that wasn't placed, on both
/// sides of the face.
fn update_shape_at_edge<L: Level>(level: &mut L, flags: UpdateFlags, grid: &OccupancyGrid) {
    let flags = flags.difference(UpdateFlags::NEIGHBORS);
    for pos in grid.filled() {
        for d in ALL_DIRECTIONS {
            let outside = pos.offset(d);
            if grid.is_filled(outside) {
                continue;
            }
            let state = level.block_state(pos);
            let neighbor = level.block_state(outside);

            let updated = state.update_shape(d, &neighbor);
            if updated != state {
                level.set_block(pos, updated.clone(), flags);
            }
            let neighbor_updated = neighbor.update_shape(d.opposite(), &updated);
            if neighbor_updated != neighbor {
                level.set_block(outside, neighbor_updated, flags);
            }
        }
    }
}
