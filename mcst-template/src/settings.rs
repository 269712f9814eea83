use crate::palette::Palette;
use crate::processor::StructureProcessor;
use mcst_common::block_storage::{BoundingBox, Mirror, Position, Rotation, UpdateFlags};
use mcst_common::math::position_seed;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::sync::Arc;

/// How a template gets placed
#[derive(Clone, Debug)]
pub struct PlacementSettings {
    pub rotation: Rotation,
    pub mirror: Mirror,
    /// Point the rotation turns about, relative to the template corner
    pub pivot: Position,
    /// Only blocks and entities inside this box get placed
    pub bounding_box: Option<BoundingBox>,
    pub processors: Vec<Arc<dyn StructureProcessor>>,
    pub ignore_entities: bool,
    /// Fluid already in the world flows into waterloggable blocks placed over it
    pub keep_liquids: bool,
    /// Skip the neighbor shape passes, the caller knows shapes are already right
    pub known_shape: bool,
    pub finalize_entities: bool,
    pub random_palette: bool,
    /// Overrides the position-derived seed
    pub seed: Option<u64>,
    pub update_flags: UpdateFlags,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            rotation: Rotation::None,
            mirror: Mirror::None,
            pivot: Position::ZERO,
            bounding_box: None,
            processors: Vec::new(),
            ignore_entities: false,
            keep_liquids: true,
            known_shape: false,
            finalize_entities: false,
            random_palette: true,
            seed: None,
            update_flags: UpdateFlags::DEFAULT,
        }
    }
}

impl PlacementSettings {
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_mirror(mut self, mirror: Mirror) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn with_pivot(mut self, pivot: Position) -> Self {
        self.pivot = pivot;
        self
    }

    pub fn with_bounding_box(mut self, bb: BoundingBox) -> Self {
        self.bounding_box = Some(bb);
        self
    }

    pub fn with_processor(mut self, processor: impl StructureProcessor + 'static) -> Self {
        self.processors.push(Arc::new(processor));
        self
    }

    pub fn with_ignore_entities(mut self, ignore: bool) -> Self {
        self.ignore_entities = ignore;
        self
    }

    pub fn with_keep_liquids(mut self, keep: bool) -> Self {
        self.keep_liquids = keep;
        self
    }

    pub fn with_known_shape(mut self, known: bool) -> Self {
        self.known_shape = known;
        self
    }

    pub fn with_finalize_entities(mut self, finalize: bool) -> Self {
        self.finalize_entities = finalize;
        self
    }

    pub fn with_random_palette(mut self, random: bool) -> Self {
        self.random_palette = random;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_update_flags(mut self, flags: UpdateFlags) -> Self {
        self.update_flags = flags;
        self
    }

    pub fn clear_processors(mut self) -> Self {
        self.processors.clear();
        self
    }

    /// Random stream for `pos`. The same settings and position always give the same stream.
    pub fn random_for(&self, pos: Position) -> Xoshiro256PlusPlus {
        let from_pos = position_seed(pos) as u64;
        let seed = match self.seed {
            Some(s) => s ^ from_pos,
            None => from_pos,
        };
        Xoshiro256PlusPlus::seed_from_u64(seed)
    }

    /// The palette to place at `pos`
    pub fn select_palette<'a>(&self, palettes: &'a [Palette], pos: Position) -> Option<&'a Palette> {
        match palettes.len() {
            0 => None,
            1 => palettes.first(),
            n if self.random_palette => {
                let i = self.random_for(pos).random_range(0..n);
                palettes.get(i)
            }
            _ => palettes.first(),
        }
    }
}
