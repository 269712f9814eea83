//! Captured regions of blocks and entities, and everything that can be done with one.

mod capture;
mod place;
mod serialization;

use crate::info::{BlockInfo, EntityInfo};
use crate::jigsaw::JigsawInfo;
use crate::palette::Palette;
use crate::settings::PlacementSettings;
use crate::transform::{self, calculate_relative_position};
use anyhow::{ensure, Result};
use mcst_common::block_storage::{BoundingBox, Mirror, Position, Rotation};

/// A region of blocks and entities, independent of any world. Read-only while being placed, so
/// one template can be shared by many placements.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StructureTemplate {
    palettes: Vec<Palette>,
    entities: Vec<EntityInfo>,
    size: Position,
    author: String,
}

impl StructureTemplate {
    pub fn new() -> Self {
        Default::default()
    }

    /// Build a template out of already ordered block lists, one per palette variant.
    pub fn from_parts(
        size: Position,
        palettes: Vec<Vec<BlockInfo>>,
        entities: Vec<EntityInfo>,
    ) -> Result<Self> {
        if let Some(first) = palettes.first() {
            ensure!(
                palettes.iter().all(|p| p.len() == first.len()),
                "Palette variants differ in length"
            );
        }
        Ok(Self {
            palettes: palettes.into_iter().map(Palette::new).collect(),
            entities,
            size,
            author: String::new(),
        })
    }

    pub fn size(&self) -> Position {
        self.size
    }

    /// Size after `rotation`, X and Z trade places on quarter turns
    pub fn size_for(&self, rotation: Rotation) -> Position {
        if rotation.swaps_axes() {
            Position::new(self.size.z, self.size.y, self.size.x)
        } else {
            self.size
        }
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.author = author.into();
    }

    pub fn palettes(&self) -> &[Palette] {
        &self.palettes
    }

    pub fn entities(&self) -> &[EntityInfo] {
        &self.entities
    }

    /// Where `pos_b` of a template placed with `b` sits relative to `pos_a` of one placed with
    /// `a`.
    pub fn calculate_connected_position(
        &self,
        a: &PlacementSettings,
        pos_a: Position,
        b: &PlacementSettings,
        pos_b: Position,
    ) -> Position {
        let a = calculate_relative_position(a, pos_a);
        let b = calculate_relative_position(b, pos_b);
        a - b
    }

    pub fn bounding_box(&self, settings: &PlacementSettings, origin: Position) -> BoundingBox {
        transform::transformed_bounding_box(
            origin,
            settings.rotation,
            settings.pivot,
            settings.mirror,
            self.size,
        )
    }

    pub fn zero_position_with_transform(
        &self,
        pos: Position,
        mirror: Mirror,
        rotation: Rotation,
    ) -> Position {
        transform::zero_position_with_transform(pos, mirror, rotation, self.size.x, self.size.z)
    }

    /// Blocks named `block` from the palette `settings` picks at `origin`, rotated into place.
    /// With `relative` unset the positions stay in template space.
    pub fn filter_blocks(
        &self,
        origin: Position,
        settings: &PlacementSettings,
        block: &str,
        relative: bool,
    ) -> Vec<BlockInfo> {
        let Some(palette) = settings.select_palette(&self.palettes, origin) else {
            return Vec::new();
        };
        palette
            .blocks_of_type(block)
            .iter()
            .filter_map(|info| {
                let pos = if relative {
                    calculate_relative_position(settings, info.pos) + origin
                } else {
                    info.pos
                };
                match &settings.bounding_box {
                    Some(bb) if !bb.is_inside(pos) => None,
                    _ => Some(BlockInfo::new(
                        pos,
                        info.state.clone().rotate(settings.rotation),
                        info.nbt.clone(),
                    )),
                }
            })
            .collect()
    }

    /// Jigsaw connectors of this template placed at `origin` with `rotation`
    pub fn jigsaws(&self, origin: Position, rotation: Rotation) -> Vec<JigsawInfo> {
        let settings = PlacementSettings::default().with_rotation(rotation);
        let Some(palette) = settings.select_palette(&self.palettes, origin) else {
            return Vec::new();
        };
        palette
            .jigsaws()
            .iter()
            .map(|j| {
                let mut j = j.clone();
                j.info.pos = calculate_relative_position(&settings, j.info.pos) + origin;
                j.info.state = j.info.state.rotate(rotation);
                j
            })
            .collect()
    }
}

/// Sorts blocks into the order they get placed in: plain full cubes first so everything else
/// has something to attach to, then oddly shaped blocks, then blocks carrying a payload.
#[derive(Default)]
pub(crate) struct BlockBuckets {
    full: Vec<BlockInfo>,
    irregular: Vec<BlockInfo>,
    with_payload: Vec<BlockInfo>,
}

impl BlockBuckets {
    /// Index of the bucket `info` lands in: 0 full, 1 irregular, 2 with payload
    pub(crate) fn bucket_of(info: &BlockInfo) -> usize {
        if info.nbt.is_some() {
            2
        } else if !info.state.has_dynamic_shape() && info.state.is_full_cube() {
            0
        } else {
            1
        }
    }

    pub(crate) fn push(&mut self, info: BlockInfo) {
        match Self::bucket_of(&info) {
            0 => self.full.push(info),
            1 => self.irregular.push(info),
            _ => self.with_payload.push(info),
        }
    }

    /// Indices of `blocks` in placement order. Alternate palettes of a template are put in this
    /// order as worked out from the first palette, so they stay index aligned.
    pub(crate) fn placement_order(blocks: &[BlockInfo]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..blocks.len()).collect();
        order.sort_by_key(|&i| {
            let b = &blocks[i];
            (Self::bucket_of(b), b.pos.y, b.pos.x, b.pos.z)
        });
        order
    }

    /// Each bucket ordered bottom layer first, then by X, then by Z
    pub(crate) fn into_ordered(self) -> Vec<BlockInfo> {
        let key = |b: &BlockInfo| (b.pos.y, b.pos.x, b.pos.z);
        let mut out = Vec::with_capacity(self.full.len() + self.irregular.len() + self.with_payload.len());
        for mut bucket in [self.full, self.irregular, self.with_payload] {
            bucket.sort_by_key(key);
            out.extend(bucket);
        }
        out
    }
}
