use super::{BlockBuckets, StructureTemplate};
use crate::info::{BlockInfo, EntityInfo};
use crate::level::Level;
use crate::palette::Palette;
use mcst_common::block_storage::{BoundingBox, Position};
use mcst_common::entity::{Aabb, Vec3d};
use tracing::info_span;

impl StructureTemplate {
    /// Capture the `size` sized region starting at `corner`. Blocks named in `denylist` are left
    /// out.
    pub fn capture<L: Level + ?Sized>(
        level: &L,
        corner: Position,
        size: Position,
        with_entities: bool,
        denylist: &[&str],
    ) -> Self {
        let mut template = Self::new();
        template.fill_from_world(level, corner, size, with_entities, denylist);
        template
    }

    /// Replace this template's contents with the region at `corner`. Does nothing if any side of
    /// `size` is below 1.
    pub fn fill_from_world<L: Level + ?Sized>(
        &mut self,
        level: &L,
        corner: Position,
        size: Position,
        with_entities: bool,
        denylist: &[&str],
    ) {
        if size.x < 1 || size.y < 1 || size.z < 1 {
            log::debug!("Not capturing degenerate region of size {}", size);
            return;
        }
        let _span = info_span!("capture", %corner, %size).entered();

        let far = corner + size - Position::new(1, 1, 1);
        let region = BoundingBox::from_corners(corner, far);
        self.size = size;

        let mut buckets = BlockBuckets::default();
        for pos in Position::between_closed(region.min, region.max) {
            let state = level.block_state(pos);
            if denylist.iter().any(|d| state.is(d)) {
                continue;
            }
            let nbt = level.block_entity(pos).cloned();
            buckets.push(BlockInfo::new(pos - region.min, state, nbt));
        }
        self.palettes = vec![Palette::new(buckets.into_ordered())];

        self.entities.clear();
        if with_entities {
            self.fill_entity_list(level, &region);
        }
        log::debug!(
            "Captured {} blocks and {} entities",
            self.palettes[0].len(),
            self.entities.len()
        );
    }

    fn fill_entity_list<L: Level + ?Sized>(&mut self, level: &L, region: &BoundingBox) {
        let start = region.min;
        let corner = Vec3d::at_lower_corner_of(start);
        for entity in level.entities_in(&Aabb::of_blocks(region)) {
            if entity.is_player() {
                continue;
            }
            let pos = entity.pos - corner;
            let block_pos = match entity.hanging_anchor() {
                Some(anchor) => anchor - start,
                None => pos.block_pos(),
            };
            let mut nbt = entity.save();
            nbt.inner_mut().remove("UUID");
            self.entities.push(EntityInfo::new(pos, block_pos, nbt));
        }
    }
}
