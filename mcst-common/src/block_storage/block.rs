use super::{Direction, Mirror, Rotation, PLANAR_DIRECTIONS};
use anyhow::{anyhow, Error};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

/// A block and its property values. Equality is by value, so two states read from different files
/// compare equal when they name the same block with the same properties.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockState {
    pub name: String,
    pub properties: BTreeMap<String, String>,
}

impl Default for BlockState {
    fn default() -> Self {
        Self::air()
    }
}

/// Name suffixes of blocks that never occupy the whole cell even without a waterlogged property.
const PARTIAL_BLOCK_SUFFIXES: &[&str] = &[
    "_slab",
    "_stairs",
    "_fence",
    "_fence_gate",
    "_wall",
    "_pane",
    "_door",
    "_trapdoor",
    "torch",
    "_sign",
    "_button",
    "_pressure_plate",
    "_carpet",
    "rail",
    "_sapling",
    "_banner",
    "_head",
    "_skull",
    "_bed",
    "candle",
    "chest",
    "_bars",
    "_coral",
    "_coral_fan",
    "_tulip",
];

/// Exact names of other partial blocks
const PARTIAL_BLOCKS: &[&str] = &[
    "ladder",
    "lantern",
    "soul_lantern",
    "chain",
    "redstone_wire",
    "repeater",
    "comparator",
    "lever",
    "vine",
    "grass",
    "tall_grass",
    "fern",
    "large_fern",
    "dandelion",
    "poppy",
    "sugar_cane",
    "kelp",
    "seagrass",
    "snow",
    "cake",
    "bamboo",
    "scaffolding",
    "piston_head",
    "moving_piston",
    "hopper",
    "anvil",
    "cauldron",
    "brewing_stand",
    "enchanting_table",
    "lectern",
    "bell",
    "farmland",
    "dirt_path",
    "soul_sand",
    "end_rod",
    "cobweb",
    "flower_pot",
    "water",
    "lava",
    "fire",
    "structure_void",
    "light",
];

impl BlockState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn air() -> Self {
        Self::new("minecraft:air")
    }

    /// Placeholder written over a block entity position before the real state goes in
    pub fn barrier() -> Self {
        Self::new("minecraft:barrier")
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Block type identity check
    #[inline]
    pub fn is(&self, block: &str) -> bool {
        self.name == block
    }

    pub fn is_air(&self) -> bool {
        matches!(
            self.name.as_str(),
            "minecraft:air" | "minecraft:cave_air" | "minecraft:void_air"
        )
    }

    pub fn is_structure_void(&self) -> bool {
        self.is("minecraft:structure_void")
    }

    pub fn has_block_entity(&self) -> bool {
        let n = self.name.as_str();
        matches!(
            n,
            "minecraft:chest"
                | "minecraft:trapped_chest"
                | "minecraft:ender_chest"
                | "minecraft:barrel"
                | "minecraft:furnace"
                | "minecraft:blast_furnace"
                | "minecraft:smoker"
                | "minecraft:dispenser"
                | "minecraft:dropper"
                | "minecraft:hopper"
                | "minecraft:jigsaw"
                | "minecraft:structure_block"
                | "minecraft:spawner"
                | "minecraft:beacon"
                | "minecraft:brewing_stand"
                | "minecraft:lectern"
                | "minecraft:bell"
                | "minecraft:beehive"
                | "minecraft:bee_nest"
                | "minecraft:command_block"
        ) || n.ends_with("shulker_box")
            || n.ends_with("_sign")
            || n.ends_with("_banner")
            || n.ends_with("_head")
            || n.ends_with("_skull")
            || n.ends_with("_bed")
    }

    /// Block entities whose loot gets rolled from a `LootTable` + `LootTableSeed` pair
    pub fn is_container(&self) -> bool {
        matches!(
            self.name.as_str(),
            "minecraft:chest"
                | "minecraft:trapped_chest"
                | "minecraft:barrel"
                | "minecraft:dispenser"
                | "minecraft:dropper"
                | "minecraft:hopper"
        ) || self.name.ends_with("shulker_box")
    }

    /// Blocks whose collision shape changes on its own (moving pistons, scaffolding...)
    pub fn has_dynamic_shape(&self) -> bool {
        matches!(
            self.name.as_str(),
            "minecraft:moving_piston" | "minecraft:scaffolding" | "minecraft:bamboo"
        ) || self.name.ends_with("shulker_box")
    }

    /// Whether the collision shape fills the whole cell
    pub fn is_full_cube(&self) -> bool {
        if self.is_air() || self.properties.contains_key("waterlogged") {
            return false;
        }
        let path = self.name.split_once(':').map(|(_, p)| p).unwrap_or(&self.name);
        !(PARTIAL_BLOCKS.contains(&path)
            || path.starts_with("potted_")
            || PARTIAL_BLOCK_SUFFIXES.iter().any(|m| path.ends_with(m)))
    }

    /// Blocks that can hold a water source alongside themselves
    pub fn is_fluid_container(&self) -> bool {
        self.properties.contains_key("waterlogged")
    }

    pub fn fluid_state(&self) -> FluidState {
        let fluid = match self.name.as_str() {
            "minecraft:water" => Some(Fluid::Water),
            "minecraft:lava" => Some(Fluid::Lava),
            _ => None,
        };
        if let Some(fluid) = fluid {
            let level = self
                .property("level")
                .and_then(|l| l.parse::<u8>().ok())
                .unwrap_or(0);
            return if level == 0 {
                FluidState::Source(fluid)
            } else {
                FluidState::Flowing(fluid, level)
            };
        }
        if self.property("waterlogged") == Some("true") {
            return FluidState::Source(Fluid::Water);
        }
        FluidState::Empty
    }

    /// The state this block turns into after taking in `fluid`, if it accepts it. Only a dry
    /// fluid container accepts, and only a water source.
    pub fn place_liquid(&self, fluid: FluidState) -> Option<BlockState> {
        if self.property("waterlogged") == Some("false") && fluid == FluidState::Source(Fluid::Water)
        {
            Some(self.clone().with_property("waterlogged", "true"))
        } else {
            None
        }
    }

    fn is_fence(&self) -> bool {
        self.name.ends_with("_fence")
    }

    fn is_fence_gate(&self) -> bool {
        self.name.ends_with("_fence_gate")
    }

    fn is_pane(&self) -> bool {
        self.name.ends_with("glass_pane") || self.is("minecraft:iron_bars")
    }

    fn is_wall(&self) -> bool {
        self.name.ends_with("_wall")
    }

    fn has_side_properties(&self) -> bool {
        PLANAR_DIRECTIONS
            .iter()
            .all(|d| self.properties.contains_key(d.name()))
    }

    /// Remap the north/east/south/west properties through `f`
    fn remap_sides(mut self, f: impl Fn(Direction) -> Direction) -> Self {
        if !self.has_side_properties() {
            return self;
        }
        let old: Vec<_> = PLANAR_DIRECTIONS
            .iter()
            .map(|d| (*d, self.properties[d.name()].clone()))
            .collect();
        for (d, v) in old {
            self.properties.insert(f(d).name().to_owned(), v);
        }
        self
    }

    /// Remap a jigsaw `orientation` value like `north_up`
    fn remap_orientation(mut self, f: impl Fn(Direction) -> Direction) -> Self {
        let remapped = self.property("orientation").and_then(|o| {
            let (front, top) = o.split_once('_')?;
            let front = f(Direction::from_name(front)?);
            let top = f(Direction::from_name(top)?);
            Some(format!("{}_{}", front.name(), top.name()))
        });
        if let Some(o) = remapped {
            self.properties.insert("orientation".into(), o);
        }
        self
    }

    pub fn rotate(self, rotation: Rotation) -> Self {
        if rotation == Rotation::None {
            return self;
        }
        let mut state = self
            .remap_sides(|d| rotation.rotate_direction(d))
            .remap_orientation(|d| rotation.rotate_direction(d));

        if let Some(facing) = state.property("facing").and_then(Direction::from_name) {
            let facing = rotation.rotate_direction(facing);
            state.properties.insert("facing".into(), facing.name().into());
        }
        if rotation.swaps_axes() {
            let swapped = match state.property("axis") {
                Some("x") => Some("z"),
                Some("z") => Some("x"),
                _ => None,
            };
            if let Some(axis) = swapped {
                state.properties.insert("axis".into(), axis.into());
            }
        }
        if let Some(r) = state.property("rotation").and_then(|r| r.parse::<i32>().ok()) {
            let r = rotation.rotate_index(r, 16);
            state.properties.insert("rotation".into(), r.to_string());
        }
        state
    }

    pub fn mirror(self, mirror: Mirror) -> Self {
        if mirror == Mirror::None {
            return self;
        }
        let mut state = self
            .remap_sides(|d| mirror.mirror_direction(d))
            .remap_orientation(|d| mirror.mirror_direction(d));

        let mut facing_flipped = false;
        if let Some(facing) = state.property("facing").and_then(Direction::from_name) {
            let mirrored = mirror.mirror_direction(facing);
            facing_flipped = mirrored != facing;
            state.properties.insert("facing".into(), mirrored.name().into());
        }
        if let Some(r) = state.property("rotation").and_then(|r| r.parse::<i32>().ok()) {
            let r = mirror.mirror_index(r, 16);
            state.properties.insert("rotation".into(), r.to_string());
        }
        if facing_flipped && state.name.ends_with("_stairs") {
            // Handedness only flips when the stairs face along the mirrored axis
            let swapped = match state.property("shape") {
                Some("inner_left") => Some("inner_right"),
                Some("inner_right") => Some("inner_left"),
                Some("outer_left") => Some("outer_right"),
                Some("outer_right") => Some("outer_left"),
                _ => None,
            };
            if let Some(shape) = swapped {
                state.properties.insert("shape".into(), shape.into());
            }
        }
        state
    }

    fn connects_to(&self, neighbor: &BlockState) -> bool {
        if neighbor.is_full_cube() {
            return true;
        }
        if self.is_fence() {
            neighbor.is_fence() || neighbor.is_fence_gate()
        } else if self.is_pane() {
            neighbor.is_pane() || neighbor.is_wall()
        } else if self.is_wall() {
            neighbor.is_wall() || neighbor.is_pane() || neighbor.is_fence_gate()
        } else {
            false
        }
    }

    /// Recompute the part of this state that depends on the block on its `direction` side.
    pub fn update_shape(&self, direction: Direction, neighbor: &BlockState) -> BlockState {
        if !direction.is_horizontal() || !self.properties.contains_key(direction.name()) {
            return self.clone();
        }
        let connected = self.connects_to(neighbor);
        let value = if self.is_wall() {
            if connected {
                "low"
            } else {
                "none"
            }
        } else if self.is_fence() || self.is_pane() {
            if connected {
                "true"
            } else {
                "false"
            }
        } else {
            return self.clone();
        };
        self.clone().with_property(direction.name(), value)
    }
}

impl Display for BlockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)?;
        if !self.properties.is_empty() {
            f.write_str("[")?;
            for (i, (k, v)) in self.properties.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{}={}", k, v)?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

impl FromStr for BlockState {
    type Err = Error;

    /// Parses `minecraft:oak_stairs[facing=north,half=top]`. A missing namespace defaults to
    /// `minecraft`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, props) = match s.split_once('[') {
            Some((name, rest)) => {
                let props = rest
                    .strip_suffix(']')
                    .ok_or_else(|| anyhow!("Unterminated property list in {:?}", s))?;
                (name, Some(props))
            }
            None => (s, None),
        };
        if name.is_empty() {
            return Err(anyhow!("Empty block name in {:?}", s));
        }
        let mut state = if name.contains(':') {
            BlockState::new(name)
        } else {
            BlockState::new(format!("minecraft:{}", name))
        };
        for prop in props.into_iter().flat_map(|p| p.split(',')) {
            if prop.is_empty() {
                continue;
            }
            let (k, v) = prop
                .split_once('=')
                .ok_or_else(|| anyhow!("Malformed property {:?} in {:?}", prop, s))?;
            state.properties.insert(k.trim().into(), v.trim().into());
        }
        Ok(state)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Fluid {
    Water,
    Lava,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FluidState {
    #[default]
    Empty,
    Source(Fluid),
    /// Flowing fluid, with the block `level` property it came from (1..=15)
    Flowing(Fluid, u8),
}

impl FluidState {
    #[inline]
    pub fn is_source(self) -> bool {
        matches!(self, FluidState::Source(_))
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self == FluidState::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> BlockState {
        s.parse().unwrap()
    }

    #[test]
    fn parses_and_prints_states() {
        let s = parse("oak_stairs[facing=north, half=bottom]");
        assert_eq!(s.name, "minecraft:oak_stairs");
        assert_eq!(s.property("half"), Some("bottom"));
        assert_eq!(s.to_string(), "minecraft:oak_stairs[facing=north,half=bottom]");
        assert!("minecraft:stone[facing".parse::<BlockState>().is_err());
    }

    #[test]
    fn rotation_touches_facing_axis_and_sides() {
        let stairs = parse("minecraft:oak_stairs[facing=north]");
        assert_eq!(
            stairs.rotate(Rotation::Clockwise90).property("facing"),
            Some("east")
        );

        let log = parse("minecraft:oak_log[axis=x]");
        assert_eq!(log.clone().rotate(Rotation::Clockwise90).property("axis"), Some("z"));
        assert_eq!(log.rotate(Rotation::Clockwise180).property("axis"), Some("x"));

        let fence = parse("minecraft:oak_fence[north=true,east=false,south=false,west=false]");
        let rotated = fence.rotate(Rotation::CounterClockwise90);
        assert_eq!(rotated.property("west"), Some("true"));
        assert_eq!(rotated.property("north"), Some("false"));

        let sign = parse("minecraft:oak_sign[rotation=15]");
        assert_eq!(sign.rotate(Rotation::Clockwise180).property("rotation"), Some("7"));

        let jigsaw = parse("minecraft:jigsaw[orientation=north_up]");
        assert_eq!(
            jigsaw.rotate(Rotation::Clockwise90).property("orientation"),
            Some("east_up")
        );
    }

    #[test]
    fn mirror_flips_one_axis() {
        let torch = parse("minecraft:wall_torch[facing=north]");
        assert_eq!(
            torch.clone().mirror(Mirror::LeftRight).property("facing"),
            Some("south")
        );
        assert_eq!(torch.mirror(Mirror::FrontBack).property("facing"), Some("north"));

        let stairs = parse("minecraft:oak_stairs[facing=east,shape=inner_left]");
        let mirrored = stairs.mirror(Mirror::FrontBack);
        assert_eq!(mirrored.property("facing"), Some("west"));
        assert_eq!(mirrored.property("shape"), Some("inner_right"));
    }

    #[test]
    fn stairs_keep_shape_when_facing_across_the_mirror() {
        let across = parse("minecraft:oak_stairs[facing=east,shape=outer_left]");
        let mirrored = across.mirror(Mirror::LeftRight);
        assert_eq!(mirrored.property("facing"), Some("east"));
        assert_eq!(mirrored.property("shape"), Some("outer_left"));

        let across = parse("minecraft:oak_stairs[facing=north,shape=inner_right]");
        let mirrored = across.mirror(Mirror::FrontBack);
        assert_eq!(mirrored.property("facing"), Some("north"));
        assert_eq!(mirrored.property("shape"), Some("inner_right"));

        let along = parse("minecraft:oak_stairs[facing=south,shape=outer_right]");
        let mirrored = along.mirror(Mirror::LeftRight);
        assert_eq!(mirrored.property("facing"), Some("north"));
        assert_eq!(mirrored.property("shape"), Some("outer_left"));
    }

    #[test]
    fn classification() {
        assert!(parse("minecraft:stone").is_full_cube());
        assert!(parse("minecraft:grass_block[snowy=false]").is_full_cube());
        assert!(parse("minecraft:sea_lantern").is_full_cube());
        assert!(!parse("minecraft:oak_slab[type=bottom,waterlogged=false]").is_full_cube());
        assert!(!parse("minecraft:oak_fence").is_full_cube());
        assert!(!parse("minecraft:air").is_full_cube());
        assert!(parse("minecraft:chest").has_block_entity());
        assert!(parse("minecraft:red_shulker_box").is_container());
        assert!(parse("minecraft:red_shulker_box").has_dynamic_shape());
        assert!(!parse("minecraft:jigsaw").is_container());
    }

    #[test]
    fn fluids() {
        assert_eq!(
            parse("minecraft:water[level=0]").fluid_state(),
            FluidState::Source(Fluid::Water)
        );
        assert_eq!(
            parse("minecraft:water[level=3]").fluid_state(),
            FluidState::Flowing(Fluid::Water, 3)
        );
        let slab = parse("minecraft:oak_slab[waterlogged=false]");
        assert_eq!(slab.fluid_state(), FluidState::Empty);
        assert!(slab.place_liquid(FluidState::Flowing(Fluid::Water, 2)).is_none());
        let wet = slab.place_liquid(FluidState::Source(Fluid::Water)).unwrap();
        assert!(wet.fluid_state().is_source());
        assert!(wet.place_liquid(FluidState::Source(Fluid::Water)).is_none());
    }

    #[test]
    fn fences_connect_to_solid_neighbors() {
        let fence = parse("minecraft:oak_fence[north=false,east=false,south=false,west=false]");
        let updated = fence.update_shape(Direction::East, &parse("minecraft:stone"));
        assert_eq!(updated.property("east"), Some("true"));
        let updated = updated.update_shape(Direction::East, &BlockState::air());
        assert_eq!(updated.property("east"), Some("false"));

        let wall = parse("minecraft:cobblestone_wall[north=none,east=none,south=none,west=none]");
        let updated = wall.update_shape(Direction::North, &parse("minecraft:glass_pane"));
        assert_eq!(updated.property("north"), Some("low"));

        let stone = parse("minecraft:stone");
        assert_eq!(stone.update_shape(Direction::North, &fence), stone);
    }
}
