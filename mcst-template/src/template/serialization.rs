use super::{BlockBuckets, StructureTemplate};
use crate::info::{BlockInfo, EntityInfo};
use crate::palette::{Palette, StatePalette};
use anyhow::{Context, Result};
use mcst_common::block_storage::{BlockState, Position};
use mcst_common::entity::Vec3d;
use mcst_common::minecraft_types::{
    PaletteBlock, Structure, StructureBlock, StructureEntity,
};
use mcst_common::DATA_VERSION;
use quartz_nbt::io::Flavor;
use quartz_nbt::{NbtCompound, NbtTag};
use std::io::{Read, Write};
use std::path::Path;

fn write_block_state(state: &BlockState) -> PaletteBlock {
    let properties = (!state.properties.is_empty()).then(|| {
        let mut props = NbtCompound::new();
        for (k, v) in &state.properties {
            props.insert(k.as_str(), v.as_str());
        }
        props
    });
    PaletteBlock {
        name: state.name.clone(),
        properties,
    }
}

fn read_block_state(block: &PaletteBlock) -> BlockState {
    let mut state = BlockState::new(block.name.as_str());
    if let Some(props) = &block.properties {
        for (k, v) in props.inner() {
            match v {
                NbtTag::String(s) => {
                    state.properties.insert(k.clone(), s.clone());
                }
                other => log::warn!(
                    "Ignoring non-string property {}={:?} on {}",
                    k,
                    other,
                    block.name
                ),
            }
        }
    }
    state
}

impl StructureTemplate {
    /// File form of this template. The first palette hands out state ids; alternate palettes map
    /// the same ids to their own states.
    pub fn save(&self) -> Structure {
        let mut primary = StatePalette::new();
        let mut alternates: Vec<StatePalette> = self
            .palettes
            .iter()
            .skip(1)
            .map(|_| StatePalette::new())
            .collect();

        let mut blocks = Vec::new();
        if let Some((first, rest)) = self.palettes.split_first() {
            for (j, info) in first.blocks().iter().enumerate() {
                let id = primary.id_for(&info.state);
                blocks.push(StructureBlock {
                    state: id as i32,
                    pos: info.pos.into(),
                    nbt: info.nbt.clone(),
                });
                for (alt, palette) in alternates.iter_mut().zip(rest) {
                    if let Some(alt_info) = palette.blocks().get(j) {
                        alt.add_mapping(alt_info.state.clone(), id);
                    }
                }
            }
        }

        let to_list = |p: &StatePalette| p.iter().map(write_block_state).collect::<Vec<_>>();
        let (palette, palettes) = if alternates.is_empty() {
            (Some(to_list(&primary)), None)
        } else {
            let all = std::iter::once(&primary)
                .chain(alternates.iter())
                .map(to_list)
                .collect();
            (None, Some(all))
        };

        let entities = self
            .entities
            .iter()
            .map(|e| StructureEntity {
                pos: [e.pos.x, e.pos.y, e.pos.z],
                block_pos: e.block_pos.into(),
                nbt: Some(e.nbt.clone()),
            })
            .collect();

        Structure {
            data_version: DATA_VERSION,
            size: self.size.into(),
            palette,
            palettes,
            blocks,
            entities,
            author: (!self.author.is_empty()).then(|| self.author.clone()),
        }
    }

    /// Rebuild a template from its file form. Block ids missing from a palette read as air and
    /// entities without a payload are dropped.
    pub fn load(structure: &Structure) -> Self {
        let palette_lists: Vec<&[PaletteBlock]> = match (&structure.palettes, &structure.palette) {
            (Some(lists), _) => lists.iter().map(Vec::as_slice).collect(),
            (None, Some(list)) => vec![list.as_slice()],
            (None, None) => vec![&[] as &[PaletteBlock]],
        };

        let variants: Vec<Vec<BlockInfo>> = palette_lists
            .into_iter()
            .map(|list| {
                let mut ids = StatePalette::new();
                for (i, block) in list.iter().enumerate() {
                    ids.add_mapping(read_block_state(block), i as u32);
                }
                structure
                    .blocks
                    .iter()
                    .map(|b| {
                        BlockInfo::new(Position::from(b.pos), ids.state_for(b.state), b.nbt.clone())
                    })
                    .collect()
            })
            .collect();

        let order = variants
            .first()
            .map(|first| BlockBuckets::placement_order(first))
            .unwrap_or_default();
        let palettes = variants
            .into_iter()
            .map(|blocks| {
                let mut slots: Vec<Option<BlockInfo>> = blocks.into_iter().map(Some).collect();
                Palette::new(order.iter().filter_map(|&i| slots[i].take()).collect())
            })
            .collect();

        let entities = structure
            .entities
            .iter()
            .filter_map(|e| {
                let nbt = e.nbt.clone()?;
                Some(EntityInfo::new(
                    Vec3d::new(e.pos[0], e.pos[1], e.pos[2]),
                    Position::from(e.block_pos),
                    nbt,
                ))
            })
            .collect();

        Self {
            palettes,
            entities,
            size: Position::from(structure.size),
            author: structure.author.clone().unwrap_or_default(),
        }
    }

    /// Read a gzip compressed structure file
    pub fn read_from(reader: &mut impl Read) -> Result<Self> {
        let (structure, _): (Structure, _) =
            quartz_nbt::serde::deserialize_from(reader, Flavor::GzCompressed)
                .context("Failed to parse structure")?;
        Ok(Self::load(&structure))
    }

    pub fn write_to(&self, writer: &mut impl Write) -> Result<()> {
        quartz_nbt::serde::serialize_into(writer, &self.save(), None, Flavor::GzCompressed)
            .context("Failed to write structure")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let mut file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open structure file {:?} for reading", path))?;
        Self::read_from(&mut file).with_context(|| format!("While reading {:?}", path))
    }

    pub fn to_file(&self, path: &Path) -> Result<()> {
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to open structure file {:?} for writing", path))?;
        self.write_to(&mut file)
            .with_context(|| format!("While writing {:?}", path))
    }
}
