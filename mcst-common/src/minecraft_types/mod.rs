//! On-disk layout of structure files, as written by structure blocks.

use quartz_nbt::NbtCompound;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaletteBlock {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<NbtCompound>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructureBlock {
    /// Index into the palette
    pub state: i32,
    pub pos: [i32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbt: Option<NbtCompound>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructureEntity {
    pub pos: [f64; 3],
    #[serde(rename = "blockPos")]
    pub block_pos: [i32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbt: Option<NbtCompound>,
}

/// A structure file. Exactly one of `palette` and `palettes` is present in files we write;
/// `palettes` is used when the structure has randomized variants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    #[serde(rename = "DataVersion")]
    pub data_version: i32,
    pub size: [i32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<Vec<PaletteBlock>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palettes: Option<Vec<Vec<PaletteBlock>>>,
    #[serde(default)]
    pub blocks: Vec<StructureBlock>,
    #[serde(default)]
    pub entities: Vec<StructureEntity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}
