//! Jigsaw blocks, the connectors a pool-based assembler uses to join templates together.

use crate::info::BlockInfo;
use mcst_common::block_storage::Direction;
use mcst_common::{NbtExt, NbtFieldError};
use quartz_nbt::NbtCompound;

pub const JIGSAW: &str = "minecraft:jigsaw";

/// How a piece attached to this connector may be turned
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JointType {
    /// Free to spin about the connection axis
    Rollable,
    /// Keeps its top pointing the same way as ours
    Aligned,
}

impl JointType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "rollable" => Some(Self::Rollable),
            "aligned" => Some(Self::Aligned),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Rollable => "rollable",
            Self::Aligned => "aligned",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct JigsawInfo {
    pub info: BlockInfo,
    pub joint: JointType,
    /// Name this connector is matched by
    pub name: String,
    pub pool: String,
    /// Name of the connector to attach to
    pub target: String,
    /// State the jigsaw turns into once assembly is done
    pub final_state: String,
    pub placement_priority: i32,
    pub selection_priority: i32,
}

impl JigsawInfo {
    pub fn from_block_info(info: BlockInfo) -> Result<Self, NbtFieldError> {
        let empty = NbtCompound::new();
        let nbt = info.nbt.as_ref().unwrap_or(&empty);

        let joint = match nbt.get_string("joint") {
            Ok(name) => JointType::from_name(name),
            Err(NbtFieldError::Missing(_)) => None,
            Err(e) => return Err(e),
        }
        .unwrap_or_else(|| {
            if front_facing(&info).is_horizontal() {
                JointType::Aligned
            } else {
                JointType::Rollable
            }
        });

        let name = nbt.get_string_with_default("name", "minecraft:empty")?.to_owned();
        let pool = nbt.get_string_with_default("pool", "minecraft:empty")?.to_owned();
        let target = nbt.get_string_with_default("target", "minecraft:empty")?.to_owned();
        let final_state = nbt
            .get_string_with_default("final_state", "minecraft:air")?
            .to_owned();
        let placement_priority = nbt.get_int_with_default("placement_priority", 0)?;
        let selection_priority = nbt.get_int_with_default("selection_priority", 0)?;

        Ok(Self {
            info,
            joint,
            name,
            pool,
            target,
            final_state,
            placement_priority,
            selection_priority,
        })
    }

    pub fn front(&self) -> Direction {
        front_facing(&self.info)
    }
}

/// First half of the `orientation` property, e.g. `north` for `north_up`
fn front_facing(info: &BlockInfo) -> Direction {
    info.state
        .property("orientation")
        .and_then(|o| o.split('_').next())
        .and_then(Direction::from_name)
        .unwrap_or(Direction::North)
}
