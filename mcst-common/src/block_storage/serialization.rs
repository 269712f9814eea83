use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use super::{BlockState, BlockStorage};
use crate::entity::Entity;

impl Serialize for BlockState {
    fn serialize<S>(&self, s: S) -> Result<<S as Serializer>::Ok, <S as Serializer>::Error>
    where
        S: Serializer,
    {
        let map_size = if self.properties.is_empty() { 0 } else { 1 };
        let mut map = s.serialize_map(Some(1 + map_size))?;
        map.serialize_entry("name", &self.name)?;
        if !self.properties.is_empty() {
            map.serialize_entry("properties", &self.properties)?;
        }

        map.end()
    }
}

impl Serialize for BlockStorage {
    fn serialize<S>(&self, s: S) -> Result<<S as Serializer>::Ok, <S as Serializer>::Error>
    where
        S: Serializer,
    {
        let mut map = s.serialize_map(Some(4))?;

        map.serialize_entry("extents", &ArrayAsExtentsMapWrapper(&self.extents))?;
        map.serialize_entry("palette", &self.palette)?;
        map.serialize_entry("blocks", &BlockIndexSynth(&self.blocks))?;
        map.serialize_entry("entities", &EntitySummarySynth(&self.entities))?;

        map.end()
    }
}

/// Dump a 3-entry u32 slice as x/y/z map
struct ArrayAsExtentsMapWrapper<'a>(&'a [u32; 3]);

impl<'a> Serialize for ArrayAsExtentsMapWrapper<'a> {
    fn serialize<S>(&self, s: S) -> Result<<S as Serializer>::Ok, <S as Serializer>::Error>
    where
        S: Serializer,
    {
        let mut map = s.serialize_map(Some(3))?;
        map.serialize_entry("x", &self.0[0])?;
        map.serialize_entry("y", &self.0[1])?;
        map.serialize_entry("z", &self.0[2])?;
        map.end()
    }
}

/// Dump list of palette indicies as individual objects
struct BlockIndexSynth<'a>(&'a [u32]);

impl<'a> Serialize for BlockIndexSynth<'a> {
    fn serialize<S>(&self, s: S) -> Result<<S as Serializer>::Ok, <S as Serializer>::Error>
    where
        S: Serializer,
    {
        let mut seq = s.serialize_seq(Some(self.0.len()))?;

        for item in self.0 {
            seq.serialize_element(&BlockIndexEntrySynth(item))?;
        }

        seq.end()
    }
}

struct BlockIndexEntrySynth<'a>(&'a u32);

impl<'a> Serialize for BlockIndexEntrySynth<'a> {
    fn serialize<S>(&self, s: S) -> Result<<S as Serializer>::Ok, <S as Serializer>::Error>
    where
        S: Serializer,
    {
        let mut map = s.serialize_map(Some(1))?;
        map.serialize_entry("pi", self.0)?;
        map.end()
    }
}

/// Entities only get their id, position and yaw in the dump, payloads stay out of the JSON
struct EntitySummarySynth<'a>(&'a [Entity]);

impl<'a> Serialize for EntitySummarySynth<'a> {
    fn serialize<S>(&self, s: S) -> Result<<S as Serializer>::Ok, <S as Serializer>::Error>
    where
        S: Serializer,
    {
        let mut seq = s.serialize_seq(Some(self.0.len()))?;
        for e in self.0 {
            seq.serialize_element(&EntitySummaryEntrySynth(e))?;
        }
        seq.end()
    }
}

struct EntitySummaryEntrySynth<'a>(&'a Entity);

impl<'a> Serialize for EntitySummaryEntrySynth<'a> {
    fn serialize<S>(&self, s: S) -> Result<<S as Serializer>::Ok, <S as Serializer>::Error>
    where
        S: Serializer,
    {
        let mut map = s.serialize_map(Some(4))?;
        map.serialize_entry("id", &self.0.id)?;
        map.serialize_entry("pos", &[self.0.pos.x, self.0.pos.y, self.0.pos.z])?;
        map.serialize_entry("yaw", &self.0.yaw)?;
        map.serialize_entry("passengers", &self.0.passengers.len())?;
        map.end()
    }
}
