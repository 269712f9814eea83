//! Minimal entity model: enough of an entity to capture it, move it and put it back.

use crate::block_storage::{BoundingBox, Direction, Mirror, Position, Rotation};
use crate::math::wrap_degrees;
use crate::NbtExt;
use anyhow::{anyhow, Context, Result};
use quartz_nbt::{NbtCompound, NbtList, NbtTag};
use std::fmt::Display;
use std::ops::{Add, Sub};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3d {
    pub const ZERO: Vec3d = Vec3d {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Lower corner of a block
    pub fn at_lower_corner_of(p: Position) -> Self {
        Self::new(p.x as f64, p.y as f64, p.z as f64)
    }

    /// The block this point lies in
    pub fn block_pos(&self) -> Position {
        Position::new(
            self.x.floor() as i32,
            self.y.floor() as i32,
            self.z.floor() as i32,
        )
    }
}

impl Add for Vec3d {
    type Output = Vec3d;

    fn add(self, rhs: Self) -> Self::Output {
        Vec3d::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3d {
    type Output = Vec3d;

    fn sub(self, rhs: Self) -> Self::Output {
        Vec3d::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Display for Vec3d {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

/// Floating point box, `min` inclusive and `max` exclusive
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3d,
    pub max: Vec3d,
}

impl Aabb {
    pub fn new(min: Vec3d, max: Vec3d) -> Self {
        Self { min, max }
    }

    /// Covers every block of an inclusive block box
    pub fn of_blocks(bb: &BoundingBox) -> Self {
        Self {
            min: Vec3d::at_lower_corner_of(bb.min),
            max: Vec3d::at_lower_corner_of(bb.max + Position::new(1, 1, 1)),
        }
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }
}

const HANGING_ENTITIES: &[&str] = &[
    "minecraft:painting",
    "minecraft:item_frame",
    "minecraft:glow_item_frame",
    "minecraft:leash_knot",
];

const NON_MOB_ENTITIES: &[&str] = &[
    "minecraft:item",
    "minecraft:experience_orb",
    "minecraft:arrow",
    "minecraft:spectral_arrow",
    "minecraft:trident",
    "minecraft:boat",
    "minecraft:armor_stand",
    "minecraft:falling_block",
    "minecraft:tnt",
    "minecraft:end_crystal",
    "minecraft:area_effect_cloud",
    "minecraft:marker",
    "minecraft:player",
];

#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub id: String,
    pub pos: Vec3d,
    pub yaw: f32,
    pub pitch: f32,
    pub passengers: Vec<Entity>,
    /// Everything else from the payload, carried along untouched
    pub tag: NbtCompound,
}

fn read_doubles(tag: &NbtCompound, name: &str, n: usize) -> Result<Option<Vec<f64>>> {
    let list = match tag.inner().get(name) {
        None => return Ok(None),
        Some(NbtTag::List(l)) => l,
        Some(other) => return Err(anyhow!("{} is not a list: {:?}", name, other)),
    };
    let values = list
        .iter()
        .map(|t| match t {
            NbtTag::Double(v) => Ok(*v),
            NbtTag::Float(v) => Ok(*v as f64),
            other => Err(anyhow!("{} holds a non-float entry {:?}", name, other)),
        })
        .collect::<Result<Vec<_>>>()?;
    if values.len() != n {
        return Err(anyhow!("{} has {} entries, expected {}", name, values.len(), n));
    }
    Ok(Some(values))
}

impl Entity {
    pub fn new(id: impl Into<String>, pos: Vec3d) -> Self {
        Self {
            id: id.into(),
            pos,
            yaw: 0.0,
            pitch: 0.0,
            passengers: Vec::new(),
            tag: NbtCompound::new(),
        }
    }

    /// Rebuild an entity from its saved payload. Fails on a missing `id` or malformed position,
    /// rotation or passenger data.
    pub fn from_nbt(tag: &NbtCompound) -> Result<Self> {
        let id = tag.get_string("id").context("Reading entity id")?.to_owned();
        if id.is_empty() {
            return Err(anyhow!("Entity id is empty"));
        }

        let pos = read_doubles(tag, "Pos", 3)
            .with_context(|| anyhow!("Reading position of {}", id))?
            .map(|v| Vec3d::new(v[0], v[1], v[2]))
            .unwrap_or_default();
        let (yaw, pitch) = read_doubles(tag, "Rotation", 2)
            .with_context(|| anyhow!("Reading rotation of {}", id))?
            .map(|v| (v[0] as f32, v[1] as f32))
            .unwrap_or((0.0, 0.0));

        let passengers = match tag.inner().get("Passengers") {
            None => Vec::new(),
            Some(NbtTag::List(l)) => l
                .iter()
                .map(|t| match t {
                    NbtTag::Compound(c) => Entity::from_nbt(c),
                    other => Err(anyhow!("Passenger entry is not a compound: {:?}", other)),
                })
                .collect::<Result<Vec<_>>>()
                .with_context(|| anyhow!("Reading passengers of {}", id))?,
            Some(other) => return Err(anyhow!("Passengers is not a list: {:?}", other)),
        };

        let mut rest = tag.clone();
        for key in ["id", "Pos", "Rotation", "Passengers"] {
            rest.inner_mut().remove(key);
        }

        Ok(Self {
            id,
            pos,
            yaw,
            pitch,
            passengers,
            tag: rest,
        })
    }

    pub fn save(&self) -> NbtCompound {
        let mut tag = self.tag.clone();
        tag.insert("id", self.id.as_str());
        tag.insert(
            "Pos",
            NbtList::from(vec![
                NbtTag::Double(self.pos.x),
                NbtTag::Double(self.pos.y),
                NbtTag::Double(self.pos.z),
            ]),
        );
        tag.insert(
            "Rotation",
            NbtList::from(vec![NbtTag::Float(self.yaw), NbtTag::Float(self.pitch)]),
        );
        if !self.passengers.is_empty() {
            tag.insert(
                "Passengers",
                NbtList::from(
                    self.passengers
                        .iter()
                        .map(|p| NbtTag::Compound(p.save()))
                        .collect::<Vec<_>>(),
                ),
            );
        }
        tag
    }

    pub fn is_player(&self) -> bool {
        self.id == "minecraft:player"
    }

    /// Paintings, item frames and leash knots, which hang off a block
    pub fn is_hanging(&self) -> bool {
        HANGING_ENTITIES.contains(&self.id.as_str())
    }

    pub fn is_mob(&self) -> bool {
        !self.is_hanging()
            && !NON_MOB_ENTITIES.contains(&self.id.as_str())
            && !self.id.contains("minecart")
            && !self.id.ends_with("_arrow")
            && !self.id.ends_with("fireball")
    }

    /// The block a hanging entity is attached to
    pub fn hanging_anchor(&self) -> Option<Position> {
        if !self.is_hanging() {
            return None;
        }
        let x = self.tag.get_int("TileX").ok()?;
        let y = self.tag.get_int("TileY").ok()?;
        let z = self.tag.get_int("TileZ").ok()?;
        Some(Position::new(x, y, z))
    }

    /// Width and height of the entity's collision box
    pub fn dimensions(&self) -> (f64, f64) {
        match self.id.as_str() {
            "minecraft:item" | "minecraft:experience_orb" => (0.25, 0.25),
            "minecraft:painting" | "minecraft:item_frame" | "minecraft:glow_item_frame" => {
                (0.5, 0.5)
            }
            "minecraft:leash_knot" => (0.375, 0.5),
            "minecraft:armor_stand" => (0.5, 1.975),
            "minecraft:boat" => (1.375, 0.5625),
            "minecraft:chicken" => (0.4, 0.7),
            "minecraft:cat" | "minecraft:ocelot" => (0.6, 0.7),
            "minecraft:cow" | "minecraft:mooshroom" => (0.9, 1.4),
            "minecraft:pig" | "minecraft:sheep" => (0.9, 0.9),
            "minecraft:iron_golem" => (1.4, 2.7),
            id if id.contains("minecart") => (0.98, 0.7),
            _ => (0.6, 1.8),
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        let (w, h) = self.dimensions();
        let hw = w / 2.0;
        Aabb::new(
            Vec3d::new(self.pos.x - hw, self.pos.y, self.pos.z - hw),
            Vec3d::new(self.pos.x + hw, self.pos.y + h, self.pos.z + hw),
        )
    }

    fn facing(&self) -> Option<Direction> {
        let v = self.tag.get_int("Facing").ok()? as i8;
        match self.id.as_str() {
            "minecraft:painting" => Direction::from_data_2d(v),
            "minecraft:item_frame" | "minecraft:glow_item_frame" => Direction::from_data_3d(v),
            _ => None,
        }
    }

    fn set_facing(&mut self, d: Direction) {
        let v = if self.id == "minecraft:painting" {
            d.data_2d()
        } else {
            Some(d.data_3d())
        };
        if let Some(v) = v {
            self.tag.insert("Facing", v);
        }
    }

    /// Yaw after applying `rotation`. Hanging entities also turn the wall they face.
    pub fn rotate(&mut self, rotation: Rotation) -> f32 {
        if let Some(facing) = self.facing() {
            self.set_facing(rotation.rotate_direction(facing));
        }
        let f = wrap_degrees(self.yaw);
        match rotation {
            Rotation::None => f,
            Rotation::Clockwise90 => f + 90.0,
            Rotation::Clockwise180 => f + 180.0,
            Rotation::CounterClockwise90 => f + 270.0,
        }
    }

    /// Yaw after applying `mirror`. Hanging entities mirror by rotating the wall they face.
    pub fn mirror(&mut self, mirror: Mirror) -> f32 {
        if let Some(facing) = self.facing() {
            let rotation = if mirror.mirror_direction(facing) == facing {
                Rotation::None
            } else {
                Rotation::Clockwise180
            };
            return self.rotate(rotation);
        }
        let f = wrap_degrees(self.yaw);
        match mirror {
            Mirror::None => f,
            Mirror::FrontBack => -f,
            Mirror::LeftRight => 180.0 - f,
        }
    }

    pub fn move_to(&mut self, pos: Vec3d, yaw: f32, pitch: f32) {
        self.pos = pos;
        self.yaw = yaw;
        self.pitch = pitch;
        if self.is_hanging() {
            let anchor = pos.block_pos();
            self.tag.insert("TileX", anchor.x);
            self.tag.insert("TileY", anchor.y);
            self.tag.insert("TileZ", anchor.z);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn zombie_tag() -> NbtCompound {
        let mut tag = NbtCompound::new();
        tag.insert("id", "minecraft:zombie");
        tag.insert(
            "Pos",
            NbtList::from(vec![
                NbtTag::Double(1.5),
                NbtTag::Double(64.0),
                NbtTag::Double(-2.25),
            ]),
        );
        tag.insert(
            "Rotation",
            NbtList::from(vec![NbtTag::Float(45.0), NbtTag::Float(10.0)]),
        );
        tag.insert("Health", 20.0f32);
        tag
    }

    #[test]
    fn loads_and_saves_payload() -> Result<()> {
        let mut tag = zombie_tag();
        let mut rider = NbtCompound::new();
        rider.insert("id", "minecraft:chicken");
        tag.insert("Passengers", NbtList::from(vec![NbtTag::Compound(rider)]));

        let e = Entity::from_nbt(&tag)?;
        assert_eq!(e.id, "minecraft:zombie");
        assert_relative_eq!(e.pos.z, -2.25);
        assert_relative_eq!(e.yaw, 45.0);
        assert_eq!(e.passengers.len(), 1);
        assert!(e.tag.inner().get("Pos").is_none());
        assert!(e.is_mob());
        assert!(!e.passengers[0].is_hanging());

        let back = Entity::from_nbt(&e.save())?;
        assert_eq!(back, e);
        Ok(())
    }

    #[test]
    fn rejects_bad_payloads() {
        let mut tag = zombie_tag();
        tag.inner_mut().remove("id");
        assert!(Entity::from_nbt(&tag).is_err());

        let mut tag = zombie_tag();
        tag.insert("Pos", NbtList::from(vec![NbtTag::Double(1.0)]));
        assert!(Entity::from_nbt(&tag).is_err());
    }

    #[test]
    fn yaw_follows_rotation_and_mirror() {
        let mut e = Entity::new("minecraft:zombie", Vec3d::ZERO);
        e.yaw = 30.0;
        assert_relative_eq!(e.rotate(Rotation::Clockwise90), 120.0);
        assert_relative_eq!(e.mirror(Mirror::FrontBack), -30.0);
        assert_relative_eq!(e.mirror(Mirror::LeftRight), 150.0);
    }

    #[test]
    fn item_frames_turn_with_the_structure() {
        let mut frame = Entity::new("minecraft:item_frame", Vec3d::new(0.5, 0.5, 0.03));
        frame.tag.insert("Facing", Direction::South.data_3d());
        frame.rotate(Rotation::Clockwise90);
        assert_eq!(frame.facing(), Some(Direction::West));
        frame.mirror(Mirror::FrontBack);
        assert_eq!(frame.facing(), Some(Direction::East));

        frame.move_to(Vec3d::new(3.5, 1.5, 7.97), 0.0, 0.0);
        assert_eq!(frame.hanging_anchor(), Some(Position::new(3, 1, 7)));
    }

    #[test]
    fn boxes_intersect() {
        let e = Entity::new("minecraft:zombie", Vec3d::new(0.5, 0.0, 0.5));
        let region = Aabb::of_blocks(&BoundingBox::from_corners(
            Position::new(0, 0, 0),
            Position::new(0, 0, 0),
        ));
        assert!(e.bounding_box().intersects(&region));
        let far = Entity::new("minecraft:zombie", Vec3d::new(5.5, 0.0, 0.5));
        assert!(!far.bounding_box().intersects(&region));
    }
}
