//! Quarter-turn rotations about the Y axis and the two horizontal mirrors.

use super::Direction;
use std::fmt::Display;
use std::str::FromStr;

use anyhow::{anyhow, Error};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
    #[default]
    None,
    Clockwise90,
    Clockwise180,
    CounterClockwise90,
}

pub const ALL_ROTATIONS: [Rotation; 4] = [
    Rotation::None,
    Rotation::Clockwise90,
    Rotation::Clockwise180,
    Rotation::CounterClockwise90,
];

impl Rotation {
    /// Number of clockwise quarter turns
    #[inline]
    pub fn quarter_turns(self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise90 => 1,
            Rotation::Clockwise180 => 2,
            Rotation::CounterClockwise90 => 3,
        }
    }

    #[inline]
    pub fn from_quarter_turns(turns: u32) -> Self {
        ALL_ROTATIONS[(turns % 4) as usize]
    }

    /// Rotation which, applied after `self`, gets back to where we started.
    #[inline]
    pub fn inverse(self) -> Self {
        Self::from_quarter_turns(4 - self.quarter_turns())
    }

    /// Compose two rotations
    #[inline]
    pub fn then(self, other: Self) -> Self {
        Self::from_quarter_turns(self.quarter_turns() + other.quarter_turns())
    }

    /// Whether X and Z extents swap under this rotation
    #[inline]
    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Clockwise90 | Rotation::CounterClockwise90)
    }

    pub fn rotate_direction(self, d: Direction) -> Direction {
        if !d.is_horizontal() {
            return d;
        }
        match self {
            Rotation::None => d,
            Rotation::Clockwise90 => d.clockwise(),
            Rotation::Clockwise180 => d.opposite(),
            Rotation::CounterClockwise90 => d.counter_clockwise(),
        }
    }

    /// Rotate a value in `0..full_turn` (e.g. the 16 sign rotations)
    pub fn rotate_index(self, index: i32, full_turn: i32) -> i32 {
        match self {
            Rotation::None => index,
            Rotation::Clockwise90 => (index + full_turn / 4).rem_euclid(full_turn),
            Rotation::Clockwise180 => (index + full_turn / 2).rem_euclid(full_turn),
            Rotation::CounterClockwise90 => (index + full_turn * 3 / 4).rem_euclid(full_turn),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Rotation::None => "none",
            Rotation::Clockwise90 => "clockwise_90",
            Rotation::Clockwise180 => "180",
            Rotation::CounterClockwise90 => "counterclockwise_90",
        }
    }
}

impl Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Rotation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" | "0" => Ok(Rotation::None),
            "clockwise_90" | "90" => Ok(Rotation::Clockwise90),
            "180" | "clockwise_180" => Ok(Rotation::Clockwise180),
            "counterclockwise_90" | "270" => Ok(Rotation::CounterClockwise90),
            _ => Err(anyhow!("Unknown rotation {:?}", s)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mirror {
    #[default]
    None,
    /// Flips the Z axis
    LeftRight,
    /// Flips the X axis
    FrontBack,
}

pub const ALL_MIRRORS: [Mirror; 3] = [Mirror::None, Mirror::LeftRight, Mirror::FrontBack];

impl Mirror {
    pub fn mirror_direction(self, d: Direction) -> Direction {
        match (self, d) {
            (Mirror::LeftRight, Direction::North | Direction::South) => d.opposite(),
            (Mirror::FrontBack, Direction::East | Direction::West) => d.opposite(),
            _ => d,
        }
    }

    /// Mirror a value in `0..full_turn`, where 0 faces south and values increase clockwise.
    pub fn mirror_index(self, index: i32, full_turn: i32) -> i32 {
        let half = full_turn / 2;
        let signed = if index > half { index - full_turn } else { index };
        match self {
            Mirror::None => index,
            Mirror::FrontBack => (full_turn - signed).rem_euclid(full_turn),
            Mirror::LeftRight => (half - signed + full_turn).rem_euclid(full_turn),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Mirror::None => "none",
            Mirror::LeftRight => "left_right",
            Mirror::FrontBack => "front_back",
        }
    }
}

impl Display for Mirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mirror {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Mirror::None),
            "left_right" => Ok(Mirror::LeftRight),
            "front_back" => Ok(Mirror::FrontBack),
            _ => Err(anyhow!("Unknown mirror {:?}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_storage::PLANAR_DIRECTIONS;

    #[test]
    fn rotations_compose_to_identity() {
        for r in ALL_ROTATIONS {
            assert_eq!(r.then(r.inverse()), Rotation::None);
            for d in PLANAR_DIRECTIONS {
                assert_eq!(r.inverse().rotate_direction(r.rotate_direction(d)), d);
            }
        }
    }

    #[test]
    fn sign_rotation_mirrors() {
        // 4 faces west, mirroring front/back should face east
        assert_eq!(Mirror::FrontBack.mirror_index(4, 16), 12);
        // 0 faces south, mirroring left/right should face north
        assert_eq!(Mirror::LeftRight.mirror_index(0, 16), 8);
        assert_eq!(Mirror::LeftRight.mirror_index(4, 16), 4);
        assert_eq!(Rotation::Clockwise90.rotate_index(14, 16), 2);
    }
}
