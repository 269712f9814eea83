//! Configuration for the `place` and `capture` commands, built from the clap argument matches.

use anyhow::{anyhow, ensure, Context, Result};
use itertools::Itertools;
use mcst_common::block_storage::{Mirror, Position, Rotation};
use std::path::PathBuf;

/// Configuration variables related to input/output operations
#[derive(Clone, Debug)]
pub struct IOConfig {
    /// Structure file to read (gzip NBT)
    pub input_file: PathBuf,
    /// Structure file to write the captured result to
    pub output_file: PathBuf,
    /// Dump the resulting world as JSON on stdout
    pub json: bool,
}

/// Scratch world the structure is placed into
#[derive(Clone, Debug)]
pub struct WorldConfig {
    pub size_x: u32,
    pub size_y: u32,
    pub size_z: u32,
}

/// How the structure is stamped into the world
#[derive(Clone, Debug)]
pub struct TransformConfig {
    pub origin: Position,
    pub pivot: Position,
    pub rotation: Rotation,
    pub mirror: Mirror,
    pub seed: Option<u64>,
    pub ignore_entities: bool,
    /// Leave fluids out of waterloggable blocks
    pub dry: bool,
}

/// Region to capture back out of the world after placement
#[derive(Clone, Debug)]
pub struct CaptureConfig {
    pub corner: Position,
    /// `None` captures the whole world
    pub size: Option<Position>,
    pub denylist: Vec<String>,
    pub with_entities: bool,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub io: IOConfig,
    pub world: WorldConfig,
    pub transform: TransformConfig,
    pub capture: CaptureConfig,
}

/// Parse an `x,y,z` triple
pub fn parse_position(s: &str) -> Result<Position> {
    let parts: Vec<i32> = s
        .split(',')
        .map(|p| p.trim().parse::<i32>())
        .try_collect()
        .with_context(|| anyhow!("Bad coordinate in {:?}", s))?;
    ensure!(parts.len() == 3, "Expected x,y,z but got {:?}", s);
    Ok(Position::new(parts[0], parts[1], parts[2]))
}

impl Config {
    /// Construct a configuration from the matches of the `place` or `capture` subcommand. Only
    /// `capture` carries the region arguments; `place` captures the whole world.
    pub fn from_args(matches: &clap::ArgMatches, region: bool) -> Result<Self> {
        let extents = parse_position(matches.value_of("WORLD").unwrap()).context("Parse WORLD")?;
        ensure!(
            extents.x > 0 && extents.y > 0 && extents.z > 0,
            "World extents must be positive, got {}",
            extents
        );

        Ok(Config {
            io: IOConfig {
                input_file: PathBuf::from(matches.value_of_os("INPUT").unwrap()),
                output_file: PathBuf::from(matches.value_of_os("OUTPUT").unwrap()),
                json: matches.is_present("JSON"),
            },
            world: WorldConfig {
                size_x: extents.x as u32,
                size_y: extents.y as u32,
                size_z: extents.z as u32,
            },
            transform: TransformConfig {
                origin: parse_position(matches.value_of("ORIGIN").unwrap())
                    .context("Parse ORIGIN")?,
                pivot: parse_position(matches.value_of("PIVOT").unwrap())
                    .context("Parse PIVOT")?,
                rotation: matches
                    .value_of("ROTATION")
                    .unwrap()
                    .parse()
                    .context("Parse ROTATION")?,
                mirror: matches
                    .value_of("MIRROR")
                    .unwrap()
                    .parse()
                    .context("Parse MIRROR")?,
                seed: matches
                    .value_of("SEED")
                    .map(str::parse)
                    .transpose()
                    .context("Parse SEED")?,
                ignore_entities: matches.is_present("NO_ENTITIES"),
                dry: matches.is_present("DRY"),
            },
            capture: if region {
                CaptureConfig::from_args(matches)?
            } else {
                CaptureConfig {
                    corner: Position::ZERO,
                    size: None,
                    denylist: Vec::new(),
                    with_entities: !matches.is_present("NO_ENTITIES"),
                }
            },
        })
    }
}

impl CaptureConfig {
    fn from_args(matches: &clap::ArgMatches) -> Result<Self> {
        Ok(CaptureConfig {
            corner: parse_position(matches.value_of("CORNER").unwrap()).context("Parse CORNER")?,
            size: matches
                .value_of("SIZE")
                .map(parse_position)
                .transpose()
                .context("Parse SIZE")?,
            denylist: matches
                .values_of("DENY")
                .map(|v| v.map(str::to_owned).collect())
                .unwrap_or_default(),
            with_entities: !matches.is_present("NO_ENTITIES"),
        })
    }
}
