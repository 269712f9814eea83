mod config;

use anyhow::{anyhow, bail, Context, Result};
use clap::{App, Arg, ArgMatches};
use config::Config;
use itertools::Itertools;
use log::{info, warn};
use mcst_common::block_storage::{BlockStorage, Position, Rotation};
use mcst_template::processor::BlockIgnoreProcessor;
use mcst_template::{PlacementSettings, StructureTemplate};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn placement_args<'a>(cmd: App<'a>) -> App<'a> {
    cmd.arg(
        Arg::with_name("INPUT")
            .help("Structure file to place (gzip NBT)")
            .index(1)
            .required(true),
    )
    .arg(
        Arg::with_name("OUTPUT")
            .help("Where to write the captured result")
            .long("out")
            .value_name("OUTPUT")
            .required(true),
    )
    .arg(
        Arg::with_name("WORLD")
            .help("Extents of the scratch world, as x,y,z")
            .long("world")
            .value_name("WORLD")
            .default_value("64,64,64"),
    )
    .arg(
        Arg::with_name("ORIGIN")
            .long("origin")
            .value_name("ORIGIN")
            .default_value("0,0,0")
            .allow_hyphen_values(true),
    )
    .arg(
        Arg::with_name("PIVOT")
            .help("Rotation pivot, relative to the template")
            .long("pivot")
            .value_name("PIVOT")
            .default_value("0,0,0")
            .allow_hyphen_values(true),
    )
    .arg(
        Arg::with_name("ROTATION")
            .long("rotation")
            .value_name("ROTATION")
            .possible_values(["none", "clockwise_90", "180", "counterclockwise_90"])
            .default_value("none"),
    )
    .arg(
        Arg::with_name("MIRROR")
            .long("mirror")
            .value_name("MIRROR")
            .possible_values(["none", "left_right", "front_back"])
            .default_value("none"),
    )
    .arg(
        Arg::with_name("SEED")
            .help("Fixed seed for palette choice and random processors")
            .long("seed")
            .value_name("SEED"),
    )
    .arg(
        Arg::with_name("NO_ENTITIES")
            .help("Leave entities out of both placement and capture")
            .long("no-entities"),
    )
    .arg(
        Arg::with_name("DRY")
            .help("Don't waterlog blocks placed into fluids")
            .long("dry"),
    )
}

fn parse_args() -> ArgMatches {
    App::new("mcst")
        .version(env!("CARGO_PKG_VERSION"))
        .author(clap::crate_authors!())
        .about("Inspect, place and capture Minecraft structure templates")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::with_name("JSON")
                .help("Dump results as JSON on stdout")
                .long("json")
                .global(true),
        )
        .subcommand(
            App::new("info")
                .about("Summarize a structure file")
                .arg(
                    Arg::with_name("INPUT")
                        .help("Structure file (gzip NBT)")
                        .index(1)
                        .required(true),
                ),
        )
        .subcommand(placement_args(
            App::new("place")
                .about("Place a structure into an empty world and capture the whole world back"),
        ))
        .subcommand(
            placement_args(
                App::new("capture")
                    .about("Place a structure, then capture a region of the result"),
            )
            .arg(
                Arg::with_name("CORNER")
                    .help("Lowest corner of the captured region")
                    .long("corner")
                    .value_name("CORNER")
                    .default_value("0,0,0"),
            )
            .arg(
                Arg::with_name("SIZE")
                    .help("Size of the captured region, defaults to the rest of the world")
                    .long("size")
                    .value_name("SIZE"),
            )
            .arg(
                Arg::with_name("DENY")
                    .help("Block name to leave out of the capture, may be repeated")
                    .long("deny")
                    .value_name("BLOCK")
                    .multiple_occurrences(true),
            ),
        )
        .get_matches()
}

fn info_command(matches: &ArgMatches) -> Result<()> {
    let path = PathBuf::from(matches.value_of_os("INPUT").unwrap());
    let template = StructureTemplate::from_file(&path)?;

    if matches.is_present("JSON") {
        let stdout = std::io::stdout();
        serde_json::to_writer_pretty(stdout.lock(), &template.save())?;
        println!();
        return Ok(());
    }

    println!("{}", path.display());
    println!("  size: {}", template.size());
    if !template.author().is_empty() {
        println!("  author: {}", template.author());
    }
    println!("  palettes: {}", template.palettes().len());
    for (i, palette) in template.palettes().iter().enumerate() {
        let [full, irregular, payload] = palette.bucket_sizes();
        let kinds = palette.blocks().iter().map(|b| &b.state.name).unique().count();
        println!(
            "    [{}] {} blocks of {} kinds ({} full, {} irregular, {} with payload)",
            i,
            palette.len(),
            kinds,
            full,
            irregular,
            payload
        );
    }

    let jigsaws = template.jigsaws(Position::ZERO, Rotation::None);
    println!("  jigsaws: {}", jigsaws.len());
    for j in &jigsaws {
        println!(
            "    {} {} -> {} (pool {}, {})",
            j.info.pos,
            j.name,
            j.target,
            j.pool,
            j.joint.name()
        );
    }

    println!("  entities: {}", template.entities().len());
    for e in template.entities() {
        println!("    {}", e);
    }
    Ok(())
}

fn place_command(config: &Config) -> Result<()> {
    let template = StructureTemplate::from_file(&config.io.input_file)?;

    let mut world = BlockStorage::new(config.world.size_x, config.world.size_y, config.world.size_z)
        .context("Failed to allocate the scratch world")?;
    let t = &config.transform;
    let mut settings = PlacementSettings::default()
        .with_rotation(t.rotation)
        .with_mirror(t.mirror)
        .with_pivot(t.pivot)
        .with_ignore_entities(t.ignore_entities)
        .with_keep_liquids(!t.dry)
        .with_processor(BlockIgnoreProcessor::structure_block());
    if let Some(seed) = t.seed {
        settings = settings.with_seed(seed);
    }

    if !template.place_in_world(&mut world, t.origin, t.pivot, &settings) {
        bail!("Nothing placed from {:?}", config.io.input_file);
    }
    info!(
        "Placed {} into a {}x{}x{} world, {} blocks set",
        config.io.input_file.display(),
        config.world.size_x,
        config.world.size_y,
        config.world.size_z,
        world.non_air_count()
    );

    let c = &config.capture;
    let extents = Position::new(
        config.world.size_x as i32,
        config.world.size_y as i32,
        config.world.size_z as i32,
    );
    let size = c.size.unwrap_or(extents - c.corner);
    if size.x < 1 || size.y < 1 || size.z < 1 {
        return Err(anyhow!("Capture region at {} of size {} is empty", c.corner, size));
    }
    if !world.contains(c.corner + size - Position::new(1, 1, 1)) {
        warn!("Capture region reaches past the world; the overhang reads as air");
    }

    let denylist = c.denylist.iter().map(String::as_str).collect_vec();
    let captured = StructureTemplate::capture(&world, c.corner, size, c.with_entities, &denylist);
    captured
        .to_file(&config.io.output_file)
        .context("Failed to write captured structure")?;
    info!(
        "Captured {} blocks and {} entities into {}",
        captured.palettes().first().map(|p| p.len()).unwrap_or(0),
        captured.entities().len(),
        config.io.output_file.display()
    );

    if config.io.json {
        let stdout = std::io::stdout();
        serde_json::to_writer_pretty(stdout.lock(), &world)?;
        println!();
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = parse_args();
    match matches.subcommand() {
        Some(("info", sub)) => info_command(sub),
        Some(("place", sub)) => place_command(&Config::from_args(sub, false)?),
        Some(("capture", sub)) => place_command(&Config::from_args(sub, true)?),
        _ => unreachable!("clap requires a subcommand"),
    }
}
