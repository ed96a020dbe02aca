//! Demo binary that generates a square region of terrain around a chunk.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p earthgen-demo -- --center-x 500 --center-z -300 --radius 4`.

use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use clap::Parser;
use earthgen_config::{CliArgs, Config, default_config_dir};
use earthgen_terrain::EarthGenerator;
use earthgen_voxel::{BlockState, ChunkPos, CubePos};
use tracing::{error, info, warn};

/// Totals gathered while generating the region.
#[derive(Default)]
struct RegionSummary {
    cubes: usize,
    failed: usize,
    solid_blocks: usize,
    water_blocks: usize,
}

impl RegionSummary {
    fn merge(&mut self, other: RegionSummary) {
        self.cubes += other.cubes;
        self.failed += other.failed;
        self.solid_blocks += other.solid_blocks;
        self.water_blocks += other.water_blocks;
    }
}

fn region(args: &CliArgs) -> Vec<ChunkPos> {
    let r = args.radius.max(0);
    (-r..=r)
        .flat_map(|dz| (-r..=r).map(move |dx| (dx, dz)))
        .map(|(dx, dz)| ChunkPos::new(args.center_x + dx, args.center_z + dz))
        .collect()
}

/// Generates every cube of `columns` between the configured y bounds.
fn generate_columns(
    generator: &EarthGenerator,
    columns: &[ChunkPos],
    min_y: i32,
    max_y: i32,
) -> RegionSummary {
    let mut summary = RegionSummary::default();
    for &pos in columns {
        for y in min_y..=max_y {
            let cube = CubePos::new(pos.x, y, pos.z);
            match generator.generate_cube(cube) {
                Ok(primer) => {
                    summary.cubes += 1;
                    let air = primer.count(BlockState::AIR);
                    let water = primer.count(BlockState::WATER);
                    summary.water_blocks += water;
                    summary.solid_blocks += primer.blocks().len() - air - water;
                }
                Err(err) => {
                    summary.failed += 1;
                    warn!(%cube, error = %err, "cube generation failed");
                }
            }
        }
    }
    summary
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    earthgen_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    let generator = match EarthGenerator::from_config(&config) {
        Ok(generator) => Arc::new(generator),
        Err(err) => {
            error!(error = %err, "invalid generator configuration");
            return ExitCode::FAILURE;
        }
    };
    if let Some(notice) = generator.operator_notice() {
        info!("{notice}");
    }
    info!(
        workers = generator.cache().worker_count(),
        structures = ?generator.structure_generator_names(),
        populators = ?generator.populator_names(),
        "generator ready"
    );

    let columns = region(&args);
    let start = Instant::now();

    if let Some(hook) = generator.prefetch_hook() {
        for &pos in &columns {
            hook.on_column_loading(pos);
        }
        info!(columns = columns.len(), "prefetch requested");
    }

    let threads = generator.cache().worker_count().max(1);
    let chunk_len = columns.len().div_ceil(threads).max(1);
    let (min_y, max_y) = (args.min_cube_y, args.max_cube_y);
    let summary = thread::scope(|scope| {
        let handles: Vec<_> = columns
            .chunks(chunk_len)
            .map(|slice| {
                let generator = &generator;
                scope.spawn(move || generate_columns(generator, slice, min_y, max_y))
            })
            .collect();
        let mut total = RegionSummary::default();
        for handle in handles {
            match handle.join() {
                Ok(part) => total.merge(part),
                Err(_) => error!("generation thread panicked"),
            }
        }
        total
    });

    let stats = generator.cache().stats();
    info!(
        cubes = summary.cubes,
        failed = summary.failed,
        solid_blocks = summary.solid_blocks,
        water_blocks = summary.water_blocks,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "region generated"
    );
    info!(
        hits = stats.hits,
        misses = stats.misses,
        coalesced = stats.coalesced,
        loads = stats.loads,
        failures = stats.failures,
        entries = stats.entries,
        bytes = stats.bytes,
        "column cache"
    );

    if summary.failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
