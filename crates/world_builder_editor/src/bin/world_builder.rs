//! Command-line tool for inspecting and batch-editing world_builder levels
//!
//! Run with: world_builder <COMMAND> --help
//!
//! Shares `preferences.toml` with the editor: levels read or written here are
//! added to the recent list, and `show_collisions` makes `check` print the
//! collider grid.

use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::{Path, PathBuf};
use world_builder_core::format::{load_level, save_level};
use world_builder_core::{GeometryCatalog, HeightSlice, LoadedLevel, ProjectRegistry};
use world_builder_editor::{EditorPreferences, ProjectIndex};

#[derive(Parser)]
#[command(name = "world_builder", about = "Inspect and edit world_builder level files")]
struct Cli {
    /// Geometry catalog (ids.json); an empty catalog is used when omitted
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
    /// Project index used to resolve world positions
    #[arg(long, global = true)]
    project: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a level and report its contents and any load warnings
    Check {
        level: PathBuf,
        /// Also print the collider grid (default from preferences)
        #[arg(long)]
        collisions: bool,
    },
    /// Print the derived collider grid as ASCII
    Collision {
        level: PathBuf,
        /// Height slice to derive for, 0 for all heights
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        slice: i32,
    },
    /// Re-save a level in the current decomap format
    Upgrade {
        level: PathBuf,
        /// Output path (default: overwrite the input)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Grow or shrink a level at its edges
    Resize {
        level: PathBuf,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        left: i32,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        right: i32,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        up: i32,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        down: i32,
        /// Output path (default: overwrite the input)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Validate a geometry catalog and list its entries
    Catalog { path: PathBuf },
}

type CliResult = Result<(), Box<dyn Error>>;

fn load_catalog(path: Option<&Path>) -> Result<GeometryCatalog, Box<dyn Error>> {
    match path {
        Some(path) => Ok(GeometryCatalog::load(path)?),
        None => {
            log::warn!("No catalog given; collision masks and legacy heights are unavailable");
            Ok(GeometryCatalog::new())
        }
    }
}

fn open(
    cli: &Cli,
    prefs: &mut EditorPreferences,
    level: &Path,
) -> Result<(GeometryCatalog, LoadedLevel), Box<dyn Error>> {
    let catalog = load_catalog(cli.catalog.as_deref())?;
    let project = cli.project.as_deref().map(ProjectIndex::load).transpose()?;
    let registry = project.as_ref().map(|p| p as &dyn ProjectRegistry);
    let loaded = load_level(level, &catalog, registry)?;
    prefs.add_recent_level(level.to_path_buf(), loaded.level.name.clone());
    Ok((catalog, loaded))
}

fn check(cli: &Cli, prefs: &mut EditorPreferences, path: &Path, collisions: bool) -> CliResult {
    let (catalog, loaded) = open(cli, prefs, path)?;
    let mut level = loaded.level;
    level.rederive_collision(&catalog, HeightSlice::All);

    println!("{}", level.name);
    println!("  size:          {}x{}", level.width(), level.height());
    println!("  world_pos:     {:?}", level.world_pos);
    println!("  spawn:         {:?}", level.spawn);
    println!("  decorations:   {}", level.decos.len());
    println!("  loading zones: {}", level.loading_zones.len());
    println!("  lights:        {}", level.lights.len());
    println!("  height zones:  {}", level.height_zones.len());
    println!("  solid cells:   {}", level.collider().solid_count());
    for warning in &loaded.warnings {
        println!("  warning: {}", warning);
    }
    if collisions || prefs.show_collisions {
        print!("{}", level.collider().to_ascii());
    }
    Ok(())
}

fn collision(cli: &Cli, prefs: &mut EditorPreferences, path: &Path, slice: i32) -> CliResult {
    let (catalog, loaded) = open(cli, prefs, path)?;
    let mut level = loaded.level;
    level.rederive_collision(&catalog, HeightSlice::from_raw(slice));
    print!("{}", level.collider().to_ascii());
    Ok(())
}

fn upgrade(
    cli: &Cli,
    prefs: &mut EditorPreferences,
    path: &Path,
    output: Option<&Path>,
) -> CliResult {
    let (_, loaded) = open(cli, prefs, path)?;
    let output = output.unwrap_or(path);
    save_level(&loaded.level, output)?;
    prefs.add_recent_level(output.to_path_buf(), loaded.level.name.clone());
    println!("Wrote {}", output.display());
    Ok(())
}

fn resize(
    cli: &Cli,
    prefs: &mut EditorPreferences,
    path: &Path,
    edges: [i32; 4],
    output: Option<&Path>,
) -> CliResult {
    let (_, loaded) = open(cli, prefs, path)?;
    let mut level = loaded.level;
    let [left, right, up, down] = edges;
    level.resize(left, right, up, down)?;
    let output = output.unwrap_or(path);
    save_level(&level, output)?;
    prefs.add_recent_level(output.to_path_buf(), level.name.clone());
    println!(
        "Resized '{}' to {}x{}, wrote {}",
        level.name,
        level.width(),
        level.height(),
        output.display()
    );
    Ok(())
}

fn list_catalog(path: &Path) -> CliResult {
    let catalog = GeometryCatalog::load(path)?;
    println!("tile_ids:");
    for tile in catalog.tiles() {
        println!("  {:>4}  {:<32} {:?}", tile.id, tile.tex, tile.geo.map(|g| g.0));
    }
    println!("deco_ids:");
    for deco in catalog.decorations() {
        println!(
            "  {:>4}  {:<32} {:?} height {}",
            deco.id,
            deco.tex,
            deco.geo.map(|g| g.0),
            deco.height
        );
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut prefs = EditorPreferences::load();
    let result = match &cli.command {
        Command::Check { level, collisions } => check(&cli, &mut prefs, level, *collisions),
        Command::Collision { level, slice } => collision(&cli, &mut prefs, level, *slice),
        Command::Upgrade { level, output } => {
            upgrade(&cli, &mut prefs, level, output.as_deref())
        }
        Command::Resize {
            level,
            left,
            right,
            up,
            down,
            output,
        } => resize(
            &cli,
            &mut prefs,
            level,
            [*left, *right, *up, *down],
            output.as_deref(),
        ),
        Command::Catalog { path } => list_catalog(path),
    };

    if let Err(e) = prefs.save() {
        log::warn!("Could not save preferences: {}", e);
    }

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
