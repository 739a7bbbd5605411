mod host;
mod runner;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use vib3_core::color_presets::{PresetDocument, is_builtin};
use vib3_core::geometry::{self, GeometryId};
use vib3_core::timeline::TimelineData;
use vib3_core::{
    AestheticMapper, ChoreographyPlayer, ChoreographySpec, ColorPresetsSystem, Engine, LoopMode,
    ParameterSet, ParameterTimeline, ProjectionMode, Rotor4,
};
use vib3_store::{DocumentKind, EngineConfig, Library, resolve_data_dir};

use crate::host::HeadlessEngine;
use crate::runner::{Clock, RunSummary};

#[derive(Parser)]
#[command(name = "vib3", about = "Headless host for the vib3 4D visualization engine")]
struct Cli {
    /// Data directory (overridden by VIB3_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the 24 geometry indices
    Geometry {
        #[command(subcommand)]
        command: GeometryCommand,
    },

    /// Sample or play a parameter timeline
    Timeline {
        #[command(subcommand)]
        command: TimelineCommand,
    },

    /// Play a choreography
    Choreo {
        #[command(subcommand)]
        command: ChoreoCommand,
    },

    /// Manage color presets
    Preset {
        #[command(subcommand)]
        command: PresetCommand,
    },

    /// Map a free-text description to parameter values
    Describe {
        /// Description, e.g. "calm ocean sphere"
        #[arg(required = true)]
        text: Vec<String>,
    },
}

#[derive(Subcommand)]
enum GeometryCommand {
    /// List every index with its name
    List,

    /// Show the core warp and base shape behind an index
    Decode { index: u8 },

    /// Combine a core warp (0-2) and base shape (0-7) into an index
    Encode { core: u8, base: u8 },

    /// Print projected 3D points, one "x y z" line each
    Points {
        index: u8,

        /// Samples per edge or axis (defaults to the configured resolution)
        #[arg(long)]
        resolution: Option<usize>,

        #[arg(long, value_enum, default_value_t = Projection::Perspective)]
        projection: Projection,

        /// Perspective distance (defaults to the configured value)
        #[arg(long)]
        distance: Option<f64>,

        /// Six plane angles in radians: xy,xz,yz,xw,yw,zw
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        rotate: Option<Vec<f64>>,
    },
}

#[derive(Subcommand)]
enum TimelineCommand {
    /// Print parameter values at a fixed step as JSON lines
    Sample {
        /// Timeline file, or a name in the library
        source: String,

        /// Step between samples in milliseconds
        #[arg(long, default_value_t = 250.0)]
        step: f64,
    },

    /// Play through a headless engine and print the final state
    Play {
        /// Timeline file, or a name in the library
        source: String,

        #[command(flatten)]
        playback: PlaybackArgs,
    },
}

#[derive(Subcommand)]
enum ChoreoCommand {
    /// Play through a headless engine, reporting scene changes
    Play {
        /// Choreography file, or a name in the library
        source: String,

        #[command(flatten)]
        playback: PlaybackArgs,
    },
}

#[derive(Subcommand)]
enum PresetCommand {
    /// List built-in and library presets
    List {
        /// Only presets in this category
        #[arg(long)]
        category: Option<String>,
    },

    /// Print a preset as JSON
    Show { name: String },

    /// Export a preset document, to a file or into the library
    Export {
        name: String,

        /// Output file path
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Import a preset document into the library
    Import { path: PathBuf },
}

#[derive(clap::Args)]
struct PlaybackArgs {
    /// Follow the wall clock instead of stepping a simulated one
    #[arg(long)]
    realtime: bool,

    /// Stop after this many milliseconds of host time
    #[arg(long)]
    until: Option<f64>,

    /// Frames per second (defaults to the configured value)
    #[arg(long)]
    fps: Option<u32>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Projection {
    Perspective,
    Stereographic,
    Orthographic,
}

#[derive(Serialize)]
struct Sample {
    time: f64,
    values: ParameterSet,
}

struct Session {
    config: EngineConfig,
    library: Library,
}

fn open_context(cli: &Cli) -> Result<Session> {
    let dir = resolve_data_dir(cli.data_dir.as_deref());
    let config = EngineConfig::load(&dir)
        .with_context(|| format!("failed to load config from {}", dir.display()))?;
    let library = Library::open(&dir)
        .with_context(|| format!("failed to open library at {}", dir.display()))?;
    Ok(Session { config, library })
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Geometry { command } => cmd_geometry(&cli, command),
        Commands::Timeline { command } => cmd_timeline(&cli, command).await,
        Commands::Choreo { command } => cmd_choreo(&cli, command).await,
        Commands::Preset { command } => cmd_preset(&cli, command),
        Commands::Describe { text } => cmd_describe(&text.join(" ")),
    }
}

// ---------------------------------------------------------------------------
// Document loading
// ---------------------------------------------------------------------------

/// Read `source` as a file path when it exists, else as a library name.
fn read_source(library: &Library, kind: DocumentKind, source: &str) -> Result<String> {
    let path = Path::new(source);
    let path = if path.is_file() {
        path.to_path_buf()
    } else {
        library.path_for(kind, source)
    };
    std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))
}

fn load_timeline(ctx: &Session, source: &str) -> Result<ParameterTimeline> {
    let json = read_source(&ctx.library, DocumentKind::Timeline, source)?;
    let data: TimelineData = serde_json::from_str(&json).context("failed to parse timeline")?;
    let mut timeline = ParameterTimeline::default();
    timeline.import(data).context("invalid timeline")?;
    Ok(timeline)
}

fn load_choreography(ctx: &Session, source: &str) -> Result<ChoreographySpec> {
    let json = read_source(&ctx.library, DocumentKind::Choreography, source)?;
    serde_json::from_str(&json).context("failed to parse choreography")
}

/// Built-ins plus every preset document stored in the library.
fn load_presets(ctx: &Session) -> Result<ColorPresetsSystem> {
    let mut presets = ColorPresetsSystem::new();
    for name in ctx.library.list(DocumentKind::Preset)? {
        let doc = ctx
            .library
            .load_preset(&name)
            .with_context(|| format!("failed to read preset {name}"))?;
        if is_builtin(&doc.name) {
            continue;
        }
        if let Err(e) = presets.import_preset(doc) {
            tracing::warn!("skipping library preset {name}: {e}");
        }
    }
    Ok(presets)
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_geometry(cli: &Cli, command: &GeometryCommand) -> Result<()> {
    match command {
        GeometryCommand::List => {
            for id in geometry::all() {
                println!("{:>2}  {}", id.index(), id.name());
            }
        }
        GeometryCommand::Decode { index } => {
            let Some(id) = GeometryId::from_index(*index) else {
                bail!("geometry index {index} is out of range (0-23)");
            };
            println!("index: {}", id.index());
            println!("core:  {} ({})", id.core.name(), id.core.index());
            println!("base:  {} ({})", id.base.name(), id.base.index());
            println!("name:  {}", id.name());
        }
        GeometryCommand::Encode { core, base } => {
            let Some(index) = geometry::encode_index(*core, *base) else {
                bail!("core must be 0-2 and base 0-7, got {core} and {base}");
            };
            println!("{index}");
        }
        GeometryCommand::Points {
            index,
            resolution,
            projection,
            distance,
            rotate,
        } => {
            if GeometryId::from_index(*index).is_none() {
                bail!("geometry index {index} is out of range (0-23)");
            }
            let ctx = open_context(cli)?;
            let resolution = resolution.unwrap_or(ctx.config.resolution);
            let mode = match projection {
                Projection::Perspective => ProjectionMode::Perspective {
                    distance: distance.unwrap_or(ctx.config.perspective_distance),
                },
                Projection::Stereographic => ProjectionMode::Stereographic,
                Projection::Orthographic => ProjectionMode::Orthographic,
            };
            let rotor = match rotate.as_deref() {
                Some(&[xy, xz, yz, xw, yw, zw]) => Rotor4::from_euler6([xy, xz, yz, xw, yw, zw]),
                Some(other) => bail!("--rotate needs 6 angles, got {}", other.len()),
                None => Rotor4::identity(),
            };

            let points: Vec<_> = geometry::generate_geometry(*index, resolution)
                .into_iter()
                .map(|p| rotor.rotate(p))
                .collect();
            for p in mode.project_all(&points) {
                println!("{:.6} {:.6} {:.6}", p.x, p.y, p.z);
            }
        }
    }
    Ok(())
}

async fn cmd_timeline(cli: &Cli, command: &TimelineCommand) -> Result<()> {
    let ctx = open_context(cli)?;
    match command {
        TimelineCommand::Sample { source, step } => {
            if !step.is_finite() || *step <= 0.0 {
                bail!("--step must be positive");
            }
            let timeline = load_timeline(&ctx, source)?;
            let duration = timeline.duration();
            let count = (duration / step).floor() as u64;
            for i in 0..=count {
                let time = (i as f64 * step).min(duration);
                let sample = Sample {
                    time,
                    values: timeline.values_at(time),
                };
                println!("{}", serde_json::to_string(&sample)?);
            }
        }
        TimelineCommand::Play { source, playback } => {
            let mut timeline = load_timeline(&ctx, source)?;
            let default_limit = match timeline.loop_mode() {
                LoopMode::Once => timeline.duration() / timeline.speed(),
                LoopMode::Loop | LoopMode::Bounce => timeline.duration(),
            };
            let mut engine = HeadlessEngine::with_defaults();
            let summary = play(&ctx, playback, default_limit, &mut timeline, &mut engine).await;
            report(&summary, &engine)?;
        }
    }
    Ok(())
}

async fn cmd_choreo(cli: &Cli, command: &ChoreoCommand) -> Result<()> {
    let ctx = open_context(cli)?;
    match command {
        ChoreoCommand::Play { source, playback } => {
            let spec = load_choreography(&ctx, source)?;
            let mut player = ChoreographyPlayer::new();
            player.load(spec).context("invalid choreography")?;
            *player.presets_mut() = load_presets(&ctx)?;

            let names: Vec<String> = player
                .scenes()
                .iter()
                .map(|s| format!("{:.0}-{:.0}ms", s.time_start, s.time_end))
                .collect();
            player.on_scene_change(move |i| {
                let span = names.get(i).map(String::as_str).unwrap_or("?");
                println!("scene {i} ({span})");
            });
            player.on_complete(|| println!("complete"));

            let mut engine = HeadlessEngine::with_defaults();
            let duration = player.duration();
            let summary = play(&ctx, playback, duration, &mut player, &mut engine).await;
            println!(
                "system: {} ({} switches)",
                engine.current_system().as_str(),
                engine.switches().len()
            );
            report(&summary, &engine)?;
        }
    }
    Ok(())
}

async fn play<P: runner::Playback>(
    ctx: &Session,
    args: &PlaybackArgs,
    default_limit: f64,
    playback: &mut P,
    engine: &mut HeadlessEngine,
) -> RunSummary {
    let frame_ms = match args.fps {
        Some(fps) => 1000.0 / f64::from(fps.max(1)),
        None => ctx.config.frame_ms(),
    };
    let clock = if args.realtime {
        Clock::Realtime
    } else {
        Clock::Simulated
    };
    // One extra frame so a run that ends exactly on the limit still completes.
    let limit = args.until.unwrap_or(default_limit + frame_ms);
    runner::run(playback, engine, clock, frame_ms, limit).await
}

fn report(summary: &RunSummary, engine: &HeadlessEngine) -> Result<()> {
    println!("frames: {}", summary.frames);
    println!("elapsed: {:.0}ms", summary.elapsed_ms);
    if summary.interrupted {
        println!("interrupted");
    }
    println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
    Ok(())
}

fn cmd_preset(cli: &Cli, command: &PresetCommand) -> Result<()> {
    let ctx = open_context(cli)?;
    let presets = load_presets(&ctx)?;
    match command {
        PresetCommand::List { category } => {
            for name in presets.names() {
                let Some(config) = presets.get(name) else {
                    continue;
                };
                if let Some(wanted) = category
                    && !config.category.as_str().eq_ignore_ascii_case(wanted)
                {
                    continue;
                }
                println!("{name}\t{}", config.category);
            }
        }
        PresetCommand::Show { name } => {
            let config = presets.lookup(name)?;
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        PresetCommand::Export { name, out } => {
            let Some(doc) = presets.export_preset(name) else {
                bail!("unknown preset: {name}");
            };
            let path = match out {
                Some(path) => {
                    std::fs::write(path, serde_json::to_string_pretty(&doc)?)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    path.clone()
                }
                None => ctx
                    .library
                    .save_preset(name, &doc)
                    .context("failed to save preset")?,
            };
            println!("exported {name} to {}", path.display());
        }
        PresetCommand::Import { path } => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let doc: PresetDocument =
                serde_json::from_str(&json).context("failed to parse preset document")?;
            let mut check = ColorPresetsSystem::new();
            check
                .import_preset(doc.clone())
                .context("invalid preset document")?;
            ctx.library
                .save_preset(&doc.name, &doc)
                .context("failed to save preset")?;
            println!("imported {}", doc.name);
        }
    }
    Ok(())
}

fn cmd_describe(text: &str) -> Result<()> {
    let result = AestheticMapper::new().describe(text);
    if result.matched.is_empty() {
        tracing::warn!("no known words in description");
    }
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
