//! Tress CLI - hair card analysis and hair rig generation.
//!
//! Usage: tress <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `tress --help` for available commands. Set `RUST_LOG=info` (or
//! `debug`) for per-island diagnostics.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};

use tress::algo::cards::{cards_to_length_loops, lateral_cards, select_cards};
use tress::algo::islands::uv_islands;
use tress::algo::transfer::{copy_positions_by_uv_id, TransferOptions};
use tress::algo::Progress;
use tress::config::{BoneSelection, CardSelection, HairRigConfig, RigParent, RigTarget};
use tress::io::{self, obj, Format};
use tress::mesh::CardMesh;
use tress::nalgebra::{Point3, Vector2, Vector3};
use tress::rig::{self, Armature, Bone, Skeleton};
use tress::weights::{self, BindTarget, WeightMap, WeightStore};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "tress")]
#[command(author, version, about = "Hair card rigging CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh and hair card statistics
    Info {
        /// Input mesh file
        input: PathBuf,

        #[command(flatten)]
        cards: CardArgs,
    },

    /// Extract card length loops as OBJ polylines
    Curves {
        /// Input mesh file
        input: PathBuf,

        /// Output OBJ file
        output: PathBuf,

        #[command(flatten)]
        cards: CardArgs,

        /// Keep every length loop instead of one averaged loop per card
        #[arg(long)]
        no_merge: bool,
    },

    /// Generate bone chains from the cards and bind the mesh to them
    Rig {
        /// Input mesh file
        input: PathBuf,

        #[command(flatten)]
        cards: CardArgs,

        /// Head bone position (x,y,z); the head bone points up from here
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_value = "0,0,1.6")]
        head: Vec<f64>,

        /// Anatomical parent of the generated chains
        #[arg(long, value_enum, default_value = "head")]
        parent: ParentArg,

        /// Rig the weights are generated for
        #[arg(short, long, value_enum, default_value = "standard")]
        target: TargetArg,

        /// Target bone length
        #[arg(short = 'l', long, default_value = "0.075")]
        bone_length: f64,

        /// Length skipped at the root of each loop
        #[arg(long, default_value = "0.075")]
        skip_length: f64,

        /// Maximum bone chains influencing one card
        #[arg(short = 'b', long, default_value = "2")]
        max_bones: usize,

        /// Distance beyond which a bone contributes no weight
        #[arg(short = 'r', long, default_value = "0.075")]
        max_radius: f64,

        /// Weight smoothing passes
        #[arg(short, long, default_value = "5")]
        smoothing: usize,

        /// Seed for the weight variance
        #[arg(long, default_value = "1")]
        seed: u64,

        /// Write the generated bone chains as OBJ polylines
        #[arg(long)]
        bones_out: Option<PathBuf>,
    },

    /// Copy vertex positions from one mesh onto another by shared UV layout
    Transfer {
        /// Mesh providing the positions
        source: PathBuf,

        /// Mesh receiving the positions
        target: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Decimal places UVs are matched to
        #[arg(short, long, default_value = "5")]
        accuracy: u32,
    },
}

/// Options selecting and orienting the hair cards.
#[derive(Args)]
struct CardArgs {
    /// Card direction in UV space, root to tip (u,v)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_value = "0,-1")]
    card_dir: Vec<f64>,

    /// Minimum |cos| between an edge and the card direction to count as aligned
    #[arg(long, default_value = "0.9")]
    dir_threshold: f64,

    /// UV channel to analyze
    #[arg(long, default_value = "0")]
    uv_channel: usize,

    /// Material (name or slot) never treated as cards, e.g. the scalp
    #[arg(short = 'x', long)]
    exclude_material: Vec<String>,

    /// Use single-threaded execution (for benchmarking)
    #[arg(long)]
    sequential: bool,
}

impl CardArgs {
    fn config(&self, material_names: &[String]) -> CliResult<HairRigConfig> {
        let [u, v] = self.card_dir[..] else {
            return Err("--card-dir takes two values".into());
        };

        let mut config = HairRigConfig::default()
            .with_card_mode(CardSelection::All)
            .with_bone_mode(BoneSelection::All)
            .with_card_dir(Vector2::new(u, v))
            .with_dir_threshold(self.dir_threshold)
            .with_uv_channel(self.uv_channel)
            .with_parallel(!self.sequential);

        for material in &self.exclude_material {
            let slot = match material_names.iter().position(|n| n == material) {
                Some(slot) => slot,
                None => material
                    .parse()
                    .map_err(|_| format!("unknown material '{}'", material))?,
            };
            config = config.exclude_material(slot);
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ParentArg {
    /// Chains hang from the head
    Head,
    /// Chains hang from the jaw (beards)
    Jaw,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum TargetArg {
    /// General skeletal rig
    Standard,
    /// Spring-bone simulation rig
    Spring,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Info { input, cards } => cmd_info(&input, &cards),

        Commands::Curves {
            input,
            output,
            cards,
            no_merge,
        } => cmd_curves(&input, &output, &cards, no_merge),

        Commands::Rig {
            input,
            cards,
            head,
            parent,
            target,
            bone_length,
            skip_length,
            max_bones,
            max_radius,
            smoothing,
            seed,
            bones_out,
        } => {
            let [x, y, z] = head[..] else {
                return Err("--head takes three values".into());
            };
            let (mesh, material_names) = load_mesh(&input)?;
            let config = cards
                .config(&material_names)?
                .with_parent(match parent {
                    ParentArg::Head => RigParent::Head,
                    ParentArg::Jaw => RigParent::Jaw,
                })
                .with_rig_target(match target {
                    TargetArg::Standard => RigTarget::Standard,
                    TargetArg::Spring => RigTarget::Spring,
                })
                .with_bone_length(bone_length)
                .with_skip_length(skip_length)
                .with_max_bones(max_bones)
                .with_max_radius(max_radius)
                .with_smoothing(smoothing)
                .with_seed(seed);
            cmd_rig(&mesh, Point3::new(x, y, z), &config, bones_out.as_deref())
        }

        Commands::Transfer {
            source,
            target,
            output,
            accuracy,
        } => cmd_transfer(&source, &target, &output, accuracy),
    }
}

/// Load a mesh and its material names (OBJ only; PLY has none).
fn load_mesh(path: &Path) -> CliResult<(CardMesh, Vec<String>)> {
    let loaded = match Format::from_path(path) {
        Some(Format::Obj) => obj::load_with_materials(path)?,
        _ => (io::load(path)?, Vec::new()),
    };
    println!(
        "Loaded: {} vertices, {} faces",
        loaded.0.num_vertices(),
        loaded.0.num_faces()
    );
    Ok(loaded)
}

/// Create a progress reporter that displays a progress bar on the terminal.
fn create_progress() -> Progress {
    let max_percent = Arc::new(AtomicUsize::new(0)); // highest percent seen (monotonic)

    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }

        let raw_percent = if current >= total {
            100
        } else {
            ((current * 100) + (total / 2)) / total
        };

        let previous = max_percent.fetch_max(raw_percent, Ordering::Relaxed);
        if raw_percent <= previous && raw_percent != 100 {
            return;
        }

        let bar_width = 30;
        let filled = (raw_percent * bar_width) / 100;
        eprint!(
            "\r[{}{}] {:3}% {:<32}",
            "=".repeat(filled),
            " ".repeat(bar_width - filled),
            raw_percent,
            message
        );
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
            max_percent.store(0, Ordering::Relaxed);
        }
    })
}

fn cmd_info(input: &Path, cards: &CardArgs) -> CliResult<()> {
    let (mut mesh, material_names) = load_mesh(input)?;
    let config = cards.config(&material_names)?;

    println!("File: {}", input.display());
    println!("UV channels: {}", mesh.num_uv_channels());
    println!("Edges: {}", mesh.num_edges());

    if !material_names.is_empty() {
        println!("Materials: {}", material_names.join(", "));
    }

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    }
    println!("Average edge length: {:.6}", mesh.average_edge_length());

    let selected = select_cards(
        &mut mesh,
        config.uv_channel,
        config.card_mode,
        &config.excluded_materials,
    )?;
    let islands = uv_islands(&mesh, config.uv_channel, true)?;
    println!("Card faces: {}", selected);
    println!("UV islands: {}", islands.len());

    let cards = lateral_cards(&mut mesh, &config)?;
    let loops = cards_to_length_loops(&mut mesh, &config)?;
    println!("Measurable cards: {}", cards.len());
    println!("Merged length loops: {}", loops.len());

    if !cards.is_empty() {
        let lengths: Vec<f64> = cards
            .iter()
            .map(|c| tress::algo::polyline::loop_length(&c.median))
            .collect();
        let min = lengths.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = lengths.iter().cloned().fold(0.0_f64, f64::max);
        let avg = lengths.iter().sum::<f64>() / lengths.len() as f64;
        println!("Card length: min={:.4}, max={:.4}, avg={:.4}", min, max, avg);
    }

    Ok(())
}

fn cmd_curves(input: &Path, output: &Path, cards: &CardArgs, no_merge: bool) -> CliResult<()> {
    let (mut mesh, material_names) = load_mesh(input)?;
    let config = cards.config(&material_names)?.with_merge_loops(!no_merge);

    let start = Instant::now();
    let loops = cards_to_length_loops(&mut mesh, &config)?;
    let elapsed = start.elapsed();

    println!("Extracted {} loops", loops.len());
    obj::save_polylines(&loops, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);
    Ok(())
}

fn cmd_rig(
    mesh: &CardMesh,
    head: Point3<f64>,
    config: &HairRigConfig,
    bones_out: Option<&Path>,
) -> CliResult<()> {
    let mut armature = Armature::default();
    armature.insert_bone(Bone::new("CC_Base_Head", head, head + Vector3::new(0.0, 0.0, 0.2)))?;
    if config.parent == RigParent::Jaw {
        armature.insert_bone(
            Bone::new(
                "CC_Base_JawRoot",
                head + Vector3::new(0.0, -0.02, 0.02),
                head + Vector3::new(0.0, -0.08, -0.02),
            )
            .with_parent("CC_Base_Head"),
        )?;
    }

    let progress = create_progress();
    let start = Instant::now();

    let generated = rig::cards_to_bones(&mut armature, &[mesh], config, &progress)?;
    if let Some(reason) = generated.skipped {
        return Err(format!("no bones generated: {}", reason).into());
    }
    println!(
        "Generated {} chains, {} bones",
        generated.chains.len(),
        generated.num_bones()
    );

    let mut weights: WeightMap = WeightMap::new();
    for v in mesh.vertex_ids() {
        weights.set_weight("CC_Base_Head", v, 1.0)?;
    }

    let report = {
        let mut targets = [BindTarget::new(mesh, &mut weights)];
        weights::bind_cards_to_bones(&mut armature, &mut targets, config, &progress)?
    };
    let elapsed = start.elapsed();

    println!("Bound {} cards to {} chains ({:.2?})", report.cards, report.chains, elapsed);
    if report.accessory_groups_removed > 0 {
        println!("Removed {} non-hair groups", report.accessory_groups_removed);
    }

    println!("\nWeight groups:");
    for name in weights.group_names() {
        if let Some(group) = weights.group(&name) {
            let max = group.values().cloned().fold(0.0_f64, f64::max);
            let locked = if armature.is_pose_locked(&name) { " (locked)" } else { "" };
            println!("  {:<16} {:>6} vertices, max {:.3}{}", name, group.len(), max, locked);
        }
    }

    if let Some(path) = bones_out {
        let chains = rig::collect_bone_chains(&armature, BoneSelection::All);
        let polylines: Vec<Vec<Point3<f64>>> = chains
            .iter()
            .map(|chain| {
                let mut points: Vec<Point3<f64>> = chain.iter().map(|b| b.head).collect();
                // chain defs carry an extended last tail; write the real one
                points.extend(
                    chain
                        .last()
                        .and_then(|b| armature.bone(&b.name))
                        .map(|bone| armature.to_world(&bone.tail)),
                );
                points
            })
            .collect();
        obj::save_polylines(&polylines, path)?;
        println!("Saved bones: {}", path.display());
    }

    Ok(())
}

fn cmd_transfer(source: &Path, target: &Path, output: &Path, accuracy: u32) -> CliResult<()> {
    let (src, src_materials) = load_mesh(source)?;
    let (mut dst, dst_materials) = load_mesh(target)?;

    let material_map = match_materials(&src_materials, &dst_materials);
    let options = TransferOptions::default().with_accuracy(accuracy);

    let start = Instant::now();
    let moved = copy_positions_by_uv_id::<_, WeightMap, _>(&src, None, &mut dst, &material_map, &options)?;
    let elapsed = start.elapsed();

    println!("Moved {} of {} vertices", moved, dst.num_vertices());
    io::save(&dst, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);
    Ok(())
}

/// Map source material slots to destination slots by name, ignoring a
/// trailing `.NNN` duplicate suffix. Unnamed meshes map slot 0 to slot 0.
fn match_materials(src: &[String], dst: &[String]) -> HashMap<usize, usize> {
    if src.is_empty() || dst.is_empty() {
        return HashMap::from([(0, 0)]);
    }

    fn strip(name: &str) -> &str {
        match name.rsplit_once('.') {
            Some((base, suffix)) if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()) => base,
            _ => name,
        }
    }

    let mut map = HashMap::new();
    for (i, s) in src.iter().enumerate() {
        let exact = dst.iter().position(|d| d == s);
        let loose = || dst.iter().position(|d| strip(d) == strip(s));
        if let Some(j) = exact.or_else(loose) {
            map.insert(i, j);
        }
    }
    map
}
