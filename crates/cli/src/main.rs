#![deny(unsafe_code)]
//! CLI binary for fieldlines.
//!
//! Subcommands:
//! - `render` runs the simulation N ticks, drawing every tick into one
//!   persistent frame, and writes a PNG (optionally every frame)
//! - `run` runs headless and prints the cumulative tick report
//! - `schema` prints the simulation and style parameter schemas

mod error;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use error::CliError;
use fieldlines_attractor::{Simulation, TickReport};
use fieldlines_core::{Engine, ProbeKind, ProbeSeed, Seed, SimConfig};
use fieldlines_render::{write_png, Frame, Style};
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "fieldlines", about = "Point-source field line animator")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Log more (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the simulation and write a PNG of the final frame.
    Render {
        #[command(flatten)]
        sim: SimArgs,

        /// Style parameters as a JSON string.
        #[arg(long, default_value = "{}")]
        style: String,

        /// Output file path.
        #[arg(short, long, default_value = "output.png")]
        output: PathBuf,

        /// Also write every tick as frame_<n>.png into this directory.
        #[arg(long)]
        frames: Option<PathBuf>,
    },
    /// Run the simulation without drawing and report what happened.
    Run {
        #[command(flatten)]
        sim: SimArgs,
    },
    /// Print the accepted simulation and style parameters.
    Schema,
}

#[derive(Args)]
struct SimArgs {
    /// Field width in pixels.
    #[arg(short = 'W', long, default_value_t = 800)]
    width: usize,

    /// Field height in pixels.
    #[arg(short = 'H', long, default_value_t = 600)]
    height: usize,

    /// Number of ticks (default 500, or the seed file's steps).
    #[arg(short, long)]
    steps: Option<usize>,

    /// PRNG seed for deterministic output.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Simulation parameters as a JSON string.
    #[arg(long, default_value = "{}")]
    params: String,

    /// Read width, height, seed, params, steps and probes from a JSON file.
    #[arg(long, conflicts_with_all = ["width", "height", "seed", "params"])]
    seed_file: Option<PathBuf>,

    /// Start a traced probe at center-relative "x,y". Repeatable.
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    trace: Vec<(f64, f64)>,

    /// Start a potential probe at center-relative "x,y". Repeatable.
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    potential: Vec<(f64, f64)>,
}

const DEFAULT_STEPS: usize = 500;

fn parse_point(s: &str) -> Result<(f64, f64), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"x,y\", got '{s}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("'{v}' is not a finite number"))
    };
    Ok((parse(x)?, parse(y)?))
}

impl SimArgs {
    /// Resolves flags (or the seed file) into one run description.
    fn to_seed(&self) -> Result<Seed, CliError> {
        let mut seed = match &self.seed_file {
            Some(path) => read_seed_file(path)?,
            None => {
                let params: Value = serde_json::from_str(&self.params)
                    .map_err(|e| CliError::Input(format!("invalid --params JSON: {e}")))?;
                Seed {
                    params,
                    steps: DEFAULT_STEPS,
                    ..Seed::new(self.width, self.height, self.seed)
                }
            }
        };
        if let Some(steps) = self.steps {
            seed.steps = steps;
        }
        let probes = self
            .trace
            .iter()
            .map(|&(x, y)| ProbeSeed::new(ProbeKind::Traced, x, y))
            .chain(
                self.potential
                    .iter()
                    .map(|&(x, y)| ProbeSeed::new(ProbeKind::Potential, x, y)),
            );
        seed.probes.extend(probes);
        Ok(seed)
    }
}

fn read_seed_file(path: &Path) -> Result<Seed, CliError> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| CliError::Input(format!("invalid seed file {}: {e}", path.display())))
}

fn probe_label(kind: ProbeKind) -> &'static str {
    match kind {
        ProbeKind::Traced => "traced",
        ProbeKind::Potential => "potential",
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn summary(seed: &Seed, sim: &Simulation, report: &TickReport) -> Value {
    json!({
        "width": seed.width,
        "height": seed.height,
        "seed": seed.seed,
        "steps": seed.steps,
        "points": sim.points().len(),
        "traced_live": sim.probes(ProbeKind::Traced).live().len(),
        "traced_finished": sim.probes(ProbeKind::Traced).finished().len(),
        "potential_live": sim.probes(ProbeKind::Potential).live().len(),
        "potential_finished": sim.probes(ProbeKind::Potential).finished().len(),
        "report": report,
    })
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Schema => {
            let schema = json!({
                "simulation": SimConfig::schema(),
                "style": Style::schema(),
            });
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        Command::Run { sim: args } => {
            let seed = args.to_seed()?;
            let mut sim = Simulation::from_seed(&seed)?;
            let mut total = TickReport::default();
            for _ in 0..seed.steps {
                total += sim.tick();
            }

            if cli.json {
                let info = summary(&seed, &sim, &total);
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                let p = &total.points;
                println!(
                    "{} ticks ({}x{}, seed {}): {} live points",
                    total.tick,
                    seed.width,
                    seed.height,
                    seed.seed,
                    sim.points().len()
                );
                println!(
                    "  points: advanced {}, collided {}, escaped {}, degenerate {}, respawned {}, retired {}",
                    p.advanced, p.collided, p.escaped, p.degenerate, p.respawned, p.retired
                );
                for (set, r) in [
                    (sim.probes(ProbeKind::Traced), &total.traced),
                    (sim.probes(ProbeKind::Potential), &total.potential),
                ] {
                    println!(
                        "  {}: {} live, {} finished ({} collided, {} escaped, {} degenerate)",
                        probe_label(set.kind()),
                        set.live().len(),
                        set.finished().len(),
                        r.collided,
                        r.escaped,
                        r.degenerate
                    );
                }
            }
        }
        Command::Render {
            sim: args,
            style,
            output,
            frames,
        } => {
            let seed = args.to_seed()?;
            let style: Value = serde_json::from_str(&style)
                .map_err(|e| CliError::Input(format!("invalid --style JSON: {e}")))?;
            let style = Style::from_json(&style)?;

            let mut sim = Simulation::from_seed(&seed)?;
            let mut frame = Frame::new(seed.width, seed.height, style.background)?;
            if let Some(dir) = &frames {
                fs::create_dir_all(dir)
                    .map_err(|e| CliError::Io(format!("{}: {e}", dir.display())))?;
            }

            let mut total = TickReport::default();
            for n in 1..=seed.steps {
                total += sim.tick();
                frame.draw_scene(&sim.scene(), &style);
                if let Some(dir) = &frames {
                    write_png(&frame, &dir.join(format!("frame_{n:05}.png")))?;
                }
            }
            write_png(&frame, &output)?;
            info!(output = %output.display(), ticks = total.tick, "render complete");

            if cli.json {
                let mut info = summary(&seed, &sim, &total);
                info["output"] = json!(output.display().to_string());
                if let Some(dir) = &frames {
                    info["frames"] = json!(dir.display().to_string());
                }
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                eprintln!(
                    "rendered {}x{} ({} steps, seed {}) -> {}",
                    seed.width,
                    seed.height,
                    seed.steps,
                    seed.seed,
                    output.display()
                );
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
