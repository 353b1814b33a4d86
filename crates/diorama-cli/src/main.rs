mod runner;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use diorama_core::DioramaConfig;
use diorama_scene::Stage;

const DEFAULT_CONFIG: &str = "diorama.toml";

#[derive(Parser)]
#[command(
    name = "diorama",
    version,
    about = "Diorama: a train platform whose doors and elevator run on a fixed choreography",
    long_about = "Composes the platform diorama (platforms, screen doors, elevator) and drives its\ndoor and elevator schedules, in real time or in simulated time."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the choreography against the wall clock
    Run {
        /// Config file (default: ./diorama.toml if present, else built-in defaults)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Stop after this many seconds (default: run until Ctrl-C)
        #[arg(long)]
        seconds: Option<f64>,

        /// Seconds between state reports; 0 disables them
        #[arg(long, default_value_t = 1.0)]
        report_every: f64,
    },

    /// Run the choreography in virtual time and print the final state
    Simulate {
        /// Config file (default: ./diorama.toml if present, else built-in defaults)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Simulated seconds
        #[arg(long, default_value_t = 30.0)]
        seconds: f64,

        /// Frame rate of the simulated render loop (default: from config)
        #[arg(long)]
        fps: Option<u32>,

        /// Print the report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Print the composed scene graph as JSON
    Scene {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write the default configuration file
    Init {
        #[arg(default_value = DEFAULT_CONFIG)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate configuration, scene and schedules
    Check {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

impl Commands {
    /// Commands whose stdout is machine-readable.
    fn writes_json(&self) -> bool {
        matches!(
            self,
            Commands::Scene { .. } | Commands::Simulate { json: true, .. }
        )
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt().with_env_filter(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    );

    if cli.command.writes_json() {
        // Keep stdout pure JSON.
        subscriber
            .with_ansi(false)
            .with_writer(std::io::stderr)
            .init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Run {
            config,
            seconds,
            report_every,
        } => {
            let config = load_config(config.as_deref())?;
            run_async(runner::run_live(config, seconds, report_every))
        }
        Commands::Simulate {
            config,
            seconds,
            fps,
            json,
        } => cmd_simulate(config.as_deref(), seconds, fps, json),
        Commands::Scene { config } => cmd_scene(config.as_deref()),
        Commands::Init { path, force } => cmd_init(&path, force),
        Commands::Check { config } => cmd_check(config.as_deref()),
    }
}

fn run_async<F>(future: F) -> Result<()>
where
    F: std::future::Future<Output = Result<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to initialize async runtime")?;
    runtime.block_on(future)
}

/// Explicit path, else `./diorama.toml` if it exists, else the defaults.
fn load_config(path: Option<&Path>) -> Result<DioramaConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let fallback = PathBuf::from(DEFAULT_CONFIG);
            if !fallback.exists() {
                tracing::debug!("no {} found, using defaults", DEFAULT_CONFIG);
                return Ok(DioramaConfig::default());
            }
            fallback
        }
    };
    DioramaConfig::load_from_file(&path)
        .with_context(|| format!("failed to load config: {}", path.display()))
}

fn cmd_simulate(config: Option<&Path>, seconds: f64, fps: Option<u32>, json: bool) -> Result<()> {
    let config = load_config(config)?;
    let fps = fps.unwrap_or(config.render.fps);
    let report = runner::simulate(&config, seconds, fps)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Simulated {:.1}s at {} fps: {} frames, {} cues",
        report.seconds, report.fps, report.frames, report.cues
    );
    println!();
    for line in runner::describe(&report.snapshot) {
        println!("   {}", line);
    }
    Ok(())
}

fn cmd_scene(config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let stage = Stage::new(&config).context("failed to build the diorama")?;
    println!("{}", stage.scene().to_json()?);
    Ok(())
}

fn cmd_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    DioramaConfig::default()
        .save_to_file(path)
        .with_context(|| format!("failed to write config: {}", path.display()))?;
    println!("✓ Wrote {}", path.display());
    Ok(())
}

fn cmd_check(config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    config.validate().context("invalid configuration")?;
    println!("   ✓ Config OK");

    let stage = Stage::new(&config).context("diorama failed validation")?;
    println!(
        "   ✓ Scene OK ({} nodes, {} actors, background {})",
        stage.scene().node_count(),
        stage.actors().len(),
        stage.scene().background
    );
    for schedule in stage.choreographer().schedules() {
        println!(
            "   ✓ Schedule '{}': every {}, {} steps",
            schedule.name(),
            schedule.period(),
            schedule.steps().len()
        );
    }
    println!();
    println!("   No errors found.");
    Ok(())
}
