use std::fs;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use dla_simulations::{
    Adjacency, AggregationSimulator, Cluster, DlaError, RenderOptions, SimulationConfig,
};

#[derive(Parser)]
#[command(name = "dla-simulations")]
#[command(version)]
#[command(about = "Diffusion limited aggregation on a square grid")]
struct Cli {
    /// JSON file with simulation parameters; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid side length
    #[arg(long)]
    grid_size: Option<usize>,

    /// Number of walkers
    #[arg(long)]
    walkers: Option<usize>,

    /// Step budget per walker
    #[arg(long)]
    steps: Option<usize>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// How walkers test for contact with the aggregate
    #[arg(long, value_enum)]
    adjacency: Option<Adjacency>,

    /// Image of the final grid
    #[arg(long, default_value = "dla.png")]
    output: PathBuf,

    /// Pixels per grid cell
    #[arg(long, default_value = "4")]
    scale: u32,

    /// Shade cells by the order they stuck in
    #[arg(long)]
    colour_by_age: bool,

    /// Circle the seed cell
    #[arg(long)]
    mark_seed: bool,

    /// Write a JSON run summary here
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Save a frame every N walkers
    #[arg(long)]
    snapshot_every: Option<NonZeroUsize>,

    /// Directory for snapshot frames
    #[arg(long, default_value = "frames")]
    snapshot_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn simulation_config(&self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::from_json_path(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => SimulationConfig::default(),
        };
        if let Some(grid_size) = self.grid_size {
            config.grid_size = grid_size;
        }
        if let Some(walkers) = self.walkers {
            config.num_walkers = walkers;
        }
        if let Some(steps) = self.steps {
            config.max_steps = steps;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(adjacency) = self.adjacency {
            config.adjacency = adjacency;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Saves an image of the cluster every `every` walkers.
struct Snapshots {
    dir: PathBuf,
    every: NonZeroUsize,
    options: RenderOptions,
}

impl Snapshots {
    fn frame_path(&self, index: usize) -> Option<PathBuf> {
        let released = index + 1;
        if released % self.every.get() == 0 {
            Some(self.dir.join(format!("frame_{:06}.png", released)))
        } else {
            None
        }
    }

    fn observe(&self, index: usize, cluster: &Cluster) -> Result<(), DlaError> {
        if let Some(path) = self.frame_path(index) {
            cluster.image(&self.options)?.save(&path)?;
            debug!(walkers = index + 1, size = cluster.len(), path = %path.display(), "saved frame");
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .init();

    let config = cli.simulation_config()?;
    let options = RenderOptions {
        scale: cli.scale,
        colour_by_age: cli.colour_by_age,
        mark_seed: cli.mark_seed,
    };

    let mut sim = AggregationSimulator::init(&config)?;
    info!(
        grid_size = config.grid_size,
        walkers = config.num_walkers,
        max_steps = config.max_steps,
        seed = sim.seed(),
        adjacency = ?config.adjacency,
        "starting aggregation"
    );

    let snapshots = cli.snapshot_every.map(|every| Snapshots {
        dir: cli.snapshot_dir.clone(),
        every,
        options,
    });
    if snapshots.is_some() {
        fs::create_dir_all(&cli.snapshot_dir)
            .with_context(|| format!("creating {}", cli.snapshot_dir.display()))?;
    }
    let summary = sim.run_with(config.num_walkers, config.max_steps, |index, _, cluster| {
        match &snapshots {
            Some(snapshots) => snapshots.observe(index, cluster),
            None => Ok(()),
        }
    })?;

    info!(
        stuck = summary.stuck,
        absorbed = summary.absorbed,
        exhausted = summary.exhausted,
        size = summary.aggregate_size,
        radius = summary.radius,
        "aggregation finished"
    );

    sim.cluster()
        .image(&options)?
        .save(&cli.output)
        .with_context(|| format!("saving {}", cli.output.display()))?;
    info!(path = %cli.output.display(), "wrote image");

    if let Some(path) = &cli.summary {
        fs::write(path, serde_json::to_string_pretty(&summary)?)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "wrote summary");
    }
    Ok(())
}
