//! Diffusion limited aggregation on a square grid.
//!
//! An [`AggregationSimulator`] owns the occupancy grid and the growing
//! aggregate, releases random walkers against it and can render the
//! result as an image.

pub mod aggregation;
pub mod config;
pub mod error;
pub mod render;

pub use aggregation::{
    AggregationSimulator, Cell, Cluster, MoveSource, RandomMoves, RunSummary, ScriptedMoves,
    Step, WalkerOutcome,
};
pub use config::{Adjacency, SimulationConfig};
pub use error::DlaError;
pub use render::{render_occupancy, RenderOptions};
