// Simulate diffusion limited aggregation on a square lattice.
//
// Walkers are released one at a time from a random cell and wander with
// unit steps. A walker that steps next to the aggregate sticks there and
// becomes part of it, a walker that runs out of steps simply vanishes.
// Walkers may wander off the grid; they keep walking and are only tested
// against the aggregate while back inside.

use std::collections::HashSet;
use std::convert::Infallible;

use geo::algorithm::euclidean_distance::EuclideanDistance;
use geo::Coordinate;
use ndarray::{Array, Ix2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::{check_grid_size, Adjacency, SimulationConfig};
use crate::error::DlaError;

type Point2D = Coordinate<f64>;

/// Lattice coordinate. Signed so a walker can leave the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Cell {
    pub x: i64,
    pub y: i64,
}

impl Cell {
    pub fn new(x: i64, y: i64) -> Cell {
        Cell { x, y }
    }

    fn offset(self, step: Step) -> Cell {
        let (dx, dy) = step.delta();
        Cell {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    // The cell itself followed by its four lattice neighbours.
    fn neighbourhood(self) -> [Cell; 5] {
        [
            self,
            self.offset(Step::North),
            self.offset(Step::South),
            self.offset(Step::East),
            self.offset(Step::West),
        ]
    }

    fn touches(self, other: Cell) -> bool {
        (self.x - other.x).abs() + (self.y - other.y).abs() <= 1
    }

    fn point(self) -> Point2D {
        Point2D {
            x: self.x as f64,
            y: self.y as f64,
        }
    }
}

/// One axis aligned unit move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    North,
    South,
    East,
    West,
}

impl Step {
    pub const ALL: [Step; 4] = [Step::North, Step::South, Step::East, Step::West];

    pub fn delta(self) -> (i64, i64) {
        match self {
            Step::North => (0, 1),
            Step::South => (0, -1),
            Step::East => (1, 0),
            Step::West => (-1, 0),
        }
    }

    pub fn from_delta(delta: (i64, i64)) -> Option<Step> {
        Step::ALL.iter().copied().find(|step| step.delta() == delta)
    }
}

/// Supplies the moves of a walker. A source that runs dry ends the walk.
pub trait MoveSource {
    fn next_move(&mut self) -> Option<Step>;
}

/// Uniformly random moves.
pub struct RandomMoves<R>(pub R);

impl<R: Rng> MoveSource for RandomMoves<R> {
    fn next_move(&mut self) -> Option<Step> {
        Step::ALL.choose(&mut self.0).copied()
    }
}

/// A fixed sequence of moves.
pub struct ScriptedMoves {
    steps: std::vec::IntoIter<Step>,
}

impl ScriptedMoves {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> ScriptedMoves {
        ScriptedMoves {
            steps: steps.into_iter().collect::<Vec<_>>().into_iter(),
        }
    }
}

impl MoveSource for ScriptedMoves {
    fn next_move(&mut self) -> Option<Step> {
        self.steps.next()
    }
}

/// What became of a single walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkerOutcome {
    /// Stuck next to the aggregate, which grew by `cell`.
    Stuck { cell: Cell, steps: usize },
    /// Stepped onto a cell already in the aggregate; nothing grew.
    Absorbed { cell: Cell, steps: usize },
    /// Ran out of steps at `last`.
    Exhausted { last: Cell },
}

/// Totals over a batch of walkers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub seed: u64,
    pub walkers: usize,
    pub stuck: usize,
    pub absorbed: usize,
    pub exhausted: usize,
    pub aggregate_size: usize,
    pub radius: f64,
}

impl RunSummary {
    fn record(&mut self, outcome: &WalkerOutcome) {
        self.walkers += 1;
        match outcome {
            WalkerOutcome::Stuck { .. } => self.stuck += 1,
            WalkerOutcome::Absorbed { .. } => self.absorbed += 1,
            WalkerOutcome::Exhausted { .. } => self.exhausted += 1,
        }
    }
}

/// The occupancy grid and the aggregate, always kept in step.
pub struct Cluster {
    size: usize,
    grid: Array<bool, Ix2>,
    members: HashSet<Cell>,
    order: Vec<Cell>,
}

impl Cluster {
    // Empty grid with a single seed in the centre
    pub fn init(size: usize) -> Result<Cluster, DlaError> {
        check_grid_size(size)?;
        let mut cluster = Cluster {
            size,
            grid: Array::from_elem((size, size), false),
            members: HashSet::new(),
            order: Vec::new(),
        };
        let centre = (size / 2) as i64;
        cluster.insert(Cell::new(centre, centre));
        Ok(cluster)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn grid(&self) -> &Array<bool, Ix2> {
        &self.grid
    }

    pub fn seed_cell(&self) -> Cell {
        self.order[0]
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.members.contains(&cell)
    }

    /// Aggregate cells in the order they stuck, seed first.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.order.iter().copied()
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        let size = self.size as i64;
        (0..size).contains(&cell.x) && (0..size).contains(&cell.y)
    }

    pub fn occupied(&self, cell: Cell) -> bool {
        self.in_bounds(cell) && self.grid[(cell.x as usize, cell.y as usize)]
    }

    /// Largest distance of an aggregate cell from the seed.
    pub fn radius(&self) -> f64 {
        let seed = self.seed_cell().point();
        self.order
            .iter()
            .map(|cell| cell.point().euclidean_distance(&seed))
            .fold(0.0, f64::max)
    }

    /// True when grid occupancy and aggregate membership agree everywhere.
    pub fn is_consistent(&self) -> bool {
        let occupied = self.grid.iter().filter(|&&cell| cell).count();
        occupied == self.members.len()
            && self.members.len() == self.order.len()
            && self.order.iter().all(|&cell| self.occupied(cell))
    }

    fn touches(&self, cell: Cell, adjacency: Adjacency) -> bool {
        match adjacency {
            Adjacency::GridLookup => cell
                .neighbourhood()
                .iter()
                .any(|&neighbour| self.occupied(neighbour)),
            Adjacency::LinearScan => self.order.iter().any(|&member| cell.touches(member)),
        }
    }

    // Returns false when the cell was already part of the aggregate.
    fn insert(&mut self, cell: Cell) -> bool {
        if !self.members.insert(cell) {
            return false;
        }
        self.grid[(cell.x as usize, cell.y as usize)] = true;
        self.order.push(cell);
        true
    }

    /// Walk from `start` for at most `max_steps` moves.
    ///
    /// The start cell itself is never tested, only the cells the walker
    /// moves onto.
    pub fn release<M: MoveSource + ?Sized>(
        &mut self,
        start: Cell,
        max_steps: usize,
        adjacency: Adjacency,
        moves: &mut M,
    ) -> WalkerOutcome {
        let mut position = start;
        for steps in 1..=max_steps {
            let step = match moves.next_move() {
                Some(step) => step,
                None => break,
            };
            position = position.offset(step);
            if !self.in_bounds(position) || !self.touches(position, adjacency) {
                continue;
            }
            return if self.insert(position) {
                WalkerOutcome::Stuck {
                    cell: position,
                    steps,
                }
            } else {
                WalkerOutcome::Absorbed {
                    cell: position,
                    steps,
                }
            };
        }
        WalkerOutcome::Exhausted { last: position }
    }
}

/// Owns a cluster and the random source driving its walkers.
pub struct AggregationSimulator {
    cluster: Cluster,
    adjacency: Adjacency,
    seed: u64,
    rng: StdRng,
}

impl AggregationSimulator {
    pub fn init(config: &SimulationConfig) -> Result<AggregationSimulator, DlaError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        Ok(AggregationSimulator {
            cluster: Cluster::init(config.grid_size)?,
            adjacency: config.adjacency,
            seed,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Seed of the random source, for replaying a run.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn adjacency(&self) -> Adjacency {
        self.adjacency
    }

    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    /// Uniform spawn point anywhere on the grid, occupied or not.
    pub fn spawn_point(&mut self) -> Cell {
        let size = self.cluster.size as i64;
        Cell::new(self.rng.gen_range(0..size), self.rng.gen_range(0..size))
    }

    pub fn release_walker<M: MoveSource + ?Sized>(
        &mut self,
        start: Cell,
        max_steps: usize,
        moves: &mut M,
    ) -> WalkerOutcome {
        self.cluster.release(start, max_steps, self.adjacency, moves)
    }

    pub fn run(&mut self, num_walkers: usize, max_steps: usize) -> RunSummary {
        match self.run_with(num_walkers, max_steps, |_, _, _| Ok::<(), Infallible>(())) {
            Ok(summary) => summary,
            Err(never) => match never {},
        }
    }

    /// Release walkers one after another, handing every outcome to `observer`.
    ///
    /// An observer error stops the run.
    pub fn run_with<E, F>(
        &mut self,
        num_walkers: usize,
        max_steps: usize,
        mut observer: F,
    ) -> Result<RunSummary, E>
    where
        F: FnMut(usize, &WalkerOutcome, &Cluster) -> Result<(), E>,
    {
        debug!(
            walkers = num_walkers,
            max_steps,
            seed = self.seed,
            "releasing walkers"
        );
        let mut summary = RunSummary {
            seed: self.seed,
            walkers: 0,
            stuck: 0,
            absorbed: 0,
            exhausted: 0,
            aggregate_size: 0,
            radius: 0.0,
        };
        for index in 0..num_walkers {
            let start = self.spawn_point();
            let mut moves = RandomMoves(&mut self.rng);
            let outcome = self
                .cluster
                .release(start, max_steps, self.adjacency, &mut moves);
            trace!(walker = index, ?start, ?outcome, "walker finished");
            summary.record(&outcome);
            observer(index, &outcome, &self.cluster)?;
        }
        summary.aggregate_size = self.cluster.len();
        summary.radius = self.cluster.radius();
        Ok(summary)
    }
}
