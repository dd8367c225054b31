use dla_simulations::{
    render_occupancy, Adjacency, AggregationSimulator, Cell, RenderOptions, ScriptedMoves,
    SimulationConfig, Step, WalkerOutcome,
};

fn simulator(config: SimulationConfig) -> AggregationSimulator {
    AggregationSimulator::init(&config).expect("valid config")
}

#[test]
fn default_run_keeps_cluster_invariants() {
    let config = SimulationConfig {
        seed: Some(2024),
        ..SimulationConfig::default()
    };
    let mut sim = simulator(config.clone());
    let summary = sim.run(config.num_walkers, config.max_steps);

    let cluster = sim.cluster();
    assert!(cluster.contains(Cell::new(50, 50)));
    assert!(cluster.len() <= config.num_walkers + 1);
    assert!(cluster.cells().all(|cell| cluster.in_bounds(cell)));
    assert!(cluster.is_consistent());
    assert_eq!(summary.aggregate_size, cluster.len());
    assert_eq!(summary.walkers, config.num_walkers);

    for ((x, y), &occupied) in cluster.grid().indexed_iter() {
        assert_eq!(occupied, cluster.contains(Cell::new(x as i64, y as i64)));
    }
}

#[test]
fn explicit_walkers_on_a_small_grid() {
    let mut sim = simulator(SimulationConfig {
        grid_size: 5,
        seed: Some(1),
        adjacency: Adjacency::LinearScan,
        ..SimulationConfig::default()
    });

    let onto_seed = sim.release_walker(
        Cell::new(2, 3),
        1,
        &mut ScriptedMoves::new(vec![Step::South]),
    );
    assert!(matches!(onto_seed, WalkerOutcome::Absorbed { .. }));

    let idle = sim.release_walker(Cell::new(0, 0), 0, &mut ScriptedMoves::new(Vec::<Step>::new()));
    assert_eq!(
        idle,
        WalkerOutcome::Exhausted {
            last: Cell::new(0, 0)
        }
    );

    let wanderer = sim.release_walker(
        Cell::new(4, 4),
        2,
        &mut ScriptedMoves::new(vec![Step::East, Step::North]),
    );
    assert_eq!(
        wanderer,
        WalkerOutcome::Exhausted {
            last: Cell::new(5, 5)
        }
    );

    assert_eq!(sim.cluster().cells().collect::<Vec<_>>(), vec![Cell::new(2, 2)]);
}

#[test]
fn replaying_a_seed_reproduces_the_image() {
    let config = SimulationConfig {
        grid_size: 60,
        num_walkers: 300,
        max_steps: 800,
        seed: Some(99),
        adjacency: Adjacency::GridLookup,
    };
    let mut first = simulator(config.clone());
    let mut second = simulator(config.clone());
    first.run(config.num_walkers, config.max_steps);
    second.run(config.num_walkers, config.max_steps);

    let options = RenderOptions {
        scale: 2,
        colour_by_age: true,
        mark_seed: true,
    };
    let a = first.cluster().image(&options).unwrap();
    let b = second.cluster().image(&options).unwrap();
    assert_eq!(a.dimensions(), (120, 120));
    assert_eq!(a.as_raw(), b.as_raw());

    let flat = render_occupancy(first.cluster().grid(), 1).unwrap();
    assert_eq!(flat.dimensions(), (60, 60));
}

#[test]
fn unseeded_simulator_reports_its_seed() {
    let mut sim = simulator(SimulationConfig {
        grid_size: 20,
        ..SimulationConfig::default()
    });
    let summary = sim.run(10, 50);
    assert_eq!(summary.seed, sim.seed());
}

#[test]
fn cluster_queries_through_the_simulator() {
    let mut sim = simulator(SimulationConfig {
        grid_size: 31,
        seed: Some(17),
        ..SimulationConfig::default()
    });
    assert_eq!(sim.seed(), 17);
    assert_eq!(sim.adjacency(), Adjacency::GridLookup);

    let start = sim.spawn_point();
    assert!(sim.cluster().in_bounds(start));

    sim.run(100, 300);
    let cluster = sim.cluster();
    assert_eq!(cluster.size(), 31);
    assert_eq!(cluster.seed_cell(), Cell::new(15, 15));
    assert_eq!(cluster.cells().next(), Some(cluster.seed_cell()));
    assert_eq!(cluster.cells().count(), cluster.len());
    assert!(cluster.cells().all(|cell| cluster.occupied(cell)));

    let img = cluster.image(&RenderOptions::default()).unwrap();
    assert_eq!(img.dimensions(), (31, 31));
}
