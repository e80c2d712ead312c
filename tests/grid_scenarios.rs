//! End-to-end scenarios driven through the actual footprint generator
//! (`jumper_router::generator`) rather than hand-built graphs, exercising the
//! same engine behavior `engine_scenarios.rs` proves by hand but over the
//! shape of graph the CLI's `generate`/`problem` subcommands actually produce.

use jumper_router::generator::{create_problem, generate_grid, GridParameters};
use jumper_router::heuristic;
use jumper_router::policy::{JumperPolicy, SolverParameters};
use jumper_router::region_graph::{Connection, ConnectionId, NetworkId, RegionId};
use jumper_router::{Engine, EngineState, RouterError};

#[test]
fn single_cell_grid_routes_between_two_frame_regions_via_their_shared_corner() {
	let mut g = generate_grid(&GridParameters { cols: 1, rows: 1, ..Default::default() });
	// Construction order: 1 pad, then the 4 frame sides N, E, S, W, then the
	// 4 corners - the N-E corner is the first of those four.
	let frame_n = RegionId(1);
	let frame_e = RegionId(2);
	let conns = vec![Connection { id: ConnectionId(0), network: NetworkId(0), start_region: frame_n, end_region: frame_e }];

	let heuristics = heuristic::precompute(&mut g, &conns);
	let mut engine = Engine::new(g, conns, Box::new(JumperPolicy::new(SolverParameters::default(), heuristics)));
	engine.solve();

	assert!(engine.solved(), "expected a successful solve, got {:?}", engine.error);
	assert_eq!(engine.solved_routes.len(), 1);
	let route = &engine.solved_routes[0];
	assert_eq!(route.path.len(), 2, "N and E meet through exactly one corner region");
	assert!(!route.required_rip);
}

#[test]
fn a_generated_two_by_two_problem_exhausts_an_impossibly_tight_budget() {
	let g = generate_grid(&GridParameters { cols: 2, rows: 2, ..Default::default() });
	let conns = create_problem(&g, 30, 7).expect("a 2x2 grid's perimeter can reach 30 crossings");

	let mut g = g;
	let heuristics = heuristic::precompute(&mut g, &conns);
	let params = SolverParameters { base_max_iterations: 1, additional_max_iterations_per_connection: 0, additional_max_iterations_per_crossing: 0, ..Default::default() };
	let mut engine = Engine::new(g, conns, Box::new(JumperPolicy::new(params, heuristics)));
	engine.solve();

	assert!(engine.failed());
	assert_eq!(engine.state(), EngineState::Failed);
	assert!(matches!(engine.error, Some(RouterError::BudgetExhausted { .. })));
}
