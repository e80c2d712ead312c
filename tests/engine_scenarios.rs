//! End-to-end engine scenarios: a direct route, independent parallel routes,
//! a route that forces a rip, and budget exhaustion.
//!
//! Each graph here is hand-built rather than produced by
//! [`jumper_router::generator`], the same way the smaller unit tests in
//! `crossing.rs`/`region_graph.rs` construct minimal graphs directly - full
//! control over topology makes the expected search outcome provable by hand
//! instead of merely plausible.

use jumper_router::heuristic;
use jumper_router::policy::{JumperPolicy, SolverParameters};
use jumper_router::region_graph::{Connection, ConnectionId, Graph, NetworkId, PortId, RegionId};
use jumper_router::{solve_with_fallback, Engine, EngineState, RouterError};

/// `Astart -- p0 --> Mid -- p1 --> Cend`: the minimal two-hop connection.
fn two_hop_graph() -> (Graph, Vec<Connection>) {
	let mut g = Graph::new();
	let (start, mid, end) = (RegionId(0), RegionId(1), RegionId(2));
	g.add_region(start, None);
	g.add_region(mid, None);
	g.add_region(end, None);
	g.add_port(PortId(0), mid, start, (0.0, 0.0));
	g.add_port(PortId(1), mid, end, (1.0, 0.0));
	let conns = vec![Connection { id: ConnectionId(0), network: NetworkId(0), start_region: start, end_region: end }];
	(g, conns)
}

fn engine_for(graph: Graph, conns: Vec<Connection>, params: SolverParameters) -> Engine {
	let mut graph = graph;
	let heuristics = heuristic::precompute(&mut graph, &conns);
	Engine::new(graph, conns, Box::new(JumperPolicy::new(params, heuristics)))
}

#[test]
fn direct_two_hop_connection_solves_with_a_two_candidate_route() {
	let (g, conns) = two_hop_graph();
	let mut engine = engine_for(g, conns, SolverParameters::default());
	engine.solve();

	assert!(engine.solved());
	assert_eq!(engine.solved_routes.len(), 1);
	let route = &engine.solved_routes[0];
	assert_eq!(route.path.len(), 2);
	assert!(!route.required_rip);
}

#[test]
fn three_independent_connections_through_a_shared_region_need_no_rips() {
	// A hub region with three non-interleaving port pairs: (0,1), (2,3), (4,5)
	// in cyclic order - adjacent, non-crossing chords, like nested parens.
	let mut g = Graph::new();
	let hub = RegionId(6);
	g.add_region(hub, None);
	let mut conns = Vec::new();
	for i in 0..3u32 {
		let (x, y) = (RegionId(i * 2), RegionId(i * 2 + 1));
		g.add_region(x, None);
		g.add_region(y, None);
		g.add_port(PortId(i * 2), hub, x, (0.0, 0.0));
		g.add_port(PortId(i * 2 + 1), hub, y, (0.0, 0.0));
		conns.push(Connection { id: ConnectionId(i), network: NetworkId(i), start_region: x, end_region: y });
	}

	let mut engine = engine_for(g, conns.clone(), SolverParameters::default());
	engine.solve();

	assert!(engine.solved());
	assert_eq!(engine.solved_routes.len(), conns.len());
	for conn in &conns {
		let route = engine.solved_routes.iter().find(|r| r.connection == conn.id).expect("every connection has a route");
		assert!(!route.required_rip);
	}
}

/// A hub region `R` with ports `p0..p4` in cyclic order: `p0`-A, `p1`-B,
/// `p2`-C, `p3`-D, `p4`-C (C has two parallel ports into R, an alternate
/// route so `A->C` is never permanently stuck). On a bare 4-port hub,
/// `(p0,p2)` and `(p1,p3)` always interleave with no alternative for either
/// side, so each connection would repeatedly rip the other forever; `p4`
/// breaks that by giving `A->C` a second way into `C` that, once `B->D`
/// settles onto `(p1,p3)`, no longer interleaves with it. The solve still
/// rips each connection's route more than once while the two fight over the
/// hub, but converges once both sides have tried every port once.
fn forced_rip_graph() -> (Graph, Vec<Connection>) {
	let mut g = Graph::new();
	let (a, b, c, d, r) = (RegionId(0), RegionId(1), RegionId(2), RegionId(3), RegionId(4));
	for region in [a, b, c, d, r] {
		g.add_region(region, None);
	}
	g.add_port(PortId(0), r, a, (0.0, 0.0));
	g.add_port(PortId(1), r, b, (0.0, 0.0));
	g.add_port(PortId(2), r, c, (0.0, 0.0));
	g.add_port(PortId(3), r, d, (0.0, 0.0));
	g.add_port(PortId(4), r, c, (0.0, 0.0));

	let conns = vec![
		Connection { id: ConnectionId(0), network: NetworkId(1), start_region: a, end_region: c },
		Connection { id: ConnectionId(1), network: NetworkId(2), start_region: b, end_region: d },
	];
	(g, conns)
}

#[test]
fn a_conflicting_second_connection_forces_a_rip_and_still_converges() {
	let (g, conns) = forced_rip_graph();
	let mut engine = engine_for(g, conns.clone(), SolverParameters::default());
	engine.solve();

	assert!(engine.solved(), "expected a successful solve, got {:?}", engine.error);
	assert_eq!(engine.solved_routes.len(), conns.len());
	assert!(engine.solved_routes.iter().any(|r| r.required_rip), "expected at least one route to have required a rip");
	for conn in &conns {
		assert_eq!(engine.solved_routes.iter().filter(|r| r.connection == conn.id).count(), 1);
	}
}

#[test]
fn an_impossibly_tight_budget_fails_with_budget_exhausted() {
	let (g, conns) = two_hop_graph();
	let params = SolverParameters { base_max_iterations: 1, additional_max_iterations_per_connection: 0, additional_max_iterations_per_crossing: 0, ..Default::default() };
	let mut engine = engine_for(g, conns, params);
	engine.solve();

	assert!(engine.failed());
	assert_eq!(engine.state(), EngineState::Failed);
	assert!(matches!(engine.error, Some(RouterError::BudgetExhausted { .. })));
}

#[test]
fn a_connection_with_no_path_fails_with_no_route_found() {
	let mut g = Graph::new();
	let (start, end) = (RegionId(0), RegionId(1));
	g.add_region(start, None);
	g.add_region(end, None);
	let conns = vec![Connection { id: ConnectionId(0), network: NetworkId(0), start_region: start, end_region: end }];
	let mut engine = engine_for(g, conns, SolverParameters::default());
	engine.solve();

	assert!(engine.failed());
	assert!(matches!(engine.error, Some(RouterError::NoRouteFound { .. })));
}

#[test]
fn fallback_adopts_the_first_perturbation_that_succeeds() {
	let (g, conns) = two_hop_graph();
	let starving = SolverParameters { base_max_iterations: 0, additional_max_iterations_per_connection: 0, additional_max_iterations_per_crossing: 0, ..Default::default() };
	let generous = SolverParameters::default();

	let engine = solve_with_fallback(&g, &conns, starving, &[starving, generous]);

	assert!(engine.solved(), "fallback should have recovered via the generous perturbation, got {:?}", engine.error);
	assert_eq!(engine.solved_routes.len(), 1);
}

#[test]
fn fallback_surfaces_the_last_attempt_when_every_perturbation_fails() {
	let mut g = Graph::new();
	let (start, end) = (RegionId(0), RegionId(1));
	g.add_region(start, None);
	g.add_region(end, None);
	let conns = vec![Connection { id: ConnectionId(0), network: NetworkId(0), start_region: start, end_region: end }];
	let unreachable = SolverParameters::default();

	let engine = solve_with_fallback(&g, &conns, unreachable, &[unreachable]);

	assert!(engine.failed());
	assert!(matches!(engine.error, Some(RouterError::NoRouteFound { .. })));
}

#[test]
fn repeated_solves_from_identical_input_are_byte_identical() {
	let (g1, conns1) = forced_rip_graph();
	let (g2, conns2) = forced_rip_graph();

	let mut e1 = engine_for(g1, conns1, SolverParameters::default());
	let mut e2 = engine_for(g2, conns2, SolverParameters::default());
	e1.solve();
	e2.solve();

	assert!(e1.solved() && e2.solved());
	let mut r1 = e1.solved_routes.clone();
	let mut r2 = e2.solved_routes.clone();
	r1.sort_by_key(|r| r.connection.0);
	r2.sort_by_key(|r| r.connection.0);
	assert_eq!(r1, r2);
}
