//! The A*-with-rip-up-and-reroute engine (spec §4.6).
//!
//! Single-threaded and synchronous: [`Engine::step`] pops one candidate and
//! either finalizes a route or expands it, one atomic unit at a time, so a
//! caller can chunk a long solve by stepping externally and polling
//! [`Engine::iterations`] - the only supported cancellation is to simply
//! stop calling `step`.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};

use itertools::Itertools;
use noisy_float::prelude::{n64, N64};

use crate::error::RouterError;
use crate::geometry::euclidean_distance;
use crate::heuristic;
use crate::policy::{ConnectionOrder, JumperPolicy, SolverParameters, SolverPolicy};
use crate::region_graph::{Assignment, Connection, ConnectionId, Graph, PortId, RegionId, RouteId, RouteStep, SolvedRoute};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EngineState {
	Idle,
	Searching,
	Installing,
	Done,
	Failed,
}

/// A search-frontier node: current port, parent link, and the A* scores.
#[derive(Clone, Copy, Debug)]
struct SearchNode {
	port: PortId,
	parent: Option<usize>,
	last_region: Option<RegionId>,
	last_port: Option<PortId>,
	next_region: RegionId,
	hops: u32,
	g: N64,
	h: N64,
	f: N64,
	rip_required: bool,
}

#[derive(Clone, Copy, Debug)]
struct HeapEntry {
	f: N64,
	seq: u64,
	node: usize,
}

impl PartialEq for HeapEntry {
	fn eq(&self, other: &Self) -> bool {
		self.f == other.f && self.seq == other.seq
	}
}
impl Eq for HeapEntry {}
impl Ord for HeapEntry {
	fn cmp(&self, other: &Self) -> Ordering {
		// Reversed so BinaryHeap (a max-heap) pops the smallest f first,
		// ties broken by insertion order (smallest seq first) - stable FIFO
		// among equal keys, per spec §4.2/§9.
		other.f.cmp(&self.f).then_with(|| other.seq.cmp(&self.seq))
	}
}
impl PartialOrd for HeapEntry {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

pub struct Engine {
	graph: Graph,
	policy: Box<dyn SolverPolicy>,
	pending: VecDeque<Connection>,
	all_connections: HashMap<ConnectionId, Connection>,
	initial_connection_count: u64,

	pub solved_routes: Vec<SolvedRoute>,
	next_route_id: u32,

	state: EngineState,
	pub iterations: u64,
	pub error: Option<RouterError>,
	current_connection: Option<Connection>,

	/// Fixed at construction from the initial connection set; composes the
	/// iteration budget (`max_iterations`) and must never change during a
	/// solve, or the "absolute" step budget stops being absolute.
	total_crossings: u64,

	nodes: Vec<SearchNode>,
	open: std::collections::BinaryHeap<HeapEntry>,
	visited: HashMap<PortId, N64>,
	seq_counter: u64,

	route_hook: Option<Box<dyn FnMut(&SolvedRoute)>>,
}

impl Engine {
	pub fn new(graph: Graph, mut connections: Vec<Connection>, policy: Box<dyn SolverPolicy>) -> Self {
		match policy.parameters().connection_order {
			ConnectionOrder::Input => {}
			ConnectionOrder::NearFirst => connections.sort_by_key(|c| connection_span(&graph, c)),
			ConnectionOrder::FarFirst => {
				connections.sort_by_key(|c| connection_span(&graph, c));
				connections.reverse();
			}
		}
		let initial_connection_count = connections.len() as u64;
		let total_crossings = initial_crossing_estimate(&connections);
		let all_connections = connections.iter().map(|c| (c.id, *c)).collect();
		Self {
			graph,
			policy,
			pending: connections.into(),
			all_connections,
			initial_connection_count,
			solved_routes: Vec::new(),
			next_route_id: 0,
			state: EngineState::Idle,
			iterations: 0,
			error: None,
			current_connection: None,
			total_crossings,
			nodes: Vec::new(),
			open: std::collections::BinaryHeap::new(),
			visited: HashMap::new(),
			seq_counter: 0,
			route_hook: None,
		}
	}

	pub fn set_route_solved_hook(&mut self, hook: Box<dyn FnMut(&SolvedRoute)>) {
		self.route_hook = Some(hook);
	}

	pub fn state(&self) -> EngineState {
		self.state
	}

	pub fn solved(&self) -> bool {
		self.state == EngineState::Done
	}

	pub fn failed(&self) -> bool {
		self.state == EngineState::Failed
	}

	pub fn graph(&self) -> &Graph {
		&self.graph
	}

	pub fn current_connection(&self) -> Option<Connection> {
		self.current_connection
	}

	fn max_iterations(&self) -> u64 {
		let p = self.policy.parameters();
		p.base_max_iterations
			+ p.additional_max_iterations_per_connection * self.initial_connection_count
			+ p.additional_max_iterations_per_crossing * self.total_crossings
	}

	/// Advances the engine by one atomic unit: pops the next connection off
	/// the queue (Idle), or pops one candidate and finalizes/expands
	/// (Searching). No-op once `Done` or `Failed`.
	pub fn step(&mut self) {
		match self.state {
			EngineState::Done | EngineState::Failed => {}
			EngineState::Idle => self.begin_next_connection(),
			EngineState::Installing => unreachable!("Installing is resolved synchronously within finalize()"),
			EngineState::Searching => self.search_step(),
		}
	}

	pub fn solve(&mut self) {
		while !matches!(self.state, EngineState::Done | EngineState::Failed) {
			self.step();
		}
	}

	fn begin_next_connection(&mut self) {
		let conn = match self.pending.pop_front() {
			Some(c) => c,
			None => {
				self.state = EngineState::Done;
				return;
			}
		};
		log::debug!("starting connection {:?} (net {:?})", conn.id, conn.network);
		self.current_connection = Some(conn);
		self.nodes.clear();
		self.open.clear();
		self.visited.clear();
		self.seq_counter = 0;

		let start_ports: Vec<PortId> = self.graph.region(conn.start_region).map(|r| r.ports.clone()).unwrap_or_default();
		for port_id in start_ports {
			let port = match self.graph.port(port_id) {
				Some(p) => p,
				None => continue,
			};
			let next_region = port.other_region(conn.start_region);
			let idx = self.nodes.len();
			self.nodes.push(SearchNode {
				port: port_id,
				parent: None,
				last_region: None,
				last_port: None,
				next_region,
				hops: 0,
				g: n64(0.0),
				h: n64(0.0),
				f: n64(0.0),
				rip_required: false,
			});
			self.push_open(idx);
		}
		self.state = EngineState::Searching;
	}

	fn push_open(&mut self, node: usize) {
		let seq = self.seq_counter;
		self.seq_counter += 1;
		self.open.push(HeapEntry { f: self.nodes[node].f, seq, node });
	}

	fn search_step(&mut self) {
		self.iterations += 1;
		let conn = self.current_connection.expect("searching without a current connection");
		if self.iterations > self.max_iterations() {
			log::warn!("budget exhausted on connection {:?} after {} iterations", conn.id, self.iterations);
			self.error = Some(RouterError::BudgetExhausted { connection: conn.id, iterations: self.iterations });
			self.state = EngineState::Failed;
			return;
		}

		let popped = loop {
			match self.open.pop() {
				None => break None,
				Some(entry) => {
					let node = &self.nodes[entry.node];
					let better_known = self.visited.get(&node.port).map_or(false, |best| *best <= node.g);
					if better_known {
						continue;
					}
					self.visited.insert(node.port, node.g);
					break Some(entry.node);
				}
			}
		};

		let node_idx = match popped {
			Some(idx) => idx,
			None => {
				log::debug!("no route found for connection {:?}", conn.id);
				self.error = Some(RouterError::NoRouteFound { connection: conn.id });
				self.state = EngineState::Failed;
				return;
			}
		};

		if self.nodes[node_idx].next_region == conn.end_region {
			self.finalize(node_idx);
			return;
		}

		self.expand(node_idx);
	}

	fn expand(&mut self, node_idx: usize) {
		let conn = self.current_connection.unwrap();
		let node = self.nodes[node_idx];
		let region_ports: Vec<PortId> = self.graph.region(node.next_region).map(|r| r.ports.clone()).unwrap_or_default();

		let mut children = Vec::new();
		for p2 in region_ports {
			if p2 == node.port {
				continue;
			}
			let (region_a, region_b, p2_pos) = match self.graph.port(p2) {
				Some(p) => (p.region_a, p.region_b, p.position),
				None => continue,
			};
			let next_region2 = if node.next_region == region_a { region_b } else { region_a };
			let rip_required = self.policy.rip_required_for(&self.graph, p2, conn.network);
			if rip_required && !self.policy.parameters().ripping_enabled {
				continue;
			}

			let (crossing_cost, _crossing_count) = self.policy.increased_region_cost(&self.graph, node.next_region, node.port, p2, conn.network);
			let rip_cost = if rip_required { self.policy.parameters().rip_cost } else { n64(0.0) };
			let usage_rip_count = self.graph.port(p2).map(|p| p.rip_count).unwrap_or(0);
			let usage_penalty = self.policy.port_usage_penalty(usage_rip_count);
			let g = node.g + crossing_cost + rip_cost + usage_penalty;

			let end_pos = self.graph.region(conn.end_region).and_then(|r| r.center());
			let h = self.policy.estimate_cost_to_end(p2, region_a, region_b, p2_pos, conn.end_region, end_pos);
			let f = g + self.policy.parameters().greedy_multiplier * h;

			children.push(SearchNode {
				port: p2,
				parent: Some(node_idx),
				last_region: Some(node.next_region),
				last_port: Some(node.port),
				next_region: next_region2,
				hops: node.hops + 1,
				g,
				h,
				f,
				rip_required,
			});
		}

		// Group by entering region for visibility into branching factor; the
		// region-entry selector is a pass-through (all groups kept in full).
		let by_entering_region = children.iter().enumerate().map(|(i, c)| (c.next_region, i)).into_group_map();
		log::trace!("expanded {} children across {} entering regions", children.len(), by_entering_region.len());
		for child in children {
			let idx = self.nodes.len();
			self.nodes.push(child);
			self.push_open(idx);
		}
	}

	/// Walks the parent chain into a path, collects and rips conflicting
	/// routes, installs the new one, and advances to the next connection.
	fn finalize(&mut self, goal_idx: usize) {
		self.state = EngineState::Installing;
		let conn = self.current_connection.unwrap();

		let mut chain = Vec::new();
		let mut cur = Some(goal_idx);
		while let Some(idx) = cur {
			chain.push(idx);
			cur = self.nodes[idx].parent;
		}
		chain.reverse();

		let path: Vec<RouteStep> = chain
			.iter()
			.map(|&idx| {
				let n = self.nodes[idx];
				RouteStep { port: n.port, via_region: n.last_region }
			})
			.collect();

		// (a) ports along the path whose existing assignment is a different net.
		let mut to_rip: HashSet<RouteId> = HashSet::new();
		for step in &path {
			if let Some(port) = self.graph.port(step.port) {
				if let Some(a) = port.assignment {
					if a.network != conn.network {
						if let Some(route) = self.solved_routes.iter().find(|r| r.connection == a.connection) {
							to_rip.insert(route.id);
						}
					}
				}
			}
		}
		// (b) for every consecutive pair, the region crossing predicate's offenders.
		for w in path.windows(2) {
			let (prev, cur_step) = (w[0], w[1]);
			let region = match cur_step.via_region {
				Some(r) => r,
				None => continue,
			};
			let (_, offenders) = {
				let result = {
					let graph = &self.graph;
					crate::crossing::check_crossing(graph.region(region).unwrap(), prev.port, cur_step.port, conn.network, |pid| {
						graph.port(pid).map(|p| p.position).unwrap_or((0.0, 0.0))
					})
				};
				(result.count, result.offending)
			};
			for a in offenders {
				to_rip.insert(a.route);
			}
		}

		let required_rip = !to_rip.is_empty();
		let mut to_rip: Vec<RouteId> = to_rip.into_iter().collect();
		to_rip.sort();
		for route_id in &to_rip {
			if let Some(pos) = self.solved_routes.iter().position(|r| r.id == *route_id) {
				let route = self.solved_routes.remove(pos);
				log::debug!("ripping route {:?} of connection {:?}", route.id, route.connection);
				self.graph.rip_route(&route);
				if let Some(ripped_conn) = self.all_connections.get(&route.connection).copied() {
					self.pending.push_back(ripped_conn);
				}
			}
		}

		let route_id = RouteId(self.next_route_id);
		self.next_route_id += 1;
		for w in path.windows(2) {
			let (prev, cur_step) = (w[0], w[1]);
			if let Some(region) = cur_step.via_region {
				self.graph.install_assignment(Assignment {
					region,
					port_a: prev.port,
					port_b: cur_step.port,
					connection: conn.id,
					network: conn.network,
					route: route_id,
				});
			}
		}

		let route = SolvedRoute { id: route_id, connection: conn.id, path, required_rip };
		if let Some(hook) = self.route_hook.as_mut() {
			hook(&route);
		}
		log::info!("solved connection {:?} -> route {:?} (rip={})", conn.id, route.id, required_rip);
		self.solved_routes.push(route);

		self.current_connection = None;
		self.state = EngineState::Idle;
	}

}

/// A fixed stand-in for "how congested is this problem", computed once from
/// the connections the engine was constructed with: the number of distinct-
/// network pairs that share a start or end region, the regions where a
/// crossing is actually possible before any path is searched. Feeds
/// `additionalMaxIterationsPerCrossing`; must stay a pure function of the
/// initial input, never of search progress, or the iteration budget is no
/// longer an absolute bound.
fn initial_crossing_estimate(connections: &[Connection]) -> u64 {
	let mut count = 0u64;
	for i in 0..connections.len() {
		for j in (i + 1)..connections.len() {
			let (a, b) = (&connections[i], &connections[j]);
			if a.network == b.network {
				continue;
			}
			let shares_region = a.start_region == b.start_region || a.start_region == b.end_region || a.end_region == b.start_region || a.end_region == b.end_region;
			if shares_region {
				count += 1;
			}
		}
	}
	count
}

fn connection_span(graph: &Graph, c: &Connection) -> N64 {
	let a = graph.region(c.start_region).and_then(|r| r.center()).unwrap_or((0.0, 0.0));
	let b = graph.region(c.end_region).and_then(|r| r.center()).unwrap_or((0.0, 0.0));
	n64(euclidean_distance(a, b))
}

/// An older policy variant's whole-solver fallback (spec §4.6/§9): retries
/// the base solve with each of `perturbations` in turn until one succeeds,
/// adopting its final state; if every attempt fails, returns the last one's
/// state (so `solvedRoutes`/`error` remain inspectable). Disabled by
/// default - nothing in `Engine::solve` ever calls this; a caller opts in
/// explicitly.
pub fn solve_with_fallback(graph: &Graph, connections: &[Connection], base_params: SolverParameters, perturbations: &[SolverParameters]) -> Engine {
	let mut attempt = run_once(graph.clone(), connections.to_vec(), base_params);
	if attempt.solved() {
		return attempt;
	}
	for params in perturbations {
		attempt = run_once(graph.clone(), connections.to_vec(), *params);
		if attempt.solved() {
			return attempt;
		}
	}
	attempt
}

fn run_once(mut graph: Graph, connections: Vec<Connection>, params: SolverParameters) -> Engine {
	let heuristics = heuristic::precompute(&mut graph, &connections);
	let mut engine = Engine::new(graph, connections, Box::new(JumperPolicy::new(params, heuristics)));
	engine.solve();
	engine
}
