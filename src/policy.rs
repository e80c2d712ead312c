//! The cost-model policy layer (spec §4.7): `SolverParameters` and the
//! `SolverPolicy` capability set the engine consults for heuristic,
//! port-usage penalty, region-crossing cost, and rip requirement.
//!
//! The base solver in the source material was specialized by subclassing
//! and overriding methods; here that's a trait object injected at
//! construction instead, the way this crate's other pluggable behaviors
//! (edge weight functions) are already passed as closures/trait bounds.

use noisy_float::prelude::{n64, N64};
use serde::{Deserialize, Serialize};

use crate::crossing::check_crossing;
use crate::geometry::euclidean_distance_n64;
use crate::heuristic::HeuristicTables;
use crate::region_graph::{Graph, NetworkId, PortId, RegionId};

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub enum UnitOfCost {
	Hops,
	Distance,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub enum ConnectionOrder {
	Input,
	NearFirst,
	FarFirst,
}

/// The tunable cost-model surface (spec §4.7).
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub struct SolverParameters {
	/// Multiplier on a port's rip count, discouraging reuse of congested ports.
	pub port_usage_penalty: N64,
	/// Multiplier on different-net crossings inside a region.
	pub crossing_penalty: N64,
	/// Additive cost of entering a conflicting (different-net) port.
	pub rip_cost: N64,
	/// Weight on the heuristic term; > 1 biases toward the goal at the cost
	/// of admissibility.
	pub greedy_multiplier: N64,
	pub base_max_iterations: u64,
	pub additional_max_iterations_per_connection: u64,
	pub additional_max_iterations_per_crossing: u64,
	pub ripping_enabled: bool,
	pub unit_of_cost: UnitOfCost,
	pub connection_order: ConnectionOrder,
}

impl Default for SolverParameters {
	fn default() -> Self {
		Self {
			port_usage_penalty: n64(1.0),
			crossing_penalty: n64(4.0),
			rip_cost: n64(2.0),
			greedy_multiplier: n64(1.0),
			base_max_iterations: 10_000,
			additional_max_iterations_per_connection: 500,
			additional_max_iterations_per_crossing: 50,
			ripping_enabled: true,
			unit_of_cost: UnitOfCost::Hops,
			connection_order: ConnectionOrder::Input,
		}
	}
}

/// The capability set a solver policy must provide. A default
/// (all-zero-cost) implementation and the jumper-specific implementation
/// are both just [`SolverParameters`] plus the precomputed hop tables;
/// kept as a trait so an alternate policy (e.g. a future testing stub)
/// can supply its own heuristic without touching the engine.
pub trait SolverPolicy {
	/// Admissible (or greedily-biased) estimated cost from `port` to `end`.
	fn estimate_cost_to_end(&self, port: PortId, region_a: RegionId, region_b: RegionId, port_pos: (f64, f64), end: RegionId, end_pos: Option<(f64, f64)>) -> N64;
	/// Penalty for (re-)using a port, based on its rip count.
	fn port_usage_penalty(&self, rip_count: u32) -> N64;
	/// Additional cost for traversing `region` via the pair `(p, q)`,
	/// from the number of different-net crossings it causes.
	fn increased_region_cost(&self, graph: &Graph, region: RegionId, p: PortId, q: PortId, network: NetworkId) -> (N64, usize);
	/// Whether entering `port` requires ripping an existing route.
	fn rip_required_for(&self, graph: &Graph, port: PortId, network: NetworkId) -> bool;
	fn parameters(&self) -> &SolverParameters;
}

pub struct JumperPolicy {
	pub params: SolverParameters,
	pub heuristics: HeuristicTables,
}

impl JumperPolicy {
	pub fn new(params: SolverParameters, heuristics: HeuristicTables) -> Self {
		Self { params, heuristics }
	}
}

impl SolverPolicy for JumperPolicy {
	fn estimate_cost_to_end(&self, _port: PortId, region_a: RegionId, region_b: RegionId, port_pos: (f64, f64), end: RegionId, end_pos: Option<(f64, f64)>) -> N64 {
		match self.params.unit_of_cost {
			UnitOfCost::Hops => self
				.heuristics
				.port_distance(end, region_a, region_b)
				.map(|h| n64(h as f64))
				.unwrap_or_else(|| n64(0.0)),
			UnitOfCost::Distance => end_pos.map(|e| euclidean_distance_n64(port_pos, e)).unwrap_or_else(|| n64(0.0)),
		}
	}

	fn port_usage_penalty(&self, rip_count: u32) -> N64 {
		self.params.port_usage_penalty * n64(rip_count as f64)
	}

	fn increased_region_cost(&self, graph: &Graph, region: RegionId, p: PortId, q: PortId, network: NetworkId) -> (N64, usize) {
		let r = match graph.region(region) {
			Some(r) => r,
			None => return (n64(0.0), 0),
		};
		let result = check_crossing(r, p, q, network, |pid| graph.port(pid).map(|port| port.position).unwrap_or((0.0, 0.0)));
		(self.params.crossing_penalty * n64(result.count as f64), result.count)
	}

	fn rip_required_for(&self, graph: &Graph, port: PortId, network: NetworkId) -> bool {
		graph.port(port).and_then(|p| p.assignment).map_or(false, |a| a.network != network)
	}

	fn parameters(&self) -> &SolverParameters {
		&self.params
	}
}

/// The base policy: every cost is zero, heuristic is always zero. Useful as
/// a baseline for comparing the jumper-specific policy's search quality.
pub struct ZeroCostPolicy {
	pub params: SolverParameters,
}

impl SolverPolicy for ZeroCostPolicy {
	fn estimate_cost_to_end(&self, _port: PortId, _region_a: RegionId, _region_b: RegionId, _port_pos: (f64, f64), _end: RegionId, _end_pos: Option<(f64, f64)>) -> N64 {
		n64(0.0)
	}

	fn port_usage_penalty(&self, _rip_count: u32) -> N64 {
		n64(0.0)
	}

	fn increased_region_cost(&self, _graph: &Graph, _region: RegionId, _p: PortId, _q: PortId, _network: NetworkId) -> (N64, usize) {
		(n64(0.0), 0)
	}

	fn rip_required_for(&self, graph: &Graph, port: PortId, network: NetworkId) -> bool {
		graph.port(port).and_then(|p| p.assignment).map_or(false, |a| a.network != network)
	}

	fn parameters(&self) -> &SolverParameters {
		&self.params
	}
}
