//! Per-destination hop-distance precomputation (spec §4.5).
//!
//! For each distinct end region appearing in the connection set, BFS the
//! region-adjacency graph (regions adjacent iff a port straddles them) and
//! record, for every port, the minimum hop distance from either of its two
//! adjacent regions. Reuses [`crate::graph::Graph::bfs_all_distances`],
//! generalized from this crate's road-network Dijkstra to cover every node
//! from one source in a single pass.

use std::collections::{HashMap, HashSet};

use crate::graph::{Edge, Graph as AdjGraph};
use crate::region_graph::{Connection, Graph, PortId, RegionId};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
struct RegionAdjEdge(RegionId, RegionId);

impl Edge<RegionId> for RegionAdjEdge {
	fn p1(&self) -> RegionId {
		self.0
	}
	fn p2(&self) -> RegionId {
		self.1
	}
}

/// Per-destination-region hop tables, keyed `destination -> region -> hops`.
pub struct HeuristicTables {
	by_destination: HashMap<RegionId, HashMap<RegionId, u32>>,
}

impl HeuristicTables {
	/// Hop distance from `region` to `destination`, if reachable.
	pub fn region_distance(&self, destination: RegionId, region: RegionId) -> Option<u32> {
		self.by_destination.get(&destination).and_then(|t| t.get(&region)).copied()
	}

	/// Hop distance from a port to `destination`: the minimum over the
	/// port's two adjacent regions.
	pub fn port_distance(&self, destination: RegionId, region_a: RegionId, region_b: RegionId) -> Option<u32> {
		match (self.region_distance(destination, region_a), self.region_distance(destination, region_b)) {
			(Some(a), Some(b)) => Some(a.min(b)),
			(Some(a), None) => Some(a),
			(None, Some(b)) => Some(b),
			(None, None) => None,
		}
	}
}

/// Builds the region-adjacency graph and precomputes hop tables for every
/// distinct end region in `connections`, also filling each port's
/// `heuristics` map in `graph` for O(1) lookups during search.
pub fn precompute(graph: &mut Graph, connections: &[Connection]) -> HeuristicTables {
	let mut adj: AdjGraph<RegionId, (), RegionAdjEdge> = AdjGraph::default();
	for r in graph.region_ids() {
		adj.add_node(r, ());
	}
	for p in graph.port_ids() {
		let port = graph.port(p).unwrap();
		adj.add_edge(RegionAdjEdge(port.region_a, port.region_b));
	}

	let destinations: HashSet<RegionId> = connections.iter().map(|c| c.end_region).collect();
	let mut by_destination = HashMap::new();
	for dest in destinations {
		by_destination.insert(dest, adj.bfs_all_distances(dest));
	}
	let tables = HeuristicTables { by_destination };

	let port_ids: Vec<PortId> = graph.port_ids().collect();
	for pid in port_ids {
		let (region_a, region_b) = {
			let p = graph.port(pid).unwrap();
			(p.region_a, p.region_b)
		};
		let mut per_dest = HashMap::new();
		for dest in tables.by_destination.keys().copied() {
			if let Some(d) = tables.port_distance(dest, region_a, region_b) {
				per_dest.insert(dest, d);
			}
		}
		if let Some(p) = graph.port_mut(pid) {
			p.heuristics = per_dest;
		}
	}
	tables
}
