//! The id-keyed region/port hypergraph (spec §3, §4.1).
//!
//! Regions and ports are owned by a [`Graph`] arena and referenced by small
//! integer ids - the id-keyed re-expression of the live cross-pointer graph
//! the original router kept in memory, following the same "arena owns,
//! everything else references by id" shape this crate's generic
//! [`crate::graph::Graph`] already uses for road networks.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::RouterError;
use crate::geometry::Bounds;

macro_rules! id_type {
	($name:ident) => {
		#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
		pub struct $name(pub u32);
	};
}

id_type!(RegionId);
id_type!(PortId);
id_type!(ConnectionId);
id_type!(NetworkId);
id_type!(RouteId);

/// A region: a node of the routing hypergraph.
#[derive(Clone, Debug)]
pub struct Region {
	pub id: RegionId,
	/// Ports on this region's boundary, in construction order - expansion
	/// and the crossing predicate's cyclic fallback both depend on this
	/// order being stable and deterministic (spec §5 ordering guarantees).
	pub ports: Vec<PortId>,
	pub bounds: Option<Bounds>,
	/// Currently installed region-port-pair assignments.
	pub assignments: Vec<Assignment>,
}

impl Region {
	pub fn center(&self) -> Option<(f64, f64)> {
		self.bounds.map(|b| b.center())
	}
}

/// A port: the edge unit of the hypergraph, straddling exactly two regions.
#[derive(Clone, Debug)]
pub struct Port {
	pub id: PortId,
	pub region_a: RegionId,
	pub region_b: RegionId,
	pub position: (f64, f64),
	/// The connection and region currently routed through this port, if any.
	pub assignment: Option<PortAssignment>,
	pub rip_count: u32,
	/// Per-destination-region hop distance, filled in by [`crate::heuristic`].
	pub heuristics: HashMap<RegionId, u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortAssignment {
	pub connection: ConnectionId,
	pub network: NetworkId,
	pub region: RegionId,
	pub other_port: PortId,
}

impl Port {
	/// The region on the other side of this port from `from`.
	pub fn other_region(&self, from: RegionId) -> RegionId {
		if from == self.region_a {
			self.region_b
		} else {
			self.region_a
		}
	}
}

/// A required electrical link between two regions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Connection {
	pub id: ConnectionId,
	pub network: NetworkId,
	pub start_region: RegionId,
	pub end_region: RegionId,
}

/// A region-port-pair assignment: one route's visit of one region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Assignment {
	pub region: RegionId,
	pub port_a: PortId,
	pub port_b: PortId,
	pub connection: ConnectionId,
	pub network: NetworkId,
	pub route: RouteId,
}

/// One step of a solved route: the port reached, and the region traversed
/// to reach it from the previous step (`None` for the route's first port).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteStep {
	pub port: PortId,
	pub via_region: Option<RegionId>,
}

/// An installed, realized path for a connection.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SolvedRoute {
	pub id: RouteId,
	pub connection: ConnectionId,
	pub path: Vec<RouteStep>,
	pub required_rip: bool,
}

impl SolvedRoute {
	/// Regions traversed, in order, one per consecutive port pair.
	pub fn regions_traversed(&self) -> Vec<RegionId> {
		self.path.iter().skip(1).filter_map(|s| s.via_region).collect()
	}
}

/// The region/port arena plus the connection list.
#[derive(Clone, Debug, Default)]
pub struct Graph {
	regions: HashMap<RegionId, Region>,
	ports: HashMap<PortId, Port>,
	region_order: Vec<RegionId>,
	port_order: Vec<PortId>,
}

impl Graph {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_region(&mut self, id: RegionId, bounds: Option<Bounds>) {
		self.region_order.push(id);
		self.regions.insert(id, Region { id, ports: Vec::new(), bounds, assignments: Vec::new() });
	}

	pub fn add_port(&mut self, id: PortId, region_a: RegionId, region_b: RegionId, position: (f64, f64)) {
		self.port_order.push(id);
		self.ports.insert(
			id,
			Port {
				id,
				region_a,
				region_b,
				position,
				assignment: None,
				rip_count: 0,
				heuristics: HashMap::new(),
			},
		);
		if let Some(r) = self.regions.get_mut(&region_a) {
			r.ports.push(id);
		}
		if let Some(r) = self.regions.get_mut(&region_b) {
			r.ports.push(id);
		}
	}

	pub fn region(&self, id: RegionId) -> Option<&Region> {
		self.regions.get(&id)
	}

	pub fn region_mut(&mut self, id: RegionId) -> Option<&mut Region> {
		self.regions.get_mut(&id)
	}

	pub fn port(&self, id: PortId) -> Option<&Port> {
		self.ports.get(&id)
	}

	pub fn port_mut(&mut self, id: PortId) -> Option<&mut Port> {
		self.ports.get_mut(&id)
	}

	pub fn region_ids(&self) -> impl Iterator<Item = RegionId> + '_ {
		self.region_order.iter().copied()
	}

	pub fn port_ids(&self) -> impl Iterator<Item = PortId> + '_ {
		self.port_order.iter().copied()
	}

	pub fn region_count(&self) -> usize {
		self.regions.len()
	}

	pub fn port_count(&self) -> usize {
		self.ports.len()
	}

	/// Installs a region-port-pair assignment, mirroring it onto both ports.
	pub fn install_assignment(&mut self, a: Assignment) {
		if let Some(r) = self.regions.get_mut(&a.region) {
			r.assignments.push(a);
		}
		if let Some(p) = self.ports.get_mut(&a.port_a) {
			p.assignment = Some(PortAssignment { connection: a.connection, network: a.network, region: a.region, other_port: a.port_b });
		}
		if let Some(p) = self.ports.get_mut(&a.port_b) {
			p.assignment = Some(PortAssignment { connection: a.connection, network: a.network, region: a.region, other_port: a.port_a });
		}
	}

	/// Removes every assignment belonging to `route`, clearing port state
	/// and incrementing each freed port's rip counter.
	pub fn rip_route(&mut self, route: &SolvedRoute) {
		let regions: std::collections::HashSet<RegionId> = route.path.iter().filter_map(|s| s.via_region).collect();
		for region_id in regions {
			if let Some(r) = self.regions.get_mut(&region_id) {
				r.assignments.retain(|a| a.route != route.id);
			}
		}
		for step in &route.path {
			if let Some(p) = self.ports.get_mut(&step.port) {
				if p.assignment.map_or(false, |pa| pa.connection == route.connection) {
					p.assignment = None;
				}
				p.rip_count += 1;
			}
		}
	}
}

// ---------------------------------------------------------------------
// Serialization (spec §4.1 / §6)
// ---------------------------------------------------------------------

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SerializedPort {
	pub port_id: PortId,
	pub region1_id: RegionId,
	pub region2_id: RegionId,
	pub d: (f64, f64),
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SerializedRegion {
	pub region_id: RegionId,
	pub point_ids: Vec<PortId>,
	pub d: Option<Bounds>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SerializedGraph {
	pub ports: Vec<SerializedPort>,
	pub regions: Vec<SerializedRegion>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct SerializedConnection {
	pub connection_id: ConnectionId,
	pub start_region_id: RegionId,
	pub end_region_id: RegionId,
	pub mutually_connected_network_id: Option<NetworkId>,
}

impl Graph {
	/// Converts the live graph to its id-keyed serialized form. Total and
	/// lossless: regions are emitted in construction order with their
	/// ports in the same per-region order used during expansion.
	pub fn to_serialized(&self) -> SerializedGraph {
		SerializedGraph {
			ports: self
				.port_order
				.iter()
				.map(|id| {
					let p = &self.ports[id];
					SerializedPort { port_id: p.id, region1_id: p.region_a, region2_id: p.region_b, d: p.position }
				})
				.collect(),
			regions: self
				.region_order
				.iter()
				.map(|id| {
					let r = &self.regions[id];
					SerializedRegion { region_id: r.id, point_ids: r.ports.clone(), d: r.bounds }
				})
				.collect(),
		}
	}

	/// Deserializes a graph, failing with [`RouterError::MalformedGraph`] if
	/// any port references a region id absent from `regions`.
	pub fn from_serialized(s: &SerializedGraph) -> Result<Self, RouterError> {
		let mut g = Graph::new();
		let region_ids: std::collections::HashSet<RegionId> = s.regions.iter().map(|r| r.region_id).collect();
		for r in &s.regions {
			g.add_region(r.region_id, r.d);
		}
		for p in &s.ports {
			if !region_ids.contains(&p.region1_id) || !region_ids.contains(&p.region2_id) {
				return Err(RouterError::MalformedGraph {
					detail: format!("port {:?} references an unknown region", p.port_id),
				});
			}
			g.add_port(p.port_id, p.region1_id, p.region2_id, p.d);
		}
		// Re-derive each region's port order from the serialized point_ids,
		// rather than the insertion order add_port produced, so a graph
		// that lists its own ports in a specific boundary order round-trips
		// with that order preserved exactly.
		for sr in &s.regions {
			if let Some(r) = g.regions.get_mut(&sr.region_id) {
				for pid in &sr.point_ids {
					if !g.ports.contains_key(pid) {
						return Err(RouterError::MalformedGraph {
							detail: format!("region {:?} references unknown port {:?}", sr.region_id, pid),
						});
					}
				}
				r.ports = sr.point_ids.clone();
			}
		}
		Ok(g)
	}
}

impl Connection {
	pub fn to_serialized(&self, same_network_as_id: impl Fn(NetworkId) -> Option<NetworkId>) -> SerializedConnection {
		SerializedConnection {
			connection_id: self.id,
			start_region_id: self.start_region,
			end_region_id: self.end_region,
			mutually_connected_network_id: same_network_as_id(self.network),
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn sample() -> Graph {
		let mut g = Graph::new();
		g.add_region(RegionId(0), Some(Bounds::new(0.0, 0.0, 1.0, 1.0)));
		g.add_region(RegionId(1), Some(Bounds::new(1.0, 0.0, 2.0, 1.0)));
		g.add_port(PortId(0), RegionId(0), RegionId(1), (1.0, 0.5));
		g
	}

	#[test]
	fn port_other_region() {
		let g = sample();
		let p = g.port(PortId(0)).unwrap();
		assert_eq!(p.other_region(RegionId(0)), RegionId(1));
		assert_eq!(p.other_region(RegionId(1)), RegionId(0));
	}

	#[test]
	fn roundtrip_preserves_structure() {
		let g = sample();
		let s = g.to_serialized();
		let g2 = Graph::from_serialized(&s).unwrap();
		assert_eq!(g2.region_count(), g.region_count());
		assert_eq!(g2.port_count(), g.port_count());
		assert_eq!(g2.region(RegionId(0)).unwrap().ports, g.region(RegionId(0)).unwrap().ports);
	}

	#[test]
	fn deserialize_dangling_region_fails() {
		let s = SerializedGraph {
			ports: vec![SerializedPort { port_id: PortId(0), region1_id: RegionId(0), region2_id: RegionId(99), d: (0.0, 0.0) }],
			regions: vec![SerializedRegion { region_id: RegionId(0), point_ids: vec![], d: None }],
		};
		assert!(matches!(Graph::from_serialized(&s), Err(RouterError::MalformedGraph { .. })));
	}

	#[test]
	fn install_and_rip_round_trip() {
		let mut g = sample();
		let route = SolvedRoute {
			id: RouteId(0),
			connection: ConnectionId(0),
			path: vec![
				RouteStep { port: PortId(0), via_region: None },
			],
			required_rip: false,
		};
		g.install_assignment(Assignment {
			region: RegionId(0),
			port_a: PortId(0),
			port_b: PortId(0),
			connection: ConnectionId(0),
			network: NetworkId(0),
			route: RouteId(0),
		});
		assert!(g.port(PortId(0)).unwrap().assignment.is_some());
		g.rip_route(&route);
		assert_eq!(g.port(PortId(0)).unwrap().rip_count, 1);
	}
}
