//! Serialization round-trip over a generated footprint graph: structural
//! equality of regions/ports/adjacency, and identical heuristic tables
//! computed independently before and after the round trip.

use jumper_router::generator::{generate_grid, GridParameters};
use jumper_router::heuristic;
use jumper_router::region_graph::{Connection, ConnectionId, Graph, NetworkId, RegionId};

#[test]
fn deserialize_serialize_deserialize_preserves_structure_and_heuristics() {
	let params = GridParameters { cols: 2, rows: 1, ..Default::default() };
	let original = generate_grid(&params);

	let conns = vec![Connection { id: ConnectionId(0), network: NetworkId(0), start_region: RegionId(0), end_region: RegionId(1) }];

	let mut before = original.clone();
	let heuristics_before = heuristic::precompute(&mut before, &conns);
	let serialized_first = before.to_serialized();

	let mut round_tripped = Graph::from_serialized(&serialized_first).expect("round trip of a freshly generated graph must not be malformed");
	let heuristics_after = heuristic::precompute(&mut round_tripped, &conns);
	let serialized_second = round_tripped.to_serialized();

	assert_eq!(serialized_first, serialized_second, "serialize -> deserialize -> serialize must be idempotent");
	assert_eq!(before.region_count(), round_tripped.region_count());
	assert_eq!(before.port_count(), round_tripped.port_count());

	for region_id in before.region_ids() {
		assert_eq!(before.region(region_id).unwrap().ports, round_tripped.region(region_id).unwrap().ports, "region {:?} port order must survive the round trip", region_id);
	}

	for port_id in before.port_ids() {
		let (ra, rb) = {
			let p = before.port(port_id).unwrap();
			(p.region_a, p.region_b)
		};
		assert_eq!(
			heuristics_before.port_distance(RegionId(1), ra, rb),
			heuristics_after.port_distance(RegionId(1), ra, rb),
			"port {:?} heuristic distance must match after the round trip",
			port_id
		);
	}
}

#[test]
fn a_dangling_region_reference_is_rejected_at_construction() {
	use jumper_router::region_graph::{PortId, SerializedGraph, SerializedPort, SerializedRegion};
	use jumper_router::RouterError;

	let malformed = SerializedGraph {
		ports: vec![SerializedPort { port_id: PortId(0), region1_id: RegionId(0), region2_id: RegionId(99), d: (0.0, 0.0) }],
		regions: vec![SerializedRegion { region_id: RegionId(0), point_ids: vec![], d: None }],
	};
	assert!(matches!(Graph::from_serialized(&malformed), Err(RouterError::MalformedGraph { .. })));
}
