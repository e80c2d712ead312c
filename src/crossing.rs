//! The region crossing predicate (spec §4.4): how many *different-net*
//! assignments already in a region would be crossed by a candidate port
//! pair, and which assignments those are (for rip-up).

use crate::geometry::chords_cross;
use crate::region_graph::{Assignment, NetworkId, PortId, Region};

/// Result of checking a candidate port pair against a region's current
/// assignments.
pub struct CrossingResult {
	pub count: usize,
	pub offending: Vec<Assignment>,
}

/// Maps a port to its position on the region's ordered boundary parameter.
///
/// If the region has axis-aligned bounds, the port's geometric position
/// (resolved through `port_pos`) is projected onto the perimeter-t mapping
/// (spec §4.3). Otherwise the port's index in the region's construction-order
/// port list is used directly as a cyclic parameter - the same topological
/// rule, over the ordered cyclic sequence of ports around the region.
fn boundary_param(region: &Region, port: PortId, port_pos: &impl Fn(PortId) -> (f64, f64)) -> (f64, f64) {
	if let Some(bounds) = region.bounds {
		(bounds.perimeter_t(port_pos(port)), bounds.perimeter())
	} else {
		let idx = region.ports.iter().position(|p| *p == port).unwrap_or(0);
		(idx as f64, region.ports.len().max(1) as f64)
	}
}

/// Checks a candidate pair `(p, q)` through `region` against its current
/// assignments, excluding same-network assignments (a net may overlap
/// itself freely). `port_pos` resolves a port id to its geometric position,
/// used only when the region carries axis-aligned bounds.
pub fn check_crossing(
	region: &Region,
	p: PortId,
	q: PortId,
	network: NetworkId,
	port_pos: impl Fn(PortId) -> (f64, f64),
) -> CrossingResult {
	let (pt, period) = boundary_param(region, p, &port_pos);
	let (qt, _) = boundary_param(region, q, &port_pos);
	let mut offending = Vec::new();
	for a in &region.assignments {
		if a.network == network {
			continue;
		}
		let (at, _) = boundary_param(region, a.port_a, &port_pos);
		let (bt, _) = boundary_param(region, a.port_b, &port_pos);
		if chords_cross(pt, qt, at, bt, period) {
			offending.push(*a);
		}
	}
	CrossingResult { count: offending.len(), offending }
}
