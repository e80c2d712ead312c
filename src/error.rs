//! Error kinds surfaced by graph construction and the A*-with-RRR engine.

use crate::region_graph::ConnectionId;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RouterError {
	/// Deserialization referenced a region/port id that doesn't exist.
	#[error("malformed graph: {detail}")]
	MalformedGraph { detail: String },

	/// The candidate queue drained before reaching the end region.
	#[error("no route found for connection {connection:?}")]
	NoRouteFound { connection: ConnectionId },

	/// The composed iteration budget was exceeded while solving a connection.
	#[error("budget exhausted solving connection {connection:?} after {iterations} iterations")]
	BudgetExhausted { connection: ConnectionId, iterations: u64 },

	/// The problem generator could not hit its target crossing count.
	#[error("problem generation failed: {detail}")]
	GenerationFailed { detail: String },
}

pub type Result<T> = std::result::Result<T, RouterError>;
