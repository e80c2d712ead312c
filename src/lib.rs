//! A* rip-up-and-reroute solver for planar region-decomposed jumper-array
//! footprints.
//!
//! A connection is a required electrical link between two regions of a
//! hypergraph whose edges ("ports") each straddle exactly two regions. The
//! [`engine::Engine`] drains a list of [`region_graph::Connection`]s one at a
//! time, searching with A* over the port-adjacency graph; when two routes of
//! distinct networks would cross inside the same region, the losing route is
//! ripped up and its connection re-queued. [`generator`] builds synthetic
//! footprint graphs and connection sets for testing and benchmarking.

pub mod crossing;
pub mod engine;
pub mod error;
pub mod generator;
pub mod geometry;
pub mod graph;
pub mod heuristic;
pub mod policy;
pub mod region_graph;

pub use engine::{solve_with_fallback, Engine, EngineState};
pub use error::{Result, RouterError};
pub use policy::{ConnectionOrder, JumperPolicy, SolverParameters, SolverPolicy, UnitOfCost, ZeroCostPolicy};
pub use region_graph::{
	Assignment, Connection, ConnectionId, Graph, NetworkId, Port, PortAssignment, PortId, Region, RegionId, RouteId, RouteStep, SerializedConnection, SerializedGraph, SolvedRoute,
};
