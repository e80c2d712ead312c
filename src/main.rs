//! # jumper-router
//!
//! CLI for solving jumper-array footprint routing problems, generating
//! synthetic footprint graphs, and placing synthetic connection sets.

use clap::{crate_version, App, Arg, SubCommand};

use jumper_router::generator::{self, GridParameters};
use jumper_router::policy::{JumperPolicy, SolverParameters};
use jumper_router::region_graph::{Connection, Graph, SerializedConnection, SerializedGraph};
use jumper_router::Engine;

fn main() -> std::io::Result<()> {
	env_logger::init_from_env(env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"));
	let matches = App::new("jumper-router")
		.version(crate_version!())
		.about("Route jumper-array footprints with A* and rip-up-and-reroute")
		.subcommand(
			SubCommand::with_name("solve")
				.about("Solve a routing problem")
				.arg(Arg::with_name("graph").takes_value(true).required(true).index(1).help("Footprint graph JSON"))
				.arg(Arg::with_name("connections").takes_value(true).required(true).index(2).help("Connections JSON"))
				.arg(Arg::with_name("parameters").takes_value(true).required(true).index(3).help("Solver parameters YAML"))
				.arg(Arg::with_name("output").takes_value(true).required(true).index(4).help("Solved routes output JSON")),
		)
		.subcommand(
			SubCommand::with_name("generate")
				.about("Generate a footprint graph")
				.arg(Arg::with_name("parameters").takes_value(true).required(true).index(1).help("Grid parameters YAML"))
				.arg(Arg::with_name("output").takes_value(true).required(true).index(2).help("Graph output JSON")),
		)
		.subcommand(
			SubCommand::with_name("problem")
				.about("Generate a connection set against a footprint graph")
				.arg(Arg::with_name("graph").takes_value(true).required(true).index(1).help("Footprint graph JSON"))
				.arg(Arg::with_name("crossings").takes_value(true).required(true).index(2).help("Target same-region crossing count"))
				.arg(Arg::with_name("seed").takes_value(true).required(true).index(3).help("LCG seed"))
				.arg(Arg::with_name("output").takes_value(true).required(true).index(4).help("Connections output JSON")),
		)
		.get_matches();

	log::info!("Loading...");
	if let Some(matches) = matches.subcommand_matches("solve") {
		log::trace!("tracing enabled");
		let serialized: SerializedGraph = serde_json::from_reader(&std::fs::File::open(matches.value_of("graph").unwrap())?).expect("graph invalid JSON");
		let graph = Graph::from_serialized(&serialized).expect("malformed graph");
		let serialized_conns: Vec<SerializedConnection> = serde_json::from_reader(&std::fs::File::open(matches.value_of("connections").unwrap())?).expect("connections invalid JSON");
		let connections: Vec<Connection> = serialized_conns
			.into_iter()
			.map(|c| Connection {
				id: c.connection_id,
				network: c.mutually_connected_network_id.unwrap_or(jumper_router::region_graph::NetworkId(c.connection_id.0)),
				start_region: c.start_region_id,
				end_region: c.end_region_id,
			})
			.collect();
		let params: SolverParameters = serde_yaml::from_reader(&std::fs::File::open(matches.value_of("parameters").unwrap())?).expect("parameters invalid YAML");
		log::info!("loaded {} regions, {} connections", graph.region_count(), connections.len());

		let mut graph = graph;
		let heuristics = jumper_router::heuristic::precompute(&mut graph, &connections);
		let policy = Box::new(JumperPolicy::new(params, heuristics));
		let mut engine = Engine::new(graph, connections, policy);
		engine.solve();

		if engine.failed() {
			log::warn!("solve failed: {:?}", engine.error);
		} else {
			log::info!("solved {} routes in {} iterations", engine.solved_routes.len(), engine.iterations);
		}
		serde_json::to_writer(&std::fs::File::create(matches.value_of("output").unwrap())?, &engine.solved_routes).unwrap();
	} else if let Some(matches) = matches.subcommand_matches("generate") {
		let params: GridParameters = serde_yaml::from_reader(&std::fs::File::open(matches.value_of("parameters").unwrap())?).expect("grid parameters invalid YAML");
		log::info!("loaded grid parameters");
		let graph = generator::generate_grid(&params);
		log::info!("generated {} regions, {} ports", graph.region_count(), graph.port_count());
		serde_json::to_writer(&std::fs::File::create(matches.value_of("output").unwrap())?, &graph.to_serialized()).unwrap();
	} else if let Some(matches) = matches.subcommand_matches("problem") {
		let serialized: SerializedGraph = serde_json::from_reader(&std::fs::File::open(matches.value_of("graph").unwrap())?).expect("graph invalid JSON");
		let graph = Graph::from_serialized(&serialized).expect("malformed graph");
		let crossings: u32 = matches.value_of("crossings").unwrap().parse().expect("crossings must be an integer");
		let seed: u64 = matches.value_of("seed").unwrap().parse().expect("seed must be an integer");
		log::info!("loaded {} regions", graph.region_count());
		let connections = generator::create_problem(&graph, crossings, seed).expect("problem generation failed");
		log::info!("generated {} connections", connections.len());
		let serialized_conns: Vec<SerializedConnection> = connections.iter().map(|c| c.to_serialized(|_| None)).collect();
		serde_json::to_writer(&std::fs::File::create(matches.value_of("output").unwrap())?, &serialized_conns).unwrap();
	}
	Ok(())
}
