use std::sync::Arc;
use std::time::Duration;

use stampede_core::snapshot_file_name;
use stampede_ports::GraphBuilder;
use stampede_runner::{AgentExit, AgentPool, HarnessConfig};
use stampede_sim::scenario::{self, AGENT_NATIVE, AGENT_TOKENS};
use stampede_sim::{SimConfig, SimConnector, SimGraphBuilder};

const SIM_CHAIN_URL: &str = "sim://local/stampede-demo";

fn print_help() {
    eprintln!(
        r#"Stampede - AMM load generator

USAGE:
    stampede [OPTIONS]

OPTIONS:
    --config <PATH>     Load harness configuration from JSON file
    --trades <N>        Order N trades up front (default: 100)
    --path-len <K>      Maximum hops per ordered trade (default: 2)
    --tps <R>           Keep the queue topped up to R trades per tick
    --duration <S>      Seconds to run constant traffic (default: 10)
    --save-graph <DIR>  Write the discovered exchange graph snapshot into DIR
    --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG            Log level filter (default: info)

EXAMPLES:
    # 500 three-hop trades on the demo exchange
    stampede --trades 500 --path-len 3

    # 50 tps for a minute with 16 agents
    echo '{{"agents": 16}}' > harness.json
    stampede --config harness.json --trades 0 --tps 50 --duration 60
"#
    );
}

fn value_of<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> T {
    match args.get(i).map(|raw| raw.parse::<T>()) {
        Some(Ok(value)) => value,
        Some(Err(_)) => {
            eprintln!("Error: invalid value for {}: {}", flag, args[i]);
            std::process::exit(1);
        }
        None => {
            eprintln!("Error: {} requires an argument", flag);
            std::process::exit(1);
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;
    let mut trades: usize = 100;
    let mut path_len: u32 = 2;
    let mut tps: Option<u32> = None;
    let mut duration: u64 = 10;
    let mut graph_dir: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--config" | "-c" => {
                i += 1;
                config_path = Some(value_of(&args, i, "--config"));
            }
            "--trades" => {
                i += 1;
                trades = value_of(&args, i, "--trades");
            }
            "--path-len" => {
                i += 1;
                path_len = value_of(&args, i, "--path-len");
            }
            "--tps" => {
                i += 1;
                tps = Some(value_of(&args, i, "--tps"));
            }
            "--duration" => {
                i += 1;
                duration = value_of(&args, i, "--duration");
            }
            "--save-graph" => {
                i += 1;
                graph_dir = Some(value_of(&args, i, "--save-graph"));
            }
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let config = match config_path {
        Some(path) => {
            log::info!("Loading configuration from: {}", path);
            HarnessConfig::from_file(&path)?
        }
        None => HarnessConfig::default(),
    };

    let chain = scenario::demo_chain(SimConfig::default())?;
    scenario::fund_agents(&chain, &config.phrase, config.agents, AGENT_NATIVE, AGENT_TOKENS);
    let graph = SimGraphBuilder::new(chain.clone()).fetch()?;
    log::info!(
        "Exchange: {} tokens, {} pairs, router {}",
        graph.token_count(),
        graph.pair_count(),
        graph.router()
    );
    if let Some(dir) = graph_dir {
        let name = snapshot_file_name(SIM_CHAIN_URL, graph.router());
        let path = graph.save_to_file(&dir, &name)?;
        log::info!("Graph snapshot written to {}", path.display());
    }

    let mut pool = AgentPool::new(SimConnector::new(chain.clone()), Arc::new(graph), config);
    pool.spawn()?;

    if trades > 0 {
        log::info!("Ordering {} trades of up to {} hops", trades, path_len);
        pool.order_trades(trades, path_len);
    }
    if let Some(tps) = tps {
        pool.constant_traffic(tps)?;
        std::thread::sleep(Duration::from_secs(duration));
        pool.stop_traffic();
    }

    let report = pool.kill_traders()?;
    for agent in &report.agents {
        log::info!(
            "agent-{:<3} {:>6}/{:<6} {:?}",
            agent.index,
            agent.succeeded,
            agent.attempted,
            agent.exit
        );
    }
    log::info!(
        "Total: {}/{} swaps succeeded, {} blocks",
        report.succeeded(),
        report.attempted(),
        chain.block_number()
    );

    if !report.is_clean() {
        for agent in report.failures() {
            if let AgentExit::Failed(reason) = &agent.exit {
                log::error!("agent-{} failed: {}", agent.index, reason);
            }
        }
        std::process::exit(1);
    }
    Ok(())
}
