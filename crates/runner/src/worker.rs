//! Agent worker loop
//!
//! Runs on the agent's own thread: connect, get ready, signal the pool, then
//! pull work items until a poison pill arrives or the account runs dry.

use crossbeam_channel::{Receiver, Sender};
use log::{error, info, warn};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use stampede_core::{Amount, ExchangeGraph};
use stampede_ports::{AgentIdentity, ChainClient, ChainConnector, ChainError, ChainResult};

use crate::agent::Agent;
use crate::error::TradeError;

/// Queue entry: desired path length, or [`POISON_PILL`]
pub type WorkItem = u32;

/// Tells the agent pulling it to shut down
pub const POISON_PILL: WorkItem = 0;

/// Pause between failed reconnect attempts
const RECONNECT_PAUSE: Duration = Duration::from_millis(100);

/// Startup attempts before a flapping connection fails the agent
const STARTUP_ATTEMPTS: usize = 3;

/// How an agent left its loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentExit {
    /// Consumed a poison pill
    Terminated,
    /// Ran out of native balance for fees
    Drained,
    /// Stopped on an unrecoverable error
    Failed(String),
    /// The worker thread panicked
    Panicked,
}

/// Per-agent statistics reported at shutdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSummary {
    pub index: usize,
    /// Work items taken off the queue, pills excluded
    pub attempted: u64,
    /// Trades whose receipt reported success
    pub succeeded: u64,
    pub exit: AgentExit,
}

/// Settings every worker of a pool shares
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub minimal_balance: Amount,
    pub set_allowance: bool,
    pub allowance: Amount,
}

/// Readiness signal: `Ok` once balances are loaded, `Err` if startup failed
pub type Readiness = Result<(), String>;

/// Reconnect until it sticks; only a non-transient failure gives up
fn reconnect<C: ChainClient>(client: &mut C, label: &str) -> ChainResult<()> {
    loop {
        match client.reconnect() {
            Ok(()) => return Ok(()),
            Err(e) if e.is_transient() => {
                warn!("[{}] Reconnect failed: {}", label, e);
                thread::sleep(RECONNECT_PAUSE);
            }
            Err(e) => return Err(e),
        }
    }
}

fn prepare<C: ChainClient>(agent: &mut Agent<C>, settings: &WorkerSettings) -> ChainResult<()> {
    if settings.set_allowance {
        agent.set_all_allowances(settings.allowance)?;
    }
    agent.refresh_balances(None)
}

/// Run [`prepare`], reconnecting after transient failures
fn prepare_with_retry<C: ChainClient>(
    agent: &mut Agent<C>,
    settings: &WorkerSettings,
    label: &str,
) -> ChainResult<()> {
    let mut attempt = 1;
    loop {
        match prepare(agent, settings) {
            Err(e) if e.is_transient() && attempt < STARTUP_ATTEMPTS => {
                warn!("[{}] Connection lost during startup ({}), reconnecting", label, e);
                reconnect(agent.client_mut(), label)?;
                attempt += 1;
            }
            outcome => return outcome,
        }
    }
}

/// Classify a failed cycle; `Some` ends the agent's loop
fn recover<C: ChainClient>(agent: &mut Agent<C>, label: &str, error: TradeError) -> Option<AgentExit> {
    match error {
        TradeError::Chain(ChainError::TransientNetwork(reason)) => {
            warn!("[{}] Connection lost ({}), reconnecting", label, reason);
            match reconnect(agent.client_mut(), label) {
                Ok(()) => None,
                Err(e) => {
                    error!("[{}] Reconnect rejected: {}", label, e);
                    Some(AgentExit::Failed(e.to_string()))
                }
            }
        }
        TradeError::Chain(ChainError::AccountExhausted(_)) => {
            info!("[{}] ran out of native balance, going fishing", label);
            Some(AgentExit::Drained)
        }
        e if e.is_skippable() => {
            warn!("[{}] Skipping trade: {}", label, e);
            None
        }
        e => {
            error!("[{}] Trade rejected: {}", label, e);
            Some(AgentExit::Failed(e.to_string()))
        }
    }
}

/// Body of an agent thread
pub(crate) fn run<K: ChainConnector>(
    connector: Arc<K>,
    identity: AgentIdentity,
    graph: Arc<ExchangeGraph>,
    settings: WorkerSettings,
    seed: Option<u64>,
    ready: Sender<Readiness>,
    queue: Receiver<WorkItem>,
) -> AgentSummary {
    let index = identity.index;
    let label = format!("agent-{}", index);
    let mut summary = AgentSummary {
        index,
        attempted: 0,
        succeeded: 0,
        exit: AgentExit::Terminated,
    };

    let client = match connector.connect(&identity) {
        Ok(client) => client,
        Err(e) => {
            error!("[{}] Could not connect: {}", label, e);
            let _ = ready.send(Err(e.to_string()));
            summary.exit = AgentExit::Failed(e.to_string());
            return summary;
        }
    };
    let mut agent = Agent::new(index, client, graph, seed);
    if let Err(e) = prepare_with_retry(&mut agent, &settings, &label) {
        error!("[{}] Startup failed: {}", label, e);
        let _ = ready.send(Err(e.to_string()));
        summary.exit = AgentExit::Failed(e.to_string());
        return summary;
    }
    info!("[{}] ready", label);
    // nobody waiting means the pool gave up on startup
    if ready.send(Ok(())).is_err() {
        return summary;
    }
    drop(ready);

    summary.exit = loop {
        let item = match queue.recv() {
            Ok(item) => item,
            Err(_) => break AgentExit::Terminated,
        };
        if item == POISON_PILL {
            break AgentExit::Terminated;
        }
        summary.attempted += 1;

        let failure = match agent.trade(item as usize, settings.minimal_balance) {
            Ok(report) => {
                // the swap is on chain whatever the refresh did
                if report.is_success() {
                    summary.succeeded += 1;
                }
                report.refresh.err().map(TradeError::from)
            }
            Err(e) => Some(e),
        };
        if let Some(exit) = failure.and_then(|e| recover(&mut agent, &label, e)) {
            break exit;
        }
    };

    info!(
        "[{}] succeeded in {}/{} swaps",
        label, summary.succeeded, summary.attempted
    );
    summary
}
