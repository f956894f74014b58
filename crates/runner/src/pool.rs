//! Agent Pool - spawns agents and feeds them work
//!
//! Each agent runs on its own thread with its own chain connection. All of
//! them pull from one shared queue (competing consumers), so an item goes to
//! whichever agent is free first.
//!
//! ## Lifecycle
//!
//! ```text
//! spawn()          order_trades(n, k)        kill_traders()
//!    │                    │                        │
//!    ▼                    ▼                        ▼
//! INIT ──► READY ──► RUNNING ⇄ trade ──► TERMINATED (pill)
//!  (barrier)                       └───► DRAINED (no fees left)
//! ```

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use log::{error, info, warn};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use stampede_core::ExchangeGraph;
use stampede_ports::{AgentIdentity, ChainConnector};

use crate::config::HarnessConfig;
use crate::error::{PoolError, Result};
use crate::traffic::TrafficController;
use crate::worker::{self, AgentExit, AgentSummary, POISON_PILL, Readiness, WorkItem, WorkerSettings};

/// Outcome of every agent after the pool was shut down
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolReport {
    pub agents: Vec<AgentSummary>,
    /// Trades still queued once every agent had exited
    pub abandoned: usize,
}

impl PoolReport {
    /// Work items processed across all agents
    pub fn attempted(&self) -> u64 {
        self.agents.iter().map(|a| a.attempted).sum()
    }

    pub fn succeeded(&self) -> u64 {
        self.agents.iter().map(|a| a.succeeded).sum()
    }

    /// Agents that stopped on an error or panicked
    pub fn failures(&self) -> impl Iterator<Item = &AgentSummary> {
        self.agents
            .iter()
            .filter(|a| matches!(a.exit, AgentExit::Failed(_) | AgentExit::Panicked))
    }

    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// A fixed-size horde of trading agents sharing one work queue
pub struct AgentPool<K: ChainConnector + 'static> {
    connector: Arc<K>,
    graph: Arc<ExchangeGraph>,
    config: HarnessConfig,
    queue_tx: Sender<WorkItem>,
    queue_rx: Receiver<WorkItem>,
    workers: Vec<JoinHandle<AgentSummary>>,
    traffic: TrafficController,
}

impl<K: ChainConnector + 'static> AgentPool<K> {
    pub fn new(connector: K, graph: Arc<ExchangeGraph>, config: HarnessConfig) -> Self {
        let (queue_tx, queue_rx) = unbounded();
        let traffic = TrafficController::new(queue_tx.clone(), config.tick_interval());
        Self {
            connector: Arc::new(connector),
            graph,
            config,
            queue_tx,
            queue_rx,
            workers: Vec::new(),
            traffic,
        }
    }

    pub fn n_agents(&self) -> usize {
        self.config.agents
    }

    /// Items waiting in the queue
    pub fn pending(&self) -> usize {
        self.queue_tx.len()
    }

    pub fn is_spawned(&self) -> bool {
        !self.workers.is_empty()
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn traffic(&self) -> &TrafficController {
        &self.traffic
    }

    /// Start every agent and block until all of them are ready
    ///
    /// If any agent fails to start, the ones already running are shut down
    /// and the first failure is returned.
    pub fn spawn(&mut self) -> Result<()> {
        if self.is_spawned() {
            return Err(PoolError::AlreadySpawned);
        }
        self.config.validate()?;

        let settings = WorkerSettings {
            minimal_balance: self.config.minimal_balance,
            set_allowance: self.config.set_allowance,
            allowance: self.config.allowance,
        };
        let mut signals = Vec::with_capacity(self.config.agents);

        for index in 0..self.config.agents {
            let identity =
                AgentIdentity::derive(&self.config.phrase, index, self.config.endpoint_for(index));
            let (ready_tx, ready_rx) = bounded::<Readiness>(1);
            let connector = Arc::clone(&self.connector);
            let graph = Arc::clone(&self.graph);
            let settings = settings.clone();
            let seed = self.config.seed_for(index);
            let queue = self.queue_rx.clone();

            let spawned = thread::Builder::new()
                .name(format!("agent-{}", index))
                .spawn(move || {
                    worker::run(connector, identity, graph, settings, seed, ready_tx, queue)
                });
            match spawned {
                Ok(handle) => {
                    self.workers.push(handle);
                    signals.push(ready_rx);
                }
                Err(source) => {
                    self.abort_startup();
                    return Err(PoolError::SpawnFailed { index, source });
                }
            }
        }

        // readiness barrier
        for (index, signal) in signals.into_iter().enumerate() {
            let failure = match signal.recv() {
                Ok(Ok(())) => None,
                Ok(Err(reason)) => Some(reason),
                Err(_) => Some("exited before signalling readiness".to_string()),
            };
            if let Some(reason) = failure {
                self.abort_startup();
                return Err(PoolError::AgentStartup { index, reason });
            }
        }

        info!("All {} agents ready", self.config.agents);
        Ok(())
    }

    /// Stop every spawned agent after a failed startup
    fn abort_startup(&mut self) {
        for _ in 0..self.workers.len() {
            self.enqueue(POISON_PILL, 1);
        }
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
        self.clear_queue();
    }

    /// Empty the queue once no agent is left to read it
    ///
    /// Pills meant for agents that already exited would otherwise stop the
    /// next generation on arrival. Returns the trades thrown away.
    fn clear_queue(&self) -> usize {
        let mut trades = 0;
        let mut pills = 0;
        while let Ok(item) = self.queue_rx.try_recv() {
            if item == POISON_PILL {
                pills += 1;
            } else {
                trades += 1;
            }
        }
        if trades > 0 {
            warn!("Discarding {} queued trades and {} pills", trades, pills);
        }
        trades
    }

    fn enqueue(&self, item: WorkItem, count: usize) {
        for _ in 0..count {
            // the pool keeps a receiver, so the queue never disconnects
            if self.queue_tx.send(item).is_err() {
                break;
            }
        }
    }

    /// Queue `n` trades of up to `path_len` hops
    ///
    /// A zero `path_len` would read as a poison pill, so it is bumped to one.
    pub fn order_trades(&self, n: usize, path_len: u32) {
        let item = path_len.max(1);
        if item != path_len {
            warn!("Path length 0 requested, ordering single-hop trades");
        }
        self.enqueue(item, n);
    }

    /// Keep the queue topped up to `tps` items per tick
    pub fn constant_traffic(&mut self, tps: u32) -> Result<()> {
        self.traffic.start(tps)
    }

    pub fn stop_traffic(&mut self) {
        self.traffic.stop();
    }

    /// Send one poison pill per agent and wait for every agent to exit
    ///
    /// Running traffic is stopped first so no work lands behind the pills.
    pub fn kill_traders(&mut self) -> Result<PoolReport> {
        if !self.is_spawned() {
            return Err(PoolError::NotSpawned);
        }
        self.traffic.stop();
        self.enqueue(POISON_PILL, self.workers.len());

        let mut report = PoolReport::default();
        for (index, handle) in self.workers.drain(..).enumerate() {
            match handle.join() {
                Ok(summary) => report.agents.push(summary),
                Err(_) => {
                    error!("[agent-{}] panicked", index);
                    report.agents.push(AgentSummary {
                        index,
                        attempted: 0,
                        succeeded: 0,
                        exit: AgentExit::Panicked,
                    });
                }
            }
        }

        report.abandoned = self.clear_queue();

        info!(
            "Pool stopped: {}/{} trades succeeded",
            report.succeeded(),
            report.attempted()
        );
        Ok(report)
    }
}

impl<K: ChainConnector + 'static> Drop for AgentPool<K> {
    fn drop(&mut self) {
        if self.is_spawned() {
            warn!("Agent pool dropped while running, killing traders");
            let _ = self.kill_traders();
        }
    }
}
