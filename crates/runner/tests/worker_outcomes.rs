//! Worker Outcome Classification Tests
//!
//! Drives a single-agent pool against a scripted chain client to check how
//! each kind of chain answer is handled:
//! - Transient connection loss: reconnect, keep consuming
//! - Exhausted account: stop consuming, exit drained
//! - Any other rejection: stop, exit failed
//! - Trades with no possible path: skipped

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use stampede_core::{AccountId, Amount, Asset, DexAddresses, ExchangeGraph, PairHandle, TokenId};
use stampede_ports::{
    AgentIdentity, ChainClient, ChainConnector, ChainError, ChainResult, Operation, Receipt,
    ReceiptMeta,
};
use stampede_runner::{AgentExit, AgentPool, HarnessConfig, PoolError};

/// Scripted answer to the next submission
#[derive(Debug, Clone)]
enum Step {
    Succeed,
    /// Lands the swap, then the connection drops before the next read
    SucceedThenDrop,
    Revert,
    Fail(ChainError),
    Panic,
}

#[derive(Debug, Default)]
struct Script {
    steps: VecDeque<Step>,
    reconnect_errors: VecDeque<ChainError>,
    read_errors: VecDeque<ChainError>,
    connect_error: Option<ChainError>,
    native_balance: Amount,
    token_balance: Amount,
    submitted: Vec<Operation>,
    reconnects: usize,
    approvals: usize,
}

struct ScriptedClient {
    account: AccountId,
    script: Arc<Mutex<Script>>,
}

fn meta() -> ReceiptMeta {
    ReceiptMeta {
        weight: 500_000,
        fee: 1_000,
        block: 1,
    }
}

impl ChainClient for ScriptedClient {
    fn account(&self) -> &AccountId {
        &self.account
    }

    fn balance_of(&mut self, _owner: &AccountId, asset: &Asset) -> ChainResult<Amount> {
        let mut script = self.script.lock();
        if let Some(e) = script.read_errors.pop_front() {
            return Err(e);
        }
        Ok(match asset {
            Asset::Native => script.native_balance,
            Asset::Token(_) => script.token_balance,
        })
    }

    fn reserves(&mut self, _pair: &PairHandle) -> ChainResult<(Amount, Amount)> {
        Ok((1_000_000, 1_000_000))
    }

    fn approve(&mut self, _: &TokenId, _: &AccountId, _: Amount) -> ChainResult<Receipt> {
        self.script.lock().approvals += 1;
        Ok(Receipt::succeeded(meta()))
    }

    fn submit(&mut self, operation: &Operation) -> ChainResult<Receipt> {
        let step = {
            let mut script = self.script.lock();
            script.submitted.push(operation.clone());
            script.steps.pop_front().unwrap_or(Step::Succeed)
        };
        match step {
            Step::Succeed => Ok(Receipt::succeeded(meta())),
            Step::SucceedThenDrop => {
                self.script
                    .lock()
                    .read_errors
                    .push_back(ChainError::TransientNetwork("socket closed".into()));
                Ok(Receipt::succeeded(meta()))
            }
            Step::Revert => Ok(Receipt::failed(Some(meta()))),
            Step::Fail(e) => Err(e),
            Step::Panic => panic!("scripted panic"),
        }
    }

    fn reconnect(&mut self) -> ChainResult<()> {
        let mut script = self.script.lock();
        script.reconnects += 1;
        match script.reconnect_errors.pop_front() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[derive(Clone)]
struct ScriptedConnector {
    script: Arc<Mutex<Script>>,
}

impl ChainConnector for ScriptedConnector {
    type Client = ScriptedClient;

    fn connect(&self, identity: &AgentIdentity) -> ChainResult<ScriptedClient> {
        if let Some(e) = self.script.lock().connect_error.clone() {
            return Err(e);
        }
        Ok(ScriptedClient {
            account: AccountId::new(identity.uri.as_str()),
            script: Arc::clone(&self.script),
        })
    }
}

fn tok(s: &str) -> TokenId {
    TokenId::new(s)
}

/// W - A - B
fn graph() -> Arc<ExchangeGraph> {
    let mut graph = ExchangeGraph::new(DexAddresses {
        router: AccountId::new("router"),
        factory: AccountId::new("factory"),
        wnative: tok("W"),
    });
    graph
        .add_pair(tok("W"), tok("A"), PairHandle::new("WA"))
        .unwrap();
    graph
        .add_pair(tok("A"), tok("B"), PairHandle::new("AB"))
        .unwrap();
    Arc::new(graph)
}

fn script(steps: Vec<Step>) -> Arc<Mutex<Script>> {
    Arc::new(Mutex::new(Script {
        steps: steps.into(),
        native_balance: 1_000_000_000_000,
        token_balance: 50_000_000,
        ..Default::default()
    }))
}

fn single_agent_pool(script: &Arc<Mutex<Script>>, set_allowance: bool) -> AgentPool<ScriptedConnector> {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = HarnessConfig {
        agents: 1,
        set_allowance,
        seed: Some(17),
        tick_interval_ms: 50,
        ..Default::default()
    };
    AgentPool::new(
        ScriptedConnector {
            script: Arc::clone(script),
        },
        graph(),
        config,
    )
}

/// Transient failures trigger a reconnect and the agent keeps consuming
#[test]
fn test_transient_failure_reconnects() {
    let script = script(vec![
        Step::Fail(ChainError::TransientNetwork("reset".into())),
        Step::Succeed,
        Step::Succeed,
    ]);
    let mut pool = single_agent_pool(&script, false);
    pool.spawn().unwrap();
    pool.order_trades(3, 2);
    let report = pool.kill_traders().unwrap();

    let agent = &report.agents[0];
    assert_eq!(agent.exit, AgentExit::Terminated);
    assert_eq!(agent.attempted, 3);
    assert_eq!(agent.succeeded, 2);
    assert_eq!(script.lock().reconnects, 1);
    assert!(report.is_clean());
}

/// Repeated transient reconnect failures are retried until one succeeds
#[test]
fn test_reconnect_retries_until_connected() {
    let script = script(vec![Step::Fail(ChainError::TransientNetwork("reset".into()))]);
    script.lock().reconnect_errors = vec![
        ChainError::TransientNetwork("refused".into()),
        ChainError::TransientNetwork("refused".into()),
    ]
    .into();
    let mut pool = single_agent_pool(&script, false);
    pool.spawn().unwrap();
    pool.order_trades(2, 1);
    let report = pool.kill_traders().unwrap();

    assert_eq!(report.agents[0].exit, AgentExit::Terminated);
    assert_eq!(report.agents[0].succeeded, 1);
    assert_eq!(script.lock().reconnects, 3);
}

/// A reconnect the node refuses outright ends the agent
#[test]
fn test_rejected_reconnect_is_fatal() {
    let script = script(vec![Step::Fail(ChainError::TransientNetwork("reset".into()))]);
    script.lock().reconnect_errors = vec![ChainError::Rejected("banned".into())].into();
    let mut pool = single_agent_pool(&script, false);
    pool.spawn().unwrap();
    pool.order_trades(2, 1);
    let report = pool.kill_traders().unwrap();

    assert!(matches!(report.agents[0].exit, AgentExit::Failed(_)));
    assert_eq!(report.agents[0].attempted, 1);
}

/// Running out of fee money drains the agent and leaves the rest of the queue
#[test]
fn test_exhausted_account_drains() {
    let script = script(vec![
        Step::Succeed,
        Step::Fail(ChainError::AccountExhausted("balance too low".into())),
    ]);
    let mut pool = single_agent_pool(&script, false);
    pool.spawn().unwrap();
    pool.order_trades(5, 2);
    let report = pool.kill_traders().unwrap();

    let agent = &report.agents[0];
    assert_eq!(agent.exit, AgentExit::Drained);
    assert_eq!(agent.attempted, 2);
    assert_eq!(agent.succeeded, 1);
    assert!(report.is_clean(), "draining is an expected way to stop");
    assert_eq!(report.abandoned, 3);
    assert_eq!(pool.pending(), 0);
}

/// A swap that landed is counted even when the balance read after it drops
#[test]
fn test_landed_swap_counted_when_refresh_drops() {
    let script = script(vec![Step::SucceedThenDrop, Step::Succeed]);
    let mut pool = single_agent_pool(&script, false);
    pool.spawn().unwrap();
    pool.order_trades(2, 2);
    let report = pool.kill_traders().unwrap();

    let agent = &report.agents[0];
    assert_eq!(agent.exit, AgentExit::Terminated);
    assert_eq!(agent.attempted, 2);
    assert_eq!(agent.succeeded, 2);
    assert_eq!(script.lock().reconnects, 1);
}

/// A connection drop while loading balances is retried before giving up
#[test]
fn test_startup_survives_transient_read() {
    let script = script(vec![]);
    script
        .lock()
        .read_errors
        .push_back(ChainError::TransientNetwork("reset".into()));
    let mut pool = single_agent_pool(&script, false);
    pool.spawn().unwrap();
    assert_eq!(script.lock().reconnects, 1);
    pool.order_trades(1, 1);
    let report = pool.kill_traders().unwrap();

    assert_eq!(report.agents[0].succeeded, 1);
    assert!(report.is_clean());
}

/// A connection that keeps dropping during startup still fails the spawn
#[test]
fn test_startup_gives_up_on_flapping_connection() {
    let script = script(vec![]);
    script.lock().read_errors = (0..3)
        .map(|_| ChainError::TransientNetwork("reset".into()))
        .collect();
    let mut pool = single_agent_pool(&script, false);

    assert!(matches!(pool.spawn(), Err(PoolError::AgentStartup { index: 0, .. })));
    assert_eq!(script.lock().reconnects, 2);
    assert!(!pool.is_spawned());
}

/// Any other rejection is surfaced and stops the agent
#[test]
fn test_rejection_is_fatal() {
    let script = script(vec![Step::Fail(ChainError::Rejected("bad origin".into()))]);
    let mut pool = single_agent_pool(&script, false);
    pool.spawn().unwrap();
    pool.order_trades(3, 2);
    let report = pool.kill_traders().unwrap();

    match &report.agents[0].exit {
        AgentExit::Failed(reason) => assert!(reason.contains("bad origin"), "{reason}"),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(report.agents[0].attempted, 1);
    assert!(!report.is_clean());
    assert_eq!(report.failures().count(), 1);
}

/// Reverted receipts count as attempts but not as successes
#[test]
fn test_reverted_trade_counts_as_attempt() {
    let script = script(vec![Step::Revert, Step::Succeed, Step::Revert]);
    let mut pool = single_agent_pool(&script, false);
    pool.spawn().unwrap();
    pool.order_trades(3, 2);
    let report = pool.kill_traders().unwrap();

    assert_eq!(report.agents[0].exit, AgentExit::Terminated);
    assert_eq!(report.attempted(), 3);
    assert_eq!(report.succeeded(), 1);
}

/// With nothing worth trading the agent skips each cycle without submitting
#[test]
fn test_no_candidate_skips_cycle() {
    let script = script(vec![]);
    {
        let mut s = script.lock();
        s.native_balance = 10;
        s.token_balance = 10;
    }
    let mut pool = single_agent_pool(&script, false);
    pool.spawn().unwrap();
    pool.order_trades(4, 2);
    let report = pool.kill_traders().unwrap();

    assert_eq!(report.agents[0].exit, AgentExit::Terminated);
    assert_eq!(report.agents[0].attempted, 4);
    assert_eq!(report.agents[0].succeeded, 0);
    assert!(script.lock().submitted.is_empty());
}

/// A panicking client is reported, not propagated
#[test]
fn test_panicking_agent_is_reported() {
    let script = script(vec![Step::Panic]);
    let mut pool = single_agent_pool(&script, false);
    pool.spawn().unwrap();
    pool.order_trades(1, 1);
    let report = pool.kill_traders().unwrap();

    assert_eq!(report.agents[0].exit, AgentExit::Panicked);
    assert!(!report.is_clean());
}

/// Allowances are granted for every token but the wrapped native one
#[test]
fn test_allowances_granted_before_ready() {
    let script = script(vec![]);
    let mut pool = single_agent_pool(&script, true);
    pool.spawn().unwrap();
    assert_eq!(script.lock().approvals, 2);
    pool.kill_traders().unwrap();

    let script = self::script(vec![]);
    let mut pool = single_agent_pool(&script, false);
    pool.spawn().unwrap();
    assert_eq!(script.lock().approvals, 0);
    pool.kill_traders().unwrap();
}

/// A connection failure at startup breaks the readiness barrier
#[test]
fn test_startup_failure_is_reported() {
    let script = script(vec![]);
    script.lock().connect_error = Some(ChainError::Rejected("unknown endpoint".into()));
    let mut pool = single_agent_pool(&script, false);

    match pool.spawn() {
        Err(PoolError::AgentStartup { index, reason }) => {
            assert_eq!(index, 0);
            assert!(reason.contains("unknown endpoint"));
        }
        other => panic!("expected startup failure, got {other:?}"),
    }
    assert!(!pool.is_spawned());
    assert!(matches!(pool.kill_traders(), Err(PoolError::NotSpawned)));
}
