use log::{debug, warn};

use stampede_core::{AccountId, Amount, Asset, PairHandle, TokenId};
use stampede_ports::{
    AgentIdentity, ChainClient, ChainConnector, ChainError, ChainResult, Operation, Receipt,
};

use crate::application::SimChain;

/// One agent's connection to a [`SimChain`]
///
/// The account is named after the identity's secret URI. A connection drops
/// whenever the chain has an injected disconnect pending, and stays down
/// until [`ChainClient::reconnect`] is called.
#[derive(Debug)]
pub struct SimClient {
    chain: SimChain,
    account: AccountId,
    connected: bool,
    label: String,
}

impl SimClient {
    pub fn new(chain: SimChain, identity: &AgentIdentity) -> Self {
        Self {
            chain,
            account: AccountId::new(identity.uri.as_str()),
            connected: true,
            label: format!("SimClient#{}", identity.index),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn ensure_connected(&mut self) -> ChainResult<()> {
        if !self.connected {
            return Err(ChainError::TransientNetwork(format!(
                "{} is disconnected",
                self.label
            )));
        }
        if self.chain.take_disconnect() {
            self.connected = false;
            warn!("{} lost its connection", self.label);
            return Err(ChainError::TransientNetwork(format!(
                "{} connection reset by peer",
                self.label
            )));
        }
        Ok(())
    }
}

impl ChainClient for SimClient {
    fn account(&self) -> &AccountId {
        &self.account
    }

    fn balance_of(&mut self, owner: &AccountId, asset: &Asset) -> ChainResult<Amount> {
        if !self.connected {
            return Err(ChainError::TransientNetwork(format!(
                "{} is disconnected",
                self.label
            )));
        }
        Ok(self.chain.balance(owner, asset))
    }

    fn reserves(&mut self, pair: &PairHandle) -> ChainResult<(Amount, Amount)> {
        if !self.connected {
            return Err(ChainError::TransientNetwork(format!(
                "{} is disconnected",
                self.label
            )));
        }
        self.chain
            .pool(pair)
            .map(|pool| (pool.reserve_0, pool.reserve_1))
            .ok_or_else(|| ChainError::Rejected(format!("unknown pair {}", pair)))
    }

    fn approve(
        &mut self,
        token: &TokenId,
        spender: &AccountId,
        amount: Amount,
    ) -> ChainResult<Receipt> {
        self.ensure_connected()?;
        self.chain.approve(&self.account, token, spender, amount)
    }

    fn submit(&mut self, operation: &Operation) -> ChainResult<Receipt> {
        self.ensure_connected()?;
        self.chain.execute(&self.account, operation)
    }

    fn reconnect(&mut self) -> ChainResult<()> {
        debug!("{} reconnecting", self.label);
        self.connected = true;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.label
    }
}

/// Hands out [`SimClient`]s sharing one chain
#[derive(Debug, Clone)]
pub struct SimConnector {
    chain: SimChain,
}

impl SimConnector {
    pub fn new(chain: SimChain) -> Self {
        Self { chain }
    }

    pub fn chain(&self) -> &SimChain {
        &self.chain
    }
}

impl ChainConnector for SimConnector {
    type Client = SimClient;

    fn connect(&self, identity: &AgentIdentity) -> ChainResult<SimClient> {
        Ok(SimClient::new(self.chain.clone(), identity))
    }
}
