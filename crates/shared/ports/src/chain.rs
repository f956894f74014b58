use stampede_core::{AccountId, Amount, Asset, ExchangeGraph, PairHandle, TokenId};

use crate::error::{ChainResult, DiscoveryError};
use crate::operation::{Operation, Receipt};

/// Who an agent trades as
///
/// Key derivation from `uri` is left to the connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentIdentity {
    /// Position of the agent in its pool
    pub index: usize,
    /// Secret URI, `{phrase}//{index}`
    pub uri: String,
    /// Node endpoint this agent should talk to, if the pool spreads load
    pub endpoint: Option<String>,
}

impl AgentIdentity {
    /// Identity of agent `index` derived from a base phrase
    pub fn derive(phrase: &str, index: usize, endpoint: Option<String>) -> Self {
        Self {
            index,
            uri: format!("{}//{}", phrase, index),
            endpoint,
        }
    }
}

/// Port for one agent's exclusive connection to the chain
///
/// Every call blocks until the node answers. Implementations are not
/// required to be shareable; each agent owns its own client.
pub trait ChainClient {
    /// Account this client signs for
    fn account(&self) -> &AccountId;

    /// Balance of `asset` held by `owner`
    fn balance_of(&mut self, owner: &AccountId, asset: &Asset) -> ChainResult<Amount>;

    /// Current reserves of a pair, in canonical token order
    fn reserves(&mut self, pair: &PairHandle) -> ChainResult<(Amount, Amount)>;

    /// Allow `spender` to move up to `amount` of `token` on our behalf
    fn approve(
        &mut self,
        token: &TokenId,
        spender: &AccountId,
        amount: Amount,
    ) -> ChainResult<Receipt>;

    /// Sign, submit and wait for inclusion of `operation`
    fn submit(&mut self, operation: &Operation) -> ChainResult<Receipt>;

    /// Re-establish a dropped connection
    fn reconnect(&mut self) -> ChainResult<()>;

    /// Name for logs
    fn name(&self) -> &str {
        "ChainClient"
    }
}

/// Port for opening agent connections
///
/// Shared by all agents of a pool; `connect` is called from inside each
/// agent's worker thread.
pub trait ChainConnector: Send + Sync {
    type Client: ChainClient;

    fn connect(&self, identity: &AgentIdentity) -> ChainResult<Self::Client>;
}

/// Port for discovering the exchange graph from the chain
///
/// Invoked once, outside the trading hot path.
pub trait GraphBuilder {
    fn fetch(&self) -> Result<ExchangeGraph, DiscoveryError>;
}
